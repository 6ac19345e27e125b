use std::fmt;

use indexmap::IndexMap;

use crate::error::Error;

/// A symbolic name for an address. Equality and hashing go through the name
/// alone, so every mention of `loop` is the same symbol no matter where it
/// appears.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(name: impl Into<String>) -> Self {
        Label(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label addresses in definition order.
#[derive(Debug, Default)]
pub struct Labels(IndexMap<Label, u16>);

impl Labels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a definition. Binding the same name twice is fatal.
    pub fn bind(&mut self, label: Label, addr: u16) -> Result<(), Error> {
        if self.0.contains_key(&label) {
            return Err(Error::DuplicateLabel(label.0));
        }
        self.0.insert(label, addr);
        Ok(())
    }

    /// Looks a reference up; a name that was never bound is fatal.
    pub fn resolve(&self, label: &Label) -> Result<u16, Error> {
        self.0.get(label).copied().ok_or_else(|| Error::UndefinedLabel(label.0.clone()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Label, u16)> {
        self.0.iter().map(|(label, addr)| (label, *addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_compare_by_name() {
        assert_eq!(Label::new("loop"), Label::new(String::from("loop")));
        assert_ne!(Label::new("loop"), Label::new("done"));
    }

    #[test]
    fn duplicate_binding_is_fatal() {
        let mut labels = Labels::new();
        labels.bind(Label::new("a"), 0).unwrap();
        labels.bind(Label::new("b"), 2).unwrap();
        match labels.bind(Label::new("a"), 4) {
            Err(Error::DuplicateLabel(name)) => assert_eq!(name, "a"),
            other => panic!("expected a duplicate-label error, got {other:?}"),
        }
    }

    #[test]
    fn unbound_lookup_is_fatal() {
        let labels = Labels::new();
        match labels.resolve(&Label::new("ghost")) {
            Err(Error::UndefinedLabel(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected an undefined-label error, got {other:?}"),
        }
    }

    #[test]
    fn iteration_preserves_definition_order() {
        let mut labels = Labels::new();
        labels.bind(Label::new("z"), 0).unwrap();
        labels.bind(Label::new("a"), 2).unwrap();
        let names: Vec<_> = labels.iter().map(|(label, _)| label.name().to_string()).collect();
        assert_eq!(names, ["z", "a"]);
        assert_eq!(labels.len(), 2);
        assert!(!labels.is_empty());
    }
}
