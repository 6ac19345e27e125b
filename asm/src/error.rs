use color_print::cprintln;
use thiserror::Error;

use crate::parser::Fail;

/// How deep into a failure's cause tree the diagnostics descend.
const CAUSE_DEPTH: usize = 3;
/// How many sibling causes are spelled out before collapsing to a count.
const CAUSE_BREADTH: usize = 4;

#[derive(Error, Debug)]
pub enum Error {
    #[error("expected {}", .0.expected)]
    Syntax(Fail),

    #[error("label `{0}` defined more than once")]
    DuplicateLabel(String),

    #[error("label `{0}` is never defined")]
    UndefinedLabel(String),

    #[error("`{mnemonic}`: immediate {value} does not fit in {bits} signed bits")]
    ImmOutOfRange { mnemonic: &'static str, value: i32, bits: u32 },

    #[error("`{mnemonic}`: target {value:#x} does not fit in {bits} bits")]
    TargetOutOfRange { mnemonic: &'static str, value: i32, bits: u32 },

    #[error("`{mnemonic}`: branch offset {offset} is not a multiple of the instruction width")]
    UnalignedBranch { mnemonic: &'static str, offset: i32 },

    #[error("`{mnemonic}`: function code {funct:#04x} does not fit in 5 bits")]
    FunctOutOfRange { mnemonic: &'static str, funct: u8 },

    #[error("`{mnemonic}`: malformed operand list")]
    BadOperands { mnemonic: &'static str },

    #[error("failed to read {0}")]
    FileRead(String, #[source] std::io::Error),

    #[error("failed to write {0}")]
    FileWrite(String, #[source] std::io::Error),
}

impl Error {
    /// Prints the error against the source it came from. Syntax failures get
    /// a source window with a caret and the alternatives that were tried.
    pub fn report(&self, path: &str, src: &str) {
        cprintln!("<red,bold>error</>: {}", self);
        if let Error::Syntax(fail) = self {
            let (line, col) = line_col(src, fail.at);
            cprintln!("     <blue>--></> <underline>{}:{}:{}</>", path, line, col);
            cprintln!("      <blue>|</>");
            cprintln!(" <blue>{:>4} |</> {}", line, line_text(src, line));
            cprintln!("      <blue>|</> {}<red,bold>^</>", " ".repeat(col));
            report_causes(src, &fail.causes, 1);
        }
    }
}

fn report_causes(src: &str, causes: &[Fail], depth: usize) {
    if depth > CAUSE_DEPTH || causes.is_empty() {
        return;
    }
    let shown = causes.len().min(CAUSE_BREADTH);
    let indent = "  ".repeat(depth);
    for cause in &causes[..shown] {
        let (line, col) = line_col(src, cause.at);
        cprintln!("{}<green,bold>note</>: expected {} at {}:{}", indent, cause.expected, line, col);
        report_causes(src, &cause.causes, depth + 1);
    }
    if causes.len() > shown {
        cprintln!("{}<green,bold>note</>: and {} more alternatives", indent, causes.len() - shown);
    }
}

/// 1-based line and 0-based column of a byte offset.
fn line_col(src: &str, at: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 0;
    for (i, ch) in src.char_indices() {
        if i >= at {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

fn line_text(src: &str, line: usize) -> &str {
    src.lines().nth(line - 1).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_walks_newlines() {
        let src = "nop\n  add $s1, $s2, $s3\n";
        assert_eq!(line_col(src, 0), (1, 0));
        assert_eq!(line_col(src, 3), (1, 3));
        assert_eq!(line_col(src, 4), (2, 0));
        assert_eq!(line_col(src, 6), (2, 2));
    }

    #[test]
    fn line_text_is_one_based() {
        let src = "nop\nhalt\n";
        assert_eq!(line_text(src, 1), "nop");
        assert_eq!(line_text(src, 2), "halt");
        assert_eq!(line_text(src, 3), "");
    }

    #[test]
    fn messages_name_the_offender() {
        assert_eq!(
            Error::DuplicateLabel("loop".into()).to_string(),
            "label `loop` defined more than once"
        );
        assert_eq!(
            Error::ImmOutOfRange { mnemonic: "addi", value: 64, bits: 7 }.to_string(),
            "`addi`: immediate 64 does not fit in 7 signed bits"
        );
        assert_eq!(
            Error::UnalignedBranch { mnemonic: "bne", offset: 5 }.to_string(),
            "`bne`: branch offset 5 is not a multiple of the instruction width"
        );
    }
}
