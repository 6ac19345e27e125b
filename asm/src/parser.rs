//! A small parser-combinator library.
//!
//! A parser is any `Fn(&str, Pos) -> PResult<T>`: it reads the source at the
//! given offset and either succeeds with a value and the offset just past it,
//! or fails with a [`Fail`] naming what it expected. Parsers never mutate
//! shared state, so alternation can retry as many branches as it likes from
//! the same starting offset.

/// Byte offset into the source text.
pub type Pos = usize;

/// A failed parse. `causes` holds the failure of every alternative that was
/// tried and rejected at this point, in trial order, which is what lets the
/// diagnostics say "expected one of ...".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fail {
    pub at: Pos,
    pub expected: String,
    pub causes: Vec<Fail>,
}

impl Fail {
    pub fn new(at: Pos, expected: impl Into<String>) -> Self {
        Fail { at, expected: expected.into(), causes: Vec::new() }
    }

    pub fn with_causes(at: Pos, expected: impl Into<String>, causes: Vec<Fail>) -> Self {
        Fail { at, expected: expected.into(), causes }
    }
}

pub type PResult<T> = Result<(T, Pos), Fail>;

pub trait Parser<'s, T>: Fn(&'s str, Pos) -> PResult<T> {}

impl<'s, T, F> Parser<'s, T> for F where F: Fn(&'s str, Pos) -> PResult<T> {}

pub type BoxedParser<'s, T> = Box<dyn Fn(&'s str, Pos) -> PResult<T> + 's>;

pub fn boxed<'s, T, P>(p: P) -> BoxedParser<'s, T>
where
    P: Parser<'s, T> + 's,
{
    Box::new(p)
}

/// Whitespace and comments, which the grammar treats interchangeably.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trivia {
    Whitespace,
    Comment(String),
}

// ---------------------------------------------------------------------------
// Primitives

/// Matches `pat` exactly, ignoring ASCII case.
pub fn literal<'s>(pat: &'static str) -> impl Parser<'s, &'static str> {
    move |src: &'s str, at: Pos| {
        let end = at + pat.len();
        if end <= src.len() && src.as_bytes()[at..end].eq_ignore_ascii_case(pat.as_bytes()) {
            Ok((pat, end))
        } else {
            Err(Fail::new(at, format!("`{pat}`")))
        }
    }
}

/// Case-sensitive variant of [`literal`].
pub fn literal_exact<'s>(pat: &'static str) -> impl Parser<'s, &'static str> {
    move |src: &'s str, at: Pos| {
        let end = at + pat.len();
        if end <= src.len() && &src.as_bytes()[at..end] == pat.as_bytes() {
            Ok((pat, end))
        } else {
            Err(Fail::new(at, format!("`{pat}`")))
        }
    }
}

/// One or more whitespace characters.
pub fn whitespace(src: &str, at: Pos) -> PResult<Trivia> {
    let bytes = src.as_bytes();
    let mut end = at;
    while end < bytes.len() && bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    if end == at {
        Err(Fail::new(at, "whitespace"))
    } else {
        Ok((Trivia::Whitespace, end))
    }
}

/// A `#` or `;` comment running to the end of the line.
pub fn comment(src: &str, at: Pos) -> PResult<Trivia> {
    let bytes = src.as_bytes();
    if at >= bytes.len() || (bytes[at] != b'#' && bytes[at] != b';') {
        return Err(Fail::new(at, "comment"));
    }
    let mut end = at;
    while end < bytes.len() && bytes[end] != b'\n' {
        end += 1;
    }
    let text = src[at..end].to_string();
    if end < bytes.len() {
        end += 1;
    }
    Ok((Trivia::Comment(text), end))
}

/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn identifier<'s>(src: &'s str, at: Pos) -> PResult<&'s str> {
    let bytes = src.as_bytes();
    if at >= bytes.len() || !(bytes[at].is_ascii_alphabetic() || bytes[at] == b'_') {
        return Err(Fail::new(at, "identifier"));
    }
    let mut end = at + 1;
    while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_') {
        end += 1;
    }
    Ok((&src[at..end], end))
}

/// An integer literal: optional `-`, then decimal, `0x` hex, or `0b` binary
/// digits. A spelling that scans but does not parse under its radix is a
/// failure, not a panic.
pub fn number(src: &str, at: Pos) -> PResult<i32> {
    let bytes = src.as_bytes();
    let mut end = at;
    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
    }
    let digits_from = end;
    while end < bytes.len()
        && (bytes[end].is_ascii_hexdigit() || bytes[end] == b'x' || bytes[end] == b'X')
    {
        end += 1;
    }
    if end == digits_from {
        return Err(Fail::new(at, "number"));
    }
    let negative = digits_from > at;
    let body = &src[digits_from..end];
    let (radix, digits) =
        if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            (16, hex)
        } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
            (2, bin)
        } else {
            (10, body)
        };
    match i32::from_str_radix(digits, radix) {
        Ok(value) => Ok((if negative { -value } else { value }, end)),
        Err(_) => Err(Fail::new(at, "number")),
    }
}

// ---------------------------------------------------------------------------
// Combinators

/// Transforms a success value. Failures pass through untouched.
pub fn map<'s, A, B>(p: impl Parser<'s, A>, f: impl Fn(A) -> B) -> impl Parser<'s, B> {
    move |src: &'s str, at: Pos| p(src, at).map(|(value, next)| (f(value), next))
}

/// Never fails; a failed inner parse consumes nothing.
pub fn opt<'s, A>(p: impl Parser<'s, A>) -> impl Parser<'s, Option<A>> {
    move |src: &'s str, at: Pos| match p(src, at) {
        Ok((value, next)) => Ok((Some(value), next)),
        Err(_) => Ok((None, at)),
    }
}

/// Applies `p` until it fails, collecting the successes. Never fails itself.
pub fn many0<'s, A>(p: impl Parser<'s, A>) -> impl Parser<'s, Vec<A>> {
    move |src: &'s str, at: Pos| {
        let mut out = Vec::new();
        let mut at = at;
        while let Ok((value, next)) = p(src, at) {
            if next == at {
                // a parser that consumes nothing would repeat forever
                break;
            }
            out.push(value);
            at = next;
        }
        Ok((out, at))
    }
}

/// Like [`many0`], but the first application must succeed.
pub fn many1<'s, A>(p: impl Parser<'s, A>) -> impl Parser<'s, Vec<A>> {
    move |src: &'s str, at: Pos| {
        let (first, mut at) = p(src, at)?;
        let mut out = vec![first];
        while let Ok((value, next)) = p(src, at) {
            if next == at {
                break;
            }
            out.push(value);
            at = next;
        }
        Ok((out, at))
    }
}

/// Runs `pa` then `pb` at the position `pa` left off. The first failure wins.
pub fn pair<'s, A, B>(pa: impl Parser<'s, A>, pb: impl Parser<'s, B>) -> impl Parser<'s, (A, B)> {
    move |src: &'s str, at: Pos| {
        let (a, next) = pa(src, at)?;
        let (b, end) = pb(src, next)?;
        Ok(((a, b), end))
    }
}

/// Sequences two parsers and keeps the left value.
pub fn left<'s, A, B>(pa: impl Parser<'s, A>, pb: impl Parser<'s, B>) -> impl Parser<'s, A> {
    map(pair(pa, pb), |(a, _)| a)
}

/// Sequences two parsers and keeps the right value.
pub fn right<'s, A, B>(pa: impl Parser<'s, A>, pb: impl Parser<'s, B>) -> impl Parser<'s, B> {
    map(pair(pa, pb), |(_, b)| b)
}

/// Tries each arm in order at the same position and returns the first
/// success. When every arm fails, the result records all of their failures
/// as causes.
pub fn choice<'s, T>(arms: Vec<BoxedParser<'s, T>>, expected: &'static str) -> impl Parser<'s, T> {
    move |src: &'s str, at: Pos| {
        let mut causes = Vec::with_capacity(arms.len());
        for arm in &arms {
            match arm(src, at) {
                Ok(hit) => return Ok(hit),
                Err(fail) => causes.push(fail),
            }
        }
        Err(Fail::with_causes(at, expected, causes))
    }
}

/// Applies `p` repeatedly until the input is fully consumed. The failure
/// that stopped the run is surfaced, so a file never half-parses silently.
pub fn parse_all<'s, T>(p: impl Parser<'s, T>) -> impl Parser<'s, Vec<T>> {
    move |src: &'s str, at: Pos| {
        let (out, end) = many0(&p)(src, at)?;
        if end == src.len() {
            return Ok((out, end));
        }
        match p(src, end) {
            Err(fail) => Err(fail),
            Ok(_) => Err(Fail::new(end, "end of input")),
        }
    }
}

fn trivia<'s>() -> impl Parser<'s, Trivia> {
    choice(vec![boxed(whitespace), boxed(comment)], "whitespace or comment")
}

/// An optional run of interleaved whitespace and comments.
pub fn padding<'s>() -> impl Parser<'s, Option<Vec<Trivia>>> {
    opt(many1(trivia()))
}

/// Brackets `p` with [`padding`] on both sides, so comments are legal
/// anywhere whitespace is.
pub fn wrap_padding<'s, T>(p: impl Parser<'s, T> + 's) -> impl Parser<'s, T> {
    left(right(padding(), p), padding())
}
