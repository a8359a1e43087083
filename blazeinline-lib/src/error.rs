use thiserror::Error;

/// The input could not be turned into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("input is {len} bytes, exceeding the {limit} byte limit")]
    InputTooLarge { len: usize, limit: usize },

    #[error("malformed HTML ({count} parse errors, first: {first})")]
    Malformed { first: String, count: usize },
}

/// A selector the matcher cannot compile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot compile selector `{selector}`: {kind}")]
pub struct QueryError {
    pub selector: String,
    pub kind: QueryErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryErrorKind {
    #[error("expected a selector at offset {offset}")]
    ExpectedSelector { offset: usize },

    #[error("expected an identifier at offset {offset}")]
    ExpectedIdentifier { offset: usize },

    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("pseudo-classes and pseudo-elements are not supported (`{0}`)")]
    UnsupportedPseudo(String),

    #[error("escapes are only supported inside quoted attribute values")]
    UnsupportedEscape,

    #[error("combinator `{0}` has no right-hand selector")]
    DanglingCombinator(char),

    #[error("unterminated attribute selector")]
    UnterminatedAttribute,

    #[error("unterminated string")]
    UnterminatedString,
}

/// Failure of a whole inlining call.
#[derive(Error, Debug)]
pub enum InlineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("stylesheets total {len} bytes, exceeding the {limit} byte limit")]
    StylesheetTooLarge { len: usize, limit: usize },

    #[error("stylesheet could not be parsed: {0}")]
    Stylesheet(String),

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] std::io::Error),
}
