use thiserror::Error;

/// The template text itself is malformed; nothing was compiled.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("unterminated directive: `<%` at byte {offset} has no matching `%>`")]
    UnterminatedDirective { offset: usize },
}

/// The generated source body is not a valid program.
///
/// `Syntax` carries the offending generated line so callers can see exactly
/// which statement the template expanded into.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("syntax error on generated line {line}: {message} in `{source_line}`")]
    Syntax {
        line: usize,
        source_line: String,
        message: String,
    },
}

/// A directive failed while executing against the supplied context.
///
/// Render errors never invalidate the compiled unit; the same unit can be
/// rendered again with a corrected context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("undefined name `{0}`")]
    UndefinedName(String),
    #[error("attribute `{0}` not found")]
    Attribute(String),
    #[error("index {index} out of bounds for array of length {len}")]
    Index { index: i64, len: usize },
    #[error("cannot render a {0} value")]
    Unprintable(&'static str),
    #[error("type error: {0}")]
    Type(String),
}
