//! Error types for the lexer/parser front end and the storage/engine back end.

use std::fmt;

/// A span in the source statement text, as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start)
    }
}

/// Errors produced while tokenizing or parsing a statement.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("{message}")]
    Tokenizer { message: String, span: Span },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("unexpected token: {found}")]
    UnexpectedToken { found: String, span: Span },
    #[error("limit reached: {what}")]
    LimitReached { what: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ParseError::Tokenizer { span, .. } => Some(*span),
            ParseError::UnexpectedEnd => None,
            ParseError::UnexpectedToken { span, .. } => Some(*span),
            ParseError::LimitReached { span, .. } => Some(*span),
        }
    }
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors produced by the storage layer, the database, and the manager.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("could not open file")]
    BadFileOpen,
    #[error("could not close file")]
    BadFileClose,
    #[error("FileAlreadyOpened")]
    FileAlreadyOpened,
    #[error("file is closed")]
    FileClosed,
    #[error("limit reached")]
    LimitReached,
    #[error("could not stat directory")]
    DirStatError,
    #[error("could not create directory")]
    BadMkDir,
    #[error("already exists")]
    AlreadyExists,
    #[error("does not exist")]
    Missing,
    #[error("invalid file")]
    InvalidFile,
    #[error("no database selected")]
    NoActiveDatabase,
    #[error("dropping databases is disabled")]
    DropDatabaseDisabled,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// The bare variant name, as printed in REPL error messages like
    /// `!Failed to update. (FileAlreadyOpened)`.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::BadFileOpen => "BadFileOpen",
            EngineError::BadFileClose => "BadFileClose",
            EngineError::FileAlreadyOpened => "FileAlreadyOpened",
            EngineError::FileClosed => "FileClosed",
            EngineError::LimitReached => "LimitReached",
            EngineError::DirStatError => "DirStatError",
            EngineError::BadMkDir => "BadMkDir",
            EngineError::AlreadyExists => "AlreadyExists",
            EngineError::Missing => "Missing",
            EngineError::InvalidFile => "InvalidFile",
            EngineError::NoActiveDatabase => "NoActiveDatabase",
            EngineError::DropDatabaseDisabled => "DropDatabaseDisabled",
            EngineError::Io(_) => "Io",
            EngineError::Parse(_) => "Parse",
        }
    }
}

impl ParseError {
    /// The bare variant name, mirroring [`EngineError::code`].
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Tokenizer { .. } => "Tokenizer",
            ParseError::UnexpectedEnd => "UnexpectedEnd",
            ParseError::UnexpectedToken { .. } => "UnexpectedToken",
            ParseError::LimitReached { .. } => "LimitReached",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_point_has_length_one() {
        let s = Span::point(5);
        assert_eq!(s.start, 5);
        assert_eq!(s.end, 6);
    }

    #[test]
    fn engine_error_display() {
        let err = EngineError::FileAlreadyOpened;
        assert_eq!(format!("{}", err), "FileAlreadyOpened");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "nope");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::Io(_)));
    }
}
