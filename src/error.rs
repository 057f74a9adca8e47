use std::fmt;

use thiserror::Error;

/// What went wrong during a decode.
///
/// The first error at any nesting depth aborts the whole decode call; callers
/// never see a partially decoded value.
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid integer literal")]
    InvalidInteger,

    #[error("invalid byte string length prefix")]
    InvalidByteString,

    #[error("unexpected character `{0}`")]
    UnexpectedCharacter(char),

    #[error("unexpected {found}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("missing field `{0}`")]
    MissingField(String),

    #[error("integer does not fit the target type")]
    IntegerOutOfRange,

    #[error("nesting deeper than {0} levels")]
    DepthExceeded(usize),

    #[error("trailing bytes after the root value")]
    TrailingData,

    #[error("{0}")]
    Message(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Decode error: an [`ErrorKind`] plus the byte offset it was raised at,
/// when the scanner knows one.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<usize>,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self { kind, offset: None }
    }

    pub(crate) fn at(kind: ErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset: Some(offset),
        }
    }

    pub(crate) fn unexpected_token(expected: &'static str, found: &'static str) -> Self {
        Self::new(ErrorKind::UnexpectedToken { expected, found })
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Byte offset into the input where the error was detected, if known.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at byte {}", self.kind, offset),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io(err))
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(ErrorKind::Message(msg.to_string()))
    }

    fn missing_field(field: &'static str) -> Self {
        Self::new(ErrorKind::MissingField(field.to_string()))
    }
}
