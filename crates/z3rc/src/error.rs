use std::fmt;

use z3_sys::ErrorCode;

/// Category of an error reported by the Z3 engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineErrorKind {
    /// Arguments of the wrong sort were combined.
    SortError,
    /// Index out of bounds.
    IndexOutOfBounds,
    /// Invalid argument for the API call.
    InvalidArg,
    /// Parser error.
    ParserError,
    /// Parser output is not available.
    NoParser,
    /// Invalid quantifier pattern.
    InvalidPattern,
    /// Memory allocation failure.
    MemoutFail,
    /// File access failure.
    FileAccessError,
    /// Engine internal error.
    InternalFatal,
    /// The API was used in an invalid way (e.g. no model available).
    InvalidUsage,
    /// Reference count dropped below zero.
    DecRefError,
    /// Any other engine exception.
    Exception,
}

impl EngineErrorKind {
    /// Map a raw Z3 error code. `ErrorCode::OK` has no kind.
    pub(crate) fn from_code(code: ErrorCode) -> Option<Self> {
        let kind = match code {
            ErrorCode::OK => return None,
            ErrorCode::SortError => Self::SortError,
            ErrorCode::IOB => Self::IndexOutOfBounds,
            ErrorCode::InvalidArg => Self::InvalidArg,
            ErrorCode::ParserError => Self::ParserError,
            ErrorCode::NoParser => Self::NoParser,
            ErrorCode::InvalidPattern => Self::InvalidPattern,
            ErrorCode::MemoutFail => Self::MemoutFail,
            ErrorCode::FileAccessError => Self::FileAccessError,
            ErrorCode::InternalFatal => Self::InternalFatal,
            ErrorCode::InvalidUsage => Self::InvalidUsage,
            ErrorCode::DecRefError => Self::DecRefError,
            ErrorCode::Exception => Self::Exception,
        };
        Some(kind)
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SortError => "sort error",
            Self::IndexOutOfBounds => "index out of bounds",
            Self::InvalidArg => "invalid argument",
            Self::ParserError => "parser error",
            Self::NoParser => "no parser",
            Self::InvalidPattern => "invalid pattern",
            Self::MemoutFail => "out of memory",
            Self::FileAccessError => "file access error",
            Self::InternalFatal => "internal fatal error",
            Self::InvalidUsage => "invalid usage",
            Self::DecRefError => "dec_ref error",
            Self::Exception => "exception",
        };
        f.write_str(name)
    }
}

/// Errors from the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Z3Error {
    /// The engine rejected a call; `message` is Z3's own description.
    Engine {
        kind: EngineErrorKind,
        message: String,
    },
    /// The engine returned a null handle of the named kind without setting an error code.
    NullHandle(&'static str),
    /// A handle owned by one context was passed to an operation on another.
    ContextMismatch,
    /// A symbol or parameter name contained an interior NUL byte.
    InvalidName(String),
}

impl fmt::Display for Z3Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Z3Error::Engine { kind, message } => write!(f, "Z3 {kind}: {message}"),
            Z3Error::NullHandle(what) => write!(f, "Z3 returned a null {what}"),
            Z3Error::ContextMismatch => {
                write!(f, "handle belongs to a different Z3 context")
            }
            Z3Error::InvalidName(name) => write!(f, "name contains a NUL byte: {name:?}"),
        }
    }
}

impl std::error::Error for Z3Error {}
