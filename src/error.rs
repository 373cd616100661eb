//! Closed error enumerations surfaced at each crate boundary.

use std::fmt;

use thiserror::Error;

/// Errors produced while tokenizing or parsing rule source files.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{file}:{line}: {message}")]
    Syntax {
        file: String,
        line: u32,
        message: String,
    },

    #[error("duplicate rule for segments {0:?}")]
    DuplicateRule(Vec<String>),

    #[error("apply_to '{name}' does not name an existing rule (referenced from {file}:{line})")]
    UnresolvedApplyTo { name: String, file: String, line: u32 },

    #[error("rule '{0}' has no category and no country tag to default from")]
    MissingCategory(String),

    #[error("too many rules: {0} exceeds the u16 index space")]
    TooManyRules(usize),

    #[error("rule depth {0} exceeds the 7-level cap assumed by max_level")]
    TooDeep(usize),

    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' is not valid UTF-8")]
    InvalidUtf8 { path: String },
}

impl CompileError {
    pub fn syntax(file: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self::Syntax {
            file: file.into(),
            line,
            message: message.into(),
        }
    }
}

/// Errors produced while validating and loading a compiled binary rule file.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    #[error("unrecognized file (bad magic or type tag)")]
    UnrecognizedFile,
    #[error("invalid file size")]
    InvalidFileSize,
    #[error("invalid chunk size")]
    InvalidHunkSize,
    #[error("invalid structure size")]
    InvalidStructureSize,
    #[error("invalid array size")]
    InvalidArraySize,
    #[error("unsupported format version")]
    UnsupportedVersion,
    #[error("chunk found twice")]
    HunkFoundTwice,
    #[error("a required chunk is missing")]
    MissingHunk,
    #[error("cannot open file")]
    CannotOpenFile,
    #[error("cannot read file")]
    CannotReadFile,
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid pointer")]
    InvalidPointer,
}

/// The outcome of a lookup, excluding the `Success`/`Invalid` cases which
/// carry a [`crate::status::Status`] and are folded into `LookupInfo` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    Null,
    NoTld,
    BadUri,
    NotFound,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Null => "NULL",
            Self::NoTld => "NO_TLD",
            Self::BadUri => "BAD_URI",
            Self::NotFound => "NOT_FOUND",
        };
        f.write_str(s)
    }
}

impl std::error::Error for LookupError {}
