//! Centralized error types for mailpeel.

use std::path::PathBuf;
use thiserror::Error;

use crate::output::guard::LimitExceeded;

/// All errors produced by the mailpeel library.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The top-level input file does not exist.
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    /// The format path is empty, does not end in `EML`, or ran out mid-traversal.
    #[error("Invalid format path: {0}")]
    InvalidFormatPath(String),

    /// A format tag other than `ZIP` or `EML` was requested.
    #[error("Unsupported format tag: '{0}' (expected ZIP or EML)")]
    UnsupportedFormatTag(String),

    /// The content could not be parsed as a MIME message.
    #[error("Failed to parse message '{name}': {reason}")]
    MessageParse { name: String, reason: String },

    /// I/O failure, including malformed ZIP structure.
    #[error("I/O error in '{context}': {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// The size guard tripped while writing an output file.
    #[error("Output size limit of {limit} bytes exceeded while writing '{path}'")]
    OutputLimitExceeded { path: PathBuf, limit: u64 },
}

/// Convenience alias for `Result<T, ExtractError>`.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Create an `Io` variant from a context label and an `io::Error`.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap a ZIP structure error as an I/O failure on the named archive.
    pub fn archive(name: impl Into<String>, source: zip::result::ZipError) -> Self {
        Self::io(name, std::io::Error::from(source))
    }

    /// Create a `MessageParse` variant.
    pub fn parse(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MessageParse {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify a failed write to an output file.
    ///
    /// The size guard reports through `io::Error`; its payload is unwrapped
    /// back into `OutputLimitExceeded` here.
    pub fn from_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let limit = source
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<LimitExceeded>())
            .map(|exceeded| exceeded.limit);
        match limit {
            Some(limit) => Self::OutputLimitExceeded { path, limit },
            None => Self::io(path.display().to_string(), source),
        }
    }

    /// `true` for failures the ZIP-entry loop may log and step over.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MessageParse { .. } | Self::Io { .. })
    }
}
