//! Error types for the Falchion library.
//!
//! All fallible operations return [`FalchionError`]. Errors that a postings
//! store records about itself (so that callers can inspect them later via
//! [`PostingsStore::last_error`](crate::postings::PostingsStore::last_error))
//! are classified by the small `Copy` enum [`ErrorKind`].
//!
//! # Examples
//!
//! ```
//! use falchion::error::{ErrorKind, FalchionError, Result};
//!
//! fn begin() -> Result<()> {
//!     Err(FalchionError::protocol_violation("docno must increase"))
//! }
//!
//! let err = begin().unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::ProtocolViolation);
//! ```

use std::io;

use anyhow;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The main error type for Falchion operations.
#[derive(Error, Debug)]
pub enum FalchionError {
    /// I/O errors raised by a dump sink or while reading dump files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An allocation or buffer growth failed.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// The begin/add/finalize/dump call sequence was not respected.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Encoded postings or dump records could not be decoded.
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// Invalid argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with FalchionError.
pub type Result<T> = std::result::Result<T, FalchionError>;

/// Coarse classification of a [`FalchionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutOfMemory,
    Io,
    ProtocolViolation,
    Corrupt,
    InvalidArgument,
    Other,
}

impl FalchionError {
    /// Create a new out-of-memory error.
    pub fn out_of_memory<S: Into<String>>(msg: S) -> Self {
        FalchionError::OutOfMemory(msg.into())
    }

    /// Create a new protocol violation error.
    pub fn protocol_violation<S: Into<String>>(msg: S) -> Self {
        FalchionError::ProtocolViolation(msg.into())
    }

    /// Create a new corrupt data error.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        FalchionError::Corrupt(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        FalchionError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        FalchionError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        FalchionError::Other(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FalchionError::Io(_) => ErrorKind::Io,
            FalchionError::OutOfMemory(_) => ErrorKind::OutOfMemory,
            FalchionError::ProtocolViolation(_) => ErrorKind::ProtocolViolation,
            FalchionError::Corrupt(_) => ErrorKind::Corrupt,
            FalchionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            FalchionError::Json(_) | FalchionError::Other(_) | FalchionError::Anyhow(_) => {
                ErrorKind::Other
            }
        }
    }
}
