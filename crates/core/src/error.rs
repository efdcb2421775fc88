//! Error types for memkv
//!
//! A single `Error` enum covers every public operation. We use `thiserror`
//! for the `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! | Variant | Raised on |
//! |---------|-----------|
//! | `Invalid` | Empty key, inverted range |
//! | `NotExist` | Get of a missing or deleted key |
//! | `Closed` | Any operation after commit, rollback, or discard |
//! | `Conflict` | Commit rejected by serializable validation |
//! | `Cancelled` | Cancellation observed during iteration |
//! | `Io` / `Codec` | Backup file failures |
//!
//! `Conflict` is the only retryable kind: the transaction may be re-run
//! against fresh data. `Invalid` requires the input to change. A panic (not
//! an error) signals an engine invariant violation such as a failed
//! compare-and-swap under the commit mutex.

use std::io;
use thiserror::Error;

/// Result type alias for memkv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all memkv operations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid input: empty key or inverted range
    #[error("invalid argument: {reason}")]
    Invalid {
        /// What was wrong with the input
        reason: String,
    },

    /// Key is missing, or its visible value is a tombstone
    #[error("key does not exist: {key}")]
    NotExist {
        /// The key that was looked up
        key: String,
    },

    /// Operation on a handle that was already committed, rolled back,
    /// or discarded
    #[error("{handle} is closed")]
    Closed {
        /// Which kind of handle was used after teardown
        handle: &'static str,
    },

    /// Commit rejected by first-committer-wins validation
    #[error("commit conflict on key {key}: {reason}")]
    Conflict {
        /// First key that failed validation
        key: String,
        /// Which validation arm rejected the commit
        reason: &'static str,
    },

    /// Cancellation token fired during iteration
    #[error("operation cancelled")]
    Cancelled,

    /// I/O failure on the backup path
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// Encode/decode failure in the backup stream
    #[error("codec error: {message}")]
    Codec {
        /// What failed to encode or decode
        message: String,
    },
}

impl Error {
    /// Create an `Invalid` error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::Invalid {
            reason: reason.into(),
        }
    }

    /// Create a `NotExist` error for a key
    pub fn not_exist(key: impl Into<String>) -> Self {
        Error::NotExist { key: key.into() }
    }

    /// Create a `Closed` error for a handle kind (`"transaction"`,
    /// `"snapshot"`)
    pub fn closed(handle: &'static str) -> Self {
        Error::Closed { handle }
    }

    /// Create a `Conflict` error for a key
    pub fn conflict(key: impl Into<String>, reason: &'static str) -> Self {
        Error::Conflict {
            key: key.into(),
            reason,
        }
    }

    /// Create a `Codec` error
    pub fn codec(message: impl Into<String>) -> Self {
        Error::Codec {
            message: message.into(),
        }
    }

    /// Check if this error means the key was absent or deleted
    ///
    /// Range cursors use this to skip keys that resolved to nothing.
    pub fn is_not_exist(&self) -> bool {
        matches!(self, Error::NotExist { .. })
    }

    /// Check if this error is a commit conflict
    ///
    /// Conflicts are the only retryable errors: re-running the transaction
    /// against fresh data may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Check if this error is an input validation failure
    pub fn is_invalid(&self) -> bool {
        matches!(self, Error::Invalid { .. })
    }

    /// Check if this error came from a handle used after teardown
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed { .. })
    }

    /// Check if this error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Short wire code for this error, if it has one
    ///
    /// The remote session protocol encodes well-known errors as short
    /// strings and everything else as its display form.
    pub fn wire_code(&self) -> Option<&'static str> {
        match self {
            Error::Invalid { .. } => Some("ErrInvalid"),
            Error::NotExist { .. } => Some("ErrNotExist"),
            _ => None,
        }
    }
}
