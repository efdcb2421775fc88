//! Request and response envelopes
//!
//! Plain serde types; values travel as byte arrays. Requests that can
//! target either session kind carry both a `transaction` and a `snapshot`
//! field, exactly one of which must be non-empty.

use serde::{Deserialize, Serialize};

/// Create a read-write transaction session under a client-chosen name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTransactionRequest {
    /// Client-chosen session name
    pub name: String,
}

/// Create a read-only snapshot session under a client-chosen name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewSnapshotRequest {
    /// Client-chosen session name
    pub name: String,
}

/// Point read through a transaction or snapshot session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetRequest {
    /// Transaction session name (exclusive with `snapshot`)
    pub transaction: String,
    /// Snapshot session name (exclusive with `transaction`)
    pub snapshot: String,
    /// Key to read
    pub key: String,
}

/// Point read result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetResponse {
    /// Empty on success
    pub error: String,
    /// The value bytes
    pub value: Vec<u8>,
}

/// Point write through a transaction session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetRequest {
    /// Transaction session name
    pub transaction: String,
    /// Key to write
    pub key: String,
    /// Value bytes
    pub value: Vec<u8>,
}

/// Point delete through a transaction session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteRequest {
    /// Transaction session name
    pub transaction: String,
    /// Key to delete
    pub key: String,
}

/// Create a named range iterator over a session
///
/// Used by ascend and descend; the path selects the direction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeRequest {
    /// Transaction session name (exclusive with `snapshot`)
    pub transaction: String,
    /// Snapshot session name (exclusive with `transaction`)
    pub snapshot: String,
    /// Range begin; empty leaves the small side open
    pub begin: String,
    /// Range end (excluded); empty leaves the large side open
    pub end: String,
    /// Client-chosen iterator name
    pub name: String,
}

/// Create a named unordered iterator over a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRequest {
    /// Transaction session name (exclusive with `snapshot`)
    pub transaction: String,
    /// Snapshot session name (exclusive with `transaction`)
    pub snapshot: String,
    /// Client-chosen iterator name
    pub name: String,
}

/// Commit a transaction session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitRequest {
    /// Transaction session name
    pub transaction: String,
}

/// Roll back a transaction session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackRequest {
    /// Transaction session name
    pub transaction: String,
}

/// Discard a snapshot session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscardRequest {
    /// Snapshot session name
    pub snapshot: String,
}

/// Fetch from a named iterator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchRequest {
    /// Iterator name
    pub iterator: String,
    /// False reads the current position, true advances first
    pub advance: bool,
}

/// Iterator fetch result
///
/// `error` is `EOF` past the end of the range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchResponse {
    /// Empty on success, `EOF` at end of range
    pub error: String,
    /// Key at the iterator position
    pub key: String,
    /// Value at the iterator position
    pub value: Vec<u8>,
}

/// Response for operations that return no payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusResponse {
    /// Empty on success
    pub error: String,
}

impl StatusResponse {
    /// Success response
    pub fn ok() -> Self {
        StatusResponse::default()
    }

    /// Error response
    pub fn err(message: impl Into<String>) -> Self {
        StatusResponse {
            error: message.into(),
        }
    }

    /// True when the response carries no error
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }
}
