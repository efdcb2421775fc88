//! Capability traits
//!
//! Snapshots and transactions expose overlapping capabilities; these traits
//! name the individual capabilities so helpers and the remote session layer
//! can accept exactly what they need. A snapshot is a `Reader`; a
//! transaction is a `ReadWriter`.
//!
//! All receivers are `&mut self` even for read capabilities: a transaction's
//! get records the observed value in its private workspace for repeatable
//! reads and commit validation.

use crate::cursor::Cursor;
use crate::error::Result;

/// Point lookup
pub trait Getter {
    /// Read the value for a key. Fails with `NotExist` when no live value
    /// is visible, and `Invalid` for an empty key.
    fn get(&mut self, key: &str) -> Result<Vec<u8>>;
}

/// Point write
pub trait Setter {
    /// Create or update a key-value pair. Fails with `Invalid` for an
    /// empty key.
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
}

/// Point delete
pub trait Deleter {
    /// Remove a key-value pair. Deleting a missing key succeeds.
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Ordered range iteration
///
/// Ranges are half-open `[begin, end)`. An empty `begin` means the smallest
/// key; an empty `end` extends the range past the largest key. When both
/// endpoints are non-empty, `begin > end` fails with `Invalid`.
pub trait Ranger {
    /// Iterate the range in ascending key order.
    fn ascend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>>;

    /// Iterate the range in descending key order.
    fn descend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>>;
}

/// Full iteration without ordering guarantees
pub trait Scanner {
    /// Visit every key-value pair exactly once, in no particular order.
    fn scan(&mut self) -> Result<Cursor<'_>>;
}

/// Read capabilities: point gets plus ordered and unordered iteration
pub trait Reader: Getter + Ranger + Scanner {}
impl<T: Getter + Ranger + Scanner> Reader for T {}

/// Write capabilities: set and delete
pub trait Writer: Setter + Deleter {}
impl<T: Setter + Deleter> Writer for T {}

/// Combined read and write capabilities
pub trait ReadWriter: Reader + Writer {}
impl<T: Reader + Writer> ReadWriter for T {}
