//! Range cursor over a materialized key list
//!
//! Ascend, descend, and scan operations materialize the set of keys up
//! front and hand the ordered list to a `Cursor` together with a getter
//! callback. The getter resolves each key at fetch time, so a transaction
//! cursor observes the transaction's own writes and tombstones, and every
//! fetched pair counts as a read of that transaction.
//!
//! Keys inserted after the cursor was created are not revealed: the key
//! list has already been captured.
//!
//! # Example
//!
//! ```
//! use memkv_core::{Cursor, Error};
//!
//! let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
//! let mut cursor = Cursor::new(keys, |key| match key {
//!     "b" => Err(Error::not_exist(key)), // skipped
//!     _ => Ok(key.as_bytes().to_vec()),
//! });
//!
//! let (key, value) = cursor.next().unwrap().unwrap();
//! assert_eq!((key.as_str(), value), ("a", b"a".to_vec()));
//! let (key, _) = cursor.next().unwrap().unwrap();
//! assert_eq!(key, "c");
//! assert!(cursor.next().unwrap().is_none());
//! ```

use crate::cancel::CancelToken;
use crate::error::Result;

/// Iteration order of a range operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Smallest key first
    Ascending,
    /// Largest key first
    Descending,
}

/// Check the half-open range convention for a pair of endpoints
///
/// Both endpoints non-empty and `begin > end` is an inverted range and
/// fails with `Invalid`. An empty endpoint is an open side and is always
/// valid.
pub fn validate_range(begin: &str, end: &str) -> Result<()> {
    if !begin.is_empty() && !end.is_empty() && begin > end {
        return Err(crate::error::Error::invalid(format!(
            "inverted range: begin {begin:?} > end {end:?}"
        )));
    }
    Ok(())
}

/// Narrow an ascending-sorted key list to the half-open range `[begin, end)`
///
/// Empty endpoints leave that side of the range open:
///
/// | begin | end | keys kept |
/// |-------|-----|-----------|
/// | `"b"` | `"d"` | `b <= k < d` |
/// | `"b"` | `""`  | `k >= b` |
/// | `""`  | `"d"` | `k < d` |
/// | `""`  | `""`  | all |
///
/// The caller is responsible for running [`validate_range`] first.
pub fn narrow(sorted: Vec<String>, begin: &str, end: &str) -> Vec<String> {
    let start = if begin.is_empty() {
        0
    } else {
        sorted.partition_point(|k| k.as_str() < begin)
    };
    let stop = if end.is_empty() {
        sorted.len()
    } else {
        sorted.partition_point(|k| k.as_str() < end)
    };
    if start >= stop {
        return Vec::new();
    }
    sorted[start..stop].to_vec()
}

/// Cursor over a captured key list with a value-resolving callback
///
/// `next` yields `(key, value)` pairs in list order, skipping keys whose
/// getter answers `NotExist` (deleted under a transaction's tombstone, or
/// deleted as of a snapshot's version). `Ok(None)` signals the end of the
/// range. Any other getter error aborts the fetch and is returned as-is.
pub struct Cursor<'v> {
    getter: Box<dyn FnMut(&str) -> Result<Vec<u8>> + 'v>,
    keys: Vec<String>,
    index: usize,
    cancel: CancelToken,
}

impl<'v> Cursor<'v> {
    /// Create a cursor over `keys`, resolving values through `getter`
    pub fn new<G>(keys: Vec<String>, getter: G) -> Self
    where
        G: FnMut(&str) -> Result<Vec<u8>> + 'v,
    {
        Cursor {
            getter: Box::new(getter),
            keys,
            index: 0,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancellation token
    ///
    /// Once the token fires, every subsequent `next` fails with
    /// `Cancelled`. Cancellation is observed between elements; it does not
    /// interrupt an in-progress fetch.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Fetch the next key-value pair, or `Ok(None)` at end of range
    pub fn next(&mut self) -> Result<Option<(String, Vec<u8>)>> {
        self.cancel.check()?;
        while self.index < self.keys.len() {
            let key = &self.keys[self.index];
            match (self.getter)(key) {
                Ok(value) => {
                    let key = key.clone();
                    self.index += 1;
                    return Ok(Some((key, value)));
                }
                Err(e) if e.is_not_exist() => {
                    self.index += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Number of keys not yet visited
    ///
    /// Counts remaining candidates, including keys that will be skipped.
    pub fn remaining(&self) -> usize {
        self.keys.len() - self.index
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("keys", &self.keys.len())
            .field("index", &self.index)
            .finish()
    }
}
