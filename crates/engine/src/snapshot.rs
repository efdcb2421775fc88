//! Read-only snapshots
//!
//! A snapshot observes, for every key, the value with the largest commit
//! version at or below its pinned version. The view is stable: concurrent
//! commits never change what an open snapshot sees, and readers take no
//! locks. Discard releases the pin; the drop guard covers every other exit
//! path so the pin is released exactly once.

use std::sync::Arc;

use memkv_core::cursor::{narrow, validate_range, Cursor, Direction};
use memkv_core::{Error, Getter, Ranger, Result, Scanner};

use crate::database::Database;

/// Read-only view of the database at a pinned commit version
///
/// Snapshots are not thread-safe: each is used by a single agent at a
/// time. They are cheap to create (one pin under the database mutex) and
/// hold no data of their own.
#[derive(Debug)]
pub struct Snapshot {
    db: Option<Arc<Database>>,
    pinned: u64,
}

impl Snapshot {
    pub(crate) fn new(db: Arc<Database>, pinned: u64) -> Self {
        Snapshot {
            db: Some(db),
            pinned,
        }
    }

    fn db(&self) -> Result<&Arc<Database>> {
        self.db.as_ref().ok_or_else(|| Error::closed("snapshot"))
    }

    /// The commit version this snapshot observes
    pub fn version(&self) -> u64 {
        self.pinned
    }

    /// Read the value for `key` as of the pinned version
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let db = self.db()?;
        if key.is_empty() {
            return Err(Error::invalid("empty key"));
        }
        if let Some(chain) = db.store.load(key) {
            if let Some(value) = chain.fetch(self.pinned) {
                if !value.deleted {
                    return Ok(value.data.clone());
                }
            }
        }
        Err(Error::not_exist(key))
    }

    /// Materialize the sorted, narrowed key list for a range operation
    ///
    /// Exposed for the remote session layer, which resolves values through
    /// `get` one fetch at a time instead of holding a borrowing cursor.
    pub fn range_keys(
        &self,
        begin: &str,
        end: &str,
        direction: Direction,
    ) -> Result<Vec<String>> {
        let db = self.db()?;
        validate_range(begin, end)?;
        let mut keys = db.store.keys(|_| false);
        keys.sort_unstable();
        let mut keys = narrow(keys, begin, end);
        if direction == Direction::Descending {
            keys.reverse();
        }
        Ok(keys)
    }

    /// Materialize the unordered key list for a scan
    pub fn scan_keys(&self) -> Result<Vec<String>> {
        Ok(self.db()?.store.keys(|_| false))
    }

    /// Iterate `[begin, end)` in ascending key order
    ///
    /// Empty endpoints follow the open-range conventions; see
    /// [`memkv_core::cursor::narrow`].
    pub fn ascend(&self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        let keys = self.range_keys(begin, end, Direction::Ascending)?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Iterate `[begin, end)` in descending key order
    pub fn descend(&self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        let keys = self.range_keys(begin, end, Direction::Descending)?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Visit every key exactly once, in no particular order
    pub fn scan(&self) -> Result<Cursor<'_>> {
        let keys = self.scan_keys()?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Release the snapshot
    ///
    /// Further operations fail with `Closed`. Discarding twice is an
    /// error.
    pub fn discard(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => {
                db.release_pin(self.pinned);
                Ok(())
            }
            None => Err(Error::closed("snapshot")),
        }
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            db.release_pin(self.pinned);
        }
    }
}

impl Getter for Snapshot {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        Snapshot::get(self, key)
    }
}

impl Ranger for Snapshot {
    fn ascend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        Snapshot::ascend(self, begin, end)
    }

    fn descend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        Snapshot::descend(self, begin, end)
    }
}

impl Scanner for Snapshot {
    fn scan(&mut self) -> Result<Cursor<'_>> {
        Snapshot::scan(self)
    }
}
