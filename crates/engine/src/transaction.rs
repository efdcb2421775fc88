//! Read-write transactions
//!
//! A transaction keeps a private workspace (`accesses`) with one entry per
//! key it has touched: reads record the observed committed value, writes
//! record a draft value carrying the transaction's draft version. The
//! workspace gives repeatable reads, shadows the store for this
//! transaction's own operations, and is exactly what commit validation
//! walks.
//!
//! A key read after it was written answers from the draft entry. A read of
//! a key with no observable value records nothing, so creating a key that
//! another transaction only observed as absent does not conflict.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use memkv_core::cursor::{narrow, validate_range, Cursor, Direction};
use memkv_core::{Deleter, Error, Getter, Ranger, Result, Scanner, Setter};
use memkv_storage::Value;

use crate::database::Database;

/// Read-write handle with optimistic commit validation
///
/// Not thread-safe: a transaction is used by a single agent at a time.
/// Commit and rollback close the handle; later operations fail with
/// `Closed`. Dropping an open transaction rolls it back.
#[derive(Debug)]
pub struct Transaction {
    db: Option<Arc<Database>>,
    draft: u64,
    pinned: u64,
    accesses: FxHashMap<String, Value>,
}

impl Transaction {
    pub(crate) fn new(db: Arc<Database>, draft: u64, pinned: u64) -> Self {
        Transaction {
            db: Some(db),
            draft,
            pinned,
            accesses: FxHashMap::default(),
        }
    }

    fn db(&self) -> Result<&Arc<Database>> {
        self.db.as_ref().ok_or_else(|| Error::closed("transaction"))
    }

    /// The commit version this transaction reads as of
    pub fn pinned_version(&self) -> u64 {
        self.pinned
    }

    /// The unique draft version assigned at open time
    pub fn draft_version(&self) -> u64 {
        self.draft
    }

    /// Read the value for `key`
    ///
    /// Answers from the private workspace when the key was already read or
    /// written in this transaction; otherwise reads the store as of the
    /// pinned version and records the observed value.
    pub fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        let db = Arc::clone(self.db()?);
        if key.is_empty() {
            return Err(Error::invalid("empty key"));
        }

        if let Some(value) = self.accesses.get(key) {
            if value.deleted {
                return Err(Error::not_exist(key));
            }
            return Ok(value.data.clone());
        }

        if let Some(chain) = db.store.load(key) {
            if let Some(found) = chain.fetch(self.pinned) {
                let observed = found.clone();
                let result = if observed.deleted {
                    Err(Error::not_exist(key))
                } else {
                    Ok(observed.data.clone())
                };
                self.accesses.insert(key.to_string(), observed);
                return result;
            }
        }

        Err(Error::not_exist(key))
    }

    /// Create or update `key`
    ///
    /// Values observed from the store are never modified in place; the
    /// draft entry replaces them in the workspace.
    pub fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.db()?;
        if key.is_empty() {
            return Err(Error::invalid("empty key"));
        }

        match self.accesses.get_mut(key) {
            Some(entry) if entry.version == self.draft => {
                entry.data = value.to_vec();
                entry.deleted = false;
            }
            _ => {
                self.accesses
                    .insert(key.to_string(), Value::live(self.draft, value.to_vec()));
            }
        }
        Ok(())
    }

    /// Delete `key` by installing a draft tombstone
    ///
    /// Deleting a key with no live value succeeds; the tombstone is still
    /// validated against the snapshot at commit time.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.db()?;
        if key.is_empty() {
            return Err(Error::invalid("empty key"));
        }

        match self.accesses.get_mut(key) {
            Some(entry) if entry.version == self.draft => {
                entry.data = Vec::new();
                entry.deleted = true;
            }
            _ => {
                self.accesses
                    .insert(key.to_string(), Value::tombstone(self.draft));
            }
        }
        Ok(())
    }

    /// Materialize the sorted, narrowed key list for a range operation
    ///
    /// The list is the union of store keys and workspace keys, so keys
    /// created by this transaction appear and every fetched pair counts as
    /// a read. Exposed for the remote session layer.
    pub fn range_keys(
        &self,
        begin: &str,
        end: &str,
        direction: Direction,
    ) -> Result<Vec<String>> {
        let db = self.db()?;
        validate_range(begin, end)?;
        let mut keys = db.store.keys(|key| self.accesses.contains_key(key));
        keys.extend(self.accesses.keys().cloned());
        keys.sort_unstable();
        let mut keys = narrow(keys, begin, end);
        if direction == Direction::Descending {
            keys.reverse();
        }
        Ok(keys)
    }

    /// Materialize the unordered key list for a scan
    pub fn scan_keys(&self) -> Result<Vec<String>> {
        let db = self.db()?;
        let mut keys = db.store.keys(|key| self.accesses.contains_key(key));
        keys.extend(self.accesses.keys().cloned());
        Ok(keys)
    }

    /// Iterate `[begin, end)` in ascending key order
    ///
    /// The cursor resolves values through this transaction's `get`, so
    /// private writes and tombstones are honored per element.
    pub fn ascend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        let keys = self.range_keys(begin, end, Direction::Ascending)?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Iterate `[begin, end)` in descending key order
    pub fn descend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        let keys = self.range_keys(begin, end, Direction::Descending)?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Visit every key exactly once, in no particular order
    pub fn scan(&mut self) -> Result<Cursor<'_>> {
        let keys = self.scan_keys()?;
        Ok(Cursor::new(keys, move |key| self.get(key)))
    }

    /// Validate and atomically apply this transaction's changes
    ///
    /// First-committer-wins: the commit succeeds iff every key this
    /// transaction read or wrote is unchanged in the store since its
    /// snapshot. On conflict the store is untouched and the error is
    /// retryable. Either way the transaction is closed and its pin
    /// released.
    pub fn commit(&mut self) -> Result<()> {
        let db = self.db.take().ok_or_else(|| Error::closed("transaction"))?;
        let result = db.commit_transaction(self.draft, self.pinned, &self.accesses);
        db.release_pin(self.pinned);
        result
    }

    /// Drop all changes without conflict checking
    pub fn rollback(&mut self) -> Result<()> {
        match self.db.take() {
            Some(db) => {
                db.release_pin(self.pinned);
                Ok(())
            }
            None => Err(Error::closed("transaction")),
        }
    }

}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(db) = self.db.take() {
            db.release_pin(self.pinned);
        }
    }
}

impl Getter for Transaction {
    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        Transaction::get(self, key)
    }
}

impl Setter for Transaction {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        Transaction::set(self, key, value)
    }
}

impl Deleter for Transaction {
    fn delete(&mut self, key: &str) -> Result<()> {
        Transaction::delete(self, key)
    }
}

impl Ranger for Transaction {
    fn ascend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        Transaction::ascend(self, begin, end)
    }

    fn descend(&mut self, begin: &str, end: &str) -> Result<Cursor<'_>> {
        Transaction::descend(self, begin, end)
    }
}

impl Scanner for Transaction {
    fn scan(&mut self) -> Result<Cursor<'_>> {
        Transaction::scan(self)
    }
}

#[cfg(test)]
mod tests {
    static_assertions::assert_impl_all!(super::Transaction: Send);
    use super::*;

    fn seed(db: &Arc<Database>, pairs: &[(&str, &str)]) {
        let mut tx = db.transaction();
        for (k, v) in pairs {
            tx.set(k, v.as_bytes()).unwrap();
        }
        tx.commit().unwrap();
    }

    #[test]
    fn test_read_your_writes() {
        let db = Database::new();
        let mut tx = db.transaction();
        tx.set("k", b"v").unwrap();
        assert_eq!(tx.get("k").unwrap(), b"v".to_vec());
        tx.set("k", b"v2").unwrap();
        assert_eq!(tx.get("k").unwrap(), b"v2".to_vec());
    }

    #[test]
    fn test_delete_then_get_is_not_exist() {
        let db = Database::new();
        seed(&db, &[("k", "v")]);
        let mut tx = db.transaction();
        assert_eq!(tx.get("k").unwrap(), b"v".to_vec());
        tx.delete("k").unwrap();
        assert!(tx.get("k").unwrap_err().is_not_exist());
        // Re-setting after delete revives the key within the transaction.
        tx.set("k", b"back").unwrap();
        assert_eq!(tx.get("k").unwrap(), b"back".to_vec());
    }

    #[test]
    fn test_delete_missing_key_succeeds() {
        let db = Database::new();
        let mut tx = db.transaction();
        tx.delete("never-existed").unwrap();
        tx.commit().unwrap();
    }

    #[test]
    fn test_empty_key_is_invalid() {
        let db = Database::new();
        let mut tx = db.transaction();
        assert!(tx.get("").unwrap_err().is_invalid());
        assert!(tx.set("", b"v").unwrap_err().is_invalid());
        assert!(tx.delete("").unwrap_err().is_invalid());
        tx.rollback().unwrap();
    }

    #[test]
    fn test_repeatable_reads_under_concurrent_commit() {
        let db = Database::new();
        seed(&db, &[("k", "old")]);

        let mut tx = db.transaction();
        assert_eq!(tx.get("k").unwrap(), b"old".to_vec());

        seed(&db, &[("k", "new")]);

        // Still the old value: the first read was recorded.
        assert_eq!(tx.get("k").unwrap(), b"old".to_vec());
    }

    #[test]
    fn test_range_merges_private_writes() {
        let db = Database::new();
        seed(&db, &[("a", "1"), ("c", "3")]);

        let mut tx = db.transaction();
        tx.set("b", b"2").unwrap();
        tx.delete("c").unwrap();

        let mut cursor = tx.ascend("", "").unwrap();
        let mut seen = Vec::new();
        while let Some((key, value)) = cursor.next().unwrap() {
            seen.push((key, value));
        }
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), b"1".to_vec()),
                ("b".to_string(), b"2".to_vec()),
            ]
        );
        drop(cursor);
        tx.rollback().unwrap();
    }

    #[test]
    fn test_cursor_does_not_reveal_later_inserts() {
        let db = Database::new();
        seed(&db, &[("a", "1")]);

        let mut tx = db.transaction();
        let mut cursor = tx.ascend("", "").unwrap();
        // Key list is captured at creation; nothing new can appear.
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn test_operations_after_commit_fail() {
        let db = Database::new();
        let mut tx = db.transaction();
        tx.set("k", b"v").unwrap();
        tx.commit().unwrap();

        assert!(tx.get("k").unwrap_err().is_closed());
        assert!(tx.set("k", b"v").unwrap_err().is_closed());
        assert!(tx.delete("k").unwrap_err().is_closed());
        assert!(tx.scan().unwrap_err().is_closed());
        assert!(tx.commit().unwrap_err().is_closed());
        assert!(tx.rollback().unwrap_err().is_closed());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let db = Database::new();
        let mut tx = db.transaction();
        tx.set("k", b"v").unwrap();
        tx.rollback().unwrap();

        let snap = db.snapshot();
        assert!(snap.get("k").unwrap_err().is_not_exist());
    }

    #[test]
    fn test_drop_rolls_back() {
        let db = Database::new();
        {
            let mut tx = db.transaction();
            tx.set("k", b"v").unwrap();
            // No commit; handle dropped here.
        }
        assert_eq!(db.pin_count(0), 0);
        let snap = db.snapshot();
        assert!(snap.get("k").unwrap_err().is_not_exist());
    }
}
