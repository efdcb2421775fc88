//! Serializable commit protocol
//!
//! Validation and application both run under the database mutex, so the
//! state checked is exactly the state mutated and commits linearize in
//! mutex-acquisition order.
//!
//! Validation is optimistic first-committer-wins over the transaction's
//! whole workspace. For each accessed key, compare the value visible at
//! the transaction's snapshot (`begin`) with the latest committed value
//! (`current`):
//!
//! | begin | current | verdict |
//! |-------|---------|---------|
//! | absent | absent | new key introduced by this transaction alone |
//! | absent | present | conflict: created by another transaction |
//! | present | absent | conflict: deleted by another transaction |
//! | both, versions differ | | conflict: updated by another transaction |
//!
//! A tombstone visible through fetch is a present value; "absent" means
//! the chain could not resolve any value at all. Because reads and writes
//! are validated alike, a key blindly written after another commit touched
//! it still conflicts, which is what closes the write-skew window.

use std::sync::Arc;

use memkv_core::{Error, Result};
use memkv_storage::{MultiValue, Value};
use rustc_hash::FxHashMap;
use tracing::{debug, error};

use crate::database::Database;

impl Database {
    /// Validate a transaction's accesses and apply its writes
    ///
    /// On conflict the store is left untouched. On success every written
    /// key advances to the new commit version in one linearization step
    /// and `max_commit_version` grows by exactly one.
    pub(crate) fn commit_transaction(
        &self,
        draft: u64,
        pinned: u64,
        accesses: &FxHashMap<String, Value>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let min_pinned = state.pins.min_pinned(state.max_commit_version);

        for key in accesses.keys() {
            if let Some(chain) = self.store.load(key) {
                let begin = chain.fetch(pinned);
                let current = chain.fetch(u64::MAX);
                let reason = match (begin, current) {
                    (None, None) => continue,
                    (None, Some(_)) => "created by another transaction",
                    (Some(_), None) => "deleted by another transaction",
                    (Some(b), Some(c)) => {
                        if b.version == c.version {
                            continue;
                        }
                        "updated by another transaction"
                    }
                };
                debug!(key = %key, draft, pinned, reason, "commit validation failed");
                return Err(Error::conflict(key, reason));
            }
        }

        let commit_version = state.max_commit_version + 1;

        for (key, value) in accesses {
            // Only keys this transaction wrote carry its draft version;
            // everything else in the workspace is a recorded read.
            if value.version != draft {
                continue;
            }

            let current = self.store.load_or_store(key, || Arc::new(MultiValue::new()));

            let mut committed = value.clone();
            committed.version = commit_version;

            let appended = current.append(committed);
            let next = match appended.compact(min_pinned) {
                Some(compacted) => compacted,
                None => appended,
            };

            // The commit mutex is held: nobody else can have replaced the
            // chain since we loaded it, so a CAS failure is corruption.
            if next.is_empty() {
                if !self.store.compare_and_delete(key, &current) {
                    error!(key = %key, "compare-and-delete failed under the commit mutex");
                    panic!("compare-and-delete failed under the commit mutex for key {key:?}");
                }
            } else if !self.store.compare_and_swap(key, &current, Arc::new(next)) {
                error!(key = %key, "compare-and-swap failed under the commit mutex");
                panic!("compare-and-swap failed under the commit mutex for key {key:?}");
            }
        }

        state.max_commit_version = commit_version;
        Ok(())
    }
}
