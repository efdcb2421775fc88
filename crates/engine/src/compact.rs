//! Compaction driver
//!
//! Commit-time compaction trims each chain it touches, but a key whose
//! latest value is a tombstone keeps at least that tombstone until someone
//! writes the key again. This driver finds those keys and deletes them
//! through an ordinary transaction, so removal goes through the same
//! validation and publication path as any other write.
//!
//! Only tombstones strictly below the minimum pin are touched: a live
//! snapshot can never observe a key vanishing out from under its pinned
//! version.

use std::sync::Arc;

use memkv_core::Result;
use tracing::info;

use crate::database::Database;

impl Database {
    /// Remove fully-deleted keys whose tombstones lie below the minimum pin
    ///
    /// Opportunistic maintenance, not part of the commit path. Returns the
    /// number of keys scheduled for removal. Fails with `Conflict` when a
    /// concurrent commit touched one of the scheduled keys; the pass can
    /// simply be retried.
    pub fn compact(self: &Arc<Self>) -> Result<usize> {
        let min_pinned = {
            let state = self.state.lock();
            state.pins.min_pinned(state.max_commit_version)
        };

        let mut tx = self.transaction();

        let mut doomed = Vec::new();
        self.store.for_each(|key, chain| {
            if let Some(latest) = chain.latest() {
                if latest.deleted && latest.version < min_pinned {
                    doomed.push(key.to_string());
                }
            }
            true
        });

        for key in &doomed {
            tx.delete(key)?;
        }
        tx.commit()?;

        if !doomed.is_empty() {
            info!(removed = doomed.len(), "compaction pass removed tombstoned keys");
        }
        Ok(doomed.len())
    }
}
