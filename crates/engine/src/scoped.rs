//! Scoped snapshot and transaction helpers
//!
//! Run a closure under a temporary view with release guaranteed on every
//! exit path. The drop guards on `Snapshot` and `Transaction` cover early
//! returns and panics; the helpers add commit-on-success semantics.

use std::sync::Arc;

use memkv_core::Result;

use crate::database::Database;
use crate::snapshot::Snapshot;
use crate::transaction::Transaction;

/// Run `body` under a temporary snapshot
///
/// The snapshot is discarded when `body` returns, whatever the outcome.
///
/// # Example
///
/// ```
/// use memkv_engine::{with_snapshot, with_transaction, Database};
///
/// let db = Database::new();
/// with_transaction(&db, |tx| tx.set("k", b"v"))?;
/// let value = with_snapshot(&db, |snap| snap.get("k"))?;
/// assert_eq!(value, b"v".to_vec());
/// # Ok::<(), memkv_core::Error>(())
/// ```
pub fn with_snapshot<T, F>(db: &Arc<Database>, body: F) -> Result<T>
where
    F: FnOnce(&mut Snapshot) -> Result<T>,
{
    let mut snapshot = db.snapshot();
    let result = body(&mut snapshot);
    // Explicit discard on the ordinary path; the drop guard covers panics.
    let _ = snapshot.discard();
    result
}

/// Run `body` under a temporary transaction
///
/// Commits when `body` returns `Ok`, rolls back when it returns `Err`.
/// A commit conflict is returned to the caller, who may retry the whole
/// helper.
pub fn with_transaction<T, F>(db: &Arc<Database>, body: F) -> Result<T>
where
    F: FnOnce(&mut Transaction) -> Result<T>,
{
    let mut tx = db.transaction();
    match body(&mut tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            let _ = tx.rollback();
            Err(err)
        }
    }
}
