//! Database core
//!
//! A `Database` owns three things:
//! - the concurrent key map (`KeyStore`), read lock-free by snapshots and
//!   transactions and mutated only by the commit path,
//! - the version-pin table, recording which commit versions are still
//!   reachable by live views,
//! - the two monotonic counters: `max_commit_version` (bumped by exactly
//!   one per successful commit) and `last_tx_version` (a unique draft
//!   version per transaction).
//!
//! One mutex guards the counters and the pin table, and serializes the
//! whole commit validate-and-apply critical section. Snapshot and
//! transaction creation take it only briefly to pin the current commit
//! version.

use parking_lot::Mutex;
use std::sync::Arc;

use memkv_storage::{KeyStore, MultiValue, Value, VersionPins};

use crate::snapshot::Snapshot;
use crate::transaction::Transaction;

/// The version scalars and pin table, guarded by the database mutex
#[derive(Debug, Default)]
pub(crate) struct VersionState {
    pub(crate) pins: VersionPins,
    pub(crate) max_commit_version: u64,
    pub(crate) last_tx_version: u64,
}

/// Point-in-time copy of the database version counters
///
/// Taken under the mutex; used by the backup header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCounters {
    /// Most recently assigned draft version
    pub last_tx_version: u64,
    /// Most recently committed version
    pub max_commit_version: u64,
}

/// Process-wide in-memory multi-version key-value store
///
/// The database is shared behind an `Arc`; snapshots and transactions hold
/// a reference back to it and are each used by a single thread at a time.
///
/// # Example
///
/// ```
/// use memkv_engine::Database;
///
/// let db = Database::new();
/// let mut tx = db.transaction();
/// tx.set("greeting", b"hello")?;
/// tx.commit()?;
///
/// let snap = db.snapshot();
/// assert_eq!(snap.get("greeting")?, b"hello".to_vec());
/// # Ok::<(), memkv_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Database {
    pub(crate) store: KeyStore,
    pub(crate) state: Mutex<VersionState>,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Arc<Self> {
        Arc::new(Database {
            store: KeyStore::new(),
            state: Mutex::new(VersionState::default()),
        })
    }

    /// Open a read-only snapshot pinned at the current commit version
    ///
    /// Never fails. The snapshot observes every commit at or below its
    /// pinned version and nothing after, until it is discarded.
    pub fn snapshot(self: &Arc<Self>) -> Snapshot {
        let mut state = self.state.lock();
        let pinned = state.max_commit_version;
        state.pins.pin(pinned);
        Snapshot::new(Arc::clone(self), pinned)
    }

    /// Open a read-write transaction
    ///
    /// Never fails. The transaction reads as of the commit version current
    /// at open time and receives a unique draft version for its private
    /// writes.
    pub fn transaction(self: &Arc<Self>) -> Transaction {
        let mut state = self.state.lock();
        state.last_tx_version += 1;
        let draft = state.last_tx_version;
        let pinned = state.max_commit_version;
        state.pins.pin(pinned);
        Transaction::new(Arc::clone(self), draft, pinned)
    }

    /// Most recently committed version
    pub fn max_commit_version(&self) -> u64 {
        self.state.lock().max_commit_version
    }

    /// Copy of both version counters, taken under the mutex
    pub fn version_counters(&self) -> VersionCounters {
        let state = self.state.lock();
        VersionCounters {
            last_tx_version: state.last_tx_version,
            max_commit_version: state.max_commit_version,
        }
    }

    /// Number of keys currently present in the store
    ///
    /// Includes keys whose chains hold only tombstones.
    pub fn key_count(&self) -> usize {
        self.store.len()
    }

    /// Visit every key and its published chain; return false to stop
    ///
    /// Maintenance surface used by backup and by tests. The callback runs
    /// while a store shard is held and must not touch the database.
    pub fn for_each_chain<F>(&self, visit: F)
    where
        F: FnMut(&str, &Arc<MultiValue>) -> bool,
    {
        self.store.for_each(visit);
    }

    /// Install a restored value as a fresh single-version chain
    ///
    /// Restore support: the caller owns the database exclusively and the
    /// value carries its original commit version.
    pub fn restore_value(&self, key: String, value: Value) {
        self.store
            .store(key, Arc::new(MultiValue::single(value)));
    }

    /// Overwrite both version counters
    ///
    /// Restore support: advances the counters past everything recorded in
    /// a backup header so new transactions and commits stay above the
    /// restored history.
    pub fn restore_counters(&self, counters: VersionCounters) {
        let mut state = self.state.lock();
        state.last_tx_version = counters.last_tx_version;
        state.max_commit_version = counters.max_commit_version;
    }

    /// Release a pin taken at snapshot or transaction creation
    pub(crate) fn release_pin(&self, version: u64) {
        self.state.lock().pins.unpin(version);
    }

    /// Reference count on `version`, for tests and diagnostics
    pub fn pin_count(&self, version: u64) -> usize {
        self.state.lock().pins.count(version)
    }
}
