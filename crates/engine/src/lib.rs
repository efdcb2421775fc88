//! MVCC engine for memkv
//!
//! This crate implements the database core:
//! - `Database`: owns the concurrent key map, the version-pin table, and
//!   the commit/transaction version counters
//! - `Snapshot`: read-only view pinned at a commit version
//! - `Transaction`: read-write handle with optimistic first-committer-wins
//!   commit validation
//! - Compaction: opportunistic removal of tombstones below the minimum pin
//! - Scoped helpers: run a closure under a snapshot or transaction with
//!   guaranteed release
//!
//! Readers never block writers and writers never block readers: published
//! value chains are immutable, and the only lock is the database mutex
//! guarding the version scalars, the pin table, and the commit protocol.

#![warn(clippy::all)]

mod commit;
mod compact;
mod database;
mod scoped;
mod snapshot;
mod transaction;

pub use database::{Database, VersionCounters};
pub use scoped::{with_snapshot, with_transaction};
pub use snapshot::Snapshot;
pub use transaction::Transaction;
