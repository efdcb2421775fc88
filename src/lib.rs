//! # memkv
//!
//! An in-memory, multi-version key-value store with serializable
//! transactions: read-only snapshots, optimistic read-write transactions
//! with first-committer-wins validation, version pinning with
//! opportunistic compaction, sequential backup/restore, and a
//! transport-agnostic session protocol for remote use.
//!
//! Keys are non-empty strings; values are opaque byte sequences. A single
//! `Database` is shared by any number of threads; each snapshot or
//! transaction is used by one agent at a time.
//!
//! # Quick Start
//!
//! ```
//! use memkv::{with_snapshot, with_transaction, Database};
//!
//! fn main() -> memkv::Result<()> {
//!     let db = Database::new();
//!
//!     // Transactional writes: commit on Ok, rollback on Err.
//!     with_transaction(&db, |tx| {
//!         tx.set("user:name", b"alice")?;
//!         tx.set("user:role", b"admin")
//!     })?;
//!
//!     // Stable point-in-time reads.
//!     let name = with_snapshot(&db, |snap| snap.get("user:name"))?;
//!     assert_eq!(name, b"alice".to_vec());
//!
//!     // Ordered iteration over a key range.
//!     let mut tx = db.transaction();
//!     let mut cursor = tx.ascend("user:", "user;")?;
//!     while let Some((key, value)) = cursor.next()? {
//!         println!("{key} = {}", String::from_utf8_lossy(&value));
//!     }
//!     drop(cursor);
//!     tx.rollback()?;
//!     Ok(())
//! }
//! ```
//!
//! # Concurrency model
//!
//! Readers never block writers and writers never block readers: each key
//! maps to an immutable chain of versioned values, republished by
//! compare-and-swap under a single commit mutex. A transaction tracks
//! every key it reads or writes and commits only if none of them changed
//! since its snapshot, which rejects write skew along with ordinary
//! read-write races. Conflicts surface as [`Error::Conflict`]; retry the
//! transaction.
//!
//! # Crates
//!
//! | Concern | Crate |
//! |---------|-------|
//! | Engine (`Database`, `Snapshot`, `Transaction`) | `memkv-engine` |
//! | Backup/restore ([`backup`], [`restore`]) | `memkv-durability` |
//! | Remote session protocol ([`wire`]) | `memkv-wire` |
//!
//! The storage internals (`memkv-storage`) are not re-exported; the
//! surface in this crate is the stable API.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use memkv_core::{
    CancelToken, Cursor, Deleter, Direction, Error, Getter, Ranger, ReadWriter, Reader, Result,
    Scanner, Setter, Writer,
};
pub use memkv_durability::{backup, restore};
pub use memkv_engine::{with_snapshot, with_transaction, Database, Snapshot, Transaction};

pub use memkv_wire as wire;
