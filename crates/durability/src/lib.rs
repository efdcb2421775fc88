//! Backup and restore for memkv
//!
//! The engine itself is volatile; this crate captures the key-value set
//! visible to the latest snapshot into a sequential file and rebuilds a
//! database from one. The file carries a header with both version
//! counters followed by one record per live key, terminated by
//! end-of-stream.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backup;

pub use backup::{backup, restore};
