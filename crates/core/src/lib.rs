//! Core types for memkv
//!
//! This crate defines the vocabulary shared by every other memkv crate:
//! - Error: the unified error taxonomy and `Result` alias
//! - CancelToken: cooperative cancellation observed between iterator steps
//! - Capability traits: `Getter`, `Setter`, `Deleter`, `Ranger`, `Scanner`
//!   and their `Reader`/`Writer`/`ReadWriter` combinations
//! - Cursor: the materialized-key-list range iterator

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cancel;
pub mod cursor;
pub mod error;
pub mod traits;

pub use cancel::CancelToken;
pub use cursor::{narrow, validate_range, Cursor, Direction};
pub use error::{Error, Result};
pub use traits::{Deleter, Getter, Ranger, ReadWriter, Reader, Scanner, Setter, Writer};
