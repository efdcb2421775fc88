//! Stateful session protocol for remote memkv access
//!
//! The engine's snapshots, transactions, and iterators become remote
//! objects addressable by client-chosen names. This crate is
//! transport-agnostic: it defines the JSON request/response envelopes, the
//! name-to-session registry with per-name locking, and a `dispatch` entry
//! point that an HTTP server (or any request/response transport) can
//! mount.
//!
//! ## Protocol
//!
//! Clients POST JSON bodies to paths naming the operation:
//! `/new-transaction`, `/new-snapshot`, `/tx/get`, `/tx/set`,
//! `/tx/delete`, `/tx/ascend`, `/tx/descend`, `/tx/scan`, `/tx/commit`,
//! `/tx/rollback`, `/snap/get`, `/snap/ascend`, `/snap/descend`,
//! `/snap/scan`, `/snap/discard`, `/it/fetch`.
//!
//! Every response carries an `error` field: empty on success, a short
//! code (`ErrInvalid`, `ErrNotExist`, `EOF`) for well-known failures, and
//! a free-form message otherwise. At most one request per session is in
//! flight at a time; the registry serializes them per name.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
mod dispatch;
pub mod errors;
mod session;

pub use session::SessionRegistry;
