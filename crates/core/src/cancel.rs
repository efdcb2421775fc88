//! Cooperative cancellation
//!
//! Engine operations are non-blocking and never suspend, so cancellation
//! only matters for long iterations: a cursor carrying a fired token fails
//! its next fetch with `Error::Cancelled`. Cancellation does not roll back
//! a transaction; the owner must still call rollback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Cheap-clone cancellation flag
///
/// All clones observe the same flag. A token that was never cancelled is
/// inert and costs one atomic load per check.
///
/// # Example
///
/// ```
/// use memkv_core::CancelToken;
///
/// let token = CancelToken::new();
/// let watcher = token.clone();
/// assert!(!watcher.is_cancelled());
/// token.cancel();
/// assert!(watcher.is_cancelled());
/// assert!(watcher.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a new, un-cancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token
    ///
    /// Idempotent; all clones observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether the token has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail with `Error::Cancelled` if the token has fired
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
