//! Error types for the storage layer.

use wineguessr_protocol::{ProtocolError, RoomCode};

/// Errors that can occur while writing rooms or subscribing to changes.
///
/// Reads never fail: a missing or unreadable value is simply absent.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The stored room moved on since the caller read it. Reload and
    /// re-apply the change.
    ///
    /// `expected` is the version the caller read (0 = "must not exist"),
    /// `found` the version currently stored (0 = absent).
    #[error("room {code} changed concurrently (expected v{expected}, found v{found})")]
    Conflict {
        code: RoomCode,
        expected: u64,
        found: u64,
    },

    /// The room could not be encoded for storage.
    #[error(transparent)]
    Encode(#[from] ProtocolError),

    /// Subscriptions deliver on Tokio tasks and need a running runtime.
    #[error("change feed requires a Tokio runtime")]
    NoRuntime,
}

impl StoreError {
    /// Returns `true` if retrying after a reload may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
