//! Unified error type for Wineguessr.

use wineguessr_protocol::ProtocolError;
use wineguessr_room::RoomError;
use wineguessr_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
///
/// `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum WineguessrError {
    /// Encoding, decoding, or wine list parsing failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The store refused a write or the change feed couldn't start.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A room operation was rejected (not found, already started, etc.).
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl WineguessrError {
    /// Whether the caller should treat this as "the room is gone".
    pub fn is_room_not_found(&self) -> bool {
        matches!(self, Self::Room(RoomError::RoomNotFound(_)))
    }
}
