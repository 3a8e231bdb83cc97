//! Error types for the room layer.

use wineguessr_protocol::{PlayerId, ProtocolError, RoomCode};
use wineguessr_store::StoreError;

/// Errors that can occur during room operations.
///
/// All of them are recoverable: show the message and let the player retry.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is stored under this code (or its value is unreadable).
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room has left the lobby and no longer accepts players.
    #[error("game in room {0} has already started")]
    GameAlreadyStarted(RoomCode),

    /// The wine list is empty or malformed.
    #[error("invalid wine list: {0}")]
    InvalidWineList(String),

    /// The player is not a member of this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The room is in a state that doesn't allow this operation, e.g.
    /// guessing during a round summary.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// Every generated code was already taken.
    #[error("no free room code after {0} attempts")]
    CodeSpaceExhausted(u32),

    /// Other contexts kept changing the room faster than this one could
    /// apply its change.
    #[error("room {0} is too busy, try again")]
    Contended(RoomCode),

    /// The store refused the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ProtocolError> for RoomError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidWineList(reason) => Self::InvalidWineList(reason),
            other => Self::Store(StoreError::Encode(other)),
        }
    }
}
