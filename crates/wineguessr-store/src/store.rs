//! The `RoomStore` trait: the seam between room rules and persistence.

use wineguessr_protocol::{Room, RoomCode};

use crate::StoreError;

/// Prefix of every room key in the shared medium.
pub const ROOM_KEY_PREFIX: &str = "wineguessr_room_";

/// The storage key for a room code, e.g. `wineguessr_room_AB12`.
pub fn room_key(code: &RoomCode) -> String {
    format!("{ROOM_KEY_PREFIX}{code}")
}

/// Whole-aggregate room persistence.
///
/// There is no field-level update: every mutation is load → mutate in
/// memory → save, and a save replaces the stored value in a single write.
///
/// # Versioning
///
/// A room carries the `version` it was read at. [`save`](Self::save)
/// only succeeds if that still matches what is stored (`0` meaning the
/// key must not exist yet), then writes `version + 1`. Otherwise it
/// returns [`StoreError::Conflict`] and writes nothing.
///
/// The protocol layer depends on this trait, not on a concrete medium,
/// so a networked store can replace [`ContextStore`](crate::ContextStore)
/// without touching room rules.
pub trait RoomStore: Send + Sync + 'static {
    /// Fetches the room stored under `code`.
    ///
    /// Returns `None` if the key doesn't exist or its value can't be
    /// decoded.
    fn load(&self, code: &RoomCode) -> Option<Room>;

    /// Persists `room`, replacing any prior value.
    ///
    /// Returns the room as stored, with its new version.
    ///
    /// # Errors
    /// - [`StoreError::Conflict`]: the stored version isn't `room.version`
    /// - [`StoreError::Encode`]: the room couldn't be serialized
    fn save(&self, room: &Room) -> Result<Room, StoreError>;

    /// Removes `room` from storage.
    ///
    /// # Errors
    /// Returns [`StoreError::Conflict`] if the stored version isn't
    /// `room.version`.
    fn delete(&self, room: &Room) -> Result<(), StoreError>;
}
