//! Codec trait and implementations for persisting rooms.
//!
//! The store keeps opaque bytes under each room key. It doesn't care HOW a
//! [`Room`](crate::Room) becomes bytes, only that something implements
//! [`Codec`]. [`JsonCodec`] is the one shipped: the persisted value is the
//! same JSON document a browser client would keep in local storage.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec lives inside a store that is
/// shared between contexts and moved into notification tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use wineguessr_protocol::{Codec, JsonCodec, Player, PlayerId, Room, RoomCode};
///
/// let codec = JsonCodec;
/// let host = Player::host(PlayerId::from("player_1"), "Ana");
/// let room = Room::new(RoomCode::from("AB12"), host);
///
/// let bytes = codec.encode(&room).unwrap();
/// let decoded: Room = codec.decode(&bytes).unwrap();
/// assert_eq!(room, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
