//! Random room codes and player ids.

use rand::Rng;
use wineguessr_protocol::{PlayerId, RoomCode};

/// Upper-case base-36: digits then letters.
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A random upper-case base-36 code of `len` characters.
///
/// Uniqueness is not guaranteed here; `create_room` retries when the
/// store already holds the code.
pub(crate) fn generate_room_code(len: usize) -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..len)
        .map(|_| char::from(CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())]))
        .collect();
    RoomCode(code)
}

/// A fresh player id: `player_` followed by 16 hex characters (64 bits).
pub(crate) fn generate_player_id() -> PlayerId {
    let bytes: [u8; 8] = rand::rng().random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    PlayerId(format!("player_{hex}"))
}
