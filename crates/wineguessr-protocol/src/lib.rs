//! Data model and codecs for Wineguessr.
//!
//! This crate defines the shapes that every other layer passes around:
//!
//! - **Types** ([`Room`], [`Player`], [`Wine`], [`GameResult`], etc.):
//!   the aggregate that gets persisted per room, field-for-field.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how a room is turned
//!   into the bytes kept in the store.
//! - **Wine lists** ([`parse_wine_list`], [`sample_wines`]): loading the
//!   wines a game is played with.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Room protocol (rules) → Protocol (Room) → Store (bytes under a key)
//! ```
//!
//! Nothing here enforces game rules; that is the room layer's job.

mod codec;
mod error;
mod types;
#[cfg(feature = "json")]
mod wines;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    FinalScore, GameResult, Player, PlayerId, Room, RoomCode, RoomStatus,
    RoundGuesses, RoundStanding, Wine,
};
pub use wineguessr_geo::Coordinates;
#[cfg(feature = "json")]
pub use wines::{SAMPLE_WINES_JSON, parse_wine_list, sample_wines};
