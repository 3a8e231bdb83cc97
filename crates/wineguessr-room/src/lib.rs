//! Room lifecycle, rounds, and scoring for Wineguessr.
//!
//! Every operation is load → mutate → save against a [`RoomStore`], and
//! returns the room as stored so the calling context can render it
//! without waiting for its own change notification (it never gets one).
//!
//! # Key types
//!
//! - [`RoomService`]: create/join/leave rooms, start games, submit
//!   guesses, advance rounds, read final scores
//! - [`SoloGame`]: the same rounds and scoring for a single player,
//!   entirely in memory
//! - [`RoomConfig`]: code length and retry limits
//! - [`RoomError`]: what can go wrong, all recoverable
//!
//! [`RoomStore`]: wineguessr_store::RoomStore

mod config;
mod error;
mod ids;
mod service;
mod solo;

pub use config::RoomConfig;
pub use error::RoomError;
pub use service::{Joined, LeaveOutcome, RoomService};
pub use solo::SoloGame;
