//! Room storage and change notification for Wineguessr.
//!
//! Every room lives under one key in a shared medium. Clients of that
//! medium are *contexts* (in a browser, one per tab):
//!
//! 1. **Storage**: [`RoomStore`]: load, save, and delete whole rooms.
//!    Saves are compare-and-swap on [`Room::version`](wineguessr_protocol::Room),
//!    so two contexts racing on the same room can't silently lose a write.
//! 2. **Notification**: [`ChangeFeed`]: subscribe to a room and get a
//!    callback whenever *another* context changes it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room protocol (above)  ← load → mutate → save, returns the new Room
//!     ↕
//! Store (this crate)     ← bytes under `wineguessr_room_{CODE}`, change feed
//!     ↕
//! Protocol (below)       ← Room type and codec
//! ```

mod error;
mod feed;
mod memory;
mod store;

pub use error::StoreError;
pub use feed::{ChangeFeed, RoomChange, Subscription};
pub use memory::{ContextId, ContextStore, SharedStorage, StorageConfig};
pub use store::{ROOM_KEY_PREFIX, RoomStore, room_key};
