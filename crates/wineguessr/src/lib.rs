//! # Wineguessr
//!
//! Guess where a wine comes from by dropping a pin on the map; the closer
//! the pin, the more points.
//!
//! This crate ties the layers together: geo scoring, the room model, the
//! shared store with its change feed, and the room protocol. A
//! presentation layer opens one [`RoomService`](prelude::RoomService) per
//! client (tab), calls its operations, and renders the rooms they return.
//!
//! ## Quick Start
//!
//! ```rust
//! use wineguessr::prelude::*;
//!
//! # fn main() -> Result<(), WineguessrError> {
//! let game = Wineguessr::builder().build();
//! let host_tab = game.open_tab();
//! let guest_tab = game.open_tab();
//!
//! let host = host_tab.create_room("Ana")?;
//! let guest = guest_tab.join_room(host.room.code.as_str(), "Ben")?;
//! let room = host_tab.start_game(&host.room.code, &sample_wines()?)?;
//!
//! let origin = room.current_wine().unwrap().winefarm_coordinates;
//! host_tab.submit_guess(&room.code, &host.player.id, origin)?;
//! let room = guest_tab.submit_guess(&room.code, &guest.player.id, origin)?;
//! assert_eq!(room.status, RoomStatus::RoundSummary);
//! # Ok(())
//! # }
//! ```

mod error;
mod game;
mod logging;

pub use error::WineguessrError;
pub use game::{Wineguessr, WineguessrBuilder};
pub use logging::init_logging;

pub mod prelude {
    pub use crate::{Wineguessr, WineguessrBuilder, WineguessrError, init_logging};
    pub use wineguessr_geo::{distance_km, score};
    pub use wineguessr_protocol::{
        Coordinates, FinalScore, GameResult, Player, PlayerId, Room, RoomCode, RoomStatus,
        RoundStanding, Wine, parse_wine_list, sample_wines,
    };
    pub use wineguessr_room::{Joined, LeaveOutcome, RoomConfig, RoomError, RoomService, SoloGame};
    pub use wineguessr_store::{
        ChangeFeed, ContextStore, RoomStore, SharedStorage, StorageConfig, StoreError, Subscription,
    };
}
