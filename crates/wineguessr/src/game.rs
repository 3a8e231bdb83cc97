//! `Wineguessr` builder and entry points.
//!
//! Ties the layers together: one shared storage, one room service per
//! tab opened on it, and solo games on the side.

use wineguessr_protocol::{JsonCodec, Wine};
use wineguessr_room::{RoomConfig, RoomService, SoloGame};
use wineguessr_store::{ContextStore, SharedStorage, StorageConfig};

use crate::WineguessrError;

/// Builder for a [`Wineguessr`] instance.
///
/// # Example
///
/// ```rust
/// use wineguessr::prelude::*;
///
/// let game = Wineguessr::builder()
///     .room_config(RoomConfig { code_length: 6, ..RoomConfig::default() })
///     .build();
/// let tab = game.open_tab();
/// assert_eq!(tab.config().code_length, 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct WineguessrBuilder {
    room_config: RoomConfig,
    storage_config: StorageConfig,
}

impl WineguessrBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration every opened tab's service uses.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the shared storage configuration.
    pub fn storage_config(mut self, config: StorageConfig) -> Self {
        self.storage_config = config;
        self
    }

    pub fn build(self) -> Wineguessr {
        let room_config = self.room_config.validated();
        tracing::info!(
            code_length = room_config.code_length,
            feed_capacity = self.storage_config.feed_capacity,
            "wineguessr ready"
        );
        Wineguessr {
            storage: SharedStorage::with_codec(JsonCodec, self.storage_config),
            room_config,
        }
    }
}

/// One device's worth of game state: a shared storage that every opened
/// tab reads and writes.
///
/// Cheap to clone: clones share the same storage.
#[derive(Clone)]
pub struct Wineguessr {
    storage: SharedStorage,
    room_config: RoomConfig,
}

impl Wineguessr {
    /// Creates a new builder.
    pub fn builder() -> WineguessrBuilder {
        WineguessrBuilder::new()
    }

    /// The storage backing every tab.
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Opens a new tab: a room service on its own storage context.
    ///
    /// Each tab hears the others' writes through
    /// [`RoomService::subscribe`] but never its own.
    pub fn open_tab(&self) -> RoomService<ContextStore> {
        RoomService::with_config(self.storage.open_context(), self.room_config.clone())
    }

    /// Starts a single-player game over `wines`. Never touches the storage.
    pub fn solo(&self, wines: Vec<Wine>) -> Result<SoloGame, WineguessrError> {
        Ok(SoloGame::new(wines)?)
    }
}

impl Default for Wineguessr {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wineguessr_protocol::sample_wines;

    #[test]
    fn test_build_validates_room_config() {
        let game = Wineguessr::builder()
            .room_config(RoomConfig {
                code_length: 99,
                ..RoomConfig::default()
            })
            .build();
        assert_eq!(game.open_tab().config().code_length, RoomConfig::MAX_CODE_LENGTH);
    }

    #[test]
    fn test_tabs_share_storage() {
        let game = Wineguessr::default();
        let host = game.open_tab().create_room("Ana").unwrap();
        assert_eq!(game.storage().len(), 1);
        assert!(game.open_tab().room(&host.room.code).is_some());
    }

    #[test]
    fn test_tabs_have_distinct_contexts() {
        let game = Wineguessr::default();
        let a = game.open_tab();
        let b = game.open_tab();
        assert_ne!(a.store().id(), b.store().id());
    }

    #[test]
    fn test_solo_leaves_storage_untouched() {
        let game = Wineguessr::default();
        let solo = game.solo(sample_wines().unwrap()).unwrap();
        assert_eq!(solo.wines().len(), 5);
        assert!(game.storage().is_empty());
    }

    #[test]
    fn test_solo_empty_list_is_room_error() {
        let game = Wineguessr::default();
        let err = game.solo(Vec::new()).unwrap_err();
        assert!(matches!(err, WineguessrError::Room(_)));
    }
}
