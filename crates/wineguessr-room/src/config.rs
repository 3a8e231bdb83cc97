//! Room service configuration.

use serde::{Deserialize, Serialize};

/// Settings for a [`RoomService`](crate::RoomService).
///
/// Serializable so a host application can keep it in its own config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Characters in a generated room code.
    pub code_length: usize,

    /// How many codes to try before giving up on `create_room`.
    pub max_code_attempts: u32,

    /// How many times a mutation is re-applied after a concurrent write
    /// before failing with [`RoomError::Contended`](crate::RoomError).
    pub max_conflict_retries: u32,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            code_length: 4,
            max_code_attempts: 16,
            max_conflict_retries: 8,
        }
    }
}

impl RoomConfig {
    /// Longest supported room code.
    pub const MAX_CODE_LENGTH: usize = 12;

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// Called by [`RoomService::with_config`](crate::RoomService::with_config).
    /// - `code_length` clamped to `1..=MAX_CODE_LENGTH`.
    /// - `max_code_attempts` at least 1.
    pub fn validated(mut self) -> Self {
        let clamped = self.code_length.clamp(1, Self::MAX_CODE_LENGTH);
        if clamped != self.code_length {
            tracing::warn!(
                code_length = self.code_length,
                clamped,
                "code_length out of range, clamping"
            );
            self.code_length = clamped;
        }
        self.max_code_attempts = self.max_code_attempts.max(1);
        self
    }
}
