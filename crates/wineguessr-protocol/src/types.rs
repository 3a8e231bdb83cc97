//! Core data model: the room aggregate and everything it contains.
//!
//! These types are persisted as-is, so their serde representation is the
//! storage format. Field names are camelCase (`currentWineIndex`,
//! `isHost`) to stay readable by browser clients sharing the same store;
//! wines keep the `winefarm_coordinates` key used by wine list files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use wineguessr_geo::Coordinates;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque unique identifier for a player, e.g. `player_3f9a01c2d4e5b6a7`.
///
/// Serialized as a bare string so it can key the per-round guess map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The short join code of a room. Also the suffix of its storage key.
///
/// Codes are upper-case; [`RoomCode::normalize`] trims and upper-cases
/// what a player typed so `ab12 ` finds room `AB12`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

// ---------------------------------------------------------------------------
// Wine
// ---------------------------------------------------------------------------

/// A wine to guess. Identity is its position in the game's wine list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    pub name: String,
    pub price: f64,
    pub description: String,
    pub country: String,
    /// Where the wine is made: the answer to the round.
    pub winefarm_coordinates: Coordinates,
    pub grape: String,
    pub year: i32,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Exactly one player per non-empty room holds this.
    #[serde(default)]
    pub is_host: bool,
}

impl Player {
    pub fn host(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_host: true,
        }
    }

    pub fn guest(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_host: false,
        }
    }
}

// ---------------------------------------------------------------------------
// GameResult
// ---------------------------------------------------------------------------

/// The outcome of one guess: which wine, where the player clicked, how far
/// off they were, and the points that earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub wine: Wine,
    pub guess: Coordinates,
    /// Kilometres between `guess` and the wine's origin.
    pub distance: f64,
    pub score: u32,
}

impl GameResult {
    /// Grades `guess` against the wine's origin.
    pub fn grade(wine: &Wine, guess: Coordinates) -> Self {
        let (distance, score) = wineguessr_geo::grade(&guess, &wine.winefarm_coordinates);
        Self {
            wine: wine.clone(),
            guess,
            distance,
            score,
        }
    }
}

/// All guesses recorded for one round, keyed by player.
pub type RoundGuesses = BTreeMap<PlayerId, GameResult>;

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// Where a room is in its game.
///
/// ```text
/// Lobby → Playing → RoundSummary → Playing → … → GameOver
///                                                   │
///                 start_game (play again) ←─────────┘
/// ```
///
/// - **Lobby**: accepting joins, no wines yet.
/// - **Playing**: the current wine is open for guesses.
/// - **RoundSummary**: every member has guessed the current wine; waiting
///   for the host to advance.
/// - **GameOver**: the last round was advanced past. Final scores are
///   readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomStatus {
    Lobby,
    Playing,
    RoundSummary,
    GameOver,
}

impl RoomStatus {
    /// Returns `true` if new players may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` if guesses are accepted.
    pub fn accepts_guesses(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` while a game is underway (a round pointer is valid).
    pub fn is_in_game(&self) -> bool {
        matches!(self, Self::Playing | Self::RoundSummary)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::Playing => write!(f, "playing"),
            Self::RoundSummary => write!(f, "round-summary"),
            Self::GameOver => write!(f, "game-over"),
        }
    }
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One multiplayer session: the single source of truth persisted under the
/// room's key and replaced whole on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    /// Join order. After a host leaves, `players[0]` is promoted.
    pub players: Vec<Player>,
    pub wines: Vec<Wine>,
    pub current_wine_index: usize,
    pub status: RoomStatus,
    /// One entry per round, parallel to `wines`.
    pub guesses: Vec<RoundGuesses>,
    /// Store revision this copy was read at. `0` means never stored.
    #[serde(default)]
    pub version: u64,
}

impl Room {
    /// A fresh lobby holding only its host.
    pub fn new(code: RoomCode, host: Player) -> Self {
        Self {
            code,
            players: vec![host],
            wines: Vec::new(),
            current_wine_index: 0,
            status: RoomStatus::Lobby,
            guesses: Vec::new(),
            version: 0,
        }
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    pub fn is_member(&self, id: &PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// The wine being guessed, if a game has started.
    pub fn current_wine(&self) -> Option<&Wine> {
        self.wines.get(self.current_wine_index)
    }

    pub fn current_round_guesses(&self) -> Option<&RoundGuesses> {
        self.guesses.get(self.current_wine_index)
    }

    /// Whether `id` already has a result for the current round.
    pub fn has_guessed(&self, id: &PlayerId) -> bool {
        self.current_round_guesses()
            .is_some_and(|round| round.contains_key(id))
    }

    /// Whether every current member has a result for the current round.
    ///
    /// Compares identities, not counts: a departed player's guess does not
    /// stand in for a member who hasn't answered.
    pub fn all_guessed(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| self.has_guessed(&p.id))
    }

    pub fn is_last_round(&self) -> bool {
        self.current_wine_index + 1 >= self.wines.len()
    }

    /// Human-readable round counter, e.g. `"2 / 5"`.
    pub fn round_label(&self) -> String {
        format!("{} / {}", self.current_wine_index + 1, self.wines.len())
    }

    /// Sum of `id`'s scores over every round. Missing rounds count 0.
    pub fn total_score(&self, id: &PlayerId) -> u32 {
        self.guesses
            .iter()
            .filter_map(|round| round.get(id))
            .map(|result| result.score)
            .sum()
    }

    /// Current members ranked by total score, highest first. Ties keep
    /// join order.
    pub fn final_scores(&self) -> Vec<FinalScore> {
        let mut scores: Vec<FinalScore> = self
            .players
            .iter()
            .map(|p| FinalScore {
                player_id: p.id.clone(),
                name: p.name.clone(),
                total_score: self.total_score(&p.id),
            })
            .collect();
        // `sort_by` is stable, so equal totals stay in join order.
        scores.sort_by(|a, b| b.total_score.cmp(&a.total_score));
        scores
    }

    /// Current members ranked by their score for the current round,
    /// highest first. A member without a guess scores 0 with no distance.
    /// Ties keep join order.
    pub fn round_standings(&self) -> Vec<RoundStanding> {
        let round = self.current_round_guesses();
        let mut standings: Vec<RoundStanding> = self
            .players
            .iter()
            .map(|p| {
                let result = round.and_then(|r| r.get(&p.id));
                RoundStanding {
                    player_id: p.id.clone(),
                    name: p.name.clone(),
                    score: result.map_or(0, |r| r.score),
                    distance: result.map(|r| r.distance),
                }
            })
            .collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        standings
    }
}

/// One line of a round summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundStanding {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    /// Kilometres off, or `None` if the player didn't guess this round.
    pub distance: Option<f64>,
}

/// One line of the final scoreboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalScore {
    pub player_id: PlayerId,
    pub name: String,
    pub total_score: u32,
}
