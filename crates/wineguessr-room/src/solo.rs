//! Single-player game: the same rounds and scoring as a room, kept in
//! memory with no store and no other players.

use rand::seq::SliceRandom;
use wineguessr_protocol::{Coordinates, GameResult, RoomStatus, Wine};

use crate::RoomError;

/// A solo run through a shuffled wine list.
///
/// Reuses [`RoomStatus`] for its progress: `Playing` while the current
/// wine awaits a guess, `RoundSummary` once it has one, `GameOver` after
/// the last round.
#[derive(Debug, Clone)]
pub struct SoloGame {
    wines: Vec<Wine>,
    current: usize,
    results: Vec<GameResult>,
    status: RoomStatus,
}

impl SoloGame {
    /// Starts a game over `wines` in random order.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidWineList`] if `wines` is empty.
    pub fn new(wines: Vec<Wine>) -> Result<Self, RoomError> {
        if wines.is_empty() {
            return Err(RoomError::InvalidWineList("the wine list is empty".into()));
        }
        let mut game = Self {
            wines,
            current: 0,
            results: Vec::new(),
            status: RoomStatus::Playing,
        };
        game.wines.shuffle(&mut rand::rng());
        tracing::info!(rounds = game.wines.len(), "solo game started");
        Ok(game)
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status == RoomStatus::GameOver
    }

    pub fn wines(&self) -> &[Wine] {
        &self.wines
    }

    /// The wine being guessed, or the last one once the game is over.
    pub fn current_wine(&self) -> &Wine {
        &self.wines[self.current]
    }

    pub fn round_label(&self) -> String {
        format!("{} / {}", self.current + 1, self.wines.len())
    }

    /// One result per completed round, in play order.
    pub fn results(&self) -> &[GameResult] {
        &self.results
    }

    pub fn total_score(&self) -> u32 {
        self.results.iter().map(|r| r.score).sum()
    }

    /// Grades a guess for the current wine.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidState`] if this round already has a
    /// guess or the game is over.
    pub fn guess(&mut self, guess: Coordinates) -> Result<&GameResult, RoomError> {
        if !self.status.accepts_guesses() {
            return Err(RoomError::InvalidState(format!(
                "cannot guess while {}",
                self.status
            )));
        }
        let result = GameResult::grade(&self.wines[self.current], guess);
        tracing::debug!(
            round = self.current,
            distance_km = result.distance,
            score = result.score,
            "solo guess"
        );
        self.results.push(result);
        self.status = RoomStatus::RoundSummary;
        Ok(&self.results[self.current])
    }

    /// Moves past a guessed round. Returns the new status.
    ///
    /// # Errors
    /// Returns [`RoomError::InvalidState`] if the current wine hasn't been
    /// guessed yet or the game is over.
    pub fn next_round(&mut self) -> Result<RoomStatus, RoomError> {
        if self.status != RoomStatus::RoundSummary {
            return Err(RoomError::InvalidState(format!(
                "cannot advance while {}",
                self.status
            )));
        }
        if self.current + 1 < self.wines.len() {
            self.current += 1;
            self.status = RoomStatus::Playing;
        } else {
            self.status = RoomStatus::GameOver;
            tracing::info!(total = self.total_score(), "solo game over");
        }
        Ok(self.status)
    }

    /// Reshuffles the same wines and starts over.
    pub fn play_again(&mut self) {
        self.wines.shuffle(&mut rand::rng());
        self.current = 0;
        self.results.clear();
        self.status = RoomStatus::Playing;
        tracing::info!(rounds = self.wines.len(), "solo game restarted");
    }
}
