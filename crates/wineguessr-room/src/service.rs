//! Room service: the multiplayer state machine over a shared store.

use rand::seq::SliceRandom;
use wineguessr_protocol::{
    Coordinates, FinalScore, GameResult, Player, PlayerId, Room, RoomCode, RoundGuesses,
    RoomStatus, Wine,
};
use wineguessr_store::{ChangeFeed, RoomStore, StoreError, Subscription};

use crate::ids::{generate_player_id, generate_room_code};
use crate::{RoomConfig, RoomError};

/// A player together with the room they just created or joined.
#[derive(Debug, Clone, PartialEq)]
pub struct Joined {
    pub player: Player,
    pub room: Room,
}

/// What `leave_room` left behind.
#[derive(Debug, Clone, PartialEq)]
pub enum LeaveOutcome {
    /// Others are still in the room.
    Remaining(Room),
    /// The last player left; the room was deleted.
    Closed,
}

/// Runs room operations for one context against a [`RoomStore`].
///
/// Every operation reads the whole room, applies one transition in
/// memory, and writes it back. If another context wrote in between, the
/// store rejects the save and the transition is re-applied to the fresh
/// copy, up to [`RoomConfig::max_conflict_retries`] times.
///
/// ## Lifecycle
///
/// ```text
/// create_room ──→ [Lobby] ──start_game──→ [Playing] ⇄ [RoundSummary]
///                  ↑  join/leave              │ submit_guess / next_round
///                  │                          ▼
///                  └─────── start_game ── [GameOver]
/// ```
pub struct RoomService<S: RoomStore> {
    store: S,
    config: RoomConfig,
}

impl<S: RoomStore> RoomService<S> {
    /// Creates a service with the default config.
    pub fn new(store: S) -> Self {
        Self::with_config(store, RoomConfig::default())
    }

    pub fn with_config(store: S, config: RoomConfig) -> Self {
        Self {
            store,
            config: config.validated(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// The current stored state of a room, if any.
    pub fn room(&self, code: &RoomCode) -> Option<Room> {
        self.store.load(code)
    }

    /// Opens a new room in the lobby with `host_name` as its host.
    ///
    /// # Errors
    /// Returns [`RoomError::CodeSpaceExhausted`] if every generated code
    /// collided with an existing room.
    pub fn create_room(&self, host_name: &str) -> Result<Joined, RoomError> {
        let host = Player::host(generate_player_id(), host_name);

        for attempt in 1..=self.config.max_code_attempts {
            let code = generate_room_code(self.config.code_length);
            let room = Room::new(code, host.clone());
            // Version 0 only saves if the key is free.
            match self.store.save(&room) {
                Ok(room) => {
                    tracing::info!(room = %room.code, player = %host.id, "room created");
                    return Ok(Joined { player: host, room });
                }
                Err(e) if e.is_conflict() => {
                    tracing::debug!(room = %room.code, attempt, "room code taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(RoomError::CodeSpaceExhausted(self.config.max_code_attempts))
    }

    /// Adds a guest named `name` to the room.
    ///
    /// `code` is matched case-insensitively.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::GameAlreadyStarted`]: the room has left the lobby
    pub fn join_room(&self, code: &str, name: &str) -> Result<Joined, RoomError> {
        let code = RoomCode::normalize(code);
        let player = Player::guest(generate_player_id(), name);

        let room = self.update(&code, |room| {
            if !room.status.is_joinable() {
                return Err(RoomError::GameAlreadyStarted(room.code.clone()));
            }
            room.players.push(player.clone());
            Ok(())
        })?;

        tracing::info!(
            room = %room.code,
            player = %player.id,
            players = room.players.len(),
            "player joined"
        );
        Ok(Joined { player, room })
    }

    /// Removes a player. Deletes the room if they were the last one;
    /// otherwise, if they were the host, promotes the earliest-joined
    /// remaining player. The room's status is left as it was.
    ///
    /// The player's recorded guesses stay in the room.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::NotInRoom`]: the player isn't a member
    pub fn leave_room(&self, code: &RoomCode, player_id: &PlayerId) -> Result<LeaveOutcome, RoomError> {
        self.retrying(code, || {
            let mut room = self.load_required(code)?;
            let before = room.players.len();
            room.players.retain(|p| &p.id != player_id);
            if room.players.len() == before {
                return Err(RoomError::NotInRoom(player_id.clone(), code.clone()));
            }

            if room.players.is_empty() {
                self.store.delete(&room)?;
                tracing::info!(room = %code, player = %player_id, "last player left, room closed");
                return Ok(LeaveOutcome::Closed);
            }

            if room.host().is_none() {
                let heir = &mut room.players[0];
                heir.is_host = true;
                tracing::info!(room = %code, player = %heir.id, "host promoted");
            }

            let room = self.store.save(&room)?;
            tracing::info!(
                room = %code,
                player = %player_id,
                players = room.players.len(),
                "player left"
            );
            Ok(LeaveOutcome::Remaining(room))
        })
    }

    /// Starts a game with `wines` in random order.
    ///
    /// Also used to play again in the same room: the round pointer and
    /// guesses are reset.
    ///
    /// # Errors
    /// - [`RoomError::InvalidWineList`]: `wines` is empty
    /// - [`RoomError::RoomNotFound`]: no such room
    pub fn start_game(&self, code: &RoomCode, wines: &[Wine]) -> Result<Room, RoomError> {
        if wines.is_empty() {
            return Err(RoomError::InvalidWineList("the wine list is empty".into()));
        }

        let room = self.update(code, |room| {
            let mut shuffled = wines.to_vec();
            shuffled.shuffle(&mut rand::rng());
            room.guesses = vec![RoundGuesses::new(); shuffled.len()];
            room.wines = shuffled;
            room.current_wine_index = 0;
            room.status = RoomStatus::Playing;
            Ok(())
        })?;

        tracing::info!(room = %code, rounds = room.wines.len(), players = room.players.len(), "game started");
        Ok(room)
    }

    /// Records `player_id`'s guess for the current wine.
    ///
    /// A second guess in the same round replaces the first. Once every
    /// current member has guessed, the room moves to
    /// [`RoomStatus::RoundSummary`].
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::InvalidState`]: the room isn't accepting guesses
    /// - [`RoomError::NotInRoom`]: the player isn't a member
    pub fn submit_guess(
        &self,
        code: &RoomCode,
        player_id: &PlayerId,
        guess: Coordinates,
    ) -> Result<Room, RoomError> {
        let room = self.update(code, |room| {
            if !room.status.accepts_guesses() {
                return Err(RoomError::InvalidState(format!(
                    "cannot guess in room {} while {}",
                    room.code, room.status
                )));
            }
            if !room.is_member(player_id) {
                return Err(RoomError::NotInRoom(player_id.clone(), room.code.clone()));
            }

            let index = room.current_wine_index;
            let wine = room.wines.get(index).ok_or_else(|| {
                RoomError::InvalidState(format!("room {} has no wine for round {index}", room.code))
            })?;
            let result = GameResult::grade(wine, guess);

            if room.guesses.len() <= index {
                room.guesses.resize_with(index + 1, RoundGuesses::new);
            }
            tracing::debug!(
                room = %room.code,
                player = %player_id,
                round = index,
                distance_km = result.distance,
                score = result.score,
                "guess recorded"
            );
            room.guesses[index].insert(player_id.clone(), result);

            if room.all_guessed() {
                room.status = RoomStatus::RoundSummary;
            }
            Ok(())
        })?;

        if room.status == RoomStatus::RoundSummary {
            tracing::info!(room = %code, round = room.current_wine_index, "all players guessed");
        }
        Ok(room)
    }

    /// Advances to the next wine, or ends the game after the last one.
    ///
    /// On the last round the index is left where it is and the room
    /// moves to [`RoomStatus::GameOver`]. Advancing a finished game is a
    /// no-op write.
    ///
    /// # Errors
    /// - [`RoomError::RoomNotFound`]: no such room
    /// - [`RoomError::InvalidState`]: no game has been started
    pub fn next_round(&self, code: &RoomCode) -> Result<Room, RoomError> {
        let room = self.update(code, |room| {
            if room.status == RoomStatus::Lobby {
                return Err(RoomError::InvalidState(format!(
                    "room {} has not started a game",
                    room.code
                )));
            }
            if room.is_last_round() {
                room.status = RoomStatus::GameOver;
            } else {
                room.current_wine_index += 1;
                room.status = RoomStatus::Playing;
            }
            Ok(())
        })?;

        match room.status {
            RoomStatus::GameOver => tracing::info!(room = %code, "game over"),
            _ => tracing::info!(room = %code, round = %room.round_label(), "next round"),
        }
        Ok(room)
    }

    /// Members ranked by total score, highest first; ties keep join order.
    ///
    /// Meaningful once the room is [`RoomStatus::GameOver`], but readable
    /// at any time.
    pub fn final_scores(&self, room: &Room) -> Vec<FinalScore> {
        room.final_scores()
    }

    // -- internals --------------------------------------------------------

    fn load_required(&self, code: &RoomCode) -> Result<Room, RoomError> {
        self.store
            .load(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    /// Loads the room, applies `mutate`, saves. Retries on conflict.
    fn update<F>(&self, code: &RoomCode, mut mutate: F) -> Result<Room, RoomError>
    where
        F: FnMut(&mut Room) -> Result<(), RoomError>,
    {
        self.retrying(code, || {
            let mut room = self.load_required(code)?;
            mutate(&mut room)?;
            Ok(self.store.save(&room)?)
        })
    }

    /// Runs `attempt` until it doesn't fail with a store conflict.
    fn retrying<T, F>(&self, code: &RoomCode, mut attempt: F) -> Result<T, RoomError>
    where
        F: FnMut() -> Result<T, RoomError>,
    {
        let mut conflicts = 0;
        loop {
            match attempt() {
                Err(RoomError::Store(StoreError::Conflict { found, .. })) => {
                    conflicts += 1;
                    if conflicts > self.config.max_conflict_retries {
                        tracing::warn!(room = %code, conflicts, "giving up after repeated conflicts");
                        return Err(RoomError::Contended(code.clone()));
                    }
                    tracing::debug!(room = %code, found, conflicts, "concurrent write, re-applying");
                }
                other => return other,
            }
        }
    }
}

impl<S: RoomStore + ChangeFeed> RoomService<S> {
    /// Calls `handler` with the room's new state whenever another context
    /// changes it (`None` once it is deleted).
    ///
    /// Changes made through this service are not delivered: use the room
    /// each operation returns.
    ///
    /// # Errors
    /// Returns [`RoomError::Store`] if no Tokio runtime is running.
    pub fn subscribe<F>(&self, code: &RoomCode, handler: F) -> Result<Subscription, RoomError>
    where
        F: Fn(Option<Room>) + Send + 'static,
    {
        Ok(self.store.subscribe(code, handler)?)
    }
}
