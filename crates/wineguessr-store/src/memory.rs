//! In-process shared medium: a keyed byte store plus a change channel.
//!
//! [`SharedStorage`] plays the part of a browser origin's local storage.
//! Each [`ContextStore`] opened from it is one client of that storage (a
//! tab): all contexts see the same keys, and each hears about the others'
//! writes through the change feed.
//!
//! # Concurrency note
//!
//! The key map sits behind a `std::sync::Mutex`. Every operation holds it
//! only for one read-check-write, so individual key writes are atomic.
//! Each write (raw ones included) gets the next sequence number and is
//! published before the lock is released, so changes go out in write
//! order. Nothing here awaits.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tokio::sync::broadcast;
use wineguessr_protocol::{Codec, JsonCodec, Room, RoomCode};

use crate::feed::{Snapshot, spawn_delivery};
use crate::{ChangeFeed, RoomChange, RoomStore, StoreError, Subscription, room_key};

// ---------------------------------------------------------------------------
// StorageConfig
// ---------------------------------------------------------------------------

/// Settings for a [`SharedStorage`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Capacity of the change channel. A subscriber that falls further
    /// behind than this reloads the room instead of replaying changes.
    pub feed_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { feed_capacity: 256 }
    }
}

// ---------------------------------------------------------------------------
// ContextId
// ---------------------------------------------------------------------------

/// Identifies one client of the shared medium.
///
/// `ContextId(0)` is reserved for writes made directly on the
/// [`SharedStorage`] (outside any context); every subscriber hears them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Medium
// ---------------------------------------------------------------------------

/// Only the version is needed to check a write, so don't decode the room.
#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u64,
}

/// One key's last write. `bytes` is `None` once the key was deleted; the
/// slot stays so later readers still know who deleted it and when.
struct Slot {
    bytes: Option<Vec<u8>>,
    origin: ContextId,
    seq: u64,
}

/// Everything behind the medium's lock.
#[derive(Default)]
struct Slots {
    by_key: HashMap<String, Slot>,
    /// Sequence number of the latest write to any key.
    seq: u64,
}

impl Slots {
    fn bytes(&self, key: &str) -> Option<&Vec<u8>> {
        self.by_key.get(key).and_then(|slot| slot.bytes.as_ref())
    }

    /// Records a write (`None` deletes) and returns its sequence number.
    fn write(&mut self, key: String, bytes: Option<Vec<u8>>, origin: ContextId) -> u64 {
        self.seq += 1;
        let seq = self.seq;
        self.by_key.insert(key, Slot { bytes, origin, seq });
        seq
    }

    fn live(&self) -> usize {
        self.by_key.values().filter(|slot| slot.bytes.is_some()).count()
    }
}

struct Medium<C: Codec> {
    slots: Mutex<Slots>,
    changes: broadcast::Sender<RoomChange>,
    codec: C,
    next_context: AtomicU64,
}

impl<C: Codec> Medium<C> {
    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Option<Room> {
        match self.codec.decode::<Room>(bytes) {
            Ok(room) => Some(room),
            Err(e) => {
                tracing::warn!(%key, error = %e, "unreadable room value, treating as absent");
                None
            }
        }
    }

    fn load(&self, code: &RoomCode) -> Option<Room> {
        let key = room_key(code);
        let bytes = self.slots().bytes(&key).cloned()?;
        self.decode(&key, &bytes)
    }

    /// The last write to `code`'s key, with the room decoded.
    fn snapshot(&self, code: &RoomCode) -> Snapshot {
        let key = room_key(code);
        let (origin, seq, bytes) = match self.slots().by_key.get(&key) {
            Some(slot) => (slot.origin, slot.seq, slot.bytes.clone()),
            None => (ContextId(0), 0, None),
        };
        Snapshot {
            origin,
            seq,
            room: bytes.and_then(|bytes| self.decode(&key, &bytes)),
        }
    }

    /// Stored version under `key`; 0 if absent or unreadable.
    fn stored_version(&self, slots: &Slots, key: &str) -> u64 {
        slots
            .bytes(key)
            .and_then(|bytes| self.codec.decode::<VersionProbe>(bytes).ok())
            .map_or(0, |probe| probe.version)
    }

    fn save(&self, origin: ContextId, room: &Room) -> Result<Room, StoreError> {
        let key = room_key(&room.code);
        let mut slots = self.slots();

        let found = self.stored_version(&slots, &key);
        if found != room.version {
            tracing::warn!(
                room = %room.code,
                expected = room.version,
                found,
                "save rejected, room changed concurrently"
            );
            return Err(StoreError::Conflict {
                code: room.code.clone(),
                expected: room.version,
                found,
            });
        }

        let mut stored = room.clone();
        stored.version = found + 1;
        let bytes = self.codec.encode(&stored)?;
        let seq = slots.write(key, Some(bytes), origin);
        tracing::debug!(room = %stored.code, version = stored.version, seq, %origin, "room saved");

        // Publish under the lock so the feed sees writes in order.
        self.publish(origin, seq, stored.code.clone(), Some(stored.clone()));
        Ok(stored)
    }

    fn delete(&self, origin: ContextId, room: &Room) -> Result<(), StoreError> {
        let key = room_key(&room.code);
        let mut slots = self.slots();

        let found = self.stored_version(&slots, &key);
        if found != room.version {
            return Err(StoreError::Conflict {
                code: room.code.clone(),
                expected: room.version,
                found,
            });
        }

        if slots.bytes(&key).is_some() {
            let seq = slots.write(key, None, origin);
            tracing::debug!(room = %room.code, seq, %origin, "room deleted");
            self.publish(origin, seq, room.code.clone(), None);
        }
        Ok(())
    }

    fn publish(&self, origin: ContextId, seq: u64, code: RoomCode, room: Option<Room>) {
        // No receivers is fine: nobody is watching.
        let _ = self.changes.send(RoomChange {
            origin,
            seq,
            code,
            room,
        });
    }
}

// ---------------------------------------------------------------------------
// SharedStorage
// ---------------------------------------------------------------------------

/// The shared medium every context reads and writes.
///
/// Cheap to clone: clones share the same keys and change channel.
pub struct SharedStorage<C: Codec = JsonCodec> {
    medium: Arc<Medium<C>>,
}

impl SharedStorage<JsonCodec> {
    /// Creates an empty JSON-backed storage with default settings.
    pub fn new() -> Self {
        Self::with_codec(JsonCodec, StorageConfig::default())
    }
}

impl Default for SharedStorage<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> Clone for SharedStorage<C> {
    fn clone(&self) -> Self {
        Self {
            medium: Arc::clone(&self.medium),
        }
    }
}

impl<C: Codec> SharedStorage<C> {
    pub fn with_codec(codec: C, config: StorageConfig) -> Self {
        let (changes, _) = broadcast::channel(config.feed_capacity.max(1));
        Self {
            medium: Arc::new(Medium {
                slots: Mutex::new(Slots::default()),
                changes,
                codec,
                next_context: AtomicU64::new(1),
            }),
        }
    }

    /// Opens a new client of this storage with its own [`ContextId`].
    pub fn open_context(&self) -> ContextStore<C> {
        let id = ContextId(self.medium.next_context.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(context = %id, "context opened");
        ContextStore {
            id,
            medium: Arc::clone(&self.medium),
        }
    }

    /// Raw bytes stored under `key`.
    pub fn get_raw(&self, key: &str) -> Option<Vec<u8>> {
        self.medium.slots().bytes(key).cloned()
    }

    /// Overwrites `key` with raw bytes, bypassing versioning.
    ///
    /// Subscribers to the matching room hear about it (with the decoded
    /// room, or `None` if the bytes don't decode).
    pub fn set_raw(&self, key: &str, bytes: Vec<u8>) {
        let decoded = self.medium.codec.decode::<Room>(&bytes).ok();
        let mut slots = self.medium.slots();
        let seq = slots.write(key.to_string(), Some(bytes), ContextId(0));
        if let Some(code) = key.strip_prefix(crate::ROOM_KEY_PREFIX) {
            self.medium
                .publish(ContextId(0), seq, RoomCode(code.to_string()), decoded);
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.medium.slots().live()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// ContextStore
// ---------------------------------------------------------------------------

/// One context's view of a [`SharedStorage`].
///
/// Implements [`RoomStore`] for the room protocol and [`ChangeFeed`] for
/// subscribing to other contexts' writes.
pub struct ContextStore<C: Codec = JsonCodec> {
    id: ContextId,
    medium: Arc<Medium<C>>,
}

impl<C: Codec> ContextStore<C> {
    pub fn id(&self) -> ContextId {
        self.id
    }
}

impl<C: Codec> Clone for ContextStore<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            medium: Arc::clone(&self.medium),
        }
    }
}

impl<C: Codec> RoomStore for ContextStore<C> {
    fn load(&self, code: &RoomCode) -> Option<Room> {
        self.medium.load(code)
    }

    fn save(&self, room: &Room) -> Result<Room, StoreError> {
        self.medium.save(self.id, room)
    }

    fn delete(&self, room: &Room) -> Result<(), StoreError> {
        self.medium.delete(self.id, room)
    }
}

impl<C: Codec> ChangeFeed for ContextStore<C> {
    fn subscribe<F>(&self, code: &RoomCode, handler: F) -> Result<Subscription, StoreError>
    where
        F: Fn(Option<Room>) + Send + 'static,
    {
        // Open the receiver and read the write position together, so every
        // later write is on the channel and no earlier one is replayed.
        let (rx, since) = {
            let slots = self.medium.slots();
            (self.medium.changes.subscribe(), slots.seq)
        };
        let medium = Arc::clone(&self.medium);
        let sub = spawn_delivery(rx, since, self.id, code.clone(), handler, move |code| {
            medium.snapshot(code)
        })?;
        tracing::debug!(room = %code, context = %self.id, "subscribed");
        Ok(sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wineguessr_protocol::{Player, PlayerId};

    fn lobby(code: &str) -> Room {
        Room::new(RoomCode::from(code), Player::host(PlayerId::from("p1"), "Ana"))
    }

    #[test]
    fn test_save_new_room_sets_version_one() {
        let storage = SharedStorage::new();
        let ctx = storage.open_context();
        let stored = ctx.save(&lobby("AB12")).unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(ctx.load(&RoomCode::from("AB12")), Some(stored));
    }

    #[test]
    fn test_save_stale_version_conflicts() {
        let storage = SharedStorage::new();
        let a = storage.open_context();
        let b = storage.open_context();
        let v1 = a.save(&lobby("AB12")).unwrap();

        let mut from_a = v1.clone();
        from_a.players[0].name = "A".into();
        let mut from_b = v1;
        from_b.players[0].name = "B".into();

        a.save(&from_a).unwrap();
        let err = b.save(&from_b).unwrap_err();
        assert!(
            matches!(&err, StoreError::Conflict { expected: 1, found: 2, .. }),
            "{err:?}"
        );
        assert_eq!(a.load(&RoomCode::from("AB12")).unwrap().players[0].name, "A");
    }

    #[test]
    fn test_create_over_existing_conflicts() {
        let storage = SharedStorage::new();
        let ctx = storage.open_context();
        ctx.save(&lobby("AB12")).unwrap();
        let err = ctx.save(&lobby("AB12")).unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_corrupt_value_loads_as_absent() {
        let storage = SharedStorage::new();
        storage.set_raw("wineguessr_room_AB12", b"{broken".to_vec());
        let ctx = storage.open_context();
        assert_eq!(ctx.load(&RoomCode::from("AB12")), None);
        // And a fresh room may be written over it.
        assert_eq!(ctx.save(&lobby("AB12")).unwrap().version, 1);
    }

    #[test]
    fn test_delete_removes_key() {
        let storage = SharedStorage::new();
        let ctx = storage.open_context();
        let stored = ctx.save(&lobby("AB12")).unwrap();
        ctx.delete(&stored).unwrap();
        assert!(storage.is_empty());
        assert_eq!(ctx.load(&RoomCode::from("AB12")), None);
    }

    #[test]
    fn test_snapshot_records_writer_through_deletion() {
        let storage = SharedStorage::new();
        let ctx = storage.open_context();
        let code = RoomCode::from("AB12");
        let stored = ctx.save(&lobby("AB12")).unwrap();

        let snap = storage.medium.snapshot(&code);
        assert_eq!((snap.origin, snap.seq), (ctx.id(), 1));
        assert_eq!(snap.room, Some(stored.clone()));

        ctx.delete(&stored).unwrap();
        let snap = storage.medium.snapshot(&code);
        assert_eq!((snap.origin, snap.seq, snap.room), (ctx.id(), 2, None));
        assert!(storage.is_empty());
        assert_eq!(storage.get_raw(&room_key(&code)), None);
    }

    #[test]
    fn test_raw_write_takes_next_seq() {
        let storage = SharedStorage::new();
        let ctx = storage.open_context();
        ctx.save(&lobby("AB12")).unwrap();
        storage.set_raw("wineguessr_room_AB12", b"{broken".to_vec());

        let snap = storage.medium.snapshot(&RoomCode::from("AB12"));
        assert_eq!((snap.origin, snap.seq, snap.room), (ContextId(0), 2, None));
    }

    #[test]
    fn test_snapshot_of_unknown_key_is_empty() {
        let storage = SharedStorage::new();
        let snap = storage.medium.snapshot(&RoomCode::from("NOPE"));
        assert_eq!((snap.origin, snap.seq, snap.room), (ContextId(0), 0, None));
    }

    #[test]
    fn test_contexts_get_distinct_ids() {
        let storage = SharedStorage::new();
        assert_ne!(storage.open_context().id(), storage.open_context().id());
    }
}
