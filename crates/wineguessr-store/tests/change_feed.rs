//! Integration tests for cross-context change notification.

use std::time::Duration;

use tokio::sync::mpsc;
use wineguessr_protocol::{JsonCodec, Player, PlayerId, Room, RoomCode};
use wineguessr_store::{
    ChangeFeed, RoomStore, SharedStorage, StorageConfig, StoreError, room_key,
};

// =========================================================================
// Helpers
// =========================================================================

fn lobby(code: &str) -> Room {
    Room::new(RoomCode::from(code), Player::host(PlayerId::from("p1"), "Ana"))
}

/// A storage whose change channel holds one write, so any subscriber
/// that isn't polled between two writes lags.
fn tiny_feed() -> SharedStorage {
    SharedStorage::with_codec(JsonCodec, StorageConfig { feed_capacity: 1 })
}

/// Forwards every callback invocation into a channel the test can await.
fn forwarding() -> (
    impl Fn(Option<Room>) + Send + 'static,
    mpsc::UnboundedReceiver<Option<Room>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (move |room| {
        let _ = tx.send(room);
    }, rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Option<Room>>) -> Option<Room> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("no change delivered within 2s")
        .expect("feed closed")
}

async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<Option<Room>>) {
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(got.is_err(), "unexpected delivery: {got:?}");
}

// =========================================================================
// Delivery
// =========================================================================

#[tokio::test]
async fn test_other_context_write_is_delivered() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    let stored = writer.save(&lobby("AB12")).unwrap();

    let delivered = next(&mut rx).await.expect("room should be present");
    assert_eq!(delivered, stored);
}

#[tokio::test]
async fn test_own_write_is_not_delivered() {
    let storage = SharedStorage::new();
    let ctx = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = ctx.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    ctx.save(&lobby("AB12")).unwrap();
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_other_rooms_are_filtered_out() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    writer.save(&lobby("ZZ99")).unwrap();
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_delete_delivers_none() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();
    let stored = writer.save(&lobby("AB12")).unwrap();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    writer.delete(&stored).unwrap();
    assert_eq!(next(&mut rx).await, None);
}

#[tokio::test]
async fn test_corrupt_raw_write_delivers_none() {
    let storage = SharedStorage::new();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    storage.set_raw(&room_key(&RoomCode::from("AB12")), b"not json".to_vec());
    assert_eq!(next(&mut rx).await, None);
}

#[tokio::test]
async fn test_changes_arrive_in_write_order() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    let mut room = writer.save(&lobby("AB12")).unwrap();
    for i in 0..5 {
        room.players.push(Player::guest(PlayerId(format!("g{i}")), "guest"));
        room = writer.save(&room).unwrap();
    }

    for expected in 1..=6 {
        let got = next(&mut rx).await.unwrap();
        assert_eq!(got.version, expected);
    }
}

// =========================================================================
// Lagging subscribers
// =========================================================================

#[tokio::test]
async fn test_lagged_own_writes_are_not_delivered() {
    let storage = tiny_feed();
    let ctx = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = ctx.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    let mut room = ctx.save(&lobby("AB12")).unwrap();
    for name in ["x", "y", "z"] {
        room.players[0].name = name.into();
        room = ctx.save(&room).unwrap();
    }
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_lagged_other_writes_deliver_latest_once() {
    let storage = tiny_feed();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    let mut room = writer.save(&lobby("AB12")).unwrap();
    for i in 0..4 {
        room.players.push(Player::guest(PlayerId(format!("g{i}")), "guest"));
        room = writer.save(&room).unwrap();
    }

    let got = next(&mut rx).await.unwrap();
    assert_eq!(got, room);
    assert_eq!(got.version, 5);
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_lagged_reload_of_own_write_over_others_is_skipped() {
    let storage = tiny_feed();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    // The watcher builds on the other context's write, so its own latest
    // write already contains it.
    let mut room = writer.save(&lobby("AB12")).unwrap();
    for name in ["x", "y"] {
        room.players[0].name = name.into();
        room = watcher.save(&room).unwrap();
    }
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_lagged_delete_by_other_delivers_none() {
    let storage = tiny_feed();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    let mut room = writer.save(&lobby("AB12")).unwrap();
    room.players[0].name = "x".into();
    let room = writer.save(&room).unwrap();
    writer.delete(&room).unwrap();

    assert_eq!(next(&mut rx).await, None);
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_writes_before_subscribe_are_not_replayed() {
    let storage = tiny_feed();
    let writer = storage.open_context();
    let watcher = storage.open_context();
    let room = writer.save(&lobby("AB12")).unwrap();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();
    assert_quiet(&mut rx).await;

    let mut room = room;
    room.players[0].name = "x".into();
    let room = writer.save(&room).unwrap();
    assert_eq!(next(&mut rx).await, Some(room));
}

#[tokio::test]
async fn test_raw_write_sequence_follows_saves() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let _sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();

    writer.save(&lobby("AB12")).unwrap();
    storage.set_raw(&room_key(&RoomCode::from("AB12")), b"not json".to_vec());

    assert_eq!(next(&mut rx).await.unwrap().version, 1);
    assert_eq!(next(&mut rx).await, None);
}

// =========================================================================
// Unsubscribe
// =========================================================================

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    let sub = watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap();
    assert_eq!(sub.code().as_str(), "AB12");
    sub.unsubscribe();

    writer.save(&lobby("AB12")).unwrap();
    // The handler (and its sender) is gone once the task is aborted, so
    // the channel either stays silent or reports closed. Never a room.
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(matches!(got, Err(_) | Ok(None)), "unexpected delivery: {got:?}");
}

#[tokio::test]
async fn test_dropping_subscription_unsubscribes() {
    let storage = SharedStorage::new();
    let writer = storage.open_context();
    let watcher = storage.open_context();

    let (handler, mut rx) = forwarding();
    drop(watcher.subscribe(&RoomCode::from("AB12"), handler).unwrap());

    writer.save(&lobby("AB12")).unwrap();
    let got = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(matches!(got, Err(_) | Ok(None)), "unexpected delivery: {got:?}");
}

// =========================================================================
// Runtime requirement
// =========================================================================

#[test]
fn test_subscribe_outside_runtime_fails() {
    let storage = SharedStorage::new();
    let ctx = storage.open_context();
    let result = ctx.subscribe(&RoomCode::from("AB12"), |_| {});
    assert!(matches!(result, Err(StoreError::NoRuntime)));
}
