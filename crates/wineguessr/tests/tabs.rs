//! End-to-end: several tabs of one device sharing a room.

use std::time::Duration;

use tokio::sync::mpsc;
use wineguessr::prelude::*;

async fn next_change(rx: &mut mpsc::UnboundedReceiver<Option<Room>>) -> Option<Room> {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a change")
        .expect("feed closed")
}

#[tokio::test]
async fn test_guest_tab_follows_host_through_a_game() {
    let game = Wineguessr::default();
    let host_tab = game.open_tab();
    let guest_tab = game.open_tab();

    let host = host_tab.create_room("Ana").unwrap();
    let guest = guest_tab.join_room(&host.room.code.as_str().to_lowercase(), "Ben").unwrap();
    assert_eq!(guest.room.code, host.room.code);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = guest_tab
        .subscribe(&host.room.code, move |room| {
            let _ = tx.send(room);
        })
        .unwrap();

    let wines = sample_wines().unwrap();
    let started = host_tab.start_game(&host.room.code, &wines).unwrap();
    let seen = next_change(&mut rx).await.unwrap();
    assert_eq!(seen.status, RoomStatus::Playing);
    assert_eq!(seen.wines, started.wines);

    let origin = started.current_wine().unwrap().winefarm_coordinates;
    host_tab.submit_guess(&started.code, &host.player.id, origin).unwrap();
    let seen = next_change(&mut rx).await.unwrap();
    assert!(seen.has_guessed(&host.player.id));
    assert_eq!(seen.status, RoomStatus::Playing);

    // The guest's own guess completes the round but isn't echoed back.
    let room = guest_tab
        .submit_guess(&started.code, &guest.player.id, Coordinates::new(0.0, 0.0))
        .unwrap();
    assert_eq!(room.status, RoomStatus::RoundSummary);
    assert!(
        tokio::time::timeout(Duration::from_millis(50), rx.recv())
            .await
            .is_err()
    );

    let scores = guest_tab.final_scores(&room);
    assert_eq!(scores[0].player_id, host.player.id);
    assert_eq!(scores[0].total_score, 5000);
}

#[tokio::test]
async fn test_room_closing_reaches_other_tabs() {
    let game = Wineguessr::default();
    let host_tab = game.open_tab();
    let watcher = game.open_tab();

    let host = host_tab.create_room("Ana").unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = watcher
        .subscribe(&host.room.code, move |room| {
            let _ = tx.send(room);
        })
        .unwrap();

    let outcome = host_tab.leave_room(&host.room.code, &host.player.id).unwrap();
    assert!(matches!(outcome, LeaveOutcome::Closed));
    assert!(next_change(&mut rx).await.is_none());

    let err: WineguessrError = watcher.join_room(host.room.code.as_str(), "Ben").unwrap_err().into();
    assert!(err.is_room_not_found());
}
