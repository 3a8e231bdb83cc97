use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use wineguessr::prelude::*;

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A scripted player: always pins the map `offset` degrees away from the
/// true origin.
struct Seat {
    name: &'static str,
    offset: (f64, f64),
}

const SEATS: [Seat; 3] = [
    Seat { name: "Ana", offset: (0.5, -0.5) },
    Seat { name: "Ben", offset: (4.0, 6.0) },
    Seat { name: "Caro", offset: (-12.0, 20.0) },
];

/// Shifts `target` by `offset`, clamping latitude and wrapping longitude
/// back onto the map.
fn pin_near(target: Coordinates, offset: (f64, f64)) -> Coordinates {
    let lat = (target.lat + offset.0).clamp(-90.0, 90.0);
    let mut lng = target.lng + offset.1;
    if lng > 180.0 {
        lng -= 360.0;
    } else if lng < -180.0 {
        lng += 360.0;
    }
    Coordinates::new(lat, lng)
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Plays a full room game with every seat on its own tab. Returns the
/// final standings and how many changes the host's tab heard about.
async fn play_match(
    game: &Wineguessr,
    wines: &[Wine],
) -> Result<(Vec<FinalScore>, usize), WineguessrError> {
    let tabs: Vec<_> = SEATS.iter().map(|_| game.open_tab()).collect();

    let host = tabs[0].create_room(SEATS[0].name)?;
    let code = host.room.code.clone();
    let mut players = vec![host.player];
    for (tab, seat) in tabs.iter().zip(&SEATS).skip(1) {
        players.push(tab.join_room(code.as_str(), seat.name)?.player);
    }
    println!("room {code}: {} players", players.len());

    let heard = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&heard);
    let subscription = tabs[0].subscribe(&code, move |room| {
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(room) = room {
            tracing::debug!(status = %room.status, round = %room.round_label(), "host tab updated");
        }
    })?;

    let mut room = tabs[0].start_game(&code, wines)?;
    while room.status != RoomStatus::GameOver {
        let Some(wine) = room.current_wine().cloned() else {
            break;
        };
        println!("round {}: {} ({})", room.round_label(), wine.name, wine.grape);
        for ((tab, seat), player) in tabs.iter().zip(&SEATS).zip(&players) {
            let pin = pin_near(wine.winefarm_coordinates, seat.offset);
            room = tab.submit_guess(&code, &player.id, pin)?;
        }
        for line in room.round_standings() {
            let distance = line.distance.map_or_else(|| "-".to_string(), |d| format!("{d:.1}"));
            println!("  {:<5} {:>8} km  {:>4} pts", line.name, distance, line.score);
        }
        room = tabs[0].next_round(&code)?;
    }

    // Let the host's feed catch up before counting.
    tokio::time::sleep(Duration::from_millis(50)).await;
    subscription.unsubscribe();

    let standings = tabs[0].final_scores(&room);
    for (tab, player) in tabs.iter().zip(&players).rev() {
        tab.leave_room(&code, &player.id)?;
    }
    Ok((standings, heard.load(Ordering::Relaxed)))
}

/// Plays every wine solo with the first seat's aim.
fn play_solo(game: &Wineguessr, wines: Vec<Wine>) -> Result<u32, WineguessrError> {
    let mut solo = game.solo(wines)?;
    while !solo.is_finished() {
        let pin = pin_near(solo.current_wine().winefarm_coordinates, SEATS[0].offset);
        solo.guess(pin)?;
        solo.next_round()?;
    }
    Ok(solo.total_score())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let game = Wineguessr::builder().build();
    let wines = sample_wines()?;

    let (standings, heard) = play_match(&game, &wines).await?;
    println!("final scores (host tab heard {heard} changes):");
    for (place, entry) in standings.iter().enumerate() {
        println!("  {}. {:<5} {:>6}", place + 1, entry.name, entry.total_score);
    }

    let solo = play_solo(&game, wines)?;
    println!("solo: {solo} / {}", 5_000 * 5);
    Ok(())
}
