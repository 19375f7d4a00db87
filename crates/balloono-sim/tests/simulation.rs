//! Whole-room properties checked over long, noisy runs.

use std::time::Duration;

use balloono_protocol::{InputCommand, PlayerId, RoomKey};
use balloono_sim::{GameConfig, Room};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// =========================================================================
// Helpers
// =========================================================================

fn random_input(rng: &mut StdRng) -> InputCommand {
    let movement = match rng.random_range(0..6) {
        0 => f64::NAN,
        1 => rng.random_range(-50.0..50.0),
        _ => f64::from(rng.random_range(-1i8..=1)),
    };
    InputCommand {
        movement,
        place_balloon: rng.random_bool(0.3),
        place_banana: rng.random_bool(0.05),
    }
}

/// Drives a room with random inputs and irregular tick lengths, calling
/// `check` after every tick.
fn fuzz_room(seed: u64, ticks: usize, mut check: impl FnMut(&Room, &[PlayerId])) {
    let mut driver = StdRng::seed_from_u64(seed);
    let mut room = Room::new(RoomKey::new("fuzz"), GameConfig::default(), seed);
    let players: Vec<PlayerId> = (0..4)
        .map(|i| room.add_player(&format!("p{i}")).unwrap())
        .collect();

    for _ in 0..ticks {
        for &id in &players {
            if driver.random_bool(0.5) {
                room.queue_input(id, random_input(&mut driver)).unwrap();
            }
        }
        let elapsed = Duration::from_millis(driver.random_range(0..=250));
        room.advance(elapsed);
        check(&room, &players);
    }
}

// =========================================================================
// Properties
// =========================================================================

#[test]
fn test_positions_stay_in_bounds() {
    fuzz_room(1, 2_000, |room, _| {
        let width = room.config().width;
        for p in room.players() {
            assert!(p.x >= 0.0 && p.x <= width, "player {} at {}", p.id, p.x);
        }
        for b in room.hazards().balloons() {
            assert!(b.x >= 0.0 && b.x <= width);
        }
    });
}

#[test]
fn test_live_balloons_never_exceed_capacity() {
    fuzz_room(2, 2_000, |room, players| {
        for &id in players {
            let player = room.player(id).unwrap();
            assert!(room.hazards().live_balloons(id) <= player.capacity);
        }
    });
}

#[test]
fn test_no_balloon_detonates_early_without_a_chain() {
    let config = GameConfig::default();
    let fuse = config.balloon_fuse;
    fuzz_room(3, 1_000, |room, _| {
        for explosion in room.hazards().explosions() {
            assert!(explosion.created_at <= room.now());
        }
        for balloon in room.hazards().balloons() {
            assert!(balloon.detonate_at <= balloon.placed_at + fuse);
            assert!(balloon.detonate_at >= balloon.placed_at);
        }
    });
}

#[test]
fn test_snapshot_matches_room_state() {
    fuzz_room(4, 500, |room, players| {
        let snap = room.snapshot();
        assert_eq!(snap.server_time, room.now().as_secs_f64());
        assert_eq!(snap.players.len(), players.len());
        assert_eq!(snap.placed_balloons.len(), room.hazards().balloons().count());
        for view in &snap.players {
            assert_eq!(view.live_balloons, room.hazards().live_balloons(view.id));
        }
        assert_eq!(snap, room.snapshot());
    });
}

#[test]
fn test_same_seed_same_game() {
    let mut runs = Vec::new();
    for _ in 0..2 {
        let mut last = None;
        fuzz_room(5, 1_500, |room, _| last = Some(room.snapshot()));
        runs.push(last.unwrap());
    }

    // Player ids are process-unique, so compare everything else.
    let [a, b] = [&runs[0], &runs[1]];
    assert_eq!(a.server_time, b.server_time);
    assert_eq!(a.balloons, b.balloons);
    assert_eq!(a.powerups, b.powerups);
    let stats = |s: &balloono_protocol::Snapshot| {
        s.players
            .iter()
            .map(|p| (p.x, p.score, p.balloon_capacity))
            .collect::<Vec<_>>()
    };
    assert_eq!(stats(a), stats(b));
}
