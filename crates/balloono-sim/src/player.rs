//! Player state and 1-D movement.

use std::time::Duration;

use balloono_protocol::{PlayerId, PlayerView};

use crate::{GameConfig, secs};

/// Colors handed out to joining players, in rotation.
pub(crate) const PALETTE: [&str; 6] = [
    "#ff5d5d", "#ffb347", "#f9e65c", "#6bd4ff", "#8b6bff", "#6bff95",
];

/// Longest display name kept.
pub(crate) const MAX_NAME_LEN: usize = 32;

/// One player in a room.
///
/// Every timed effect is an absolute server timestamp compared against
/// the room clock: a player is slowed while `now < slow_until`, boosted
/// while `now < speed_until`, and may place a banana once
/// `now >= banana_ready_until`.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: &'static str,
    /// Horizontal position, always within `[0, width]`.
    pub x: f64,
    pub score: u32,
    /// Movement intent: -1, 0 or +1. Persists until the next input.
    pub intent: i8,
    /// Speed multiplier, ≥ 1. Back to 1 once `speed_until` passes.
    pub speed_mult: f64,
    pub speed_until: Duration,
    /// Maximum simultaneous live balloons, ≥ 1.
    pub capacity: u32,
    /// Radius given to balloons placed from now on.
    pub blast_radius: f64,
    pub slow_until: Duration,
    pub banana_ready_until: Duration,
    pub last_balloon_at: Option<Duration>,
}

impl Player {
    /// Creates a player with baseline stats at `x`.
    pub fn new(id: PlayerId, name: &str, color: &'static str, x: f64, config: &GameConfig) -> Self {
        Self {
            id,
            name: sanitize_name(name),
            color,
            x: x.clamp(0.0, config.width),
            score: 0,
            intent: 0,
            speed_mult: 1.0,
            speed_until: Duration::ZERO,
            capacity: config.default_capacity,
            blast_radius: config.base_blast_radius,
            slow_until: Duration::ZERO,
            banana_ready_until: Duration::ZERO,
            last_balloon_at: None,
        }
    }

    pub fn is_slowed(&self, now: Duration) -> bool {
        now < self.slow_until
    }

    /// Base speed × multiplier, reduced while slowed.
    pub fn effective_speed(&self, now: Duration, config: &GameConfig) -> f64 {
        let slow = if self.is_slowed(now) { config.slow_factor } else { 1.0 };
        config.player_speed * self.speed_mult * slow
    }

    /// Extends the slow effect to at least `until`. Never shortens it.
    pub fn slow(&mut self, until: Duration) {
        self.slow_until = self.slow_until.max(until);
    }

    /// Drops an expired speed boost.
    pub(crate) fn expire_boost(&mut self, now: Duration) {
        if self.speed_mult > 1.0 && now >= self.speed_until {
            self.speed_mult = 1.0;
        }
    }

    /// Moves the player by `elapsed` of its current intent.
    pub(crate) fn step(&mut self, elapsed: Duration, now: Duration, config: &GameConfig) {
        let speed = self.effective_speed(now, config);
        self.x = apply_movement(self.x, self.intent, elapsed, speed, config.width);
    }

    pub(crate) fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn view(
        &self,
        now: Duration,
        live_balloons: u32,
        has_banana: bool,
    ) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            color: self.color.to_string(),
            x: self.x,
            score: self.score,
            moving: self.intent,
            speed_mult: self.speed_mult,
            balloon_capacity: self.capacity,
            blast_radius: self.blast_radius,
            live_balloons,
            slow_until: secs(self.slow_until),
            slowed: self.is_slowed(now),
            banana_ready: now >= self.banana_ready_until && !has_banana,
            banana_ready_until: secs(self.banana_ready_until),
            has_banana,
        }
    }
}

/// New position after moving `intent × speed × elapsed`, clamped to
/// `[0, width]`.
///
/// Pure: depends on nothing but its arguments. A non-finite result (from
/// a corrupted speed) leaves the player where it was.
pub fn apply_movement(x: f64, intent: i8, elapsed: Duration, speed: f64, width: f64) -> f64 {
    let dir = f64::from(intent.clamp(-1, 1));
    let next = x + dir * speed * elapsed.as_secs_f64();
    debug_assert!(next.is_finite(), "non-finite position from speed {speed}");
    let next = if next.is_finite() { next } else { x };
    next.clamp(0.0, width)
}

fn sanitize_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() { "player".to_string() } else { name }
}
