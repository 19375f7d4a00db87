//! Floating target balloons.
//!
//! Ambient targets rising from below the arena. They never hurt anyone;
//! an explosion that reaches one pops it and credits the explosion's
//! owner with a point.

use std::time::Duration;

use balloono_protocol::{EntityId, FloatingBalloonView, PlayerId};
use rand::Rng;
use rand::rngs::StdRng;

use crate::player::PALETTE;
use crate::{EntityIds, Explosion, GameConfig};

/// Extra depth below the bottom edge a new balloon may start at.
const SPAWN_DEPTH: f64 = 80.0;

/// Distance kept from the side walls when spawning.
const SIDE_MARGIN: f64 = 40.0;

#[derive(Debug, Clone)]
pub struct FloatingBalloon {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    /// Upward speed in units per second.
    pub speed: f64,
    pub color: &'static str,
}

/// Every floating balloon in a room plus the fractional spawn
/// accumulator.
#[derive(Debug, Clone, Default)]
pub struct FloatingField {
    items: Vec<FloatingBalloon>,
    pending: f64,
}

impl FloatingField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[FloatingBalloon] {
        &self.items
    }

    /// Spawns at `base + per_player × players` per second, then drifts
    /// every balloon upward and drops those past the top edge.
    pub fn advance(
        &mut self,
        elapsed: Duration,
        players: usize,
        rng: &mut StdRng,
        ids: &mut EntityIds,
        config: &GameConfig,
    ) {
        let dt = elapsed.as_secs_f64();
        let rate = config.floating_spawn_base + config.floating_spawn_per_player * players as f64;
        self.pending += rate * dt;
        while self.pending >= 1.0 {
            self.pending -= 1.0;
            let balloon = self.spawn(rng, ids, config);
            self.items.push(balloon);
        }

        for balloon in &mut self.items {
            balloon.y -= balloon.speed * dt;
        }
        self.items.retain(|b| b.y >= -b.radius);
    }

    fn spawn(&self, rng: &mut StdRng, ids: &mut EntityIds, config: &GameConfig) -> FloatingBalloon {
        let radius = config.floating_radius;
        let lo = SIDE_MARGIN.min(config.width / 2.0);
        let hi = (config.width - SIDE_MARGIN).max(lo);
        FloatingBalloon {
            id: ids.allocate(),
            x: rng.random_range(lo..=hi),
            y: config.height + radius + rng.random_range(0.0..=SPAWN_DEPTH),
            radius,
            speed: rng.random_range(config.floating_min_speed..=config.floating_max_speed),
            color: PALETTE[rng.random_range(0..PALETTE.len())],
        }
    }

    /// Pops every balloon whose circle touches an explosion's circle on
    /// the ground lane. Returns the owner of the popping explosion for
    /// each balloon popped.
    pub fn pop(&mut self, explosions: &[Explosion], ground_y: f64) -> Vec<PlayerId> {
        let mut awards = Vec::new();
        self.items.retain(|balloon| {
            let hit = explosions.iter().find(|e| {
                let dx = balloon.x - e.x;
                let dy = balloon.y - ground_y;
                (dx * dx + dy * dy).sqrt() <= balloon.radius + e.radius
            });
            match hit {
                Some(e) => {
                    awards.push(e.owner);
                    false
                }
                None => true,
            }
        });
        awards
    }

    pub(crate) fn views(&self) -> Vec<FloatingBalloonView> {
        self.items
            .iter()
            .map(|b| FloatingBalloonView {
                id: b.id,
                x: b.x,
                y: b.y,
                radius: b.radius,
                color: b.color.to_string(),
            })
            .collect()
    }
}
