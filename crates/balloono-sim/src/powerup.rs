//! Power-up spawning, pickup and effects.

use std::collections::BTreeMap;
use std::time::Duration;

use balloono_protocol::{EntityId, PlayerId, PowerupKind, PowerupView};
use rand::Rng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::{EntityIds, GameConfig, Player, secs};

/// Candidate positions tried per spawn before giving up.
const SPAWN_ATTEMPTS: usize = 8;

/// Distance kept from the world edges when spawning.
const EDGE_MARGIN: f64 = 50.0;

/// A collectible lying on the ground.
#[derive(Debug, Clone)]
pub struct Powerup {
    pub id: EntityId,
    pub kind: PowerupKind,
    pub x: f64,
    pub created_at: Duration,
    pub expires_at: Duration,
}

impl Powerup {
    fn view(&self) -> PowerupView {
        PowerupView {
            id: self.id,
            kind: self.kind,
            x: self.x,
            created_at: secs(self.created_at),
            expires_at: secs(self.expires_at),
        }
    }
}

/// The live power-ups of a room plus the spawn timer.
#[derive(Debug, Clone, Default)]
pub struct PowerupField {
    items: Vec<Powerup>,
    since_spawn: Duration,
}

impl PowerupField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[Powerup] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts a power-up directly, bypassing the spawner.
    pub fn insert(&mut self, powerup: Powerup) {
        self.items.push(powerup);
    }

    /// Hands each power-up to the lowest-id player touching it and
    /// applies the effect. Returns how many were collected.
    pub fn collect(
        &mut self,
        players: &mut BTreeMap<PlayerId, Player>,
        now: Duration,
        config: &GameConfig,
    ) -> usize {
        let mut collected = Vec::new();
        self.items.retain(|powerup| {
            let picker = players
                .values()
                .find(|p| (p.x - powerup.x).abs() <= config.pickup_radius)
                .map(|p| p.id);
            match picker {
                Some(picker) => {
                    collected.push((picker, powerup.kind, powerup.id));
                    false
                }
                None => true,
            }
        });

        for &(picker, kind, id) in &collected {
            debug!(player = %picker, powerup = %id, ?kind, "power-up collected");
            apply(kind, picker, players, now, config);
        }
        collected.len()
    }

    pub fn expire(&mut self, now: Duration) {
        self.items.retain(|p| now < p.expires_at);
    }

    /// Advances the spawn timer and, once per interval, spawns one
    /// power-up if the room is below its cap and `is_free` accepts one
    /// of the candidate positions.
    pub fn spawn_tick(
        &mut self,
        elapsed: Duration,
        now: Duration,
        rng: &mut StdRng,
        ids: &mut EntityIds,
        config: &GameConfig,
        is_free: impl Fn(f64) -> bool,
    ) -> Option<EntityId> {
        self.since_spawn += elapsed;
        if self.since_spawn < config.powerup_interval {
            return None;
        }
        self.since_spawn = Duration::ZERO;
        if self.items.len() >= config.powerup_cap {
            return None;
        }

        let lo = EDGE_MARGIN.min(config.width / 2.0);
        let hi = (config.width - EDGE_MARGIN).max(lo);
        let x = (0..SPAWN_ATTEMPTS)
            .map(|_| rng.random_range(lo..=hi))
            .find(|&x| is_free(x));
        let Some(x) = x else {
            debug!("no free spot for a power-up, skipping spawn");
            return None;
        };

        let kind = PowerupKind::ALL[rng.random_range(0..PowerupKind::ALL.len())];
        let id = ids.allocate();
        self.items.push(Powerup {
            id,
            kind,
            x,
            created_at: now,
            expires_at: now + config.powerup_lifetime,
        });
        debug!(powerup = %id, ?kind, x, "power-up spawned");
        Some(id)
    }

    pub(crate) fn views(&self) -> Vec<PowerupView> {
        self.items.iter().map(Powerup::view).collect()
    }
}

/// Applies a power-up's effect for `picker`.
fn apply(
    kind: PowerupKind,
    picker: PlayerId,
    players: &mut BTreeMap<PlayerId, Player>,
    now: Duration,
    config: &GameConfig,
) {
    match kind {
        PowerupKind::Speed => {
            if let Some(p) = players.get_mut(&picker) {
                p.speed_mult = (p.speed_mult + config.speed_step).min(config.max_speed_mult);
                p.speed_until = now + config.speed_boost_duration;
            }
        }
        PowerupKind::Capacity => {
            if let Some(p) = players.get_mut(&picker) {
                p.capacity = p.capacity.saturating_add(1);
            }
        }
        PowerupKind::Blast => {
            if let Some(p) = players.get_mut(&picker) {
                p.blast_radius += config.blast_step;
            }
        }
        PowerupKind::Slow => {
            let until = now + config.slow_pickup_duration;
            for other in players.values_mut().filter(|p| p.id != picker) {
                other.slow(until);
            }
        }
    }
}
