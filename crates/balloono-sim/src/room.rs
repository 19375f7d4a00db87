//! One arena and its tick.

use std::collections::BTreeMap;
use std::time::Duration;

use balloono_protocol::{EntityId, InputCommand, PlayerId, PowerupKind, RoomKey, Snapshot};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::player::PALETTE;
use crate::{
    ActionError, EntityIds, FloatingField, GameConfig, Hazards, Player, Powerup, PowerupField,
    ServerClock, next_player_id, secs,
};

/// Evenly spaced spawn positions across the ground.
const SPAWN_SLOTS: usize = 8;

/// Gap left between a spawn and the edge of a blast.
const SPAWN_CLEARANCE: f64 = 1.0;

/// Points for popping a floating target balloon.
const POP_POINTS: u32 = 1;

/// The authoritative state of one room.
///
/// A `Room` is plain data with no interior locking: the caller must
/// ensure a single writer (the room actor does). Inputs and removals
/// are queued and only take effect inside [`advance`](Self::advance),
/// so a snapshot never shows a half-applied tick.
#[derive(Debug)]
pub struct Room {
    key: RoomKey,
    config: GameConfig,
    clock: ServerClock,
    rng: StdRng,
    ids: EntityIds,
    players: BTreeMap<PlayerId, Player>,
    /// Latched input per player since the last tick.
    pending: BTreeMap<PlayerId, InputCommand>,
    removals: Vec<PlayerId>,
    hazards: Hazards,
    powerups: PowerupField,
    floaters: FloatingField,
    joins: usize,
    /// Server time at which the room last became empty.
    empty_since: Option<Duration>,
}

impl Room {
    /// Creates an empty room. The seed fixes every random choice the
    /// room will make.
    pub fn new(key: RoomKey, config: GameConfig, seed: u64) -> Self {
        Self {
            key,
            config: config.validated(),
            clock: ServerClock::new(),
            rng: StdRng::seed_from_u64(seed),
            ids: EntityIds::new(),
            players: BTreeMap::new(),
            pending: BTreeMap::new(),
            removals: Vec::new(),
            hazards: Hazards::new(),
            powerups: PowerupField::new(),
            floaters: FloatingField::new(),
            joins: 0,
            empty_since: Some(Duration::ZERO),
        }
    }

    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current server time.
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn hazards(&self) -> &Hazards {
        &self.hazards
    }

    pub fn powerups(&self) -> &PowerupField {
        &self.powerups
    }

    pub fn floaters(&self) -> &FloatingField {
        &self.floaters
    }

    /// Adds a player with baseline stats at a point no explosion covers.
    ///
    /// # Errors
    /// [`ActionError::NoFreeSpawn`] while explosions cover the whole
    /// ground. Nothing changes; the caller retries after a later tick.
    pub fn add_player(&mut self, name: &str) -> Result<PlayerId, ActionError> {
        let x = self.spawn_position().ok_or(ActionError::NoFreeSpawn)?;
        let id = next_player_id();
        let color = PALETTE[self.joins % PALETTE.len()];
        self.joins += 1;

        let player = Player::new(id, name, color, x, &self.config);
        info!(room_id = %self.key, player_id = %id, name = %player.name, x, "player joined");
        self.players.insert(id, player);
        self.empty_since = None;
        Ok(id)
    }

    /// Where the next player would spawn, if anywhere.
    ///
    /// Tries the slots first, rotating with the join count. When every
    /// slot is inside a blast, any point just past an explosion's reach,
    /// or either end of the ground, will do.
    pub fn spawn_position(&self) -> Option<f64> {
        let width = self.config.width;
        let extent = self.config.player_radius;
        let slots = (0..SPAWN_SLOTS)
            .map(|i| (self.joins + i) % SPAWN_SLOTS)
            .map(|slot| width * (slot as f64 + 0.5) / SPAWN_SLOTS as f64);
        let edges = self.hazards.explosions().iter().flat_map(|e| {
            let reach = e.radius + extent + SPAWN_CLEARANCE;
            [e.x - reach, e.x + reach]
        });

        slots
            .chain(edges)
            .chain([0.0, width])
            .filter(|x| (0.0..=width).contains(x))
            .find(|&x| !self.hazards.in_explosion(x, extent))
    }

    /// Queues input for the next tick.
    ///
    /// Movement is last-write-wins; placement requests are latched so a
    /// press between two ticks is never lost.
    ///
    /// # Errors
    /// [`ActionError::UnknownPlayer`] if the player is not in the room.
    pub fn queue_input(&mut self, player: PlayerId, input: InputCommand) -> Result<(), ActionError> {
        if !self.players.contains_key(&player) {
            return Err(ActionError::UnknownPlayer(player));
        }
        let slot = self.pending.entry(player).or_default();
        slot.movement = input.movement;
        slot.place_balloon |= input.place_balloon;
        slot.place_banana |= input.place_banana;
        Ok(())
    }

    /// Queues a player's removal for the start of the next tick. Their
    /// balloons and bananas stay and keep ticking.
    ///
    /// # Errors
    /// [`ActionError::UnknownPlayer`] if the player is not in the room.
    pub fn queue_removal(&mut self, player: PlayerId) -> Result<(), ActionError> {
        if !self.players.contains_key(&player) {
            return Err(ActionError::UnknownPlayer(player));
        }
        if !self.removals.contains(&player) {
            self.removals.push(player);
        }
        Ok(())
    }

    /// Places a power-up directly at `x`, outside the spawner's cadence.
    pub fn spawn_powerup_at(&mut self, kind: PowerupKind, x: f64) -> EntityId {
        let now = self.now();
        let id = self.ids.allocate();
        self.powerups.insert(Powerup {
            id,
            kind,
            x: x.clamp(0.0, self.config.width),
            created_at: now,
            expires_at: now + self.config.powerup_lifetime,
        });
        id
    }

    /// Runs one tick of `elapsed` server time.
    pub fn advance(&mut self, elapsed: Duration) {
        self.apply_removals();
        let now = self.clock.advance(elapsed);

        self.apply_inputs(now);

        for player in self.players.values_mut() {
            player.expire_boost(now);
            player.step(elapsed, now, &self.config);
        }

        let detonated = self.hazards.detonate_due(now, &self.config, &mut self.ids);
        let chained = self.hazards.schedule_chains(&self.config);
        if detonated + chained > 0 {
            debug!(room_id = %self.key, detonated, chained, now = secs(now), "hazards resolved");
        }

        self.hazards.resolve_hits(&mut self.players, now, &self.config);
        for owner in self.floaters.pop(self.hazards.explosions(), self.config.ground_y()) {
            if let Some(player) = self.players.get_mut(&owner) {
                player.add_score(POP_POINTS);
            }
        }

        self.hazards
            .trigger_bananas(&self.players, now, &self.config, &mut self.ids);
        self.hazards.expire(now);

        self.powerups.collect(&mut self.players, now, &self.config);
        self.powerups.expire(now);
        let players = &self.players;
        let hazards = &self.hazards;
        let config = &self.config;
        self.powerups.spawn_tick(elapsed, now, &mut self.rng, &mut self.ids, config, |x| {
            let extent = config.pickup_radius;
            !players.values().any(|p| (p.x - x).abs() <= config.player_radius + extent)
                && !hazards.near_balloon(x, config.balloon_radius + extent)
                && !hazards.in_explosion(x, extent)
        });

        self.floaters.advance(
            elapsed,
            self.players.len(),
            &mut self.rng,
            &mut self.ids,
            &self.config,
        );

        if self.players.is_empty() {
            self.empty_since.get_or_insert(now);
        } else {
            self.empty_since = None;
        }
    }

    fn apply_removals(&mut self) {
        for id in self.removals.drain(..) {
            self.pending.remove(&id);
            if let Some(player) = self.players.remove(&id) {
                info!(room_id = %self.key, player_id = %id, score = player.score, "player left");
            }
        }
    }

    fn apply_inputs(&mut self, now: Duration) {
        for (id, input) in std::mem::take(&mut self.pending) {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.intent = input.direction();

            if input.place_balloon {
                match self
                    .hazards
                    .place_balloon(player, now, &self.config, &mut self.ids)
                {
                    Ok(balloon) => debug!(room_id = %self.key, player_id = %id, %balloon, "balloon placed"),
                    Err(e) => debug!(room_id = %self.key, category = e.category(), "{e}"),
                }
            }
            if input.place_banana {
                match self
                    .hazards
                    .place_banana(player, now, &self.config, &mut self.ids)
                {
                    Ok(banana) => debug!(room_id = %self.key, player_id = %id, %banana, "banana placed"),
                    Err(e) => debug!(room_id = %self.key, category = e.category(), "{e}"),
                }
            }
        }
    }

    /// Whether the room has had no players for at least `threshold` of
    /// server time.
    pub fn is_idle(&self, threshold: Duration) -> bool {
        self.empty_since
            .is_some_and(|since| self.now().saturating_sub(since) >= threshold)
    }

    /// Read-only view of the current state. Has no side effects.
    pub fn snapshot(&self) -> Snapshot {
        let now = self.now();
        Snapshot {
            room_id: self.key.clone(),
            width: self.config.width,
            height: self.config.height,
            ground_y: self.config.ground_y(),
            server_time: secs(now),
            players: self
                .players
                .values()
                .map(|p| {
                    p.view(
                        now,
                        self.hazards.live_balloons(p.id),
                        self.hazards.has_live_banana(p.id),
                    )
                })
                .collect(),
            balloons: self.floaters.views(),
            placed_balloons: self.hazards.balloon_views(),
            bananas: self.hazards.banana_views(now),
            explosions: self.hazards.explosion_views(),
            powerups: self.powerups.views(),
        }
    }
}
