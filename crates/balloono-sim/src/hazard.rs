//! Balloons, bananas and explosions.
//!
//! Placed balloons wait in a work-list ordered by `(detonate_at, id)`.
//! Each tick pops the entries that are due and turns them into
//! explosions. Chain reactions never detonate a balloon on the spot:
//! an explosion only pulls a balloon's `detonate_at` earlier, to
//! `created_at + chain_delay`, and the balloon goes off when a later
//! tick pops it. Propagation is therefore ordered, visible, and bounded
//! by the number of balloons, whatever order the explosions are visited
//! in.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use balloono_protocol::{BananaView, EntityId, ExplosionView, PlacedBalloonView, PlayerId};
use tracing::{debug, warn};

use crate::{ActionError, EntityIds, GameConfig, Player, secs};

/// A placed balloon bomb. Its radius is frozen at placement.
#[derive(Debug, Clone)]
pub struct Balloon {
    pub id: EntityId,
    pub owner: PlayerId,
    pub x: f64,
    pub placed_at: Duration,
    pub fuse: Duration,
    pub radius: f64,
    /// Fuse expiry, or earlier once caught in a chain.
    pub detonate_at: Duration,
}

/// A one-shot hazard. Harmless to its owner; explodes (without
/// chaining) under anyone else once armed.
#[derive(Debug, Clone)]
pub struct Banana {
    pub id: EntityId,
    pub owner: PlayerId,
    pub x: f64,
    pub placed_at: Duration,
    pub radius: f64,
    pub arms_at: Duration,
    pub expires_at: Duration,
}

impl Banana {
    pub fn is_armed(&self, now: Duration) -> bool {
        now >= self.arms_at
    }
}

/// A transient blast.
#[derive(Debug, Clone)]
pub struct Explosion {
    pub id: EntityId,
    /// Player credited for hits, even after they leave.
    pub owner: PlayerId,
    pub x: f64,
    pub radius: f64,
    pub created_at: Duration,
    pub expires_at: Duration,
    /// Balloon blasts chain into other balloons; banana blasts don't.
    pub chains: bool,
    /// Victims already hit, so each scores at most once.
    pub hits: BTreeSet<PlayerId>,
}

impl Explosion {
    fn new(
        id: EntityId,
        owner: PlayerId,
        x: f64,
        radius: f64,
        created_at: Duration,
        chains: bool,
        config: &GameConfig,
    ) -> Self {
        Self {
            id,
            owner,
            x,
            radius,
            created_at,
            expires_at: created_at + config.explosion_decay,
            chains,
            hits: BTreeSet::new(),
        }
    }

    /// Whether something centred at `x` with half-width `extent` is
    /// inside the blast.
    pub fn covers(&self, x: f64, extent: f64) -> bool {
        (x - self.x).abs() <= self.radius + extent
    }

    pub(crate) fn view(&self) -> ExplosionView {
        ExplosionView {
            id: self.id,
            player_id: self.owner,
            x: self.x,
            radius: self.radius,
            created_at: secs(self.created_at),
            expires_at: secs(self.expires_at),
            chains: self.chains,
        }
    }
}

/// Owner of every balloon, banana and explosion in a room.
#[derive(Debug, Clone, Default)]
pub struct Hazards {
    balloons: BTreeMap<EntityId, Balloon>,
    /// Detonation work-list. Holds exactly one entry per live balloon.
    schedule: BTreeSet<(Duration, EntityId)>,
    bananas: Vec<Banana>,
    explosions: Vec<Explosion>,
}

impl Hazards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balloons(&self) -> impl Iterator<Item = &Balloon> {
        self.balloons.values()
    }

    pub fn bananas(&self) -> &[Banana] {
        &self.bananas
    }

    pub fn explosions(&self) -> &[Explosion] {
        &self.explosions
    }

    /// Undetonated balloons owned by `owner`.
    pub fn live_balloons(&self, owner: PlayerId) -> u32 {
        let count = self.balloons.values().filter(|b| b.owner == owner).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    pub fn has_live_banana(&self, owner: PlayerId) -> bool {
        self.bananas.iter().any(|b| b.owner == owner)
    }

    /// Whether `x` (with half-width `extent`) is inside any explosion.
    pub fn in_explosion(&self, x: f64, extent: f64) -> bool {
        self.explosions.iter().any(|e| e.covers(x, extent))
    }

    /// Whether `x` is within `distance` of any placed balloon.
    pub fn near_balloon(&self, x: f64, distance: f64) -> bool {
        self.balloons.values().any(|b| (b.x - x).abs() <= distance)
    }

    // -- Placement ---------------------------------------------------------

    /// Places a balloon at the player's position.
    ///
    /// # Errors
    /// [`ActionError::Cooldown`] if the player placed one too recently,
    /// [`ActionError::CapacityExceeded`] if all their slots are in use.
    /// Neither changes any state.
    pub fn place_balloon(
        &mut self,
        player: &mut Player,
        now: Duration,
        config: &GameConfig,
        ids: &mut EntityIds,
    ) -> Result<EntityId, ActionError> {
        if let Some(last) = player.last_balloon_at {
            if now < last + config.placement_cooldown {
                return Err(ActionError::Cooldown(player.id));
            }
        }
        if self.live_balloons(player.id) >= player.capacity {
            return Err(ActionError::CapacityExceeded {
                player: player.id,
                capacity: player.capacity,
            });
        }

        let id = ids.allocate();
        let balloon = Balloon {
            id,
            owner: player.id,
            x: player.x,
            placed_at: now,
            fuse: config.balloon_fuse,
            radius: player.blast_radius,
            detonate_at: now + config.balloon_fuse,
        };
        self.schedule.insert((balloon.detonate_at, id));
        self.balloons.insert(id, balloon);
        player.last_balloon_at = Some(now);
        Ok(id)
    }

    /// Places a banana at the player's position and starts its cooldown.
    ///
    /// # Errors
    /// [`ActionError::BananaNotReady`] during the cooldown,
    /// [`ActionError::BananaAlreadyLive`] while a previous one is out.
    pub fn place_banana(
        &mut self,
        player: &mut Player,
        now: Duration,
        config: &GameConfig,
        ids: &mut EntityIds,
    ) -> Result<EntityId, ActionError> {
        if now < player.banana_ready_until {
            return Err(ActionError::BananaNotReady(player.id));
        }
        if self.has_live_banana(player.id) {
            return Err(ActionError::BananaAlreadyLive(player.id));
        }

        let id = ids.allocate();
        self.bananas.push(Banana {
            id,
            owner: player.id,
            x: player.x,
            placed_at: now,
            radius: player.blast_radius,
            arms_at: now + config.banana_arming_delay,
            expires_at: now + config.banana_lifetime,
        });
        player.banana_ready_until = now + config.banana_cooldown;
        Ok(id)
    }

    // -- Tick steps --------------------------------------------------------

    /// Detonates every balloon due at or before `now`, in
    /// `(detonate_at, id)` order. Each becomes an explosion created at
    /// its scheduled time. Returns how many went off.
    pub fn detonate_due(&mut self, now: Duration, config: &GameConfig, ids: &mut EntityIds) -> usize {
        let mut count = 0;
        while let Some(&(at, balloon_id)) = self.schedule.first() {
            if at > now {
                break;
            }
            self.schedule.pop_first();
            let Some(balloon) = self.balloons.remove(&balloon_id) else {
                warn!(balloon = %balloon_id, "scheduled balloon missing");
                continue;
            };
            let explosion = Explosion::new(
                ids.allocate(),
                balloon.owner,
                balloon.x,
                balloon.radius,
                at,
                true,
                config,
            );
            debug!(
                balloon = %balloon_id,
                explosion = %explosion.id,
                owner = %balloon.owner,
                at = secs(at),
                "balloon detonated"
            );
            self.explosions.push(explosion);
            count += 1;
        }
        count
    }

    /// Pulls forward the detonation of every balloon overlapped by a
    /// chaining explosion. Nothing detonates here. Returns how many
    /// balloons were rescheduled.
    pub fn schedule_chains(&mut self, config: &GameConfig) -> usize {
        let mut count = 0;
        for explosion in self.explosions.iter().filter(|e| e.chains) {
            for balloon in self.balloons.values_mut() {
                if !explosion.covers(balloon.x, config.balloon_radius) {
                    continue;
                }
                let chain_at = (explosion.created_at + config.chain_delay).max(balloon.placed_at);
                if chain_at < balloon.detonate_at {
                    self.schedule.remove(&(balloon.detonate_at, balloon.id));
                    balloon.detonate_at = chain_at;
                    self.schedule.insert((chain_at, balloon.id));
                    count += 1;
                }
            }
        }
        count
    }

    /// Applies explosion damage: every player inside a blast is slowed,
    /// and the blast's owner scores once per distinct victim other than
    /// themselves.
    pub fn resolve_hits(
        &mut self,
        players: &mut BTreeMap<PlayerId, Player>,
        now: Duration,
        config: &GameConfig,
    ) {
        let mut awards: Vec<PlayerId> = Vec::new();
        for explosion in &mut self.explosions {
            for victim in players.values_mut() {
                if explosion.hits.contains(&victim.id)
                    || !explosion.covers(victim.x, config.player_radius)
                {
                    continue;
                }
                explosion.hits.insert(victim.id);
                victim.slow(now + config.hit_slow);
                debug!(explosion = %explosion.id, victim = %victim.id, owner = %explosion.owner, "player hit");
                if explosion.owner != victim.id {
                    awards.push(explosion.owner);
                }
            }
        }
        for owner in awards {
            if let Some(player) = players.get_mut(&owner) {
                player.add_score(config.points_per_hit);
            }
        }
    }

    /// Turns every armed banana under a non-owner into a non-chaining
    /// explosion. Returns how many were triggered.
    pub fn trigger_bananas(
        &mut self,
        players: &BTreeMap<PlayerId, Player>,
        now: Duration,
        config: &GameConfig,
        ids: &mut EntityIds,
    ) -> usize {
        let mut triggered = Vec::new();
        self.bananas.retain(|banana| {
            let stepped_on = banana.is_armed(now)
                && players.values().any(|p| {
                    p.id != banana.owner
                        && (p.x - banana.x).abs() <= config.banana_trigger_radius
                });
            if stepped_on {
                triggered.push(banana.clone());
            }
            !stepped_on
        });

        for banana in &triggered {
            let explosion = Explosion::new(
                ids.allocate(),
                banana.owner,
                banana.x,
                banana.radius,
                now,
                false,
                config,
            );
            debug!(banana = %banana.id, explosion = %explosion.id, "banana triggered");
            self.explosions.push(explosion);
        }
        triggered.len()
    }

    /// Removes explosions past their decay and bananas past their
    /// lifetime.
    pub fn expire(&mut self, now: Duration) {
        self.explosions.retain(|e| now < e.expires_at);
        self.bananas.retain(|b| now < b.expires_at);
    }

    // -- Views -------------------------------------------------------------

    pub(crate) fn balloon_views(&self) -> Vec<PlacedBalloonView> {
        self.balloons
            .values()
            .map(|b| PlacedBalloonView {
                id: b.id,
                player_id: b.owner,
                x: b.x,
                placed_at: secs(b.placed_at),
                fuse: secs(b.fuse),
                radius: b.radius,
                detonate_at: secs(b.detonate_at),
            })
            .collect()
    }

    pub(crate) fn banana_views(&self, now: Duration) -> Vec<BananaView> {
        self.bananas
            .iter()
            .map(|b| BananaView {
                id: b.id,
                player_id: b.owner,
                x: b.x,
                placed_at: secs(b.placed_at),
                armed: b.is_armed(now),
                expires_at: secs(b.expires_at),
            })
            .collect()
    }

    pub(crate) fn explosion_views(&self) -> Vec<ExplosionView> {
        self.explosions.iter().map(Explosion::view).collect()
    }
}
