//! Gameplay configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Every gameplay constant of a room.
///
/// Distances are in world units (the default arena is 800 × 600),
/// durations are server time. Override fields with struct update
/// syntax:
///
/// ```rust
/// use std::time::Duration;
/// use balloono_sim::GameConfig;
///
/// let config = GameConfig {
///     balloon_fuse: Duration::from_secs(3),
///     ..GameConfig::default()
/// };
/// assert_eq!(config.default_capacity, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    // -- World --
    pub width: f64,
    pub height: f64,

    // -- Players --
    /// Base movement speed in units per second.
    pub player_speed: f64,
    /// Collision half-width of a player.
    pub player_radius: f64,
    /// Speed factor applied while a player is slowed.
    pub slow_factor: f64,
    /// How long an explosion hit slows its victim.
    pub hit_slow: Duration,
    pub default_capacity: u32,
    pub base_blast_radius: f64,

    // -- Balloons and explosions --
    pub balloon_fuse: Duration,
    /// Body radius of a placed balloon, used for chain overlap.
    pub balloon_radius: f64,
    /// Minimum gap between two balloon placements by the same player.
    pub placement_cooldown: Duration,
    pub explosion_decay: Duration,
    /// Delay between an explosion and the balloons it sets off.
    pub chain_delay: Duration,
    pub points_per_hit: u32,

    // -- Bananas --
    pub banana_arming_delay: Duration,
    pub banana_lifetime: Duration,
    pub banana_trigger_radius: f64,
    pub banana_cooldown: Duration,

    // -- Power-ups --
    pub powerup_interval: Duration,
    pub powerup_cap: usize,
    pub powerup_lifetime: Duration,
    pub pickup_radius: f64,
    pub speed_step: f64,
    pub max_speed_mult: f64,
    pub speed_boost_duration: Duration,
    pub blast_step: f64,
    pub slow_pickup_duration: Duration,

    // -- Floating target balloons --
    /// Spawns per second with an empty room.
    pub floating_spawn_base: f64,
    /// Extra spawns per second for each player.
    pub floating_spawn_per_player: f64,
    pub floating_min_speed: f64,
    pub floating_max_speed: f64,
    pub floating_radius: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,

            player_speed: 250.0,
            player_radius: 16.0,
            slow_factor: 0.45,
            hit_slow: Duration::from_secs(3),
            default_capacity: 1,
            base_blast_radius: 70.0,

            balloon_fuse: Duration::from_millis(2_400),
            balloon_radius: 18.0,
            placement_cooldown: Duration::from_millis(600),
            explosion_decay: Duration::from_millis(400),
            chain_delay: Duration::from_millis(150),
            points_per_hit: 1,

            banana_arming_delay: Duration::from_millis(500),
            banana_lifetime: Duration::from_secs(15),
            banana_trigger_radius: 22.0,
            banana_cooldown: Duration::from_secs(10),

            powerup_interval: Duration::from_secs(12),
            powerup_cap: 3,
            powerup_lifetime: Duration::from_secs(20),
            pickup_radius: 26.0,
            speed_step: 0.15,
            max_speed_mult: 2.0,
            speed_boost_duration: Duration::from_secs(10),
            blast_step: 12.0,
            slow_pickup_duration: Duration::from_secs(3),

            floating_spawn_base: 0.6,
            floating_spawn_per_player: 0.25,
            floating_min_speed: 40.0,
            floating_max_speed: 90.0,
            floating_radius: 18.0,
        }
    }
}

impl GameConfig {
    /// Fix values that would break the simulation's invariants.
    ///
    /// Rules:
    /// - world dimensions are finite and positive (else defaults)
    /// - `default_capacity` ≥ 1, `slow_factor` in `(0, 1]`
    /// - `max_speed_mult` ≥ 1, floating speed range ordered
    /// - radii and rates are non-negative
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if !(self.width.is_finite() && self.width > 0.0) {
            warn!(width = self.width, "invalid world width, using default");
            self.width = defaults.width;
        }
        if !(self.height.is_finite() && self.height > 0.0) {
            warn!(height = self.height, "invalid world height, using default");
            self.height = defaults.height;
        }
        if self.default_capacity == 0 {
            warn!("default_capacity must be at least 1");
            self.default_capacity = 1;
        }
        if !(self.slow_factor > 0.0 && self.slow_factor <= 1.0) {
            self.slow_factor = defaults.slow_factor;
        }
        if !(self.max_speed_mult >= 1.0) {
            self.max_speed_mult = 1.0;
        }
        if self.floating_min_speed > self.floating_max_speed {
            std::mem::swap(&mut self.floating_min_speed, &mut self.floating_max_speed);
        }
        for value in [
            &mut self.player_speed,
            &mut self.player_radius,
            &mut self.base_blast_radius,
            &mut self.balloon_radius,
            &mut self.banana_trigger_radius,
            &mut self.pickup_radius,
            &mut self.speed_step,
            &mut self.blast_step,
            &mut self.floating_spawn_base,
            &mut self.floating_spawn_per_player,
            &mut self.floating_min_speed,
            &mut self.floating_max_speed,
            &mut self.floating_radius,
        ] {
            if !(value.is_finite() && *value >= 0.0) {
                *value = 0.0;
            }
        }
        self
    }

    /// Vertical lane of ground entities (bombs, bananas, explosions).
    pub fn ground_y(&self) -> f64 {
        self.height - 45.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_balloono() {
        let config = GameConfig::default();
        assert_eq!(config.width, 800.0);
        assert_eq!(config.height, 600.0);
        assert_eq!(config.balloon_fuse, Duration::from_millis(2_400));
        assert_eq!(config.base_blast_radius, 70.0);
        assert_eq!(config.default_capacity, 1);
    }

    #[test]
    fn test_validated_repairs_broken_values() {
        let config = GameConfig {
            width: f64::NAN,
            default_capacity: 0,
            slow_factor: 0.0,
            max_speed_mult: 0.5,
            floating_min_speed: 90.0,
            floating_max_speed: 40.0,
            player_speed: -5.0,
            ..GameConfig::default()
        }
        .validated();

        assert_eq!(config.width, 800.0);
        assert_eq!(config.default_capacity, 1);
        assert_eq!(config.slow_factor, 0.45);
        assert_eq!(config.max_speed_mult, 1.0);
        assert_eq!(config.floating_min_speed, 40.0);
        assert_eq!(config.floating_max_speed, 90.0);
        assert_eq!(config.player_speed, 0.0);
    }

    #[test]
    fn test_validated_keeps_good_config() {
        let config = GameConfig::default();
        assert_eq!(config.clone().validated(), config);
    }
}
