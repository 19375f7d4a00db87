//! Room configuration.

use std::time::Duration;

use balloono_sim::GameConfig;
use serde::{Deserialize, Serialize};

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// How long a room may stay empty (in server time) before the
    /// registry tears it down.
    pub idle_threshold: Duration,

    /// Capacity of each room actor's command channel. Senders wait when
    /// it is full.
    pub channel_size: usize,

    /// Gameplay constants for new rooms.
    pub game: GameConfig,

    /// Base seed for room randomness. `None` seeds every room from OS
    /// entropy; `Some` makes the n-th room created use `seed + n`.
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(60),
            channel_size: 64,
            game: GameConfig::default(),
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.idle_threshold, Duration::from_secs(60));
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.seed, None);
        assert_eq!(config.game, GameConfig::default());
    }
}
