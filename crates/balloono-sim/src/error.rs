//! Why a player's action was dropped.

use balloono_protocol::PlayerId;

/// A rejected action.
///
/// None of these are faults. An unknown player is stale input
/// (`InvalidInput`); everything else is a normal gameplay outcome
/// (`CapacityExceeded`). The room logs them at debug level and carries
/// on; they are never returned across the server boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The player is not (or no longer) in this room.
    #[error("player {0} is not in this room")]
    UnknownPlayer(PlayerId),

    /// All of the player's balloon slots are in use.
    #[error("player {player} already has {capacity} live balloons")]
    CapacityExceeded { player: PlayerId, capacity: u32 },

    /// The player placed a balloon too recently.
    #[error("player {0} is still on placement cooldown")]
    Cooldown(PlayerId),

    /// The player's banana is still recharging.
    #[error("player {0} has no banana ready")]
    BananaNotReady(PlayerId),

    /// The player's previous banana is still on the field.
    #[error("player {0} already has a banana on the field")]
    BananaAlreadyLive(PlayerId),

    /// Explosions cover every point a new player could stand on.
    #[error("no explosion-free spawn point")]
    NoFreeSpawn,
}

impl ActionError {
    /// Coarse category for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownPlayer(_) => "invalid_input",
            _ => "capacity_exceeded",
        }
    }
}
