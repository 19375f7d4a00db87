//! Session types: the server's record of a player between requests.

use std::time::Duration;

use balloono_protocol::{PlayerId, RoomKey};
use tokio::time::Instant;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a player may go without any request before their session
    /// expires and they are removed from their room.
    ///
    /// Default: 30 seconds.
    pub player_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            player_timeout: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a player's session.
///
/// ```text
///   Active ──(silent > timeout)──→ Expired ──(cleanup)──→ gone
///     ↑  │
///     └──┘ touch
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The player has been seen within the timeout.
    Active,

    /// The timeout elapsed. The player is being removed from their
    /// room and must join again.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A single player's session.
///
/// Created on join. Lives until the player leaves or times out.
#[derive(Debug, Clone)]
pub struct Session {
    pub player_id: PlayerId,

    /// The room the player joined.
    pub room: RoomKey,

    pub state: SessionState,

    /// Time of the player's latest request (Tokio clock, so it follows
    /// paused time in tests).
    pub last_seen: Instant,
}

impl Session {
    /// How long the player has been silent.
    pub fn idle_for(&self) -> Duration {
        self.last_seen.elapsed()
    }
}
