//! Error types for the session layer.

use balloono_protocol::{PlayerId, RoomKey};

/// Errors that can occur during session management.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given player. They never joined, left,
    /// or their expired session was already cleaned up.
    #[error("session not found for player {0}")]
    NotFound(PlayerId),

    /// The player already has an active session.
    #[error("player {0} already has an active session")]
    AlreadyJoined(PlayerId),

    /// The player was silent for longer than the timeout.
    #[error("session expired for player {0}")]
    SessionExpired(PlayerId),

    /// The request named a room other than the one the player joined.
    #[error("player {player_id} is not in room {room}")]
    WrongRoom { player_id: PlayerId, room: RoomKey },
}
