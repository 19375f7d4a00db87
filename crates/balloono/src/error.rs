//! Unified error type for the Balloono server.

use balloono_protocol::ProtocolError;
use balloono_room::RoomError;
use balloono_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// Only the join and poll boundaries return errors: inputs and leaves
/// for unknown rooms or players are logged and dropped. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum BalloonoError {
    /// A malformed request body or an unencodable response.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (already joined, unknown player).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl BalloonoError {
    /// Whether this is a missing room, the one error callers usually
    /// turn into "join first".
    pub fn is_room_not_found(&self) -> bool {
        matches!(self, Self::Room(RoomError::NotFound(_)))
    }
}
