//! Error types for the room layer.

use balloono_protocol::RoomKey;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this key.
    #[error("room {0} not found")]
    NotFound(RoomKey),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomKey),
}
