//! The session manager: tracks every joined player's presence.
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself; it uses a plain
//! `HashMap`. The server facade owns it behind a mutex, and every
//! operation here is synchronous and short.

use std::collections::HashMap;

use balloono_protocol::{PlayerId, RoomKey};
use tokio::time::Instant;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Registry of player sessions.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ touch() ... touch() ──→ remove()            (leave)
///                 │
///                 ▼ (silent > player_timeout)
///           expire_stale() ──→ cleanup_expired()           (timeout)
/// ```
pub struct SessionManager {
    sessions: HashMap<PlayerId, Session>,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Creates a session for a player who just joined `room`.
    ///
    /// An expired session for the same player is replaced.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyJoined`] if the player already has
    /// an active session.
    pub fn create(&mut self, player_id: PlayerId, room: RoomKey) -> Result<&Session, SessionError> {
        if let Some(existing) = self.sessions.get(&player_id) {
            if existing.state == SessionState::Active {
                return Err(SessionError::AlreadyJoined(player_id));
            }
        }

        tracing::info!(%player_id, room_id = %room, "session created");
        let session = Session {
            player_id,
            room,
            state: SessionState::Active,
            last_seen: Instant::now(),
        };
        Ok(self.sessions.entry(player_id).insert_entry(session).into_mut())
    }

    /// Records a request the player made against `room`, resetting
    /// their timeout.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if the player has no session
    /// - [`SessionError::SessionExpired`] if the timeout already elapsed
    /// - [`SessionError::WrongRoom`] if the player joined another room;
    ///   the session is left untouched
    pub fn touch(&mut self, player_id: PlayerId, room: &RoomKey) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;

        if session.state == SessionState::Expired {
            return Err(SessionError::SessionExpired(player_id));
        }
        check_room(session, room)?;
        session.last_seen = Instant::now();
        Ok(())
    }

    /// Removes a player's session (explicit leave from `room`).
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if the player has no session
    /// - [`SessionError::WrongRoom`] if the player joined another room;
    ///   the session is kept
    pub fn remove(&mut self, player_id: PlayerId, room: &RoomKey) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        check_room(session, room)?;

        let removed = self
            .sessions
            .remove(&player_id)
            .ok_or(SessionError::NotFound(player_id))?;
        tracing::info!(%player_id, room_id = %removed.room, "session removed");
        Ok(removed)
    }

    /// Expires every active session silent for longer than the timeout.
    ///
    /// Returns each expired player with their room, so the caller can
    /// remove them from it. Expired sessions stay in the map (rejecting
    /// touches) until [`cleanup_expired`](Self::cleanup_expired).
    pub fn expire_stale(&mut self) -> Vec<(PlayerId, RoomKey)> {
        let timeout = self.config.player_timeout;
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if session.state == SessionState::Active && session.idle_for() > timeout {
                session.state = SessionState::Expired;
                expired.push((session.player_id, session.room.clone()));
                tracing::info!(
                    player_id = %session.player_id,
                    room_id = %session.room,
                    "session expired (player timed out)"
                );
            }
        }

        expired
    }

    /// Removes all expired sessions, freeing memory.
    ///
    /// Separate from [`expire_stale`](Self::expire_stale) so that the
    /// caller can remove the players from their rooms first. The server
    /// runs it one driver step later, so requests in between are told
    /// the session expired rather than that it never existed.
    pub fn cleanup_expired(&mut self) {
        self.sessions
            .retain(|_, session| session.state != SessionState::Expired);
    }

    /// Looks up a session by player ID.
    pub fn get(&self, player_id: &PlayerId) -> Option<&Session> {
        self.sessions.get(player_id)
    }

    /// Returns the number of sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

fn check_room(session: &Session, room: &RoomKey) -> Result<(), SessionError> {
    if &session.room == room {
        Ok(())
    } else {
        Err(SessionError::WrongRoom {
            player_id: session.player_id,
            room: room.clone(),
        })
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
