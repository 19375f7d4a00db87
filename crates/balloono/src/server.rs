//! `BalloonoServer` builder, request operations, and the driver loop.
//!
//! This is the entry point for running a Balloono server. It ties
//! together all the layers: sessions → rooms → simulation, plus the
//! tick driver that advances every room.

use std::sync::Arc;
use std::time::Duration;

use balloono_protocol::{InputCommand, JoinResponse, JsonCodec, PlayerId, RoomKey, Snapshot};
use balloono_room::{RoomConfig, RoomError, RoomRegistry};
use balloono_session::{SessionConfig, SessionManager, SessionState};
use balloono_tick::{TickConfig, TickScheduler};
use tokio::sync::Mutex;

use crate::BalloonoError;

/// Lookups per join, so a room retiring mid-join is replaced.
const JOIN_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

/// Every setting of a server.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub tick: TickConfig,
    pub room: RoomConfig,
    pub session: SessionConfig,
}

impl ServerConfig {
    /// Defaults overridden by environment variables:
    ///
    /// | Variable                       | Field                     |
    /// |--------------------------------|---------------------------|
    /// | `BALLOONO_TICK_HZ`             | `tick.tick_rate_hz`       |
    /// | `BALLOONO_ROOM_IDLE_SECS`      | `room.idle_threshold`     |
    /// | `BALLOONO_PLAYER_TIMEOUT_SECS` | `session.player_timeout`  |
    /// | `BALLOONO_SEED`                | `room.seed`               |
    ///
    /// Unset or unparsable variables keep the default.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides looked up by variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parse(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
            let raw = lookup(name)?;
            match raw.trim().parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(variable = name, value = %raw, "ignoring unparsable setting");
                    None
                }
            }
        }

        if let Some(hz) = parse(&lookup, "BALLOONO_TICK_HZ") {
            self.tick.tick_rate_hz = u32::try_from(hz).unwrap_or(u32::MAX);
        }
        if let Some(secs) = parse(&lookup, "BALLOONO_ROOM_IDLE_SECS") {
            self.room.idle_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = parse(&lookup, "BALLOONO_PLAYER_TIMEOUT_SECS") {
            self.session.player_timeout = Duration::from_secs(secs);
        }
        if let Some(seed) = parse(&lookup, "BALLOONO_SEED") {
            self.room.seed = Some(seed);
        }
        self.tick = self.tick.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a Balloono server.
///
/// # Example
///
/// ```rust
/// use balloono::prelude::*;
///
/// let server = BalloonoServer::builder()
///     .tick_rate(30)
///     .seed(42)
///     .build();
/// # let _ = server;
/// ```
pub struct BalloonoServerBuilder {
    config: ServerConfig,
}

impl BalloonoServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the driver tick rate. 0 disables the automatic loop.
    pub fn tick_rate(mut self, hz: u32) -> Self {
        self.config.tick.tick_rate_hz = hz;
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.room = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Seeds room randomness for reproducible games.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.room.seed = Some(seed);
        self
    }

    /// Builds the server. Nothing runs until [`BalloonoServer::run`] is
    /// spawned (or [`BalloonoServer::tick`] is called by hand).
    pub fn build(self) -> Arc<BalloonoServer> {
        let ServerConfig {
            tick,
            room,
            session,
        } = self.config;

        Arc::new(BalloonoServer {
            rooms: Mutex::new(RoomRegistry::new(room)),
            sessions: Mutex::new(SessionManager::new(session)),
            tick_config: tick.validated(),
            codec: JsonCodec,
        })
    }
}

impl Default for BalloonoServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// What one driver step did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Players removed for going silent.
    pub players_expired: Vec<PlayerId>,
    /// Rooms torn down for being idle.
    pub rooms_removed: Vec<RoomKey>,
}

/// A Balloono game server.
///
/// Shared as `Arc<BalloonoServer>` between request handlers and the
/// driver loop. The two locks are never held at the same time.
pub struct BalloonoServer {
    pub(crate) rooms: Mutex<RoomRegistry>,
    pub(crate) sessions: Mutex<SessionManager>,
    tick_config: TickConfig,
    pub(crate) codec: JsonCodec,
}

impl BalloonoServer {
    /// Creates a new builder.
    pub fn builder() -> BalloonoServerBuilder {
        BalloonoServerBuilder::new()
    }

    /// Joins `room` (created on demand) as a new player named `name`.
    ///
    /// The returned snapshot already contains the new player. While
    /// explosions cover the whole ground the join waits for the next
    /// tick that frees a spawn point.
    pub async fn join(&self, room: &str, name: &str) -> Result<JoinResponse, BalloonoError> {
        let mut attempt = 1;
        let (handle, player_id, snapshot) = loop {
            let handle = self.rooms.lock().await.get_or_create(room);
            let joined = handle.join(name).await;
            match joined {
                Ok((player_id, snapshot)) => break (handle, player_id, snapshot),
                // The room retired between lookup and join; the next
                // lookup creates a fresh one.
                Err(RoomError::Unavailable(key)) if attempt < JOIN_ATTEMPTS => {
                    tracing::debug!(room_id = %key, attempt, "room retired during join, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        };
        let room_id = handle.key().clone();

        self.sessions
            .lock()
            .await
            .create(player_id, room_id.clone())?;

        tracing::info!(%room_id, %player_id, "player joined via server");
        Ok(JoinResponse {
            player_id,
            room_id,
            state: Snapshot::clone(&snapshot),
        })
    }

    /// Queues input for the player's next tick.
    ///
    /// Never fails: input for an unknown room or player, for a room the
    /// player never joined, or from a timed-out session, is logged and
    /// dropped.
    pub async fn submit_input(&self, room: &str, player_id: PlayerId, input: InputCommand) {
        let key = RoomKey::new(room);
        if let Err(e) = self.sessions.lock().await.touch(player_id, &key) {
            tracing::debug!(%player_id, error = %e, "input without a live session dropped");
            return;
        }

        let Some(handle) = self.rooms.lock().await.get(key.as_str()) else {
            tracing::debug!(room_id = %key, %player_id, "input for unknown room dropped");
            return;
        };
        if let Err(e) = handle.submit_input(player_id, input).await {
            tracing::debug!(%player_id, error = %e, "input dropped");
        }
    }

    /// The latest published snapshot of `room`.
    ///
    /// Counts as activity for `player_id` only if `room` is the room
    /// they joined. Never waits on a tick.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if the room doesn't exist (never joined,
    /// or torn down while idle).
    pub async fn get_snapshot(
        &self,
        room: &str,
        player_id: PlayerId,
    ) -> Result<Arc<Snapshot>, BalloonoError> {
        let key = RoomKey::new(room);
        if let Err(e) = self.sessions.lock().await.touch(player_id, &key) {
            tracing::trace!(%player_id, error = %e, "snapshot poll without a live session");
        }

        let handle = self
            .rooms
            .lock()
            .await
            .get(key.as_str())
            .ok_or(RoomError::NotFound(key))?;
        Ok(handle.snapshot())
    }

    /// Removes the player from `room` at the next tick.
    ///
    /// Ignored unless `room` is the room the player joined: a stray
    /// leave neither ends the session nor touches another room.
    pub async fn leave(&self, room: &str, player_id: PlayerId) {
        let key = RoomKey::new(room);
        let session = match self.sessions.lock().await.remove(player_id, &key) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(room_id = %key, %player_id, error = %e, "leave ignored");
                return;
            }
        };

        let Some(handle) = self.rooms.lock().await.get(session.room.as_str()) else {
            tracing::debug!(room_id = %session.room, %player_id, "leave for retired room ignored");
            return;
        };
        if let Err(e) = handle.leave(player_id).await {
            tracing::debug!(%player_id, error = %e, "leave dropped");
        }
    }

    /// One driver step: removes timed-out players, advances every room
    /// by `elapsed`, and tears down idle rooms.
    ///
    /// Rooms tick from cloned handles. The registry lock is only taken
    /// to copy the handles and to record retirements, so requests keep
    /// flowing while a room is slow.
    pub async fn tick(&self, elapsed: Duration) -> TickSummary {
        // Sessions that expired last step are dropped now, so touches in
        // between see `SessionExpired`.
        let expired = {
            let mut sessions = self.sessions.lock().await;
            sessions.cleanup_expired();
            sessions.expire_stale()
        };

        let handles = self.rooms.lock().await.room_handles();
        for (player_id, room_id) in &expired {
            let Some(handle) = handles.iter().find(|h| h.key() == room_id) else {
                continue;
            };
            if let Err(e) = handle.leave(*player_id).await {
                tracing::debug!(%player_id, error = %e, "timeout leave dropped");
            }
        }

        let stopped = RoomRegistry::tick_handles(&handles, elapsed).await;
        let rooms_removed = self.rooms.lock().await.retire(&stopped);

        TickSummary {
            players_expired: expired.into_iter().map(|(id, _)| id).collect(),
            rooms_removed,
        }
    }

    /// The state of the player's session, if they have one.
    pub async fn session_state(&self, player_id: PlayerId) -> Option<SessionState> {
        self.sessions.lock().await.get(&player_id).map(|s| s.state)
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.room_count()
    }

    /// Runs the driver loop forever at the configured tick rate,
    /// advancing rooms by the measured time since the previous tick.
    ///
    /// With a tick rate of 0 this never ticks; drive the server with
    /// [`tick`](Self::tick) instead.
    pub async fn run(self: Arc<Self>) {
        let mut scheduler = TickScheduler::new(self.tick_config.clone());
        tracing::info!(tick_rate_hz = scheduler.tick_rate_hz(), "Balloono server running");

        loop {
            let info = scheduler.wait_for_tick().await;
            let summary = self.tick(info.elapsed).await;
            scheduler.finish_tick();

            if !summary.players_expired.is_empty() || !summary.rooms_removed.is_empty() {
                tracing::info!(
                    tick = info.tick,
                    players_expired = summary.players_expired.len(),
                    rooms_removed = summary.rooms_removed.len(),
                    "driver housekeeping"
                );
            }
        }
    }
}
