//! Room registry: finds, creates, ticks, and tears down rooms by key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use balloono_protocol::RoomKey;
use futures_util::future::join_all;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle};

/// Counter for room generations, unique across the process.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Owns every live room, keyed by normalized [`RoomKey`].
///
/// This is the entry point for room operations from the server layer.
/// Rooms are independent: [`tick_handles`](Self::tick_handles) ticks
/// them concurrently and one room's failure never touches another.
pub struct RoomRegistry {
    rooms: HashMap<RoomKey, RoomHandle>,
    config: RoomConfig,
    /// Rooms created so far, used to derive per-room seeds.
    created: u64,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
            created: 0,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the room for `key`, creating it if it doesn't exist (or
    /// its actor has stopped). Keys are normalized first, so `"Lobby"`
    /// and `" lobby "` are the same room.
    pub fn get_or_create(&mut self, key: &str) -> RoomHandle {
        let key = RoomKey::new(key);
        if let Some(handle) = self.rooms.get(&key) {
            if !handle.is_closed() {
                return handle.clone();
            }
            tracing::debug!(room_id = %key, "room actor gone, recreating");
        }

        let handle = self.create_room(key.clone());
        self.rooms.insert(key, handle.clone());
        handle
    }

    fn create_room(&mut self, key: RoomKey) -> RoomHandle {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let seed = match self.config.seed {
            Some(base) => base.wrapping_add(self.created),
            None => rand::random(),
        };
        self.created += 1;

        let handle = spawn_room(
            key,
            generation,
            self.config.game.clone(),
            seed,
            self.config.idle_threshold,
            self.config.channel_size,
        );
        tracing::info!(room_id = %handle.key(), generation, seed, "room created");
        handle
    }

    /// Looks up an existing room without creating one.
    pub fn get(&self, key: &str) -> Option<RoomHandle> {
        self.rooms.get(&RoomKey::new(key)).cloned()
    }

    /// Advances every room by `elapsed`, concurrently, then drops the
    /// rooms that went idle (and any whose actor has stopped). Returns
    /// the keys of the rooms removed.
    ///
    /// Callers that share the registry behind a lock should use
    /// [`tick_handles`](Self::tick_handles) and [`retire`](Self::retire)
    /// instead, so the lock is free while rooms tick.
    pub async fn tick_all(&mut self, elapsed: Duration) -> Vec<RoomKey> {
        let handles = self.room_handles();
        let retiring = Self::tick_handles(&handles, elapsed).await;
        self.retire(&retiring)
    }

    /// Ticks the given rooms concurrently and returns the ones that
    /// stopped: idle rooms retire themselves after their tick, and a
    /// failed tick means the actor is already gone.
    pub async fn tick_handles(handles: &[RoomHandle], elapsed: Duration) -> Vec<RoomHandle> {
        let ticks = handles
            .iter()
            .map(|handle| async move { (handle, handle.tick(elapsed).await) });
        let outcomes = join_all(ticks).await;

        let mut retiring = Vec::new();
        for (handle, outcome) in outcomes {
            match outcome {
                Ok(outcome) if outcome.idle => {
                    tracing::info!(
                        room_id = %handle.key(),
                        generation = handle.generation(),
                        server_time = outcome.server_time.as_secs_f64(),
                        "room idle, tearing down"
                    );
                    retiring.push(handle.clone());
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(room_id = %handle.key(), error = %e, "room tick failed, removing");
                    retiring.push(handle.clone());
                }
            }
        }
        retiring
    }

    /// Removes stopped rooms from the registry. A key that already maps
    /// to a newer room (recreated while the old one was retiring) is
    /// left alone. Returns the keys actually removed.
    pub fn retire(&mut self, stopped: &[RoomHandle]) -> Vec<RoomKey> {
        let mut removed = Vec::new();
        for handle in stopped {
            let current = self
                .rooms
                .get(handle.key())
                .is_some_and(|live| live.generation() == handle.generation());
            if current {
                self.rooms.remove(handle.key());
                removed.push(handle.key().clone());
            } else {
                tracing::debug!(
                    room_id = %handle.key(),
                    generation = handle.generation(),
                    "retired room already replaced"
                );
            }
        }
        removed
    }

    /// Shuts down a room and removes it from the registry.
    pub async fn destroy_room(&mut self, key: &str) -> Result<(), RoomError> {
        let key = RoomKey::new(key);
        let handle = self
            .rooms
            .remove(&key)
            .ok_or_else(|| RoomError::NotFound(key.clone()))?;

        let _ = handle.shutdown().await;
        tracing::info!(room_id = %key, "room destroyed");
        Ok(())
    }

    /// Returns cloned handles to all live rooms, for async work done
    /// without holding the registry lock.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all live room keys.
    pub fn room_keys(&self) -> Vec<RoomKey> {
        self.rooms.keys().cloned().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
