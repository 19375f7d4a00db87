//! Room actor: an isolated Tokio task that owns one simulation.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. The actor is the room's only writer, so a
//! tick can never interleave with an input or a leave. Snapshots flow
//! the other way through a `watch` channel, published at tick
//! boundaries only.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use balloono_protocol::{InputCommand, PlayerId, RoomKey, Snapshot};
use balloono_sim::{ActionError, GameConfig, Room};
use tokio::sync::{mpsc, oneshot, watch};

use crate::RoomError;

/// Commands sent to a room actor through its channel.
///
/// Variants with a `oneshot::Sender` expect a reply; the rest are
/// fire-and-forget and take effect at the next tick.
pub(crate) enum RoomCommand {
    /// Add a player. Replies with their id and a snapshot that already
    /// contains them. Held over to a later tick while explosions cover
    /// the whole ground.
    Join {
        name: String,
        reply: oneshot::Sender<(PlayerId, Arc<Snapshot>)>,
    },

    /// Queue input for the next tick.
    Input {
        player_id: PlayerId,
        input: InputCommand,
    },

    /// Queue a player's removal for the next tick.
    Leave { player_id: PlayerId },

    /// Advance the simulation. An idle room stops after replying.
    Tick {
        elapsed: Duration,
        reply: oneshot::Sender<TickOutcome>,
    },

    /// Request room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// What a tick left behind, as reported to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub player_count: usize,
    pub server_time: Duration,
    /// Empty for at least the idle threshold. The actor has stopped.
    pub idle: bool,
}

/// Room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_key: RoomKey,
    /// Distinguishes successive rooms created under the same key.
    pub generation: u64,
    pub player_count: usize,
    pub server_time: Duration,
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a `watch::Receiver`. The
/// registry holds one of these per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    key: RoomKey,
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
}

impl RoomHandle {
    /// Returns the room's key.
    pub fn key(&self) -> &RoomKey {
        &self.key
    }

    /// Returns the room's generation, unique per process.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.key.clone())
    }

    /// Adds a player and waits for their id and first snapshot.
    pub async fn join(&self, name: &str) -> Result<(PlayerId, Arc<Snapshot>), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                name: name.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Queues input for the player's next tick (fire-and-forget).
    pub async fn submit_input(
        &self,
        player_id: PlayerId,
        input: InputCommand,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Input { player_id, input })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Queues the player's removal (fire-and-forget).
    pub async fn leave(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { player_id })
            .await
            .map_err(|_| self.unavailable())
    }

    /// Advances the room by `elapsed` and waits for the outcome.
    pub async fn tick(&self, elapsed: Duration) -> Result<TickOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Tick {
                elapsed,
                reply: reply_tx,
            })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    /// The snapshot published at the end of the latest tick (or join).
    ///
    /// Never waits on the actor. Still returns the final snapshot after
    /// the room shut down.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.snapshots.borrow())
    }

    /// A receiver notified every time a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }
}

type JoinReply = oneshot::Sender<(PlayerId, Arc<Snapshot>)>;

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    generation: u64,
    idle_threshold: Duration,
    /// Joins waiting for a spawn point, oldest first.
    waiting: VecDeque<(String, JoinReply)>,
    receiver: mpsc::Receiver<RoomCommand>,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown.
    async fn run(mut self) {
        let room_id = self.room.key().clone();
        tracing::info!(%room_id, generation = self.generation, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { name, reply } => {
                    if !self.waiting.is_empty() {
                        self.waiting.push_back((name, reply));
                        continue;
                    }
                    match self.room.add_player(&name) {
                        Ok(player_id) => {
                            let snapshot = self.publish();
                            let _ = reply.send((player_id, snapshot));
                        }
                        Err(e) => {
                            tracing::debug!(%room_id, category = e.category(), "join deferred: {e}");
                            self.waiting.push_back((name, reply));
                        }
                    }
                }
                RoomCommand::Input { player_id, input } => {
                    if let Err(e) = self.room.queue_input(player_id, input) {
                        tracing::debug!(%room_id, category = e.category(), "input dropped: {e}");
                    }
                }
                RoomCommand::Leave { player_id } => {
                    if let Err(e) = self.room.queue_removal(player_id) {
                        tracing::debug!(%room_id, category = e.category(), "leave ignored: {e}");
                    }
                }
                RoomCommand::Tick { elapsed, reply } => {
                    self.room.advance(elapsed);
                    let admitted = self.admit_waiting();
                    let snapshot = self.publish();
                    for (player_id, reply) in admitted {
                        let _ = reply.send((player_id, Arc::clone(&snapshot)));
                    }

                    let idle = self.waiting.is_empty() && self.room.is_idle(self.idle_threshold);
                    let _ = reply.send(TickOutcome {
                        player_count: self.room.player_count(),
                        server_time: self.room.now(),
                        idle,
                    });
                    if idle {
                        tracing::info!(
                            %room_id,
                            server_time = self.room.now().as_secs_f64(),
                            "room idle, retiring"
                        );
                        break;
                    }
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    /// Places held-over joiners, in arrival order, while spawn points
    /// last. Replies go out once the tick's snapshot is published.
    fn admit_waiting(&mut self) -> Vec<(PlayerId, JoinReply)> {
        let mut admitted = Vec::new();
        while let Some((name, reply)) = self.waiting.pop_front() {
            if reply.is_closed() {
                continue;
            }
            match self.room.add_player(&name) {
                Ok(player_id) => admitted.push((player_id, reply)),
                Err(ActionError::NoFreeSpawn) => {
                    self.waiting.push_front((name, reply));
                    break;
                }
                Err(e) => tracing::warn!(room_id = %self.room.key(), "join dropped: {e}"),
            }
        }
        admitted
    }

    fn publish(&self) -> Arc<Snapshot> {
        let snapshot = Arc::new(self.room.snapshot());
        self.snapshots.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_key: self.room.key().clone(),
            generation: self.generation,
            player_count: self.room.player_count(),
            server_time: self.room.now(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with it.
///
/// `channel_size` controls backpressure: if the channel fills up,
/// senders wait (bounded channel).
pub(crate) fn spawn_room(
    key: RoomKey,
    generation: u64,
    game: GameConfig,
    seed: u64,
    idle_threshold: Duration,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size.max(1));
    let room = Room::new(key.clone(), game, seed);
    let (snap_tx, snap_rx) = watch::channel(Arc::new(room.snapshot()));

    let actor = RoomActor {
        room,
        generation,
        idle_threshold,
        waiting: VecDeque::new(),
        receiver: rx,
        snapshots: snap_tx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        key,
        generation,
        sender: tx,
        snapshots: snap_rx,
    }
}
