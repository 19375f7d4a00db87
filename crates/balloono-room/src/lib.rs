//! Room lifecycle for Balloono.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! [`balloono_sim::Room`]. Everything that touches the room (joins,
//! inputs, leaves, ticks) is a message on the actor's channel, so there
//! is exactly one writer per room and rooms never block each other.
//! Readers don't go through the actor at all: after every tick the
//! actor publishes an immutable snapshot on a `watch` channel.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: finds or creates rooms by key, ticks them all,
//!   tears down idle ones
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: idle threshold, channel size, gameplay constants

mod config;
mod error;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomRegistry;
pub use room::{RoomHandle, RoomInfo, TickOutcome};
