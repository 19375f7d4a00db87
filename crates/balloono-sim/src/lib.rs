//! Room simulation for Balloono.
//!
//! This crate is the authoritative game: a [`Room`] owns its players,
//! placed balloons, bananas, explosions, power-ups and floating target
//! balloons, and [`Room::advance`] moves all of it forward by a measured
//! elapsed time in a fixed order. [`Room::snapshot`] produces the
//! read-only [`Snapshot`](balloono_protocol::Snapshot) clients render.
//!
//! Everything here is synchronous and free of I/O. Given the same seed,
//! the same inputs, and the same sequence of elapsed times, a room
//! evolves identically. Concurrency (one writer per room, many readers)
//! is the room actor's job in `balloono-room`.
//!
//! # Key types
//!
//! - [`Room`]: one arena and its tick
//! - [`GameConfig`]: every gameplay constant
//! - [`Player`]: per-player state and movement
//! - [`Hazards`]: balloons, bananas, explosions and the chain work-list
//! - [`PowerupField`]: power-up spawning and pickup
//! - [`ActionError`]: why an input was dropped

mod clock;
mod config;
mod error;
mod floating;
mod hazard;
mod ids;
mod player;
mod powerup;
mod room;

pub use clock::{ServerClock, secs};
pub use config::GameConfig;
pub use error::ActionError;
pub use floating::{FloatingBalloon, FloatingField};
pub use hazard::{Balloon, Banana, Explosion, Hazards};
pub use ids::{EntityIds, next_player_id};
pub use player::{Player, apply_movement};
pub use powerup::{Powerup, PowerupField};
pub use room::Room;
