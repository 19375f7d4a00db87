//! Player presence for Balloono.
//!
//! Clients never hold a connection open: they poll snapshots and push
//! inputs over short-lived requests. This crate is how the server tells
//! a player who stopped polling from one who is merely between polls.
//!
//! 1. **Session tracking**: which player is in which room
//!    ([`SessionManager`])
//! 2. **Presence**: every request touches the session's last-seen time
//! 3. **Timeouts**: players silent for longer than
//!    [`SessionConfig::player_timeout`] expire and are removed from
//!    their room by the driver loop
//!
//! # How it fits in the stack
//!
//! ```text
//! Server facade (above)  ← touches sessions, removes expired players
//!     ↕
//! Session layer (this crate)  ← player → room, last seen
//!     ↕
//! Protocol layer (below)  ← PlayerId, RoomKey
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
