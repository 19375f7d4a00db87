//! # Balloono
//!
//! Authoritative server core for Balloono, a real-time multiplayer arena
//! game: players run along a 1-D ground, drop balloon bombs that chain
//! into each other, lay bananas for their opponents, and grab power-ups.
//!
//! Clients hold no connection. They join a room, then poll snapshots and
//! push inputs over independent short requests; a single fixed-cadence
//! driver advances every room with the measured elapsed time.
//! [`BalloonoServer`] ties the layers together:
//! rooms (`balloono-room`) → simulation (`balloono-sim`), with
//! presence (`balloono-session`) and the tick driver (`balloono-tick`)
//! alongside.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use balloono::prelude::*;
//!
//! # async fn demo() -> Result<(), BalloonoError> {
//! balloono::init_tracing();
//! let server = BalloonoServer::builder()
//!     .config(ServerConfig::from_env())
//!     .build();
//! tokio::spawn(std::sync::Arc::clone(&server).run());
//!
//! let joined = server.join("lobby", "alice").await?;
//! server
//!     .submit_input("lobby", joined.player_id, InputCommand { movement: 1.0, ..Default::default() })
//!     .await;
//! let snapshot = server.get_snapshot("lobby", joined.player_id).await?;
//! # let _ = snapshot;
//! # Ok(())
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::BalloonoError;
pub use server::{BalloonoServer, BalloonoServerBuilder, ServerConfig, TickSummary};

/// Everything needed to embed the server.
pub mod prelude {
    pub use crate::{BalloonoError, BalloonoServer, ServerConfig};
    pub use balloono_protocol::{
        InputCommand, InputRequest, JoinRequest, JoinResponse, PlayerId, RoomKey, Snapshot,
    };
    pub use balloono_room::RoomConfig;
    pub use balloono_session::{SessionConfig, SessionState};
    pub use balloono_sim::GameConfig;
    pub use balloono_tick::{TickConfig, TickPolicy};
}

/// Installs a `tracing` subscriber that honours `RUST_LOG` (default
/// `info`). Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .compact()
        .try_init();
}
