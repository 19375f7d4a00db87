//! Wire protocol for Balloono.
//!
//! This crate defines everything that crosses the boundary between the
//! simulation core and the (external) HTTP layer:
//!
//! - **Identity** ([`PlayerId`], [`RoomKey`], [`EntityId`]): who and where.
//! - **Input** ([`InputCommand`]): what a client asks for each push.
//! - **Snapshots** ([`Snapshot`] and the per-entity views): the read-only
//!   picture a client renders.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those types are
//!   turned into bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about rooms or ticks. It only knows
//! the shapes of the data.
//!
//! ```text
//! HTTP layer (bytes) → Protocol (InputCommand / Snapshot) → Room actor
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BananaView, EntityId, ExplosionView, FloatingBalloonView, InputCommand,
    InputRequest, JoinRequest, JoinResponse, PlacedBalloonView, PlayerId,
    PlayerView, PowerupKind, PowerupView, RoomKey, Snapshot,
};
