//! Core protocol types: identities, input, and snapshots.
//!
//! Everything here is plain data with serde derives. Times are `f64`
//! seconds of *room server time*, the clock the simulation runs on,
//! so clients can compute "fuse remaining" or "slowed for" without
//! synchronizing clocks with the server.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, unique for the life of the process.
///
/// Newtype wrapper so a `PlayerId` can't be confused with an
/// [`EntityId`]. Serialized as the bare number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Identifier of an entity inside one room (balloon, banana, explosion,
/// power-up, floating balloon). Unique within its room.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E-{}", self.0)
    }
}

/// A room key chosen by players, e.g. `"lobby"`.
///
/// Keys are case-insensitive: construction trims whitespace, lowercases,
/// and truncates to [`RoomKey::MAX_LEN`] characters. An empty key becomes
/// [`RoomKey::DEFAULT`]. Deserialization goes through the same
/// normalization, so `"  LOBBY "` on the wire and `"lobby"` address the
/// same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomKey(String);

impl RoomKey {
    /// Longest key kept; anything beyond is cut off.
    pub const MAX_LEN: usize = 32;

    /// Key used when a client sends an empty one.
    pub const DEFAULT: &'static str = "lobby";

    /// Normalizes `raw` into a room key.
    pub fn new(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .chars()
            .flat_map(char::to_lowercase)
            .take(Self::MAX_LEN)
            .collect();
        if key.is_empty() {
            Self(Self::DEFAULT.to_string())
        } else {
            Self(key)
        }
    }

    /// The normalized key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomKey {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<&str> for RoomKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One input push from a client.
///
/// Clients send these roughly every 120ms. Missing fields default to
/// "no movement, no placement". `move` is accepted as any JSON number and
/// sanitized by [`InputCommand::direction`]: the simulation never sees an
/// out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputCommand {
    /// Raw movement intent as sent by the client. Expected -1, 0 or 1.
    #[serde(rename = "move", default)]
    pub movement: f64,
    /// Request to place a balloon at the player's position.
    #[serde(default)]
    pub place_balloon: bool,
    /// Request to place a banana at the player's position.
    #[serde(default)]
    pub place_banana: bool,
}

impl InputCommand {
    /// Movement intent clamped to -1, 0 or +1.
    ///
    /// Non-finite values (NaN, infinities) count as "stand still".
    pub fn direction(&self) -> i8 {
        if !self.movement.is_finite() {
            return 0;
        }
        // Bounded to [-1.0, 1.0] before the cast, so it can't truncate.
        self.movement.clamp(-1.0, 1.0).round() as i8
    }
}

/// Body of an input push: which room, which player, what input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRequest {
    pub room_id: RoomKey,
    pub player_id: PlayerId,
    #[serde(flatten)]
    pub input: InputCommand,
}

/// Body of a join request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Room to join; created on demand. Defaults to `"lobby"`.
    #[serde(default)]
    pub room: Option<String>,
    /// Display name, normally supplied by the auth layer.
    #[serde(default)]
    pub name: Option<String>,
}

/// Response to a successful join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub player_id: PlayerId,
    pub room_id: RoomKey,
    /// Snapshot taken right after the player was added.
    pub state: Snapshot,
}

// ---------------------------------------------------------------------------
// Power-ups
// ---------------------------------------------------------------------------

/// The four kinds of power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerupKind {
    /// Temporary movement speed boost for the picker.
    Speed,
    /// One more simultaneous balloon for the picker, for the session.
    Capacity,
    /// Bigger blast radius for balloons placed after pickup.
    #[serde(rename = "strength", alias = "blast")]
    Blast,
    /// Slows every *other* player in the room.
    Slow,
}

impl PowerupKind {
    /// All kinds, in a fixed order (used for uniform random choice).
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::Speed,
        PowerupKind::Capacity,
        PowerupKind::Blast,
        PowerupKind::Slow,
    ];
}

impl fmt::Display for PowerupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speed => write!(f, "speed"),
            Self::Capacity => write!(f, "capacity"),
            Self::Blast => write!(f, "strength"),
            Self::Slow => write!(f, "slow"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// A player as the client sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub x: f64,
    pub score: u32,
    /// Current movement intent (-1, 0, +1).
    pub moving: i8,
    pub speed_mult: f64,
    pub balloon_capacity: u32,
    pub blast_radius: f64,
    pub live_balloons: u32,
    pub slow_until: f64,
    pub slowed: bool,
    /// `true` when a banana could be placed right now.
    pub banana_ready: bool,
    pub banana_ready_until: f64,
    /// `true` while one of this player's bananas is on the field.
    pub has_banana: bool,
}

/// An ambient balloon drifting upwards, popped by explosions for points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingBalloonView {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

/// A balloon bomb placed by a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBalloonView {
    pub id: EntityId,
    pub player_id: PlayerId,
    pub x: f64,
    pub placed_at: f64,
    pub fuse: f64,
    pub radius: f64,
    /// When it will go off: fuse expiry, or earlier if caught in a chain.
    pub detonate_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BananaView {
    pub id: EntityId,
    pub player_id: PlayerId,
    pub x: f64,
    pub placed_at: f64,
    pub armed: bool,
    pub expires_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplosionView {
    pub id: EntityId,
    pub player_id: PlayerId,
    pub x: f64,
    pub radius: f64,
    pub created_at: f64,
    pub expires_at: f64,
    /// `false` for banana blasts, which never set off other balloons.
    pub chains: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PowerupView {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: PowerupKind,
    pub x: f64,
    pub created_at: f64,
    pub expires_at: f64,
}

/// An immutable, point-in-time view of a whole room.
///
/// Every list is in a deterministic order (players by id, entities by
/// creation), so two snapshots of an unchanged room compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub room_id: RoomKey,
    pub width: f64,
    pub height: f64,
    /// Vertical lane the ground entities (players, bombs, bananas,
    /// explosions, power-ups) are drawn on.
    pub ground_y: f64,
    /// Room server time in seconds.
    pub server_time: f64,
    pub players: Vec<PlayerView>,
    pub balloons: Vec<FloatingBalloonView>,
    pub placed_balloons: Vec<PlacedBalloonView>,
    pub bananas: Vec<BananaView>,
    pub explosions: Vec<ExplosionView>,
    pub powerups: Vec<PowerupView>,
}

impl Snapshot {
    /// Looks up one player's view.
    pub fn player(&self, id: PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_key_is_case_insensitive() {
        assert_eq!(RoomKey::new("  LoBBy "), RoomKey::new("lobby"));
        assert_eq!(RoomKey::new("Arena").as_str(), "arena");
    }

    #[test]
    fn test_room_key_empty_defaults_to_lobby() {
        assert_eq!(RoomKey::new("   ").as_str(), RoomKey::DEFAULT);
    }

    #[test]
    fn test_room_key_truncates() {
        let long = "x".repeat(100);
        assert_eq!(RoomKey::new(&long).as_str().len(), RoomKey::MAX_LEN);
    }

    #[test]
    fn test_room_key_deserialize_normalizes() {
        let key: RoomKey = serde_json::from_str("\"ARENA\"").unwrap();
        assert_eq!(key.as_str(), "arena");
    }

    #[test]
    fn test_direction_clamps_out_of_range() {
        let dir = |m: f64| InputCommand { movement: m, ..Default::default() }.direction();
        assert_eq!(dir(-1.0), -1);
        assert_eq!(dir(0.0), 0);
        assert_eq!(dir(1.0), 1);
        assert_eq!(dir(42.0), 1);
        assert_eq!(dir(-7.5), -1);
        assert_eq!(dir(0.2), 0);
        assert_eq!(dir(f64::NAN), 0);
        assert_eq!(dir(f64::INFINITY), 0);
    }

    #[test]
    fn test_input_defaults_when_fields_missing() {
        let input: InputCommand = serde_json::from_str("{}").unwrap();
        assert_eq!(input, InputCommand::default());
    }

    #[test]
    fn test_powerup_kind_wire_names() {
        assert_eq!(serde_json::to_string(&PowerupKind::Blast).unwrap(), "\"strength\"");
        assert_eq!(serde_json::to_string(&PowerupKind::Slow).unwrap(), "\"slow\"");
        let kind: PowerupKind = serde_json::from_str("\"blast\"").unwrap();
        assert_eq!(kind, PowerupKind::Blast);
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(PlayerId(4).to_string(), "P-4");
        assert_eq!(EntityId(9).to_string(), "E-9");
    }
}
