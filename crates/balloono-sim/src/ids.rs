//! Identifier allocation.

use std::sync::atomic::{AtomicU64, Ordering};

use balloono_protocol::{EntityId, PlayerId};

/// Counter for player IDs. Unique across every room in the process.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh, process-unique player ID.
pub fn next_player_id() -> PlayerId {
    PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Per-room allocator for entity IDs. Never hands out the same ID twice.
#[derive(Debug, Clone)]
pub struct EntityIds {
    next: u64,
}

impl EntityIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

impl Default for EntityIds {
    fn default() -> Self {
        Self::new()
    }
}
