//! Owner/region definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ChunkPos;

/// A request to keep the chunks around `center` loaded.
///
/// This is the persisted form. The ticket manager turns it into a live ticket
/// on every startup; only `radius` changes after creation, by registering the
/// same id again.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkLoader {
    /// Owner identity, one ticket per id.
    pub id: Uuid,
    /// World name, matched case-insensitively.
    pub world: String,
    /// Center chunk.
    pub center: ChunkPos,
    /// Square radius in chunks; 0 covers the center alone.
    pub radius: u32,
}

impl ChunkLoader {
    /// Create a loader with a fresh random id.
    pub fn new(world: impl Into<String>, center: ChunkPos, radius: u32) -> Self {
        Self::with_id(Uuid::new_v4(), world, center, radius)
    }

    pub fn with_id(id: Uuid, world: impl Into<String>, center: ChunkPos, radius: u32) -> Self {
        Self {
            id,
            world: world.into(),
            center,
            radius,
        }
    }

    /// Same loader with a different radius.
    #[must_use]
    pub fn with_radius(&self, radius: u32) -> Self {
        Self {
            radius,
            ..self.clone()
        }
    }

    /// Whether `pos` falls inside the square covered by this loader.
    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.center.chebyshev(pos) <= self.radius
    }

    /// Number of chunks the full square spans, ignoring missing chunks.
    pub fn area(&self) -> u64 {
        let side = u64::from(self.radius) * 2 + 1;
        side * side
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive_square() {
        let loader = ChunkLoader::new("overworld", ChunkPos::new(10, -4), 2);
        assert!(loader.contains(ChunkPos::new(10, -4)));
        assert!(loader.contains(ChunkPos::new(12, -2)));
        assert!(loader.contains(ChunkPos::new(8, -6)));
        assert!(!loader.contains(ChunkPos::new(13, -4)));
        assert!(!loader.contains(ChunkPos::new(10, -7)));
    }

    #[test]
    fn radius_zero_covers_center_only() {
        let loader = ChunkLoader::new("nether", ChunkPos::new(0, 0), 0);
        assert_eq!(loader.area(), 1);
        assert!(loader.contains(ChunkPos::new(0, 0)));
        assert!(!loader.contains(ChunkPos::new(0, 1)));
    }

    #[test]
    fn with_radius_keeps_identity() {
        let loader = ChunkLoader::new("overworld", ChunkPos::new(1, 1), 1);
        let wider = loader.with_radius(3);
        assert_eq!(wider.id, loader.id);
        assert_eq!(wider.center, loader.center);
        assert_eq!(wider.radius, 3);
        assert_eq!(wider.area(), 49);
    }

    #[test]
    fn serde_shape() {
        let id = Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440000);
        let loader = ChunkLoader::with_id(id, "overworld", ChunkPos::new(3, -2), 1);
        let json = serde_json::to_value(&loader).unwrap();
        assert_eq!(json["world"], "overworld");
        assert_eq!(json["center"]["x"], 3);
        assert_eq!(json["center"]["z"], -2);
        assert_eq!(json["radius"], 1);
        assert_eq!(json["id"], "550e8400-e29b-41d4-a716-446655440000");
    }
}
