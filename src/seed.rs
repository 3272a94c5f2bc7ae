use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::model::GridCoord;

/// Create a deterministic seed from a parent seed, a node's identity, and a category
/// discriminator. Siblings never share a stream, and a child's seed never depends on
/// how many siblings were generated before it.
pub fn make_seed(parent_seed: u64, node_id: u32, coords: GridCoord, discriminator: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent_seed.hash(&mut hasher);
    node_id.hash(&mut hasher);
    coords.x.hash(&mut hasher);
    coords.y.hash(&mut hasher);
    discriminator.hash(&mut hasher);
    hasher.finish()
}

/// Create a seeded RNG for one node and one generation category.
pub fn make_rng(parent_seed: u64, node_id: u32, coords: GridCoord, discriminator: &str) -> SmallRng {
    SmallRng::seed_from_u64(make_seed(parent_seed, node_id, coords, discriminator))
}

/// World-level RNG for a stage that is not scoped to a single node.
pub fn stage_rng(world_seed: u32, discriminator: &str) -> SmallRng {
    make_rng(u64::from(world_seed), 0, GridCoord::ORIGIN, discriminator)
}

/// RNG for one feature category of a room. Each category gets its own fixed offset so
/// toggling one category never shifts the placements of another.
pub fn feature_rng(room_seed: u64, offset: u64) -> SmallRng {
    SmallRng::seed_from_u64(room_seed.wrapping_add(offset))
}
