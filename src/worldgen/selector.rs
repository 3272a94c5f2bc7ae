use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::model::{BiomeType, RoomGeneratorType, RoomType};

/// Rooms at least this wide relative to their height read as corridors.
pub const WIDE_ASPECT: f32 = 1.5;
/// Rooms at most this wide relative to their height read as shafts.
pub const TALL_ASPECT: f32 = 0.67;
/// Biome dispatch only applies when the room follows its district biome this strongly.
pub const BIOME_AFFINITY_THRESHOLD: f32 = 0.5;

const TREASURE_PRIMARY_WEIGHT: f64 = 0.7;
const EVEN_SPLIT: f64 = 0.5;

/// Inputs of the best-fit matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionInput {
    pub room_type: RoomType,
    pub biome: BiomeType,
    pub biome_affinity: f32,
    pub aspect_ratio: f32,
    pub skill_gating: bool,
}

/// The bucket a room falls into: (primary, alternate, probability of primary).
/// First matching row wins.
pub fn candidates(input: &SelectionInput) -> (RoomGeneratorType, RoomGeneratorType, f64) {
    use RoomGeneratorType::*;

    if input.room_type == RoomType::Boss && input.skill_gating {
        return (PatternDrivenModular, PatternDrivenModular, 1.0);
    }
    if input.room_type == RoomType::Treasure {
        return (ParametricChallenge, PatternDrivenModular, TREASURE_PRIMARY_WEIGHT);
    }
    if input.room_type.is_service() {
        return (WeightedTilePrefab, WeightedTilePrefab, 1.0);
    }

    if input.biome_affinity >= BIOME_AFFINITY_THRESHOLD {
        if input.biome.is_sky() {
            return (LayeredPlatformCloud, SkyBiomePlatform, EVEN_SPLIT);
        }
        if input.biome.is_terrain() {
            return (BiomeWeightedHeightmap, BiomeWeightedTerrain, EVEN_SPLIT);
        }
    }

    if input.aspect_ratio > WIDE_ASPECT {
        (LinearBranchingCorridor, HorizontalCorridor, EVEN_SPLIT)
    } else if input.aspect_ratio < TALL_ASPECT {
        (StackedSegment, VerticalSegment, EVEN_SPLIT)
    } else {
        (WeightedTilePrefab, WeightedTilePrefab, 1.0)
    }
}

/// Pick a generator. Ambiguous buckets are settled by a draw from `seed` alone.
pub fn select_generator(input: &SelectionInput, seed: u64) -> RoomGeneratorType {
    let (primary, alternate, weight) = candidates(input);
    if primary == alternate {
        return primary;
    }
    let mut rng = SmallRng::seed_from_u64(seed);
    if rng.random_bool(weight) {
        primary
    } else {
        alternate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(room_type: RoomType, biome: BiomeType, aspect_ratio: f32) -> SelectionInput {
        SelectionInput {
            room_type,
            biome,
            biome_affinity: 1.0,
            aspect_ratio,
            skill_gating: false,
        }
    }

    #[test]
    fn skill_gated_boss_is_pattern_driven() {
        let mut boss = input(RoomType::Boss, BiomeType::Sky, 16.0 / 12.0);
        boss.skill_gating = true;
        for seed in 0..20 {
            assert_eq!(
                select_generator(&boss, seed),
                RoomGeneratorType::PatternDrivenModular
            );
        }
    }

    #[test]
    fn boss_without_gating_falls_through() {
        let boss = input(RoomType::Boss, BiomeType::Sky, 1.0);
        let (primary, alternate, _) = candidates(&boss);
        assert_eq!(primary, RoomGeneratorType::LayeredPlatformCloud);
        assert_eq!(alternate, RoomGeneratorType::SkyBiomePlatform);
    }

    #[test]
    fn treasure_prefers_parametric_with_alternate() {
        let treasure = input(RoomType::Treasure, BiomeType::Forest, 1.0);
        let picks: Vec<_> = (0..200).map(|s| select_generator(&treasure, s)).collect();
        let parametric = picks
            .iter()
            .filter(|g| **g == RoomGeneratorType::ParametricChallenge)
            .count();
        assert!(parametric > 100, "primary should dominate, got {parametric}");
        assert!(picks.contains(&RoomGeneratorType::PatternDrivenModular));
        assert!(picks.iter().all(|g| matches!(
            g,
            RoomGeneratorType::ParametricChallenge | RoomGeneratorType::PatternDrivenModular
        )));
    }

    #[test]
    fn service_rooms_are_weighted_tiles() {
        for room_type in [RoomType::Save, RoomType::Shop, RoomType::Hub] {
            assert_eq!(
                select_generator(&input(room_type, BiomeType::Sky, 3.0), 1),
                RoomGeneratorType::WeightedTilePrefab
            );
        }
    }

    #[test]
    fn terrain_biome_dispatch() {
        let (primary, alternate, _) = candidates(&input(RoomType::Normal, BiomeType::Forest, 1.0));
        assert_eq!(primary, RoomGeneratorType::BiomeWeightedHeightmap);
        assert_eq!(alternate, RoomGeneratorType::BiomeWeightedTerrain);
    }

    #[test]
    fn weak_affinity_uses_shape() {
        let mut wide = input(RoomType::Normal, BiomeType::Sky, 2.0);
        wide.biome_affinity = 0.2;
        let (primary, _, _) = candidates(&wide);
        assert_eq!(primary, RoomGeneratorType::LinearBranchingCorridor);
    }

    #[test]
    fn aspect_buckets() {
        let tall = input(RoomType::Normal, BiomeType::ShadowRealms, 0.5);
        assert_eq!(candidates(&tall).0, RoomGeneratorType::StackedSegment);
        let square = input(RoomType::Normal, BiomeType::ShadowRealms, 1.0);
        assert_eq!(
            select_generator(&square, 3),
            RoomGeneratorType::WeightedTilePrefab
        );
    }

    #[test]
    fn draw_depends_only_on_seed() {
        let wide = input(RoomType::Normal, BiomeType::Factory, 2.0);
        for seed in 0..50 {
            assert_eq!(select_generator(&wide, seed), select_generator(&wide, seed));
        }
    }
}
