//! Biome-driven generators: floating platforms for sky biomes and ground profiles for
//! terrain biomes.

use rand::Rng;
use rand::rngs::SmallRng;

use super::{RoomContext, assemble};
use crate::model::{BiomeType, FeatureKind, GridCoord, Polarity, RoomFeature, RoomLayout};
use crate::seed::feature_rng;
use crate::worldgen::jump_arc::calculate_minimum_platform_spacing;

const SKY_OFFSET: u64 = 8000;
const CLOUD_OFFSET: u64 = 8100;
const TERRAIN_OFFSET: u64 = 8200;
const HEIGHTMAP_OFFSET: u64 = 8300;

const SKY_DIFFICULTY: f32 = 0.6;
const COLLECTIBLE_CHANCE: f64 = 0.25;
/// Columns between heightmap control points.
const HEIGHTMAP_PERIOD: usize = 4;

/// Ground shape of a terrain biome.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TerrainProfile {
    /// Starting height as a share of the room height.
    base: f32,
    /// Largest height change between neighbouring columns.
    roughness: i32,
    hazard_chance: f64,
}

fn profile(biome: BiomeType) -> TerrainProfile {
    match biome {
        BiomeType::Mountains => TerrainProfile {
            base: 0.4,
            roughness: 2,
            hazard_chance: 0.05,
        },
        BiomeType::Desert | BiomeType::SolarPlains => TerrainProfile {
            base: 0.15,
            roughness: 1,
            hazard_chance: 0.1,
        },
        BiomeType::Tundra | BiomeType::FrozenWastes => TerrainProfile {
            base: 0.2,
            roughness: 1,
            hazard_chance: 0.15,
        },
        BiomeType::Cavern => TerrainProfile {
            base: 0.25,
            roughness: 2,
            hazard_chance: 0.1,
        },
        _ => TerrainProfile {
            base: 0.25,
            roughness: 1,
            hazard_chance: 0.05,
        },
    }
}

/// Integer (horizontal gap, vertical rise), at least one tile each.
fn spacing(ctx: &RoomContext<'_>, difficulty: f32) -> (i32, i32) {
    let (x, y) = calculate_minimum_platform_spacing(ctx.physics, difficulty);
    ((x.floor() as i32).max(1), (y.floor() as i32).max(1))
}

/// A chain of floating platforms drifting across the room, each within reach of the last.
pub fn sky_platforms(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, SKY_OFFSET);
    let mut features = Vec::new();
    if ctx.height < 3 || ctx.width < 2 {
        return assemble(ctx, features);
    }
    let (gap, rise) = spacing(ctx, SKY_DIFFICULTY);
    let top = ctx.height - 2;
    let mut x = 0;
    let mut y = (ctx.height / 3).clamp(1, top);
    while x < ctx.width {
        let width = rng.random_range(2..=4).min(ctx.width - x);
        if width < 2 {
            break;
        }
        features.push(RoomFeature::new(
            FeatureKind::Platform,
            GridCoord::new(x, y),
            width,
            1,
        ));
        if y + 1 < ctx.height && rng.random_bool(COLLECTIBLE_CHANCE) {
            features.push(RoomFeature::new(
                FeatureKind::Collectible,
                GridCoord::new(x, y + 1),
                1,
                1,
            ));
        }
        x += width + rng.random_range(1..=gap);
        y = (y + rng.random_range(-rise..=rise)).clamp(1, top);
    }
    if ctx.request.target_biome == BiomeType::StormSpire && ctx.width > 2 {
        let hx = rng.random_range(0..ctx.width - 1);
        features.push(RoomFeature::new(
            FeatureKind::Hazard,
            GridCoord::new(hx, ctx.height - 1),
            2,
            1,
        ));
    }
    assemble(ctx, features)
}

/// Horizontal layers of short platforms, each layer offset from the one below.
pub fn platform_cloud(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, CLOUD_OFFSET);
    let mut features = Vec::new();
    let (gap, rise) = spacing(ctx, SKY_DIFFICULTY);
    let layer_gap = rise + 1;
    let mut y = 1;
    let mut layer = 0;
    while y < ctx.height - 1 {
        let mut x = if layer % 2 == 0 { 0 } else { gap.min(ctx.width - 1) };
        while x + 2 <= ctx.width {
            let width = rng.random_range(2..=3).min(ctx.width - x);
            features.push(RoomFeature::new(
                FeatureKind::Platform,
                GridCoord::new(x, y),
                width,
                1,
            ));
            x += width + rng.random_range(1..=gap + 1);
        }
        y += layer_gap;
        layer += 1;
    }
    assemble(ctx, features)
}

/// Ground shaped by a bounded random walk whose base and roughness come from the biome.
pub fn weighted_terrain(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, TERRAIN_OFFSET);
    let profile = profile(ctx.request.target_biome);
    let ceiling = (ctx.height - 2).max(1);
    let mut height = ((ctx.height as f32 * profile.base).round() as i32).clamp(1, ceiling);
    let mut heights = Vec::with_capacity(ctx.width.max(0) as usize);
    for _ in 0..ctx.width {
        heights.push(height);
        height = (height + rng.random_range(-profile.roughness..=profile.roughness)).clamp(1, ceiling);
    }

    let mut features = columns_to_terrain(&heights);
    features.extend(surface_hazards(ctx, &heights, profile.hazard_chance, &mut rng));
    if ctx.request.target_biome == BiomeType::Forest {
        features.extend(canopy(ctx, &heights, &mut rng));
    }
    assemble(ctx, features)
}

/// Smooth ground interpolated between random control heights, with hazards pooling in
/// the valleys of hot biomes.
pub fn heightmap(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, HEIGHTMAP_OFFSET);
    let width = ctx.width.max(0) as usize;
    let ceiling = (ctx.height - 2).max(1);
    let peak = ((ctx.height as f32 * (profile(ctx.request.target_biome).base + 0.25)).round()
        as i32)
        .clamp(1, ceiling);

    let controls: Vec<i32> = (0..=width / HEIGHTMAP_PERIOD + 1)
        .map(|_| rng.random_range(1..=peak))
        .collect();
    let heights: Vec<i32> = (0..width)
        .map(|x| {
            let i = x / HEIGHTMAP_PERIOD;
            let t = (x % HEIGHTMAP_PERIOD) as f32 / HEIGHTMAP_PERIOD as f32;
            let h = controls[i] as f32 * (1.0 - t) + controls[i + 1] as f32 * t;
            (h.round() as i32).clamp(1, ceiling)
        })
        .collect();

    let mut features = columns_to_terrain(&heights);
    let hot = ctx.request.target_polarity.intersects(Polarity::HEAT);
    if hot {
        for x in 1..width.saturating_sub(1) {
            if heights[x] < heights[x - 1] && heights[x] <= heights[x + 1] {
                features.push(RoomFeature::new(
                    FeatureKind::Hazard,
                    GridCoord::new(x as i32, heights[x]),
                    1,
                    1,
                ));
            }
        }
    }
    assemble(ctx, features)
}

/// Merge runs of equal column height into terrain blocks standing on the floor.
fn columns_to_terrain(heights: &[i32]) -> Vec<RoomFeature> {
    let mut features = Vec::new();
    let mut start = 0;
    for x in 1..=heights.len() {
        if x == heights.len() || heights[x] != heights[start] {
            features.push(RoomFeature::new(
                FeatureKind::Terrain,
                GridCoord::new(start as i32, 0),
                (x - start) as i32,
                heights[start],
            ));
            start = x;
        }
    }
    features
}

fn surface_hazards(
    ctx: &RoomContext<'_>,
    heights: &[i32],
    chance: f64,
    rng: &mut SmallRng,
) -> Vec<RoomFeature> {
    heights
        .iter()
        .enumerate()
        .filter(|(_, h)| **h < ctx.height)
        .filter(|_| rng.random_bool(chance))
        .map(|(x, h)| RoomFeature::new(FeatureKind::Hazard, GridCoord::new(x as i32, *h), 1, 1))
        .collect()
}

/// Tree-top platforms a few tiles above the ground.
fn canopy(ctx: &RoomContext<'_>, heights: &[i32], rng: &mut SmallRng) -> Vec<RoomFeature> {
    let mut features = Vec::new();
    let mut x = 1;
    while x + 2 < heights.len() {
        let y = heights[x] + 3;
        if y < ctx.height {
            features.push(RoomFeature::new(
                FeatureKind::Platform,
                GridCoord::new(x as i32, y),
                2,
                1,
            ));
        }
        x += rng.random_range(4..=7);
    }
    features
}
