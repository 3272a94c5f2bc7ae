use rand::Rng;
use rand::rngs::SmallRng;

use super::RoomContext;
use crate::model::{BiomeType, FeatureKind, GridCoord, Polarity, RoomFeature, RoomLayout, RoomType};
use crate::seed::feature_rng;

/// Share of the room area the fill pass aims to cover.
pub const FILL_FRACTION: f32 = 0.6;

const FILL_OFFSET: u64 = 5000;
const SECRET_OFFSET: u64 = 6000;
/// Consecutive rejected placements before a pass gives up.
const MAX_MISSES: u32 = 64;

type WeightTable = &'static [(FeatureKind, u32)];

const SERVICE_WEIGHTS: WeightTable = &[
    (FeatureKind::Platform, 4),
    (FeatureKind::SaveStation, 3),
    (FeatureKind::Collectible, 2),
    (FeatureKind::Powerup, 1),
];
const SHADOW_WEIGHTS: WeightTable = &[
    (FeatureKind::Obstacle, 5),
    (FeatureKind::Platform, 3),
    (FeatureKind::Hazard, 2),
    (FeatureKind::Powerup, 1),
];
const SKY_WEIGHTS: WeightTable = &[
    (FeatureKind::Platform, 6),
    (FeatureKind::Powerup, 3),
    (FeatureKind::Collectible, 2),
    (FeatureKind::Obstacle, 1),
];
const HEAT_WEIGHTS: WeightTable = &[
    (FeatureKind::Hazard, 4),
    (FeatureKind::Platform, 4),
    (FeatureKind::Obstacle, 2),
    (FeatureKind::Powerup, 1),
];
const DEFAULT_WEIGHTS: WeightTable = &[
    (FeatureKind::Platform, 5),
    (FeatureKind::Obstacle, 3),
    (FeatureKind::Collectible, 1),
    (FeatureKind::Powerup, 1),
];

pub fn weight_table(biome: BiomeType, room_type: RoomType) -> WeightTable {
    if room_type.is_service() || biome == BiomeType::HubArea {
        return SERVICE_WEIGHTS;
    }
    if biome.is_sky() {
        return SKY_WEIGHTS;
    }
    match biome.polarities().0 {
        p if p == Polarity::MOON => SHADOW_WEIGHTS,
        p if p == Polarity::HEAT => HEAT_WEIGHTS,
        _ => DEFAULT_WEIGHTS,
    }
}

fn footprint(kind: FeatureKind) -> (i32, i32) {
    match kind {
        FeatureKind::Platform => (3, 1),
        FeatureKind::Obstacle => (1, 2),
        FeatureKind::Hazard => (2, 1),
        FeatureKind::SaveStation => (2, 2),
        _ => (1, 1),
    }
}

/// Cell mask shared by every pass of one room so no two placements overlap.
struct Occupancy {
    width: i32,
    height: i32,
    cells: Vec<bool>,
}

impl Occupancy {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; (width.max(0) * height.max(0)) as usize],
        }
    }

    fn cells_of(&self, f: &RoomFeature) -> impl Iterator<Item = usize> + use<> {
        let width = self.width;
        let f = *f;
        (f.position.y..f.position.y + f.height).flat_map(move |y| {
            (f.position.x..f.position.x + f.width).map(move |x| (y * width + x) as usize)
        })
    }

    fn is_free(&self, feature: &RoomFeature) -> bool {
        feature.position.x >= 0
            && feature.position.y >= 0
            && feature.position.x + feature.width <= self.width
            && feature.position.y + feature.height <= self.height
            && !self.cells_of(feature).any(|i| self.cells[i])
    }

    fn claim(&mut self, feature: &RoomFeature) {
        for i in self.cells_of(feature) {
            self.cells[i] = true;
        }
    }

    fn try_claim(&mut self, feature: &RoomFeature) -> bool {
        let free = self.is_free(feature);
        if free {
            self.claim(feature);
        }
        free
    }
}

/// Biome-weighted fill of platforms, obstacles and pickups around an optional secret layer.
/// Secrets are carved first so the fill cannot crowd them out.
pub fn generate(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut layout = RoomLayout {
        room_id: ctx.request.room_id,
        generator: ctx.request.generator,
        ..RoomLayout::default()
    };
    let mut occupancy = Occupancy::new(ctx.width, ctx.height);

    if matches!(ctx.request.room_type, RoomType::Save | RoomType::Hub) {
        let station = RoomFeature::new(
            FeatureKind::SaveStation,
            GridCoord::new(ctx.width / 2 - 1, 0),
            2,
            2,
        );
        if occupancy.try_claim(&station) {
            layout.features.push(station);
        }
    }
    let secrets = secret_areas(ctx, &mut occupancy);

    let table = weight_table(ctx.request.target_biome, ctx.request.room_type);
    let budget = (ctx.area().area() as f32 * FILL_FRACTION) as i32;
    let mut rng = feature_rng(ctx.request.seed, FILL_OFFSET);
    let mut filled: i32 = layout.features.iter().map(|f| f.width * f.height).sum();
    let mut misses = 0;
    while filled < budget && misses < MAX_MISSES {
        let kind = pick(table, &mut rng);
        let (w, h) = footprint(kind);
        match random_spot(&mut rng, ctx.width, ctx.height, w, h) {
            Some(position) => {
                let feature = RoomFeature::new(kind, position, w, h);
                if occupancy.try_claim(&feature) {
                    layout.features.push(feature);
                    filled += w * h;
                    misses = 0;
                } else {
                    misses += 1;
                }
            }
            None => misses += 1,
        }
    }

    layout.features.extend(secrets);
    layout
}

fn pick(table: WeightTable, rng: &mut SmallRng) -> FeatureKind {
    let total: u32 = table.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0..total.max(1));
    for (kind, weight) in table {
        if roll < *weight {
            return *kind;
        }
        roll -= weight;
    }
    FeatureKind::Platform
}

fn random_spot(rng: &mut SmallRng, width: i32, height: i32, w: i32, h: i32) -> Option<GridCoord> {
    if w > width || h > height {
        return None;
    }
    Some(GridCoord::new(
        rng.random_range(0..=width - w),
        rng.random_range(0..=height - h),
    ))
}

/// Secret pockets covering about `secret_area_percentage` of the room, each reached
/// through a destructible wall or an alternate route. Pockets and their entrances claim
/// cells in `occupancy`; a pocket whose entrance is blocked is not placed.
fn secret_areas(ctx: &RoomContext<'_>, occupancy: &mut Occupancy) -> Vec<RoomFeature> {
    let config = ctx.secrets;
    let use_walls = config.use_destructible_walls;
    let use_routes = config.use_alternate_routes;
    if config.secret_area_percentage <= 0.0 {
        return Vec::new();
    }
    let (min_w, max_w) = ordered(config.min_secret_width, config.max_secret_width);
    let (min_h, max_h) = ordered(config.min_secret_height, config.max_secret_height);
    let max_w = max_w.min(ctx.width);
    let max_h = max_h.min(ctx.height);
    if min_w < 1 || min_h < 1 || min_w > max_w || min_h > max_h {
        return Vec::new();
    }

    let budget = (ctx.area().area() as f32 * config.secret_area_percentage) as i32;
    let mut rng = feature_rng(ctx.request.seed, SECRET_OFFSET);
    let mut features = Vec::new();
    let mut covered = 0;
    let mut misses = 0;
    while covered < budget && misses < MAX_MISSES {
        let w = rng.random_range(min_w..=max_w);
        let h = rng.random_range(min_h..=max_h);
        let Some(position) = random_spot(&mut rng, ctx.width, ctx.height, w, h) else {
            misses += 1;
            continue;
        };
        let secret = RoomFeature::new(FeatureKind::SecretArea, position, w, h);
        let wall_first = use_walls && (!use_routes || rng.random_bool(0.5));
        let entrance = if wall_first && position.x > 0 {
            Some(RoomFeature::new(
                FeatureKind::DestructibleWall,
                GridCoord::new(position.x - 1, position.y),
                1,
                h,
            ))
        } else if use_routes && position.y + h < ctx.height {
            Some(RoomFeature::new(
                FeatureKind::AlternateRoute,
                GridCoord::new(position.x, position.y + h),
                w,
                1,
            ))
        } else {
            None
        };
        if !occupancy.is_free(&secret) || entrance.is_some_and(|e| !occupancy.is_free(&e)) {
            misses += 1;
            continue;
        }
        misses = 0;
        covered += w * h;
        occupancy.claim(&secret);
        features.push(secret);
        if let Some(entrance) = entrance {
            occupancy.claim(&entrance);
            features.push(entrance);
        }
    }
    features
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    (a.min(b), a.max(b))
}
