//! Generators picked by room shape: corridors for wide rooms, shafts and stacks for tall ones.

use rand::Rng;

use super::{RoomContext, assemble};
use crate::model::{Ability, FeatureKind, GridCoord, RoomFeature, RoomLayout};
use crate::seed::feature_rng;
use crate::worldgen::jump_arc::calculate_minimum_platform_spacing;

const CORRIDOR_OFFSET: u64 = 7000;
const BRANCH_OFFSET: u64 = 7100;
const VERTICAL_OFFSET: u64 = 7200;
const STACKED_OFFSET: u64 = 7300;

/// Shape generators ask for half the jump envelope; they are traversal, not challenge.
const SHAPE_DIFFICULTY: f32 = 0.5;
const PLATFORM_WIDTH: i32 = 3;
const LEDGE_WIDTH: i32 = 2;
const HAZARD_CHANCE: f64 = 0.3;
const BRANCH_SPACING: i32 = 16;
const STACK_STOREY: i32 = 6;
const OPENING_WIDTH: i32 = 2;

/// Integer (horizontal gap, vertical rise) at the shape difficulty, at least one tile each.
fn spacing(ctx: &RoomContext<'_>) -> (i32, i32) {
    let (x, y) = calculate_minimum_platform_spacing(ctx.physics, SHAPE_DIFFICULTY);
    ((x.floor() as i32).max(1), (y.floor() as i32).max(1))
}

fn floor(ctx: &RoomContext<'_>) -> RoomFeature {
    RoomFeature::new(FeatureKind::Terrain, GridCoord::ORIGIN, ctx.width, 1)
}

pub fn horizontal_corridor(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, CORRIDOR_OFFSET);
    let mut features = vec![floor(ctx)];
    if ctx.height >= 4 {
        features.push(RoomFeature::new(
            FeatureKind::Terrain,
            GridCoord::new(0, ctx.height - 1),
            ctx.width,
            1,
        ));
    }

    let (gap, _) = spacing(ctx);
    let stride = gap + PLATFORM_WIDTH;
    let top = (ctx.height - 3).min(3);
    let mut x = 2;
    while x + PLATFORM_WIDTH <= ctx.width - 2 {
        if rng.random_bool(HAZARD_CHANCE) {
            features.push(RoomFeature::new(FeatureKind::Hazard, GridCoord::new(x, 1), 2, 1));
        } else if top >= 2 {
            let y = rng.random_range(2..=top);
            features.push(RoomFeature::new(
                FeatureKind::Platform,
                GridCoord::new(x, y),
                PLATFORM_WIDTH,
                1,
            ));
        }
        x += stride;
    }
    assemble(ctx, features)
}

/// Corridor whose floor sprouts climbing branches that end in an alternate route.
pub fn branching_corridor(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, BRANCH_OFFSET);
    let mut features = vec![floor(ctx)];
    let (gap, rise) = spacing(ctx);
    if ctx.height < 6 || ctx.width < 8 {
        return assemble(ctx, features);
    }

    let branches = (ctx.width / BRANCH_SPACING).max(1);
    let lane = ctx.width / branches;
    for b in 0..branches {
        let mut x = b * lane + rng.random_range(0..=lane / 4);
        let mut y = 1 + rise;
        let mut last_x = None;
        while y + 1 < ctx.height - 1 && x + LEDGE_WIDTH <= ctx.width {
            features.push(RoomFeature::new(
                FeatureKind::Platform,
                GridCoord::new(x, y),
                LEDGE_WIDTH,
                1,
            ));
            last_x = Some(x);
            x += LEDGE_WIDTH + gap.min(2);
            y += rise;
        }
        if let Some(last_x) = last_x {
            features.push(RoomFeature::new(
                FeatureKind::AlternateRoute,
                GridCoord::new(last_x, y.min(ctx.height - 1)),
                (ctx.width - last_x).min(4),
                1,
            ));
        }
    }
    assemble(ctx, features)
}

/// Zig-zag ledges up a tall shaft, with a wall-jump run when the player can use one.
pub fn vertical_segment(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, VERTICAL_OFFSET);
    let mut features = vec![floor(ctx)];
    let (_, rise) = spacing(ctx);
    let ledge = LEDGE_WIDTH.min(ctx.width - 2);
    if ledge < 1 {
        return assemble(ctx, features);
    }

    let mut left = rng.random_bool(0.5);
    let mut y = 1 + rise;
    while y < ctx.height - 1 {
        let x = if left { 1 } else { ctx.width - 1 - ledge };
        features.push(RoomFeature::new(
            FeatureKind::Platform,
            GridCoord::new(x, y),
            ledge,
            1,
        ));
        left = !left;
        y += rise;
    }
    if ctx.abilities().contains(Ability::WALL_JUMP) && ctx.height > 3 {
        features.push(
            RoomFeature::new(
                FeatureKind::WallJumpShaft,
                GridCoord::new(0, 1),
                1,
                ctx.height - 2,
            )
            .requiring(Ability::WALL_JUMP),
        );
    }
    assemble(ctx, features)
}

/// Storeys of solid floor, each pierced by one opening with a step platform beneath it.
pub fn stacked_segment(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut rng = feature_rng(ctx.request.seed, STACKED_OFFSET);
    let mut features = vec![floor(ctx)];
    let storeys = (ctx.height / STACK_STOREY).max(1);
    let storey_height = ctx.height / storeys;
    if ctx.width < OPENING_WIDTH + 2 {
        return assemble(ctx, features);
    }

    for level in 1..storeys {
        let y = level * storey_height;
        let opening = rng.random_range(1..=ctx.width - OPENING_WIDTH - 1);
        features.push(RoomFeature::new(
            FeatureKind::Terrain,
            GridCoord::new(0, y),
            opening,
            1,
        ));
        let right = opening + OPENING_WIDTH;
        features.push(RoomFeature::new(
            FeatureKind::Terrain,
            GridCoord::new(right, y),
            ctx.width - right,
            1,
        ));
        let step_y = y - storey_height / 2;
        if step_y > y - storey_height {
            features.push(RoomFeature::new(
                FeatureKind::Platform,
                GridCoord::new(opening, step_y),
                OPENING_WIDTH,
                1,
            ));
        }
    }
    assemble(ctx, features)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::model::{JumpPhysicsData, RoomType, SecretAreaConfig};

    fn ctx_run(
        f: fn(&RoomContext<'_>) -> RoomLayout,
        abilities: Ability,
        width: i32,
        height: i32,
    ) -> RoomLayout {
        let request = request(RoomType::Normal, abilities, 31);
        let physics = JumpPhysicsData::default().with_abilities(abilities);
        let secrets = SecretAreaConfig::default();
        f(&context(&request, width, height, &physics, &secrets))
    }

    #[test]
    fn corridor_has_floor_and_ceiling() {
        let layout = ctx_run(horizontal_corridor, Ability::JUMP, 30, 8);
        assert_well_formed(&layout, 30, 8);
        assert!(layout.count(FeatureKind::Terrain) == 2);
        assert!(layout.count(FeatureKind::Platform) + layout.count(FeatureKind::Hazard) > 0);
    }

    #[test]
    fn branches_end_in_alternate_routes() {
        let layout = ctx_run(branching_corridor, Ability::JUMP, 32, 12);
        assert_well_formed(&layout, 32, 12);
        assert_eq!(layout.count(FeatureKind::AlternateRoute), 2);
    }

    #[test]
    fn vertical_ledges_alternate_sides() {
        let layout = ctx_run(vertical_segment, Ability::JUMP, 8, 24);
        let ledges: Vec<&RoomFeature> = layout
            .features
            .iter()
            .filter(|f| f.kind == FeatureKind::Platform)
            .collect();
        assert!(ledges.len() >= 3);
        for pair in ledges.windows(2) {
            assert_ne!(pair[0].position.x, pair[1].position.x);
            assert!(pair[1].position.y > pair[0].position.y);
        }
        assert_eq!(layout.count(FeatureKind::WallJumpShaft), 0);
    }

    #[test]
    fn wall_jump_adds_a_shaft() {
        let abilities = Ability::JUMP | Ability::WALL_JUMP;
        let layout = ctx_run(vertical_segment, abilities, 8, 24);
        assert_eq!(layout.count(FeatureKind::WallJumpShaft), 1);
    }

    #[test]
    fn stacked_storeys_leave_an_opening() {
        let layout = ctx_run(stacked_segment, Ability::JUMP, 10, 24);
        assert_well_formed(&layout, 10, 24);
        // Ground floor plus two halves for each of the three upper storeys.
        assert_eq!(layout.count(FeatureKind::Terrain), 7);
        assert_eq!(layout.count(FeatureKind::Platform), 3);
    }
}
