//! Pattern-driven modular rooms: one obstacle pattern per movement ability the player has,
//! plus combined gates when several apply.
//!
//! Each feature category draws from its own offset stream of the room seed, so switching
//! one ability off leaves the other patterns where they were.

use rand::Rng;
use rand::seq::SliceRandom;

use super::{RoomContext, assemble};
use crate::model::{Ability, FeatureKind, GridCoord, JumpPhysicsData, RoomFeature, RoomLayout};
use crate::seed::feature_rng;
use crate::worldgen::jump_arc::envelope;

const DASH_OFFSET: u64 = 1000;
const WALL_JUMP_OFFSET: u64 = 2000;
const GRAPPLE_OFFSET: u64 = 3000;
const COMBINED_OFFSET: u64 = 4000;

/// One dash gap per this many tiles of room width.
const DASH_GAP_SPACING: i32 = 8;
const DASH_GAP_MIN: i32 = 3;
const DASH_GAP_MAX: i32 = 4;
const WALL_SHAFT_SPACING: i32 = 12;
const WALL_SHAFT_MIN_HEIGHT: i32 = 4;
const WALL_SHAFT_MAX_HEIGHT: i32 = 8;
const GRAPPLE_SPACING: i32 = 10;
const GATE_WIDTH: i32 = 2;
const GATE_MAX_HEIGHT: i32 = 4;

pub fn generate(ctx: &RoomContext<'_>) -> RoomLayout {
    let abilities = ctx.abilities();
    let mut features = Vec::new();

    let gaps = if abilities.contains(Ability::DASH) {
        dash_gaps(ctx)
    } else {
        Vec::new()
    };
    features.extend(floor_between(ctx, &gaps));
    features.extend(gaps);
    if abilities.contains(Ability::WALL_JUMP) {
        features.extend(wall_jump_shafts(ctx));
    }
    if abilities.contains(Ability::GRAPPLE) {
        features.extend(grapple_points(ctx));
    }
    features.extend(combined_gates(ctx));

    assemble(ctx, features)
}

/// Floor gaps wider than the player clears without dashing but no wider than a
/// dash-assisted jump. The room is split into equal segments with one gap inside each.
fn dash_gaps(ctx: &RoomContext<'_>) -> Vec<RoomFeature> {
    let mut rng = feature_rng(ctx.request.seed, DASH_OFFSET);
    let (narrowest, widest) = dash_gap_widths(ctx.physics);
    if widest < narrowest {
        return Vec::new();
    }

    let count = (ctx.width / DASH_GAP_SPACING.max(widest + 3)).max(1);
    let segment = ctx.width / count;
    let mut gaps = Vec::new();
    for i in 0..count {
        let width = rng.random_range(narrowest..=widest);
        // Keep a one-tile ledge on both sides of the gap.
        let first = i * segment + 1;
        let last = (i + 1) * segment - 1 - width;
        if last < first {
            continue;
        }
        let x = rng.random_range(first..=last);
        gaps.push(
            RoomFeature::new(FeatureKind::DashGap, GridCoord::new(x, 0), width, 1)
                .requiring(Ability::DASH),
        );
    }
    gaps
}

/// Gap widths that force a dash: past the plain jump's reach, within the dash's.
fn dash_gap_widths(physics: &JumpPhysicsData) -> (i32, i32) {
    let (_, plain) = envelope(&JumpPhysicsData { can_dash: false, ..*physics }, 0.0);
    let (_, dashing) = envelope(&JumpPhysicsData { can_dash: true, ..*physics }, 0.0);
    let narrowest = DASH_GAP_MIN.max(plain.floor() as i32 + 1);
    let widest = (dashing.floor() as i32).min(narrowest.max(DASH_GAP_MAX));
    (narrowest, widest)
}

/// Floor terrain covering everything the gaps leave open.
fn floor_between(ctx: &RoomContext<'_>, gaps: &[RoomFeature]) -> Vec<RoomFeature> {
    let mut spans: Vec<(i32, i32)> = gaps
        .iter()
        .map(|g| (g.position.x, g.position.x + g.width))
        .collect();
    spans.sort_unstable();

    let mut floor = Vec::new();
    let mut cursor = 0;
    for (start, end) in spans {
        if start > cursor {
            floor.push(RoomFeature::new(
                FeatureKind::Terrain,
                GridCoord::new(cursor, 0),
                start - cursor,
                1,
            ));
        }
        cursor = cursor.max(end);
    }
    if cursor < ctx.width {
        floor.push(RoomFeature::new(
            FeatureKind::Terrain,
            GridCoord::new(cursor, 0),
            ctx.width - cursor,
            1,
        ));
    }
    floor
}

fn wall_jump_shafts(ctx: &RoomContext<'_>) -> Vec<RoomFeature> {
    let mut rng = feature_rng(ctx.request.seed, WALL_JUMP_OFFSET);
    let tallest = WALL_SHAFT_MAX_HEIGHT.min(ctx.height - 1);
    if tallest < WALL_SHAFT_MIN_HEIGHT || ctx.width < 4 {
        return Vec::new();
    }
    let count = (ctx.width / WALL_SHAFT_SPACING).max(1);
    (0..count)
        .map(|_| {
            let height = rng.random_range(WALL_SHAFT_MIN_HEIGHT..=tallest);
            let x = rng.random_range(1..=ctx.width - 3);
            RoomFeature::new(FeatureKind::WallJumpShaft, GridCoord::new(x, 1), 2, height)
                .requiring(Ability::WALL_JUMP)
        })
        .collect()
}

fn grapple_points(ctx: &RoomContext<'_>) -> Vec<RoomFeature> {
    let mut rng = feature_rng(ctx.request.seed, GRAPPLE_OFFSET);
    if ctx.width < 5 || ctx.height < 4 {
        return Vec::new();
    }
    let count = (ctx.width / GRAPPLE_SPACING).max(1);
    (0..count)
        .map(|_| {
            let x = rng.random_range(2..=ctx.width - 3);
            let y = rng.random_range(ctx.height / 2..=ctx.height - 2);
            RoomFeature::new(FeatureKind::GrapplePoint, GridCoord::new(x, y), 1, 1)
                .requiring(Ability::GRAPPLE)
        })
        .collect()
}

/// Gates that need two gate abilities at once, one fewer than the abilities on offer.
fn combined_gates(ctx: &RoomContext<'_>) -> Vec<RoomFeature> {
    let relevant: Vec<Ability> = (ctx.abilities() & Ability::GATE_ABILITIES).iter().collect();
    if relevant.len() < 2 {
        return Vec::new();
    }
    let mut rng = feature_rng(ctx.request.seed, COMBINED_OFFSET);
    let height = GATE_MAX_HEIGHT.min(ctx.height - 2);
    if height < 1 || ctx.width < GATE_WIDTH + 2 {
        return Vec::new();
    }
    (0..relevant.len() - 1)
        .map(|_| {
            let mut pair = relevant.clone();
            pair.shuffle(&mut rng);
            let x = rng.random_range(1..=ctx.width - GATE_WIDTH - 1);
            RoomFeature::new(
                FeatureKind::CombinedGate,
                GridCoord::new(x, 1),
                GATE_WIDTH,
                height,
            )
            .requiring(pair[0] | pair[1])
        })
        .collect()
}
