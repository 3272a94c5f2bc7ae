use rand::Rng;

use super::{RoomContext, jump_between};
use crate::model::{FeatureKind, GridCoord, RoomFeature, RoomLayout};
use crate::seed::feature_rng;
use crate::worldgen::jump_arc::calculate_minimum_platform_spacing;

/// Share of the jump envelope each gap demands.
pub const TARGET_DIFFICULTY: f32 = 0.7;

const PLATFORM_WIDTH: i32 = 2;
const PLATFORM_OFFSET: u64 = 1500;

/// Start platform on the left, end platform on the right, and a walk of platforms between
/// them spaced at the target difficulty.
///
/// The walk always advances by the computed spacing. A platform the previous one cannot
/// reach is dropped and the walk carries on from the next step.
pub fn generate(ctx: &RoomContext<'_>) -> RoomLayout {
    let mut layout = RoomLayout {
        room_id: ctx.request.room_id,
        generator: ctx.request.generator,
        ..RoomLayout::default()
    };
    if ctx.width < PLATFORM_WIDTH * 2 || ctx.height < 2 {
        return layout;
    }

    let mut rng = feature_rng(ctx.request.seed, PLATFORM_OFFSET);
    let (gap_x, gap_y) = calculate_minimum_platform_spacing(ctx.physics, TARGET_DIFFICULTY);
    let step = (gap_x.floor() as i32).max(1);
    let rise = gap_y.floor() as i32;
    let top = ctx.height - 1;

    layout.features.push(RoomFeature::new(
        FeatureKind::Platform,
        GridCoord::new(0, 0),
        PLATFORM_WIDTH,
        1,
    ));
    let mut previous = 0;
    let mut cursor = PLATFORM_WIDTH;
    let end_x = ctx.width - PLATFORM_WIDTH;
    loop {
        let x = cursor + step;
        if x + PLATFORM_WIDTH > end_x {
            break;
        }
        let prev_y = layout.features[previous].position.y;
        let y = (prev_y + rng.random_range(-rise..=rise)).clamp(0, top - 1);
        let candidate = RoomFeature::new(
            FeatureKind::Platform,
            GridCoord::new(x, y),
            PLATFORM_WIDTH,
            1,
        );
        layout.features.push(candidate);
        let index = layout.features.len() - 1;
        match jump_between(&layout.features, previous, index, ctx.physics) {
            Some(jump) => {
                layout.jumps.push(jump);
                previous = index;
            }
            None => {
                layout.features.pop();
            }
        }
        cursor = x + PLATFORM_WIDTH;
    }

    layout.features.push(RoomFeature::new(
        FeatureKind::Platform,
        GridCoord::new(end_x, 0),
        PLATFORM_WIDTH,
        1,
    ));
    let end = layout.features.len() - 1;
    if let Some(jump) = jump_between(&layout.features, previous, end, ctx.physics) {
        layout.jumps.push(jump);
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::model::{Ability, JumpPhysicsData, RoomType, SecretAreaConfig};

    fn run(width: i32, height: i32, physics: JumpPhysicsData) -> RoomLayout {
        let request = request(RoomType::Treasure, Ability::JUMP, 21);
        let secrets = SecretAreaConfig::default();
        generate(&context(&request, width, height, &physics, &secrets))
    }

    #[test]
    fn start_and_end_platforms_bracket_the_room() {
        let layout = run(30, 10, JumpPhysicsData::default());
        let first = layout.features.first().unwrap();
        let last = layout.features.last().unwrap();
        assert_eq!(first.position, GridCoord::new(0, 0));
        assert_eq!(last.position, GridCoord::new(28, 0));
        assert_well_formed(&layout, 30, 10);
    }

    #[test]
    fn consecutive_platforms_are_linked() {
        let layout = run(40, 12, JumpPhysicsData::default());
        assert!(layout.features.len() > 2);
        // Every accepted middle platform was reached from its predecessor.
        for jump in &layout.jumps {
            assert!(jump.from_feature < jump.to_feature);
            assert!(jump.velocity > 0.0);
        }
        assert!(layout.jumps.len() >= layout.features.len() - 2);
    }

    #[test]
    fn gaps_follow_target_spacing() {
        let physics = JumpPhysicsData::default();
        let layout = run(40, 12, physics);
        let (gap_x, _) = calculate_minimum_platform_spacing(&physics, TARGET_DIFFICULTY);
        let step = gap_x.floor() as i32;
        let middle = &layout.features[1..layout.features.len() - 1];
        for pair in middle.windows(2) {
            let gap = pair[1].position.x - (pair[0].position.x + PLATFORM_WIDTH);
            assert!(gap >= step);
            assert_eq!((gap - step) % (step + PLATFORM_WIDTH), 0);
        }
    }

    #[test]
    fn tiny_room_is_left_empty() {
        let layout = run(3, 6, JumpPhysicsData::default());
        assert!(layout.features.is_empty());
    }
}
