//! Projectile-motion reachability between two points for a given movement envelope.
//!
//! A jump is modelled as a launch with the vertical speed that reaches the envelope's
//! apex height and any horizontal speed up to the one that covers the envelope's range on
//! flat ground. Falling is capped at `max_fall_speed`. Ability flags widen the envelope.

use crate::model::JumpPhysicsData;

pub const GRAVITY: f32 = 9.81;

const DOUBLE_JUMP_BONUS: f32 = 0.5;
const WALL_JUMP_HEIGHT_BONUS: f32 = 0.25;
const GLIDE_DISTANCE_BONUS: f32 = 0.5;
pub const DASH_DISTANCE_BONUS: f32 = 2.0;

const EPSILON: f32 = 1e-4;

/// Launch parameters of a solved jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpArc {
    /// Radians from +x; leftward jumps land in the second quadrant.
    pub angle: f32,
    pub velocity: f32,
}

/// Effective (height, distance) of a jump toward a target `dy` above the launch point.
pub fn envelope(physics: &JumpPhysicsData, dy: f32) -> (f32, f32) {
    let mut height = physics.jump_height;
    let mut distance = physics.jump_distance;
    if physics.has_double_jump {
        height += physics.jump_height * DOUBLE_JUMP_BONUS;
        distance += physics.jump_distance * DOUBLE_JUMP_BONUS;
    }
    if physics.has_wall_jump && dy > 0.0 {
        height += physics.jump_height * WALL_JUMP_HEIGHT_BONUS;
    }
    if physics.has_glide && dy <= 0.0 {
        distance += physics.jump_distance * GLIDE_DISTANCE_BONUS;
    }
    if physics.can_dash {
        distance += DASH_DISTANCE_BONUS;
    }
    (height, distance)
}

/// Platform gap at `difficulty` (fraction of capability, clamped to 0..=1) of the rising
/// envelope. Never larger than the envelope itself.
pub fn calculate_minimum_platform_spacing(physics: &JumpPhysicsData, difficulty: f32) -> (f32, f32) {
    let fraction = if difficulty.is_nan() {
        0.0
    } else {
        difficulty.clamp(0.0, 1.0)
    };
    let (height, distance) = envelope(physics, 1.0);
    (distance * fraction, height * fraction)
}

pub fn is_reachable(from: (f32, f32), to: (f32, f32), physics: &JumpPhysicsData) -> bool {
    calculate_jump_arc(from, to, physics).is_some()
}

/// Solve for a launch reaching `to` from `from`, or `None` if the target lies outside the
/// envelope. Coincident points resolve to a zero-velocity arc.
pub fn calculate_jump_arc(
    from: (f32, f32),
    to: (f32, f32),
    physics: &JumpPhysicsData,
) -> Option<JumpArc> {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx.abs() < EPSILON && dy.abs() < EPSILON {
        return Some(JumpArc {
            angle: 0.0,
            velocity: 0.0,
        });
    }

    let (height, distance) = envelope(physics, dy);
    if (dx * dx + dy * dy).sqrt() > distance + EPSILON || dy > height + EPSILON {
        return None;
    }

    let g = GRAVITY * physics.gravity_scale.max(EPSILON);
    let vy = (2.0 * g * height).sqrt();
    let max_vx = distance * g / (2.0 * vy);

    let t_land = descent_time(vy, g, dy, physics.max_fall_speed);
    if t_land <= 0.0 {
        return None;
    }
    let vx = dx.abs() / t_land;
    if vx > max_vx + EPSILON {
        return None;
    }

    let signed_vx = if dx < 0.0 { -vx } else { vx };
    Some(JumpArc {
        angle: vy.atan2(signed_vx),
        velocity: (vx * vx + vy * vy).sqrt(),
    })
}

/// Time at which an arc launched with `vy` passes downward through `dy`, honouring the
/// fall-speed cap.
fn descent_time(vy: f32, g: f32, dy: f32, max_fall_speed: f32) -> f32 {
    let discriminant = (vy * vy - 2.0 * g * dy).max(0.0);
    let uncapped = (vy + discriminant.sqrt()) / g;

    let fall_cap = max_fall_speed.max(EPSILON);
    let t_cap = (vy + fall_cap) / g;
    if uncapped <= t_cap {
        return uncapped;
    }
    // Past t_cap the body falls at constant speed.
    let y_at_cap = vy * t_cap - 0.5 * g * t_cap * t_cap;
    t_cap + (y_at_cap - dy) / fall_cap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> JumpPhysicsData {
        JumpPhysicsData::new(3.0, 4.0)
    }

    #[test]
    fn flat_gap_within_range() {
        assert!(is_reachable((0.0, 0.0), (3.5, 0.0), &base()));
    }

    #[test]
    fn flat_gap_beyond_range() {
        assert!(!is_reachable((0.0, 0.0), (5.0, 0.0), &base()));
    }

    #[test]
    fn coincident_points_are_reachable() {
        assert!(is_reachable((2.0, 2.0), (2.0, 2.0), &base()));
    }

    #[test]
    fn too_high_is_unreachable() {
        assert!(!is_reachable((0.0, 0.0), (0.5, 3.5), &base()));
        assert!(is_reachable((0.0, 0.0), (0.5, 2.5), &base()));
    }

    #[test]
    fn straight_line_bound_holds_for_every_direction() {
        let physics = base();
        let (_, reach) = envelope(&physics, 0.0);
        for step in 0..36 {
            let theta = step as f32 * std::f32::consts::TAU / 36.0;
            let target = (theta.cos() * (reach + 0.5), theta.sin() * (reach + 0.5));
            assert!(!is_reachable((0.0, 0.0), target, &physics));
        }
    }

    #[test]
    fn double_jump_extends_reach() {
        let physics = base().with_abilities(crate::model::Ability::DOUBLE_JUMP);
        assert!(is_reachable((0.0, 0.0), (5.0, 0.0), &physics));
        assert!(is_reachable((0.0, 0.0), (1.0, 4.0), &physics));
    }

    #[test]
    fn dash_extends_distance() {
        let mut physics = base();
        physics.can_dash = true;
        assert!(is_reachable((0.0, 0.0), (5.5, 0.0), &physics));
    }

    #[test]
    fn leftward_arc_points_left() {
        let arc = calculate_jump_arc((0.0, 0.0), (-3.0, 0.0), &base()).unwrap();
        assert!(arc.angle > std::f32::consts::FRAC_PI_2);
        assert!(arc.velocity > 0.0);
    }

    #[test]
    fn spacing_is_scaled_and_bounded() {
        let physics = base();
        let (dx, dy) = calculate_minimum_platform_spacing(&physics, 0.7);
        assert!((dx - 2.8).abs() < 1e-4);
        assert!((dy - 2.1).abs() < 1e-4);
        let (max_dx, max_dy) = calculate_minimum_platform_spacing(&physics, 5.0);
        assert_eq!((max_dx, max_dy), (4.0, 3.0));
    }

    #[test]
    fn spacing_at_target_difficulty_is_traversable() {
        let physics = base();
        let (dx, dy) = calculate_minimum_platform_spacing(&physics, 0.7);
        assert!(is_reachable((0.0, 0.0), (dx, 0.0), &physics));
        assert!(is_reachable((0.0, 0.0), (0.0, dy), &physics));
        assert!(is_reachable((0.0, 0.0), (dx, dy), &physics));
    }

    #[test]
    fn drops_honour_fall_cap() {
        let mut physics = base();
        physics.max_fall_speed = 2.0;
        // Slow falling lengthens air time, so a modest drop carries further.
        assert!(is_reachable((0.0, 0.0), (3.8, -1.0), &physics));
    }
}
