use serde::{Deserialize, Serialize};

use super::polarity::Ability;

/// Movement envelope used as read-only input to the jump-arc solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpPhysicsData {
    /// Apex height of a single jump, in tiles.
    pub jump_height: f32,
    /// Horizontal range of a single jump on flat ground, in tiles.
    pub jump_distance: f32,
    pub gravity_scale: f32,
    pub max_fall_speed: f32,
    pub has_double_jump: bool,
    pub has_wall_jump: bool,
    pub has_glide: bool,
    pub can_dash: bool,
}

impl JumpPhysicsData {
    pub fn new(jump_height: f32, jump_distance: f32) -> Self {
        Self {
            jump_height,
            jump_distance,
            ..Self::default()
        }
    }

    /// This envelope with the movement flags taken from an ability mask.
    pub fn with_abilities(self, abilities: Ability) -> Self {
        Self {
            has_double_jump: abilities.contains(Ability::DOUBLE_JUMP),
            has_wall_jump: abilities.contains(Ability::WALL_JUMP),
            has_glide: abilities.contains(Ability::GLIDE),
            can_dash: abilities.contains(Ability::DASH),
            ..self
        }
    }

    pub(crate) fn invalid_field(&self) -> Option<&'static str> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.jump_height) {
            Some("jump_height")
        } else if !positive(self.jump_distance) {
            Some("jump_distance")
        } else if !positive(self.gravity_scale) {
            Some("gravity_scale")
        } else if !positive(self.max_fall_speed) {
            Some("max_fall_speed")
        } else {
            None
        }
    }
}

impl Default for JumpPhysicsData {
    fn default() -> Self {
        Self {
            jump_height: 3.0,
            jump_distance: 4.0,
            gravity_scale: 1.0,
            max_fall_speed: 20.0,
            has_double_jump: false,
            has_wall_jump: false,
            has_glide: false,
            can_dash: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abilities_toggle_flags() {
        let physics = JumpPhysicsData::default().with_abilities(Ability::DASH | Ability::GLIDE);
        assert!(physics.can_dash);
        assert!(physics.has_glide);
        assert!(!physics.has_double_jump);
        assert!(!physics.has_wall_jump);
    }

    #[test]
    fn validation_names_first_bad_field() {
        let mut physics = JumpPhysicsData::default();
        assert_eq!(physics.invalid_field(), None);
        physics.gravity_scale = 0.0;
        assert_eq!(physics.invalid_field(), Some("gravity_scale"));
        physics.jump_height = f32::NAN;
        assert_eq!(physics.invalid_field(), Some("jump_height"));
    }
}
