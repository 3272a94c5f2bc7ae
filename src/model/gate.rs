use serde::{Deserialize, Serialize};

use super::polarity::{Ability, Polarity};

/// How strictly a gate blocks a player lacking the requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateSoftness {
    Hard,
    VeryDifficult,
    Difficult,
    Moderate,
    Easy,
    Trivial,
}

impl GateSoftness {
    pub const ALL: [GateSoftness; 6] = [
        GateSoftness::Hard,
        GateSoftness::VeryDifficult,
        GateSoftness::Difficult,
        GateSoftness::Moderate,
        GateSoftness::Easy,
        GateSoftness::Trivial,
    ];

    /// Skill level needed to sequence-break a gate of this softness.
    pub fn default_min_skill(self) -> Option<f32> {
        match self {
            GateSoftness::Hard => None,
            GateSoftness::VeryDifficult => Some(0.9),
            GateSoftness::Difficult => Some(0.75),
            GateSoftness::Moderate => Some(0.5),
            GateSoftness::Easy => Some(0.3),
            GateSoftness::Trivial => Some(0.1),
        }
    }
}

/// Access predicate on a node or edge: polarity plus abilities, with optional skill bypass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateCondition {
    pub required_polarity: Polarity,
    pub required_abilities: Ability,
    pub softness: GateSoftness,
    pub min_skill_level: f32,
    pub is_active: bool,
}

impl GateCondition {
    pub fn new(required_polarity: Polarity, required_abilities: Ability, softness: GateSoftness) -> Self {
        Self {
            required_polarity,
            required_abilities,
            softness,
            min_skill_level: softness.default_min_skill().unwrap_or(1.0),
            is_active: true,
        }
    }

    /// Whether the requirement is met outright, without skill.
    pub fn is_met(&self, polarity: Polarity, abilities: Ability) -> bool {
        polarity.satisfies(self.required_polarity) && abilities.contains(self.required_abilities)
    }

    pub fn can_pass(&self, polarity: Polarity, abilities: Ability, skill_level: f32) -> bool {
        if !self.is_active || self.is_met(polarity, abilities) {
            return true;
        }
        self.softness != GateSoftness::Hard && skill_level >= self.min_skill_level
    }
}
