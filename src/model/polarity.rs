use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Environmental polarity tags. Doubles as a requirement mask on connections and gates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
    pub struct Polarity: u8 {
        const SUN = 1 << 0;
        const MOON = 1 << 1;
        const HEAT = 1 << 2;
        const COLD = 1 << 3;
        const EARTH = 1 << 4;
        const WIND = 1 << 5;
        const LIFE = 1 << 6;
        const TECH = 1 << 7;
    }
}

impl Polarity {
    /// No requirement.
    pub const NONE: Polarity = Polarity::empty();
    /// Matches every requirement.
    pub const ANY: Polarity = Polarity::all();

    pub const SUN_MOON: Polarity = Polarity::SUN.union(Polarity::MOON);
    pub const HEAT_COLD: Polarity = Polarity::HEAT.union(Polarity::COLD);
    pub const EARTH_WIND: Polarity = Polarity::EARTH.union(Polarity::WIND);
    pub const LIFE_TECH: Polarity = Polarity::LIFE.union(Polarity::TECH);

    pub const SINGLES: [Polarity; 8] = [
        Polarity::SUN,
        Polarity::MOON,
        Polarity::HEAT,
        Polarity::COLD,
        Polarity::EARTH,
        Polarity::WIND,
        Polarity::LIFE,
        Polarity::TECH,
    ];

    /// `NONE` or `ANY`. Sentinels never count as a concrete requirement.
    pub fn is_sentinel(self) -> bool {
        self == Polarity::NONE || self == Polarity::ANY
    }

    /// Whether a requirement mask imposes nothing.
    pub fn is_unrestricted(self) -> bool {
        self.is_sentinel()
    }

    /// Whether an available polarity set meets `required`.
    pub fn satisfies(self, required: Polarity) -> bool {
        required.is_unrestricted() || self == Polarity::ANY || self.intersects(required)
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }
}

bitflags! {
    /// Movement and traversal abilities a player can unlock.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
    pub struct Ability: u16 {
        const JUMP = 1 << 0;
        const DOUBLE_JUMP = 1 << 1;
        const WALL_JUMP = 1 << 2;
        const DASH = 1 << 3;
        const GRAPPLE = 1 << 4;
        const GLIDE = 1 << 5;
        const SWIM = 1 << 6;
        const BOMB = 1 << 7;
        const PHASE = 1 << 8;
    }
}

impl Ability {
    pub const SINGLES: [Ability; 9] = [
        Ability::JUMP,
        Ability::DOUBLE_JUMP,
        Ability::WALL_JUMP,
        Ability::DASH,
        Ability::GRAPPLE,
        Ability::GLIDE,
        Ability::SWIM,
        Ability::BOMB,
        Ability::PHASE,
    ];

    /// Abilities the skill-gate generator builds dedicated obstacles for.
    pub const GATE_ABILITIES: Ability = Ability::DASH.union(Ability::WALL_JUMP).union(Ability::GRAPPLE);

    /// Authored default upgrade set.
    pub const DEFAULT_UPGRADES: Ability = Ability::JUMP
        .union(Ability::DOUBLE_JUMP)
        .union(Ability::WALL_JUMP)
        .union(Ability::DASH);

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }
}
