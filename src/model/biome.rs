use serde::{Deserialize, Serialize};

use super::polarity::Polarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomeType {
    Unknown,
    HubArea,
    TransitionZone,
    AncientRuins,
    SolarPlains,
    CrystalCaverns,
    SkyGardens,
    ShadowRealms,
    DeepUnderwater,
    VoidChambers,
    Abyss,
    VolcanicCore,
    PowerPlant,
    PlasmaFields,
    FrozenWastes,
    IceCatacombs,
    CryogenicLabs,
    IcyCanyon,
    Tundra,
    Forest,
    Mountains,
    Desert,
    Cavern,
    Sky,
    StormSpire,
    Overgrowth,
    FungalGrotto,
    Factory,
    DataCore,
}

impl BiomeType {
    pub const ALL: [BiomeType; 29] = [
        BiomeType::Unknown,
        BiomeType::HubArea,
        BiomeType::TransitionZone,
        BiomeType::AncientRuins,
        BiomeType::SolarPlains,
        BiomeType::CrystalCaverns,
        BiomeType::SkyGardens,
        BiomeType::ShadowRealms,
        BiomeType::DeepUnderwater,
        BiomeType::VoidChambers,
        BiomeType::Abyss,
        BiomeType::VolcanicCore,
        BiomeType::PowerPlant,
        BiomeType::PlasmaFields,
        BiomeType::FrozenWastes,
        BiomeType::IceCatacombs,
        BiomeType::CryogenicLabs,
        BiomeType::IcyCanyon,
        BiomeType::Tundra,
        BiomeType::Forest,
        BiomeType::Mountains,
        BiomeType::Desert,
        BiomeType::Cavern,
        BiomeType::Sky,
        BiomeType::StormSpire,
        BiomeType::Overgrowth,
        BiomeType::FungalGrotto,
        BiomeType::Factory,
        BiomeType::DataCore,
    ];

    /// (primary, secondary) polarity of the biome.
    pub fn polarities(self) -> (Polarity, Polarity) {
        match self {
            BiomeType::Unknown
            | BiomeType::HubArea
            | BiomeType::TransitionZone
            | BiomeType::AncientRuins => (Polarity::NONE, Polarity::NONE),
            BiomeType::SolarPlains => (Polarity::SUN, Polarity::NONE),
            BiomeType::CrystalCaverns => (Polarity::SUN, Polarity::EARTH),
            BiomeType::SkyGardens => (Polarity::SUN, Polarity::WIND),
            BiomeType::ShadowRealms => (Polarity::MOON, Polarity::NONE),
            BiomeType::DeepUnderwater => (Polarity::MOON, Polarity::COLD),
            BiomeType::VoidChambers => (Polarity::MOON, Polarity::TECH),
            BiomeType::Abyss => (Polarity::MOON, Polarity::EARTH),
            BiomeType::VolcanicCore => (Polarity::HEAT, Polarity::EARTH),
            BiomeType::PowerPlant => (Polarity::HEAT, Polarity::TECH),
            BiomeType::PlasmaFields => (Polarity::HEAT, Polarity::SUN),
            BiomeType::FrozenWastes => (Polarity::COLD, Polarity::NONE),
            BiomeType::IceCatacombs => (Polarity::COLD, Polarity::MOON),
            BiomeType::CryogenicLabs => (Polarity::COLD, Polarity::TECH),
            BiomeType::IcyCanyon => (Polarity::COLD, Polarity::WIND),
            BiomeType::Tundra => (Polarity::COLD, Polarity::EARTH),
            BiomeType::Forest => (Polarity::EARTH, Polarity::LIFE),
            BiomeType::Mountains => (Polarity::EARTH, Polarity::WIND),
            BiomeType::Desert => (Polarity::EARTH, Polarity::HEAT),
            BiomeType::Cavern => (Polarity::EARTH, Polarity::NONE),
            BiomeType::Sky => (Polarity::WIND, Polarity::NONE),
            BiomeType::StormSpire => (Polarity::WIND, Polarity::TECH),
            BiomeType::Overgrowth => (Polarity::LIFE, Polarity::NONE),
            BiomeType::FungalGrotto => (Polarity::LIFE, Polarity::MOON),
            BiomeType::Factory => (Polarity::TECH, Polarity::NONE),
            BiomeType::DataCore => (Polarity::TECH, Polarity::LIFE),
        }
    }

    /// Base difficulty multiplier; neutral biomes are easiest.
    pub fn base_difficulty(self) -> f32 {
        match self {
            BiomeType::Unknown | BiomeType::HubArea => 0.5,
            BiomeType::TransitionZone | BiomeType::AncientRuins => 0.8,
            BiomeType::SolarPlains | BiomeType::Forest | BiomeType::Overgrowth => 1.0,
            BiomeType::CrystalCaverns
            | BiomeType::SkyGardens
            | BiomeType::Cavern
            | BiomeType::Mountains
            | BiomeType::Desert
            | BiomeType::Tundra
            | BiomeType::Sky
            | BiomeType::FungalGrotto
            | BiomeType::Factory => 1.2,
            BiomeType::ShadowRealms
            | BiomeType::DeepUnderwater
            | BiomeType::FrozenWastes
            | BiomeType::IceCatacombs
            | BiomeType::IcyCanyon
            | BiomeType::PowerPlant
            | BiomeType::StormSpire
            | BiomeType::DataCore => 1.5,
            BiomeType::VoidChambers
            | BiomeType::Abyss
            | BiomeType::VolcanicCore
            | BiomeType::PlasmaFields
            | BiomeType::CryogenicLabs => 1.8,
        }
    }

    /// Biomes without a polarity of their own; compatible with any neighbour.
    pub fn is_neutral(self) -> bool {
        self.polarities().0 == Polarity::NONE
    }

    pub fn is_sky(self) -> bool {
        matches!(
            self,
            BiomeType::Sky | BiomeType::SkyGardens | BiomeType::StormSpire
        )
    }

    /// Ground-dominated biomes that read best as heightmapped terrain.
    pub fn is_terrain(self) -> bool {
        matches!(
            self,
            BiomeType::Forest
                | BiomeType::Mountains
                | BiomeType::Desert
                | BiomeType::Tundra
                | BiomeType::Cavern
                | BiomeType::SolarPlains
                | BiomeType::FrozenWastes
                | BiomeType::Overgrowth
        )
    }
}

/// Environmental assignment of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub biome_type: BiomeType,
    pub primary_polarity: Polarity,
    pub secondary_polarity: Polarity,
    /// Clamped to 0..=1.
    pub polarity_strength: f32,
    /// Floored at 0.1.
    pub difficulty_modifier: f32,
}

impl Biome {
    pub const MIN_DIFFICULTY: f32 = 0.1;

    pub fn new(
        biome_type: BiomeType,
        primary_polarity: Polarity,
        secondary_polarity: Polarity,
        polarity_strength: f32,
        difficulty_modifier: f32,
    ) -> Self {
        Self {
            biome_type,
            primary_polarity,
            secondary_polarity,
            polarity_strength: polarity_strength.clamp(0.0, 1.0),
            difficulty_modifier: difficulty_modifier.max(Self::MIN_DIFFICULTY),
        }
    }

    /// Biome with its table polarities and base difficulty.
    pub fn from_type(biome_type: BiomeType, polarity_strength: f32) -> Self {
        let (primary, secondary) = biome_type.polarities();
        Self::new(
            biome_type,
            primary,
            secondary,
            polarity_strength,
            biome_type.base_difficulty(),
        )
    }

    pub fn polarity_mask(&self) -> Polarity {
        self.primary_polarity | self.secondary_polarity
    }

    /// A biome is compatible with a requirement if the requirement is a sentinel or it
    /// intersects either polarity.
    pub fn is_compatible_with(&self, required: Polarity) -> bool {
        if required.is_sentinel() {
            return true;
        }
        self.primary_polarity.intersects(required) || self.secondary_polarity.intersects(required)
    }

    /// Whether two biomes may sit on either side of a connection.
    pub fn is_adjacent_compatible(&self, other: &Biome) -> bool {
        self.biome_type.is_neutral()
            || other.biome_type.is_neutral()
            || self.polarity_mask().intersects(other.polarity_mask())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_requirements_always_compatible() {
        for biome_type in BiomeType::ALL {
            let biome = Biome::from_type(biome_type, 1.0);
            assert!(biome.is_compatible_with(Polarity::ANY));
            assert!(biome.is_compatible_with(Polarity::NONE));
        }
    }

    #[test]
    fn compatibility_iff_intersection() {
        for biome_type in BiomeType::ALL {
            let biome = Biome::from_type(biome_type, 1.0);
            for p in Polarity::SINGLES {
                let expected = biome.primary_polarity.intersects(p)
                    || biome.secondary_polarity.intersects(p);
                assert_eq!(biome.is_compatible_with(p), expected, "{biome_type:?} vs {p:?}");
            }
        }
    }

    #[test]
    fn constructor_clamps() {
        let biome = Biome::new(BiomeType::Sky, Polarity::WIND, Polarity::NONE, 3.0, -1.0);
        assert_eq!(biome.polarity_strength, 1.0);
        assert_eq!(biome.difficulty_modifier, Biome::MIN_DIFFICULTY);
    }

    #[test]
    fn neutral_biomes_are_adjacent_to_everything() {
        let hub = Biome::from_type(BiomeType::HubArea, 0.0);
        let lava = Biome::from_type(BiomeType::VolcanicCore, 1.0);
        let ice = Biome::from_type(BiomeType::FrozenWastes, 1.0);
        assert!(hub.is_adjacent_compatible(&lava));
        assert!(lava.is_adjacent_compatible(&hub));
        assert!(!lava.is_adjacent_compatible(&ice));
    }

    #[test]
    fn every_polarity_has_a_biome() {
        for p in Polarity::SINGLES {
            assert!(
                BiomeType::ALL.iter().any(|b| b.polarities().0 == p),
                "{p:?} has no primary biome"
            );
        }
    }
}
