use serde::{Deserialize, Serialize};

use super::physics::JumpPhysicsData;
use crate::error::ConfigError;

/// How far rule randomization overrides the authored defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomizationMode {
    /// Authored polarity mask and upgrade set.
    None,
    /// Biome polarities randomized, upgrades authored.
    #[default]
    Partial,
    /// Both randomized.
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    pub width: i32,
    pub height: i32,
}

impl WorldSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn min_side(&self) -> i32 {
        self.width.min(self.height)
    }
}

/// Subdivision parameters for districts → sectors → rooms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Side length of a district's square footprint, in tiles.
    pub district_extent: i32,
    pub min_sectors: u32,
    pub max_sectors: u32,
    pub min_rooms: u32,
    pub max_rooms: u32,
    pub min_room_width: i32,
    pub min_room_height: i32,
    /// Chance an untyped room becomes a treasure room.
    pub treasure_chance: f64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            district_extent: 64,
            min_sectors: 2,
            max_sectors: 4,
            min_rooms: 2,
            max_rooms: 4,
            min_room_width: 8,
            min_room_height: 6,
            treasure_chance: 0.15,
        }
    }
}

/// Secret-area layering for the weighted tile generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretAreaConfig {
    /// Fraction of room area given over to secrets.
    pub secret_area_percentage: f32,
    pub min_secret_width: i32,
    pub min_secret_height: i32,
    pub max_secret_width: i32,
    pub max_secret_height: i32,
    pub use_alternate_routes: bool,
    pub use_destructible_walls: bool,
}

impl Default for SecretAreaConfig {
    fn default() -> Self {
        Self {
            secret_area_percentage: 0.15,
            min_secret_width: 2,
            min_secret_height: 2,
            max_secret_width: 4,
            max_secret_height: 4,
            use_alternate_routes: true,
            use_destructible_walls: true,
        }
    }
}

/// Root parameters of a generation run. Read-only once a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfiguration {
    pub seed: u32,
    pub world_size: WorldSize,
    /// Number of top-level districts to create, hub included.
    pub target_sector_count: u32,
    pub randomization_mode: RandomizationMode,
    /// Hard cap on districts regardless of the target.
    pub max_districts: u32,
    /// Bound on WFC backtracking before falling back.
    pub wfc_retry_cap: u32,
    pub hierarchy: HierarchyConfig,
    pub physics: JumpPhysicsData,
    pub secrets: SecretAreaConfig,
}

impl Default for WorldConfiguration {
    fn default() -> Self {
        Self {
            seed: 42,
            world_size: WorldSize::new(50, 50),
            target_sector_count: 5,
            randomization_mode: RandomizationMode::default(),
            max_districts: 24,
            wfc_retry_cap: 64,
            hierarchy: HierarchyConfig::default(),
            physics: JumpPhysicsData::default(),
            secrets: SecretAreaConfig::default(),
        }
    }
}

impl WorldConfiguration {
    pub fn new(seed: u32, world_size: WorldSize, target_sector_count: u32) -> Self {
        Self {
            seed,
            world_size,
            target_sector_count,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Districts the run will create, hub included.
    pub fn district_count(&self) -> u32 {
        self.target_sector_count.min(self.max_districts)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world_size.width <= 0 || self.world_size.height <= 0 {
            return Err(ConfigError::InvalidWorldSize {
                width: self.world_size.width,
                height: self.world_size.height,
            });
        }
        if self.target_sector_count == 0 || self.max_districts == 0 {
            return Err(ConfigError::InvalidTargetCount);
        }
        let cells = i64::from(self.world_size.width) * i64::from(self.world_size.height);
        if cells < i64::from(self.district_count()) {
            return Err(ConfigError::WorldTooSmall {
                cells,
                districts: self.district_count(),
            });
        }
        let h = &self.hierarchy;
        check_range("sectors", h.min_sectors, h.max_sectors)?;
        check_range("rooms", h.min_rooms, h.max_rooms)?;
        if let Some(field) = self.physics.invalid_field() {
            return Err(ConfigError::InvalidPhysics(field));
        }
        if !(0.0..=1.0).contains(&self.secrets.secret_area_percentage) {
            return Err(ConfigError::InvalidSecretPercentage(
                self.secrets.secret_area_percentage,
            ));
        }
        if !(0.0..=1.0).contains(&h.treasure_chance) {
            return Err(ConfigError::InvalidChance(h.treasure_chance));
        }

        // The densest subdivision must still leave every room at its minimum size.
        let sector_side = grid_side(h.max_sectors);
        let room_side = grid_side(h.max_rooms);
        let room_span = h.district_extent / sector_side / room_side;
        if h.min_room_width <= 0
            || h.min_room_height <= 0
            || room_span < h.min_room_width
            || room_span < h.min_room_height
        {
            return Err(ConfigError::ExtentTooSmall {
                extent: h.district_extent,
                min_width: h.min_room_width,
                min_height: h.min_room_height,
            });
        }

        // District coordinates reach `side / 2` from the hub; the far edge of the outermost
        // district footprint must still be a valid tile coordinate.
        let half_span = i64::from(self.world_size.width.max(self.world_size.height) / 2);
        if (half_span + 1) * i64::from(h.district_extent) > i64::from(i32::MAX) {
            return Err(ConfigError::WorldTooLarge {
                width: self.world_size.width,
                height: self.world_size.height,
                extent: h.district_extent,
            });
        }
        Ok(())
    }
}

/// Side of the square grid that holds `count` cells.
pub(crate) fn grid_side(count: u32) -> i32 {
    (count.max(1) as f64).sqrt().ceil() as i32
}

fn check_range(name: &'static str, min: u32, max: u32) -> Result<(), ConfigError> {
    if min == 0 || min > max {
        Err(ConfigError::InvalidRange { name, min, max })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(WorldConfiguration::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_world() {
        let config = WorldConfiguration::new(1, WorldSize::new(0, 10), 5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWorldSize { width: 0, height: 10 })
        ));
    }

    #[test]
    fn rejects_zero_target() {
        let config = WorldConfiguration::new(1, WorldSize::new(10, 10), 0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidTargetCount));
    }

    #[test]
    fn rejects_world_smaller_than_district_count() {
        let config = WorldConfiguration::new(1, WorldSize::new(2, 2), 5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::WorldTooSmall {
                cells: 4,
                districts: 5
            })
        );
    }

    #[test]
    fn rejects_inverted_range() {
        let mut config = WorldConfiguration::default();
        config.hierarchy.min_rooms = 5;
        config.hierarchy.max_rooms = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRange { name: "rooms", .. })
        ));
    }

    #[test]
    fn rejects_cramped_districts() {
        let mut config = WorldConfiguration::default();
        config.hierarchy.district_extent = 20;
        assert!(matches!(config.validate(), Err(ConfigError::ExtentTooSmall { .. })));
    }

    #[test]
    fn rejects_treasure_chance_outside_unit_range() {
        for chance in [f64::NAN, -0.1, 1.5] {
            let mut config = WorldConfiguration::default();
            config.hierarchy.treasure_chance = chance;
            assert!(matches!(config.validate(), Err(ConfigError::InvalidChance(_))));
        }
        let mut config = WorldConfiguration::default();
        config.hierarchy.treasure_chance = 1.0;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn rejects_worlds_beyond_tile_range() {
        let config = WorldConfiguration::new(1, WorldSize::new(200_000_000, 200_000_000), 5);
        assert_eq!(
            config.validate(),
            Err(ConfigError::WorldTooLarge {
                width: 200_000_000,
                height: 200_000_000,
                extent: 64,
            })
        );
        // Largest even side whose outer footprint still ends inside i32 at extent 64.
        let edge = WorldConfiguration::new(1, WorldSize::new(67_108_860, 10), 5);
        assert_eq!(edge.validate(), Ok(()));
        let over = WorldConfiguration::new(1, WorldSize::new(67_108_862, 10), 5);
        assert!(matches!(over.validate(), Err(ConfigError::WorldTooLarge { .. })));
    }

    #[test]
    fn district_count_is_capped() {
        let config = WorldConfiguration::new(1, WorldSize::new(50, 50), 100);
        assert_eq!(config.district_count(), 24);
    }

    #[test]
    fn json_fills_defaults() {
        let config = WorldConfiguration::from_json(r#"{"seed": 7, "target_sector_count": 9}"#)
            .expect("valid config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.target_sector_count, 9);
        assert_eq!(config.world_size, WorldSize::new(50, 50));
        assert_eq!(config.hierarchy, HierarchyConfig::default());
    }

    #[test]
    fn json_errors_are_reported() {
        assert!(matches!(
            WorldConfiguration::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            WorldConfiguration::from_json(r#"{"world_size": {"width": -1, "height": 5}}"#),
            Err(ConfigError::InvalidWorldSize { .. })
        ));
    }

    #[test]
    fn grid_side_rounds_up() {
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(0), 1);
    }
}
