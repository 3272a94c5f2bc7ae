use serde::{Deserialize, Serialize};

use super::config::RandomizationMode;
use super::node::IntRect;
use super::polarity::{Ability, Polarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    Normal,
    Boss,
    Treasure,
    Hub,
    Save,
    Shop,
    Entrance,
    Exit,
}

impl RoomType {
    /// Rooms built around a safe, furnished layout rather than a challenge.
    pub fn is_service(self) -> bool {
        matches!(self, RoomType::Save | RoomType::Shop | RoomType::Hub)
    }
}

/// Per-district WFC progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WfcState {
    #[default]
    Initialized,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictData {
    pub node_id: u32,
    pub is_hub: bool,
    /// Set once the layout pass has frozen the coordinates.
    pub placed: bool,
    pub seed: u64,
    /// Tile footprint; assigned by the hierarchy pass.
    pub bounds: IntRect,
    pub sectors: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorData {
    pub node_id: u32,
    pub district_id: u32,
    pub seed: u64,
    pub bounds: IntRect,
    /// Room grid dimensions (cols, rows).
    pub grid: (i32, i32),
    pub rooms: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomData {
    pub node_id: u32,
    pub sector_id: u32,
    pub district_id: u32,
    pub seed: u64,
    pub bounds: IntRect,
    pub room_type: RoomType,
}

/// World-wide rules derived from the root seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRuleSet {
    pub mode: RandomizationMode,
    /// Polarities biomes may draw from.
    pub biome_polarity_mask: Polarity,
    pub available_upgrades: Ability,
    pub upgrades_randomized: bool,
}

impl WorldRuleSet {
    pub fn authored(mode: RandomizationMode) -> Self {
        Self {
            mode,
            biome_polarity_mask: Polarity::SUN | Polarity::MOON | Polarity::HEAT | Polarity::COLD,
            available_upgrades: Ability::DEFAULT_UPGRADES,
            upgrades_randomized: false,
        }
    }
}
