use serde::{Deserialize, Serialize};

use super::biome::BiomeType;
use super::hierarchy::RoomType;
use super::node::GridCoord;
use super::polarity::{Ability, Polarity};

/// Room-generation strategies picked by the best-fit matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomGeneratorType {
    PatternDrivenModular,
    ParametricChallenge,
    WeightedTilePrefab,
    VerticalSegment,
    HorizontalCorridor,
    BiomeWeightedTerrain,
    SkyBiomePlatform,
    LinearBranchingCorridor,
    StackedSegment,
    LayeredPlatformCloud,
    BiomeWeightedHeightmap,
}

/// The six passes a room request walks through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPipelineStep {
    BiomeSelection = 1,
    LayoutOrientation = 2,
    GeneratorChoice = 3,
    ContentPass = 4,
    Navigation = 5,
    Validation = 6,
}

impl RoomPipelineStep {
    pub const ALL: [RoomPipelineStep; 6] = [
        RoomPipelineStep::BiomeSelection,
        RoomPipelineStep::LayoutOrientation,
        RoomPipelineStep::GeneratorChoice,
        RoomPipelineStep::ContentPass,
        RoomPipelineStep::Navigation,
        RoomPipelineStep::Validation,
    ];

    pub fn from_index(step: u8) -> Option<Self> {
        Self::ALL.get(usize::from(step).checked_sub(1)?).copied()
    }
}

/// Transient work item for one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGenerationRequest {
    pub room_id: u32,
    pub room_type: RoomType,
    pub generator: Option<RoomGeneratorType>,
    pub target_biome: BiomeType,
    /// Strength of the district biome's pull on this room, 0..=1.
    pub biome_affinity: f32,
    pub target_polarity: Polarity,
    pub available_abilities: Ability,
    pub seed: u64,
    pub aspect_ratio: f32,
    pub skill_gating: bool,
    /// 1..=6; one past the last step once complete.
    pub current_step: u8,
    pub is_complete: bool,
}

impl RoomGenerationRequest {
    pub fn new(room_id: u32, room_type: RoomType, available_abilities: Ability, seed: u64) -> Self {
        Self {
            room_id,
            room_type,
            generator: None,
            target_biome: BiomeType::Unknown,
            biome_affinity: 0.0,
            target_polarity: Polarity::NONE,
            available_abilities,
            seed,
            aspect_ratio: 1.0,
            skill_gating: false,
            current_step: RoomPipelineStep::BiomeSelection as u8,
            is_complete: false,
        }
    }

    pub fn step(&self) -> Option<RoomPipelineStep> {
        if self.is_complete {
            None
        } else {
            RoomPipelineStep::from_index(self.current_step)
        }
    }

    pub fn advance(&mut self) {
        self.current_step += 1;
        if self.current_step > RoomPipelineStep::Validation as u8 {
            self.is_complete = true;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Platform,
    Obstacle,
    Hazard,
    DashGap,
    WallJumpShaft,
    GrapplePoint,
    CombinedGate,
    Powerup,
    SaveStation,
    Collectible,
    SecretArea,
    DestructibleWall,
    AlternateRoute,
    Terrain,
}

/// One typed placement inside a room, in room tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomFeature {
    pub kind: FeatureKind,
    pub position: GridCoord,
    pub width: i32,
    pub height: i32,
    /// Abilities a player needs to get past this feature.
    pub required_abilities: Ability,
}

impl RoomFeature {
    pub fn new(kind: FeatureKind, position: GridCoord, width: i32, height: i32) -> Self {
        Self {
            kind,
            position,
            width,
            height,
            required_abilities: Ability::empty(),
        }
    }

    pub fn requiring(mut self, abilities: Ability) -> Self {
        self.required_abilities = abilities;
        self
    }

    pub fn is_walkable(&self) -> bool {
        matches!(
            self.kind,
            FeatureKind::Platform | FeatureKind::Terrain | FeatureKind::SaveStation
        )
    }
}

/// Recorded jump between two features of a room's feature list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JumpConnection {
    pub from_feature: usize,
    pub to_feature: usize,
    /// Launch angle in radians above horizontal.
    pub angle: f32,
    pub velocity: f32,
}

/// Generated content of one room.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomLayout {
    pub room_id: u32,
    pub generator: Option<RoomGeneratorType>,
    pub features: Vec<RoomFeature>,
    pub jumps: Vec<JumpConnection>,
}

impl RoomLayout {
    pub fn count(&self, kind: FeatureKind) -> usize {
        self.features.iter().filter(|f| f.kind == kind).count()
    }
}
