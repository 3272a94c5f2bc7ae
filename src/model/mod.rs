pub mod biome;
pub mod config;
pub mod connection;
pub mod gate;
pub mod graph;
pub mod hierarchy;
pub mod node;
pub mod physics;
pub mod polarity;
pub mod room;
pub mod stage;

pub use biome::{Biome, BiomeType};
pub use config::{
    HierarchyConfig, RandomizationMode, SecretAreaConfig, WorldConfiguration, WorldSize,
};
pub use connection::{BakedEdge, Connection, ConnectionType};
pub use gate::{GateCondition, GateSoftness};
pub use graph::WorldGraph;
pub use hierarchy::{DistrictData, RoomData, RoomType, SectorData, WfcState, WorldRuleSet};
pub use node::{GridCoord, IntRect, NodeId, NodeLevel};
pub use physics::JumpPhysicsData;
pub use polarity::{Ability, Polarity};
pub use room::{
    FeatureKind, JumpConnection, RoomFeature, RoomGenerationRequest, RoomGeneratorType,
    RoomLayout, RoomPipelineStep,
};
pub use stage::{GenStage, StageReport};
