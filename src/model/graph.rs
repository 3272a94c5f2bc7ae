use std::collections::{BTreeMap, BTreeSet};

use super::biome::Biome;
use super::config::WorldConfiguration;
use super::connection::{BakedEdge, Connection};
use super::gate::GateCondition;
use super::hierarchy::{DistrictData, RoomData, SectorData, WfcState, WorldRuleSet};
use super::node::{GridCoord, IntRect, NodeId, NodeLevel};
use super::room::{RoomGenerationRequest, RoomLayout};
use super::stage::{GenStage, StageReport};
use crate::error::{ConfigError, GenError};
use crate::id::IdGenerator;

/// The world graph of one generation run. Every collection is keyed by node value and
/// iterated in id order, so a run's output depends on nothing but its configuration.
///
/// Each field is written by exactly one stage (noted per field); later stages only read it.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldGraph {
    pub config: WorldConfiguration,
    /// Bootstrap, hierarchy.
    pub nodes: BTreeMap<u32, NodeId>,
    /// Bootstrap, layout (placement), hierarchy (bounds, sectors).
    pub districts: BTreeMap<u32, DistrictData>,
    /// Hierarchy.
    pub sectors: BTreeMap<u32, SectorData>,
    /// Hierarchy.
    pub rooms: BTreeMap<u32, RoomData>,
    /// Layout.
    pub baked_edges: Vec<BakedEdge>,
    /// Connection builder.
    pub adjacency: BTreeMap<u32, Vec<Connection>>,
    /// Rule randomization.
    pub rules: Option<WorldRuleSet>,
    /// Rule randomization.
    pub gates: BTreeMap<u32, GateCondition>,
    /// District WFC.
    pub biomes: BTreeMap<u32, Biome>,
    /// District WFC.
    pub wfc_states: BTreeMap<u32, WfcState>,
    /// Room generation.
    pub requests: BTreeMap<u32, RoomGenerationRequest>,
    /// Room generation.
    pub room_layouts: BTreeMap<u32, RoomLayout>,
    /// Completion markers.
    pub completed: BTreeMap<GenStage, StageReport>,
    pub(crate) id_gen: IdGenerator,
}

impl WorldGraph {
    /// Graph with no nodes. Callers add districts themselves.
    pub fn empty(config: WorldConfiguration) -> Self {
        Self {
            config,
            nodes: BTreeMap::new(),
            districts: BTreeMap::new(),
            sectors: BTreeMap::new(),
            rooms: BTreeMap::new(),
            baked_edges: Vec::new(),
            adjacency: BTreeMap::new(),
            rules: None,
            gates: BTreeMap::new(),
            biomes: BTreeMap::new(),
            wfc_states: BTreeMap::new(),
            requests: BTreeMap::new(),
            room_layouts: BTreeMap::new(),
            completed: BTreeMap::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Validate the configuration and create the hub (placed at the origin) plus the
    /// remaining districts pending placement.
    pub fn bootstrap(config: WorldConfiguration) -> Result<Self, ConfigError> {
        config.validate()?;
        let count = config.district_count();
        let mut graph = Self::empty(config);
        graph.add_district(true);
        for _ in 1..count {
            graph.add_district(false);
        }
        Ok(graph)
    }

    /// Like [`bootstrap`](Self::bootstrap) but with exactly `pending` districts waiting for
    /// layout, regardless of the configured target.
    pub fn with_pending_districts(
        config: WorldConfiguration,
        pending: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let cells = i64::from(config.world_size.width) * i64::from(config.world_size.height);
        let districts = pending.saturating_add(1);
        if cells < i64::from(districts) {
            return Err(ConfigError::WorldTooSmall { cells, districts });
        }
        let mut graph = Self::empty(config);
        graph.add_district(true);
        for _ in 0..pending {
            graph.add_district(false);
        }
        Ok(graph)
    }

    /// Add a district at the origin. The hub is placed immediately; others wait for layout.
    pub fn add_district(&mut self, is_hub: bool) -> u32 {
        let id = self.id_gen.next_id();
        self.nodes.insert(id, NodeId::district(id, GridCoord::ORIGIN));
        self.districts.insert(
            id,
            DistrictData {
                node_id: id,
                is_hub,
                placed: is_hub,
                seed: 0,
                bounds: IntRect::default(),
                sectors: Vec::new(),
            },
        );
        id
    }

    /// Allocate a sector or room under `parent_id`.
    ///
    /// Fails if the parent does not exist at the level directly above `level`.
    pub fn add_child(
        &mut self,
        level: NodeLevel,
        parent_id: u32,
        coordinates: GridCoord,
    ) -> Result<u32, GenError> {
        let expected = level.parent_level().ok_or_else(|| {
            GenError::Invariant(format!("{level:?} nodes cannot have a parent"))
        })?;
        match self.nodes.get(&parent_id) {
            Some(parent) if parent.level == expected => {}
            Some(parent) => {
                return Err(GenError::Invariant(format!(
                    "parent {parent_id} is a {:?}, expected {expected:?}",
                    parent.level
                )));
            }
            None => {
                return Err(GenError::Invariant(format!(
                    "parent {parent_id} does not exist"
                )));
            }
        }
        let id = self.id_gen.next_id();
        self.nodes
            .insert(id, NodeId::child(id, level, parent_id, coordinates));
        Ok(id)
    }

    pub fn hub_id(&self) -> Option<u32> {
        self.districts.values().find(|d| d.is_hub).map(|d| d.node_id)
    }

    pub fn coordinates(&self, node: u32) -> Option<GridCoord> {
        self.nodes.get(&node).map(|n| n.coordinates)
    }

    pub fn is_complete(&self, stage: GenStage) -> bool {
        self.completed.contains_key(&stage)
    }

    pub fn report(&self, stage: GenStage) -> Option<&StageReport> {
        self.completed.get(&stage)
    }

    /// Stage gate. `Ok(true)` means the stage already ran and must be a no-op.
    pub fn begin_stage(&self, stage: GenStage) -> Result<bool, GenError> {
        if let Some(missing) = stage.prerequisite().filter(|p| !self.is_complete(*p)) {
            return Err(GenError::StageOutOfOrder { stage, missing });
        }
        Ok(self.is_complete(stage))
    }

    /// Insert a stage's completion marker.
    pub fn finish_stage(&mut self, report: StageReport) -> StageReport {
        tracing::info!(
            stage = %report.stage,
            nodes = report.nodes,
            edges = report.edges,
            "stage complete"
        );
        self.completed.insert(report.stage, report);
        report
    }

    /// Connections leaving `node`.
    pub fn connections(&self, node: u32) -> &[Connection] {
        self.adjacency.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn connection_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    /// Undirected neighbour sets built from every adjacency buffer.
    pub fn undirected_neighbors(&self) -> BTreeMap<u32, BTreeSet<u32>> {
        let mut neighbors: BTreeMap<u32, BTreeSet<u32>> = BTreeMap::new();
        for edges in self.adjacency.values() {
            for edge in edges {
                if edge.from_node_id == edge.to_node_id {
                    continue;
                }
                neighbors
                    .entry(edge.from_node_id)
                    .or_default()
                    .insert(edge.to_node_id);
                neighbors
                    .entry(edge.to_node_id)
                    .or_default()
                    .insert(edge.from_node_id);
            }
        }
        neighbors
    }

    /// Rooms belonging to one district, in id order.
    pub fn rooms_in_district(&self, district: u32) -> impl Iterator<Item = &RoomData> {
        self.rooms.values().filter(move |r| r.district_id == district)
    }
}
