pub mod connections;
pub mod hierarchy;
pub mod jump_arc;
pub mod layout;
pub mod rooms;
pub mod rules;
pub mod selector;
pub mod wfc;

use crate::error::GenError;
use crate::model::{GenStage, StageReport, WorldConfiguration, WorldGraph};

pub use jump_arc::{JumpArc, calculate_jump_arc, calculate_minimum_platform_spacing, is_reachable};
pub use selector::{SelectionInput, select_generator};

/// Run one stage against the graph. `Ok(None)` means it had already completed.
pub fn run_stage(graph: &mut WorldGraph, stage: GenStage) -> Result<Option<StageReport>, GenError> {
    match stage {
        GenStage::DistrictLayout => layout::layout_districts(graph),
        GenStage::ConnectionGraph => connections::build_connections(graph),
        GenStage::RuleRandomization => rules::randomize_rules(graph),
        GenStage::DistrictWfc => wfc::resolve_districts(graph),
        GenStage::SectorHierarchy => hierarchy::build_hierarchy(graph),
        GenStage::RoomGeneration => rooms::generate_rooms(graph),
    }
}

/// Generate a complete world from a configuration.
pub fn generate_world(config: WorldConfiguration) -> Result<WorldGraph, GenError> {
    generate_world_observed(config, &mut |_| {})
}

/// Generate a complete world, calling `observer` once per completed stage.
pub fn generate_world_observed(
    config: WorldConfiguration,
    observer: &mut dyn FnMut(&StageReport),
) -> Result<WorldGraph, GenError> {
    let mut graph = WorldGraph::bootstrap(config)?;
    for stage in GenStage::ALL {
        if let Some(report) = run_stage(&mut graph, stage)? {
            observer(&report);
        }
    }
    Ok(graph)
}
