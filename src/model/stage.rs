use std::fmt;

use serde::{Deserialize, Serialize};

/// Pipeline stages in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenStage {
    DistrictLayout,
    ConnectionGraph,
    RuleRandomization,
    DistrictWfc,
    SectorHierarchy,
    RoomGeneration,
}

impl GenStage {
    pub const ALL: [GenStage; 6] = [
        GenStage::DistrictLayout,
        GenStage::ConnectionGraph,
        GenStage::RuleRandomization,
        GenStage::DistrictWfc,
        GenStage::SectorHierarchy,
        GenStage::RoomGeneration,
    ];

    /// Stage whose completion marker gates this one.
    pub fn prerequisite(self) -> Option<GenStage> {
        match self {
            GenStage::DistrictLayout => None,
            GenStage::ConnectionGraph => Some(GenStage::DistrictLayout),
            GenStage::RuleRandomization => Some(GenStage::ConnectionGraph),
            GenStage::DistrictWfc => Some(GenStage::RuleRandomization),
            GenStage::SectorHierarchy => Some(GenStage::DistrictWfc),
            GenStage::RoomGeneration => Some(GenStage::SectorHierarchy),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GenStage::DistrictLayout => "district_layout",
            GenStage::ConnectionGraph => "connection_graph",
            GenStage::RuleRandomization => "rule_randomization",
            GenStage::DistrictWfc => "district_wfc",
            GenStage::SectorHierarchy => "sector_hierarchy",
            GenStage::RoomGeneration => "room_generation",
        }
    }
}

impl fmt::Display for GenStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion marker of a stage, carrying what it produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: GenStage,
    pub nodes: usize,
    pub edges: usize,
}

impl StageReport {
    pub fn new(stage: GenStage, nodes: usize, edges: usize) -> Self {
        Self {
            stage,
            nodes,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prerequisites_follow_declaration_order() {
        for pair in GenStage::ALL.windows(2) {
            assert_eq!(pair[1].prerequisite(), Some(pair[0]));
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(GenStage::DistrictLayout.prerequisite(), None);
    }

    #[test]
    fn display_is_snake_case() {
        assert_eq!(GenStage::DistrictWfc.to_string(), "district_wfc");
    }
}
