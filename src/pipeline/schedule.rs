use bevy_ecs::schedule::{ExecutorKind, IntoScheduleConfigs, Schedule, ScheduleLabel, SystemSet};
use bevy_ecs::system::{Res, ResMut};

use super::conditions::stage_ready;
use super::resources::{GraphResource, PipelineFailure, StageLog, StageObserver, StepState};
use crate::model::GenStage;
use crate::worldgen::run_stage;

/// Schedule label for one cooperative generation step.
/// Run manually via `app.world_mut().run_schedule(GenStep)`; at most one stage completes
/// per run.
#[derive(ScheduleLabel, Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenStep;

/// One set per pipeline stage, chained in stage order.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum StageSet {
    Layout,
    Connections,
    Rules,
    Wfc,
    Hierarchy,
    Rooms,
}

impl From<GenStage> for StageSet {
    fn from(stage: GenStage) -> Self {
        match stage {
            GenStage::DistrictLayout => StageSet::Layout,
            GenStage::ConnectionGraph => StageSet::Connections,
            GenStage::RuleRandomization => StageSet::Rules,
            GenStage::DistrictWfc => StageSet::Wfc,
            GenStage::SectorHierarchy => StageSet::Hierarchy,
            GenStage::RoomGeneration => StageSet::Rooms,
        }
    }
}

/// System running `stage` against the graph resource and recording the outcome.
fn stage_system(
    stage: GenStage,
) -> impl FnMut(
    ResMut<GraphResource>,
    ResMut<StepState>,
    ResMut<StageLog>,
    ResMut<PipelineFailure>,
    Res<StageObserver>,
) {
    move |mut graph: ResMut<GraphResource>,
          mut step: ResMut<StepState>,
          mut log: ResMut<StageLog>,
          mut failure: ResMut<PipelineFailure>,
          observer: Res<StageObserver>| {
        step.advanced = true;
        match run_stage(&mut graph.0, stage) {
            Ok(Some(report)) => {
                if let Some(callback) = &observer.0 {
                    callback(&report);
                }
                log.0.push(report);
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(%stage, error = %err, "stage failed");
                failure.0 = Some(err);
            }
        }
    }
}

/// Build the `GenStep` schedule. Single-threaded so the graph resource is only ever
/// touched by one stage at a time in a fixed order.
pub fn configure_gen_schedule() -> Schedule {
    let mut schedule = Schedule::new(GenStep);
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.configure_sets(
        (
            StageSet::Layout,
            StageSet::Connections,
            StageSet::Rules,
            StageSet::Wfc,
            StageSet::Hierarchy,
            StageSet::Rooms,
        )
            .chain(),
    );
    for stage in GenStage::ALL {
        schedule.add_systems(
            stage_system(stage)
                .run_if(stage_ready(stage))
                .in_set(StageSet::from(stage)),
        );
    }
    schedule
}
