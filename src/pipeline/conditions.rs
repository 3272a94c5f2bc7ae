use bevy_ecs::system::Res;

use super::resources::{CancelToken, GraphResource, PipelineFailure, StepState};
use crate::model::{GenStage, WorldGraph};

/// Internal check for testability.
fn ready_check(graph: &WorldGraph, stage: GenStage, advanced: bool, cancelled: bool) -> bool {
    !cancelled
        && !advanced
        && !graph.is_complete(stage)
        && stage.prerequisite().is_none_or(|p| graph.is_complete(p))
}

/// Run condition for a stage system: its upstream marker exists, its own does not, no
/// other stage has run this step, nothing failed, and the run was not cancelled.
pub fn stage_ready(
    stage: GenStage,
) -> impl FnMut(Res<GraphResource>, Res<StepState>, Res<CancelToken>, Res<PipelineFailure>) -> bool
{
    move |graph: Res<GraphResource>,
          step: Res<StepState>,
          cancel: Res<CancelToken>,
          failure: Res<PipelineFailure>| {
        failure.0.is_none() && ready_check(&graph.0, stage, step.advanced, cancel.is_cancelled())
    }
}
