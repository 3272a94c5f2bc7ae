use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy_ecs::resource::Resource;

use crate::error::GenError;
use crate::model::{StageReport, WorldGraph};

/// The graph under construction. Stages are its only writers.
#[derive(Resource, Debug, Clone)]
pub struct GraphResource(pub WorldGraph);

/// Per-step bookkeeping; reset before every `GenStep` run.
#[derive(Resource, Debug, Clone, Default)]
pub struct StepState {
    /// A stage system ran during this step.
    pub advanced: bool,
}

/// Reports of the stages completed so far, in completion order.
#[derive(Resource, Debug, Clone, Default)]
pub struct StageLog(pub Vec<StageReport>);

/// Error raised by the stage that ran this step, if any.
#[derive(Resource, Debug, Clone, Default)]
pub struct PipelineFailure(pub Option<GenError>);

pub type StageCallback = Box<dyn Fn(&StageReport) + Send + Sync>;

/// Host hook fired once per completed stage.
#[derive(Resource, Default)]
pub struct StageObserver(pub Option<StageCallback>);

/// Shared cancellation flag. Clones observe the same flag, so a host can cancel from an
/// observer callback or another thread; the pipeline stops before the next stage.
#[derive(Resource, Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
