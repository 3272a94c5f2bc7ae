use bevy_app::App;

use super::resources::{
    CancelToken, GraphResource, PipelineFailure, StageLog, StageObserver, StepState,
};
use super::schedule::{GenStep, configure_gen_schedule};
use crate::error::GenError;
use crate::model::{GenStage, StageReport, WorldConfiguration, WorldGraph};

/// Headless Bevy app that runs the generation stages one at a time.
///
/// Each [`step`](GenPipeline::step) completes at most one stage, so a host can interleave
/// generation with its own frame loop:
/// ```no_run
/// # use metvan_gen::pipeline::GenPipeline;
/// # use metvan_gen::model::WorldConfiguration;
/// let mut pipeline = GenPipeline::new(WorldConfiguration::default())?;
/// while let Some(report) = pipeline.step()? {
///     println!("{} done: {} nodes", report.stage, report.nodes);
/// }
/// let world = pipeline.into_graph()?;
/// # Ok::<(), metvan_gen::error::GenError>(())
/// ```
pub struct GenPipeline {
    app: App,
}

impl GenPipeline {
    /// Validate the configuration and bootstrap the hub and pending districts.
    pub fn new(config: WorldConfiguration) -> Result<Self, GenError> {
        Ok(Self::from_graph(WorldGraph::bootstrap(config)?))
    }

    /// Resume from an existing graph. Stages it already completed are skipped.
    pub fn from_graph(graph: WorldGraph) -> Self {
        let mut app = App::empty();
        app.insert_resource(GraphResource(graph));
        app.init_resource::<StepState>();
        app.init_resource::<StageLog>();
        app.init_resource::<PipelineFailure>();
        app.init_resource::<StageObserver>();
        app.init_resource::<CancelToken>();
        app.add_schedule(configure_gen_schedule());
        Self { app }
    }

    /// Register the per-stage callback, replacing any earlier one.
    pub fn on_stage_complete(&mut self, callback: impl Fn(&StageReport) + Send + Sync + 'static) {
        self.app.world_mut().resource_mut::<StageObserver>().0 = Some(Box::new(callback));
    }

    /// Handle that cancels this pipeline before its next stage.
    pub fn cancel_token(&self) -> CancelToken {
        self.app.world().resource::<CancelToken>().clone()
    }

    pub fn cancel(&self) {
        self.cancel_token().cancel();
    }

    /// Run the next pending stage.
    ///
    /// Returns the stage's report, `Ok(None)` once every stage is complete, or
    /// `Err(Cancelled)` if the pipeline was cancelled with stages still pending.
    pub fn step(&mut self) -> Result<Option<StageReport>, GenError> {
        let Some(next) = self.next_stage() else {
            return Ok(None);
        };
        if self.cancel_token().is_cancelled() {
            tracing::info!(stage = %next, "generation cancelled");
            return Err(GenError::Cancelled(next));
        }

        let world = self.app.world_mut();
        world.resource_mut::<StepState>().advanced = false;
        world.run_schedule(GenStep);
        if let Some(err) = world.resource_mut::<PipelineFailure>().0.take() {
            return Err(err);
        }
        Ok(self.graph().report(next).copied())
    }

    /// Step until every stage is complete.
    pub fn run_to_completion(&mut self) -> Result<(), GenError> {
        while self.step()?.is_some() {}
        Ok(())
    }

    /// First stage without a completion marker.
    pub fn next_stage(&self) -> Option<GenStage> {
        GenStage::ALL
            .into_iter()
            .find(|s| !self.graph().is_complete(*s))
    }

    pub fn is_finished(&self) -> bool {
        self.next_stage().is_none()
    }

    pub fn graph(&self) -> &WorldGraph {
        &self.app.world().resource::<GraphResource>().0
    }

    /// Reports of the stages this pipeline ran, in order.
    pub fn stage_log(&self) -> &[StageReport] {
        &self.app.world().resource::<StageLog>().0
    }

    pub fn into_graph(mut self) -> Result<WorldGraph, GenError> {
        self.app
            .world_mut()
            .remove_resource::<GraphResource>()
            .map(|g| g.0)
            .ok_or_else(|| GenError::Invariant("pipeline lost its graph".into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::model::WorldSize;
    use crate::worldgen::generate_world;

    fn config() -> WorldConfiguration {
        WorldConfiguration::new(42, WorldSize::new(50, 50), 5)
    }

    #[test]
    fn each_step_completes_one_stage_in_order() {
        let mut pipeline = GenPipeline::new(config()).unwrap();
        let mut seen = Vec::new();
        while let Some(report) = pipeline.step().unwrap() {
            seen.push(report.stage);
        }
        assert_eq!(seen, GenStage::ALL.to_vec());
        assert!(pipeline.is_finished());
        assert_eq!(pipeline.step().unwrap(), None);
    }

    #[test]
    fn pipeline_matches_direct_generation() {
        let mut pipeline = GenPipeline::new(config()).unwrap();
        pipeline.run_to_completion().unwrap();
        let stepped = pipeline.into_graph().unwrap();
        let direct = generate_world(config()).unwrap();
        assert_eq!(stepped, direct);
    }

    #[test]
    fn observer_fires_once_per_stage() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut pipeline = GenPipeline::new(config()).unwrap();
        pipeline.on_stage_complete(move |report| sink.lock().unwrap().push(report.stage));
        pipeline.run_to_completion().unwrap();
        assert_eq!(*seen.lock().unwrap(), GenStage::ALL.to_vec());
        assert_eq!(pipeline.stage_log().len(), GenStage::ALL.len());
    }

    #[test]
    fn cancel_stops_between_stages() {
        let mut pipeline = GenPipeline::new(config()).unwrap();
        let token = pipeline.cancel_token();
        pipeline.on_stage_complete(move |report| {
            if report.stage == GenStage::ConnectionGraph {
                token.cancel();
            }
        });
        let err = pipeline.run_to_completion().unwrap_err();
        assert_eq!(err, GenError::Cancelled(GenStage::RuleRandomization));
        let graph = pipeline.graph();
        assert!(graph.is_complete(GenStage::ConnectionGraph));
        assert!(!graph.is_complete(GenStage::RuleRandomization));
        assert!(graph.biomes.is_empty());
    }

    #[test]
    fn resumed_pipeline_skips_completed_stages() {
        let mut first = GenPipeline::new(config()).unwrap();
        first.step().unwrap();
        first.step().unwrap();
        let partial = first.into_graph().unwrap();

        let mut resumed = GenPipeline::from_graph(partial);
        assert_eq!(resumed.next_stage(), Some(GenStage::RuleRandomization));
        resumed.run_to_completion().unwrap();
        assert_eq!(resumed.stage_log().len(), 4);
        assert_eq!(resumed.into_graph().unwrap(), generate_world(config()).unwrap());
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let bad = WorldConfiguration::new(1, WorldSize::new(0, 0), 5);
        assert!(matches!(GenPipeline::new(bad), Err(GenError::Config(_))));
    }
}
