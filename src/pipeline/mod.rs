//! Cooperative, cancellable stage runner built on a headless Bevy app.

pub mod app;
pub mod conditions;
pub mod resources;
pub mod schedule;

pub use app::GenPipeline;
pub use resources::{CancelToken, StageCallback};
pub use schedule::{GenStep, StageSet};
