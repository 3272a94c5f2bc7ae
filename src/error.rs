use thiserror::Error;

use crate::model::GenStage;

/// A `WorldConfiguration` that cannot start a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("world size must be positive, got {width}x{height}")]
    InvalidWorldSize { width: i32, height: i32 },
    #[error("target sector count must be positive")]
    InvalidTargetCount,
    #[error("world of {cells} cells cannot hold {districts} districts")]
    WorldTooSmall { cells: i64, districts: u32 },
    #[error("invalid range for {name}: {min}..={max}")]
    InvalidRange { name: &'static str, min: u32, max: u32 },
    #[error("jump physics field {0} must be positive and finite")]
    InvalidPhysics(&'static str),
    #[error("district extent {extent} cannot hold rooms of at least {min_width}x{min_height}")]
    ExtentTooSmall {
        extent: i32,
        min_width: i32,
        min_height: i32,
    },
    #[error("secret area percentage {0} must lie in 0..=1")]
    InvalidSecretPercentage(f32),
    #[error("treasure chance {0} must lie in 0..=1")]
    InvalidChance(f64),
    #[error("world of {width}x{height} with district extent {extent} exceeds tile coordinate range")]
    WorldTooLarge {
        width: i32,
        height: i32,
        extent: i32,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// Failures that abort a generation run. Sparse data never lands here; only
/// rejected configuration, logic defects, and cancellation do.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("stage {stage} requires {missing} to complete first")]
    StageOutOfOrder { stage: GenStage, missing: GenStage },
    #[error("invariant violated: {0}")]
    Invariant(String),
    #[error("generation cancelled before {0}")]
    Cancelled(GenStage),
}
