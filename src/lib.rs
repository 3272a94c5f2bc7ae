pub mod error;
pub mod flush;
pub mod id;
pub mod model;
pub mod pipeline;
pub mod seed;
pub mod worldgen;

pub use error::{ConfigError, GenError};
pub use flush::flush_to_jsonl;
pub use id::IdGenerator;
pub use model::{WorldConfiguration, WorldGraph};
pub use pipeline::GenPipeline;
pub use worldgen::{generate_world, generate_world_observed};
