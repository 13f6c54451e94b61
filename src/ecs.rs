mod profiler;
pub mod systems;
mod types;
mod world;

pub use profiler::{SystemProfiler, SystemTiming};
pub use types::*;
pub use world::{FlareSnapshot, SceneWorld};
