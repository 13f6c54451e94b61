use bevy_ecs::prelude::Resource;

mod appearance;
mod flares;
mod picking;
mod swim;

pub use appearance::*;
pub use flares::*;
pub use picking::*;
pub use swim::*;

#[derive(Resource, Clone, Copy)]
pub struct TimeDelta(pub f32);
