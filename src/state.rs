use bevy_ecs::prelude::Resource;

/// Year and progress selected on the timeline. `SceneWorld::set_year` is the only writer.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SceneState {
    pub year: i32,
    pub progress: f32,
}

impl SceneState {
    pub fn new(year: i32, progress: f32) -> Self {
        Self { year, progress: progress.clamp(0.0, 1.0) }
    }

    /// Perceptual easing so the early years barely change the visuals.
    pub fn eased_progress(&self) -> f32 {
        eased_progress(self.progress)
    }

    pub fn swim_intensity(&self) -> f32 {
        swim_intensity(self.progress)
    }
}

pub fn eased_progress(progress: f32) -> f32 {
    progress.clamp(0.0, 1.0).powf(1.3)
}

/// Motion slows to half speed as progress reaches 1.
pub fn swim_intensity(progress: f32) -> f32 {
    1.0 - 0.5 * progress.clamp(0.0, 1.0)
}
