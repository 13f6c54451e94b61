use std::time::Duration;

/// Frame clock advancing by a constant step per tick; the headless runner drives it at 60 Hz.
pub struct Time {
    step: Duration,
    elapsed: Duration,
    pub delta: Duration,
}

impl Time {
    pub fn fixed(step_seconds: f32) -> Self {
        let step = Duration::from_secs_f32(step_seconds.max(0.0));
        Self { step, elapsed: Duration::ZERO, delta: Duration::ZERO }
    }

    pub fn tick(&mut self) {
        self.delta = self.step;
        self.elapsed += self.step;
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}
