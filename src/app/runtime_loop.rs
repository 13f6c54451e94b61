use crate::time::Time;

/// Overlay animation tick; the overlay advances once per display frame at 60 Hz.
pub(crate) const OVERLAY_STEP: f32 = 1.0 / 60.0;

pub(crate) struct RuntimeLoop {
    time: Time,
    overlay_accumulator: f32,
    overlay_dt: f32,
}

pub(crate) struct RuntimeTick {
    pub dt: f32,
    pub dropped_backlog: Option<f32>,
}

impl RuntimeLoop {
    pub(crate) fn new(time: Time, overlay_dt: f32) -> Self {
        Self { time, overlay_accumulator: 0.0, overlay_dt }
    }

    pub(crate) fn time(&self) -> &Time {
        &self.time
    }

    pub(crate) fn tick(&mut self, max_backlog: f32) -> RuntimeTick {
        self.time.tick();
        let dt = self.time.delta_seconds();
        self.overlay_accumulator += dt;
        let mut dropped_backlog = None;
        if self.overlay_accumulator > max_backlog {
            dropped_backlog = Some(self.overlay_accumulator - max_backlog);
            self.overlay_accumulator = max_backlog;
        }
        RuntimeTick { dt, dropped_backlog }
    }

    pub(crate) fn pop_overlay_step(&mut self) -> bool {
        if self.overlay_accumulator >= self.overlay_dt {
            self.overlay_accumulator -= self.overlay_dt;
            true
        } else {
            false
        }
    }
}
