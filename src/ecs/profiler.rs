use bevy_ecs::prelude::Resource;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Clone, Copy, Debug)]
pub struct SystemTiming {
    pub name: &'static str,
    pub last_ms: f32,
    pub average_ms: f32,
    pub max_ms: f32,
    pub samples: u64,
}

#[derive(Default)]
struct Accumulator {
    last_ms: f32,
    total_ms: f32,
    max_ms: f32,
    samples: u64,
}

/// Per-system wall time, recorded through scope guards at the top of each system.
#[derive(Resource, Default)]
pub struct SystemProfiler {
    timings: HashMap<&'static str, Accumulator>,
    frames: u64,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_frame(&mut self) {
        self.frames += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scope(&mut self, name: &'static str) -> ProfileScope<'_> {
        ProfileScope { name, profiler: self, start: Instant::now() }
    }

    fn record(&mut self, name: &'static str, ms: f32) {
        let entry = self.timings.entry(name).or_default();
        entry.last_ms = ms;
        entry.max_ms = entry.max_ms.max(ms);
        entry.total_ms += ms;
        entry.samples += 1;
    }

    /// Timings sorted slowest first by average.
    pub fn summaries(&self) -> Vec<SystemTiming> {
        let mut out: Vec<SystemTiming> = self
            .timings
            .iter()
            .map(|(&name, acc)| SystemTiming {
                name,
                last_ms: acc.last_ms,
                average_ms: if acc.samples == 0 { 0.0 } else { acc.total_ms / acc.samples as f32 },
                max_ms: acc.max_ms,
                samples: acc.samples,
            })
            .collect();
        out.sort_by(|a, b| b.average_ms.total_cmp(&a.average_ms));
        out
    }

    pub fn log_summary(&self) {
        log::info!("[profiler] {} frames", self.frames);
        for timing in self.summaries() {
            log::info!(
                "[profiler] {:<28} avg {:.3} ms  max {:.3} ms  ({} samples)",
                timing.name,
                timing.average_ms,
                timing.max_ms,
                timing.samples
            );
        }
    }
}

pub struct ProfileScope<'a> {
    name: &'static str,
    profiler: &'a mut SystemProfiler,
    start: Instant,
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f32() * 1000.0;
        self.profiler.record(self.name, ms);
    }
}
