//! Scale-flare decorations: seeded layout and the year-windowed visibility envelope.
//!
//! Everything here is a pure function of (seed, current year, elapsed time); the ECS system in
//! `ecs::systems::flares` only writes the results into components each frame.

use crate::config::FlareEntryConfig;
use crate::timeline::Timeline;
use glam::Vec3;

/// Envelope values at or below this are treated as hidden.
pub const ENVELOPE_EPSILON: f32 = 0.001;
pub const FALLBACK_COLOR: Vec3 = Vec3::new(0x9d as f32 / 255.0, 0xe5 as f32 / 255.0, 1.0);
/// Edge length of the unscaled flare quad.
pub const QUAD_SIZE: f32 = 0.24;

const PLATEAU_START: f32 = -1.0;
const FADE_START: f32 = 8.0;
const FADE_END: f32 = 18.0;

/// Deterministic hash in [0, 1) keyed by seed and channel.
pub fn seeded_random(seed: u32, offset: u32) -> f32 {
    let x = (f64::from(seed) * 9973.0 + f64::from(offset) * 7919.0).sin() * 43758.5453;
    (x - x.floor()) as f32
}

/// Visibility weight as a function of years since activation.
pub fn envelope(delta_year: f32) -> f32 {
    if delta_year < PLATEAU_START {
        0.0
    } else if delta_year < FADE_START {
        1.0
    } else if delta_year < FADE_END {
        (1.0 - (delta_year - FADE_START) / (FADE_END - FADE_START)).max(0.0)
    } else {
        0.0
    }
}

pub fn flake_factor(delta_year: f32) -> f32 {
    delta_year.max(0.0) / 6.0
}

/// Two-frequency flutter keyed by the instance seed so duplicates never move in lockstep.
pub fn flutter(time: f32, seed: u32) -> Vec3 {
    let s = seed as f32;
    Vec3::new(
        (time * 1.2 + s).sin() * 0.007,
        (time * 1.6 + s).cos() * 0.007,
        (time * 2.0 + s).sin() * 0.01,
    )
}

pub fn flare_position(base: Vec3, dir: Vec3, seed: u32, delta_year: f32, time: f32) -> Vec3 {
    let flake = flake_factor(delta_year);
    let drift = dir * (1.2 * flake);
    let gravity = Vec3::new(0.0, -0.4 * flake, 0.0);
    base + drift + gravity + flutter(time, seed)
}

pub fn flare_size(envelope: f32, delta_year: f32) -> f32 {
    1.6 + envelope * 1.3 + flake_factor(delta_year) * 0.9
}

pub fn flare_opacity(envelope: f32) -> f32 {
    (0.7 + 0.6 * envelope).min(1.0)
}

/// Seeded placement of one flare instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlareLayout {
    pub base: Vec3,
    pub dir: Vec3,
    pub aspect: f32,
}

impl FlareLayout {
    pub fn from_seed(seed: u32) -> Self {
        // Spread along the body: x head-to-tail, y top-to-bottom, z depth.
        let base = Vec3::new(
            -0.4 + seeded_random(seed, 1) * 0.9,
            -0.4 + seeded_random(seed, 2) * 0.8,
            -0.3 + seeded_random(seed, 3) * 0.6,
        );
        let raw_dir = Vec3::new(
            seeded_random(seed, 4) - 0.5,
            seeded_random(seed, 5) - 0.5,
            seeded_random(seed, 6) - 0.5,
        );
        let dir = raw_dir.try_normalize().unwrap_or(Vec3::Y);
        let aspect = 0.9 + seeded_random(seed, 7) * 0.55;
        Self { base, dir, aspect }
    }
}

/// Everything needed to spawn one flare entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FlareSpec {
    pub year: i32,
    pub seed: u32,
    pub layout: FlareLayout,
    pub tooltip: String,
    pub texture_index: Option<usize>,
}

/// Expands each activation entry into `duplicates` instances with consecutive seeds (wrapping at `u32::MAX`).
pub fn build_flare_specs(
    entries: &[FlareEntryConfig],
    duplicates: u32,
    timeline: &Timeline,
    texture_count: usize,
) -> Vec<FlareSpec> {
    let mut specs = Vec::with_capacity(entries.len() * duplicates as usize);
    for entry in entries {
        let tooltip = timeline.entry_for_year(entry.year).map(|e| e.fact.clone()).unwrap_or_default();
        for i in 0..duplicates {
            let seed = entry.seed.wrapping_add(i);
            let texture_index = if texture_count > 0 {
                Some(((u64::from(entry.seed) + u64::from(i) * 37) % texture_count as u64) as usize)
            } else {
                None
            };
            specs.push(FlareSpec {
                year: entry.year,
                seed,
                layout: FlareLayout::from_seed(seed),
                tooltip: tooltip.clone(),
                texture_index,
            });
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlareConfig;
    use std::collections::HashSet;

    #[test]
    fn envelope_matches_piecewise_window() {
        let cases = [(-2.0, 0.0), (-1.0, 1.0), (0.0, 1.0), (8.0, 1.0), (13.0, 0.5), (18.0, 0.0), (25.0, 0.0)];
        for (delta, expected) in cases {
            assert!((envelope(delta) - expected).abs() < 1e-6, "envelope({delta}) should be {expected}");
        }
    }

    #[test]
    fn envelope_is_stateless_when_scrubbing_backwards() {
        let forward: Vec<f32> = (-5..30).map(|d| envelope(d as f32)).collect();
        let backward: Vec<f32> = (-5..30).rev().map(|d| envelope(d as f32)).collect();
        let mut reversed = backward.clone();
        reversed.reverse();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn seeded_random_is_deterministic_and_in_unit_range() {
        for seed in [101, 202, 808, 12345] {
            for offset in 1..=7 {
                let a = seeded_random(seed, offset);
                assert_eq!(a, seeded_random(seed, offset));
                assert!((0.0..1.0).contains(&a));
            }
        }
    }

    #[test]
    fn layout_direction_is_unit_length_and_base_in_span() {
        let layout = FlareLayout::from_seed(404);
        assert!((layout.dir.length() - 1.0).abs() < 1e-5);
        assert!(layout.base.x >= -0.4 && layout.base.x <= 0.5);
        assert!(layout.aspect >= 0.9 && layout.aspect <= 1.45);
    }

    #[test]
    fn default_flare_seeds_are_unique() {
        let cfg = FlareConfig::default();
        let specs = build_flare_specs(&cfg.entries, cfg.duplicates, &Timeline::standard(), 2);
        assert_eq!(specs.len(), 66);
        let seeds: HashSet<u32> = specs.iter().map(|s| s.seed).collect();
        assert_eq!(seeds.len(), specs.len(), "duplicate seeds would overlap visually");
        let layouts: HashSet<[u32; 3]> =
            specs.iter().map(|s| s.layout.base.to_array().map(f32::to_bits)).collect();
        assert_eq!(layouts.len(), specs.len());
    }

    #[test]
    fn specs_pick_facts_and_texture_slots() {
        let timeline = Timeline::standard();
        let entries = [FlareEntryConfig { year: 2028, seed: 404 }, FlareEntryConfig { year: 2038, seed: 656 }];
        let specs = build_flare_specs(&entries, 2, &timeline, 2);
        assert_eq!(specs[0].tooltip, timeline.entry_for_year(2028).unwrap().fact);
        // 2038 is not a checkpoint year, so its flares carry no fact.
        assert_eq!(specs[2].tooltip, "");
        assert_eq!(specs[0].texture_index, Some(0));
        assert_eq!(specs[1].texture_index, Some(1));
        let untextured = build_flare_specs(&entries, 1, &timeline, 0);
        assert!(untextured.iter().all(|s| s.texture_index.is_none()));
    }

    #[test]
    fn seeds_near_the_top_of_the_range_wrap() {
        let entries = [FlareEntryConfig { year: 2022, seed: u32::MAX - 1 }];
        let specs = build_flare_specs(&entries, 4, &Timeline::standard(), 3);
        let seeds: Vec<u32> = specs.iter().map(|s| s.seed).collect();
        assert_eq!(seeds, [u32::MAX - 1, u32::MAX, 0, 1]);
        assert!(specs.iter().all(|s| s.texture_index.is_some_and(|i| i < 3)));
    }

    #[test]
    fn drift_and_size_grow_after_activation() {
        let layout = FlareLayout::from_seed(101);
        let early = flare_position(layout.base, layout.dir, 101, 0.0, 0.0);
        let late = flare_position(layout.base, layout.dir, 101, 12.0, 0.0);
        assert!((late - early).length() > 1.0);
        assert!(flare_size(1.0, 6.0) > flare_size(1.0, 0.0));
        assert_eq!(flare_opacity(1.0), 1.0);
        assert!((flare_opacity(0.0) - 0.7).abs() < 1e-6);
    }
}
