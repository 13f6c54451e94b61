use super::TimeDelta;
use crate::ecs::profiler::SystemProfiler;
use crate::ecs::types::*;
use crate::state::SceneState;
use bevy_ecs::prelude::*;
use glam::Vec3;
use std::f32::consts::{FRAC_PI_2, PI};

/// Whole-body offset from the base pose for a given swim phase: (translation, euler rotation).
pub fn root_swim_offset(phase: f32, intensity: f32) -> (Vec3, Vec3) {
    let bob = (phase * 0.8).sin() * 0.12 + (phase * 0.4).sin() * 0.05;
    let forward = (phase * 0.3).sin() * 0.25 + (phase * 0.2).cos() * 0.15;
    let side = (phase * 0.3).cos() * 0.15 + (phase * 0.2).sin() * 0.08;

    let yaw = ((phase * 2.5).sin() * 0.35 + (phase * 2.5 * 0.7).cos() * 0.15) * intensity;
    let roll = (phase * 1.8).sin() * 0.15 * intensity;
    let pitch = (phase * 0.9).sin() * 0.08 * intensity;

    (Vec3::new(forward, bob, side), Vec3::new(pitch, yaw, roll))
}

/// Tail rotation about y and z for segment `index` at time `t`.
pub fn tail_wave(t: f32, index: usize, intensity: f32) -> (f32, f32) {
    let speed = 6.0 * intensity;
    let amount = 0.5 * intensity;
    let i = index as f32;
    let p1 = t * speed + i * 0.3;
    let p2 = t * speed * 1.5 + i * 0.5;
    let y = p1.sin() * amount + p2.sin() * amount * 0.3;
    let z = (p1 * 0.8).cos() * amount * 0.4;
    (y, z)
}

/// Fin rotation for segment `index`; axes a fin kind does not drive are left as `base`.
pub fn fin_flap(t: f32, index: usize, kind: FinKind, intensity: f32, base: Vec3) -> Vec3 {
    let amount = 0.25 * intensity;
    let p = t * 9.0 * intensity + index as f32 * 0.5;
    let mut rotation = base;
    match kind {
        FinKind::Dorsal => {
            rotation.z = p.sin() * amount * 0.8;
            rotation.x = (p * 0.7).cos() * amount * 0.3;
        }
        FinKind::Pectoral => {
            rotation.z = (p * 1.2).sin() * amount;
            rotation.y = (p * 0.9).cos() * amount * 0.5;
        }
        FinKind::Anal => {
            rotation.z = (p * 0.8).sin() * amount * 0.6;
        }
        FinKind::Generic => {
            rotation.z = p.sin() * amount;
            rotation.x = (p * 0.7).cos() * amount * 0.3;
        }
    }
    rotation
}

/// Travelling wave along the spine; returns the pose offset from base for position `s`.
pub fn spine_wave(t: f32, s: f32, intensity: f32) -> (Vec3, Vec3) {
    let p = t * 3.6 * intensity + s * PI * 1.2;
    let yaw = p.sin() * 0.35 * intensity * (0.6 + s * 0.8);
    let roll = (p * 0.7).sin() * 0.1 * intensity * (0.5 + s * 0.5);
    let pitch = (p * 0.9).cos() * 0.07 * intensity * (0.6 + (1.0 - s) * 0.4);
    let translation = Vec3::new(0.0, (p + FRAC_PI_2).sin() * 0.01 * intensity, p.sin() * 0.02 * intensity);
    (translation, Vec3::new(pitch, yaw, roll))
}

pub fn sys_advance_swim_clock(
    dt: Res<TimeDelta>,
    state: Res<SceneState>,
    mut clock: ResMut<SwimClock>,
    mut source: ResMut<AnimationSource>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_advance_swim_clock");
    clock.intensity = state.swim_intensity();
    clock.elapsed += dt.0;
    clock.phase += dt.0 * clock.intensity;
    if let AnimationSource::Clip { duration, time, .. } = source.as_mut() {
        *time += dt.0;
        if *duration > 0.0 {
            *time %= *duration;
        }
    }
}

pub fn sys_swim_root(
    clock: Res<SwimClock>,
    source: Res<AnimationSource>,
    mut roots: Query<(&mut Pose, &BasePose), With<BodyRoot>>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_swim_root");
    if source.is_clip() {
        return;
    }
    let (offset, sway) = root_swim_offset(clock.phase, clock.intensity);
    for (mut pose, base) in &mut roots {
        pose.translation = base.0.translation + offset;
        pose.rotation = base.0.rotation + sway;
    }
}

pub fn sys_swim_tail(
    clock: Res<SwimClock>,
    source: Res<AnimationSource>,
    mut tails: Query<(&mut Pose, &BasePose, &TailSegment)>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_swim_tail");
    if source.is_clip() {
        return;
    }
    for (mut pose, base, segment) in &mut tails {
        let (y, z) = tail_wave(clock.elapsed, segment.index, clock.intensity);
        pose.rotation = Vec3::new(base.0.rotation.x, y, z);
    }
}

pub fn sys_swim_fins(
    clock: Res<SwimClock>,
    source: Res<AnimationSource>,
    mut fins: Query<(&mut Pose, &BasePose, &FinSegment)>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_swim_fins");
    if source.is_clip() {
        return;
    }
    for (mut pose, base, segment) in &mut fins {
        pose.rotation = fin_flap(clock.elapsed, segment.index, segment.kind, clock.intensity, base.0.rotation);
    }
}

/// Runs after tail and fins so spine membership wins when a part is both.
pub fn sys_swim_spine(
    clock: Res<SwimClock>,
    source: Res<AnimationSource>,
    mut segments: Query<(&mut Pose, &BasePose, &SpineSegment)>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_swim_spine");
    if source.is_clip() {
        return;
    }
    for (mut pose, base, segment) in &mut segments {
        let (offset, sway) = spine_wave(clock.elapsed, segment.t, clock.intensity);
        pose.translation = base.0.translation + offset;
        pose.rotation = base.0.rotation + sway;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_offset_is_zero_rotation_at_rest_intensity() {
        let (_, sway) = root_swim_offset(1.3, 0.0);
        assert_eq!(sway, Vec3::ZERO);
        let (translation, _) = root_swim_offset(0.0, 1.0);
        assert!((translation.x - 0.15).abs() < 1e-6);
        assert!((translation.z - 0.15).abs() < 1e-6);
        assert!(translation.y.abs() < 1e-6);
    }

    #[test]
    fn tail_segments_are_phase_shifted() {
        let (a, _) = tail_wave(0.5, 0, 1.0);
        let (b, _) = tail_wave(0.5, 3, 1.0);
        assert!((a - b).abs() > 1e-3);
        assert_eq!(tail_wave(2.0, 1, 0.0), (0.0, 0.0));
    }

    #[test]
    fn anal_fin_only_drives_z() {
        let base = Vec3::new(0.1, 0.2, 0.3);
        let rot = fin_flap(0.7, 2, FinKind::Anal, 1.0, base);
        assert_eq!(rot.x, base.x);
        assert_eq!(rot.y, base.y);
        let expected = ((0.7 * 9.0 + 1.0) * 0.8_f32).sin() * 0.25 * 0.6;
        assert!((rot.z - expected).abs() < 1e-6);
    }

    #[test]
    fn spine_head_at_rest_phase() {
        let (offset, sway) = spine_wave(0.0, 0.0, 1.0);
        assert!((offset.y - 0.01).abs() < 1e-6);
        assert!(sway.y.abs() < 1e-6);
        assert!((sway.x - 0.07).abs() < 1e-6);
    }
}
