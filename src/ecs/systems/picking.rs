use crate::ecs::profiler::SystemProfiler;
use crate::ecs::types::*;
use crate::events::{EventBus, SceneEvent};
use crate::flare::QUAD_SIZE;
use crate::info::info_text_for;
use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec2, Vec3};

/// Parent links followed before giving up on finding an owning region.
const MAX_ASCENT: usize = 16;

pub fn ray_sphere_intersection(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrt_d = discriminant.sqrt();
    let mut t = -b - sqrt_d;
    if t < 0.0 {
        t = -b + sqrt_d;
    }
    if t < 0.0 {
        return None;
    }
    Some(t)
}

/// Two-sided hit against a rectangle of `half` extents lying in the local XY plane of `rotation`.
pub fn ray_quad_intersection(origin: Vec3, dir: Vec3, center: Vec3, rotation: Quat, half: Vec2) -> Option<f32> {
    let normal = rotation * Vec3::Z;
    let denom = normal.dot(dir);
    if denom.abs() < 1e-6 {
        return None;
    }
    let t = normal.dot(center - origin) / denom;
    if t < 0.0 {
        return None;
    }
    let local = rotation.inverse() * (origin + dir * t - center);
    if local.x.abs() <= half.x && local.y.abs() <= half.y {
        Some(t)
    } else {
        None
    }
}

fn uniform_scale(root: &Mat4) -> f32 {
    root.x_axis.truncate().length()
}

/// Walks `Parent` links from `entity` until an entity carrying a `HitRegion` is found.
pub fn owning_region(entity: Entity, regions: &Query<(Entity, &HitRegion)>, parents: &Query<&Parent>) -> Option<Entity> {
    let mut current = entity;
    for _ in 0..MAX_ASCENT {
        if regions.contains(current) {
            return Some(current);
        }
        current = parents.get(current).ok()?.0;
    }
    None
}

/// Nearest visible flare under the ray, if any.
pub fn pick_flare(
    origin: Vec3,
    dir: Vec3,
    root: Mat4,
    flares: impl Iterator<Item = (Entity, FlareVisual)>,
) -> Option<Entity> {
    let scale = uniform_scale(&root);
    flares
        .filter(|(_, visual)| visual.visible)
        .filter_map(|(entity, visual)| {
            let center = root.transform_point3(visual.position);
            let half = Vec2::new(visual.scale.x, visual.scale.y) * (QUAD_SIZE * 0.5 * scale);
            ray_quad_intersection(origin, dir, center, visual.facing, half).map(|t| (entity, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// Level-triggered hover: re-evaluated every frame from the last pointer position.
pub fn sys_hover_regions(
    pointer: Res<PointerState>,
    camera: Res<SceneCamera>,
    roots: Query<&Pose, With<BodyRoot>>,
    regions: Query<(Entity, &HitRegion)>,
    glows: Query<(Entity, &HitGlow, &Parent)>,
    parents: Query<&Parent>,
    mut hover: ResMut<HoverState>,
    mut indicator: ResMut<HoverIndicator>,
    mut info: ResMut<InfoText>,
    mut events: ResMut<EventBus>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_hover_regions");
    let root = root_matrix(roots.iter().next());
    let scale = uniform_scale(&root);
    let ray = pointer.screen.and_then(|screen| camera.camera().screen_ray(screen, camera.viewport));

    let mut nearest: Option<(Entity, f32)> = None;
    if let Some((origin, dir)) = ray {
        let mut consider = |entity: Entity, center: Vec3, radius: f32| {
            if let Some(t) = ray_sphere_intersection(origin, dir, center, radius * scale) {
                if nearest.map_or(true, |(_, best)| t < best) {
                    nearest = Some((entity, t));
                }
            }
        };
        for (entity, region) in &regions {
            consider(entity, root.transform_point3(region.offset), region.radius);
        }
        for (entity, glow, parent) in &glows {
            if let Ok((_, region)) = regions.get(parent.0) {
                consider(entity, root.transform_point3(region.offset), glow.radius);
            }
        }
    }

    let hit = nearest.and_then(|(entity, t)| {
        let owner = owning_region(entity, &regions, &parents)?;
        let (_, region) = regions.get(owner).ok()?;
        let (origin, dir) = ray?;
        Some((region.name.clone(), origin + dir * t))
    });

    match hit {
        Some((name, point)) => {
            indicator.position = point;
            indicator.visible = true;
            if hover.region.as_deref() != Some(name.as_str()) {
                info.0 = info_text_for(Some(&name)).to_string();
                hover.region = Some(name.clone());
                events.push(SceneEvent::HoverChanged { region: Some(name) });
            }
        }
        None => {
            indicator.visible = false;
            if hover.region.take().is_some() {
                events.push(SceneEvent::HoverChanged { region: None });
            }
            info.0 = info_text_for(None).to_string();
        }
    }
}

pub fn sys_pulse_hover_indicator(
    clock: Res<SwimClock>,
    mut indicator: ResMut<HoverIndicator>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_pulse_hover_indicator");
    if !indicator.visible {
        return;
    }
    let t = clock.elapsed;
    indicator.scale = 1.0 + (t * 4.0).sin() * 0.05;
    indicator.emissive_intensity = 1.5 + (t * 6.0).sin() * 0.5;
}

/// Eases the orbit target toward the body root.
pub fn sys_follow_body(
    roots: Query<&Pose, With<BodyRoot>>,
    mut camera: ResMut<SceneCamera>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_follow_body");
    let Some(root) = roots.iter().next() else {
        return;
    };
    let factor = camera.follow_lerp;
    camera.orbit.follow(root.translation, factor);
}
