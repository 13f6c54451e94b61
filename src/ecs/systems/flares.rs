use crate::ecs::profiler::SystemProfiler;
use crate::ecs::types::*;
use crate::flare::{envelope, flare_opacity, flare_position, flare_size, ENVELOPE_EPSILON, FALLBACK_COLOR};
use crate::state::SceneState;
use bevy_ecs::prelude::*;
use glam::Vec3;

pub fn sys_update_flares(
    state: Res<SceneState>,
    clock: Res<SwimClock>,
    camera: Res<SceneCamera>,
    roots: Query<&Pose, With<BodyRoot>>,
    mut flares: Query<(&mut Flare, &mut FlareVisual)>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_update_flares");
    let root = root_matrix(roots.iter().next());
    let view = camera.camera();
    for (mut flare, mut visual) in &mut flares {
        let delta = (state.year - flare.year) as f32;
        let env = envelope(delta);
        flare.envelope = env;
        if env <= ENVELOPE_EPSILON {
            visual.visible = false;
            continue;
        }
        let size = flare_size(env, delta);
        visual.visible = true;
        visual.position = flare_position(flare.base, flare.dir, flare.seed, delta, clock.elapsed);
        visual.scale = Vec3::new(size, size * flare.aspect, 1.0);
        visual.opacity = flare_opacity(env);
        visual.color = if flare.texture.is_some() { Vec3::ONE } else { FALLBACK_COLOR };
        visual.facing = view.facing_rotation(root.transform_point3(visual.position));
    }
}

/// Projects the selected flare's tooltip to screen space; every other tooltip is hidden.
pub fn sys_update_tooltips(
    selection: Res<TooltipSelection>,
    camera: Res<SceneCamera>,
    roots: Query<&Pose, With<BodyRoot>>,
    mut flares: Query<(Entity, &Flare, &FlareVisual, &mut FlareTooltip)>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_update_tooltips");
    let root = root_matrix(roots.iter().next());
    let view = camera.camera();
    for (entity, flare, visual, mut tooltip) in &mut flares {
        if selection.0 != Some(entity) {
            tooltip.screen = None;
            tooltip.opacity = 0.0;
            continue;
        }
        let world = root.transform_point3(visual.position);
        tooltip.screen = view.project_point(world, camera.viewport);
        tooltip.opacity = flare.envelope.min(1.0);
    }
}
