use crate::ecs::profiler::SystemProfiler;
use crate::ecs::types::*;
use crate::state::SceneState;
use bevy_ecs::prelude::*;
use glam::Vec3;

pub const POLLUTED_COLOR: Vec3 = Vec3::splat(0x3a as f32 / 255.0);
pub const CLEAN_FOG: Fog = Fog { color: Vec3::new(0x01 as f32 / 255.0, 0x05 as f32 / 255.0, 0x0a as f32 / 255.0), density: 0.01 };
pub const DIRTY_FOG: Fog = Fog { color: Vec3::new(0x04 as f32 / 255.0, 0x07 as f32 / 255.0, 0x0b as f32 / 255.0), density: 0.04 };
const GLOW_MIN_INTENSITY: f32 = 0.3;
const GLOW_MAX_INTENSITY: f32 = 1.5;
/// Glow opacity used when the emphasis glows are switched on.
pub const GLOW_VISIBLE_OPACITY: f32 = 0.6;

/// Tint and roughness for a material whose pre-pollution values are `original`.
pub fn tinted_material(original: (Vec3, f32), eased: f32) -> (Vec3, f32) {
    let (color, roughness) = original;
    (color.lerp(POLLUTED_COLOR, eased * 0.6), roughness + eased * 0.3)
}

pub fn fog_for(eased: f32) -> Fog {
    Fog {
        color: CLEAN_FOG.color.lerp(DIRTY_FOG.color, eased),
        density: CLEAN_FOG.density + (DIRTY_FOG.density - CLEAN_FOG.density) * eased,
    }
}

pub fn glow_intensity(eased: f32) -> f32 {
    GLOW_MIN_INTENSITY + (GLOW_MAX_INTENSITY - GLOW_MIN_INTENSITY) * eased
}

pub fn sys_apply_appearance(
    state: Res<SceneState>,
    settings: Res<AppearanceSettings>,
    mut fog: ResMut<Fog>,
    mut materials: Query<&mut MaterialSlot>,
    mut glows: Query<&mut HitGlow>,
    mut profiler: ResMut<SystemProfiler>,
) {
    let _span = profiler.scope("sys_apply_appearance");
    let eased = state.eased_progress();
    for mut material in &mut materials {
        let current = (material.color, material.roughness);
        let original = *material.original.get_or_insert(current);
        let (color, roughness) = tinted_material(original, eased);
        material.color = color;
        material.roughness = roughness;
    }

    *fog = fog_for(eased);

    let intensity = glow_intensity(eased);
    for mut glow in &mut glows {
        glow.emissive_intensity = intensity;
        glow.visible = settings.hit_glow_visible;
        glow.opacity = if settings.hit_glow_visible { GLOW_VISIBLE_OPACITY } else { 0.0 };
    }
}
