use crate::camera3d::{Camera3D, OrbitCamera};
use bevy_ecs::prelude::*;
use bitflags::bitflags;
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use winit::dpi::PhysicalSize;

bitflags! {
    /// Animation/material roles assigned to a body part once at load time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PartRoles: u8 {
        const BODY = 1 << 0;
        const TAIL = 1 << 1;
        const FIN = 1 << 2;
        const EYE = 1 << 3;
        /// Member of the ordered spine chain (body parts, or tail/fins when the body has none).
        const SPINE = 1 << 4;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FinKind {
    Dorsal,
    Pectoral,
    Anal,
    Generic,
}

// ---------- Components ----------

/// Local transform with Euler (XYZ) rotation, the representation the swim formulas write into.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self { translation: Vec3::ZERO, rotation: Vec3::ZERO, scale: Vec3::ONE }
    }
}

impl Pose {
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.translation)
    }
}

/// Pose captured once when the part was installed; procedural motion is applied on top of it.
#[derive(Component, Debug, Clone, Copy)]
pub struct BasePose(pub Pose);

#[derive(Component, Clone, Copy)]
pub struct Parent(pub Entity);

#[derive(Component)]
pub struct BodyRoot;

#[derive(Component, Debug, Clone)]
pub struct BodyPart {
    pub name: String,
    pub roles: PartRoles,
}

/// Sphere standing in for the fish until a body is installed.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Placeholder {
    pub radius: f32,
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct TailSegment {
    pub index: usize,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FinSegment {
    pub index: usize,
    pub kind: FinKind,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct SpineSegment {
    /// Normalized head-to-tail position, fixed at load.
    pub t: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureBinding {
    BaseColor,
    Normal,
    Roughness,
    Metallic,
    Opacity,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct MaterialSlot {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub transparent: bool,
    pub double_sided: bool,
    /// Color/roughness snapshotted on the first appearance pass.
    pub original: Option<(Vec3, f32)>,
    /// Paths of the textures currently bound, per binding.
    pub textures: Vec<(TextureBinding, String)>,
}

impl MaterialSlot {
    pub fn new(color: Vec3, roughness: f32, metalness: f32) -> Self {
        Self {
            color,
            roughness,
            metalness,
            transparent: false,
            double_sided: true,
            original: None,
            textures: Vec::new(),
        }
    }

    pub fn texture(&self, binding: TextureBinding) -> Option<&str> {
        self.textures.iter().find(|(b, _)| *b == binding).map(|(_, path)| path.as_str())
    }
}

/// Named invisible pick sphere attached to the body root.
#[derive(Component, Debug, Clone)]
pub struct HitRegion {
    pub name: String,
    pub offset: Vec3,
    pub radius: f32,
}

/// Emphasis glow owned by a hit region; hidden unless enabled in config.
#[derive(Component, Debug, Clone, Copy)]
pub struct HitGlow {
    pub radius: f32,
    pub emissive_intensity: f32,
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Halo {
    pub offset: Vec3,
    pub scale: Vec2,
}

#[derive(Component, Debug, Clone)]
pub struct Flare {
    pub base: Vec3,
    pub dir: Vec3,
    pub year: i32,
    pub seed: u32,
    pub aspect: f32,
    pub tooltip: String,
    pub texture: Option<String>,
    pub envelope: f32,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct FlareVisual {
    pub visible: bool,
    /// Offset in body-root space.
    pub position: Vec3,
    pub scale: Vec3,
    pub opacity: f32,
    pub color: Vec3,
    /// World-space orientation facing the camera.
    pub facing: Quat,
}

impl Default for FlareVisual {
    fn default() -> Self {
        Self {
            visible: false,
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            opacity: 1.0,
            color: Vec3::ONE,
            facing: Quat::IDENTITY,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FlareTooltip {
    pub screen: Option<Vec2>,
    pub opacity: f32,
}

// ---------- Resources ----------

/// Running swim clock: elapsed time plus a phase accumulator that advances at the swim intensity.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SwimClock {
    pub elapsed: f32,
    pub phase: f32,
    pub intensity: f32,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub enum AnimationSource {
    Procedural,
    Clip { name: String, duration: f32, time: f32 },
}

impl AnimationSource {
    pub fn is_clip(&self) -> bool {
        matches!(self, AnimationSource::Clip { .. })
    }
}

#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Vec3,
    pub density: f32,
}

#[derive(Resource, Debug, Clone)]
pub struct SceneCamera {
    pub orbit: OrbitCamera,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
    pub follow_lerp: f32,
    pub viewport: PhysicalSize<u32>,
}

impl SceneCamera {
    pub fn camera(&self) -> Camera3D {
        self.orbit.to_camera(self.fov_y_radians, self.near, self.far)
    }
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct PointerState {
    pub screen: Option<Vec2>,
}

#[derive(Resource, Debug, Clone, Copy)]
pub struct HoverIndicator {
    pub position: Vec3,
    pub visible: bool,
    pub scale: f32,
    pub emissive_intensity: f32,
}

impl Default for HoverIndicator {
    fn default() -> Self {
        Self { position: Vec3::ZERO, visible: false, scale: 1.0, emissive_intensity: 1.5 }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct HoverState {
    pub region: Option<String>,
}

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct InfoText(pub String);

#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TooltipSelection(pub Option<Entity>);

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct AppearanceSettings {
    pub hit_glow_visible: bool,
}

/// Root transform of the body, or identity while the placeholder is shown.
pub fn root_matrix(root: Option<&Pose>) -> Mat4 {
    root.map_or(Mat4::IDENTITY, Pose::matrix)
}
