use crate::ecs::{MaterialSlot, TextureBinding};
use anyhow::{anyhow, Context, Result};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

/// One mesh-bearing node of the imported body, in model space.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyPartDesc {
    pub name: String,
    pub translation: Vec3,
    /// Euler XYZ.
    pub rotation: Vec3,
    pub scale: Vec3,
    /// Node origin after applying every ancestor transform.
    pub model_position: Vec3,
    /// Base colour factor of the first primitive; roughness and metalness are normalised on install.
    pub color: Vec3,
}

impl BodyPartDesc {
    pub fn new(name: impl Into<String>, model_position: Vec3) -> Self {
        Self {
            name: name.into(),
            translation: model_position,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            model_position,
            color: Vec3::ONE,
        }
    }

    pub fn with_color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipDesc {
    pub name: String,
    pub duration: f32,
}

/// Body hierarchy flattened to its mesh parts plus any authored animation clips.
#[derive(Debug, Clone, Default)]
pub struct BodyImport {
    pub parts: Vec<BodyPartDesc>,
    /// Model-space bounds of all mesh geometry.
    pub bounds: Option<(Vec3, Vec3)>,
    pub clips: Vec<ClipDesc>,
}

impl BodyImport {
    pub fn from_parts(parts: Vec<BodyPartDesc>) -> Self {
        let bounds = parts.iter().fold(None, |acc: Option<(Vec3, Vec3)>, part| {
            let p = part.model_position;
            Some(acc.map_or((p, p), |(min, max)| (min.min(p), max.max(p))))
        });
        Self { parts, bounds, clips: Vec::new() }
    }

    pub fn with_clip(mut self, name: impl Into<String>, duration: f32) -> Self {
        self.clips.push(ClipDesc { name: name.into(), duration });
        self
    }
}

fn mat4_from_gltf(matrix: [[f32; 4]; 4]) -> Mat4 {
    Mat4::from_cols_array_2d(&matrix)
}

pub fn load_body_from_gltf(path: impl AsRef<Path>) -> Result<BodyImport> {
    let path_ref = path.as_ref();
    let (document, buffers, _) = gltf::import(path_ref)
        .with_context(|| format!("Failed to import GLTF body from {}", path_ref.display()))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("GLTF '{}' does not contain a scene", path_ref.display()))?;

    let mut import = BodyImport::default();
    // Pre-order walk in document order so segment indices stay stable.
    let mut stack: Vec<(gltf::Node, Mat4)> = scene.nodes().map(|node| (node, Mat4::IDENTITY)).collect();
    stack.reverse();
    while let Some((node, parent_world)) = stack.pop() {
        let local = mat4_from_gltf(node.transform().matrix());
        let world = parent_world * local;
        let children: Vec<gltf::Node> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, world)));
        let Some(mesh) = node.mesh() else {
            continue;
        };
        let name = node
            .name()
            .or_else(|| mesh.name())
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", node.index()));

        let color = mesh
            .primitives()
            .next()
            .map(|primitive| {
                let [r, g, b, _] = primitive.material().pbr_metallic_roughness().base_color_factor();
                Vec3::new(r, g, b)
            })
            .unwrap_or(Vec3::ONE);

        for primitive in mesh.primitives() {
            let bb = primitive.bounding_box();
            for corner in bounding_corners(Vec3::from_array(bb.min), Vec3::from_array(bb.max)) {
                let p = world.transform_point3(corner);
                import.bounds = Some(import.bounds.map_or((p, p), |(min, max)| (min.min(p), max.max(p))));
            }
        }

        let (t, r, s) = node.transform().decomposed();
        let rotation = Quat::from_xyzw(r[0], r[1], r[2], r[3]).normalize();
        let (rx, ry, rz) = rotation.to_euler(EulerRot::XYZ);
        import.parts.push(BodyPartDesc {
            name,
            translation: Vec3::from_array(t),
            rotation: Vec3::new(rx, ry, rz),
            scale: Vec3::from_array(s),
            model_position: world.w_axis.truncate(),
            color,
        });
    }

    for animation in document.animations() {
        let mut duration: f32 = 0.0;
        for channel in animation.channels() {
            let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
            if let Some(inputs) = reader.read_inputs() {
                duration = inputs.fold(duration, f32::max);
            }
        }
        let name = animation.name().map(str::to_string).unwrap_or_else(|| format!("clip_{}", animation.index()));
        import.clips.push(ClipDesc { name, duration });
    }

    Ok(import)
}

fn bounding_corners(min: Vec3, max: Vec3) -> [Vec3; 8] {
    [
        Vec3::new(min.x, min.y, min.z),
        Vec3::new(max.x, min.y, min.z),
        Vec3::new(min.x, max.y, min.z),
        Vec3::new(max.x, max.y, min.z),
        Vec3::new(min.x, min.y, max.z),
        Vec3::new(max.x, min.y, max.z),
        Vec3::new(min.x, max.y, max.z),
        Vec3::new(max.x, max.y, max.z),
    ]
}

// ---------- Textures ----------

/// Decoded RGBA8 image.
#[derive(Debug, Clone)]
pub struct TextureHandle {
    pub path: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<[u8]>,
}

pub fn decode_texture(path: impl AsRef<Path>) -> Result<TextureHandle> {
    let path_ref = path.as_ref();
    let image = image::open(path_ref)
        .with_context(|| format!("Failed to decode texture {}", path_ref.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(TextureHandle {
        path: path_ref.to_string_lossy().into_owned(),
        width,
        height,
        pixels: Arc::from(image.into_raw()),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureRequest {
    Body(TextureBinding),
    Scale,
}

pub struct TextureEvent {
    pub request: TextureRequest,
    pub path: String,
    pub result: Result<TextureHandle>,
}

/// Decodes textures on worker threads and hands completions back over a channel.
pub struct TextureLoader {
    tx: Sender<TextureEvent>,
    rx: Receiver<TextureEvent>,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, in_flight: 0 }
    }

    pub fn request(&mut self, request: TextureRequest, path: impl Into<PathBuf>) {
        let path = path.into();
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || {
            let result = decode_texture(&path);
            let _ = tx.send(TextureEvent { request, path: path.to_string_lossy().into_owned(), result });
        });
    }

    /// Completions received since the last poll, in arrival order.
    pub fn poll(&mut self) -> Vec<TextureEvent> {
        let events: Vec<TextureEvent> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Default for TextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Body textures resolved so far; any slot may still be empty.
#[derive(Debug, Clone, Default)]
pub struct BodyTextureSet {
    pub base_color: Option<TextureHandle>,
    pub normal: Option<TextureHandle>,
    pub roughness: Option<TextureHandle>,
    pub metallic: Option<TextureHandle>,
    pub opacity: Option<TextureHandle>,
}

impl BodyTextureSet {
    pub fn insert(&mut self, binding: TextureBinding, handle: TextureHandle) {
        let slot = match binding {
            TextureBinding::BaseColor => &mut self.base_color,
            TextureBinding::Normal => &mut self.normal,
            TextureBinding::Roughness => &mut self.roughness,
            TextureBinding::Metallic => &mut self.metallic,
            TextureBinding::Opacity => &mut self.opacity,
        };
        *slot = Some(handle);
    }

    fn resolved(&self) -> impl Iterator<Item = (TextureBinding, &TextureHandle)> {
        [
            (TextureBinding::BaseColor, self.base_color.as_ref()),
            (TextureBinding::Normal, self.normal.as_ref()),
            (TextureBinding::Roughness, self.roughness.as_ref()),
            (TextureBinding::Metallic, self.metallic.as_ref()),
            (TextureBinding::Opacity, self.opacity.as_ref()),
        ]
        .into_iter()
        .filter_map(|(binding, handle)| handle.map(|h| (binding, h)))
    }
}

/// Binds every resolved texture onto `material`. Safe to call after each arrival, in any order.
pub fn apply_body_textures(set: &BodyTextureSet, material: &mut MaterialSlot) {
    for (binding, handle) in set.resolved() {
        match material.textures.iter_mut().find(|(b, _)| *b == binding) {
            Some(entry) => entry.1 = handle.path.clone(),
            None => material.textures.push((binding, handle.path.clone())),
        }
        if binding == TextureBinding::Opacity {
            material.transparent = true;
        }
    }
}

/// Scale textures for the flares; flares spawn once every requested texture has settled.
#[derive(Debug, Clone, Default)]
pub struct ScaleTextureBatch {
    pub expected: usize,
    pub settled: usize,
    /// Successfully decoded textures, in arrival order.
    pub resolved: Vec<TextureHandle>,
}

impl ScaleTextureBatch {
    pub fn new(expected: usize) -> Self {
        Self { expected, settled: 0, resolved: Vec::new() }
    }

    pub fn settle(&mut self, handle: Option<TextureHandle>) {
        self.settled += 1;
        if let Some(handle) = handle {
            self.resolved.push(handle);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(path: &str) -> TextureHandle {
        TextureHandle { path: path.to_string(), width: 1, height: 1, pixels: Arc::from(vec![0u8; 4]) }
    }

    #[test]
    fn reapplying_textures_is_order_independent() {
        let mut a = BodyTextureSet::default();
        let mut b = BodyTextureSet::default();
        let mut mat_a = MaterialSlot::new(Vec3::ONE, 0.45, 0.4);
        let mut mat_b = mat_a.clone();

        a.insert(TextureBinding::Normal, handle("n.png"));
        apply_body_textures(&a, &mut mat_a);
        a.insert(TextureBinding::Opacity, handle("o.png"));
        apply_body_textures(&a, &mut mat_a);
        apply_body_textures(&a, &mut mat_a);

        b.insert(TextureBinding::Opacity, handle("o.png"));
        apply_body_textures(&b, &mut mat_b);
        b.insert(TextureBinding::Normal, handle("n.png"));
        apply_body_textures(&b, &mut mat_b);

        assert_eq!(mat_a.textures.len(), 2);
        assert_eq!(mat_a.texture(TextureBinding::Normal), mat_b.texture(TextureBinding::Normal));
        assert_eq!(mat_a.texture(TextureBinding::Opacity), Some("o.png"));
        assert!(mat_a.transparent && mat_b.transparent);
        assert_eq!(mat_a.texture(TextureBinding::BaseColor), None);
    }

    #[test]
    fn scale_batch_completes_with_failures() {
        let mut batch = ScaleTextureBatch::new(2);
        batch.settle(None);
        assert!(!batch.is_complete());
        batch.settle(Some(handle("scale2.png")));
        assert!(batch.is_complete());
        assert_eq!(batch.resolved.len(), 1);
    }

    #[test]
    fn loader_reports_missing_files_as_errors() {
        let mut loader = TextureLoader::new();
        loader.request(TextureRequest::Scale, "definitely/missing/scale.png");
        let mut events = Vec::new();
        for _ in 0..200 {
            events.extend(loader.poll());
            if !events.is_empty() {
                break;
            }
            thread::sleep(std::time::Duration::from_millis(10));
        }
        assert_eq!(events.len(), 1);
        assert!(events[0].result.is_err());
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn missing_gltf_is_an_error() {
        let err = load_body_from_gltf("definitely/missing/body.glb").unwrap_err();
        assert!(err.to_string().contains("Failed to import GLTF body"));
    }

    #[test]
    fn from_parts_tracks_bounds() {
        let import = BodyImport::from_parts(vec![
            BodyPartDesc::new("head", Vec3::new(-1.0, 0.0, 0.0)),
            BodyPartDesc::new("tail", Vec3::new(2.0, 0.5, 0.0)),
        ]);
        let (min, max) = import.bounds.expect("bounds");
        assert_eq!(min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(2.0, 0.5, 0.0));
    }
}
