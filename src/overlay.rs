//! Full-screen 2D constellation overlay: a faint grid, drifting nodes and proximity links whose
//! density and colour track the pollution progress.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

const GRID_SPACING: f32 = 90.0;
const GRID_OPACITY_MIN: f32 = 0.08;
const GRID_OPACITY_MAX: f32 = 0.15;
const LINK_DISTANCE: f32 = 150.0;
const POINTER_RADIUS: f32 = 200.0;
const POINTER_FORCE: f32 = 0.0001;
const DAMPING: f32 = 0.98;
const PULSE_STEP: f32 = 0.05;
const CLOCK_STEP: f32 = 0.016;
/// Node count drift tolerated before the field is rebuilt.
const REGENERATE_THRESHOLD: usize = 5;
const LINE_WIDTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// Cyan at progress 0 shading to a deeper blue at 1.
pub fn palette(progress: f32) -> Rgba {
    let p = progress.clamp(0.0, 1.0);
    let channel = |from: f32, span: f32| (from - span * p).round() as u8;
    Rgba::new(channel(60.0, 25.0), channel(190.0, 70.0), channel(255.0, 60.0), 1.0)
}

/// 2D drawing surface the overlay paints onto.
pub trait OverlayCanvas {
    fn clear(&mut self, size: Vec2);
    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);
    /// Radial gradient from `center` out to `radius`; stops are (offset, colour).
    fn fill_radial(&mut self, center: Vec2, radius: f32, stops: &[(f32, Rgba)]);
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear { size: Vec2 },
    Line { from: Vec2, to: Vec2, color: Rgba, width: f32 },
    Circle { center: Vec2, radius: f32, color: Rgba },
    Radial { center: Vec2, radius: f32, stops: Vec<(f32, Rgba)> },
    Rect { origin: Vec2, size: Vec2, color: Rgba },
}

/// Records draw calls instead of rasterising them.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Line { .. }))
    }

    pub fn rects(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands.iter().filter(|c| matches!(c, DrawCommand::Rect { .. }))
    }
}

impl OverlayCanvas for DrawList {
    fn clear(&mut self, size: Vec2) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { size });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, color: Rgba, width: f32) {
        self.commands.push(DrawCommand::Line { from, to, color, width });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle { center, radius, color });
    }

    fn fill_radial(&mut self, center: Vec2, radius: f32, stops: &[(f32, Rgba)]) {
        self.commands.push(DrawCommand::Radial { center, radius, stops: stops.to_vec() });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect { origin, size, color });
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayNode {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub pulse: f32,
}

pub struct BlueprintOverlay {
    size: Vec2,
    nodes: Vec<OverlayNode>,
    pointer: Vec2,
    intensity: f32,
    progress: f32,
    time: f32,
    base_node_count: usize,
    rng: StdRng,
}

impl BlueprintOverlay {
    pub fn new(size: Vec2, base_node_count: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut overlay = Self {
            size,
            nodes: Vec::new(),
            pointer: Vec2::ZERO,
            intensity: 0.0,
            progress: 0.0,
            time: 0.0,
            base_node_count,
            rng,
        };
        overlay.regenerate();
        overlay
    }

    /// Node count for the current intensity: base at 0, three times base at 1.
    pub fn target_node_count(&self) -> usize {
        (self.base_node_count as f32 * (1.0 + 2.0 * self.intensity)).round() as usize
    }

    fn regenerate(&mut self) {
        let count = self.target_node_count();
        let size = self.size;
        let rng = &mut self.rng;
        self.nodes = (0..count)
            .map(|_| OverlayNode {
                position: Vec2::new(rng.gen::<f32>() * size.x, rng.gen::<f32>() * size.y),
                velocity: Vec2::new(rng.gen_range(-0.25..0.25), rng.gen_range(-0.25..0.25)),
                radius: rng.gen_range(2.0..4.0),
                pulse: rng.gen_range(0.0..TAU),
            })
            .collect();
        log::debug!("[overlay] Regenerated {count} nodes (intensity {:.2})", self.intensity);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
        if self.nodes.len().abs_diff(self.target_node_count()) > REGENERATE_THRESHOLD {
            self.regenerate();
        }
    }

    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn resize(&mut self, size: Vec2) {
        self.size = size;
    }

    pub fn pointer_moved(&mut self, pointer: Vec2) {
        self.pointer = pointer;
    }

    pub fn nodes(&self) -> &[OverlayNode] {
        &self.nodes
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// One animation tick: advance the clock and walk every node.
    pub fn step(&mut self) {
        self.time += CLOCK_STEP;
        let speed = 1.0 + 1.5 * self.intensity;
        let size = self.size;
        let pointer = self.pointer;
        for node in &mut self.nodes {
            node.position += node.velocity * speed;

            if node.position.x < 0.0 || node.position.x > size.x {
                node.velocity.x = -node.velocity.x;
                node.position.x = node.position.x.clamp(0.0, size.x);
            }
            if node.position.y < 0.0 || node.position.y > size.y {
                node.velocity.y = -node.velocity.y;
                node.position.y = node.position.y.clamp(0.0, size.y);
            }

            let to_pointer = pointer - node.position;
            let dist = to_pointer.length();
            if dist > 0.0 && dist < POINTER_RADIUS {
                node.velocity += to_pointer / dist * ((POINTER_RADIUS - dist) * POINTER_FORCE);
            }

            node.velocity *= DAMPING;
            node.pulse += PULSE_STEP;
        }
    }

    pub fn draw(&self, canvas: &mut dyn OverlayCanvas) {
        canvas.clear(self.size);
        let color = palette(self.progress);
        self.draw_grid(canvas, color);
        self.draw_links(canvas, color);
        self.draw_nodes(canvas, color);

        if self.progress > 0.3 {
            let wash = (self.progress - 0.3) / 0.7 * 0.25;
            canvas.fill_rect(Vec2::ZERO, self.size, Rgba::new(5, 8, 12, wash));
        }
    }

    fn draw_grid(&self, canvas: &mut dyn OverlayCanvas, color: Rgba) {
        let opacity = GRID_OPACITY_MIN + (GRID_OPACITY_MAX - GRID_OPACITY_MIN) * self.intensity;
        let stroke = color.with_alpha(opacity);
        let mut x = 0.0;
        while x < self.size.x {
            canvas.stroke_line(Vec2::new(x, 0.0), Vec2::new(x, self.size.y), stroke, LINE_WIDTH);
            x += GRID_SPACING;
        }
        let mut y = 0.0;
        while y < self.size.y {
            canvas.stroke_line(Vec2::new(0.0, y), Vec2::new(self.size.x, y), stroke, LINE_WIDTH);
            y += GRID_SPACING;
        }
    }

    fn draw_links(&self, canvas: &mut dyn OverlayCanvas, color: Rgba) {
        for (i, a) in self.nodes.iter().enumerate() {
            for b in &self.nodes[i + 1..] {
                let distance = a.position.distance(b.position);
                if distance < LINK_DISTANCE {
                    let opacity = (1.0 - distance / LINK_DISTANCE) * 0.3 * (1.0 + 0.5 * self.intensity);
                    canvas.stroke_line(a.position, b.position, color.with_alpha(opacity), LINE_WIDTH);
                }
            }
        }
    }

    fn draw_nodes(&self, canvas: &mut dyn OverlayCanvas, color: Rgba) {
        for node in &self.nodes {
            let radius = node.radius * (node.pulse.sin() * 0.5 + 1.0);
            let stops = [(0.0, color.with_alpha(0.45)), (0.5, color.with_alpha(0.22)), (1.0, color.with_alpha(0.0))];
            canvas.fill_radial(node.position, radius * 3.0, &stops);
            canvas.fill_circle(node.position, radius, color.with_alpha(0.5));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay() -> BlueprintOverlay {
        BlueprintOverlay::new(Vec2::new(800.0, 600.0), 20, Some(7))
    }

    #[test]
    fn palette_endpoints() {
        assert_eq!(palette(0.0), Rgba::new(60, 190, 255, 1.0));
        assert_eq!(palette(1.0), Rgba::new(35, 120, 195, 1.0));
        assert_eq!(palette(5.0), palette(1.0));
    }

    #[test]
    fn small_intensity_changes_keep_the_field() {
        let mut overlay = overlay();
        assert_eq!(overlay.nodes().len(), 20);
        let before = overlay.nodes().to_vec();
        // target 24: within tolerance
        overlay.set_intensity(0.1);
        assert_eq!(overlay.nodes(), before.as_slice());
        // target 28: rebuilt
        overlay.set_intensity(0.2);
        assert_eq!(overlay.nodes().len(), 28);
        overlay.set_intensity(3.0);
        assert_eq!(overlay.intensity(), 1.0);
        assert_eq!(overlay.nodes().len(), 60);
    }

    #[test]
    fn nodes_bounce_off_edges() {
        let mut overlay = overlay();
        overlay.pointer_moved(Vec2::new(-10_000.0, -10_000.0));
        overlay.nodes[0] = OverlayNode {
            position: Vec2::new(799.9, 10.0),
            velocity: Vec2::new(0.2, 0.0),
            radius: 2.0,
            pulse: 0.0,
        };
        overlay.step();
        let node = overlay.nodes()[0];
        assert_eq!(node.position.x, 800.0);
        assert!(node.velocity.x < 0.0);
        assert!((node.velocity.x + 0.2 * DAMPING).abs() < 1e-6);
        assert!((node.pulse - PULSE_STEP).abs() < 1e-6);
        assert!((overlay.time() - CLOCK_STEP).abs() < 1e-6);
    }

    #[test]
    fn pointer_attracts_nearby_nodes() {
        let mut overlay = overlay();
        overlay.nodes[0] = OverlayNode {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::ZERO,
            radius: 2.0,
            pulse: 0.0,
        };
        overlay.pointer_moved(Vec2::new(200.0, 100.0));
        overlay.step();
        let expected = 100.0 * POINTER_FORCE * DAMPING;
        assert!((overlay.nodes()[0].velocity.x - expected).abs() < 1e-7);
    }

    #[test]
    fn wash_only_above_threshold() {
        let mut overlay = overlay();
        let mut canvas = DrawList::new();
        overlay.set_progress(0.3);
        overlay.draw(&mut canvas);
        assert_eq!(canvas.rects().count(), 0);

        overlay.set_progress(1.0);
        overlay.draw(&mut canvas);
        let rects: Vec<_> = canvas.rects().collect();
        assert_eq!(rects.len(), 1);
        match rects[0] {
            DrawCommand::Rect { color, .. } => assert!((color.a - 0.25).abs() < 1e-6),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn close_nodes_are_linked() {
        let mut overlay = overlay();
        overlay.nodes = vec![
            OverlayNode { position: Vec2::new(10.0, 10.0), velocity: Vec2::ZERO, radius: 2.0, pulse: 0.0 },
            OverlayNode { position: Vec2::new(85.0, 10.0), velocity: Vec2::ZERO, radius: 2.0, pulse: 0.0 },
            OverlayNode { position: Vec2::new(700.0, 500.0), velocity: Vec2::ZERO, radius: 2.0, pulse: 0.0 },
        ];
        let mut canvas = DrawList::new();
        overlay.draw(&mut canvas);
        // 800x600 at 90px spacing: 9 vertical and 7 horizontal grid lines, plus one link.
        assert_eq!(canvas.lines().count(), 9 + 7 + 1);
        let link = canvas.lines().last().cloned();
        match link {
            Some(DrawCommand::Line { color, .. }) => assert!((color.a - 0.15).abs() < 1e-6),
            other => panic!("unexpected command {other:?}"),
        }
    }
}
