mod runtime_loop;

use self::runtime_loop::{RuntimeLoop, OVERLAY_STEP};
use crate::assets::{load_body_from_gltf, TextureLoader, TextureRequest};
use crate::cli::CliOverrides;
use crate::config::AppConfig;
use crate::ecs::{SceneWorld, TextureBinding};
use crate::info::InfoPanel;
use crate::overlay::{BlueprintOverlay, DrawList};
use crate::time::Time;
use crate::timeline::{Timeline, YearReadout};
use anyhow::Result;
use glam::Vec2;
use std::time::Duration;
use winit::dpi::PhysicalSize;

const DEFAULT_CONFIG_PATH: &str = "config/app.json";
const DEFAULT_FRAMES: u32 = 600;
const HEADLESS_STEP: f32 = 1.0 / 60.0;
/// Overlay catch-up is capped at this much simulated time per frame.
const MAX_OVERLAY_BACKLOG: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub dt: f32,
    pub overlay_steps: u32,
    pub textures_applied: usize,
    /// Scene events drained and logged this frame.
    pub events: usize,
}

/// Drives the scene, the overlay and the info panel from one year selection and one frame clock.
pub struct App {
    scene: SceneWorld,
    overlay: BlueprintOverlay,
    canvas: DrawList,
    info_panel: InfoPanel,
    loader: TextureLoader,
    runtime: RuntimeLoop,
    config: AppConfig,
}

impl App {
    pub fn new(config: AppConfig, time: Time) -> Result<Self> {
        Self::with_timeline(config, Timeline::standard(), time)
    }

    pub fn with_timeline(config: AppConfig, timeline: Timeline, time: Time) -> Result<Self> {
        let viewport = Vec2::new(config.viewport.width as f32, config.viewport.height as f32);
        let overlay = BlueprintOverlay::new(viewport, config.overlay.base_node_count as usize, config.overlay.seed);
        let info_panel = InfoPanel::new(config.ui.info_tabs.iter().cloned())?;
        let scene = SceneWorld::new(&config, timeline);
        let mut app = Self {
            scene,
            overlay,
            canvas: DrawList::new(),
            info_panel,
            loader: TextureLoader::new(),
            runtime: RuntimeLoop::new(time, OVERLAY_STEP),
            config,
        };
        let first_year = app.scene.timeline().first_year();
        app.set_year(first_year);
        Ok(app)
    }

    /// Imports the body and queues every texture. Missing assets are logged and skipped.
    pub fn load_assets(&mut self) {
        let assets = self.config.assets.clone();
        if let Some(path) = &assets.body_path {
            match load_body_from_gltf(path) {
                Ok(import) => {
                    log::info!("[assets] Loaded body '{path}' with {} parts", import.parts.len());
                    if let Err(err) = self.scene.install_body(import) {
                        log::warn!("[assets] {err:#}");
                    }
                }
                Err(err) => log::warn!("[assets] {err:#}. Keeping the placeholder body."),
            }
        }

        let body_textures = [
            (TextureBinding::BaseColor, &assets.body_textures.base_color),
            (TextureBinding::Normal, &assets.body_textures.normal),
            (TextureBinding::Roughness, &assets.body_textures.roughness),
            (TextureBinding::Metallic, &assets.body_textures.metallic),
            (TextureBinding::Opacity, &assets.body_textures.opacity),
        ];
        for (binding, path) in body_textures {
            if let Some(path) = path {
                self.loader.request(TextureRequest::Body(binding), path);
            }
        }

        self.scene.begin_scale_textures(assets.scale_textures.len());
        for path in &assets.scale_textures {
            self.loader.request(TextureRequest::Scale, path);
        }
    }

    /// Hands finished texture loads to the scene; returns how many were applied.
    pub fn poll_textures(&mut self) -> usize {
        let events = self.loader.poll();
        let count = events.len();
        for event in events {
            self.scene.handle_texture_event(event);
        }
        count
    }

    /// Blocks until every queued texture has settled or `timeout` elapses.
    pub fn wait_for_textures(&mut self, timeout: Duration) -> usize {
        let start = std::time::Instant::now();
        let mut applied = 0;
        while self.loader.in_flight() > 0 && start.elapsed() < timeout {
            applied += self.poll_textures();
            std::thread::sleep(Duration::from_millis(5));
        }
        applied + self.poll_textures()
    }

    pub fn set_year(&mut self, year: i32) -> YearReadout {
        let readout = self.scene.set_year(year);
        self.overlay.set_intensity(readout.progress);
        self.overlay.set_progress(readout.progress);
        log::info!("[timeline] {readout} (progress {:.3})", readout.progress);
        readout
    }

    pub fn pointer_moved(&mut self, screen: Vec2) {
        self.scene.pointer_moved(screen);
        self.overlay.pointer_moved(screen);
    }

    /// Pointer left the viewport: hover clears on the next frame.
    pub fn pointer_left(&mut self) {
        self.scene.pointer_left();
    }

    pub fn click(&mut self, screen: Vec2) {
        self.overlay.pointer_moved(screen);
        if let Some(flare) = self.scene.click(screen) {
            log::debug!("[picking] Toggled tooltip for flare {}", flare.index());
        }
    }

    pub fn select_tab(&mut self, name: &str) -> bool {
        self.info_panel.select(name)
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.scene.resize(size);
        self.overlay.resize(Vec2::new(size.width as f32, size.height as f32));
    }

    pub fn frame(&mut self) -> FrameReport {
        let textures_applied = self.poll_textures();
        let tick = self.runtime.tick(MAX_OVERLAY_BACKLOG);
        if let Some(dropped) = tick.dropped_backlog {
            log::debug!("[app] Dropped {dropped:.3}s of overlay backlog");
        }
        self.scene.update(tick.dt);
        let mut overlay_steps = 0;
        while self.runtime.pop_overlay_step() {
            self.overlay.step();
            overlay_steps += 1;
        }
        self.overlay.draw(&mut self.canvas);

        let events = self.scene.drain_events();
        for event in &events {
            log::debug!("[events] {event}");
        }
        FrameReport { dt: tick.dt, overlay_steps, textures_applied, events: events.len() }
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.runtime.time().elapsed_seconds()
    }

    pub fn scene(&self) -> &SceneWorld {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneWorld {
        &mut self.scene
    }

    pub fn overlay(&self) -> &BlueprintOverlay {
        &self.overlay
    }

    pub fn canvas(&self) -> &DrawList {
        &self.canvas
    }

    pub fn info_panel(&self) -> &InfoPanel {
        &self.info_panel
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Headless run: load assets, select a year, step a number of frames and log what the viewer would show.
pub fn run_with_overrides(cli: CliOverrides) -> Result<()> {
    let mut config = match cli.config_path() {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(DEFAULT_CONFIG_PATH),
    };
    let overrides = cli.config_overrides();
    if !overrides.is_empty() {
        log::info!("[config] CLI overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);

    let mut app = App::new(config, Time::fixed(HEADLESS_STEP))?;
    app.load_assets();
    app.wait_for_textures(Duration::from_secs(5));
    if let Some(year) = cli.year() {
        app.set_year(year);
    }

    let frames = cli.frames().unwrap_or(DEFAULT_FRAMES);
    for _ in 0..frames {
        app.frame();
    }

    let scene = app.scene_mut();
    if scene.placeholder().is_some() {
        log::info!("[summary] No body installed; the placeholder sphere is shown");
    }
    let state = scene.state();
    let readout = scene.timeline().readout(state.year);
    let visible = scene.flare_snapshots().iter().filter(|f| f.visual.visible).count();
    let fog = scene.fog();
    log::info!("[summary] {readout}");
    if !readout.fact.is_empty() {
        log::info!("[summary] Fact: {}", readout.fact);
    }
    log::info!(
        "[summary] progress {:.3}, swim intensity {:.2}, fog density {:.4}, {visible} flares visible",
        state.progress,
        state.swim_intensity(),
        fog.density
    );
    log::info!("[summary] Info: {}", scene.info_text());
    scene.profiler().log_summary();
    log::info!(
        "[summary] Overlay {} nodes after {:.2}s; {} draw commands",
        app.overlay().nodes().len(),
        app.elapsed_seconds(),
        app.canvas().commands.len()
    );
    Ok(())
}

pub fn run() -> Result<()> {
    run_with_overrides(CliOverrides::default())
}
