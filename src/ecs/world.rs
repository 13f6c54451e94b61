use super::profiler::SystemProfiler;
use super::systems::*;
use super::types::*;
use crate::assets::{apply_body_textures, BodyImport, BodyTextureSet, ScaleTextureBatch, TextureEvent, TextureRequest};
use crate::body::{plan_body, IMPORT_METALNESS, IMPORT_ROUGHNESS};
use crate::camera3d::{Camera3D, OrbitCamera};
use crate::config::{AppConfig, FlareConfig};
use crate::events::{EventBus, SceneEvent};
use crate::flare::build_flare_specs;
use crate::info::{HIT_REGIONS, IDLE_PROMPT};
use crate::state::SceneState;
use crate::timeline::{Timeline, YearReadout};
use anyhow::{bail, Result};
use bevy_ecs::prelude::{Entity, Schedule, With, World};
use bevy_ecs::schedule::IntoSystemConfigs;
use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;

const HALO_OFFSET: Vec3 = Vec3::new(0.0, 0.3, -0.55);
const HALO_SCALE: f32 = 1.8;
/// Emphasis glow radius relative to its hit region.
const GLOW_RADIUS_FACTOR: f32 = 0.6;
const PLACEHOLDER: Placeholder = Placeholder {
    radius: 0.5,
    color: Vec3::new(0x3d as f32 / 255.0, 0xb0 as f32 / 255.0, 1.0),
    roughness: 0.3,
    metalness: 0.4,
};

/// Read-only view of one flare after the latest update.
#[derive(Debug, Clone)]
pub struct FlareSnapshot {
    pub entity: Entity,
    pub year: i32,
    pub seed: u32,
    pub envelope: f32,
    pub visual: FlareVisual,
    pub tooltip: String,
    pub tooltip_screen: Option<Vec2>,
    pub tooltip_opacity: f32,
}

pub struct SceneWorld {
    pub world: World,
    schedule: Schedule,
    schedule_pick: Schedule,
    timeline: Timeline,
    flare_config: FlareConfig,
    halo_enabled: bool,
    root: Option<Entity>,
    placeholder: Option<Entity>,
    body_textures: BodyTextureSet,
    scale_batch: Option<ScaleTextureBatch>,
    flares_installed: bool,
}

impl SceneWorld {
    pub fn new(config: &AppConfig, timeline: Timeline) -> Self {
        let mut world = World::new();
        let first_year = timeline.first_year();
        let state = SceneState::new(first_year, timeline.progress_for_year(first_year));

        let camera_position = Vec3::from_array(config.camera.position);
        let camera = SceneCamera {
            orbit: OrbitCamera::from_position(camera_position, Vec3::ZERO),
            fov_y_radians: config.camera.fov_degrees.to_radians(),
            near: config.camera.near,
            far: config.camera.far,
            follow_lerp: config.camera.follow_lerp,
            viewport: PhysicalSize::new(config.viewport.width, config.viewport.height),
        };

        world.insert_resource(TimeDelta(0.0));
        world.insert_resource(SwimClock { intensity: state.swim_intensity(), ..SwimClock::default() });
        world.insert_resource(fog_for(state.eased_progress()));
        world.insert_resource(state);
        world.insert_resource(AnimationSource::Procedural);
        world.insert_resource(camera);
        world.insert_resource(PointerState::default());
        world.insert_resource(HoverIndicator::default());
        world.insert_resource(HoverState::default());
        world.insert_resource(InfoText(IDLE_PROMPT.to_string()));
        world.insert_resource(TooltipSelection::default());
        world.insert_resource(AppearanceSettings { hit_glow_visible: config.appearance.hit_glow_visible });
        world.insert_resource(EventBus::default());
        world.insert_resource(SystemProfiler::new());

        let placeholder = world.spawn((PLACEHOLDER, Pose::default())).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(
            (
                sys_advance_swim_clock,
                sys_swim_root,
                sys_swim_tail,
                sys_swim_fins,
                sys_swim_spine,
                sys_apply_appearance,
                sys_follow_body,
                sys_update_flares,
                sys_hover_regions,
                sys_pulse_hover_indicator,
                sys_update_tooltips,
            )
                .chain(),
        );

        let mut schedule_pick = Schedule::default();
        schedule_pick.add_systems(sys_hover_regions);

        Self {
            world,
            schedule,
            schedule_pick,
            timeline,
            flare_config: config.flares.clone(),
            halo_enabled: config.appearance.halo_enabled,
            root: None,
            placeholder: Some(placeholder),
            body_textures: BodyTextureSet::default(),
            scale_batch: None,
            flares_installed: false,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn state(&self) -> SceneState {
        *self.world.resource::<SceneState>()
    }

    /// Selects a year: recomputes progress and clears any open flare tooltip.
    pub fn set_year(&mut self, year: i32) -> YearReadout {
        let readout = self.timeline.readout(year);
        self.world.insert_resource(SceneState::new(year, readout.progress));
        let previous = std::mem::take(&mut self.world.resource_mut::<TooltipSelection>().0);
        let mut events = self.world.resource_mut::<EventBus>();
        if let Some(flare) = previous {
            events.push(SceneEvent::TooltipToggled { flare, active: false });
        }
        events.push(SceneEvent::YearChanged { year, progress: readout.progress });
        readout
    }

    pub fn update(&mut self, dt: f32) {
        self.world.resource_mut::<TimeDelta>().0 = dt;
        self.world.resource_mut::<SystemProfiler>().begin_frame();
        self.schedule.run(&mut self.world);
    }

    pub fn resize(&mut self, viewport: PhysicalSize<u32>) {
        self.world.resource_mut::<SceneCamera>().viewport = viewport;
    }

    pub fn pointer_moved(&mut self, screen: Vec2) {
        self.world.resource_mut::<PointerState>().screen = Some(screen);
    }

    pub fn pointer_left(&mut self) {
        self.world.resource_mut::<PointerState>().screen = None;
    }

    /// Flares take the click first; otherwise the click behaves like a hover at `screen`.
    /// Returns the flare whose tooltip was toggled, if any.
    pub fn click(&mut self, screen: Vec2) -> Option<Entity> {
        self.pointer_moved(screen);
        let camera = self.world.resource::<SceneCamera>();
        let ray = camera.camera().screen_ray(screen, camera.viewport);
        if let Some((origin, dir)) = ray {
            let root = root_matrix(self.root_pose().as_ref());
            let mut query = self.world.query::<(Entity, &FlareVisual)>();
            let candidates: Vec<(Entity, FlareVisual)> =
                query.iter(&self.world).map(|(entity, visual)| (entity, *visual)).collect();
            if let Some(flare) = pick_flare(origin, dir, root, candidates.into_iter()) {
                let mut selection = self.world.resource_mut::<TooltipSelection>();
                let active = selection.0 != Some(flare);
                selection.0 = active.then_some(flare);
                self.world.resource_mut::<EventBus>().push(SceneEvent::TooltipToggled { flare, active });
                return Some(flare);
            }
        }
        self.schedule_pick.run(&mut self.world);
        None
    }

    // ---------- Body ----------

    pub fn install_body(&mut self, import: BodyImport) -> Result<Entity> {
        if self.root.is_some() {
            bail!("A body is already installed");
        }
        if let Some(placeholder) = self.placeholder.take() {
            self.world.despawn(placeholder);
        }
        let plan = plan_body(&import);
        let root = self.world.spawn((BodyRoot, plan.root, BasePose(plan.root))).id();

        for part in &plan.parts {
            let desc = &import.parts[part.part];
            let pose = Pose { translation: desc.translation, rotation: desc.rotation, scale: desc.scale };
            let mut material = MaterialSlot::new(desc.color, IMPORT_ROUGHNESS, IMPORT_METALNESS);
            material.double_sided = !part.roles.contains(PartRoles::EYE);
            let mut entity = self.world.spawn((
                BodyPart { name: desc.name.clone(), roles: part.roles },
                pose,
                BasePose(pose),
                Parent(root),
                material,
            ));
            if let Some(index) = part.tail_index {
                entity.insert(TailSegment { index });
            }
            if let (Some(index), Some(kind)) = (part.fin_index, part.fin_kind) {
                entity.insert(FinSegment { index, kind });
            }
            if let Some(t) = part.spine_t {
                entity.insert(SpineSegment { t });
            }
        }

        for (name, offset, radius) in HIT_REGIONS {
            let region = self.world.spawn((HitRegion { name: name.to_string(), offset, radius }, Parent(root))).id();
            self.world.spawn((
                HitGlow { radius: radius * GLOW_RADIUS_FACTOR, emissive_intensity: 0.3, opacity: 0.0, visible: false },
                Parent(region),
            ));
        }

        if self.halo_enabled {
            self.world.spawn((Halo { offset: HALO_OFFSET, scale: Vec2::splat(HALO_SCALE) }, Parent(root)));
        }

        let clip = import.clips.first().cloned();
        if let Some(clip) = &clip {
            log::info!("[body] Playing clip '{}' ({:.2}s); procedural swim disabled", clip.name, clip.duration);
            self.world.insert_resource(AnimationSource::Clip {
                name: clip.name.clone(),
                duration: clip.duration,
                time: 0.0,
            });
        }

        self.root = Some(root);
        self.reapply_body_textures();
        self.world.resource_mut::<EventBus>().push(SceneEvent::BodyInstalled {
            parts: plan.parts.len(),
            spine: plan.spine.len(),
            clip: clip.map(|c| c.name),
        });
        Ok(root)
    }

    pub fn body_root(&self) -> Option<Entity> {
        self.root
    }

    pub fn placeholder(&self) -> Option<Placeholder> {
        self.placeholder.and_then(|entity| self.world.get::<Placeholder>(entity).copied())
    }

    fn root_pose(&self) -> Option<Pose> {
        self.root.and_then(|root| self.world.get::<Pose>(root).copied())
    }

    fn reapply_body_textures(&mut self) {
        let mut query = self.world.query_filtered::<&mut MaterialSlot, With<BodyPart>>();
        for mut material in query.iter_mut(&mut self.world) {
            apply_body_textures(&self.body_textures, &mut material);
        }
    }

    // ---------- Textures & flares ----------

    /// Starts waiting for `expected` scale textures; zero installs untextured flares immediately.
    pub fn begin_scale_textures(&mut self, expected: usize) {
        let batch = ScaleTextureBatch::new(expected);
        if batch.is_complete() {
            self.scale_batch = Some(batch);
            self.install_flares(&[]);
        } else {
            self.scale_batch = Some(batch);
        }
    }

    pub fn handle_texture_event(&mut self, event: TextureEvent) {
        let TextureEvent { request, path, result } = event;
        let handle = match result {
            Ok(handle) => {
                self.world.resource_mut::<EventBus>().push(SceneEvent::TextureResolved { path });
                Some(handle)
            }
            Err(err) => {
                log::warn!("[assets] Could not load texture {path}: {err:#}");
                self.world
                    .resource_mut::<EventBus>()
                    .push(SceneEvent::TextureFailed { path, reason: format!("{err:#}") });
                None
            }
        };
        match request {
            TextureRequest::Body(binding) => {
                if let Some(handle) = handle {
                    self.body_textures.insert(binding, handle);
                    self.reapply_body_textures();
                }
            }
            TextureRequest::Scale => {
                let Some(batch) = self.scale_batch.as_mut() else {
                    log::warn!("[assets] Scale texture arrived with no batch pending");
                    return;
                };
                batch.settle(handle);
                if batch.is_complete() && !self.flares_installed {
                    let paths: Vec<String> = batch.resolved.iter().map(|h| h.path.clone()).collect();
                    self.install_flares(&paths);
                }
            }
        }
    }

    /// Spawns every flare once; later calls are ignored.
    pub fn install_flares(&mut self, texture_paths: &[String]) -> usize {
        if self.flares_installed {
            return 0;
        }
        let specs = build_flare_specs(
            &self.flare_config.entries,
            self.flare_config.duplicates,
            &self.timeline,
            texture_paths.len(),
        );
        for spec in &specs {
            let flare = Flare {
                base: spec.layout.base,
                dir: spec.layout.dir,
                year: spec.year,
                seed: spec.seed,
                aspect: spec.layout.aspect,
                tooltip: spec.tooltip.clone(),
                texture: spec.texture_index.map(|i| texture_paths[i].clone()),
                envelope: 0.0,
            };
            let mut entity = self.world.spawn((flare, FlareVisual::default(), FlareTooltip::default()));
            if let Some(root) = self.root {
                entity.insert(Parent(root));
            }
        }
        self.flares_installed = true;
        log::info!("[flares] Installed {} flares with {} textures", specs.len(), texture_paths.len());
        self.world.resource_mut::<EventBus>().push(SceneEvent::FlaresInstalled { count: specs.len() });
        specs.len()
    }

    pub fn flares_installed(&self) -> bool {
        self.flares_installed
    }

    pub fn flare_snapshots(&mut self) -> Vec<FlareSnapshot> {
        let mut query = self.world.query::<(Entity, &Flare, &FlareVisual, &FlareTooltip)>();
        let mut out: Vec<FlareSnapshot> = query
            .iter(&self.world)
            .map(|(entity, flare, visual, tooltip)| FlareSnapshot {
                entity,
                year: flare.year,
                seed: flare.seed,
                envelope: flare.envelope,
                visual: *visual,
                tooltip: flare.tooltip.clone(),
                tooltip_screen: tooltip.screen,
                tooltip_opacity: tooltip.opacity,
            })
            .collect();
        out.sort_by_key(|snapshot| snapshot.seed);
        out
    }

    /// Screen position of a flare's current world position.
    pub fn project_flare(&self, entity: Entity) -> Option<Vec2> {
        let visual = self.world.get::<FlareVisual>(entity)?;
        let world_pos = root_matrix(self.root_pose().as_ref()).transform_point3(visual.position);
        let camera = self.world.resource::<SceneCamera>();
        camera.camera().project_point(world_pos, camera.viewport)
    }

    // ---------- Accessors ----------

    pub fn camera(&self) -> Camera3D {
        self.world.resource::<SceneCamera>().camera()
    }

    pub fn viewport(&self) -> PhysicalSize<u32> {
        self.world.resource::<SceneCamera>().viewport
    }

    pub fn info_text(&self) -> &str {
        &self.world.resource::<InfoText>().0
    }

    pub fn hover_region(&self) -> Option<&str> {
        self.world.resource::<HoverState>().region.as_deref()
    }

    pub fn hover_indicator(&self) -> HoverIndicator {
        *self.world.resource::<HoverIndicator>()
    }

    pub fn fog(&self) -> Fog {
        *self.world.resource::<Fog>()
    }

    pub fn swim_clock(&self) -> SwimClock {
        *self.world.resource::<SwimClock>()
    }

    pub fn animation_source(&self) -> &AnimationSource {
        self.world.resource::<AnimationSource>()
    }

    pub fn tooltip_selection(&self) -> Option<Entity> {
        self.world.resource::<TooltipSelection>().0
    }

    pub fn root_pose_now(&self) -> Option<Pose> {
        self.root_pose()
    }

    pub fn part_entity(&mut self, name: &str) -> Option<Entity> {
        let mut query = self.world.query::<(Entity, &BodyPart)>();
        query.iter(&self.world).find(|(_, part)| part.name == name).map(|(entity, _)| entity)
    }

    pub fn part_pose(&mut self, name: &str) -> Option<Pose> {
        let entity = self.part_entity(name)?;
        self.world.get::<Pose>(entity).copied()
    }

    pub fn part_material(&mut self, name: &str) -> Option<MaterialSlot> {
        let entity = self.part_entity(name)?;
        self.world.get::<MaterialSlot>(entity).cloned()
    }

    pub fn hit_region_center(&mut self, name: &str) -> Option<Vec3> {
        let mut query = self.world.query::<&HitRegion>();
        let offset = query.iter(&self.world).find(|region| region.name == name)?.offset;
        Some(root_matrix(self.root_pose().as_ref()).transform_point3(offset))
    }

    pub fn hit_glows(&mut self) -> Vec<HitGlow> {
        let mut query = self.world.query::<&HitGlow>();
        query.iter(&self.world).copied().collect()
    }

    pub fn halo(&mut self) -> Option<Halo> {
        let mut query = self.world.query::<&Halo>();
        query.iter(&self.world).next().copied()
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        self.world.resource_mut::<EventBus>().drain()
    }

    pub fn profiler(&self) -> &SystemProfiler {
        self.world.resource::<SystemProfiler>()
    }
}
