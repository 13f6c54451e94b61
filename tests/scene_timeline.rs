use betta_viz::assets::{BodyImport, BodyPartDesc};
use betta_viz::config::AppConfig;
use betta_viz::ecs::systems::{fog_for, tinted_material};
use betta_viz::ecs::SceneWorld;
use betta_viz::state::eased_progress;
use betta_viz::timeline::Timeline;
use glam::Vec3;

fn betta_import() -> BodyImport {
    let mut import = BodyImport::from_parts(vec![
        BodyPartDesc::new("Body_Head", Vec3::new(0.0, 0.0, 0.3)).with_color(Vec3::new(0.9, 0.2, 0.3)),
        BodyPartDesc::new("Body_Mid", Vec3::new(0.0, 0.0, 0.0)).with_color(Vec3::new(0.8, 0.1, 0.4)),
        BodyPartDesc::new("Tail", Vec3::new(0.0, 0.0, -0.3)),
        BodyPartDesc::new("Pectoral_L", Vec3::new(0.1, 0.0, 0.1)),
        BodyPartDesc::new("Eye_L", Vec3::new(0.05, 0.05, 0.28)),
    ]);
    import.bounds = Some((Vec3::new(-0.3, -0.1, -0.1), Vec3::new(0.3, 0.1, 0.1)));
    import
}

fn scene() -> SceneWorld {
    let mut scene = SceneWorld::new(&AppConfig::default(), Timeline::standard());
    scene.install_body(betta_import()).expect("body installs");
    scene.install_flares(&[]);
    scene
}

#[test]
fn scrubbing_to_2029_updates_every_consumer() {
    let mut scene = scene();
    let readout = scene.set_year(2029);
    assert!((readout.progress - 0.525).abs() < 1e-6);
    assert_eq!(readout.label, "Carbon Reckoning");
    assert!(readout.fact.starts_with("U.S. AI data centers projected to consume 720 billion gallons"));
    assert_eq!(readout.to_string(), "2029: Carbon Reckoning");

    scene.update(1.0 / 60.0);

    let eased = eased_progress(scene.state().progress);
    let fog = scene.fog();
    assert_eq!(fog, fog_for(eased));
    assert!(fog.density > 0.01 && fog.density < 0.04);

    let head = scene.part_material("Body_Head").expect("head material");
    let (color, roughness) = tinted_material((Vec3::new(0.9, 0.2, 0.3), 0.45), eased);
    assert!((head.color - color).length() < 1e-6);
    assert!((head.roughness - roughness).abs() < 1e-6);

    // 2022 through 2030 are inside their windows at 2029; later years are still pending.
    let flares = scene.flare_snapshots();
    assert_eq!(flares.len(), 66);
    let visible: Vec<_> = flares.iter().filter(|f| f.visual.visible).collect();
    assert_eq!(visible.len(), 30);
    assert!(visible.iter().all(|f| f.year <= 2030));
    assert!(flares.iter().filter(|f| f.year >= 2032).all(|f| !f.visual.visible && f.envelope == 0.0));
}

#[test]
fn year_2028_shows_its_own_checkpoint() {
    let mut scene = scene();
    let readout = scene.set_year(2028);
    assert!((readout.progress - 0.45).abs() < 1e-6);
    assert_eq!(readout.label, "Water Tipping Point");
    scene.update(1.0 / 60.0);
    let visible = scene.flare_snapshots().iter().filter(|f| f.visual.visible).count();
    assert_eq!(visible, 24);
}

#[test]
fn appearance_is_idempotent_across_frames() {
    let mut scene = scene();
    scene.set_year(2027);
    assert!((scene.state().progress - 0.40).abs() < 1e-6);
    scene.update(0.016);
    let first = scene.part_material("Body_Mid").expect("mid material");
    for _ in 0..10 {
        scene.update(0.016);
    }
    let later = scene.part_material("Body_Mid").expect("mid material");
    assert_eq!(first.color, later.color);
    assert_eq!(first.roughness, later.roughness);
    assert_eq!(later.original, Some((Vec3::new(0.8, 0.1, 0.4), 0.45)));

    // Returning to the baseline restores the snapshot exactly.
    scene.set_year(2020);
    scene.update(0.016);
    let restored = scene.part_material("Body_Mid").expect("mid material");
    assert_eq!(restored.color, Vec3::new(0.8, 0.1, 0.4));
    assert!((restored.roughness - 0.45).abs() < 1e-6);
}

#[test]
fn hit_glows_stay_hidden_by_default() {
    let mut scene = scene();
    scene.set_year(2050);
    scene.update(0.016);
    let glows = scene.hit_glows();
    assert_eq!(glows.len(), 4);
    for glow in glows {
        assert!(!glow.visible);
        assert_eq!(glow.opacity, 0.0);
        assert!((glow.emissive_intensity - 1.5).abs() < 1e-5);
    }
}

#[test]
fn hit_glows_can_be_enabled_in_config() {
    let mut config = AppConfig::default();
    config.appearance.hit_glow_visible = true;
    let mut scene = SceneWorld::new(&config, Timeline::standard());
    scene.install_body(betta_import()).expect("body installs");
    scene.update(0.016);
    assert!(scene.hit_glows().iter().all(|glow| glow.visible && glow.opacity > 0.0));
}

#[test]
fn eyes_are_single_sided_and_halo_sits_behind_body() {
    let mut scene = scene();
    assert!(!scene.part_material("Eye_L").expect("eye").double_sided);
    assert!(scene.part_material("Tail").expect("tail").double_sided);
    let halo = scene.halo().expect("halo enabled by default");
    assert_eq!(halo.offset, Vec3::new(0.0, 0.3, -0.55));
}

#[test]
fn second_body_is_rejected() {
    let mut scene = scene();
    let err = scene.install_body(betta_import()).unwrap_err();
    assert!(err.to_string().contains("already installed"));
}

#[test]
fn placeholder_gives_way_to_the_body() {
    let mut scene = SceneWorld::new(&AppConfig::default(), Timeline::standard());
    let placeholder = scene.placeholder().expect("placeholder shown while loading");
    assert_eq!(placeholder.radius, 0.5);
    assert!((placeholder.color - Vec3::new(61.0 / 255.0, 176.0 / 255.0, 1.0)).length() < 1e-6);
    assert_eq!((placeholder.roughness, placeholder.metalness), (0.3, 0.4));

    scene.install_body(betta_import()).expect("body installs");
    assert!(scene.placeholder().is_none());
}
