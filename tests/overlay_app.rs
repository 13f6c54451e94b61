use betta_viz::config::AppConfig;
use betta_viz::overlay::DrawCommand;
use betta_viz::time::Time;
use betta_viz::App;
use glam::Vec2;

fn app() -> App {
    let mut config = AppConfig::default();
    config.overlay.seed = Some(11);
    App::new(config, Time::fixed(1.0 / 60.0)).expect("app builds")
}

#[test]
fn year_selection_drives_overlay_density() {
    let mut app = app();
    assert_eq!(app.scene().state().year, 2020);
    assert_eq!(app.overlay().nodes().len(), 20);

    app.set_year(2050);
    assert_eq!(app.overlay().nodes().len(), 60);
    assert!((app.overlay().progress() - 1.0).abs() < 1e-6);

    app.set_year(2021);
    assert_eq!(app.overlay().nodes().len(), 22);
    // Small changes keep the existing nodes.
    app.set_year(2022);
    assert_eq!(app.overlay().nodes().len(), 22);
    assert!((app.overlay().intensity() - 0.1).abs() < 1e-6);
}

#[test]
fn frames_step_overlay_and_scene_together() {
    let mut app = app();
    app.set_year(2040);
    let mut steps = 0;
    for _ in 0..60 {
        let report = app.frame();
        assert!((report.dt - 1.0 / 60.0).abs() < 1e-6);
        steps += report.overlay_steps;
    }
    assert!((59..=60).contains(&steps));
    assert!((app.elapsed_seconds() - 1.0).abs() < 1e-3);
    assert!((app.scene().swim_clock().elapsed - 1.0).abs() < 1e-3);

    let canvas = app.canvas();
    assert!(matches!(canvas.commands.first(), Some(DrawCommand::Clear { .. })));
    assert!(canvas.lines().count() > 0);
    // Progress above 0.3 adds the darkening wash.
    assert_eq!(canvas.rects().count(), 1);
}

#[test]
fn pointer_feeds_scene_and_overlay() {
    let mut app = app();
    app.pointer_moved(Vec2::new(5.0, 5.0));
    app.frame();
    assert_eq!(app.scene().hover_region(), None);
    assert!(app.scene().info_text().starts_with("Spin the fish"));
}

#[test]
fn info_tabs_are_mutually_exclusive() {
    let mut app = app();
    assert_eq!(app.info_panel().active(), "story");
    assert!(app.select_tab("impact"));
    assert!(app.info_panel().is_visible("impact"));
    assert!(!app.info_panel().is_visible("story"));
    assert!(!app.select_tab("credits"));
    assert_eq!(app.info_panel().active(), "impact");
}

#[test]
fn frames_drain_scene_events() {
    let mut app = app();
    // The initial year selection is reported on the first frame.
    assert_eq!(app.frame().events, 1);
    assert_eq!(app.frame().events, 0);

    for i in 0..200 {
        app.set_year(2020 + i % 30);
        assert_eq!(app.frame().events, 1);
    }
    assert!(app.scene_mut().drain_events().is_empty());
}

#[test]
fn headless_app_keeps_placeholder_without_body() {
    let mut app = app();
    let placeholder = app.scene().placeholder().expect("placeholder before any body");
    assert_eq!(placeholder.radius, 0.5);
    app.frame();
    assert!(app.scene().placeholder().is_some());
}
