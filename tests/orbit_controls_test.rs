use cgmath::{InnerSpace, MetricSpace, Point3};
use skydome::{
    camera::{Camera, OrbitControls, Projection},
    config::{OrbitSettings, SceneConfig},
};

const VIEWPORT: u32 = 600;

fn setup(settings: &OrbitSettings) -> (Camera, Projection, OrbitControls) {
    let config = SceneConfig::pier();
    (
        Camera::from_settings(&config.camera),
        Projection::from_settings(800, VIEWPORT, &config.camera),
        OrbitControls::new(settings, VIEWPORT),
    )
}

fn angle(camera: &Camera, before: Point3<f32>) -> f32 {
    let a = (before - camera.target).normalize();
    let b = (camera.position - camera.target).normalize();
    a.dot(b).clamp(-1.0, 1.0).acos()
}

#[test]
fn damping_spreads_a_drag_over_frames() {
    let settings = OrbitSettings::default();
    let (mut camera, projection, mut controls) = setup(&settings);
    let start = camera.position;

    // A third of the viewport height is a sixth of a full turn
    controls.rotate(VIEWPORT as f32 / 6.0, 0.0);
    assert!(controls.update(&mut camera, &projection));
    let first = angle(&camera, start);
    let full = std::f32::consts::PI / 3.0;
    assert!((first - full * 0.25).abs() < 1e-4, "first step {}", first);

    let before = camera.position;
    assert!(controls.update(&mut camera, &projection));
    let second = angle(&camera, before);
    assert!((second - full * 0.75 * 0.25).abs() < 1e-4, "second step {}", second);

    for _ in 0..200 {
        controls.update(&mut camera, &projection);
    }
    assert!((angle(&camera, start) - full).abs() < 1e-3);
}

#[test]
fn orbit_keeps_the_distance_to_the_target() {
    let (mut camera, projection, mut controls) = setup(&OrbitSettings::default());
    let distance = camera.position.distance(camera.target);

    controls.rotate(120.0, 40.0);
    for _ in 0..20 {
        controls.update(&mut camera, &projection);
    }

    assert!((camera.position.distance(camera.target) - distance).abs() < 1e-4);
    assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn without_damping_motion_applies_at_once() {
    let settings = OrbitSettings {
        enable_damping: false,
        ..OrbitSettings::default()
    };
    let (mut camera, projection, mut controls) = setup(&settings);
    let start = camera.position;

    controls.rotate(VIEWPORT as f32 / 6.0, 0.0);
    assert!(controls.update(&mut camera, &projection));
    assert!((angle(&camera, start) - std::f32::consts::PI / 3.0).abs() < 1e-4);

    assert!(!controls.update(&mut camera, &projection));
}

#[test]
fn wheel_zooms_toward_the_target() {
    let (mut camera, projection, mut controls) = setup(&OrbitSettings::default());

    controls.zoom(1.0);
    controls.update(&mut camera, &projection);

    assert!((camera.position.distance(camera.target) - 0.95).abs() < 1e-5);

    controls.zoom(-1.0);
    controls.update(&mut camera, &projection);
    assert!((camera.position.distance(camera.target) - 1.0).abs() < 1e-5);
}

#[test]
fn zoom_can_be_disabled() {
    let settings = OrbitSettings {
        enable_zoom: false,
        ..OrbitSettings::default()
    };
    let (mut camera, projection, mut controls) = setup(&settings);

    controls.zoom(3.0);

    assert!(!controls.update(&mut camera, &projection));
    assert!((camera.position.distance(camera.target) - 1.0).abs() < 1e-5);
}

#[test]
fn pan_moves_target_and_camera_together() {
    let settings = OrbitSettings {
        enable_damping: false,
        ..OrbitSettings::default()
    };
    let (mut camera, projection, mut controls) = setup(&settings);
    let offset = camera.position - camera.target;

    controls.pan(50.0, 0.0);
    assert!(controls.update(&mut camera, &projection));

    assert_ne!(camera.target, Point3::new(0.0, 0.0, 0.0));
    assert!(((camera.position - camera.target) - offset).magnitude() < 1e-4);
}
