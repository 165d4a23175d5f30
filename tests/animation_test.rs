use skydome::{
    animation::AnimationLoop,
    config::AnimationSettings,
    scene::{Euler, Node, Scene},
};

mod common;

use crate::common::test_utils::build_state;

const EPS: f32 = 1e-6;

fn assert_rotation(actual: Euler, expected: [f32; 3]) {
    assert!(
        (actual.x - expected[0]).abs() < EPS
            && (actual.y - expected[1]).abs() < EPS
            && (actual.z - expected[2]).abs() < EPS,
        "expected {:?}, got {:?}",
        expected,
        actual
    );
}

#[test]
fn cube_turns_a_fixed_step_per_frame() {
    let (mut state, _) = build_state(&skydome::SceneConfig::pier());
    let cube = state.animation.cube();

    for _ in 0..10 {
        state.animation.advance(&mut state.scene);
    }

    let rotation = state.scene.get(cube).expect("cube exists").transform.rotation;
    assert_rotation(rotation, [0.01, 0.01, 0.01]);
    assert_eq!(state.animation.frames(), 10);
}

#[test]
fn first_frame_applies_one_step() {
    let (mut state, _) = build_state(&skydome::SceneConfig::pier());
    let cube = state.animation.cube();
    assert_rotation(state.scene.get(cube).expect("cube exists").transform.rotation, [0.0; 3]);

    state.animation.advance(&mut state.scene);

    assert_rotation(
        state.scene.get(cube).expect("cube exists").transform.rotation,
        [0.001, 0.001, 0.001],
    );
}

#[test]
fn mesh_rotation_waits_for_the_mesh() {
    let mut scene = Scene::default();
    let cube = scene.add(Node::group("cube"));
    let settings = AnimationSettings::default();
    let mut animation = AnimationLoop::new(cube, &settings);

    animation.advance(&mut scene);
    animation.advance(&mut scene);
    assert_eq!(animation.loaded_mesh(), None);

    let mesh = scene.add(Node::group("mesh"));
    animation.attach_loaded_mesh(mesh);
    animation.advance(&mut scene);

    // Only the frame after the mesh arrived turned it
    let rotation = scene.get(mesh).expect("mesh exists").transform.rotation;
    assert_rotation(rotation, [settings.mesh_step.x, settings.mesh_step.y, settings.mesh_step.z]);
    let rotation = scene.get(cube).expect("cube exists").transform.rotation;
    assert_rotation(rotation, [0.003, 0.003, 0.003]);
}

#[test]
fn mesh_turns_a_fixed_step_per_frame_once_attached() {
    let mut scene = Scene::default();
    let cube = scene.add(Node::group("cube"));
    let mut animation = AnimationLoop::new(cube, &AnimationSettings::default());
    for _ in 0..4 {
        animation.advance(&mut scene);
    }

    let mesh = scene.add(Node::group("mesh"));
    animation.attach_loaded_mesh(mesh);
    for _ in 0..25 {
        animation.advance(&mut scene);
    }

    let rotation = scene.get(mesh).expect("mesh exists").transform.rotation;
    assert_rotation(rotation, [0.0, 0.25, 0.0]);
    let rotation = scene.get(cube).expect("cube exists").transform.rotation;
    assert_rotation(rotation, [0.029, 0.029, 0.029]);
}

#[test]
fn missing_cube_does_not_stop_the_loop() {
    let mut scene = Scene::default();
    let cube = scene.add(Node::group("cube"));
    let mut animation = AnimationLoop::new(cube, &AnimationSettings::default());

    let mut empty = Scene::default();
    animation.advance(&mut empty);
    animation.advance(&mut scene);

    assert_eq!(animation.frames(), 2);
    assert_rotation(
        scene.get(cube).expect("cube exists").transform.rotation,
        [0.001, 0.001, 0.001],
    );
}
