use cgmath::{InnerSpace, Vector3};
use skydome::{
    resources::{LoadedModel, LoadedPart},
    scene::{Colour, Geometry, Material, Node, NodeKind, Scene, Transform},
};

mod common;

use crate::common::test_utils::solid_image;

fn cube() -> Node {
    Node::mesh(
        "cube",
        Geometry::cuboid(1.0, 1.0, 1.0),
        Material::phong(Colour::WHITE),
    )
}

#[test]
fn added_nodes_are_attached_in_order() {
    let mut scene = Scene::new(Colour::LIGHT_GRAY);
    assert!(scene.is_empty());

    let a = scene.add(Node::ambient_light(Colour::WHITE, 0.6));
    let b = scene.add(cube());

    assert_eq!(scene.len(), 2);
    assert_eq!(scene.roots().collect::<Vec<_>>(), vec![a, b]);
    assert!(scene.is_attached(a));
    assert!(scene.is_attached(b));
    assert_eq!(scene.get(b).map(|n| n.name.as_str()), Some("cube"));
}

#[test]
fn children_reach_the_root_through_their_parent() {
    let mut scene = Scene::default();
    let group = scene.add(Node::group("group"));
    let child = scene.add_child(group, cube()).expect("parent exists");

    assert!(scene.is_attached(child));
    assert_eq!(scene.get(child).and_then(Node::parent), Some(group));
    assert_eq!(scene.get(group).map(Node::children), Some(&[child][..]));
    assert_eq!(scene.roots().collect::<Vec<_>>(), vec![group]);
}

#[test]
fn attaching_to_a_missing_parent_fails() {
    let mut scene = Scene::default();
    let group = scene.add(Node::group("group"));
    let mut other = Scene::default();
    other.add(Node::group("a"));
    let foreign = other.add(Node::group("b"));

    assert!(scene.add_child(foreign, cube()).is_err());
    assert_eq!(scene.len(), 1);
    assert!(scene.is_attached(group));
    assert!(!scene.is_attached(foreign));
}

#[test]
fn hidden_parent_hides_children() {
    let mut scene = Scene::default();
    let group = scene.add(Node::group("group"));
    let child = scene.add_child(group, cube()).expect("parent exists");
    assert!(scene.is_visible(child));

    scene.get_mut(group).expect("group exists").visible = false;

    assert!(!scene.is_visible(group));
    assert!(!scene.is_visible(child));
}

#[test]
fn world_transform_composes_parents() {
    let mut scene = Scene::default();
    let group = scene.add(Node::group("group").with_position([0.0, -1.0, 0.0]).with_scale(0.5));
    let child = scene
        .add_child(group, cube().with_position([2.0, 0.0, 0.0]))
        .expect("parent exists");

    let world = scene.world_transform(child).expect("child exists");
    assert!((world.position - Vector3::new(1.0, -1.0, 0.0)).magnitude2() < 1e-10);
    assert!((world.scale - Vector3::new(0.5, 0.5, 0.5)).magnitude2() < 1e-10);
}

#[test]
fn texture_slots_are_shared_by_path() {
    let mut scene = Scene::default();
    let backdrop = scene.texture_slot("images/pier.jpg");
    let cube = scene.texture_slot("images/large-og.jpg");

    assert_ne!(backdrop, cube);
    assert_eq!(scene.texture_slot("images/pier.jpg"), backdrop);
    assert_eq!(scene.pending_textures().len(), 2);
}

#[test]
fn resolving_a_slot_bumps_its_revision() {
    let mut scene = Scene::default();
    let slot = scene.texture_slot("images/pier.jpg");
    let entry = scene.texture(slot).expect("slot exists");
    assert!(!entry.is_resolved());
    assert_eq!(entry.revision(), 0);

    scene
        .resolve_texture(slot, solid_image(2, 2, [255, 0, 0, 255]))
        .expect("slot exists");

    let entry = scene.texture(slot).expect("slot exists");
    assert!(entry.is_resolved());
    assert_eq!(entry.revision(), 1);
    assert_eq!(entry.image().map(|i| i.dimensions()), Some((2, 2)));
    assert!(scene.pending_textures().is_empty());
}

#[test]
fn loaded_model_becomes_a_textured_group() {
    let mut scene = Scene::default();
    let model = LoadedModel {
        name: "models/eyeball.glb".to_string(),
        parts: vec![
            LoadedPart {
                name: "iris".to_string(),
                geometry: Geometry::cuboid(1.0, 1.0, 1.0).build(),
                colour: Colour::WHITE,
                opacity: 1.0,
                image: Some(0),
            },
            LoadedPart {
                name: "cornea".to_string(),
                geometry: Geometry::sphere(1.0, 8, 6).build(),
                colour: Colour::WHITE,
                opacity: 0.3,
                image: None,
            },
        ],
        images: vec![solid_image(4, 4, [0, 0, 255, 255])],
    };

    let group = scene.insert_loaded(model, Transform::at([0.0, -1.0, 0.0]));

    let children = scene.get(group).map(Node::children).expect("group exists").to_vec();
    assert_eq!(children.len(), 2);
    assert!(children.iter().all(|&c| scene.is_attached(c)));

    let iris = scene.get(children[0]).and_then(Node::material).expect("iris is a mesh");
    let slot = iris.map.expect("iris is textured");
    assert!(scene.texture(slot).is_some_and(|t| t.is_resolved()));
    assert!(!iris.transparent);

    let cornea = scene.get(children[1]).and_then(Node::material).expect("cornea is a mesh");
    assert!(cornea.transparent);
    assert!((cornea.opacity - 0.3).abs() < 1e-6);
    assert!(cornea.map.is_none());

    assert!(matches!(
        scene.get(group).map(|n| &n.kind),
        Some(NodeKind::Group)
    ));
}
