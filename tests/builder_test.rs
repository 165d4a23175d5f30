use std::f32::consts::PI;

use cgmath::Vector3;
use skydome::{
    builder::{
        Built, CUBE_POSITION, GROUND_OPACITY, HELPER_SIZE, LIGHT_INTENSITY, LIGHT_POSITION,
        PendingLoad, SceneBuilder,
    },
    config::{SceneConfig, Variant},
    scene::{Colour, Geometry, NodeKind, Shading, Side},
};

fn names(built: &Built) -> Vec<String> {
    built.scene.iter().map(|(_, node)| node.name.clone()).collect()
}

#[test]
fn pier_scene_is_built_in_order() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();

    assert_eq!(
        names(&built),
        vec![
            "ambient light",
            "directional light",
            "directional light helper",
            "backdrop",
            "ground",
            "cube",
        ]
    );
    assert!(built.scene.iter().all(|(id, _)| built.scene.is_attached(id)));
    assert_eq!(built.scene.background, Colour::LIGHT_GRAY);
    assert_eq!(built.scene.fog, None);
}

#[test]
fn lights_match_the_presets() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();
    let nodes: Vec<_> = built.scene.iter().map(|(_, node)| node).collect();

    assert!(matches!(
        nodes[0].kind,
        NodeKind::AmbientLight { colour, intensity }
            if colour == Colour::WHITE && intensity == LIGHT_INTENSITY
    ));
    assert!(matches!(
        nodes[1].kind,
        NodeKind::DirectionalLight { intensity, .. } if intensity == LIGHT_INTENSITY
    ));
    assert_eq!(nodes[1].transform.position, Vector3::from(LIGHT_POSITION));
    assert!(nodes[1].cast_shadow);

    match nodes[2].kind {
        NodeKind::DirectionalLightHelper {
            light,
            size,
            colour,
        } => {
            assert_eq!(light.index(), 1);
            assert_eq!(size, HELPER_SIZE);
            assert_eq!(colour, Colour::BLACK);
        }
        ref other => panic!("expected a light helper, got {:?}", other),
    }
}

#[test]
fn backdrop_is_an_unlit_double_sided_sphere() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();
    let (_, backdrop) = built.scene.iter().nth(3).expect("backdrop exists");

    let NodeKind::Mesh { geometry, material } = &backdrop.kind else {
        panic!("backdrop is not a mesh");
    };
    assert_eq!(*geometry, Geometry::sphere(5.0, 32, 32));
    assert_eq!(material.shading, Shading::Basic);
    assert_eq!(material.side, Side::Double);
    let slot = material.map.expect("backdrop is textured");
    assert_eq!(
        built.scene.texture(slot).map(|t| t.path()),
        Some("images/pier.jpg")
    );
}

#[test]
fn ground_lies_flat_below_the_cube() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();
    let (_, ground) = built.scene.iter().nth(4).expect("ground exists");

    let material = ground.material().expect("ground is a mesh");
    assert!(material.transparent);
    assert_eq!(material.opacity, GROUND_OPACITY);
    assert_eq!(material.side, Side::Double);
    assert!(matches!(material.shading, Shading::Phong { .. }));
    assert_eq!(ground.transform.rotation.x, -PI / 2.0);
    assert_eq!(ground.transform.position, Vector3::new(0.0, -3.0, 0.0));
    assert!(ground.receive_shadow);
    assert!(!ground.cast_shadow);
}

#[test]
fn cube_is_returned_and_casts_shadows() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();
    let cube = built.scene.get(built.cube).expect("cube exists");

    assert_eq!(cube.name, "cube");
    assert_eq!(cube.transform.position, Vector3::from(CUBE_POSITION));
    assert!(cube.cast_shadow && cube.receive_shadow);
    let material = cube.material().expect("cube is a mesh");
    assert!(!material.transparent);
    let slot = material.map.expect("cube is textured");
    assert_eq!(
        built.scene.texture(slot).map(|t| t.path()),
        Some("images/large-og.jpg")
    );
}

#[test]
fn pier_waits_for_two_textures() {
    let built = SceneBuilder::new(&SceneConfig::pier()).build();

    let paths: Vec<_> = built.loads.iter().map(PendingLoad::path).collect();
    assert_eq!(paths, vec!["images/pier.jpg", "images/large-og.jpg"]);
    assert!(built
        .loads
        .iter()
        .all(|load| matches!(load, PendingLoad::Texture(_))));
}

#[test]
fn eyeball_adds_fog_sphere_and_mesh_load() {
    let config = SceneConfig::eyeball();
    let built = SceneBuilder::new(&config).build();

    assert_eq!(names(&built).last().map(String::as_str), Some("reflective sphere"));
    assert!(built.scene.fog.is_some());

    let (_, sphere) = built.scene.iter().last().expect("sphere exists");
    let material = sphere.material().expect("sphere is a mesh");
    assert!(matches!(material.shading, Shading::Reflective { .. }));
    // Reflects the backdrop image without loading it twice
    let (_, backdrop) = built.scene.iter().nth(3).expect("backdrop exists");
    assert_eq!(material.env_map, backdrop.material().and_then(|m| m.map));

    assert_eq!(built.loads.len(), 3);
    match built.loads.last() {
        Some(PendingLoad::Mesh(load)) => {
            let mesh = config.loaded_mesh.as_ref().expect("eyeball loads a mesh");
            assert_eq!(load.path, mesh.path);
            assert_eq!(load.transform.position, Vector3::from(mesh.position));
            assert_eq!(load.transform.scale, Vector3::new(mesh.scale, mesh.scale, mesh.scale));
        }
        other => panic!("expected a mesh load, got {:?}", other),
    }
}

#[test]
fn camera_follows_the_preset() {
    let config = SceneConfig::for_variant(Variant::Pier);
    let built = SceneBuilder::new(&config).build();

    assert_eq!(built.camera.position, [-1.0, 0.0, 0.0]);
    assert_eq!(built.camera.fovy_degrees, 45.0);
    assert_eq!(built.camera.znear, 1.0);
    assert_eq!(built.camera.zfar, 1000.0);
    assert!(config.controls.enable_damping);
    assert_eq!(config.controls.damping_factor, 0.25);
    assert!(config.controls.enable_zoom);
    assert!(config.render.antialias && config.render.shadows);
}

#[test]
fn variants_share_the_pier_layout() {
    let pier = SceneConfig::pier();
    let eyeball = SceneConfig::eyeball();

    assert_eq!(eyeball.variant, Variant::Eyeball);
    assert_eq!(eyeball.camera, pier.camera);
    assert_eq!(eyeball.backdrop_texture, pier.backdrop_texture);
    assert_eq!(SceneConfig::default(), pier);
}
