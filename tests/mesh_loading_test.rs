use std::io::Cursor;

use cgmath::{InnerSpace, Matrix4, Vector3};
use futures::executor::block_on;
use skydome::{
    resources::{
        load_model,
        mesh::bake_transform,
        texture::{decode_image, load_image},
    },
    scene::{Colour, Geometry, GeometryData},
};

#[test]
fn obj_file_is_loaded_with_computed_normals() {
    let model = block_on(load_model("models/tetrahedron.obj")).expect("fixture exists");

    assert_eq!(model.parts.len(), 1);
    let part = &model.parts[0];
    assert_eq!(part.name, "tetrahedron");
    assert_eq!(part.colour, Colour::WHITE);
    assert_eq!(part.opacity, 1.0);
    assert_eq!(part.image, None);
    assert_eq!(part.geometry.vertices.len(), 4);
    assert_eq!(part.geometry.triangle_count(), 4);
    for vertex in &part.geometry.vertices {
        let normal = Vector3::from(vertex.normal);
        // Every corner normal points away from the centre
        assert!((normal.magnitude() - 1.0).abs() < 1e-5);
        assert!(normal.dot(Vector3::from(vertex.position)) > 0.0);
    }
}

#[test]
fn eyeball_glb_keeps_one_part_per_primitive() {
    let model = block_on(load_model("models/eyeball.glb")).expect("asset exists");

    assert_eq!(model.parts.len(), 3);
    assert!(model.images.is_empty());
    let sclera = &model.parts[0];
    assert_eq!(sclera.name, "eyeball");
    assert_eq!(sclera.opacity, 1.0);
    assert_eq!(sclera.geometry.triangle_count(), 24 * 32 * 2);
    for vertex in &sclera.geometry.vertices {
        let radius = Vector3::from(vertex.position).magnitude();
        assert!((radius - 1.0).abs() < 1e-4, "{}", radius);
    }
    // The pupil sits in front of the iris along +z
    let front = |index: usize| {
        model.parts[index]
            .geometry
            .vertices
            .iter()
            .map(|vertex| vertex.position[2])
            .fold(f32::MIN, f32::max)
    };
    assert!(front(2) > front(1));
    assert!(front(1) > front(0));
}

#[test]
fn shipped_images_decode() {
    let backdrop = block_on(load_image("images/pier.jpg")).expect("asset exists");
    assert_eq!(backdrop.dimensions(), (256, 128));
    let cube = block_on(load_image("images/large-og.jpg")).expect("asset exists");
    assert_eq!(cube.dimensions(), (64, 64));
}

#[test]
fn unknown_mesh_format_is_rejected() {
    let err = block_on(load_model("models/eyeball.fbx")).expect_err("fbx is not supported");
    assert!(format!("{:#}", err).contains("unsupported mesh format"));
}

#[test]
fn missing_mesh_file_names_the_path() {
    let err = block_on(load_model("models/missing.obj")).expect_err("file does not exist");
    assert!(format!("{:#}", err).contains("missing.obj"));
}

#[test]
fn baking_a_translation_moves_positions_only() {
    let mut data = Geometry::plane(2.0, 2.0, 1, 1).build();
    let original = data.clone();

    bake_transform(&mut data, Matrix4::from_translation(Vector3::new(0.0, -1.0, 0.0)));

    for (baked, before) in data.vertices.iter().zip(&original.vertices) {
        assert_eq!(baked.position[1], before.position[1] - 1.0);
        assert_eq!(baked.normal, before.normal);
    }
    assert_eq!(data.indices, original.indices);
}

#[test]
fn baking_a_mirror_keeps_front_faces() {
    let mut data = GeometryData {
        vertices: Geometry::plane(1.0, 1.0, 1, 1).build().vertices,
        indices: vec![0, 1, 2],
    };

    bake_transform(&mut data, Matrix4::from_nonuniform_scale(-1.0, 1.0, 1.0));

    assert_eq!(data.indices, vec![0, 2, 1]);
}

#[test]
fn images_decode_with_a_mime_hint() {
    let source = image::RgbaImage::from_pixel(3, 2, image::Rgba([12, 34, 56, 255]));
    let mut bytes = Vec::new();
    source
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("png encodes");

    let decoded = decode_image(&bytes, Some("image/png")).expect("png decodes");

    assert_eq!(decoded, source);
    assert!(decode_image(&bytes[..8], None).is_err());
}
