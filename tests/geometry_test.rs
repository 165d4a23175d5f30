use cgmath::{InnerSpace, Vector3};
use skydome::scene::{Euler, Geometry, GeometryData, Transform};

fn normal(data: &GeometryData, idx: u32) -> Vector3<f32> {
    data.vertices[idx as usize].normal.into()
}

fn position(data: &GeometryData, idx: u32) -> Vector3<f32> {
    data.vertices[idx as usize].position.into()
}

#[test]
fn backdrop_sphere_has_expected_topology() {
    let data = Geometry::sphere(5.0, 32, 32).build();

    assert_eq!(data.vertices.len(), 33 * 33);
    // The pole rows collapse to a single triangle per segment
    assert_eq!(data.triangle_count(), 2 * 32 * 32 - 2 * 32);
    for vertex in &data.vertices {
        let distance = Vector3::from(vertex.position).magnitude();
        assert!((distance - 5.0).abs() < 1e-4, "vertex off the sphere: {}", distance);
    }
}

#[test]
fn sphere_indices_stay_in_bounds() {
    let data = Geometry::sphere(0.5, 8, 6).build();
    let count = data.vertices.len() as u32;
    assert!(data.indices.iter().all(|&i| i < count));
}

#[test]
fn sphere_normals_point_outward() {
    let data = Geometry::sphere(2.0, 16, 12).build();
    for tri in data.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]];
        let face = (position(&data, b) - position(&data, a))
            .cross(position(&data, c) - position(&data, a));
        let centre = (position(&data, a) + position(&data, b) + position(&data, c)) / 3.0;
        assert!(face.dot(centre) > 0.0, "triangle {:?} winds inward", tri);
    }
}

#[test]
fn ground_plane_has_expected_topology() {
    let data = Geometry::plane(100.0, 100.0, 100, 100).build();

    assert_eq!(data.vertices.len(), 101 * 101);
    assert_eq!(data.triangle_count(), 2 * 100 * 100);
    for vertex in &data.vertices {
        assert_eq!(vertex.normal, [0.0, 0.0, 1.0]);
        assert_eq!(vertex.position[2], 0.0);
        assert!(vertex.position[0].abs() <= 50.0 && vertex.position[1].abs() <= 50.0);
    }
}

#[test]
fn plane_faces_its_normal() {
    let data = Geometry::plane(2.0, 2.0, 1, 1).build();
    let tri = &data.indices[0..3];
    let face = (position(&data, tri[1]) - position(&data, tri[0]))
        .cross(position(&data, tri[2]) - position(&data, tri[0]));
    assert!(face.dot(normal(&data, tri[0])) > 0.0);
}

#[test]
fn unit_cube_is_six_faces() {
    let data = Geometry::cuboid(1.0, 1.0, 1.0).build();

    assert_eq!(data.vertices.len(), 24);
    assert_eq!(data.triangle_count(), 12);
    for vertex in &data.vertices {
        assert!(vertex.position.iter().all(|c| c.abs() == 0.5));
        let n = Vector3::from(vertex.normal);
        assert!((n.magnitude() - 1.0).abs() < 1e-6);
        // Each face normal points away from the centre
        assert!(n.dot(Vector3::from(vertex.position)) > 0.0);
    }
}

#[test]
fn computed_normals_follow_winding() {
    let mut data = Geometry::plane(1.0, 1.0, 1, 1).build();
    data.vertices.iter_mut().for_each(|v| v.normal = [0.0; 3]);
    assert!(!data.has_normals());

    data.compute_normals();

    assert!(data.has_normals());
    for vertex in &data.vertices {
        let n = Vector3::from(vertex.normal);
        assert!((n - Vector3::unit_z()).magnitude() < 1e-5);
    }
}

#[test]
fn custom_geometry_builds_to_itself() {
    let data = Geometry::cuboid(2.0, 1.0, 3.0).build();
    assert_eq!(Geometry::Custom(data.clone()).build(), data);
}

#[test]
fn euler_rotations_accumulate() {
    let mut transform = Transform::at([0.0, -2.0, 2.5]);
    for _ in 0..3 {
        transform.rotate_by(Euler::new(0.001, 0.001, 0.001));
    }
    assert!((transform.rotation.x - 0.003).abs() < 1e-6);
    assert!((transform.rotation.y - 0.003).abs() < 1e-6);
    assert!((transform.rotation.z - 0.003).abs() < 1e-6);
    assert_eq!(transform.position, Vector3::new(0.0, -2.0, 2.5));
}

#[test]
fn ground_rotation_turns_plane_normal_up() {
    let rotation = Euler::new(-std::f32::consts::PI / 2.0, 0.0, 0.0).to_quaternion();
    let up = rotation * Vector3::unit_z();
    assert!((up - Vector3::unit_y()).magnitude() < 1e-5);
}
