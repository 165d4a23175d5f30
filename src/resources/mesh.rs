use crate::{data_structures::model::ModelVertex, scene::GeometryData};

/**
 * Flattens an OBJ mesh into the engine's vertex layout.
 *
 * OBJ texture coordinates have their origin at the bottom left, so `v` is
 * flipped. Files without normals get area-weighted ones.
 */
pub fn obj_geometry(model: &tobj::Model) -> GeometryData {
    let m = &model.mesh;
    let vertices = (0..m.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                m.positions[i * 3],
                m.positions[i * 3 + 1],
                m.positions[i * 3 + 2],
            ],
            tex_coords: [
                m.texcoords.get(i * 2).map_or(0.0, |f| *f),
                1.0 - m.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
            ],
            normal: [
                m.normals.get(i * 3).map_or(0.0, |f| *f),
                m.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                m.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
            ],
        })
        .collect::<Vec<_>>();

    let mut data = GeometryData {
        vertices,
        // The indices are for positions, texels, and normals because `single_index` is set
        indices: m.indices.clone(),
    };
    if !data.has_normals() {
        data.compute_normals();
    }
    data
}

/// Bakes `world` into positions and normals. Mirroring transforms also get
/// their triangle winding reversed so front faces stay counter-clockwise.
pub fn bake_transform(data: &mut GeometryData, world: cgmath::Matrix4<f32>) {
    use cgmath::{InnerSpace, Matrix, SquareMatrix, Transform};

    let normal_matrix = world
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or(world);
    let normal_matrix = cgmath::Matrix3::from_cols(
        normal_matrix.x.truncate(),
        normal_matrix.y.truncate(),
        normal_matrix.z.truncate(),
    );
    for vertex in data.vertices.iter_mut() {
        let position = world.transform_point(vertex.position.into());
        vertex.position = position.into();
        let normal = normal_matrix * cgmath::Vector3::from(vertex.normal);
        if normal.magnitude2() > 0.0 {
            vertex.normal = normal.normalize().into();
        }
    }
    if world.determinant() < 0.0 {
        for tri in data.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }
}

