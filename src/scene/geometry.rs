//! Shape descriptors and their tessellation.
//!
//! Primitive layouts follow the usual web-3D conventions: spheres are built
//! from latitude rings starting at the north pole, planes lie in the XY plane
//! facing +Z, and boxes are six single-segment planes.

use std::f32::consts::PI;

use cgmath::InnerSpace;

use crate::data_structures::model::ModelVertex;

#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Already tessellated data, e.g. from a loaded mesh file.
    Custom(GeometryData),
}

/// Indexed triangle list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometryData {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Sphere {
            radius,
            width_segments,
            height_segments,
        }
    }

    pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Plane {
            width,
            height,
            width_segments,
            height_segments,
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Box {
            width,
            height,
            depth,
        }
    }

    pub fn build(&self) -> GeometryData {
        match self {
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => build_sphere(*radius, (*width_segments).max(3), (*height_segments).max(2)),
            Geometry::Plane {
                width,
                height,
                width_segments,
                height_segments,
            } => {
                let mut data = GeometryData::default();
                push_plane(
                    &mut data,
                    PlaneAxes::XY,
                    [1.0, -1.0],
                    [*width, *height, 0.0],
                    [(*width_segments).max(1), (*height_segments).max(1)],
                );
                data
            }
            Geometry::Box {
                width,
                height,
                depth,
            } => build_box(*width, *height, *depth),
            Geometry::Custom(data) => data.clone(),
        }
    }
}

impl GeometryData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Replaces all normals with area-weighted vertex normals.
    pub fn compute_normals(&mut self) {
        let mut normals = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            if a >= self.vertices.len() || b >= self.vertices.len() || c >= self.vertices.len() {
                continue;
            }
            let pa: cgmath::Vector3<f32> = self.vertices[a].position.into();
            let pb: cgmath::Vector3<f32> = self.vertices[b].position.into();
            let pc: cgmath::Vector3<f32> = self.vertices[c].position.into();
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }
        for (vertex, normal) in self.vertices.iter_mut().zip(normals) {
            if normal.magnitude2() > 0.0 {
                vertex.normal = normal.normalize().into();
            }
        }
    }

    pub fn has_normals(&self) -> bool {
        self.vertices.iter().any(|v| v.normal != [0.0; 3])
    }
}

fn build_sphere(radius: f32, width_segments: u32, height_segments: u32) -> GeometryData {
    let mut vertices = Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
    let mut grid = Vec::with_capacity(height_segments as usize + 1);
    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // Shift the pole texels half a segment so the seam stays symmetric
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };
        let mut row = Vec::with_capacity(width_segments as usize + 1);
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;
            let theta = v * PI;
            let position = [
                -radius * phi.cos() * theta.sin(),
                radius * theta.cos(),
                radius * phi.sin() * theta.sin(),
            ];
            let normal = cgmath::Vector3::from(position);
            let normal = if normal.magnitude2() > 0.0 {
                normal.normalize()
            } else {
                cgmath::Vector3::new(0.0, 1.0, 0.0)
            };
            row.push(vertices.len() as u32);
            vertices.push(ModelVertex {
                position,
                tex_coords: [u + u_offset, v],
                normal: normal.into(),
            });
        }
        grid.push(row);
    }

    let mut indices = Vec::new();
    for iy in 0..height_segments as usize {
        for ix in 0..width_segments as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            // The pole rows collapse into single triangles
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments as usize - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    GeometryData { vertices, indices }
}

#[derive(Clone, Copy)]
struct PlaneAxes {
    u: usize,
    v: usize,
    w: usize,
}

impl PlaneAxes {
    const XY: PlaneAxes = PlaneAxes { u: 0, v: 1, w: 2 };
    const ZY: PlaneAxes = PlaneAxes { u: 2, v: 1, w: 0 };
    const XZ: PlaneAxes = PlaneAxes { u: 0, v: 2, w: 1 };
}

/// Appends a `size[0]` x `size[1]` grid lying at `size[2] / 2` along the
/// plane's normal axis.
fn push_plane(
    data: &mut GeometryData,
    axes: PlaneAxes,
    dir: [f32; 2],
    size: [f32; 3],
    segments: [u32; 2],
) {
    let [width, height, depth] = size;
    let [grid_x, grid_y] = segments;
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;
    let start = data.vertices.len() as u32;
    let normal_sign = if depth > 0.0 { 1.0 } else if depth < 0.0 { -1.0 } else { 1.0 };

    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width / 2.0;
            let mut position = [0.0; 3];
            position[axes.u] = x * dir[0];
            position[axes.v] = y * dir[1];
            position[axes.w] = depth / 2.0;
            let mut normal = [0.0; 3];
            normal[axes.w] = normal_sign;
            data.vertices.push(ModelVertex {
                position,
                tex_coords: [ix as f32 / grid_x as f32, iy as f32 / grid_y as f32],
                normal,
            });
        }
    }

    let row = grid_x + 1;
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = start + ix + row * iy;
            let b = start + ix + row * (iy + 1);
            let c = start + (ix + 1) + row * (iy + 1);
            let d = start + (ix + 1) + row * iy;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
}

fn build_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::default();
    let one = [1, 1];
    // +x, -x
    push_plane(&mut data, PlaneAxes::ZY, [-1.0, -1.0], [depth, height, width], one);
    push_plane(&mut data, PlaneAxes::ZY, [1.0, -1.0], [depth, height, -width], one);
    // +y, -y
    push_plane(&mut data, PlaneAxes::XZ, [1.0, 1.0], [width, depth, height], one);
    push_plane(&mut data, PlaneAxes::XZ, [1.0, -1.0], [width, depth, -height], one);
    // +z, -z
    push_plane(&mut data, PlaneAxes::XY, [1.0, -1.0], [width, height, depth], one);
    push_plane(&mut data, PlaneAxes::XY, [-1.0, -1.0], [width, height, -depth], one);
    data
}
