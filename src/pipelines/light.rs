//! Light, fog and shadow-map state shared by every mesh draw.
//!
//! All lights of a scene collapse into one [`LightUniform`]: summed ambient
//! contributions and the first visible directional light. The same buffer is
//! read by the shadow pass (light view-projection) and the colour passes.

use cgmath::{EuclideanSpace, InnerSpace};
use wgpu::util::DeviceExt;

use crate::{
    camera::OPENGL_TO_WGPU_MATRIX,
    data_structures::texture::Texture,
    scene::{NodeKind, Scene},
};

/// Half extent of the light's orthographic shadow frustum.
pub const SHADOW_EXTENT: f32 = 5.0;
pub const SHADOW_NEAR: f32 = 0.5;
pub const SHADOW_FAR: f32 = 500.0;

#[derive(Debug)]
pub struct LightResources {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub shadow_map: Texture,
    pub shadow_bind_group: wgpu::BindGroup,
    pub shadow_bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    view_proj: [[f32; 4]; 4],
    ambient: [f32; 4],
    // xyz: direction the light travels, w: 1 when shadows are sampled
    direction: [f32; 4],
    colour: [f32; 4],
    // w: 1 when fog is enabled
    fog_colour: [f32; 4],
    // near, far, texel size of the shadow map, unused
    fog_range: [f32; 4],
}

/// The directional light a scene resolves to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalSource {
    pub position: cgmath::Point3<f32>,
    pub target: cgmath::Point3<f32>,
    pub cast_shadow: bool,
}

impl DirectionalSource {
    pub fn direction(&self) -> cgmath::Vector3<f32> {
        let dir = self.target - self.position;
        if dir.magnitude2() > f32::EPSILON {
            dir.normalize()
        } else {
            -cgmath::Vector3::unit_y()
        }
    }

    /// Orthographic view-projection used to render and sample the shadow map.
    pub fn view_proj(&self) -> cgmath::Matrix4<f32> {
        let up = if self.direction().y.abs() > 0.99 {
            cgmath::Vector3::unit_z()
        } else {
            cgmath::Vector3::unit_y()
        };
        let view = cgmath::Matrix4::look_at_rh(self.position, self.target, up);
        let proj = cgmath::ortho(
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            -SHADOW_EXTENT,
            SHADOW_EXTENT,
            SHADOW_NEAR,
            SHADOW_FAR,
        );
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

impl LightUniform {
    /// No light at all: meshes lit by the Phong path render black.
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_proj: cgmath::Matrix4::identity().into(),
            ambient: [0.0; 4],
            direction: [0.0, -1.0, 0.0, 0.0],
            colour: [0.0; 4],
            fog_colour: [0.0; 4],
            fog_range: [0.0, 1.0, 0.0, 0.0],
        }
    }

    /// Collects the lights and fog of `scene`.
    pub fn from_scene(scene: &Scene, shadows: bool, shadow_map_size: u32) -> Self {
        let mut uniform = Self::new();
        let mut directional_found = false;
        for (id, node) in scene.iter() {
            if !scene.is_visible(id) {
                continue;
            }
            match &node.kind {
                NodeKind::AmbientLight { colour, intensity } => {
                    let [r, g, b] = colour.scaled_linear(*intensity);
                    uniform.ambient[0] += r;
                    uniform.ambient[1] += g;
                    uniform.ambient[2] += b;
                }
                NodeKind::DirectionalLight {
                    colour,
                    intensity,
                    target,
                } if !directional_found => {
                    let Some(world) = scene.world_transform(id) else {
                        continue;
                    };
                    directional_found = true;
                    let source = DirectionalSource {
                        position: cgmath::Point3::from_vec(world.position),
                        target: (*target).into(),
                        cast_shadow: node.cast_shadow && shadows,
                    };
                    let [r, g, b] = colour.scaled_linear(*intensity);
                    let dir = source.direction();
                    uniform.colour = [r, g, b, 1.0];
                    uniform.direction = [
                        dir.x,
                        dir.y,
                        dir.z,
                        if source.cast_shadow { 1.0 } else { 0.0 },
                    ];
                    uniform.view_proj = source.view_proj().into();
                }
                _ => (),
            }
        }
        if let Some(fog) = scene.fog {
            let [r, g, b] = fog.colour.to_linear();
            uniform.fog_colour = [r, g, b, 1.0];
            uniform.fog_range[0] = fog.near;
            uniform.fog_range[1] = fog.far;
        }
        uniform.fog_range[2] = 1.0 / shadow_map_size.max(1) as f32;
        uniform
    }

    pub fn ambient(&self) -> [f32; 3] {
        [self.ambient[0], self.ambient[1], self.ambient[2]]
    }

    pub fn colour(&self) -> [f32; 3] {
        [self.colour[0], self.colour[1], self.colour[2]]
    }

    pub fn direction(&self) -> [f32; 3] {
        [self.direction[0], self.direction[1], self.direction[2]]
    }

    pub fn samples_shadows(&self) -> bool {
        self.direction[3] > 0.5
    }

    pub fn has_fog(&self) -> bool {
        self.fog_colour[3] > 0.5
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device, shadow_map_size: u32) -> Self {
        let buffer = mk_buffer(device, LightUniform::new());
        let shadow_map = Texture::create_shadow_map(device, shadow_map_size);
        let bind_group_layout = mk_bind_group_layout(device);
        let shadow_bind_group_layout = mk_shadow_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &shadow_map);
        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &shadow_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("shadow_bind_group"),
        });
        Self {
            buffer,
            bind_group,
            bind_group_layout,
            shadow_map,
            shadow_bind_group,
            shadow_bind_group_layout,
        }
    }

    pub fn write(&self, queue: &wgpu::Queue, uniform: LightUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Depth,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

fn mk_shadow_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("shadow_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    shadow_map: &Texture,
) -> wgpu::BindGroup {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::TextureView(&shadow_map.view),
        },
    ];
    if let Some(sampler) = &shadow_map.sampler {
        entries.push(wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::Sampler(sampler),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &entries,
        label: Some("light_bind_group"),
    })
}
