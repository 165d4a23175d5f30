//! GPU mirror of a [`Scene`].
//!
//! The scene itself is plain data. [`SceneGraph::sync`] runs once per frame
//! and brings the GPU side up to date: nodes appended since the last frame
//! get buffers, world transforms and material parameters are rewritten,
//! texture slots that resolved (or changed) are uploaded and rebound, and the
//! light uniform is recomputed. [`SceneGraph::on_render`] then hands the
//! engine what to draw.

use std::{cmp::Ordering, collections::HashMap};

use cgmath::{EuclideanSpace, InnerSpace};
use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        instance::Instance,
        model::{self, LineVertex, Model},
        texture::{Texture, create_default_sampler},
    },
    pipelines::light::LightUniform,
    render::{Instanced, Lines, Render},
    scene::{Colour, Material, NodeId, NodeKind, Scene, Shading, Side, TextureSlot},
};

/// Vertices of a directional light helper: four square edges and the line
/// toward the target.
pub const HELPER_VERTICES: usize = 10;

/// Per-material parameters read by `mesh.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    colour: [f32; 4],
    params: [f32; 4],
    maps: [f32; 4],
}

fn flag(value: bool) -> f32 {
    if value { 1.0 } else { 0.0 }
}

impl MaterialUniform {
    /// `map_bound` / `env_bound` tell whether the material's texture slots
    /// already hold an uploaded image. Unbound maps are ignored by the shader,
    /// so the material falls back to its plain colour.
    pub fn from_material(
        material: &Material,
        map_bound: bool,
        env_bound: bool,
        receive_shadow: bool,
    ) -> Self {
        let [r, g, b] = material.colour.to_linear();
        let opacity = if material.transparent {
            material.opacity
        } else {
            1.0
        };
        let (shading, shininess, reflectivity) = match material.shading {
            Shading::Basic => (0.0, 0.0, 0.0),
            Shading::Phong { shininess } => (1.0, shininess, 0.0),
            Shading::Reflective { reflectivity } => (2.0, 30.0, reflectivity),
        };
        Self {
            colour: [r, g, b, opacity],
            params: [shading, shininess, reflectivity, flag(receive_shadow)],
            maps: [
                flag(map_bound && material.map.is_some()),
                flag(env_bound && material.env_map.is_some()),
                0.0,
                0.0,
            ],
        }
    }

    pub fn colour(&self) -> [f32; 3] {
        [self.colour[0], self.colour[1], self.colour[2]]
    }

    pub fn opacity(&self) -> f32 {
        self.colour[3]
    }

    pub fn has_map(&self) -> bool {
        self.maps[0] > 0.5
    }

    pub fn has_env_map(&self) -> bool {
        self.maps[1] > 0.5
    }

    pub fn receives_shadow(&self) -> bool {
        self.params[3] > 0.5
    }
}

/// Line-list vertices of a directional light helper: a square of half size
/// `size` facing the target, centred on the light, plus a line to the target.
pub fn helper_lines(
    position: cgmath::Point3<f32>,
    target: cgmath::Point3<f32>,
    size: f32,
    colour: Colour,
) -> [LineVertex; HELPER_VERTICES] {
    let dir = target - position;
    let dir = if dir.magnitude2() > f32::EPSILON {
        dir.normalize()
    } else {
        -cgmath::Vector3::unit_y()
    };
    let right = dir.cross(cgmath::Vector3::unit_y());
    let right = if right.magnitude2() > f32::EPSILON {
        right.normalize()
    } else {
        cgmath::Vector3::unit_x()
    };
    let up = right.cross(dir);
    let corners = [
        position + (-right + up) * size,
        position + (right + up) * size,
        position + (right - up) * size,
        position + (-right - up) * size,
    ];
    let colour = colour.to_linear();
    let v = |p: cgmath::Point3<f32>| LineVertex {
        position: p.into(),
        colour,
    };
    [
        v(corners[0]),
        v(corners[1]),
        v(corners[1]),
        v(corners[2]),
        v(corners[2]),
        v(corners[3]),
        v(corners[3]),
        v(corners[0]),
        v(position),
        v(target),
    ]
}

type Binding = Option<(TextureSlot, u64)>;

#[derive(Debug)]
struct MeshEntry {
    node: NodeId,
    model: Model,
    instance_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    bound: (Binding, Binding),
    side: Side,
    transparent: bool,
    cast_shadow: bool,
    visible: bool,
    position: cgmath::Point3<f32>,
}

impl MeshEntry {
    fn instanced(&self) -> Instanced<'_> {
        Instanced {
            instance: &self.instance_buffer,
            model: &self.model,
            amount: 1,
            side: self.side,
            cast_shadow: self.cast_shadow,
        }
    }
}

#[derive(Debug)]
struct HelperEntry {
    node: NodeId,
    vertex_buffer: wgpu::Buffer,
    visible: bool,
}

#[derive(Debug)]
pub struct SceneGraph {
    synced: usize,
    textures: HashMap<TextureSlot, (u64, Texture)>,
    blank: Texture,
    sampler: wgpu::Sampler,
    meshes: Vec<MeshEntry>,
    helpers: Vec<HelperEntry>,
    transparent_order: Vec<usize>,
}

impl SceneGraph {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            synced: 0,
            textures: HashMap::new(),
            blank: Texture::create_solid(device, queue, [255; 4], "blank map"),
            sampler: create_default_sampler(device),
            meshes: Vec::new(),
            helpers: Vec::new(),
            transparent_order: Vec::new(),
        }
    }

    /// Number of scene nodes mirrored so far.
    pub fn synced(&self) -> usize {
        self.synced
    }

    pub fn sync(&mut self, ctx: &Context, scene: &Scene) {
        self.upload_textures(ctx, scene);
        self.mirror_new_nodes(ctx, scene);
        self.update_meshes(ctx, scene);
        self.update_helpers(ctx, scene);
        ctx.light.write(
            &ctx.queue,
            LightUniform::from_scene(
                scene,
                ctx.settings.shadows,
                ctx.settings.shadow_map_size,
            ),
        );
        self.sort_transparent(ctx.camera.camera.position);
    }

    fn upload_textures(&mut self, ctx: &Context, scene: &Scene) {
        let max = ctx.device.limits().max_texture_dimension_2d;
        for (slot, entry) in scene.textures() {
            let Some(image) = entry.image() else {
                continue;
            };
            if self
                .textures
                .get(&slot)
                .is_some_and(|(revision, _)| *revision == entry.revision())
            {
                continue;
            }
            let (width, height) = image.dimensions();
            let texture = if width > max || height > max {
                let scale = max as f32 / width.max(height) as f32;
                log::info!(
                    "Downscaling {} ({}x{}) to fit the device limit of {}",
                    entry.path(),
                    width,
                    height,
                    max
                );
                let resized = image::imageops::resize(
                    &**image,
                    ((width as f32 * scale) as u32).max(1),
                    ((height as f32 * scale) as u32).max(1),
                    image::imageops::FilterType::Triangle,
                );
                Texture::from_rgba(&ctx.device, &ctx.queue, &resized, Some(entry.path()))
            } else {
                Texture::from_rgba(&ctx.device, &ctx.queue, image, Some(entry.path()))
            };
            log::debug!("Uploaded texture {} (revision {})", entry.path(), entry.revision());
            self.textures.insert(slot, (entry.revision(), texture));
        }
    }

    fn mirror_new_nodes(&mut self, ctx: &Context, scene: &Scene) {
        for (id, node) in scene.iter().skip(self.synced) {
            match &node.kind {
                NodeKind::Mesh { geometry, material } => {
                    let data = geometry.build();
                    if data.indices.is_empty() {
                        log::warn!("Mesh {} has no triangles and is not drawn", node.name);
                        continue;
                    }
                    let mesh =
                        model::Mesh::new(&ctx.device, &node.name, &data.vertices, &data.indices, 0);
                    let world = scene.world_transform(id).unwrap_or_default();
                    let instance_buffer =
                        ctx.device
                            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some(&format!("{} Instance Buffer", node.name)),
                                contents: bytemuck::cast_slice(&[world.to_raw()]),
                                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                            });
                    let bound = (
                        binding(&self.textures, material.map),
                        binding(&self.textures, material.env_map),
                    );
                    let uniform = MaterialUniform::from_material(
                        material,
                        bound.0.is_some(),
                        bound.1.is_some(),
                        node.receive_shadow,
                    );
                    let material_buffer =
                        ctx.device
                            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                                label: Some(&format!("{} Material Buffer", node.name)),
                                contents: bytemuck::cast_slice(&[uniform]),
                                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                            });
                    let bind_group = self.bind_material(ctx, &material_buffer, bound);
                    self.meshes.push(MeshEntry {
                        node: id,
                        model: Model {
                            meshes: vec![mesh],
                            materials: vec![model::Material::new(&node.name, bind_group)],
                        },
                        instance_buffer,
                        material_buffer,
                        bound,
                        side: material.side,
                        transparent: material.transparent,
                        cast_shadow: node.cast_shadow,
                        visible: scene.is_visible(id),
                        position: cgmath::Point3::from_vec(world.position),
                    });
                }
                NodeKind::DirectionalLightHelper { .. } => {
                    let vertex_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
                        label: Some(&format!("{} Vertex Buffer", node.name)),
                        size: (HELPER_VERTICES * std::mem::size_of::<LineVertex>())
                            as wgpu::BufferAddress,
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                        mapped_at_creation: false,
                    });
                    self.helpers.push(HelperEntry {
                        node: id,
                        vertex_buffer,
                        visible: false,
                    });
                }
                NodeKind::AmbientLight { .. }
                | NodeKind::DirectionalLight { .. }
                | NodeKind::Group => (),
            }
            log::debug!("Mirrored node {:?} ({})", id, node.name);
        }
        self.synced = scene.len();
    }

    fn bind_material(
        &self,
        ctx: &Context,
        material_buffer: &wgpu::Buffer,
        (map, env): (Binding, Binding),
    ) -> wgpu::BindGroup {
        let view = |bound: Binding| {
            bound
                .and_then(|(slot, _)| self.textures.get(&slot))
                .map(|(_, texture)| &texture.view)
                .unwrap_or(&self.blank.view)
        };
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &ctx.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: material_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(view(map)),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(view(env)),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some("material_bind_group"),
        })
    }

    fn update_meshes(&mut self, ctx: &Context, scene: &Scene) {
        for idx in 0..self.meshes.len() {
            let entry = &self.meshes[idx];
            let Some(node) = scene.get(entry.node) else {
                continue;
            };
            let Some(material) = node.material() else {
                continue;
            };
            let world: Instance = scene.world_transform(entry.node).unwrap_or_default();
            ctx.queue.write_buffer(
                &entry.instance_buffer,
                0,
                bytemuck::cast_slice(&[world.to_raw()]),
            );

            let bound = (
                binding(&self.textures, material.map),
                binding(&self.textures, material.env_map),
            );
            let rebind = (bound != entry.bound)
                .then(|| self.bind_material(ctx, &entry.material_buffer, bound));
            let uniform = MaterialUniform::from_material(
                material,
                bound.0.is_some(),
                bound.1.is_some(),
                node.receive_shadow,
            );
            ctx.queue
                .write_buffer(&entry.material_buffer, 0, bytemuck::cast_slice(&[uniform]));

            let entry = &mut self.meshes[idx];
            if let Some(bind_group) = rebind {
                if let Some(gpu_material) = entry.model.materials.first_mut() {
                    gpu_material.bind_group = bind_group;
                }
                entry.bound = bound;
            }
            entry.side = material.side;
            entry.transparent = material.transparent;
            entry.cast_shadow = node.cast_shadow;
            entry.visible = scene.is_visible(entry.node);
            entry.position = cgmath::Point3::from_vec(world.position);
        }
    }

    fn update_helpers(&mut self, ctx: &Context, scene: &Scene) {
        for helper in self.helpers.iter_mut() {
            let Some(NodeKind::DirectionalLightHelper {
                light,
                size,
                colour,
            }) = scene.get(helper.node).map(|node| &node.kind)
            else {
                continue;
            };
            let target = match scene.get(*light).map(|node| &node.kind) {
                Some(NodeKind::DirectionalLight { target, .. }) => *target,
                _ => {
                    helper.visible = false;
                    continue;
                }
            };
            let Some(world) = scene.world_transform(*light) else {
                helper.visible = false;
                continue;
            };
            let lines = helper_lines(
                cgmath::Point3::from_vec(world.position),
                target.into(),
                *size,
                *colour,
            );
            ctx.queue
                .write_buffer(&helper.vertex_buffer, 0, bytemuck::cast_slice(&lines));
            helper.visible = scene.is_visible(helper.node);
        }
    }

    /// Back to front, so blending composes farther surfaces first.
    fn sort_transparent(&mut self, eye: cgmath::Point3<f32>) {
        let mut order: Vec<usize> = (0..self.meshes.len())
            .filter(|&idx| self.meshes[idx].transparent)
            .collect();
        order.sort_by(|&a, &b| {
            let da = (self.meshes[a].position - eye).magnitude2();
            let db = (self.meshes[b].position - eye).magnitude2();
            db.partial_cmp(&da).unwrap_or(Ordering::Equal)
        });
        self.transparent_order = order;
    }

    pub fn on_render(&self) -> Render<'_> {
        let opaque = self
            .meshes
            .iter()
            .filter(|entry| entry.visible && !entry.transparent)
            .map(MeshEntry::instanced)
            .collect();
        let lines = self
            .helpers
            .iter()
            .filter(|helper| helper.visible)
            .map(|helper| {
                Render::Lines(Lines {
                    vertex: &helper.vertex_buffer,
                    amount: HELPER_VERTICES as u32,
                })
            })
            .collect();
        let transparent = self
            .transparent_order
            .iter()
            .filter_map(|&idx| self.meshes.get(idx))
            .filter(|entry| entry.visible)
            .map(MeshEntry::instanced)
            .collect();
        Render::Composed(vec![
            Render::Defaults(opaque),
            Render::Composed(lines),
            Render::Transparents(transparent),
        ])
    }
}

fn binding(
    textures: &HashMap<TextureSlot, (u64, Texture)>,
    slot: Option<TextureSlot>,
) -> Binding {
    let slot = slot?;
    let (revision, _) = textures.get(&slot)?;
    Some((slot, *revision))
}
