//! Render pipelines of the engine.
//!
//! Every mesh is drawn by one of six colour pipelines (opaque or blended,
//! times the three rasterized sides) sharing `mesh.wgsl`. Shadow casters
//! additionally go through the depth-only [`shadow`] pipeline, and debug
//! helpers through the line pipeline in [`helper`].

pub mod basic;
pub mod helper;
pub mod light;
pub mod shadow;
pub mod transparent;

use crate::scene::Side;

#[derive(Debug)]
pub struct SidedPipelines {
    pub front: wgpu::RenderPipeline,
    pub back: wgpu::RenderPipeline,
    pub double: wgpu::RenderPipeline,
}

impl SidedPipelines {
    pub fn get(&self, side: Side) -> &wgpu::RenderPipeline {
        match side {
            Side::Front => &self.front,
            Side::Back => &self.back,
            Side::Double => &self.double,
        }
    }
}

#[derive(Debug)]
pub struct Pipelines {
    pub opaque: SidedPipelines,
    pub transparent: SidedPipelines,
    pub shadow: wgpu::RenderPipeline,
    pub helper: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn new(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
        material_bind_group_layout: &wgpu::BindGroupLayout,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        light: &light::LightResources,
    ) -> Self {
        Self {
            opaque: basic::mk_basic_pipelines(
                device,
                config,
                sample_count,
                material_bind_group_layout,
                camera_bind_group_layout,
                &light.bind_group_layout,
            ),
            transparent: transparent::mk_transparent_pipelines(
                device,
                config,
                sample_count,
                material_bind_group_layout,
                camera_bind_group_layout,
                &light.bind_group_layout,
            ),
            shadow: shadow::mk_shadow_pipeline(device, &light.shadow_bind_group_layout),
            helper: helper::mk_helper_pipeline(
                device,
                config,
                sample_count,
                camera_bind_group_layout,
            ),
        }
    }
}
