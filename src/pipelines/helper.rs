use crate::{
    data_structures::{
        model::{LineVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{PipelineOptions, mk_render_pipeline},
};

/// Line pipeline for debug helpers, drawn in world space with the camera only.
pub fn mk_helper_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Helper Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Helper Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("helper.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::REPLACE),
        Some(Texture::DEPTH_FORMAT),
        &[LineVertex::desc()],
        shader,
        PipelineOptions {
            topology: wgpu::PrimitiveTopology::LineList,
            cull_mode: None,
            sample_count,
            ..Default::default()
        },
    )
}
