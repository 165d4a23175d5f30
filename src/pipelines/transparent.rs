use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::{
        SidedPipelines,
        basic::{PipelineOptions, cull_mode, mk_render_pipeline},
    },
    scene::Side,
};

/**
 * Pipelines for blended materials.
 *
 * Same shader as the opaque pass, but alpha blended and without depth
 * writes, so transparent surfaces never hide what is drawn after them.
 */
pub fn mk_transparent_pipelines(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
    material_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> SidedPipelines {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transparent Pipeline Layout"),
        bind_group_layouts: &[
            material_bind_group_layout,
            camera_bind_group_layout,
            light_bind_group_layout,
        ],
        push_constant_ranges: &[],
    });
    let mk = |side: Side| {
        let shader = wgpu::ShaderModuleDescriptor {
            label: Some("Transparent Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mesh.wgsl").into()),
        };
        mk_render_pipeline(
            device,
            &render_pipeline_layout,
            config.format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            Some(Texture::DEPTH_FORMAT),
            &[ModelVertex::desc(), InstanceRaw::desc()],
            shader,
            PipelineOptions {
                cull_mode: cull_mode(side),
                depth_write_enabled: false,
                sample_count,
                ..Default::default()
            },
        )
    };

    SidedPipelines {
        front: mk(Side::Front),
        back: mk(Side::Back),
        double: mk(Side::Double),
    }
}
