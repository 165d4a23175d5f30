use std::sync::Arc;

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::{Camera, CameraResources, CameraUniform, OrbitControls, Projection},
    config::{CameraSettings, OrbitSettings, RenderSettings},
    data_structures::texture,
    pipelines::{Pipelines, light::LightResources},
    resources::texture::material_layout,
};

/// GPU device, surface and everything shared by all draws of a frame.
///
/// Created once before any scene object becomes a GPU resource. Flows get
/// mutable access only in `on_init` and through `Out::Configure`.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub(crate) msaa_texture: Option<texture::Texture>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub pipelines: Pipelines,
    pub material_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    pub settings: RenderSettings,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &RenderSettings) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("creating the render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no graphics adapter fits the surface")?;
        log::info!("device and queue");
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("requesting the graphics device")?;

        log::info!("Surface");
        let surface_caps = surface.get_capabilities(&adapter);
        // The shaders output linear colour and rely on an sRGB surface for
        // the final encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface supports no texture format")?;
        let max_dimension = device.limits().max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.clamp(1, max_dimension),
            height: size.height.clamp(1, max_dimension),
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        // Placeholder until a flow configures the camera in `on_init`.
        let camera_settings = CameraSettings {
            position: [0.0, 0.0, 5.0],
            target: [0.0, 0.0, 0.0],
            fovy_degrees: 45.0,
            znear: 0.1,
            zfar: 500.0,
        };
        let camera = Camera::from_settings(&camera_settings);
        let projection = Projection::from_settings(config.width, config.height, &camera_settings);
        let controls = OrbitControls::new(&OrbitSettings::default(), config.height);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let camera = CameraResources {
            camera,
            controls,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        let sample_count = settings.sample_count();
        let (depth_texture, msaa_texture) = create_targets(&device, &config, sample_count);

        let light = LightResources::new(&device, settings.shadow_map_size);
        let material_layout = material_layout(&device);
        let pipelines = Pipelines::new(
            &device,
            &config,
            sample_count,
            &material_layout,
            &camera.bind_group_layout,
            &light,
        );
        log::debug!(
            "Context ready: {}x{} {:?}, {} samples",
            config.width,
            config.height,
            config.format,
            sample_count
        );

        Ok(Self {
            window,
            depth_texture,
            msaa_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            pipelines,
            material_layout,
            clear_colour: wgpu::Color::BLACK,
            settings: settings.clone(),
        })
    }

    /// Places the camera and replaces the orbit controls. The projection
    /// aspect is taken from the current surface size.
    pub fn configure_camera(&mut self, camera: &CameraSettings, orbit: &OrbitSettings) {
        self.camera.camera = Camera::from_settings(camera);
        self.projection = Projection::from_settings(self.config.width, self.config.height, camera);
        self.camera.controls = OrbitControls::new(orbit, self.config.height);
        self.write_camera();
    }

    pub(crate) fn write_camera(&mut self) {
        self.camera
            .uniform
            .update_view_proj(&self.camera.camera, &self.projection);
        self.queue.write_buffer(
            &self.camera.buffer,
            0,
            bytemuck::cast_slice(&[self.camera.uniform]),
        );
    }

    /// Recreates the depth and multisample targets after the surface size
    /// changed.
    pub(crate) fn recreate_targets(&mut self) {
        let (depth, msaa) = create_targets(&self.device, &self.config, self.settings.sample_count());
        self.depth_texture = depth;
        self.msaa_texture = msaa;
    }
}

fn create_targets(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> (texture::Texture, Option<texture::Texture>) {
    let size = [config.width, config.height];
    let depth = texture::Texture::create_depth_texture(device, size, sample_count, "depth_texture");
    let msaa = (sample_count > 1).then(|| {
        texture::Texture::create_msaa_texture(device, size, config.format, sample_count)
    });
    (depth, msaa)
}

/// The part of the [`Context`] flow constructors get to build their GPU
/// resources. Device and queue are internally reference counted, so this is
/// a cheap handle.
#[derive(Clone, Debug)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
        }
    }
}
