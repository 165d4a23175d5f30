//! Flow control and application event loop.
//!
//! This module provides the main event loop and the flow abstraction of the
//! engine. A "flow" owns a part of the application: it handles user input,
//! updates its state and provides renderable objects each frame. The engine
//! owns the GPU context and the orbit camera and coordinates rendering and
//! event distribution.
//!
//! # User-facing types
//!
//! - [`GraphicsFlow<S, E>`] is the trait for scenes/states that handle events and rendering
//! - [`Out<S, E>`] is the output type for async event handling and context configuration
//!
//! # Lifecycle Flow
//!
//! Every `RedrawRequested` runs one frame:
//! 1. Apply the orbit controls to the camera and upload it
//! 2. Update flow state (via `on_update`)
//! 3. Call flows' `on_render()` to collect renderable objects
//! 4. Render the shadow map, then opaque, line and transparent batches
//! 5. Present the frame and request the next redraw
//! 6. Poll the pending `Out::FutFn` loads and queue the finished ones as state mutations
//!
//! The window starts hidden and is shown after the first presented frame.

use std::{
    fmt::Debug,
    iter,
    pin::Pin,
    sync::Arc,
    task::{self, Poll},
};

use futures::{StreamExt, stream::FuturesUnordered};
use instant::{Duration, Instant};

#[cfg(feature = "integration-tests")]
use tokio::runtime::Runtime;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::RenderSettings,
    context::{Context, InitContext},
    data_structures::model::DrawModel,
    render::{Batches, Instanced, Render},
};

#[cfg(feature = "integration-tests")]
use crate::data_structures::texture::Texture;

///
/// This is the Output Type for every lifecycle hook where the user can pass async events that are
/// handled according to the platform you're running on.
///
/// `Out::FutEvent` can be used to resolve a future of an Event that is put in the Event Queue after
/// being resolved. The caller is responsible for handling the event later on and it will have no
/// side effects unless handled.
///
/// `Out::FutFn` can be used to directly modify the state and the mutation is handled internally with
/// no further action required by the callee. Every future runs on its own and its mutation arrives
/// through the event loop as soon as it resolves, so frames keep rendering in the meantime.
///
/// `Out::Configure` can be used to modify the Context during runtime for instance to change the
/// clear colour.
///
/// `Empty` is the default output used when no eventing/futures need to be handled.
///
pub enum Out<S, E> {
    FutEvent(Vec<Box<dyn Future<Output = E>>>),
    FutFn(Vec<Box<dyn Future<Output = Mutation<S>>>>),
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl<S, E> Default for Out<S, E> {
    fn default() -> Self {
        Self::Empty
    }
}

/// A deferred change to the flow state.
pub type Mutation<S> = Box<dyn FnOnce(&mut S)>;

/// State mutations whose futures have not resolved yet.
///
/// Each future is polled on its own: one that never resolves does not hold
/// back the others. The engine polls once per frame, after presenting.
pub struct PendingMutations<S> {
    futures: FuturesUnordered<Pin<Box<dyn Future<Output = Mutation<S>>>>>,
}

impl<S> Default for PendingMutations<S> {
    fn default() -> Self {
        Self {
            futures: FuturesUnordered::new(),
        }
    }
}

impl<S> PendingMutations<S> {
    pub fn push(&mut self, future: Box<dyn Future<Output = Mutation<S>>>) {
        self.futures.push(Box::into_pin(future));
    }

    pub fn len(&self) -> usize {
        self.futures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.futures.is_empty()
    }

    /// Polls the pending futures without blocking and returns the mutations
    /// that resolved, in completion order.
    pub fn poll_ready(&mut self) -> Vec<Mutation<S>> {
        let mut cx = task::Context::from_waker(futures::task::noop_waker_ref());
        let mut ready = Vec::new();
        while let Poll::Ready(Some(mutation)) = self.futures.poll_next_unpin(&mut cx) {
            ready.push(mutation);
        }
        ready
    }
}

#[cfg(feature = "integration-tests")]
pub enum ImageTestResult {
    Passed,
    Waiting,
    Failed,
}

/// Trait for implementing a renderable scene or application state.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once when the flow is created; configure context (camera, clear color, etc.)
/// 2. `on_window_events()` and `on_device_events()` are called for each winit input event
/// 3. `on_update()` is called every frame, before rendering
/// 4. `on_custom_events()` is called for custom application events
/// 5. `on_render()` is called each frame and specifies how to render `self`
///
pub trait GraphicsFlow<S, E> {
    /// Initialize the flow and configure the context.
    ///
    /// Besides `Out::Configure` this is the only place to modify the Context and configure things
    /// such as the background colour or camera start position.
    fn on_init(&mut self, ctx: &mut Context, state: &mut S) -> Out<S, E>;

    /// Update state every frame.
    ///
    /// Called once per frame callback with the elapsed time `dt`, after the
    /// camera was updated and before anything is rendered.
    fn on_update(&mut self, ctx: &Context, state: &mut S, dt: Duration) -> Out<S, E>;

    /// Handle raw device events (keyboard, mouse hardware input).
    fn on_device_events(&mut self, ctx: &Context, state: &mut S, event: &DeviceEvent) -> Out<S, E>;

    /// Handle window events (keyboard, mouse, window resizing, etc.).
    fn on_window_events(&mut self, ctx: &Context, state: &mut S, event: &WindowEvent) -> Out<S, E>;

    /// Handle custom application events.
    ///
    /// Returns the event if it was not consumed, allowing it to be passed to
    /// the next flow. Returning `None` means the event was consumed.
    fn on_custom_events(&mut self, ctx: &Context, state: &mut S, event: E) -> Option<E>;

    /// Return renderable objects for this flow.
    ///
    /// Called each frame (twice with shadows enabled: once for the shadow
    /// casters, once for the colour pass).
    fn on_render(&self) -> Render<'_>;

    /// Inspect the frame rendered into the test texture. Flows that take no
    /// part in image tests pass right away.
    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        _ctx: &Context,
        _state: &mut S,
        _texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        Ok(ImageTestResult::Passed)
    }
}

// Dummy impl to make wasm work
impl<State, Event> Debug for dyn GraphicsFlow<State, Event> + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously returns a
/// boxed `GraphicsFlow`. This allows lazy initialization and resource loading.
pub type FlowConsturctor<S, E> =
    Box<dyn FnOnce(InitContext) -> Pin<Box<dyn Future<Output = Box<dyn GraphicsFlow<S, E>>>>>>;

/// Application state bundle: GPU context, app state, and surface status.
#[derive(Debug)]
pub struct AppState<State: 'static> {
    pub(crate) ctx: Context,
    state: State,
    is_surface_configured: bool,
    is_shown: bool,
}

impl<State: 'static> AppState<State> {
    async fn new(
        window: Arc<Window>,
        settings: &RenderSettings,
        state: State,
    ) -> anyhow::Result<Self> {
        let ctx = Context::new(window, settings).await?;
        Ok(Self {
            ctx,
            state,
            is_surface_configured: false,
            is_shown: false,
        })
    }

    /// Reconfigures the surface and its render targets. The projection keeps
    /// the aspect it was created with.
    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            let max = self.ctx.device.limits().max_texture_dimension_2d;
            self.ctx.config.width = width.min(max);
            self.ctx.config.height = height.min(max);
            self.is_surface_configured = true;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
            self.ctx.recreate_targets();
        }
    }

    /// Makes the surface visible, once.
    fn show(&mut self) {
        if self.is_shown {
            return;
        }
        self.is_shown = true;
        #[cfg(not(target_arch = "wasm32"))]
        self.ctx.window.set_visible(true);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowExtWebSys;

            let body = web_sys::window()
                .and_then(|window| window.document())
                .and_then(|document| document.body());
            match (body, self.ctx.window.canvas()) {
                (Some(body), Some(canvas)) => {
                    if body.append_child(&canvas).is_err() {
                        log::error!("Could not append the canvas to the document body");
                    }
                }
                _ => log::error!("No document body or canvas to show the scene in"),
            }
        }
        log::info!("Surface shown after the first frame");
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_texture(&self, extent3d: wgpu::Extent3d) -> wgpu::Texture {
        self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Golden Image Test Output Texture"),
            size: extent3d,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.ctx.config.format,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    #[cfg(feature = "integration-tests")]
    fn get_with_height(&self) -> (u32, u32) {
        // The img lib requires divisibility of 256...
        let width = self.ctx.config.width;
        let height = self.ctx.config.height;
        let width_offset = 256 - (width % 256);
        let height_offset = 256 - (height % 256);
        let width = width + width_offset;
        let height = height + height_offset;
        (width, height)
    }

    #[cfg(feature = "integration-tests")]
    fn get_test_3d_extent(&self) -> wgpu::Extent3d {
        let (width, height) = self.get_with_height();
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        }
    }

    /// Depth-only pass from the light into the shadow map.
    fn render_shadows<Event>(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        graphics_flows: &[Box<dyn GraphicsFlow<State, Event>>],
    ) {
        let mut casters: Vec<Instanced> = Vec::new();
        graphics_flows
            .iter()
            .for_each(|flow| flow.on_render().set_shadow_casters(&mut casters));

        let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.ctx.light.shadow_map.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        shadow_pass.set_pipeline(&self.ctx.pipelines.shadow);
        shadow_pass.set_bind_group(0, &self.ctx.light.shadow_bind_group, &[]);
        for instanced in casters {
            if instanced.amount == 0 || instanced.instance.size() == 0 {
                continue;
            }
            shadow_pass.set_vertex_buffer(1, instanced.instance.slice(..));
            shadow_pass.draw_model_shadow(instanced.model, 0..instanced.amount as u32);
        }
    }

    fn render<Event>(
        &mut self,
        graphics_flows: &mut Vec<Box<dyn GraphicsFlow<State, Event>>>,
        #[cfg(feature = "integration-tests")] async_runtime: &Runtime,
        #[cfg(feature = "integration-tests")] event_loop: &winit::event_loop::EventLoopProxy<
            FlowEvent<State, Event>,
        >,
    ) -> Result<(), wgpu::SurfaceError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        #[cfg(not(feature = "integration-tests"))]
        let output = self.ctx.surface.get_current_texture()?;
        #[cfg(not(feature = "integration-tests"))]
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        #[cfg(feature = "integration-tests")]
        let (tex, target, test_depth, test_msaa) = {
            let extent3d = self.get_test_3d_extent();
            let sample_count = self.ctx.settings.sample_count();
            let size = [extent3d.width, extent3d.height];
            let tex = self.get_test_texture(extent3d);
            let target = tex.create_view(&wgpu::TextureViewDescriptor::default());
            let depth =
                Texture::create_depth_texture(&self.ctx.device, size, sample_count, "test depth");
            let msaa = (sample_count > 1).then(|| {
                Texture::create_msaa_texture(
                    &self.ctx.device,
                    size,
                    self.ctx.config.format,
                    sample_count,
                )
            });
            (tex, target, depth, msaa)
        };

        #[cfg(not(feature = "integration-tests"))]
        let (depth_view, msaa_view) = (
            &self.ctx.depth_texture.view,
            self.ctx.msaa_texture.as_ref().map(|msaa| &msaa.view),
        );
        #[cfg(feature = "integration-tests")]
        let (depth_view, msaa_view) = (&test_depth.view, test_msaa.as_ref().map(|msaa| &msaa.view));

        let (view, resolve_target) = match msaa_view {
            Some(msaa) => (msaa, Some(&target)),
            None => (&target, None),
        };

        let mut encoder: wgpu::CommandEncoder =
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Render Encoder"),
                });

        if self.ctx.settings.shadows {
            self.render_shadows(&mut encoder, graphics_flows);
        }

        {
            let mut render_pass: wgpu::RenderPass<'_> =
                encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: depth_view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

            let mut batches = Batches::new();
            graphics_flows.iter().for_each(|flow| {
                let render = flow.on_render();
                render.set_batches(&mut batches);
            });

            for instanced in batches.opaque {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("you attemted to render something with zero instances");
                    continue;
                }
                render_pass.set_pipeline(self.ctx.pipelines.opaque.get(instanced.side));
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_instanced(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }

            if !batches.lines.is_empty() {
                render_pass.set_pipeline(&self.ctx.pipelines.helper);
                render_pass.set_bind_group(0, &self.ctx.camera.bind_group, &[]);
                for lines in batches.lines {
                    render_pass.set_vertex_buffer(0, lines.vertex.slice(..));
                    render_pass.draw(0..lines.amount, 0..1);
                }
            }

            // Already sorted back to front by the flows
            for instanced in batches.transparent {
                if instanced.amount == 0 || instanced.instance.size() == 0 {
                    log::warn!("you attemted to render something with zero instances");
                    continue;
                }
                render_pass.set_pipeline(self.ctx.pipelines.transparent.get(instanced.side));
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_model_instanced(
                    instanced.model,
                    0..instanced.amount as u32,
                    &self.ctx.camera.bind_group,
                    &self.ctx.light.bind_group,
                );
            }
        }

        #[cfg(feature = "integration-tests")]
        let output_buffer = {
            let u32_size = std::mem::size_of::<u32>() as u32;
            let (width, height) = self.get_with_height();
            let output_buffer_size = (u32_size * (width) * (height)) as wgpu::BufferAddress;
            let output_buffer_desc = wgpu::BufferDescriptor {
                size: output_buffer_size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                label: None,
                mapped_at_creation: false,
            };
            let output_buffer = self.ctx.device.create_buffer(&output_buffer_desc);
            encoder.copy_texture_to_buffer(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &tex,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                },
                wgpu::TexelCopyBufferInfo {
                    buffer: &output_buffer,
                    layout: wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(u32_size * (width)),
                        rows_per_image: Some(height),
                    },
                },
                self.get_test_3d_extent(),
            );
            output_buffer
        };

        self.ctx.queue.submit(iter::once(encoder.finish()));

        #[cfg(feature = "integration-tests")]
        let fut_img = async {
            let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
            let buffer_slice = output_buffer.slice(..);
            buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
                tx.send(result).unwrap();
            });
            self.ctx
                .device
                .poll(wgpu::PollType::Wait {
                    submission_index: None,
                    timeout: Some(Duration::from_secs(3)),
                })
                .unwrap();
            rx.receive().await.unwrap().unwrap();
            let data = buffer_slice.get_mapped_range();
            let (width, height) = self.get_with_height();
            let buffer =
                image::ImageBuffer::<image::Rgba<u8>, _>::from_raw(width, height, data).unwrap();
            buffer
        };
        #[cfg(feature = "integration-tests")]
        {
            use std::convert::identity;

            let mut img: image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView> =
                async_runtime.block_on(fut_img);
            let state = &mut self.state;
            let all_passed = graphics_flows
                .iter_mut()
                .map(|flow| flow.render_to_texture(&self.ctx, state, &mut img))
                .map(|res| match res {
                    Err(e) => panic!("{}", e),
                    Ok(ImageTestResult::Passed) => true,
                    Ok(ImageTestResult::Failed) => panic!("Assertion failed"),
                    Ok(ImageTestResult::Waiting) => false,
                })
                .all(identity);
            if all_passed {
                event_loop
                    .send_event(FlowEvent::Exit)
                    .expect("All assertions passed but the winit event-loop could not safely exit")
            }
        }

        #[cfg(not(feature = "integration-tests"))]
        output.present();
        self.show();
        Ok(())
    }
}

pub struct App<State: 'static, Event: 'static> {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    // Loads still in flight. On the web they are spawned instead.
    #[cfg(not(target_arch = "wasm32"))]
    pending: PendingMutations<State>,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    settings: RenderSettings,
    // Moved into the AppState once the context exists.
    initial_state: Option<State>,
    state: Option<AppState<State>>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    // This holds the constructors at the star.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConsturctor<State, Event>>>,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl<State, Event> App<State, Event>
where
    State: 'static,
    Event: 'static,
{
    fn new(
        event_loop: &EventLoop<FlowEvent<State, Event>>,
        settings: RenderSettings,
        state: State,
        constructors: Vec<FlowConsturctor<State, Event>>,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            #[cfg(not(target_arch = "wasm32"))]
            pending: PendingMutations::default(),
            proxy,
            settings,
            initial_state: Some(state),
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            error: None,
        })
    }

    /// Runs `on_init` of every flow, then renders the first frame right away:
    /// the window is still hidden and may not receive redraw requests yet.
    fn start(&mut self) {
        let Some(app_state) = self.state.as_mut() else {
            return;
        };
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows.iter_mut().for_each(|flow| {
            let events = flow.on_init(&mut app_state.ctx, &mut app_state.state);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut app_state.ctx,
                proxy,
                events,
            );
        });
        log::info!("{} flow(s) initialized", self.graphics_flows.len());
        self.last_time = Instant::now();
        self.frame();
    }

    fn frame(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let dt = self.last_time.elapsed();
        self.last_time = Instant::now();

        // Update the camera
        let ctx = &mut state.ctx;
        ctx.camera
            .controls
            .update(&mut ctx.camera.camera, &ctx.projection);
        ctx.write_camera();

        // Update custom stuff
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_update(&state.ctx, &mut state.state, dt);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut state.ctx,
                proxy,
                events,
            );
        });

        match state.render(
            &mut self.graphics_flows,
            #[cfg(feature = "integration-tests")]
            &self.async_runtime,
            #[cfg(feature = "integration-tests")]
            &self.proxy,
        ) {
            Ok(_) => (),
            // Reconfigure the surface if it's lost or outdated
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = state.ctx.window.inner_size();
                state.resize(size.width, size.height);
            }
            Err(e) => {
                log::error!("Unable to render {}", e);
            }
        }
        // invoke main render loop
        state.ctx.window.request_redraw();

        #[cfg(not(target_arch = "wasm32"))]
        self.deliver_ready_mutations();
    }

    /// Hands every load that finished since the last frame to the event loop.
    #[cfg(not(target_arch = "wasm32"))]
    fn deliver_ready_mutations(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        // Loads may await tokio resources.
        let _guard = self.async_runtime.enter();
        for mutation in self.pending.poll_ready() {
            if self.proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                log::error!("Event loop was closed before a state update arrived");
                break;
            }
        }
    }
}

pub(crate) enum FlowEvent<State: 'static, Event: 'static> {
    #[allow(dead_code)]
    Initialized {
        state: AppState<State>,
        flows: Vec<Box<dyn GraphicsFlow<State, Event>>>,
    },
    #[allow(dead_code)]
    Failed(anyhow::Error),
    #[allow(dead_code)]
    Mut(Mutation<State>),
    #[allow(dead_code)]
    Custom(Event),
    #[allow(dead_code)]
    Exit,
}

impl<State, Event> Debug for FlowEvent<State, Event> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
            Self::Mut(_) => f.write_str("Mut(|&mut State| -> {...})"),
            Self::Custom(_) => f.write_str("Custom(E)"),
            Self::Exit => f.write_str("Exit"),
        }
    }
}

impl<State: 'static, Event: 'static> ApplicationHandler<FlowEvent<State, Event>>
    for App<State, Event>
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(constructors), Some(initial_state)) =
            (self.constructors.take(), self.initial_state.take())
        else {
            // Resumed again after suspension: the context is still alive.
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes()
            .with_title("skydome")
            .with_visible(false);

        #[cfg(target_arch = "wasm32")]
        {
            use winit::platform::web::WindowAttributesExtWebSys;

            // Full viewport; the canvas joins the document after the first frame.
            if let Some(browser) = web_sys::window() {
                let width = browser.inner_width().ok().and_then(|w| w.as_f64());
                let height = browser.inner_height().ok().and_then(|h| h.as_f64());
                if let (Some(width), Some(height)) = (width, height) {
                    window_attributes = window_attributes
                        .with_inner_size(winit::dpi::LogicalSize::new(width, height));
                }
            }
            window_attributes = window_attributes.with_append(false);
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create the window: {}", e);
                self.error = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        let settings = self.settings.clone();
        let init_future = async move {
            let app_state = AppState::new(window, &settings, initial_state).await?;

            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows: Vec<_> = futures::future::join_all(flow_futures).await;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => {
                    self.state = Some(app_state);
                    self.graphics_flows = flows;
                    self.start();
                }
                Err(e) => {
                    log::error!("App initialization failed: {:#}", e);
                    self.error = Some(e);
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, flows)) => FlowEvent::Initialized { state, flows },
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before the app was initialized");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent<State, Event>) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.state = Some(state);
                self.graphics_flows = flows;
                self.start();
            }
            FlowEvent::Failed(e) => {
                log::error!("App initialization failed: {:#}", e);
                self.error = Some(e);
                event_loop.exit();
            }
            FlowEvent::Custom(custom_event) => {
                if let Some(state) = &mut self.state {
                    let result = self
                        .graphics_flows
                        .iter_mut()
                        .fold(Some(custom_event), |event, flow| {
                            flow.on_custom_events(&state.ctx, &mut state.state, event?)
                        });
                    if result.is_some() {
                        log::warn!("Warning! Custom event was not consumed this cycle");
                    }
                }
            }
            FlowEvent::Mut(fn_once) => {
                if let Some(state) = &mut self.state {
                    fn_once(&mut state.state);
                }
            }
            FlowEvent::Exit => {
                event_loop.exit();
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };
        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_device_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut state.ctx,
                proxy,
                events,
            );
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        // general stuff
        state.ctx.camera.controls.handle_window_events(&event);

        self.graphics_flows.iter_mut().for_each(|f| {
            let events = f.on_window_events(&state.ctx, &mut state.state, &event);
            let proxy = self.proxy.clone();
            handle_flow_output(
                #[cfg(not(target_arch = "wasm32"))]
                &self.async_runtime,
                #[cfg(not(target_arch = "wasm32"))]
                &mut self.pending,
                &mut state.ctx,
                proxy,
                events,
            );
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}

fn handle_flow_output<State, Event>(
    #[cfg(not(target_arch = "wasm32"))] async_runtime: &tokio::runtime::Runtime,
    #[cfg(not(target_arch = "wasm32"))] pending: &mut PendingMutations<State>,
    ctx: &mut Context,
    proxy: winit::event_loop::EventLoopProxy<FlowEvent<State, Event>>,
    out: Out<State, Event>,
) {
    match out {
        // Send the events passed by the user to winit
        Out::FutEvent(futures) => {
            let fut =
                async move { futures::future::join_all(futures.into_iter().map(Pin::from)).await };
            #[cfg(not(target_arch = "wasm32"))]
            {
                let resolved = async_runtime.block_on(fut);
                for event in resolved {
                    if let Err(err) = proxy.send_event(FlowEvent::Custom(event)) {
                        log::error!("Event loop was closed before all events could be processed: {}", err);
                        break;
                    }
                }
            }

            #[cfg(target_arch = "wasm32")]
            {
                wasm_bindgen_futures::spawn_local(async move {
                    let resolved = fut.await;
                    for event in resolved {
                        if proxy.send_event(FlowEvent::Custom(event)).is_err() {
                            log::error!("Event loop was closed before all events could be processed");
                            break;
                        }
                    }
                });
            }
        }
        // Each future mutates the state on its own once it resolves
        Out::FutFn(futures) => {
            #[cfg(not(target_arch = "wasm32"))]
            futures.into_iter().for_each(|future| pending.push(future));

            #[cfg(target_arch = "wasm32")]
            for future in futures {
                let proxy = proxy.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let mutation = Pin::from(future).await;
                    if proxy.send_event(FlowEvent::Mut(mutation)).is_err() {
                        log::error!("Event loop was closed before a state update arrived");
                    }
                });
            }
        }
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

/// Opens the window, creates the GPU context, initializes the flows and
/// drives frames until the window is closed. GPU setup failures are
/// returned as errors.
pub fn run<State: 'static, Event: 'static>(
    settings: RenderSettings,
    state: State,
    constructors: Vec<FlowConsturctor<State, Event>>,
) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {}", e).into());
        }
    }

    #[cfg(all(feature = "integration-tests", target_os = "linux"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::wayland::EventLoopBuilderExtWayland;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(all(feature = "integration-tests", target_os = "windows"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = {
        use winit::platform::windows::EventLoopBuilderExtWindows;

        winit::event_loop::EventLoop::with_user_event()
            .with_any_thread(true)
            .build()?
    };

    #[cfg(not(feature = "integration-tests"))]
    let event_loop: EventLoop<FlowEvent<State, Event>> = EventLoop::with_user_event().build()?;

    let mut app: App<State, Event> = App::new(&event_loop, settings, state, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
