use std::{collections::HashMap, rc::Rc};

use anyhow::anyhow;
use futures::{FutureExt, future::LocalBoxFuture};
use skydome::flow::PendingMutations;
#[cfg(feature = "integration-tests")]
use skydome::flow::ImageTestResult;
#[cfg(feature = "integration-tests")]
use skydome::{
    context::Context,
    flow::{GraphicsFlow, Out},
    render::Render,
};
use skydome::{
    app::{SceneState, schedule_loads},
    builder::{AssetLoader, Built, PendingLoad, SceneBuilder},
    config::SceneConfig,
    resources::LoadedModel,
};

/// Serves images and a mesh from memory. Unknown paths fail like a missing
/// file would.
#[derive(Default)]
pub(crate) struct MockLoader {
    pub(crate) images: HashMap<String, image::RgbaImage>,
    pub(crate) model: Option<LoadedModel>,
    pub(crate) stall_model: bool,
}

impl MockLoader {
    pub(crate) fn with_image(mut self, path: &str, image: image::RgbaImage) -> Self {
        self.images.insert(path.to_string(), image);
        self
    }

    pub(crate) fn with_model(mut self, model: LoadedModel) -> Self {
        self.model = Some(model);
        self
    }

    /// The mesh load never finishes, the images still do.
    pub(crate) fn with_stalled_model(mut self) -> Self {
        self.stall_model = true;
        self
    }
}

impl AssetLoader for MockLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<image::RgbaImage>> {
        let result = self
            .images
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no image at {}", path));
        futures::future::ready(result).boxed_local()
    }

    fn load_model(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedModel>> {
        if self.stall_model {
            return futures::future::pending().boxed_local();
        }
        let result = self
            .model
            .clone()
            .ok_or_else(|| anyhow!("no mesh at {}", path));
        futures::future::ready(result).boxed_local()
    }
}

/// Never resolves anything.
pub(crate) struct PendingLoader;

impl AssetLoader for PendingLoader {
    fn load_image(&self, _: &str) -> LocalBoxFuture<'static, anyhow::Result<image::RgbaImage>> {
        futures::future::pending().boxed_local()
    }

    fn load_model(&self, _: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedModel>> {
        futures::future::pending().boxed_local()
    }
}

pub(crate) fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> image::RgbaImage {
    image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
}

/// Builds the scene of `config` and the state the frame loop would own.
pub(crate) fn build_state(config: &SceneConfig) -> (SceneState, Vec<PendingLoad>) {
    let Built {
        scene, cube, loads, ..
    } = SceneBuilder::new(config).build();
    (SceneState::new(scene, cube, &config.animation), loads)
}

/// Queues the loads the way the frame loop does.
pub(crate) fn queue_loads(
    loads: Vec<PendingLoad>,
    loader: Rc<dyn AssetLoader>,
) -> PendingMutations<SceneState> {
    let mut pending = PendingMutations::default();
    schedule_loads(loads, loader)
        .into_iter()
        .for_each(|future| pending.push(future));
    pending
}

/// Applies whatever is ready in `pending`. Returns how many were applied.
pub(crate) fn apply_ready(
    state: &mut SceneState,
    pending: &mut PendingMutations<SceneState>,
) -> usize {
    let ready = pending.poll_ready();
    let applied = ready.len();
    ready.into_iter().for_each(|mutation| mutation(state));
    applied
}

/// Polls every load once and applies the ones that are ready. Returns how
/// many were applied.
pub(crate) fn apply_ready_loads(
    state: &mut SceneState,
    loads: Vec<PendingLoad>,
    loader: Rc<dyn AssetLoader>,
) -> usize {
    apply_ready(state, &mut queue_loads(loads, loader))
}

pub(crate) struct FrameCounter(pub(crate) u32);
impl Default for FrameCounter {
    fn default() -> Self {
        Self(0)
    }
}
impl FrameCounter {
    pub(crate) fn frame(&self) -> u32 {
        self.0
    }

    pub(crate) fn progress(&mut self) {
        self.0 += 1;
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) struct TestRender<'a> {
    pub(crate) setup: &'a dyn Fn(&mut Context),
    pub(crate) validate: &'a dyn Fn(
        &Context,
        &mut FrameCounter,
        &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error>,
}

#[cfg(feature = "integration-tests")]
impl<'a> TestRender<'a> {
    pub(crate) fn new(
        setup: &'a dyn Fn(&mut Context),
        validate: &'a dyn Fn(
            &Context,
            &mut FrameCounter,
            &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
        ) -> Result<ImageTestResult, anyhow::Error>,
    ) -> Self {
        Self { setup, validate }
    }
}

#[cfg(feature = "integration-tests")]
impl<'a> GraphicsFlow<FrameCounter, ()> for TestRender<'a> {
    fn on_init(&mut self, ctx: &mut Context, _: &mut FrameCounter) -> Out<FrameCounter, ()> {
        (self.setup)(ctx);
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        state: &mut FrameCounter,
        _: instant::Duration,
    ) -> Out<FrameCounter, ()> {
        state.progress();
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &winit::event::DeviceEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut FrameCounter,
        _: &winit::event::WindowEvent,
    ) -> Out<FrameCounter, ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut FrameCounter, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut FrameCounter,
        texture: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(ctx, state, texture)
    }
}

#[cfg(feature = "integration-tests")]
pub(crate) type SceneImage = image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>;

/// Runs next to a `SceneFlow` and judges every rendered frame of the scene.
#[cfg(feature = "integration-tests")]
pub(crate) struct SceneCheck {
    pub(crate) validate: fn(&SceneState, &SceneImage) -> Result<ImageTestResult, anyhow::Error>,
}

#[cfg(feature = "integration-tests")]
impl GraphicsFlow<SceneState, ()> for SceneCheck {
    fn on_init(&mut self, _: &mut Context, _: &mut SceneState) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        _: &mut SceneState,
        _: instant::Duration,
    ) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut SceneState,
        _: &winit::event::DeviceEvent,
    ) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut SceneState,
        _: &winit::event::WindowEvent,
    ) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut SceneState, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    fn render_to_texture(
        &self,
        _: &Context,
        state: &mut SceneState,
        texture: &mut SceneImage,
    ) -> Result<ImageTestResult, anyhow::Error> {
        (self.validate)(state, texture)
    }
}

/// Renders the scene of `config` with assets from `loader` until `check`
/// passes.
#[cfg(feature = "integration-tests")]
pub(crate) fn run_scene_check(
    config: SceneConfig,
    loader: Rc<dyn AssetLoader>,
    check: SceneCheck,
) {
    use skydome::{app::SceneFlow, context::InitContext, flow::FlowConsturctor};

    let Built {
        scene,
        camera,
        cube,
        loads,
    } = SceneBuilder::new(&config).build();
    let state = SceneState::new(scene, cube, &config.animation);
    let settings = config.render.clone();

    let scene_flow: FlowConsturctor<SceneState, ()> = Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow: Box<dyn GraphicsFlow<SceneState, ()>> =
                Box::new(SceneFlow::new(&ctx, config, camera, loads, loader));
            flow
        })
    });
    let check_flow: FlowConsturctor<SceneState, ()> = Box::new(move |_| {
        Box::pin(async move {
            let flow: Box<dyn GraphicsFlow<SceneState, ()>> = Box::new(check);
            flow
        })
    });

    skydome::flow::run(settings, state, vec![scene_flow, check_flow])
        .expect("Failed to run flow for integration test.");
}

/// The pixel in the middle of the view, where the camera looks at the
/// backdrop.
#[cfg(feature = "integration-tests")]
pub(crate) fn centre_pixel(texture: &SceneImage) -> image::Rgba<u8> {
    let (width, height) = texture.dimensions();
    *texture.get_pixel(width / 2, height / 2)
}

#[macro_export]
macro_rules! golden_image_test {
    ($graphics_elem:expr) => {{
        use crate::common::test_utils::FrameCounter;
        use skydome::flow::FlowConsturctor;
        use skydome::flow::GraphicsFlow;
        let model_constructor: FlowConsturctor<FrameCounter, ()> = Box::new(|_| {
            Box::pin(async move {
                let g_flow: Box<dyn GraphicsFlow<FrameCounter, ()>> = Box::new($graphics_elem);
                g_flow
            })
        });

        skydome::flow::run(
            skydome::config::RenderSettings::default(),
            FrameCounter::default(),
            vec![model_constructor],
        )
        .expect("Failed to run flow for integration test.");
    }};
}
