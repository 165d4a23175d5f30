//! The scene flow: wires the built scene, its loads and the animation into
//! the engine loop.

use std::rc::Rc;

use instant::Duration;
use winit::event::{DeviceEvent, WindowEvent};

use crate::{
    animation::AnimationLoop,
    builder::{AssetLoader, Built, FileLoader, PendingLoad, SceneBuilder, apply_load},
    config::{AnimationSettings, CameraSettings, SceneConfig},
    context::{Context, InitContext},
    data_structures::scene_graph::SceneGraph,
    flow::{self, FlowConsturctor, GraphicsFlow, Out},
    render::Render,
    scene::{NodeId, Scene},
};

/// Everything the frame loop mutates.
#[derive(Debug)]
pub struct SceneState {
    pub scene: Scene,
    pub animation: AnimationLoop,
}

impl SceneState {
    pub fn new(scene: Scene, cube: NodeId, animation: &AnimationSettings) -> Self {
        Self {
            scene,
            animation: AnimationLoop::new(cube, animation),
        }
    }
}

type Mutation = flow::Mutation<SceneState>;

/// Turns pending loads into futures of scene mutations, one per load so
/// that none waits on another. Each mutation applies its load, or logs why
/// it could not.
pub fn schedule_loads(
    loads: Vec<PendingLoad>,
    loader: Rc<dyn AssetLoader>,
) -> Vec<Box<dyn Future<Output = Mutation>>> {
    loads
        .into_iter()
        .map(|load| {
            let loader = loader.clone();
            let path = load.path().to_string();
            let fut: Box<dyn Future<Output = Mutation>> = Box::new(async move {
                let result = load.resolve(loader).await;
                let mutation: Mutation = Box::new(move |state| apply_load(state, &path, result));
                mutation
            });
            fut
        })
        .collect()
}

pub struct SceneFlow {
    config: SceneConfig,
    camera: CameraSettings,
    loads: Vec<PendingLoad>,
    loader: Rc<dyn AssetLoader>,
    graph: SceneGraph,
}

impl SceneFlow {
    pub fn new(
        ctx: &InitContext,
        config: SceneConfig,
        camera: CameraSettings,
        loads: Vec<PendingLoad>,
        loader: Rc<dyn AssetLoader>,
    ) -> Self {
        Self {
            config,
            camera,
            loads,
            loader,
            graph: SceneGraph::new(&ctx.device, &ctx.queue),
        }
    }
}

impl GraphicsFlow<SceneState, ()> for SceneFlow {
    fn on_init(&mut self, ctx: &mut Context, state: &mut SceneState) -> Out<SceneState, ()> {
        ctx.clear_colour = state.scene.background.into();
        ctx.configure_camera(&self.camera, &self.config.controls);
        log::info!(
            "{:?} scene with {} nodes, loading {} asset(s)",
            self.config.variant,
            state.scene.len(),
            self.loads.len()
        );
        let loads = std::mem::take(&mut self.loads);
        if loads.is_empty() {
            return Out::Empty;
        }
        Out::FutFn(schedule_loads(loads, self.loader.clone()))
    }

    fn on_update(&mut self, ctx: &Context, state: &mut SceneState, _: Duration) -> Out<SceneState, ()> {
        state.animation.advance(&mut state.scene);
        self.graph.sync(ctx, &state.scene);
        Out::Empty
    }

    fn on_device_events(&mut self, _: &Context, _: &mut SceneState, _: &DeviceEvent) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &mut SceneState, _: &WindowEvent) -> Out<SceneState, ()> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, _: &mut SceneState, event: ()) -> Option<()> {
        Some(event)
    }

    fn on_render(&self) -> Render<'_> {
        self.graph.on_render()
    }
}

/// Builds the scene described by `config` and runs it until the window is
/// closed.
pub fn run_scene(config: SceneConfig) -> anyhow::Result<()> {
    let built = SceneBuilder::new(&config).build();
    let settings = config.render.clone();
    let Built {
        scene,
        camera,
        cube,
        loads,
    } = built;
    let state = SceneState::new(scene, cube, &config.animation);

    let constructor: FlowConsturctor<SceneState, ()> = Box::new(move |ctx: InitContext| {
        Box::pin(async move {
            let flow: Box<dyn GraphicsFlow<SceneState, ()>> = Box::new(SceneFlow::new(
                &ctx,
                config,
                camera,
                loads,
                Rc::new(FileLoader),
            ));
            flow
        })
    });

    flow::run(settings, state, vec![constructor])
}
