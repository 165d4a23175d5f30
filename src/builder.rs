//! One-shot construction of the scene and the asset loads it waits for.
//!
//! [`SceneBuilder::build`] appends every node synchronously. Images and the
//! optional mesh are not read here: the builder hands out [`PendingLoad`]s,
//! which the scene flow turns into futures once the engine runs. A load that
//! fails is logged and leaves the scene as it was.

use std::{f32::consts::PI, rc::Rc};

use anyhow::Context as _;
use futures::{FutureExt, future::LocalBoxFuture};

use crate::{
    app::SceneState,
    config::{CameraSettings, SceneConfig},
    resources::{self, LoadedModel},
    scene::{
        Colour, Euler, Geometry, Material, Node, NodeId, Scene, Side, TextureSlot, Transform,
    },
};

pub const LIGHT_INTENSITY: f32 = 0.6;
pub const LIGHT_POSITION: [f32; 3] = [-2.0, 2.0, 2.0];
pub const HELPER_SIZE: f32 = 2.0;
pub const GROUND_OPACITY: f32 = 0.4;
pub const CUBE_POSITION: [f32; 3] = [0.0, -2.0, 2.5];
pub const REFLECTIVE_SPHERE_POSITION: [f32; 3] = [1.5, -2.0, 2.5];
pub const REFLECTIVITY: f32 = 1.0;

/// Image to decode into an existing texture slot.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureLoad {
    pub slot: TextureSlot,
    pub path: String,
}

/// Mesh file to insert below a new root group placed at `transform`.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshLoad {
    pub path: String,
    pub transform: Transform,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PendingLoad {
    Texture(TextureLoad),
    Mesh(MeshLoad),
}

impl PendingLoad {
    pub fn path(&self) -> &str {
        match self {
            PendingLoad::Texture(load) => &load.path,
            PendingLoad::Mesh(load) => &load.path,
        }
    }

    pub async fn resolve(self, loader: Rc<dyn AssetLoader>) -> anyhow::Result<Loaded> {
        match self {
            PendingLoad::Texture(load) => load_texture_slot(loader.as_ref(), load).await,
            PendingLoad::Mesh(load) => load_mesh(loader.as_ref(), load).await,
        }
    }
}

/// Where asset bytes come from. [`FileLoader`] reads the `assets` directory
/// (or `<origin>/assets` on the web); tests substitute their own.
pub trait AssetLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<image::RgbaImage>>;
    fn load_model(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedModel>>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FileLoader;

impl AssetLoader for FileLoader {
    fn load_image(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<image::RgbaImage>> {
        let path = path.to_string();
        async move { resources::texture::load_image(&path).await }.boxed_local()
    }

    fn load_model(&self, path: &str) -> LocalBoxFuture<'static, anyhow::Result<LoadedModel>> {
        let path = path.to_string();
        async move { resources::load_model(&path).await }.boxed_local()
    }
}

/// A finished load, ready to be applied to the scene.
#[derive(Debug)]
pub enum Loaded {
    Texture {
        slot: TextureSlot,
        image: image::RgbaImage,
    },
    Mesh {
        model: LoadedModel,
        transform: Transform,
    },
}

impl Loaded {
    pub fn apply(self, state: &mut SceneState) -> anyhow::Result<()> {
        match self {
            Loaded::Texture { slot, image } => state.scene.resolve_texture(slot, image),
            Loaded::Mesh { model, transform } => {
                let parts = model.parts.len();
                let id = state.scene.insert_loaded(model, transform);
                state.animation.attach_loaded_mesh(id);
                log::info!("Inserted loaded mesh {:?} with {} part(s)", id, parts);
                Ok(())
            }
        }
    }
}

pub async fn load_texture_slot(loader: &dyn AssetLoader, load: TextureLoad) -> anyhow::Result<Loaded> {
    let image = loader
        .load_image(&load.path)
        .await
        .with_context(|| format!("loading texture {}", load.path))?;
    Ok(Loaded::Texture {
        slot: load.slot,
        image,
    })
}

pub async fn load_mesh(loader: &dyn AssetLoader, load: MeshLoad) -> anyhow::Result<Loaded> {
    let model = loader
        .load_model(&load.path)
        .await
        .with_context(|| format!("loading mesh {}", load.path))?;
    Ok(Loaded::Mesh {
        model,
        transform: load.transform,
    })
}

/// Applies the outcome of a load. Failures leave the scene untouched.
pub fn apply_load(state: &mut SceneState, path: &str, result: anyhow::Result<Loaded>) {
    match result.and_then(|loaded| loaded.apply(state)) {
        Ok(()) => log::debug!("Asset {} ready", path),
        Err(e) => log::warn!("Asset {} is not available: {:#}", path, e),
    }
}

/// Output of [`SceneBuilder::build`].
#[derive(Debug)]
pub struct Built {
    pub scene: Scene,
    /// Position, target and lens. The aspect follows the surface the scene
    /// is shown on.
    pub camera: CameraSettings,
    pub cube: NodeId,
    pub loads: Vec<PendingLoad>,
}

pub struct SceneBuilder<'a> {
    config: &'a SceneConfig,
}

impl<'a> SceneBuilder<'a> {
    pub fn new(config: &'a SceneConfig) -> Self {
        Self { config }
    }

    pub fn build(self) -> Built {
        let config = self.config;
        let mut scene = Scene::new(config.background);
        scene.fog = config.fog;

        scene.add(Node::ambient_light(Colour::WHITE, LIGHT_INTENSITY));
        let light = scene.add(
            Node::directional_light(Colour::WHITE, LIGHT_INTENSITY)
                .with_position(LIGHT_POSITION)
                .casting_shadow(),
        );
        scene.add(Node::light_helper(light, HELPER_SIZE, Colour::BLACK));

        let backdrop = scene.texture_slot(&config.backdrop_texture);
        scene.add(Node::mesh(
            "backdrop",
            Geometry::sphere(5.0, 32, 32),
            Material::basic(Colour::WHITE)
                .with_map(backdrop)
                .with_side(Side::Double),
        ));

        scene.add(
            Node::mesh(
                "ground",
                Geometry::plane(100.0, 100.0, 100, 100),
                Material::phong(Colour::WHITE)
                    .with_opacity(GROUND_OPACITY)
                    .with_side(Side::Double),
            )
            .with_rotation(Euler::new(-PI / 2.0, 0.0, 0.0))
            .with_position([0.0, -3.0, 0.0])
            .receiving_shadow(),
        );

        let cube_texture = scene.texture_slot(&config.cube_texture);
        let cube = scene.add(
            Node::mesh(
                "cube",
                Geometry::cuboid(1.0, 1.0, 1.0),
                Material::phong(Colour::WHITE).with_map(cube_texture),
            )
            .with_position(CUBE_POSITION)
            .casting_shadow()
            .receiving_shadow(),
        );

        if config.reflective_sphere {
            let environment = scene.texture_slot(&config.backdrop_texture);
            scene.add(
                Node::mesh(
                    "reflective sphere",
                    Geometry::sphere(0.5, 32, 32),
                    Material::reflective(Colour::WHITE, REFLECTIVITY).with_env_map(environment),
                )
                .with_position(REFLECTIVE_SPHERE_POSITION),
            );
        }

        let mut loads: Vec<PendingLoad> = scene
            .pending_textures()
            .into_iter()
            .map(|(slot, path)| PendingLoad::Texture(TextureLoad { slot, path }))
            .collect();
        if let Some(mesh) = &config.loaded_mesh {
            let mut transform = Transform::at(mesh.position);
            transform.scale = [mesh.scale; 3].into();
            loads.push(PendingLoad::Mesh(MeshLoad {
                path: mesh.path.clone(),
                transform,
            }));
        }
        log::debug!(
            "Built {:?} scene: {} nodes, {} pending load(s)",
            config.variant,
            scene.len(),
            loads.len()
        );

        Built {
            scene,
            camera: config.camera.clone(),
            cube,
            loads,
        }
    }
}
