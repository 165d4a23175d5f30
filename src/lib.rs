//! skydome
//!
//! A panoramic backdrop scene rendered with wgpu, natively and in the
//! browser. A textured sphere surrounds the camera, a translucent ground
//! plane catches the shadow of a slowly spinning cube, and the orbit controls
//! let the user look around. The second variant adds fog, a reflective
//! sphere and a mesh loaded from a glTF/OBJ file.
//!
//! High-level modules
//! - `scene`: the scene graph as plain data (nodes, materials, texture slots)
//! - `builder`: one-shot scene construction and its asynchronous asset loads
//! - `animation`: the fixed per-frame rotation
//! - `app`: the flow that ties scene, loads and animation to the engine loop
//! - `camera`: camera, projection and damped orbit controls
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: engine data models (meshes, instances, textures, GPU scene mirror)
//! - `flow`: the event loop and the flow abstraction
//! - `pipelines`: mesh, transparent, shadow and helper pipelines
//! - `resources`: helpers to load images and meshes
//! - `render`: render composition for efficient pipeline reuse
//!

pub mod animation;
pub mod app;
pub mod builder;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;

pub use app::run_scene;
pub use config::{SceneConfig, Variant};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_pier() -> Result<(), JsValue> {
    run_scene(SceneConfig::pier()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn run_eyeball() -> Result<(), JsValue> {
    run_scene(SceneConfig::eyeball()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
