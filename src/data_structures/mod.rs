//! Engine data structures: models, textures, instances and the GPU mirror of
//! the scene.
//!
//! - `model` contains mesh and material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds per-instance transformation data
//! - `scene_graph` keeps GPU buffers in step with a [`Scene`](crate::scene::Scene)

pub mod instance;
pub mod model;
pub mod scene_graph;
pub mod texture;
