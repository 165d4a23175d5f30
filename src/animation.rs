//! The per-frame spin applied before every render.
//!
//! Increments are fixed per frame callback. There is no delta-time
//! normalization, so the apparent speed follows the host's redraw cadence.

use crate::{
    config::AnimationSettings,
    scene::{Euler, NodeId, Scene},
};

#[derive(Clone, Debug)]
pub struct AnimationLoop {
    cube: NodeId,
    cube_step: Euler,
    loaded_mesh: Option<NodeId>,
    mesh_step: Euler,
    frames: u64,
}

impl AnimationLoop {
    pub fn new(cube: NodeId, settings: &AnimationSettings) -> Self {
        Self {
            cube,
            cube_step: settings.cube_step,
            loaded_mesh: None,
            mesh_step: settings.mesh_step,
            frames: 0,
        }
    }

    /// Called once the asynchronously loaded mesh is part of the scene.
    pub fn attach_loaded_mesh(&mut self, id: NodeId) {
        if let Some(previous) = self.loaded_mesh.replace(id) {
            log::warn!("Loaded mesh {:?} replaced by {:?}", previous, id);
        }
    }

    pub fn loaded_mesh(&self) -> Option<NodeId> {
        self.loaded_mesh
    }

    pub fn cube(&self) -> NodeId {
        self.cube
    }

    /// Number of frames advanced so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Applies one frame worth of rotation: the cube on all three axes, then
    /// the loaded mesh if it has arrived.
    pub fn advance(&mut self, scene: &mut Scene) {
        match scene.get_mut(self.cube) {
            Some(cube) => cube.transform.rotate_by(self.cube_step),
            None => log::warn!("Cube {:?} is not part of the scene", self.cube),
        }
        if let Some(mesh) = self.loaded_mesh.and_then(|id| scene.get_mut(id)) {
            mesh.transform.rotate_by(self.mesh_step);
        }
        self.frames += 1;
    }
}
