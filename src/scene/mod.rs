//! The scene graph as plain data.
//!
//! A [`Scene`] owns every node and every texture slot of the rendered world.
//! It holds no GPU handles: the renderer mirrors it each frame (see
//! [`crate::data_structures::scene_graph`]), which keeps construction,
//! animation and asset resolution testable without a device.
//!
//! Membership is append-only. Nodes are added either to the root
//! ([`Scene::add`]) or below an existing node ([`Scene::add_child`]) and are
//! never removed, so a [`NodeId`] stays valid for the lifetime of the scene.

pub mod colour;
pub mod geometry;
pub mod material;
pub mod node;
pub mod texture;
pub mod transform;

use anyhow::anyhow;

use crate::{data_structures::instance::Instance, resources::LoadedModel};

pub use colour::Colour;
pub use geometry::{Geometry, GeometryData};
pub use material::{Material, Shading, Side};
pub use node::{Node, NodeId, NodeKind};
pub use texture::{TextureEntry, TextureSlot};
pub use transform::{Euler, Transform};

/// Linear distance fog.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fog {
    pub colour: Colour,
    pub near: f32,
    pub far: f32,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub background: Colour,
    pub fog: Option<Fog>,
    nodes: Vec<Node>,
    textures: Vec<TextureEntry>,
}

impl Scene {
    pub fn new(background: Colour) -> Self {
        Self {
            background,
            fog: None,
            nodes: Vec::new(),
            textures: Vec::new(),
        }
    }

    /// Attaches `node` to the root.
    pub fn add(&mut self, mut node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        node.parent = None;
        node.children.clear();
        self.nodes.push(node);
        id
    }

    /// Attaches `node` below `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> anyhow::Result<NodeId> {
        if parent.0 >= self.nodes.len() {
            return Err(anyhow!(
                "cannot attach {} to missing parent {:?}",
                node.name,
                parent
            ));
        }
        let id = NodeId(self.nodes.len());
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes attached directly to the root, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, node)| node.parent.is_none())
            .map(|(id, _)| id)
    }

    /// True if `id` reaches the root through its chain of parents.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        // A chain longer than the node count would mean a cycle.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(current.0) {
                None => return false,
                Some(node) => match node.parent {
                    None => return true,
                    Some(parent) => current = parent,
                },
            }
        }
        false
    }

    /// True if `id` and all of its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        for _ in 0..=self.nodes.len() {
            match current.and_then(|id| self.nodes.get(id.0)) {
                None => return current.is_none(),
                Some(node) if !node.visible => return false,
                Some(node) => current = node.parent,
            }
        }
        false
    }

    /// World transform of `id`: its local transform composed with all ancestors.
    pub fn world_transform(&self, id: NodeId) -> Option<Instance> {
        let node = self.nodes.get(id.0)?;
        let local = node.transform.to_instance();
        match node.parent {
            None => Some(local),
            Some(parent) => Some(&self.world_transform(parent)? * &local),
        }
    }

    /// Inserts a loaded mesh file below a new root group placed at
    /// `transform`. Returns the group, which moves all parts together.
    pub fn insert_loaded(&mut self, model: LoadedModel, transform: Transform) -> NodeId {
        let mut group = Node::group(&model.name);
        group.transform = transform;
        let group = self.add(group);

        let slots: Vec<TextureSlot> = model
            .images
            .into_iter()
            .enumerate()
            .map(|(idx, image)| {
                self.add_resolved_texture(&format!("{}#image{}", model.name, idx), image)
            })
            .collect();

        for part in model.parts {
            let mut material = Material::phong(part.colour);
            if let Some(slot) = part.image.and_then(|idx| slots.get(idx)) {
                material = material.with_map(*slot);
            }
            if part.opacity < 1.0 {
                material = material.with_opacity(part.opacity);
            }
            let node = Node::mesh(&part.name, Geometry::Custom(part.geometry), material)
                .casting_shadow()
                .receiving_shadow();
            // The group was just added, so attaching below it cannot fail
            if let Err(e) = self.add_child(group, node) {
                log::error!("{:#}", e);
            }
        }
        group
    }

    /// Returns the slot for `path`, creating an unresolved one on first use.
    pub fn texture_slot(&mut self, path: &str) -> TextureSlot {
        if let Some(idx) = self.textures.iter().position(|t| t.path() == path) {
            return TextureSlot(idx);
        }
        self.textures.push(TextureEntry::pending(path));
        TextureSlot(self.textures.len() - 1)
    }

    /// Adds a slot that already holds its image, e.g. a texture embedded in
    /// a loaded mesh.
    pub fn add_resolved_texture(&mut self, label: &str, image: image::RgbaImage) -> TextureSlot {
        self.textures.push(TextureEntry::resolved(label, image));
        TextureSlot(self.textures.len() - 1)
    }

    pub fn resolve_texture(&mut self, slot: TextureSlot, image: image::RgbaImage) -> anyhow::Result<()> {
        let entry = self
            .textures
            .get_mut(slot.0)
            .ok_or_else(|| anyhow!("unknown texture slot {:?}", slot))?;
        entry.resolve(image);
        Ok(())
    }

    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureEntry> {
        self.textures.get(slot.0)
    }

    pub fn textures(&self) -> impl Iterator<Item = (TextureSlot, &TextureEntry)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(i, t)| (TextureSlot(i), t))
    }

    /// Slots that still wait for their image.
    pub fn pending_textures(&self) -> Vec<(TextureSlot, String)> {
        self.textures()
            .filter(|(_, entry)| !entry.is_resolved())
            .map(|(slot, entry)| (slot, entry.path().to_string()))
            .collect()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Colour::BLACK)
    }
}
