use crate::scene::{
    colour::Colour,
    geometry::Geometry,
    material::Material,
    transform::{Euler, Transform},
};

/// Index of a node inside its [`Scene`](super::Scene).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Mesh {
        geometry: Geometry,
        material: Material,
    },
    AmbientLight {
        colour: Colour,
        intensity: f32,
    },
    /// Shines from the node's world position toward `target`.
    DirectionalLight {
        colour: Colour,
        intensity: f32,
        target: [f32; 3],
    },
    /// Debug visual of a directional light: a square around the light and a
    /// line toward its target.
    DirectionalLightHelper {
        light: NodeId,
        size: f32,
        colour: Colour,
    },
    Group,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            transform: Transform::new(),
            cast_shadow: false,
            receive_shadow: false,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn mesh(name: &str, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn ambient_light(colour: Colour, intensity: f32) -> Self {
        Self::new("ambient light", NodeKind::AmbientLight { colour, intensity })
    }

    pub fn directional_light(colour: Colour, intensity: f32) -> Self {
        Self::new(
            "directional light",
            NodeKind::DirectionalLight {
                colour,
                intensity,
                target: [0.0; 3],
            },
        )
    }

    pub fn light_helper(light: NodeId, size: f32, colour: Colour) -> Self {
        Self::new(
            "directional light helper",
            NodeKind::DirectionalLightHelper {
                light,
                size,
                colour,
            },
        )
    }

    pub fn group(name: &str) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn with_position(mut self, position: [f32; 3]) -> Self {
        self.transform.position = position.into();
        self
    }

    pub fn with_rotation(mut self, rotation: Euler) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.transform.scale = [scale; 3].into();
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }
}
