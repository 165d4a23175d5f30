use crate::scene::{colour::Colour, texture::TextureSlot};

/// Which faces of a mesh are rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shading {
    /// Unlit: colour (times the colour map) only.
    Basic,
    /// Ambient + Lambert diffuse + Blinn-Phong specular, shadowed.
    Phong { shininess: f32 },
    /// Phong lighting blended with an equirectangular environment lookup.
    Reflective { reflectivity: f32 },
}

/// Surface description of a mesh.
///
/// Texture references are slots: a material whose slot is still unresolved
/// renders with its colour alone.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub colour: Colour,
    pub map: Option<TextureSlot>,
    pub env_map: Option<TextureSlot>,
    pub transparent: bool,
    pub opacity: f32,
    pub side: Side,
    pub shading: Shading,
}

impl Material {
    pub fn basic(colour: Colour) -> Self {
        Self::with_shading(colour, Shading::Basic)
    }

    pub fn phong(colour: Colour) -> Self {
        Self::with_shading(colour, Shading::Phong { shininess: 30.0 })
    }

    pub fn reflective(colour: Colour, reflectivity: f32) -> Self {
        Self::with_shading(colour, Shading::Reflective { reflectivity })
    }

    fn with_shading(colour: Colour, shading: Shading) -> Self {
        Self {
            colour,
            map: None,
            env_map: None,
            transparent: false,
            opacity: 1.0,
            side: Side::Front,
            shading,
        }
    }

    pub fn with_map(mut self, slot: TextureSlot) -> Self {
        self.map = Some(slot);
        self
    }

    pub fn with_env_map(mut self, slot: TextureSlot) -> Self {
        self.env_map = Some(slot);
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Marks the material as blended with the given opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.transparent = true;
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::basic(Colour::WHITE)
    }
}
