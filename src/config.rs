//! Settings for the two scene variants.
//!
//! There is no configuration file: [`SceneConfig::pier`] and
//! [`SceneConfig::eyeball`] are the two presets, and callers tweak fields
//! before handing the config to [`crate::app::run_scene`].

use crate::scene::{Colour, Euler, Fog};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// Backdrop, ground plane, cube and lights.
    Pier,
    /// Pier plus fog, a reflective sphere and a loaded mesh.
    Eyeball,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub enable_zoom: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.25,
            enable_zoom: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
        }
    }
}

/// Fixed per-frame rotation increments (radians per frame callback).
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationSettings {
    pub cube_step: Euler,
    pub mesh_step: Euler,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            cube_step: Euler::new(0.001, 0.001, 0.001),
            mesh_step: Euler::new(0.0, 0.01, 0.0),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    /// Multisampled colour target (4x) when set.
    pub antialias: bool,
    pub shadows: bool,
    pub shadow_map_size: u32,
}

impl RenderSettings {
    pub fn sample_count(&self) -> u32 {
        if self.antialias { 4 } else { 1 }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            antialias: true,
            shadows: true,
            shadow_map_size: 1024,
        }
    }
}

/// The asynchronously loaded mesh and where it is placed once it arrives.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshAsset {
    pub path: String,
    pub position: [f32; 3],
    pub scale: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub variant: Variant,
    pub background: Colour,
    pub fog: Option<Fog>,
    pub backdrop_texture: String,
    pub cube_texture: String,
    pub reflective_sphere: bool,
    pub loaded_mesh: Option<MeshAsset>,
    pub camera: CameraSettings,
    pub controls: OrbitSettings,
    pub animation: AnimationSettings,
    pub render: RenderSettings,
}

impl SceneConfig {
    pub fn pier() -> Self {
        Self {
            variant: Variant::Pier,
            background: Colour::LIGHT_GRAY,
            fog: None,
            backdrop_texture: "images/pier.jpg".to_string(),
            cube_texture: "images/large-og.jpg".to_string(),
            reflective_sphere: false,
            loaded_mesh: None,
            camera: CameraSettings {
                position: [-1.0, 0.0, 0.0],
                target: [0.0, 0.0, 0.0],
                fovy_degrees: 45.0,
                znear: 1.0,
                zfar: 1000.0,
            },
            controls: OrbitSettings::default(),
            animation: AnimationSettings::default(),
            render: RenderSettings::default(),
        }
    }

    pub fn eyeball() -> Self {
        Self {
            variant: Variant::Eyeball,
            fog: Some(Fog {
                colour: Colour::LIGHT_GRAY,
                near: 1.0,
                far: 100.0,
            }),
            reflective_sphere: true,
            loaded_mesh: Some(MeshAsset {
                path: "models/eyeball.glb".to_string(),
                position: [0.0, -1.0, 0.0],
                scale: 0.5,
            }),
            ..Self::pier()
        }
    }

    pub fn for_variant(variant: Variant) -> Self {
        match variant {
            Variant::Pier => Self::pier(),
            Variant::Eyeball => Self::eyeball(),
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::pier()
    }
}
