//! Render composition and pipeline batching.
//!
//! This module defines the [`Render`] enum, which flows return to describe
//! what they draw this frame. The engine uses `Render` to sort objects into
//! batches (opaque per side, helper lines, transparent) and to collect the
//! shadow casters drawn into the light's depth map.
//!
//! # Key types
//!
//! - [`Render<'a>`] is the primary enum describing render operations
//! - [`Instanced<'a>`] contains data for instanced rendering (model + instance buffer)
//! - [`Lines<'a>`] contains a line-list vertex buffer drawn with the helper pipeline
//!

use crate::{data_structures::model::Model, scene::Side};

/// Data for instanced object rendering: a model and its instance buffer.
///
/// The instance buffer contains per-instance world matrices. `side` selects
/// the culling of the colour pipeline, `cast_shadow` whether the object is
/// drawn into the shadow map.
#[derive(Clone)]
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
    pub side: Side,
    pub cast_shadow: bool,
}

/// World-space line segments (two vertices each).
#[derive(Clone)]
pub struct Lines<'a> {
    pub vertex: &'a wgpu::Buffer,
    pub amount: u32,
}

/// Specifies how a scene object should be rendered.
///
/// # Variants
///
/// - `None` renders nothing
/// - `Defaults(Vec<Instanced>)` renders a batch of opaque instanced objects
/// - `Transparents(Vec<Instanced>)` renders blended objects in the given order
/// - `Lines(Lines)` renders debug lines
/// - `Composed(Vec<Render>)` recursively renders composition of multiple renders
///
pub enum Render<'a> {
    None,
    Defaults(Vec<Instanced<'a>>),
    Transparents(Vec<Instanced<'a>>),
    Lines(Lines<'a>),
    Composed(Vec<Render<'a>>),
}

/// Draw lists of one frame, filled by [`Render::set_batches`].
pub(crate) struct Batches<'a> {
    pub(crate) opaque: Vec<Instanced<'a>>,
    pub(crate) transparent: Vec<Instanced<'a>>,
    pub(crate) lines: Vec<Lines<'a>>,
}

impl<'a> Batches<'a> {
    pub(crate) fn new() -> Self {
        Self {
            opaque: Vec::new(),
            transparent: Vec::new(),
            lines: Vec::new(),
        }
    }
}

impl<'a> Render<'a> {
    pub(crate) fn set_batches(self, batches: &mut Batches<'a>) {
        match self {
            Render::Defaults(mut vec) => batches.opaque.append(&mut vec),
            Render::Transparents(mut vec) => batches.transparent.append(&mut vec),
            Render::Lines(lines) => batches.lines.push(lines),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_batches(batches)),
            Render::None => (),
        }
    }

    /// Collects everything that casts a shadow.
    pub(crate) fn set_shadow_casters(self, casters: &mut Vec<Instanced<'a>>) {
        match self {
            Render::Defaults(vec) | Render::Transparents(vec) => {
                casters.extend(vec.into_iter().filter(|instanced| instanced.cast_shadow))
            }
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_shadow_casters(casters)),
            Render::Lines(_) | Render::None => (),
        }
    }
}
