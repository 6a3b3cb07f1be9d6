//! Render composition and pipeline batching.
//!
//! A flow describes what it wants drawn as a [`Render`] tree. The frame loop
//! flattens it into one batch per pipeline so opaque meshes are drawn before
//! transparent ones.

use crate::{data_structures::model::Mesh, material::GpuMaterial};

/// One mesh with its material and instance buffer.
#[derive(Clone, Copy, Debug)]
pub struct Drawable<'a> {
    pub mesh: &'a Mesh,
    pub material: &'a GpuMaterial,
    pub instances: &'a wgpu::Buffer,
    pub amount: u32,
}

/// Specifies how a flow's objects should be rendered.
///
/// - `None` renders nothing
/// - `Opaque` renders with depth writes and no blending
/// - `Transparent` renders alpha blended after all opaque objects
/// - `Composed` recursively renders a composition of renders
#[derive(Debug)]
pub enum Render<'a> {
    None,
    Opaque(Drawable<'a>),
    Transparent(Drawable<'a>),
    Composed(Vec<Render<'a>>),
}

impl<'a> Render<'a> {
    /// Sort the tree into per-pipeline batches.
    pub fn set_pipelines(self, opaque: &mut Vec<Drawable<'a>>, transparent: &mut Vec<Drawable<'a>>) {
        match self {
            Render::Opaque(drawable) => opaque.push(drawable),
            Render::Transparent(drawable) => transparent.push(drawable),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(opaque, transparent)),
            Render::None => (),
        }
    }
}

impl<'a> From<Drawable<'a>> for Render<'a> {
    /// Pick the batch from the material's transparency.
    fn from(drawable: Drawable<'a>) -> Self {
        if drawable.material.transparent {
            Render::Transparent(drawable)
        } else {
            Render::Opaque(drawable)
        }
    }
}
