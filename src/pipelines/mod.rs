//! Render pipelines and the uniforms they share.
//!
//! - `standard` builds the opaque and transparent standard-material pipelines
//! - `light` holds the ambient and point light uniform

pub mod light;
pub mod standard;
