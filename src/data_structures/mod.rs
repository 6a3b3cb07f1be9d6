//! Scene data structures: geometry, meshes, textures and instances.
//!
//! - `geometry` tessellates the sphere, plane and torus on the CPU
//! - `model` holds the vertex layout and uploaded GPU meshes
//! - `texture` wraps GPU textures, including cube maps
//! - `instance` holds per-instance transformation data

pub mod geometry;
pub mod instance;
pub mod model;
pub mod texture;
