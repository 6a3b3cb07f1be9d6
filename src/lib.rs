//! materials-scene
//!
//! A small physically based rendering demo on wgpu that runs natively and on
//! the web. Three meshes (a sphere, a plane and a torus) share one standard
//! material with an environment map, are lit by an ambient and a point light
//! and spin slowly while an orbit camera looks at them. A debug panel tweaks
//! the material's parameters live.
//!
//! High-level modules
//! - `camera`: camera, projection, orbit controls and the camera uniform
//! - `clock`: monotonic time since start
//! - `config`: scene settings shared by the binary and the web entry point
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: geometry generators, meshes, instances, textures
//! - `flow`: the event loop and the `GraphicsFlow` trait scenes implement
//! - `gui`: the egui debug panel with the material sliders
//! - `material`: the standard material and its GPU representation
//! - `pipelines`: the standard PBR pipelines and the light uniform
//! - `render`: render composition for opaque/transparent batching
//! - `resources`: asset loading for textures and the environment cube map
//! - `scene`: the materials scene itself
//! - `viewport`: window size, aspect ratio and capped pixel ratio
//!

pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod gui;
pub mod material;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod viewport;

// Re-exports commonly used types for convenience in downstream code.
pub use config::{MaterialPreset, SceneConfig};
pub use flow::{GraphicsFlow, init_logger};
pub use scene::{MaterialsScene, run};
