//! Scene configuration.
//!
//! All knobs have in-code defaults that describe the stock scene. The
//! native binary overrides them from command line flags, the wasm build uses
//! the defaults as-is.

use std::path::PathBuf;

/// Which texture set the standard material is wired to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MaterialPreset {
    /// Metalness 0.7, roughness 0.2 and the environment map.
    #[default]
    EnvironmentMap,
    /// The full door texture set on top of the environment map.
    DoorMaps,
}

#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Directory that contains the `textures/` tree.
    pub assets_dir: PathBuf,
    pub title: String,
    /// Initial logical window size. `None` lets the platform decide.
    pub window_size: Option<(u32, u32)>,
    /// Upper bound for the device pixel ratio used for the drawing buffer.
    pub max_pixel_ratio: f64,
    pub material: MaterialPreset,
    pub show_gui: bool,
    pub clear_colour: wgpu::Color,
}

impl SceneConfig {
    pub const DEFAULT_MAX_PIXEL_RATIO: f64 = 2.0;
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            title: "Materials".to_string(),
            window_size: None,
            max_pixel_ratio: Self::DEFAULT_MAX_PIXEL_RATIO,
            material: MaterialPreset::default(),
            show_gui: true,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_scene_setup() {
        let config = SceneConfig::default();
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.material, MaterialPreset::EnvironmentMap);
        assert!(config.show_gui);
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
    }
}
