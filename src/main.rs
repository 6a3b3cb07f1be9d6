use std::path::PathBuf;

use clap::Parser;
use materials_scene::{MaterialPreset, SceneConfig};

/// Standard material showcase: a sphere, a plane and a torus under an
/// environment map. Drag to orbit, scroll to zoom, press H to toggle the
/// debug panel.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory containing the `textures/` tree.
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Initial window width in logical pixels.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Initial window height in logical pixels.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Upper bound for the device pixel ratio.
    #[arg(
        long,
        default_value_t = SceneConfig::DEFAULT_MAX_PIXEL_RATIO,
        value_parser = positive_ratio
    )]
    max_pixel_ratio: f64,

    /// Wire the full door texture set into the material.
    #[arg(long)]
    door_maps: bool,

    /// Start with the debug panel hidden.
    #[arg(long)]
    hide_gui: bool,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    verbose: bool,
}

fn positive_ratio(value: &str) -> Result<f64, String> {
    let ratio: f64 = value.parse().map_err(|e| format!("{e}"))?;
    if ratio.is_finite() && ratio > 0.0 {
        Ok(ratio)
    } else {
        Err(format!("expected a positive pixel ratio, got {value}"))
    }
}

impl Args {
    fn into_config(self) -> SceneConfig {
        SceneConfig {
            assets_dir: self.assets,
            window_size: self.width.zip(self.height),
            max_pixel_ratio: self.max_pixel_ratio,
            material: if self.door_maps {
                MaterialPreset::DoorMaps
            } else {
                MaterialPreset::EnvironmentMap
            },
            show_gui: !self.hide_gui,
            ..Default::default()
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    materials_scene::init_logger(if args.verbose { "debug" } else { "info" });
    let config = args.into_config();
    log::info!("Loading assets from {}", config.assets_dir.display());
    materials_scene::run(config)
}

// The web build starts through the library's wasm entry point.
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_the_default_scene() {
        let config = Args::parse_from(["materials-scene"]).into_config();
        assert_eq!(config.assets_dir, PathBuf::from("assets"));
        assert_eq!(config.window_size, None);
        assert_eq!(config.max_pixel_ratio, 2.0);
        assert_eq!(config.material, MaterialPreset::EnvironmentMap);
        assert!(config.show_gui);
    }

    #[test]
    fn flags_map_onto_the_config() {
        let config = Args::parse_from([
            "materials-scene",
            "--assets",
            "/srv/static",
            "--width",
            "800",
            "--height",
            "600",
            "--max-pixel-ratio",
            "1.5",
            "--door-maps",
            "--hide-gui",
        ])
        .into_config();
        assert_eq!(config.assets_dir, PathBuf::from("/srv/static"));
        assert_eq!(config.window_size, Some((800, 600)));
        assert_eq!(config.max_pixel_ratio, 1.5);
        assert_eq!(config.material, MaterialPreset::DoorMaps);
        assert!(!config.show_gui);
    }

    #[test]
    fn width_without_height_is_rejected() {
        assert!(Args::try_parse_from(["materials-scene", "--width", "800"]).is_err());
    }

    #[test]
    fn non_positive_pixel_ratios_are_rejected() {
        for value in ["0", "-3", "NaN", "inf", "two"] {
            let parsed = Args::try_parse_from([
                "materials-scene",
                "--max-pixel-ratio",
                value,
            ]);
            assert!(parsed.is_err(), "{value} was accepted");
        }
        assert_eq!(positive_ratio("0.5"), Ok(0.5));
    }
}
