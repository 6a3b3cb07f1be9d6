//! Asset locations and loading.
//!
//! All files live at fixed paths relative to an asset root: a directory on
//! disk natively, a path below the page origin on the web.

pub mod texture;

pub const DOOR_COLOR: &str = "textures/door/color.jpg";
pub const DOOR_ALPHA: &str = "textures/door/alpha.jpg";
pub const DOOR_AMBIENT_OCCLUSION: &str = "textures/door/ambientOcclusion.jpg";
pub const DOOR_HEIGHT: &str = "textures/door/height.jpg";
pub const DOOR_NORMAL: &str = "textures/door/normal.jpg";
pub const DOOR_METALNESS: &str = "textures/door/metalness.jpg";
pub const DOOR_ROUGHNESS: &str = "textures/door/roughness.jpg";
pub const MATCAP: &str = "textures/matcaps/1.png";
pub const GRADIENT: &str = "textures/gradients/3.jpg";
pub const ENVIRONMENT_MAP_DIR: &str = "textures/environmentMaps/0";

/// Cube face file stems, in layer order +X, -X, +Y, -Y, +Z, -Z.
pub const CUBE_FACES: [&str; 6] = ["px", "nx", "py", "ny", "pz", "nz"];

/// The six environment map files in cube layer order.
pub fn environment_map_faces() -> [String; 6] {
    CUBE_FACES.map(|face| format!("{ENVIRONMENT_MAP_DIR}/{face}.jpg"))
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &std::path::Path, file_name: &str) -> anyhow::Result<reqwest::Url> {
    use anyhow::anyhow;

    let window = web_sys::window().ok_or_else(|| anyhow!("No browser window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow!("Page origin is unavailable"))?;
    let base = reqwest::Url::parse(&format!("{origin}/"))?;
    let root = root.to_string_lossy();
    let root = root.trim_matches('/');
    let joined = if root.is_empty() {
        base.join(file_name)?
    } else {
        base.join(&format!("{root}/"))?.join(file_name)?
    };
    Ok(joined)
}

/// Read a whole asset file.
pub async fn load_binary(root: &std::path::Path, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use anyhow::Context;

        let path = root.join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?
    };

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_faces_are_in_cube_layer_order() {
        let faces = environment_map_faces();
        let stems: Vec<_> = faces
            .iter()
            .map(|f| {
                f.rsplit('/')
                    .next()
                    .and_then(|name| name.strip_suffix(".jpg"))
                    .unwrap()
            })
            .collect();
        assert_eq!(stems, ["px", "nx", "py", "ny", "pz", "nz"]);
        assert!(faces.iter().all(|f| f.starts_with("textures/environmentMaps/0/")));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn missing_file_reports_its_path() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let root = std::path::Path::new("definitely-not-an-asset-dir");
        let err = rt.block_on(load_binary(root, DOOR_COLOR)).unwrap_err();
        assert!(format!("{err:#}").contains("door/color.jpg"));
    }
}
