use std::path::Path;

use anyhow::Context;
use futures::future::join_all;

use crate::{
    data_structures::texture::{self, Texture, TextureOptions},
    resources::{self, load_binary},
};

/// What to bind when a file fails to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    White,
    FlatNormal,
}

impl Placeholder {
    fn rgba(self) -> [u8; 4] {
        match self {
            Placeholder::White => [255, 255, 255, 255],
            Placeholder::FlatNormal => [127, 127, 255, 255],
        }
    }
}

/// Guess the decoder from the file extension.
pub fn format_hint(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|ext| ext.to_str())
}

/// Decode already fetched bytes, or warn and fall back to a 1x1 placeholder.
pub fn texture_or_placeholder(
    file_name: &str,
    data: anyhow::Result<Vec<u8>>,
    options: TextureOptions,
    placeholder: Placeholder,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Texture {
    let texture = data.and_then(|bytes| {
        Texture::from_bytes(device, queue, &bytes, file_name, format_hint(file_name), options)
    });
    match texture {
        Ok(texture) => texture,
        Err(e) => {
            log::warn!("Texture {file_name} could not be loaded, using a placeholder: {e:#}");
            Texture::from_colour(device, queue, placeholder.rgba(), file_name, options)
        }
    }
}

/// Load the six faces of a cube map concurrently. Faces are given in layer
/// order +X, -X, +Y, -Y, +Z, -Z.
pub async fn load_cube_texture(
    root: &Path,
    faces: &[String; 6],
    label: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<Texture> {
    let data = join_all(faces.iter().map(|face| load_binary(root, face))).await;
    let mut images = Vec::with_capacity(faces.len());
    for (face, bytes) in faces.iter().zip(data) {
        let img = texture::decode(&bytes?, format_hint(face))
            .with_context(|| format!("Could not decode cube face {face}"))?;
        images.push(img);
    }
    let images: [image::DynamicImage; 6] = images
        .try_into()
        .map_err(|_| anyhow::anyhow!("A cube map needs exactly six faces"))?;
    Texture::from_cube_faces(device, queue, &images, label, TextureOptions::COLOUR)
}

/// Every texture the scene knows about.
///
/// Only the environment map feeds the default material. The door set backs
/// the door preset. The matcap and gradient are kept for toon and matcap
/// shading and are loaded so missing files show up in the log.
#[derive(Debug)]
pub struct TextureSet {
    pub door_color: Texture,
    pub door_alpha: Texture,
    pub door_ambient_occlusion: Texture,
    pub door_height: Texture,
    pub door_normal: Texture,
    pub door_metalness: Texture,
    pub door_roughness: Texture,
    pub matcap: Texture,
    pub gradient: Texture,
    pub environment_map: Texture,
}

impl TextureSet {
    pub async fn load(
        root: &Path,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> anyhow::Result<Self> {
        use Placeholder::*;
        const NEAREST_DATA: TextureOptions = TextureOptions {
            srgb: false,
            nearest: true,
        };
        let plan: [(&str, TextureOptions, Placeholder); 9] = [
            (resources::DOOR_COLOR, TextureOptions::COLOUR, White),
            (resources::DOOR_ALPHA, TextureOptions::DATA, White),
            (resources::DOOR_AMBIENT_OCCLUSION, TextureOptions::DATA, White),
            (resources::DOOR_HEIGHT, TextureOptions::DATA, White),
            (resources::DOOR_NORMAL, TextureOptions::DATA, FlatNormal),
            (resources::DOOR_METALNESS, TextureOptions::DATA, White),
            (resources::DOOR_ROUGHNESS, TextureOptions::DATA, White),
            (resources::MATCAP, TextureOptions::COLOUR, White),
            (resources::GRADIENT, NEAREST_DATA, White),
        ];

        let files = join_all(plan.iter().map(|(file, _, _)| load_binary(root, file))).await;
        let mut textures = plan
            .iter()
            .zip(files)
            .map(|((file, options, placeholder), data)| {
                texture_or_placeholder(file, data, *options, *placeholder, device, queue)
            });
        let mut next = || textures.next().context("Texture plan exhausted");

        let faces = resources::environment_map_faces();
        let environment_map =
            match load_cube_texture(root, &faces, "environment map", device, queue).await {
                Ok(texture) => texture,
                Err(e) => {
                    log::warn!("Environment map could not be loaded, using a black cube: {e:#}");
                    Texture::create_placeholder_cube(device, queue)?
                }
            };

        let set = Self {
            door_color: next()?,
            door_alpha: next()?,
            door_ambient_occlusion: next()?,
            door_height: next()?,
            door_normal: next()?,
            door_metalness: next()?,
            door_roughness: next()?,
            matcap: next()?,
            gradient: next()?,
            environment_map,
        };
        log::info!("Loaded textures from {}", root.display());
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_used_as_format_hint() {
        assert_eq!(format_hint(resources::MATCAP), Some("png"));
        assert_eq!(format_hint(resources::DOOR_COLOR), Some("jpg"));
        assert_eq!(format_hint("no_extension"), None);
    }

    #[test]
    fn placeholders_are_neutral() {
        assert_eq!(Placeholder::White.rgba(), [255; 4]);
        assert_eq!(Placeholder::FlatNormal.rgba(), [127, 127, 255, 255]);
    }
}
