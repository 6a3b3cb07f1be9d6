//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources,
//! and helpers for depth buffers, solid-colour placeholders, 2D images and
//! six-face cube maps.

use anyhow::{Result, anyhow, bail};
use image::{GenericImageView, ImageFormat, load_from_memory_with_format};

/// How an image is uploaded and sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    /// Colour images are stored as sRGB, data maps (normals, roughness, ...)
    /// stay linear.
    pub srgb: bool,
    /// Nearest-neighbour min/mag filtering instead of linear.
    pub nearest: bool,
}

impl TextureOptions {
    pub const COLOUR: Self = Self {
        srgb: true,
        nearest: false,
    };
    pub const DATA: Self = Self {
        srgb: false,
        nearest: false,
    };

    pub fn format(&self) -> wgpu::TextureFormat {
        if self.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        }
    }

    pub fn filter(&self) -> wgpu::FilterMode {
        if self.nearest {
            wgpu::FilterMode::Nearest
        } else {
            wgpu::FilterMode::Linear
        }
    }
}

/// A GPU texture with a view and optional sampler.
///
/// Wraps WGPU texture objects along with associated views and samplers.
/// Typically created via [`from_bytes`](Self::from_bytes),
/// [`from_cube_faces`](Self::from_cube_faces) or
/// [`create_depth_texture`](Self::create_depth_texture).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Number of faces of a cube map.
    pub const CUBE_FACES: u32 = 6;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Create a 1x1 texture of a single colour.
    ///
    /// Used in place of texture slots a material leaves empty (white) and of
    /// files that failed to load, so the shader never has to branch on a
    /// missing binding.
    pub fn from_colour(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
        options: TextureOptions,
    ) -> Self {
        let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba(rgba),
        ));
        Self::from_image(device, queue, &img, Some(label), options)
    }

    /// Create a default normal map (neutral blue, representing no deformation).
    pub fn create_default_normal_map(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        // The blue/purple-ish colour that represents the default for normal maps
        Self::from_colour(
            device,
            queue,
            [127, 127, 255, 255],
            "default normal map",
            TextureOptions::DATA,
        )
    }

    /// Load a texture from raw byte data (image file contents).
    ///
    /// # Arguments
    ///
    /// * `bytes` represent raw image file data (PNG, JPEG, etc.)
    /// * `label` is used as a debug name for the GPU resource
    /// * `format` is an optional file format hint (e.g., "png"). If None, auto-detect.
    /// * `options` selects colour space and filtering
    pub fn from_bytes(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        bytes: &[u8],
        label: &str,
        format: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self> {
        let img = decode(bytes, format)?;
        Ok(Self::from_image(device, queue, &img, Some(label), options))
    }

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &image::DynamicImage,
        label: Option<&str>,
        options: TextureOptions,
    ) -> Self {
        let dimensions = img.dimensions();
        let rgba = img.to_rgba8();

        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: options.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        write_layer(queue, &texture, &rgba, 0);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_sampler(device, options, wgpu::AddressMode::Repeat));

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Build a cube map from six decoded faces given in the order
    /// +X, -X, +Y, -Y, +Z, -Z.
    ///
    /// All faces must be square and share one size.
    pub fn from_cube_faces(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[image::DynamicImage; 6],
        label: &str,
        options: TextureOptions,
    ) -> Result<Self> {
        let (width, height) = faces[0].dimensions();
        if width != height {
            bail!("Cube map faces must be square, got {width}x{height} for {label}");
        }
        if let Some((i, face)) = faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.dimensions() != (width, height))
        {
            let (w, h) = face.dimensions();
            bail!("Cube map face {i} of {label} is {w}x{h}, expected {width}x{height}");
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: Self::CUBE_FACES,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: options.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, &face.to_rgba8(), layer as u32);
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = Some(create_sampler(device, options, wgpu::AddressMode::ClampToEdge));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }

    /// A 1x1 black cube, bound when no environment map is available.
    pub fn create_placeholder_cube(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self> {
        let black = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
            1,
            1,
            image::Rgba([0, 0, 0, 255]),
        ));
        let faces: [image::DynamicImage; 6] = std::array::from_fn(|_| black.clone());
        Self::from_cube_faces(device, queue, &faces, "placeholder cube", TextureOptions::COLOUR)
    }
}

/// Decode image file contents, optionally with an extension hint.
pub fn decode(bytes: &[u8], format: Option<&str>) -> Result<image::DynamicImage> {
    let img = match format {
        None => image::load_from_memory(bytes)?,
        Some(fmt) => {
            let fmt = ImageFormat::from_extension(fmt)
                .ok_or_else(|| anyhow!("Unknown image format hint '{fmt}'"))?;
            load_from_memory_with_format(bytes, fmt)?
        }
    };
    Ok(img)
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, rgba: &image::RgbaImage, layer: u32) {
    let (width, height) = rgba.dimensions();
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        },
        rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

pub fn create_sampler(
    device: &wgpu::Device,
    options: TextureOptions,
    address_mode: wgpu::AddressMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: options.filter(),
        min_filter: options.filter(),
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_maps_are_srgb_and_data_maps_linear() {
        assert_eq!(TextureOptions::COLOUR.format(), wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(TextureOptions::DATA.format(), wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn nearest_option_selects_nearest_filtering() {
        let options = TextureOptions {
            srgb: false,
            nearest: true,
        };
        assert_eq!(options.filter(), wgpu::FilterMode::Nearest);
        assert_eq!(TextureOptions::COLOUR.filter(), wgpu::FilterMode::Linear);
    }

    #[test]
    fn decoding_garbage_fails() {
        assert!(decode(&[0, 1, 2, 3], None).is_err());
        assert!(decode(&[0, 1, 2, 3], Some("not-a-format")).is_err());
    }

    #[test]
    fn decoding_a_png_keeps_its_size() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();
        let decoded = decode(bytes.get_ref(), Some("png")).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
    }
}
