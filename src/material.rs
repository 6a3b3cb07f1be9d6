//! The physically based standard material.
//!
//! [`StandardMaterial`] holds the scalar parameters the shader reads and one
//! optional texture per map slot. Empty slots are bound to neutral
//! placeholders and switched off through [`MaterialUniform::flags`], so a
//! single bind group layout serves every configuration.

use wgpu::util::DeviceExt;

use crate::data_structures::texture::{self, Texture, TextureOptions};

pub mod flags {
    pub const MAP: u32 = 1;
    pub const ALPHA_MAP: u32 = 1 << 1;
    pub const AO_MAP: u32 = 1 << 2;
    pub const DISPLACEMENT_MAP: u32 = 1 << 3;
    pub const NORMAL_MAP: u32 = 1 << 4;
    pub const METALNESS_MAP: u32 = 1 << 5;
    pub const ROUGHNESS_MAP: u32 = 1 << 6;
    pub const ENV_MAP: u32 = 1 << 7;
}

/// Texture slots of a [`StandardMaterial`].
#[derive(Clone, Debug, Default)]
pub struct MaterialMaps {
    pub map: Option<Texture>,
    pub alpha_map: Option<Texture>,
    pub ao_map: Option<Texture>,
    pub displacement_map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub metalness_map: Option<Texture>,
    pub roughness_map: Option<Texture>,
    pub env_map: Option<Texture>,
}

impl MaterialMaps {
    pub fn flags(&self) -> u32 {
        [
            (self.map.is_some(), flags::MAP),
            (self.alpha_map.is_some(), flags::ALPHA_MAP),
            (self.ao_map.is_some(), flags::AO_MAP),
            (self.displacement_map.is_some(), flags::DISPLACEMENT_MAP),
            (self.normal_map.is_some(), flags::NORMAL_MAP),
            (self.metalness_map.is_some(), flags::METALNESS_MAP),
            (self.roughness_map.is_some(), flags::ROUGHNESS_MAP),
            (self.env_map.is_some(), flags::ENV_MAP),
        ]
        .into_iter()
        .filter(|(set, _)| *set)
        .fold(0, |acc, (_, bit)| acc | bit)
    }
}

#[derive(Clone, Debug)]
pub struct StandardMaterial {
    pub color: [f32; 3],
    pub metalness: f32,
    pub roughness: f32,
    pub ao_map_intensity: f32,
    pub displacement_scale: f32,
    pub normal_scale: [f32; 2],
    pub env_map_intensity: f32,
    pub opacity: f32,
    /// Draw with alpha blending after the opaque meshes.
    pub transparent: bool,
    pub maps: MaterialMaps,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            metalness: 0.0,
            roughness: 1.0,
            ao_map_intensity: 1.0,
            displacement_scale: 1.0,
            normal_scale: [1.0, 1.0],
            env_map_intensity: 1.0,
            opacity: 1.0,
            transparent: false,
            maps: MaterialMaps::default(),
        }
    }
}

impl StandardMaterial {
    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            color: [self.color[0], self.color[1], self.color[2], 1.0],
            metalness: self.metalness,
            roughness: self.roughness,
            ao_map_intensity: self.ao_map_intensity,
            displacement_scale: self.displacement_scale,
            normal_scale: self.normal_scale,
            env_map_intensity: self.env_map_intensity,
            opacity: self.opacity,
            flags: self.maps.flags(),
            _padding: [0; 3],
        }
    }

    /// Upload the material: a uniform buffer plus a bind group in
    /// [`bind_group_layout`] shape.
    pub fn create_gpu_material(
        &self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        placeholders: &Placeholders,
        label: &str,
    ) -> GpuMaterial {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Uniform Buffer")),
            contents: bytemuck::cast_slice(&[self.uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let maps = &self.maps;
        let env = maps.env_map.as_ref().unwrap_or(&placeholders.env);

        // Colour maps share the sampler of the albedo map when there is one.
        let sampler = maps
            .map
            .as_ref()
            .and_then(|t| t.sampler.as_ref())
            .unwrap_or(&placeholders.sampler);
        let env_sampler = env.sampler.as_ref().unwrap_or(&placeholders.env_sampler);

        let views = [
            slot_view(&maps.map, &placeholders.white),
            slot_view(&maps.alpha_map, &placeholders.white),
            slot_view(&maps.ao_map, &placeholders.white),
            slot_view(&maps.displacement_map, &placeholders.black),
            slot_view(&maps.normal_map, &placeholders.normal),
            slot_view(&maps.metalness_map, &placeholders.white),
            slot_view(&maps.roughness_map, &placeholders.white),
        ];

        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];
        entries.extend(views.into_iter().enumerate().map(|(i, v)| wgpu::BindGroupEntry {
            binding: 2 + i as u32,
            resource: wgpu::BindingResource::TextureView(v),
        }));
        entries.push(wgpu::BindGroupEntry {
            binding: 9,
            resource: wgpu::BindingResource::TextureView(&env.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: 10,
            resource: wgpu::BindingResource::Sampler(env_sampler),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout,
            entries: &entries,
        });

        GpuMaterial {
            buffer,
            bind_group,
            transparent: self.transparent,
        }
    }
}

/// Uniform block of the standard material shader. 64 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub color: [f32; 4],
    pub metalness: f32,
    pub roughness: f32,
    pub ao_map_intensity: f32,
    pub displacement_scale: f32,
    pub normal_scale: [f32; 2],
    pub env_map_intensity: f32,
    pub opacity: f32,
    pub flags: u32,
    // Uniforms require 16 byte (4 float field) alignment.
    pub _padding: [u32; 3],
}

/// The uploaded material.
#[derive(Debug)]
pub struct GpuMaterial {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub transparent: bool,
}

impl GpuMaterial {
    /// Rewrite the uniform block, e.g. after a slider moved.
    pub fn write_to_buffer(&self, queue: &wgpu::Queue, material: &StandardMaterial) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[material.uniform()]));
    }
}

/// Textures bound in place of empty slots.
#[derive(Debug)]
pub struct Placeholders {
    pub white: Texture,
    pub black: Texture,
    pub normal: Texture,
    pub env: Texture,
    pub sampler: wgpu::Sampler,
    pub env_sampler: wgpu::Sampler,
}

impl Placeholders {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> anyhow::Result<Self> {
        Ok(Self {
            white: Texture::from_colour(
                device,
                queue,
                [255, 255, 255, 255],
                "white placeholder",
                TextureOptions::DATA,
            ),
            black: Texture::from_colour(
                device,
                queue,
                [0, 0, 0, 255],
                "black placeholder",
                TextureOptions::DATA,
            ),
            normal: Texture::create_default_normal_map(device, queue),
            env: Texture::create_placeholder_cube(device, queue)?,
            sampler: texture::create_sampler(device, TextureOptions::COLOUR, wgpu::AddressMode::Repeat),
            env_sampler: texture::create_sampler(
                device,
                TextureOptions::COLOUR,
                wgpu::AddressMode::ClampToEdge,
            ),
        })
    }
}

fn slot_view<'a>(slot: &'a Option<Texture>, fallback: &'a Texture) -> &'a wgpu::TextureView {
    &slot.as_ref().unwrap_or(fallback).view
}

fn texture_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Layout of the material bind group (group 0):
///
/// | binding | resource |
/// | --- | --- |
/// | 0 | [`MaterialUniform`] |
/// | 1 | sampler for the 2D maps |
/// | 2..=8 | map, alpha, ao, displacement, normal, metalness, roughness |
/// | 9 | environment cube |
/// | 10 | environment sampler |
pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    use wgpu::ShaderStages as S;
    use wgpu::TextureViewDimension as D;
    let both = S::VERTEX | S::FRAGMENT;
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Standard material bind group layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: both,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            // The displacement map is sampled in the vertex stage too.
            sampler_entry(1, both),
            texture_entry(2, S::FRAGMENT, D::D2),
            texture_entry(3, S::FRAGMENT, D::D2),
            texture_entry(4, S::FRAGMENT, D::D2),
            texture_entry(5, both, D::D2),
            texture_entry(6, S::FRAGMENT, D::D2),
            texture_entry(7, S::FRAGMENT, D::D2),
            texture_entry(8, S::FRAGMENT, D::D2),
            texture_entry(9, S::FRAGMENT, D::Cube),
            sampler_entry(10, S::FRAGMENT),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_is_sixty_four_bytes() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }

    #[test]
    fn defaults_match_a_fresh_standard_material() {
        let m = StandardMaterial::default();
        assert_eq!(m.metalness, 0.0);
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.ao_map_intensity, 1.0);
        assert_eq!(m.displacement_scale, 1.0);
        assert!(!m.transparent);
        assert_eq!(m.uniform().flags, 0);
    }

    #[test]
    fn uniform_carries_scalar_parameters() {
        let m = StandardMaterial {
            metalness: 0.7,
            roughness: 0.2,
            normal_scale: [0.5, 0.5],
            ..Default::default()
        };
        let u = m.uniform();
        assert_eq!(u.metalness, 0.7);
        assert_eq!(u.roughness, 0.2);
        assert_eq!(u.normal_scale, [0.5, 0.5]);
        assert_eq!(u.color, [1.0; 4]);
    }
}
