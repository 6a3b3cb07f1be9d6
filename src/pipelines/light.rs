use wgpu::util::DeviceExt;

/// Linear RGB from a `0xRRGGBB` literal.
pub fn colour_from_hex(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Light that hits every surface equally from all directions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Light emitted from a single point in all directions. No distance falloff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            intensity: 1.0,
        }
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            color: [1.0; 3],
            intensity: 1.0,
            position: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    /// rgb colour, intensity in w
    ambient: [f32; 4],
    // w is unused, vec3 would be padded to 16 bytes anyway
    point_position: [f32; 4],
    /// rgb colour, intensity in w
    point_color: [f32; 4],
}

impl LightUniform {
    pub fn new(ambient: &AmbientLight, point: &PointLight) -> Self {
        let [r, g, b] = ambient.color;
        let [pr, pg, pb] = point.color;
        let [x, y, z] = point.position;
        Self {
            ambient: [r, g, b, ambient.intensity],
            point_position: [x, y, z, 1.0],
            point_color: [pr, pg, pb, point.intensity],
        }
    }
}

impl Default for LightUniform {
    fn default() -> Self {
        Self::new(&AmbientLight::default(), &PointLight::default())
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub ambient: AmbientLight,
    pub point: PointLight,
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, ambient: AmbientLight, point: PointLight) -> Self {
        let uniform = LightUniform::new(&ambient, &point);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            ambient,
            point,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Replace both lights and upload them.
    pub fn set(&mut self, queue: &wgpu::Queue, ambient: AmbientLight, point: PointLight) {
        self.ambient = ambient;
        self.point = point;
        self.uniform = LightUniform::new(&ambient, &point);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_white_is_full_intensity() {
        assert_eq!(colour_from_hex(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(colour_from_hex(0xff0000), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn uniform_packs_intensity_into_w() {
        let ambient = AmbientLight {
            color: colour_from_hex(0xffffff),
            intensity: 0.5,
        };
        let point = PointLight {
            color: colour_from_hex(0xffffff),
            intensity: 0.5,
            position: [2.0, 3.0, 4.0],
        };
        let u = LightUniform::new(&ambient, &point);
        assert_eq!(u.ambient, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(u.point_position, [2.0, 3.0, 4.0, 1.0]);
        assert_eq!(u.point_color[3], 0.5);
        assert_eq!(std::mem::size_of::<LightUniform>(), 48);
    }
}
