//! Instance transformation data for GPU rendering.
//!
//! Each mesh in the scene is drawn with one instance whose transform is
//! uploaded into a small vertex buffer stepping per instance.

use cgmath::{Euler, Matrix3, Matrix4, Rad, Vector3, Zero};

use crate::data_structures::model;

/// Per-instance transformation: position, Euler rotation (XYZ order) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Instance {
    pub position: Vector3<f32>,
    pub rotation: Euler<Rad<f32>>,
    pub scale: Vector3<f32>,
}

impl Instance {
    /// Identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::zero(),
            rotation: Euler::new(Rad(0.0), Rad(0.0), Rad(0.0)),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotation as a matrix, applying the x angle first in the parent frame
    /// (`Rx * Ry * Rz`).
    pub fn rotation_matrix(&self) -> Matrix3<f32> {
        Matrix3::from_angle_x(self.rotation.x)
            * Matrix3::from_angle_y(self.rotation.y)
            * Matrix3::from_angle_z(self.rotation.z)
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation_matrix())
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.to_matrix().into(),
            normal: self.rotation_matrix().into(),
        }
    }
}

impl From<Vector3<f32>> for Instance {
    fn from(position: Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

/// The instance data as stored on the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 3]; 3],
}

impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Advance once per instance instead of once per vertex.
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // A mat4 takes four vec4 slots.
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn identity_instance_keeps_points() {
        let m = Instance::new().to_matrix();
        let p = m * Vector4::new(1.0, 2.0, 3.0, 1.0);
        assert_eq!(p, Vector4::new(1.0, 2.0, 3.0, 1.0));
    }

    #[test]
    fn translation_is_applied_after_rotation() {
        let instance = Instance {
            position: Vector3::new(-1.5, 0.0, 0.0),
            rotation: Euler::new(Rad(0.0), Rad(std::f32::consts::FRAC_PI_2), Rad(0.0)),
            ..Default::default()
        };
        let p = instance.to_matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert!(approx(p.truncate(), Vector3::new(-1.5, 0.0, -1.0)));
    }

    #[test]
    fn x_rotation_is_outermost() {
        let quarter = Rad(std::f32::consts::FRAC_PI_2);
        let instance = Instance {
            rotation: Euler::new(quarter, quarter, Rad(0.0)),
            ..Default::default()
        };
        // Ry maps +z to +x, Rx leaves +x alone.
        let v = instance.rotation_matrix() * Vector3::unit_z();
        assert!(approx(v, Vector3::unit_x()));
    }

    #[test]
    fn raw_layout_matches_stride() {
        use model::Vertex;
        let layout = InstanceRaw::desc();
        assert_eq!(layout.array_stride, std::mem::size_of::<InstanceRaw>() as u64);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Instance);
    }
}
