//! Perspective camera, projection and orbit controls.
//!
//! The camera is described by an eye position and a target. [`OrbitControls`]
//! moves the eye on a sphere around the target in response to mouse input and
//! eases the motion out over several frames when damping is enabled.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(position: P, target: P) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

/// Perspective projection. `fovy` is the vertical field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(aspect: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = (projection.calc_matrix() * camera.calc_matrix()).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// GPU side of the camera: the uniform buffer and its bind group.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controls: OrbitControls,
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    /// Recompute the uniform and upload it.
    pub fn write_to_buffer(&mut self, queue: &wgpu::Queue, projection: &Projection) {
        self.uniform.update_view_proj(&self.camera, projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

/// Spherical coordinates of the eye relative to the target.
/// `theta` is the azimuth around +Y, `phi` the polar angle from +Y.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vector3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Mouse-driven orbit around a target point.
///
/// Left drag rotates, right drag pans and the wheel dollies. Input only
/// records deltas; [`OrbitControls::update`] applies them to a [`Camera`]
/// once per frame.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vector3<f32>,
    drag: DragState,
    cursor: Option<PhysicalPosition<f64>>,
    viewport_height: f32,
}

impl OrbitControls {
    const EPS: f32 = 1e-6;

    pub fn new() -> Self {
        Self {
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            drag: DragState::None,
            cursor: None,
            viewport_height: 1.0,
        }
    }

    /// Height in pixels of the surface the cursor moves on. A full-height
    /// drag turns the camera by one revolution.
    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    /// Rotate the eye by `angle` around the up axis.
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    /// Rotate the eye by `angle` towards the up axis.
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Move the eye closer to the target by `scale` (> 1 moves closer).
    pub fn dolly_in(&mut self, scale: f32) {
        self.scale /= scale;
    }

    pub fn dolly_out(&mut self, scale: f32) {
        self.scale *= scale;
    }

    /// Pan by a cursor delta in pixels.
    pub fn pan(&mut self, camera: &Camera, fovy: Rad<f32>, dx: f32, dy: f32) {
        let offset = camera.position - camera.target;
        let target_distance = offset.magnitude() * (fovy.0 / 2.0).tan();
        let forward = -offset.normalize();
        let right = forward.cross(camera.up).normalize();
        let up = right.cross(forward);
        let scale = 2.0 * target_distance / self.viewport_height * self.pan_speed;
        self.pan_offset += right * (-dx * scale) + up * (dy * scale);
    }

    fn zoom_scale(&self) -> f32 {
        0.95_f32.powf(self.zoom_speed)
    }

    /// Feed a window event. Returns `true` when the event moved the camera.
    pub fn handle_window_events(&mut self, camera: &Camera, fovy: Rad<f32>, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (state, button) {
                    (ElementState::Pressed, MouseButton::Left) => DragState::Rotate,
                    (ElementState::Pressed, MouseButton::Right) => DragState::Pan,
                    (ElementState::Released, _) => DragState::None,
                    _ => self.drag,
                };
                false
            }
            WindowEvent::CursorMoved { position, .. } => {
                let previous = self.cursor.replace(*position);
                let Some(previous) = previous else {
                    return false;
                };
                let dx = (position.x - previous.x) as f32;
                let dy = (position.y - previous.y) as f32;
                match self.drag {
                    DragState::Rotate => {
                        let unit = 2.0 * PI * self.rotate_speed / self.viewport_height;
                        self.rotate_left(dx * unit);
                        self.rotate_up(dy * unit);
                        true
                    }
                    DragState::Pan => {
                        self.pan(camera, fovy, dx, dy);
                        true
                    }
                    DragState::None => false,
                }
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                self.drag = DragState::None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
                if scroll > 0.0 {
                    self.dolly_in(1.0 / self.zoom_scale());
                } else if scroll < 0.0 {
                    self.dolly_out(1.0 / self.zoom_scale());
                }
                scroll != 0.0
            }
            _ => false,
        }
    }

    /// Apply pending input to the camera. With damping enabled only a
    /// fraction of the pending rotation and pan is applied and the rest
    /// decays, so call this every frame.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.theta * self.damping_factor;
            spherical.phi += self.spherical_delta.phi * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }
        spherical.phi = spherical.phi.clamp(Self::EPS, PI - Self::EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            camera.target += self.pan_offset * self.damping_factor;
        } else {
            camera.target += self.pan_offset;
        }
        camera.position = camera.target + spherical.to_offset();

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.spherical_delta.theta *= decay;
            self.spherical_delta.phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;
    }
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, MetricSpace};

    use super::*;

    fn scene_camera() -> Camera {
        Camera::new((1.0, 1.0, 2.0), (0.0, 0.0, 0.0))
    }

    #[test]
    fn update_without_input_keeps_the_camera() {
        let mut camera = scene_camera();
        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        controls.update(&mut camera);
        assert!(camera.position.distance(Point3::new(1.0, 1.0, 2.0)) < 1e-5);
    }

    #[test]
    fn undamped_rotation_is_applied_at_once() {
        let mut camera = Camera::new((0.0, 0.0, 2.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new();
        controls.rotate_left(PI / 2.0);
        controls.update(&mut camera);
        assert!(camera.position.distance(Point3::new(-2.0, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn damped_rotation_eases_out_and_keeps_the_distance() {
        let mut camera = scene_camera();
        let distance = camera.position.distance(camera.target);
        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        controls.rotate_left(1.0);

        let mut previous = camera.position;
        let mut steps = Vec::new();
        for _ in 0..200 {
            controls.update(&mut camera);
            steps.push(camera.position.distance(previous));
            previous = camera.position;
        }
        assert!(steps.windows(2).all(|w| w[1] <= w[0] + 1e-6));
        assert!(steps.last().copied().unwrap_or_default() < 1e-4);
        assert!((camera.position.distance(camera.target) - distance).abs() < 1e-4);
    }

    #[test]
    fn pan_moves_eye_and_target_together() {
        let mut camera = Camera::new((0.0, 0.0, 2.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new();
        controls.set_viewport_height(100.0);
        // 90 degrees at distance 2 spans 4 units over 100 pixels.
        controls.pan(&camera, Deg(90.0).into(), 10.0, 0.0);
        controls.update(&mut camera);
        assert!(camera.target.distance(Point3::new(-0.4, 0.0, 0.0)) < 1e-5);
        assert!(camera.position.distance(Point3::new(-0.4, 0.0, 2.0)) < 1e-5);

        controls.update(&mut camera);
        assert!(camera.target.distance(Point3::new(-0.4, 0.0, 0.0)) < 1e-5);
    }

    #[test]
    fn damped_pan_decays_towards_the_full_offset() {
        let mut camera = Camera::new((0.0, 0.0, 2.0), (0.0, 0.0, 0.0));
        let mut controls = OrbitControls::new();
        controls.enable_damping = true;
        controls.set_viewport_height(100.0);
        controls.pan(&camera, Deg(90.0).into(), 0.0, 10.0);

        controls.update(&mut camera);
        assert!((camera.target.y - 0.02).abs() < 1e-5);

        let mut previous = camera.target.y;
        for _ in 0..500 {
            controls.update(&mut camera);
            assert!(camera.target.y >= previous);
            previous = camera.target.y;
        }
        assert!((camera.target.y - 0.4).abs() < 1e-4);
        assert!(camera.position.distance(camera.target + Vector3::new(0.0, 0.0, 2.0)) < 1e-4);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut camera = scene_camera();
        let mut controls = OrbitControls::new();
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.position - camera.target;
        assert!(offset.y > 0.0);
        assert!(offset.x.is_finite() && offset.z.is_finite());
    }

    #[test]
    fn dolly_respects_distance_limits() {
        let mut camera = scene_camera();
        let mut controls = OrbitControls::new();
        controls.min_distance = 1.0;
        controls.dolly_in(100.0);
        controls.update(&mut camera);
        assert!((camera.position.distance(camera.target) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn projection_tracks_aspect() {
        let mut projection = Projection::new(1.0, Deg(75.0), 0.1, 100.0);
        projection.resize(16.0 / 9.0);
        assert_eq!(projection.aspect, 16.0 / 9.0);
        let m: [[f32; 4]; 4] = projection.calc_matrix().into();
        assert!(m.iter().flatten().all(|v| v.is_finite()));
    }
}
