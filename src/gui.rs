//! Debug panel.
//!
//! [`MaterialParam`] describes the tweakable material parameters and their
//! slider ranges. [`DebugGui`] owns the egui state and paints the panel on
//! top of the scene.

use std::ops::RangeInclusive;

use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::Key,
    window::Window,
};

use crate::{context::Context, material::StandardMaterial};

/// Slider granularity shared by every parameter.
pub const SLIDER_STEP: f64 = 0.0001;

/// Material parameters exposed in the panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialParam {
    Metalness,
    Roughness,
    AoMapIntensity,
    DisplacementScale,
}

impl MaterialParam {
    pub const ALL: [Self; 4] = [
        Self::Metalness,
        Self::Roughness,
        Self::AoMapIntensity,
        Self::DisplacementScale,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Metalness => "metalness",
            Self::Roughness => "roughness",
            Self::AoMapIntensity => "aoMapIntensity",
            Self::DisplacementScale => "displacementScale",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::Metalness | Self::Roughness => 0.0..=1.0,
            Self::AoMapIntensity | Self::DisplacementScale => 0.0..=10.0,
        }
    }

    pub fn get(self, material: &StandardMaterial) -> f32 {
        match self {
            Self::Metalness => material.metalness,
            Self::Roughness => material.roughness,
            Self::AoMapIntensity => material.ao_map_intensity,
            Self::DisplacementScale => material.displacement_scale,
        }
    }

    /// Write `value` clamped into [`range`](Self::range).
    pub fn set(self, material: &mut StandardMaterial, value: f32) {
        let range = self.range();
        let value = if value.is_nan() {
            *range.start()
        } else {
            value.clamp(*range.start(), *range.end())
        };
        match self {
            Self::Metalness => material.metalness = value,
            Self::Roughness => material.roughness = value,
            Self::AoMapIntensity => material.ao_map_intensity = value,
            Self::DisplacementScale => material.displacement_scale = value,
        }
    }
}

/// Draw one slider per [`MaterialParam`]. Returns whether any value changed.
pub fn material_panel(ui: &mut egui::Ui, material: &mut StandardMaterial) -> bool {
    let mut changed = false;
    for param in MaterialParam::ALL {
        let mut value = param.get(material);
        let response = ui.add(
            egui::Slider::new(&mut value, param.range())
                .step_by(SLIDER_STEP)
                .text(param.label()),
        );
        if response.changed() {
            param.set(material, value);
            changed = true;
        }
    }
    changed
}

fn is_toggle_key(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && matches!(&event.logical_key, Key::Character(c) if c.eq_ignore_ascii_case("h"))
}

pub struct DebugGui {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    visible: bool,
}

impl std::fmt::Debug for DebugGui {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugGui")
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

impl DebugGui {
    pub fn new(ctx: &Context, visible: bool) -> Self {
        let egui_ctx = egui::Context::default();
        let state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            ctx.window.as_ref(),
            Some(ctx.window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(&ctx.device, ctx.config.format, None, 1, false);
        Self {
            ctx: egui_ctx,
            state,
            renderer,
            visible,
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::debug!("Debug panel visible: {}", self.visible);
    }

    /// Feed a window event to the panel. Returns `true` when the panel used
    /// it and it must not reach the camera.
    pub fn handle_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        if let WindowEvent::KeyboardInput { event: key, .. } = event {
            if is_toggle_key(key) && !self.ctx.wants_keyboard_input() {
                self.toggle();
                return true;
            }
        }
        if !self.visible {
            return false;
        }
        self.state.on_window_event(window, event).consumed
    }

    /// Run the ui closure and paint the result over `view`.
    pub fn draw(
        &mut self,
        ctx: &Context,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        run_ui: impl FnMut(&egui::Context),
    ) {
        if !self.visible {
            return;
        }
        let raw_input = self.state.take_egui_input(ctx.window.as_ref());
        let full_output = self.ctx.run(raw_input, run_ui);
        self.state
            .handle_platform_output(ctx.window.as_ref(), full_output.platform_output);

        let paint_jobs = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        // On the web the canvas may be smaller than the window when the
        // pixel ratio is capped.
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [ctx.config.width, ctx.config.height],
            pixels_per_point: ctx.viewport.surface_pixel_ratio() as f32 * self.ctx.zoom_factor(),
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer
                .update_texture(&ctx.device, &ctx.queue, *id, image_delta);
        }
        let user_buffers = self.renderer.update_buffers(
            &ctx.device,
            &ctx.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        if !user_buffers.is_empty() {
            ctx.queue.submit(user_buffers);
        }
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("GUI Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_ranges() {
        assert_eq!(MaterialParam::Metalness.range(), 0.0..=1.0);
        assert_eq!(MaterialParam::Roughness.range(), 0.0..=1.0);
        assert_eq!(MaterialParam::AoMapIntensity.range(), 0.0..=10.0);
        assert_eq!(MaterialParam::DisplacementScale.range(), 0.0..=10.0);
    }

    #[test]
    fn values_are_clamped_into_range() {
        let mut material = StandardMaterial::default();
        MaterialParam::Metalness.set(&mut material, 1.5);
        MaterialParam::Roughness.set(&mut material, -0.5);
        MaterialParam::AoMapIntensity.set(&mut material, 42.0);
        MaterialParam::DisplacementScale.set(&mut material, f32::NAN);
        assert_eq!(material.metalness, 1.0);
        assert_eq!(material.roughness, 0.0);
        assert_eq!(material.ao_map_intensity, 10.0);
        assert_eq!(material.displacement_scale, 0.0);
    }

    #[test]
    fn in_range_values_pass_through() {
        let mut material = StandardMaterial::default();
        for param in MaterialParam::ALL {
            param.set(&mut material, 0.7);
            assert_eq!(param.get(&material), 0.7);
        }
    }
}
