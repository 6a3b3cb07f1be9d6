//! Viewport bookkeeping for resize events.
//!
//! The window reports logical sizes and a device pixel ratio. The camera only
//! cares about the aspect ratio. The drawing-buffer size is the logical size
//! times the (capped) pixel ratio and sizes the web canvas, native surfaces
//! always follow the window's physical size.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    width: f64,
    height: f64,
    pixel_ratio: f64,
    device_pixel_ratio: f64,
    max_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64, max_pixel_ratio: f64) -> Self {
        let mut viewport = Self {
            width: 1.0,
            height: 1.0,
            pixel_ratio: 1.0,
            device_pixel_ratio: 1.0,
            max_pixel_ratio,
        };
        viewport.resize(width, height, device_pixel_ratio);
        viewport
    }

    /// Build the viewport from what winit reports: a physical size and the
    /// window's scale factor.
    pub fn from_physical(
        size: winit::dpi::PhysicalSize<u32>,
        scale_factor: f64,
        max_pixel_ratio: f64,
    ) -> Self {
        let logical = size.to_logical::<f64>(scale_factor);
        Self::new(logical.width, logical.height, scale_factor, max_pixel_ratio)
    }

    /// Update size and pixel ratio. Zero-sized windows (minimised) keep a
    /// 1x1 logical size so the aspect stays finite.
    pub fn resize(&mut self, width: f64, height: f64, device_pixel_ratio: f64) {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.device_pixel_ratio = device_pixel_ratio.max(f64::MIN_POSITIVE);
        self.pixel_ratio = device_pixel_ratio.min(self.max_pixel_ratio).max(f64::MIN_POSITIVE);
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        (self.width / self.height) as f32
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Size of the surface in physical pixels.
    pub fn drawing_buffer_size(&self) -> (u32, u32) {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        (w, h)
    }

    /// Size the presentable surface is configured at. Native surfaces must
    /// match the window's physical size, only the web canvas backing store
    /// takes the capped drawing-buffer size.
    pub fn surface_size(&self, physical: winit::dpi::PhysicalSize<u32>) -> (u32, u32) {
        if cfg!(target_arch = "wasm32") {
            self.drawing_buffer_size()
        } else {
            (physical.width.max(1), physical.height.max(1))
        }
    }

    /// Surface pixels per logical pixel.
    pub fn surface_pixel_ratio(&self) -> f64 {
        if cfg!(target_arch = "wasm32") {
            self.pixel_ratio
        } else {
            self.device_pixel_ratio
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped_at_two() {
        let viewport = Viewport::new(800.0, 600.0, 3.0, 2.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (1600, 1200));
    }

    #[test]
    fn low_density_displays_keep_their_ratio() {
        let viewport = Viewport::new(800.0, 600.0, 1.25, 2.0);
        assert_eq!(viewport.pixel_ratio(), 1.25);
        assert_eq!(viewport.drawing_buffer_size(), (1000, 750));
    }

    #[test]
    fn minimised_window_never_yields_zero_sizes() {
        let viewport = Viewport::new(0.0, 0.0, 1.0, 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (1, 1));
        assert!(viewport.aspect().is_finite());
    }

    #[test]
    fn physical_sizes_are_converted_to_logical() {
        let viewport =
            Viewport::from_physical(winit::dpi::PhysicalSize::new(2560, 1440), 2.0, 2.0);
        assert_eq!(viewport.size(), (1280.0, 720.0));
        assert_eq!(viewport.drawing_buffer_size(), (2560, 1440));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_surface_keeps_the_window_size_when_the_ratio_is_capped() {
        let physical = winit::dpi::PhysicalSize::new(3840, 2160);
        let viewport = Viewport::from_physical(physical, 3.0, 2.0);
        assert_eq!(viewport.pixel_ratio(), 2.0);
        assert_eq!(viewport.drawing_buffer_size(), (2560, 1440));
        assert_eq!(viewport.surface_size(physical), (3840, 2160));
        assert_eq!(viewport.surface_pixel_ratio(), 3.0);
        assert!((viewport.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn native_surface_is_never_zero_sized() {
        let physical = winit::dpi::PhysicalSize::new(0, 0);
        let viewport = Viewport::from_physical(physical, 1.0, 2.0);
        assert_eq!(viewport.surface_size(physical), (1, 1));
    }
}
