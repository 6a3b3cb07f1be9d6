//! GPU and window context.
//!
//! [`Context`] owns everything a frame needs besides the flow itself: the
//! surface and device, the depth buffer, the camera with its controls, the
//! lights, the viewport and the standard-material pipelines.

use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use wgpu::util::DeviceExt;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::{self, CameraResources, CameraUniform, OrbitControls, Projection},
    config::SceneConfig,
    data_structures::texture,
    material,
    pipelines::{
        light::{AmbientLight, LightResources, PointLight},
        standard::{StandardPipelines, mk_standard_pipelines},
    },
    viewport::Viewport,
};

#[derive(Debug)]
pub struct Context {
    pub window: Arc<Window>,
    pub(crate) depth_texture: texture::Texture,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub camera: CameraResources,
    pub projection: Projection,
    pub light: LightResources,
    pub viewport: Viewport,
    pub clear_colour: wgpu::Color,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
    pub pipelines: StandardPipelines,
}

impl Context {
    pub async fn new(window: Arc<Window>, settings: &SceneConfig) -> anyhow::Result<Self> {
        let viewport = Viewport::from_physical(
            window.inner_size(),
            window.scale_factor(),
            settings.max_pixel_ratio,
        );
        let (width, height) = viewport.surface_size(window.inner_size());

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("Could not create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No graphics adapter can present to this window"))?;
        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    // WebGL doesn't support all of wgpu's features, so if
                    // we're building for the web we'll have to disable some.
                    required_limits: if cfg!(target_arch = "wasm32") {
                        wgpu::Limits::downlevel_webgl2_defaults()
                    } else {
                        wgpu::Limits::default()
                    },
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("Could not open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // The shader writes linear colour and relies on an sRGB surface for
        // the encoding.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("The surface reports no texture formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let camera = camera::Camera::new((1.0, 1.0, 2.0), (0.0, 0.0, 0.0));
        let projection = Projection::new(viewport.aspect(), cgmath::Deg(75.0), 0.1, 100.0);
        let mut controls = OrbitControls::new();
        controls.set_viewport_height(window.inner_size().height as f32);

        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update_view_proj(&camera, &projection);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[camera_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_bind_group_layout =
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
                label: Some("camera_bind_group_layout"),
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        let depth_texture =
            texture::Texture::create_depth_texture(&device, [width, height], "depth_texture");

        let light = LightResources::new(&device, AmbientLight::default(), PointLight::default());
        let material_bind_group_layout = material::bind_group_layout(&device);
        let pipelines = mk_standard_pipelines(
            &device,
            config.format,
            &material_bind_group_layout,
            &camera_bind_group_layout,
            &light.bind_group_layout,
        );

        let camera = CameraResources {
            camera,
            controls,
            uniform: camera_uniform,
            buffer: camera_buffer,
            bind_group: camera_bind_group,
            bind_group_layout: camera_bind_group_layout,
        };

        Ok(Self {
            window,
            depth_texture,
            surface,
            device,
            queue,
            config,
            camera,
            projection,
            light,
            viewport,
            clear_colour: settings.clear_colour,
            material_bind_group_layout,
            pipelines,
        })
    }

    /// Follow a window resize: new aspect, new drawing buffer, pixel ratio
    /// capped again. Returns `false` while the window has no area.
    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        if size.width == 0 || size.height == 0 {
            return false;
        }
        let logical = size.to_logical::<f64>(scale_factor);
        self.viewport
            .resize(logical.width, logical.height, scale_factor);
        self.projection.resize(self.viewport.aspect());
        self.camera.controls.set_viewport_height(size.height as f32);

        let (width, height) = self.viewport.surface_size(size);
        self.config.width = width;
        self.config.height = height;
        self.configure_surface();
        log::debug!(
            "Resized to {}x{} logical, surface {width}x{height}",
            logical.width,
            logical.height
        );
        true
    }

    pub(crate) fn configure_surface(&mut self) {
        self.surface.configure(&self.device, &self.config);
        self.depth_texture = texture::Texture::create_depth_texture(
            &self.device,
            [self.config.width, self.config.height],
            "depth_texture",
        );
    }
}
