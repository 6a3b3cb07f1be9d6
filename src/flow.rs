//! Flow control and application event loop.
//!
//! A "flow" is the scene the application shows: it reacts to input, updates
//! itself from the elapsed time, draws its debug panel and hands its meshes
//! to the renderer every frame.
//!
//! # Lifecycle
//!
//! Each frame:
//! 1. Window events go to the debug panel first, then to the orbit controls
//!    and the flow unless the panel consumed them
//! 2. `on_update` with the time since start-up
//! 3. Orbit controls update and the camera uniform is uploaded
//! 4. The flow's [`Render`] is batched and drawn, opaque before transparent
//! 5. The debug panel is drawn on top through `on_gui`
//! 6. Present and request the next frame

use std::{fmt::Debug, iter, sync::Arc};

use futures::future::LocalBoxFuture;
use instant::Duration;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    clock::Clock,
    config::SceneConfig,
    context::Context,
    data_structures::model::DrawModel,
    gui::DebugGui,
    render::{Drawable, Render},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Trait for implementing a renderable scene.
///
/// 1. `on_init()` is called once after construction; the only place that may
///    modify the [`Context`] (lights, clear colour, camera controls)
/// 2. `on_window_events()` is called for each window event the debug panel
///    did not consume
/// 3. `on_update()` is called every frame with the time since start-up
/// 4. `on_gui()` is called every frame the debug panel is visible
/// 5. `on_render()` is called every frame and specifies how to render `self`
pub trait GraphicsFlow {
    fn on_init(&mut self, ctx: &mut Context);

    /// `elapsed` is the time since the application started, not since the
    /// previous frame.
    fn on_update(&mut self, ctx: &Context, elapsed: Duration);

    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent);

    fn on_gui(&mut self, ctx: &Context, gui: &egui::Context);

    fn on_render(&self) -> Render<'_>;
}

impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// Asynchronously builds the flow once the GPU context exists.
pub type FlowConstructor = Box<
    dyn for<'a> FnOnce(
        &'a Context,
        &'a SceneConfig,
    ) -> LocalBoxFuture<'a, anyhow::Result<Box<dyn GraphicsFlow>>>,
>;

/// Everything that only exists after initialisation.
#[derive(Debug)]
pub(crate) struct AppState {
    pub(crate) ctx: Context,
    flow: Box<dyn GraphicsFlow>,
    gui: DebugGui,
    clock: Clock,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(
        window: Arc<Window>,
        config: SceneConfig,
        constructor: FlowConstructor,
    ) -> anyhow::Result<Self> {
        let mut ctx = Context::new(window, &config).await?;
        let mut flow = constructor(&ctx, &config).await?;
        flow.on_init(&mut ctx);
        let gui = DebugGui::new(&ctx, config.show_gui);
        Ok(Self {
            ctx,
            flow,
            gui,
            clock: Clock::new(),
            is_surface_configured: false,
        })
    }

    fn resize(&mut self) {
        let size = self.ctx.window.inner_size();
        let scale_factor = self.ctx.window.scale_factor();
        self.is_surface_configured = self.ctx.resize(size, scale_factor);
    }

    fn update(&mut self) {
        let elapsed = self.clock.elapsed();
        self.flow.on_update(&self.ctx, elapsed);
        let ctx = &mut self.ctx;
        ctx.camera.controls.update(&mut ctx.camera.camera);
        ctx.camera.write_to_buffer(&ctx.queue, &ctx.projection);
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let output = self.ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.ctx.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let mut opaque = Vec::new();
            let mut transparent = Vec::new();
            self.flow
                .on_render()
                .set_pipelines(&mut opaque, &mut transparent);

            let ctx = &self.ctx;
            draw_batch(&mut render_pass, ctx, &ctx.pipelines.opaque, &opaque);
            draw_batch(&mut render_pass, ctx, &ctx.pipelines.transparent, &transparent);
        }

        let Self { ctx, flow, gui, .. } = self;
        gui.draw(ctx, &mut encoder, &view, |egui_ctx| flow.on_gui(ctx, egui_ctx));

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

fn draw_batch(
    render_pass: &mut wgpu::RenderPass<'_>,
    ctx: &Context,
    pipeline: &wgpu::RenderPipeline,
    batch: &[Drawable<'_>],
) {
    if batch.is_empty() {
        return;
    }
    render_pass.set_pipeline(pipeline);
    for drawable in batch {
        render_pass.set_vertex_buffer(1, drawable.instances.slice(..));
        render_pass.draw_mesh_instanced(
            drawable.mesh,
            &drawable.material.bind_group,
            0..drawable.amount,
            &ctx.camera.bind_group,
            &ctx.light.bind_group,
        );
    }
}

// Only sent by the wasm initialisation.
#[allow(dead_code)]
pub(crate) enum FlowEvent {
    Initialized(Box<AppState>),
    Failed(anyhow::Error),
}

pub(crate) struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    config: SceneConfig,
    // Taken on the first `resumed`.
    constructor: Option<FlowConstructor>,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(
        event_loop: &EventLoop<FlowEvent>,
        config: SceneConfig,
        constructor: FlowConstructor,
    ) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            constructor: Some(constructor),
            state: None,
            error: None,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Initialisation failed: {error:#}");
        self.error = Some(error);
        event_loop.exit();
    }

    fn window_attributes(&self) -> anyhow::Result<winit::window::WindowAttributes> {
        #[allow(unused_mut)]
        let mut attributes = Window::default_attributes().with_title(self.config.title.clone());
        if let Some((width, height)) = self.config.window_size {
            attributes = attributes.with_inner_size(winit::dpi::LogicalSize::new(width, height));
        }

        #[cfg(target_arch = "wasm32")]
        {
            use anyhow::anyhow;
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_SELECTOR: &str = "canvas.webgl";

            let window = web_sys::window().ok_or_else(|| anyhow!("No browser window"))?;
            let document = window.document().ok_or_else(|| anyhow!("No document"))?;
            let canvas = document
                .query_selector(CANVAS_SELECTOR)
                .map_err(|_| anyhow!("Invalid canvas selector"))?
                .ok_or_else(|| anyhow!("No element matches {CANVAS_SELECTOR}"))?;
            let html_canvas_element: web_sys::HtmlCanvasElement = canvas.unchecked_into();
            attributes = attributes.with_canvas(Some(html_canvas_element));
        }
        Ok(attributes)
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructor) = self.constructor.take() else {
            return;
        };
        let window = match self
            .window_attributes()
            .and_then(|attributes| Ok(event_loop.create_window(attributes)?))
        {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e),
        };

        let init_future = AppState::new(window, self.config.clone(), constructor);

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok(mut state) => {
                    state.resize();
                    state.ctx.window.request_redraw();
                    self.state = Some(state);
                }
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok(state) => FlowEvent::Initialized(Box::new(state)),
                    Err(e) => FlowEvent::Failed(e),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before initialisation finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized(state) => {
                // This is the message from our wasm `spawn_local`
                let mut state = *state;
                state.resize();
                state.ctx.window.request_redraw();
                self.state = Some(state);
            }
            FlowEvent::Failed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        let consumed = state.gui.handle_window_event(&state.ctx.window, &event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.resize(),
            WindowEvent::RedrawRequested => {
                state.update();
                match state.render() {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        state.resize();
                    }
                    Err(e) => log::error!("Unable to render {e}"),
                }
            }
            _ if consumed => {}
            _ => {
                let ctx = &mut state.ctx;
                let fovy = ctx.projection.fovy;
                ctx.camera
                    .controls
                    .handle_window_events(&ctx.camera.camera, fovy, &event);
                state.flow.on_window_events(&state.ctx, &event);
            }
        }
    }
}

/// Initialise logging for the platform. `filter` is an `env_logger` filter
/// used when `RUST_LOG` is not set.
pub fn init_logger(filter: &str) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or(filter);
        if let Err(e) = env_logger::Builder::from_env(env).try_init() {
            eprintln!("Warning: Could not initialize logger: {e}");
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        let level = match filter {
            "debug" => log::Level::Debug,
            "trace" => log::Level::Trace,
            "warn" => log::Level::Warn,
            "error" => log::Level::Error,
            _ => log::Level::Info,
        };
        if console_log::init_with_level(level).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
    }
}

/// Open the window and run `constructor`'s flow until the window closes.
pub fn run(config: SceneConfig, constructor: FlowConstructor) -> anyhow::Result<()> {
    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config, constructor)?;

    #[cfg(not(target_arch = "wasm32"))]
    {
        event_loop.run_app(&mut app)?;
        if let Some(e) = app.error.take() {
            return Err(e);
        }
    }

    #[cfg(target_arch = "wasm32")]
    {
        use winit::platform::web::EventLoopExtWebSys;
        event_loop.spawn_app(app);
    }

    Ok(())
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn run_web() -> Result<(), JsValue> {
    init_logger("info");
    // Asset paths resolve against the page origin.
    let config = SceneConfig {
        assets_dir: std::path::PathBuf::new(),
        ..Default::default()
    };
    crate::scene::run(config).map_err(|e| JsValue::from_str(&format!("{e:#}")))
}
