use anyhow::{Context, Result, anyhow};
use clap::Parser;
use egui::Context as EguiContext;
use skyship_assets::{AssetError, MeshData};
use skyship_common::SceneConfig;
use skyship_render::RenderView;
use skyship_render_wgpu::WgpuRenderer;
use skyship_sim::{HostEvent, SceneController, ShipStatus};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "skyship-desktop", about = "Steer a ship through space with WASD")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML scene config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ship model (.gltf or .glb); overrides the config
    #[arg(short, long)]
    model: Option<PathBuf>,
}

/// Events posted to the event loop from other threads.
enum AppEvent {
    ShipLoaded(Result<MeshData, AssetError>),
}

/// Scene state plus presentation-only extras.
struct AppState {
    controller: SceneController,
    camera: RenderView,
    show_hud: bool,
    last_frame: Instant,
    fps: f32,
}

impl AppState {
    fn new(config: SceneConfig) -> Self {
        let mut controller = SceneController::new(config);
        controller.attach();
        let camera = RenderView::from_config(&controller.config().camera, controller.viewport());
        Self {
            controller,
            camera,
            show_hud: true,
            last_frame: Instant::now(),
            fps: 0.0,
        }
    }

    fn tick_clock(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            // Exponential moving average.
            self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext) {
        if !self.show_hud {
            return;
        }

        let view = self.controller.scene_view();
        egui::Window::new("Skyship")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Frame: {}  FPS: {:.0}", view.frame, self.fps));
                ui.label(format!("Ship: {}", view.status.label()));
                if let Some(t) = view.ship {
                    ui.label(format!(
                        "Position: ({:.1}, {:.1}, {:.1})",
                        t.position.x, t.position.y, t.position.z
                    ));
                    ui.label(format!("Tilt: {:+.2}", t.tilt));
                }
                if view.status == ShipStatus::Unavailable {
                    if let Some(err) = self.controller.load_error() {
                        ui.colored_label(egui::Color32::LIGHT_RED, err);
                    }
                }
                let held: Vec<&str> = view.flags.held().map(|d| d.name()).collect();
                ui.label(format!("Held: {}", held.join(" ")));
                ui.label(format!("Particles: {}", view.particles.len()));
                ui.separator();
                ui.small("WASD: Steer | F1: Toggle HUD | Esc: Quit");
            });
    }
}

/// Window plus every GPU resource tied to it.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    init_error: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: SceneConfig) -> Self {
        Self {
            state: AppState::new(config),
            gpu: None,
            egui_ctx: EguiContext::default(),
            init_error: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<Gpu> {
        let window_config = &self.state.controller.config().window;
        let attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no compatible GPU adapter"))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skyship_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("failed to create device")?;

        let size = window.inner_size();
        self.state.controller.handle(HostEvent::Resized {
            width: size.width,
            height: size.height,
        });
        let viewport = self.state.controller.viewport();
        self.state.camera.set_viewport(viewport);

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: viewport.width(),
            height: viewport.height(),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let mut renderer = WgpuRenderer::new(
            &device,
            surface_format,
            viewport,
            self.state.controller.particles().len(),
        );
        // The model may have arrived before the window existed.
        if let Some(ship) = self.state.controller.ship().ship() {
            renderer.set_ship_mesh(&device, &ship.mesh);
        }

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Gpu {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;
        match key {
            KeyCode::Escape if pressed => event_loop.exit(),
            KeyCode::F1 if pressed && !event.repeat => {
                self.state.show_hud = !self.state.show_hud;
            }
            _ => {
                let host_event = if pressed {
                    HostEvent::KeyDown(key)
                } else {
                    HostEvent::KeyUp(key)
                };
                self.state.controller.handle(host_event);
            }
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if !self.state.controller.handle(HostEvent::Resized {
            width: new_size.width,
            height: new_size.height,
        }) {
            return;
        }
        let viewport = self.state.controller.viewport();
        self.state.camera.set_viewport(viewport);

        if let Some(gpu) = &mut self.gpu {
            gpu.config.width = viewport.width();
            gpu.config.height = viewport.height();
            gpu.surface.configure(&gpu.device, &gpu.config);
            gpu.renderer.resize(&gpu.device, viewport);
        }
    }

    fn redraw(&mut self) {
        self.state.tick_clock();
        self.state.controller.frame();

        let Self {
            state,
            gpu,
            egui_ctx,
            ..
        } = self;
        let Some(gpu) = gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        gpu.renderer.render(
            &gpu.device,
            &gpu.queue,
            &view,
            &state.controller.scene_view(),
            &state.camera,
        );
        state.controller.particles_presented();

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }

        output.present();
        gpu.window.request_redraw();
    }
}

impl ApplicationHandler<AppEvent> for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("graphics setup failed: {e:#}");
                self.init_error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: AppEvent) {
        match event {
            AppEvent::ShipLoaded(result) => {
                self.state.controller.on_ship_loaded(result);
                if let (Some(gpu), Some(ship)) = (&mut self.gpu, self.state.controller.ship().ship())
                {
                    if !gpu.renderer.has_ship_mesh() {
                        gpu.renderer.set_ship_mesh(&gpu.device, &ship.mesh);
                    }
                }
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => self.resize(new_size),
            WindowEvent::Focused(false) => {
                self.state.controller.handle(HostEvent::FocusLost);
            }
            WindowEvent::KeyboardInput {
                event: key_event, ..
            } => {
                if let PhysicalKey::Code(key) = key_event.physical_key {
                    self.handle_key(event_loop, key, &key_event);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.state.controller.detach();
        tracing::info!(
            "shutting down after {} frames",
            self.state.controller.frame_count()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("skyship-desktop starting");

    let mut config = SceneConfig::load_or_default(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.ship.model_path = model;
    }

    let event_loop = EventLoop::<AppEvent>::with_user_event().build()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let proxy = event_loop.create_proxy();
    skyship_assets::spawn_load(config.ship.model_path.clone(), move |result| {
        // The loop may already be gone if the window closed during the load.
        let _ = proxy.send_event(AppEvent::ShipLoaded(result));
    })
    .context("failed to start model loader")?;

    let mut app = GpuApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.init_error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
