use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::UVec2;
use skymirror_assets::SceneAssets;
use skymirror_common::DemoConfig;
use skymirror_render::{FrameDriver, MirrorPass, RenderError};
use skymirror_render_wgpu::{WgpuRenderer, setup};
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
#[command(name = "skymirror-desktop", about = "Planar reflection demo")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// YAML config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset directory, overriding `assets.root` from the config
    #[arg(long)]
    assets: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<DemoConfig> {
    let mut config = match &cli.config {
        Some(path) => DemoConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DemoConfig::default(),
    };
    if let Some(root) = &cli.assets {
        config.assets.root = root.clone();
    }
    Ok(config)
}

/// Overlay toggles and frame timing.
struct Overlay {
    visible: bool,
    fps: f32,
}

impl Overlay {
    fn record_frame(&mut self, dt: f32) {
        if dt > 0.0 {
            // Exponential smoothing keeps the readout legible.
            self.fps = self.fps * 0.9 + (1.0 / dt) * 0.1;
        }
    }
}

fn draw_overlay(ctx: &EguiContext, overlay: &Overlay, driver: &mut FrameDriver) {
    if !overlay.visible {
        return;
    }

    egui::Window::new("Skymirror")
        .default_width(260.0)
        .show(ctx, |ui| {
            let state = driver.state().clone();
            let context = driver.context();
            let reflected = MirrorPass::reflected_camera(context);
            let screen = context.screen_size();
            let reflection = context.reflection_size();

            ui.label(format!("Time: {:.2}s  FPS: {:.0}", state.time, overlay.fps));
            ui.label(format!(
                "Camera: ({:.1}, {:.1}, {:.1})",
                state.camera_position.x, state.camera_position.y, state.camera_position.z
            ));
            ui.label(format!(
                "Mirrored: ({:.1}, {:.1}, {:.1})",
                reflected.position.x, reflected.position.y, reflected.position.z
            ));
            ui.label(format!(
                "Screen {}x{}  Reflection {}x{}",
                screen.x, screen.y, reflection.x, reflection.y
            ));
            ui.separator();

            ui.heading("Lights");
            for (i, light) in state.lights.iter().enumerate() {
                ui.label(format!(
                    "{i}: ({:.2}, {:.2}, {:.2})",
                    light.position.x, light.position.y, light.position.z
                ));
            }
            ui.separator();

            let clock = driver.clock_mut();
            ui.checkbox(&mut clock.paused, "Paused (Space)");
            ui.add(egui::Slider::new(&mut clock.time_scale, 0.0..=4.0).text("Time scale"));

            ui.separator();
            ui.small("F1: Toggle overlay | Esc: Quit");
        });
}

/// Everything created once a window exists.
struct GpuState {
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
    config: DemoConfig,
    assets: SceneAssets,
    gpu: Option<GpuState>,
    driver: Option<FrameDriver>,
    egui_ctx: EguiContext,
    overlay: Overlay,
    last_frame: Instant,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(config: DemoConfig, assets: SceneAssets) -> Self {
        Self {
            config,
            assets,
            gpu: None,
            driver: None,
            egui_ctx: EguiContext::default(),
            overlay: Overlay {
                visible: true,
                fps: 0.0,
            },
            last_frame: Instant::now(),
            fatal: None,
        }
    }

    fn init_gpu(&self, event_loop: &ActiveEventLoop) -> Result<(GpuState, FrameDriver)> {
        let attrs = Window::default_attributes()
            .with_title("Skymirror")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(setup::surface_error)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::AdapterUnavailable)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("skymirror_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(setup::device_error)?;
        device.on_uncaptured_error(Box::new(|err| {
            tracing::error!("wgpu validation error: {err}");
        }));

        let size = window.inner_size();
        let screen_size = UVec2::new(size.width.max(1), size.height.max(1));
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = setup::pick_surface_format(&surface_caps.formats)
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: screen_size.x,
            height: screen_size.y,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let driver = FrameDriver::new(&self.config, screen_size);
        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            screen_size,
            driver.context().reflection_size(),
            &self.assets,
        );

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
            "GPU initialized with {} backend, surface {:?}",
            adapter.get_info().backend.to_str(),
            surface_format
        );

        Ok((
            GpuState {
                window,
                surface,
                device,
                queue,
                config,
                renderer,
                egui_winit,
                egui_renderer,
            },
            driver,
        ))
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Space => {
                if let Some(driver) = &mut self.driver {
                    driver.clock_mut().toggle_pause();
                    tracing::info!("paused: {}", driver.clock().paused);
                }
            }
            KeyCode::F1 => {
                self.overlay.visible = !self.overlay.visible;
            }
            KeyCode::Escape => {
                event_loop.exit();
            }
            _ => {}
        }
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.1);
        self.last_frame = now;
        self.overlay.record_frame(dt);

        let (Some(gpu), Some(driver)) = (&mut self.gpu, &mut self.driver) else {
            return;
        };
        driver.advance(dt);

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

        let mut frame = gpu.renderer.begin_frame(&gpu.device, &gpu.queue, &view);
        if let Err(e) = driver.render(&mut frame).and_then(|()| frame.finish()) {
            tracing::error!("frame failed: {e}");
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let overlay = &self.overlay;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            draw_overlay(ctx, overlay, driver);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
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

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match self.init_gpu(event_loop) {
            Ok((gpu, driver)) => {
                self.gpu = Some(gpu);
                self.driver = Some(driver);
                self.last_frame = Instant::now();
            }
            Err(e) => {
                tracing::error!("GPU initialization failed: {e:#}");
                self.fatal = Some(e);
                event_loop.exit();
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
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    let size = UVec2::new(new_size.width.max(1), new_size.height.max(1));
                    gpu.config.width = size.x;
                    gpu.config.height = size.y;
                    gpu.surface.configure(&gpu.device, &gpu.config);
                    gpu.renderer.resize(&gpu.device, size);
                    if let Some(driver) = &mut self.driver {
                        driver.set_screen_size(size);
                    }
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, key);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("skymirror-desktop starting");

    let config = load_config(&cli)?;
    let assets = SceneAssets::load(&config).context("loading scene assets")?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(config, assets);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
