use anyhow::{Context, Result};
use clap::Parser;
use paturage_kernel::{Pasture, PastureConfig, PastureEvent};
use paturage_render::{DrawList, RenderError};
use paturage_render_wgpu::WgpuRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "paturage-desktop", about = "Cows in a pasture")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Pasture config file (.yaml, .yml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding paturage.png, shadow.png and the breed textures
    #[arg(long)]
    textures: Option<PathBuf>,

    /// RNG seed for a reproducible herd
    #[arg(long)]
    seed: Option<u64>,
}

/// Simulation state, independent of the GPU.
struct AppState {
    pasture: Pasture,
    start: Instant,
}

impl AppState {
    fn new(config: PastureConfig, seed: Option<u64>) -> Self {
        let pasture = match seed {
            Some(seed) => Pasture::with_seed(config, seed),
            None => Pasture::new(config),
        };
        Self {
            pasture,
            start: Instant::now(),
        }
    }

    /// Advance one display frame and return what to draw.
    fn frame(&mut self, aspect: f32) -> DrawList {
        let now = self.start.elapsed().as_secs_f64();
        let view = self.pasture.frame(now, aspect);

        for event in self.pasture.drain_events() {
            match event {
                PastureEvent::HitBoundary { cow, new_heading } => {
                    tracing::debug!(cow, new_heading, "cow turned at the fence");
                }
                PastureEvent::Jumped { cow, launch_speed } => {
                    tracing::trace!(cow, launch_speed, "cow jumped");
                }
                PastureEvent::Landed { .. } | PastureEvent::Clicked { .. } => {}
            }
        }

        DrawList::build(&self.pasture, &view)
    }
}

/// Everything that only exists once a window and device are up.
struct Gpu {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
}

impl Gpu {
    fn new(window: Arc<Window>, textures: Option<&std::path::Path>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let size = window.inner_size();
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(RenderError::NoAdapter)?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("paturage_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Surface("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
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

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            surface_format,
            config.width,
            config.height,
            textures,
        )?;

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            renderer,
        })
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw(&mut self, frame: &DrawList) {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
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
        self.renderer
            .render(&self.device, &self.queue, &view, frame);
        output.present();
    }
}

struct GpuApp {
    state: AppState,
    textures: Option<PathBuf>,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState, textures: Option<PathBuf>) -> Self {
        Self {
            state,
            textures,
            window: None,
            gpu: None,
            fatal: None,
        }
    }

    /// Keep a setup failure for `main` to return and show it in the window
    /// title. Returns false when there is no window to show it in.
    fn record_failure(&mut self, error: anyhow::Error) -> bool {
        tracing::error!("{error:#}");
        let shown = match &self.window {
            Some(window) => {
                window.set_title(&failure_title(&error));
                true
            }
            None => false,
        };
        self.fatal = Some(error);
        shown
    }

    /// Report a setup failure. The window stays open, idle, until the user
    /// closes it; nothing is retried.
    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        if self.record_failure(error) {
            event_loop.set_control_flow(ControlFlow::Wait);
        } else {
            event_loop.exit();
        }
    }
}

fn failure_title(error: &anyhow::Error) -> String {
    format!("Paturage: {error}")
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Paturage")
            .with_transparent(true)
            .with_inner_size(PhysicalSize::new(800u32, 600));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("failed to create window"));
                return;
            }
        };
        self.window = Some(window.clone());

        match Gpu::new(window, self.textures.as_deref()) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("graphics unavailable")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: ElementState::Pressed,
                ..
            } => {
                self.state.pasture.click();
            }
            WindowEvent::RedrawRequested => {
                let Some(gpu) = &mut self.gpu else {
                    return;
                };

                let frame = self.state.frame(gpu.aspect());
                gpu.draw(&frame);

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.gpu.is_none() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => PastureConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PastureConfig::default(),
    };

    tracing::info!(cows = config.herd_size(), "paturage-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(config, cli.seed), cli.textures);
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> GpuApp {
        let state = AppState::new(PastureConfig::default(), Some(1));
        GpuApp::new(state, None)
    }

    #[test]
    fn failure_without_window_is_kept_for_main() {
        let mut app = app();
        let shown = app.record_failure(anyhow::Error::new(RenderError::NoAdapter));
        assert!(!shown);
        let fatal = app.fatal.as_ref().map(|e| e.to_string());
        assert_eq!(fatal.as_deref(), Some("no compatible graphics adapter found"));
    }

    #[test]
    fn failure_title_carries_context() {
        let error = anyhow::Error::new(RenderError::Shader("bad entry point".into()))
            .context("graphics unavailable");
        assert_eq!(failure_title(&error), "Paturage: graphics unavailable");
        assert!(format!("{error:#}").contains("shader error: bad entry point"));
    }

    #[test]
    fn state_frames_build_draw_lists() {
        let mut state = AppState::new(PastureConfig::default(), Some(2));
        let list = state.frame(1.5);
        assert_eq!(list.len(), 1 + 2 * 17);
        assert!(state.pasture.events().is_empty());
    }
}
