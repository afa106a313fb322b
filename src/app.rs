use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::error::InitError;
use crate::frame::{FrameOutcome, RenderContext, draw_frame};
use crate::gpu::GpuContext;
use crate::spiral::SpiralParams;
use crate::texture::Texture;
use crate::tick::TickScheduler;

/// Image drawn when no file is configured.
const EMBLEM_PNG: &[u8] = include_bytes!("../assets/emblem60.png");

/// Where the quad's texture comes from.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ImageSource {
    /// The 60x60 emblem compiled into the binary.
    #[default]
    Embedded,
    /// An image file decoded at startup.
    File(PathBuf),
}

/// Configuration for the app window and animation.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Frames scheduled per second.
    pub tick_rate: f64,
    pub image: ImageSource,
    pub spiral: SpiralParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Gyre".to_string(),
            width: 800,
            height: 600,
            tick_rate: 60.0,
            image: ImageSource::Embedded,
            spiral: SpiralParams::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn tick_rate(mut self, hz: f64) -> Self {
        self.tick_rate = hz;
        self
    }

    pub fn image_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.image = ImageSource::File(path.into());
        self
    }

    pub fn spiral(mut self, params: SpiralParams) -> Self {
        self.spiral = params;
        self
    }
}

/// Run the spiral with the default configuration.
pub fn run() -> anyhow::Result<()> {
    run_with_config(AppConfig::default())
}

/// Run the spiral until the window is closed.
///
/// Startup failures (window, GPU, pipeline, image) are returned as errors.
pub fn run_with_config(config: AppConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().map_err(InitError::from)?;

    let mut app = GyreApp::new(config);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with error")?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    render: RenderContext,
    scheduler: TickScheduler,
    start_time: Instant,
}

impl Running {
    fn start(config: &AppConfig, event_loop: &ActiveEventLoop) -> Result<Self, InitError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let texture = match &config.image {
            ImageSource::Embedded => Texture::from_bytes(&gpu, EMBLEM_PNG, "emblem60.png")?,
            ImageSource::File(path) => Texture::from_file(&gpu, path)?,
        };
        let render = RenderContext::new(&gpu, texture, config.spiral.max_instances)?;

        let now = Instant::now();
        Ok(Self {
            window,
            gpu,
            render,
            scheduler: TickScheduler::new(config.tick_rate, now),
            start_time: now,
        })
    }
}

struct GyreApp {
    config: AppConfig,
    running: Option<Running>,
    failure: Option<anyhow::Error>,
}

impl GyreApp {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            running: None,
            failure: None,
        }
    }

    /// Stop the loop; `run_with_config` hands `err` back to the caller.
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.failure = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for GyreApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() || self.failure.is_some() {
            return;
        }

        match Running::start(&self.config, event_loop) {
            Ok(running) => {
                log::info!(
                    "spiral running at {} Hz, up to {} instances",
                    self.config.tick_rate,
                    self.config.spiral.max_instances
                );
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                let err = anyhow::Error::new(err).context("startup failed");
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                log::debug!("resized to {}x{}", size.width, size.height);
                running.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                let elapsed = running.start_time.elapsed().as_secs_f32();
                let viewport = running.window.inner_size();

                let outcome = draw_frame(
                    &mut running.gpu,
                    &mut running.render,
                    &self.config.spiral,
                    elapsed,
                    viewport,
                );

                if outcome == FrameOutcome::Fatal {
                    self.fail(event_loop, anyhow::anyhow!("surface lost beyond recovery"));
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &mut self.running else {
            return;
        };

        if running.scheduler.poll(Instant::now()) {
            running.window.request_redraw();
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(running.scheduler.next_tick()));
    }
}
