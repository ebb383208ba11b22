//! Mirror engine showcase
//!
//! Opens a window, loads the standard shaders and the showcase scene, and
//! renders until the window closes. Settings come from `mirror.toml` when
//! present.

mod input;
mod showcase;

use mirror_engine::assets::{AssetError, ShaderSource};
use mirror_engine::config::{Config, ConfigError};
use mirror_engine::core::config::ApplicationConfig;
use mirror_engine::foundation::logging;
use mirror_engine::render::window::{GlWindow, WindowError};
use mirror_engine::render::{PostShaders, RenderContext, RenderError, Renderer, ShaderProgram, ShaderRegistry};
use thiserror::Error;

use crate::input::InputController;

const CONFIG_PATH: &str = "mirror.toml";

/// Fatal application errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Window or GL context creation failed
    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    /// GPU resource creation failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A required asset could not be loaded
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Logs the frame rate once per second
struct FrameCounter {
    window_start: f64,
    frames: u32,
}

impl FrameCounter {
    fn new(now: f64) -> Self {
        Self { window_start: now, frames: 0 }
    }

    fn tick(&mut self, now: f64) {
        self.frames += 1;
        let elapsed = now - self.window_start;
        if elapsed >= 1.0 {
            log::info!("{:.1} FPS", f64::from(self.frames) / elapsed);
            self.window_start = now;
            self.frames = 0;
        }
    }
}

fn run(config: &ApplicationConfig) -> Result<(), AppError> {
    config.validate()?;

    let mut window = GlWindow::new(&config.window, &config.renderer)?;
    // SAFETY: GlWindow::new made the context current on this thread and the
    // window outlives the device, which is declared after it.
    let mut device = unsafe { window.create_device()? };

    let shader_dir = &config.assets.shader_dir;
    let shaders = ShaderRegistry::load(&mut device, shader_dir, &ShaderRegistry::STANDARD_SHADERS)?;
    let post = PostShaders {
        screen: ShaderProgram::load(&mut device, &ShaderSource::load(shader_dir, "screen")?)?,
        depth: ShaderProgram::load(&mut device, &ShaderSource::load(shader_dir, "depth")?)?,
    };

    let (width, height) = window.framebuffer_size();
    let mut context = RenderContext::from_config(&config.renderer, width, height);
    let mut scene = showcase::build(&mut device, &shaders, &config.assets, context.aspect_ratio())?;
    let mut renderer = Renderer::new(&mut device, shaders, post, &config.renderer, width, height)?;
    renderer.validate_scene(&scene)?;

    let mut input = InputController::new();
    let mut last_frame = window.time();
    let mut counter = FrameCounter::new(last_frame);

    log::info!("Entering frame loop");
    while !window.should_close() {
        window.poll_events();
        for event in window.flush_events() {
            input.handle_event(&event, &mut window, &mut scene, &mut context);
        }

        let now = window.time();
        input.update(&window, &mut scene, (now - last_frame) as f32);
        last_frame = now;

        showcase::follow_mirror_subject(&mut scene);
        renderer.render(&mut device, &mut scene, &mut context)?;
        window.swap_buffers();
        counter.tick(now);
    }

    scene.destroy(&mut device);
    renderer.destroy(&mut device);
    log::info!("Shut down cleanly");
    Ok(())
}

fn main() {
    let config = match ApplicationConfig::load_or_default(CONFIG_PATH) {
        Ok(config) => config,
        Err(error) => {
            logging::init("info");
            log::error!("Failed to load {CONFIG_PATH}: {error}");
            std::process::exit(1);
        }
    };
    logging::init(&config.engine.log_level);
    log::info!("Starting Mirror Engine showcase");

    if let Err(error) = run(&config) {
        log::error!("{error}");
        std::process::exit(1);
    }
}
