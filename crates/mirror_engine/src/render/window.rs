//! GLFW window with an OpenGL 3.3 core context
//!
//! Owns the GLFW instance, the window and its event receiver. The GL function
//! loader for `glow` is taken from the window's current context.

use glfw::Context as _;
use thiserror::Error;

use crate::core::config::{RendererConfig, WindowConfig};
use crate::render::{GlDevice, RenderResult};

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its GL context could not be created
    #[error("Window creation failed")]
    CreationFailed,

    /// No monitor was available for fullscreen mode
    #[error("No primary monitor available for fullscreen")]
    NoMonitor,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window with a current GL context
pub struct GlWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    cursor_captured: bool,
}

impl GlWindow {
    /// Create the window, make its context current and configure event polling
    ///
    /// The multisample hint requests the same sample count the renderer will
    /// use for its offscreen target.
    pub fn new(config: &WindowConfig, renderer: &RendererConfig) -> WindowResult<Self> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|error| WindowError::InitializationFailed(format!("{error:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Samples(Some(renderer.msaa_samples)));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = if config.fullscreen {
            glfw.with_primary_monitor(|glfw, monitor| {
                let monitor = monitor?;
                glfw.create_window(config.width, config.height, &config.title, glfw::WindowMode::FullScreen(monitor))
            })
            .ok_or(WindowError::NoMonitor)?
        } else {
            glfw.create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
                .ok_or(WindowError::CreationFailed)?
        };

        window.make_current();
        glfw.set_swap_interval(if config.vsync {
            glfw::SwapInterval::Sync(1)
        } else {
            glfw::SwapInterval::None
        });

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_cursor_pos_polling(true);
        window.set_framebuffer_size_polling(true);

        let mut gl_window = Self { glfw, window, events, cursor_captured: false };
        gl_window.set_cursor_captured(config.capture_cursor);

        log::info!("Created {}x{} window '{}'", config.width, config.height, config.title);
        Ok(gl_window)
    }

    /// Load GL entry points from the current context into a device
    ///
    /// # Safety
    ///
    /// The window's context must be current on the calling thread and stay
    /// alive for as long as the returned device is used.
    pub unsafe fn create_device(&mut self) -> RenderResult<GlDevice> {
        let window = &mut self.window;
        GlDevice::from_loader(|name| window.get_proc_address(name) as *const _)
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request (or cancel) closing
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Process pending window events
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain the events received since the last poll
    pub fn flush_events(&self) -> Vec<glfw::WindowEvent> {
        glfw::flush_messages(&self.events).map(|(_, event)| event).collect()
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    /// Current framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Whether a key is currently held
    pub fn key_down(&self, key: glfw::Key) -> bool {
        self.window.get_key(key) == glfw::Action::Press
    }

    /// Seconds since GLFW was initialised
    pub fn time(&self) -> f64 {
        self.glfw.get_time()
    }

    /// Whether the cursor is hidden and locked for mouse look
    pub fn cursor_captured(&self) -> bool {
        self.cursor_captured
    }

    /// Hide and lock the cursor, or release it
    pub fn set_cursor_captured(&mut self, captured: bool) {
        self.window.set_cursor_mode(if captured {
            glfw::CursorMode::Disabled
        } else {
            glfw::CursorMode::Normal
        });
        self.cursor_captured = captured;
    }
}
