//! Keyboard and mouse handling
//!
//! Discrete key presses map to [`Command`]s applied to the render context;
//! held movement keys and mouse motion drive the primary camera.

use glfw::{Action, Key, WindowEvent};
use mirror_engine::render::window::GlWindow;
use mirror_engine::render::{DebugVolumes, RenderContext, RenderMode};
use mirror_engine::scene::Scene;

/// Debug volume toggled by each function key, F1 through F8
pub const VOLUME_KEYS: [(Key, DebugVolumes); 8] = [
    (Key::F1, DebugVolumes::OBJECT_BOX),
    (Key::F2, DebugVolumes::EXTERNAL_AABB),
    (Key::F3, DebugVolumes::INTERNAL_AABB),
    (Key::F4, DebugVolumes::MIDPOINT_AABB),
    (Key::F5, DebugVolumes::TIGHT_AABB),
    (Key::F6, DebugVolumes::INTERNAL_SPHERE),
    (Key::F7, DebugVolumes::EXTERNAL_SPHERE),
    (Key::F8, DebugVolumes::TIGHT_SPHERE),
];

/// Discrete action bound to a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Close the window
    Quit,
    /// Switch render mode
    SetMode(RenderMode),
    /// Flip one debug volume
    ToggleVolume(DebugVolumes),
    /// Flip the reflection prepass
    ToggleReflections,
    /// Flip between the color and depth resolve
    ToggleDepthView,
    /// Capture or release the cursor
    ToggleCursor,
}

impl Command {
    /// Command bound to `key`, if any
    pub fn for_key(key: Key) -> Option<Self> {
        let command = match key {
            Key::Escape => Self::Quit,
            Key::Num1 => Self::SetMode(RenderMode::Shaded),
            Key::Num2 => Self::SetMode(RenderMode::Wireframe),
            Key::Num3 => Self::SetMode(RenderMode::Points),
            Key::R => Self::ToggleReflections,
            Key::Z => Self::ToggleDepthView,
            Key::Tab => Self::ToggleCursor,
            _ => {
                let (_, volume) = VOLUME_KEYS.iter().find(|(bound, _)| *bound == key)?;
                Self::ToggleVolume(*volume)
            }
        };
        Some(command)
    }

    /// Apply the parts of the command that only touch render state
    ///
    /// Returns `false` for commands that need the window.
    pub fn apply(self, context: &mut RenderContext) -> bool {
        match self {
            Self::SetMode(mode) => context.render_mode = mode,
            Self::ToggleVolume(volume) => context.toggle_debug_volume(volume),
            Self::ToggleReflections => {
                context.reflections_enabled = !context.reflections_enabled;
                log::info!("Reflections {}", if context.reflections_enabled { "on" } else { "off" });
            }
            Self::ToggleDepthView => context.show_depth_buffer = !context.show_depth_buffer,
            Self::Quit | Self::ToggleCursor => return false,
        }
        true
    }
}

/// Mouse-look and fly-camera state
#[derive(Debug)]
pub struct InputController {
    /// Degrees of rotation per pixel of mouse travel
    pub mouse_sensitivity: f32,
    /// Camera speed in world units per second
    pub move_speed: f32,
    last_cursor: Option<(f64, f64)>,
}

impl Default for InputController {
    fn default() -> Self {
        Self { mouse_sensitivity: 0.1, move_speed: 10.0, last_cursor: None }
    }
}

impl InputController {
    /// Controller with default speeds
    pub fn new() -> Self {
        Self::default()
    }

    /// React to one window event
    pub fn handle_event(
        &mut self,
        event: &WindowEvent,
        window: &mut GlWindow,
        scene: &mut Scene,
        context: &mut RenderContext,
    ) {
        match *event {
            WindowEvent::Key(key, _, Action::Press, _) => {
                let Some(command) = Command::for_key(key) else {
                    return;
                };
                if command.apply(context) {
                    return;
                }
                match command {
                    Command::Quit => window.set_should_close(true),
                    Command::ToggleCursor => {
                        window.set_cursor_captured(!window.cursor_captured());
                        self.last_cursor = None;
                    }
                    _ => {}
                }
            }
            WindowEvent::FramebufferSize(width, height) => {
                context.notify_resize(width.max(0) as u32, height.max(0) as u32);
            }
            WindowEvent::CursorPos(x, y) => {
                if let Some((last_x, last_y)) = self.last_cursor.replace((x, y)) {
                    if window.cursor_captured() {
                        let yaw = (x - last_x) as f32 * self.mouse_sensitivity;
                        let pitch = (last_y - y) as f32 * self.mouse_sensitivity;
                        scene.cameras.primary_mut().rotate(yaw, pitch);
                    }
                }
            }
            _ => {}
        }
    }

    /// Move the primary camera from the held movement keys
    pub fn update(&self, window: &GlWindow, scene: &mut Scene, delta_seconds: f32) {
        let axis = |positive: Key, negative: Key| {
            f32::from(u8::from(window.key_down(positive))) - f32::from(u8::from(window.key_down(negative)))
        };
        let forward = axis(Key::W, Key::S);
        let right = axis(Key::D, Key::A);
        let up = axis(Key::Space, Key::LeftControl);
        if forward == 0.0 && right == 0.0 && up == 0.0 {
            return;
        }

        let step = self.move_speed * delta_seconds;
        scene.cameras.primary_mut().move_relative(forward * step, right * step, up * step);
    }
}
