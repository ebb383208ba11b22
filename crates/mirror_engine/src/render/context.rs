//! Per-frame render settings shared between input handling and the renderer

use bitflags::bitflags;

use crate::core::config::RendererConfig;
use crate::render::device::Viewport;

/// How non-background entities are rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Each entity's declared primitive
    #[default]
    Shaded,
    /// Line list over the vertex stream
    Wireframe,
    /// Point list over the vertex stream
    Points,
}

bitflags! {
    /// Debug volumes drawn by the overlay
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DebugVolumes: u32 {
        /// Object-space box under the model matrix (red)
        const OBJECT_BOX = 1 << 0;
        /// Axis-aligned box enclosing the object box (green)
        const EXTERNAL_AABB = 1 << 1;
        /// Axis-aligned box inside the object box (blue)
        const INTERNAL_AABB = 1 << 2;
        /// Average of internal and external boxes (cyan)
        const MIDPOINT_AABB = 1 << 3;
        /// Axis-aligned box of the transformed vertices (magenta)
        const TIGHT_AABB = 1 << 4;
        /// Sphere inside the external box (yellow)
        const INTERNAL_SPHERE = 1 << 5;
        /// Sphere through the external box corners (orange)
        const EXTERNAL_SPHERE = 1 << 6;
        /// Sphere through the farthest vertex (lime)
        const TIGHT_SPHERE = 1 << 7;
    }
}

/// Mutable render state, written between frames and read by [`Renderer::render`]
///
/// [`Renderer::render`]: crate::render::Renderer::render
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Rasterization mode for non-background entities
    pub render_mode: RenderMode,
    /// Enabled debug volumes
    pub debug_volumes: DebugVolumes,
    /// Show the depth buffer instead of the color buffer
    pub show_depth_buffer: bool,
    /// Run the reflection prepass
    pub reflections_enabled: bool,
    width: u32,
    height: u32,
    resize_pending: bool,
}

impl RenderContext {
    /// Context for a screen of the given size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            render_mode: RenderMode::default(),
            debug_volumes: DebugVolumes::empty(),
            show_depth_buffer: false,
            reflections_enabled: false,
            width,
            height,
            resize_pending: false,
        }
    }

    /// Context seeded from renderer settings
    pub fn from_config(config: &RendererConfig, width: u32, height: u32) -> Self {
        Self {
            reflections_enabled: config.reflections,
            ..Self::new(width, height)
        }
    }

    /// Current screen size
    pub fn screen_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Viewport covering the screen
    pub fn screen_viewport(&self) -> Viewport {
        Viewport::sized(self.width, self.height)
    }

    /// Width over height
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Record a new framebuffer size; zero-sized framebuffers are ignored
    pub fn notify_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring zero-sized framebuffer {width}x{height}");
            return;
        }
        if (width, height) != (self.width, self.height) {
            self.width = width;
            self.height = height;
            self.resize_pending = true;
        }
    }

    /// Consume the pending resize, if any
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        std::mem::take(&mut self.resize_pending).then_some((self.width, self.height))
    }

    /// Flip one or more debug volumes
    pub fn toggle_debug_volume(&mut self, volume: DebugVolumes) {
        self.debug_volumes.toggle(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_is_edge_triggered() {
        let mut context = RenderContext::new(1280, 720);
        assert_eq!(context.take_resize(), None);

        context.notify_resize(800, 600);
        assert_eq!(context.take_resize(), Some((800, 600)));
        assert_eq!(context.take_resize(), None);
    }

    #[test]
    fn test_zero_sized_resize_is_ignored() {
        let mut context = RenderContext::new(1280, 720);
        context.notify_resize(0, 0);
        assert_eq!(context.take_resize(), None);
        assert_eq!(context.screen_size(), (1280, 720));

        context.notify_resize(1280, 720);
        assert_eq!(context.take_resize(), None);
    }

    #[test]
    fn test_debug_volume_toggles() {
        let mut context = RenderContext::new(16, 16);
        context.toggle_debug_volume(DebugVolumes::OBJECT_BOX);
        context.toggle_debug_volume(DebugVolumes::TIGHT_SPHERE);
        assert!(context.debug_volumes.contains(DebugVolumes::OBJECT_BOX | DebugVolumes::TIGHT_SPHERE));

        context.toggle_debug_volume(DebugVolumes::OBJECT_BOX);
        assert_eq!(context.debug_volumes, DebugVolumes::TIGHT_SPHERE);
    }
}
