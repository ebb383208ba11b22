//! Frame orchestration
//!
//! [`Renderer`] owns every render target and pass and issues one frame per
//! [`Renderer::render`] call:
//!
//! ```text
//! reflection capture -> offscreen main pass -> debug overlay -> resolve -> scratch reset
//! ```

use crate::core::config::RendererConfig;
use crate::render::context::{DebugVolumes, RenderContext, RenderMode};
use crate::render::device::{Capability, ClearFlags, GraphicsDevice, Viewport};
use crate::render::passes::debug_overlay::DebugOverlay;
use crate::render::passes::entity_pass::{draw_entities, EntityPass};
use crate::render::passes::post_process::PostProcessPass;
use crate::render::passes::reflection;
use crate::render::shader::{ShaderProgram, ShaderRegistry};
use crate::render::targets::{OffscreenTarget, ReflectionTarget};
use crate::render::{RenderError, RenderResult};
use crate::scene::{CameraSet, Scene};

/// Primary camera vertical field of view after a resize, in degrees
const SCREEN_FOV_DEGREES: f32 = 45.0;

/// Primary camera near plane after a resize
const SCREEN_NEAR: f32 = 0.1;

/// Primary camera far plane after a resize
const SCREEN_FAR: f32 = 10000.0;

/// Shaders used only by the resolve step
#[derive(Debug)]
pub struct PostShaders {
    /// Averages the multisampled color texture
    pub screen: ShaderProgram,
    /// Visualises the multisampled depth texture
    pub depth: ShaderProgram,
}

/// Forward renderer with reflection capture and a multisampled offscreen target
#[derive(Debug)]
pub struct Renderer {
    shaders: ShaderRegistry,
    offscreen: OffscreenTarget,
    reflection: ReflectionTarget,
    post: PostProcessPass,
    overlay: DebugOverlay,
    samples: u32,
    clear_color: [f32; 4],
}

impl Renderer {
    /// Create the render targets and passes for a `width` x `height` screen
    ///
    /// The requested sample count is clamped to what the device supports.
    pub fn new(
        device: &mut dyn GraphicsDevice,
        shaders: ShaderRegistry,
        post: PostShaders,
        config: &RendererConfig,
        width: u32,
        height: u32,
    ) -> RenderResult<Self> {
        let max_samples = device.max_samples().max(1);
        let samples = if config.msaa_samples > max_samples {
            log::warn!(
                "Requested {}x MSAA but the device supports {max_samples}x; clamping",
                config.msaa_samples
            );
            max_samples
        } else {
            config.msaa_samples.max(1)
        };

        device.set_capability(Capability::Multisample, true);
        device.set_capability(Capability::CullFace, true);

        let overlay = DebugOverlay::new(device, config.sphere_segments)?;
        let reflection = ReflectionTarget::create(device, config.reflection_resolution)?;
        let offscreen = OffscreenTarget::create(device, width.max(1), height.max(1), samples)?;
        let post = PostProcessPass::new(device, post.screen, post.depth, config.screen_clear_color)?;

        log::info!("Renderer ready: {width}x{height}, {samples}x MSAA, {} shaders", shaders.len());
        Ok(Self {
            shaders,
            offscreen,
            reflection,
            post,
            overlay,
            samples,
            clear_color: config.clear_color,
        })
    }

    /// Render one frame
    ///
    /// Only a pending resize can fail, when the new target cannot be created.
    pub fn render(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &mut Scene,
        context: &mut RenderContext,
    ) -> RenderResult<()> {
        device.set_capability(Capability::DepthTest, true);
        device.set_capability(Capability::Multisample, true);

        if let Some((width, height)) = context.take_resize() {
            self.resize_screen(device, scene, width, height)?;
        }

        if context.reflections_enabled {
            self.render_reflection_cubemap(device, scene, context);
        }

        device.bind_framebuffer(Some(self.offscreen.framebuffer));
        device.set_viewport(context.screen_viewport());
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.clear_color);
        self.render_entities(device, scene, context.render_mode, EntityPass::Main);
        self.display_bounding_volumes(device, scene, context.debug_volumes);

        self.render_screen(device, context.show_depth_buffer);
        self.reset_render(device, scene);
        Ok(())
    }

    /// Capture the six cubemap faces from the reflection camera
    pub fn render_reflection_cubemap(
        &self,
        device: &mut dyn GraphicsDevice,
        scene: &mut Scene,
        context: &RenderContext,
    ) {
        log::trace!("Reflection pass");
        reflection::capture(
            device,
            scene,
            &self.shaders,
            &self.reflection,
            context.render_mode,
            self.clear_color,
            context.screen_viewport(),
        );
    }

    /// Draw the entity list with the active camera into the bound framebuffer
    pub fn render_entities(
        &self,
        device: &mut dyn GraphicsDevice,
        scene: &Scene,
        mode: RenderMode,
        pass: EntityPass,
    ) {
        log::trace!("Entity pass {pass:?} ({mode:?})");
        draw_entities(device, scene, &self.shaders, mode, pass, self.reflection.cubemap);
    }

    /// Draw the enabled bounding volumes of every entity
    pub fn display_bounding_volumes(&self, device: &mut dyn GraphicsDevice, scene: &Scene, volumes: DebugVolumes) {
        if volumes.is_empty() {
            return;
        }
        let Some(shader) = self.shaders.get(ShaderRegistry::DEBUG_SLOT) else {
            log::trace!("No debug shader loaded; skipping bounding volumes");
            return;
        };
        self.overlay
            .draw_volumes(device, scene.entities(), shader, scene.cameras.primary(), volumes);
    }

    /// Resolve the offscreen target onto the default framebuffer
    pub fn render_screen(&self, device: &mut dyn GraphicsDevice, show_depth: bool) {
        log::trace!("Post-process pass");
        self.post.draw(device, &self.offscreen, show_depth);
    }

    /// Re-bind the scratch buffer and draw any persistent overlay lines
    pub fn reset_render(&self, device: &mut dyn GraphicsDevice, scene: &Scene) {
        match self.shaders.get(ShaderRegistry::DEBUG_SLOT) {
            Some(shader) => self.overlay.reset(device, shader, scene.cameras.primary()),
            None => device.bind_array_buffer(None),
        }
    }

    /// Replace the offscreen target with one of the new size and refit the primary camera
    pub fn resize_screen(
        &mut self,
        device: &mut dyn GraphicsDevice,
        scene: &mut Scene,
        width: u32,
        height: u32,
    ) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.offscreen.destroy(device);
        self.offscreen = OffscreenTarget::create(device, width, height, self.samples)?;
        device.set_viewport(Viewport::sized(width, height));

        let aspect = width as f32 / height as f32;
        if let Some(camera) = scene.cameras.get_mut(CameraSet::PRIMARY) {
            camera.set_projection(SCREEN_FOV_DEGREES, aspect, SCREEN_NEAR, SCREEN_FAR);
        }
        log::info!("Resized screen to {width}x{height}");
        Ok(())
    }

    /// Lines (x, y, z per vertex, pairs form segments) drawn in white every frame
    pub fn set_persistent_lines(&mut self, lines: Vec<f32>) {
        self.overlay.set_persistent_lines(lines);
    }

    /// Check that every entity refers to a loaded shader
    pub fn validate_scene(&self, scene: &Scene) -> RenderResult<()> {
        for entity in scene.entities() {
            if self.shaders.get(entity.shader()).is_none() {
                return Err(RenderError::InvalidShaderIndex {
                    entity: entity.name().to_owned(),
                    index: entity.shader(),
                    available: self.shaders.len(),
                });
            }
        }
        Ok(())
    }

    /// Loaded scene shaders
    pub fn shaders(&self) -> &ShaderRegistry {
        &self.shaders
    }

    /// Sample count in use after clamping
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Current offscreen target
    pub fn offscreen(&self) -> &OffscreenTarget {
        &self.offscreen
    }

    /// Reflection cubemap target
    pub fn reflection_target(&self) -> &ReflectionTarget {
        &self.reflection
    }

    /// Release every GPU object the renderer owns
    pub fn destroy(mut self, device: &mut dyn GraphicsDevice) {
        self.post.destroy(device);
        self.overlay.destroy(device);
        self.offscreen.destroy(device);
        self.reflection.destroy(device);
        self.shaders.destroy(device);
        log::info!("Renderer destroyed");
    }
}
