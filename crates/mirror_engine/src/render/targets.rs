//! Offscreen render targets

use crate::render::device::{
    Attachment, AttachTarget, CubeFace, FramebufferId, GraphicsDevice, RenderbufferId,
    TextureFormat, TextureId,
};
use crate::render::{RenderError, RenderResult};

/// Multisampled color + depth target the main pass renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffscreenTarget {
    /// Framebuffer with both textures attached
    pub framebuffer: FramebufferId,
    /// Multisampled RGB color texture
    pub color: TextureId,
    /// Multisampled depth texture
    pub depth: TextureId,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Samples per pixel
    pub samples: u32,
}

impl OffscreenTarget {
    /// Create the textures and framebuffer; leaves the default framebuffer bound
    pub fn create(device: &mut dyn GraphicsDevice, width: u32, height: u32, samples: u32) -> RenderResult<Self> {
        let color = device.create_multisample_texture(TextureFormat::Rgb, samples, width, height)?;
        let depth = device.create_multisample_texture(TextureFormat::Depth, samples, width, height)?;
        let framebuffer = device.create_framebuffer()?;

        device.bind_framebuffer(Some(framebuffer));
        device.attach_texture(Attachment::Color0, AttachTarget::Multisample2D, color);
        device.attach_texture(Attachment::Depth, AttachTarget::Multisample2D, depth);
        let complete = device.framebuffer_complete();
        device.bind_framebuffer(None);

        let target = Self { framebuffer, color, depth, width, height, samples };
        if !complete {
            target.destroy(device);
            return Err(RenderError::IncompleteFramebuffer("offscreen"));
        }

        log::info!("Created offscreen target {width}x{height} ({samples}x MSAA)");
        Ok(target)
    }

    /// Release the framebuffer and both textures
    pub fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.delete_framebuffer(self.framebuffer);
        device.delete_texture(self.color);
        device.delete_texture(self.depth);
    }
}

/// Cubemap color target with a shared depth-stencil buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflectionTarget {
    /// Framebuffer the faces are attached to in turn
    pub framebuffer: FramebufferId,
    /// Six-face color cubemap
    pub cubemap: TextureId,
    /// Single-sample depth-stencil buffer sized to one face
    pub depth_stencil: RenderbufferId,
    /// Edge length of each face in pixels
    pub resolution: u32,
}

impl ReflectionTarget {
    /// Create the cubemap, renderbuffer and framebuffer; leaves the default framebuffer bound
    pub fn create(device: &mut dyn GraphicsDevice, resolution: u32) -> RenderResult<Self> {
        let cubemap = device.create_render_cubemap(resolution)?;
        let depth_stencil = device.create_depth_stencil_buffer(resolution, resolution)?;
        let framebuffer = device.create_framebuffer()?;

        device.bind_framebuffer(Some(framebuffer));
        device.attach_renderbuffer(Attachment::DepthStencil, depth_stencil);
        device.attach_texture(Attachment::Color0, AttachTarget::Cube(CubeFace::PositiveX), cubemap);
        let complete = device.framebuffer_complete();
        device.bind_framebuffer(None);

        let target = Self { framebuffer, cubemap, depth_stencil, resolution };
        if !complete {
            target.destroy(device);
            return Err(RenderError::IncompleteFramebuffer("reflection"));
        }

        log::info!("Created reflection cubemap target {resolution}x{resolution}");
        Ok(target)
    }

    /// Release the framebuffer, renderbuffer and cubemap
    pub fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.delete_framebuffer(self.framebuffer);
        device.delete_renderbuffer(self.depth_stencil);
        device.delete_texture(self.cubemap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::{GpuCommand, RecordingDevice};

    #[test]
    fn test_offscreen_target_attachments() {
        let mut device = RecordingDevice::new();
        let target = OffscreenTarget::create(&mut device, 320, 240, 4).unwrap();

        let commands = device.commands();
        assert!(commands.contains(&GpuCommand::AttachTexture {
            attachment: Attachment::Color0,
            target: AttachTarget::Multisample2D,
            texture: target.color,
        }));
        assert!(commands.contains(&GpuCommand::AttachTexture {
            attachment: Attachment::Depth,
            target: AttachTarget::Multisample2D,
            texture: target.depth,
        }));
        assert_eq!(commands.last(), Some(&GpuCommand::BindFramebuffer(None)));
    }

    #[test]
    fn test_reflection_depth_buffer_is_single_sampled() {
        let mut device = RecordingDevice::new();
        let target = ReflectionTarget::create(&mut device, 256).unwrap();

        assert!(device.commands().contains(&GpuCommand::CreateDepthStencilBuffer {
            renderbuffer: target.depth_stencil,
            width: 256,
            height: 256,
        }));

        target.destroy(&mut device);
        assert_eq!(device.live_texture_count(), 0);
        assert_eq!(device.live_renderbuffer_count(), 0);
        assert!(!device.framebuffer_alive(target.framebuffer));
    }
}
