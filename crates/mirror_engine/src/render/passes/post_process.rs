//! Fullscreen resolve of the offscreen target

use crate::render::device::{
    BufferId, Capability, ClearFlags, GraphicsDevice, Primitive, TextureKind, UniformValue,
};
use crate::render::shader::ShaderProgram;
use crate::render::targets::OffscreenTarget;
use crate::render::RenderResult;

/// Two triangles covering clip space, (x, y) per vertex
#[rustfmt::skip]
pub const QUAD_POSITIONS: [f32; 12] = [
    -1.0,  1.0,  -1.0, -1.0,   1.0, -1.0,
    -1.0,  1.0,   1.0, -1.0,   1.0,  1.0,
];

/// Texture coordinates matching [`QUAD_POSITIONS`]
#[rustfmt::skip]
pub const QUAD_UVS: [f32; 12] = [
    0.0, 1.0,  0.0, 0.0,  1.0, 0.0,
    0.0, 1.0,  1.0, 0.0,  1.0, 1.0,
];

/// Sample count uniform read by both resolve shaders
const SAMPLES_UNIFORM: &str = "samples";

/// Resolve shaders plus the fullscreen quad
#[derive(Debug)]
pub(crate) struct PostProcessPass {
    screen_shader: ShaderProgram,
    depth_shader: ShaderProgram,
    quad: BufferId,
    uvs: BufferId,
    clear_color: [f32; 4],
}

impl PostProcessPass {
    pub(crate) fn new(
        device: &mut dyn GraphicsDevice,
        screen_shader: ShaderProgram,
        depth_shader: ShaderProgram,
        clear_color: [f32; 4],
    ) -> RenderResult<Self> {
        let quad = device.create_buffer()?;
        device.upload_buffer(quad, &QUAD_POSITIONS);
        let uvs = device.create_buffer()?;
        device.upload_buffer(uvs, &QUAD_UVS);
        Ok(Self { screen_shader, depth_shader, quad, uvs, clear_color })
    }

    /// Draw the color (or depth) texture of `source` onto the default framebuffer
    pub(crate) fn draw(&self, device: &mut dyn GraphicsDevice, source: &OffscreenTarget, show_depth: bool) {
        device.bind_framebuffer(None);
        device.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.clear_color);
        device.set_capability(Capability::DepthTest, false);

        let (shader, texture) = if show_depth {
            (&self.depth_shader, source.depth)
        } else {
            (&self.screen_shader, source.color)
        };
        device.use_program(shader.program());
        device.bind_texture(0, TextureKind::Multisample2D, Some(texture));
        if let Some(location) = shader.location(SAMPLES_UNIFORM) {
            device.set_uniform(location, UniformValue::Int(source.samples as i32));
        }

        device.enable_stream(0, self.quad, 2);
        device.enable_stream(1, self.uvs, 2);
        device.draw_arrays(Primitive::Triangles, 0, 6);
        device.disable_stream(0);
        device.disable_stream(1);

        device.set_capability(Capability::DepthTest, true);
    }

    pub(crate) fn destroy(&self, device: &mut dyn GraphicsDevice) {
        device.delete_buffer(self.quad);
        device.delete_buffer(self.uvs);
        self.screen_shader.destroy(device);
        self.depth_shader.destroy(device);
    }
}
