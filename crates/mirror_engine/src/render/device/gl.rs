//! OpenGL 3.3 core implementation of [`GraphicsDevice`] on top of `glow`

use std::ffi::c_void;

use glow::HasContext;

use super::{
    Attachment, AttachTarget, BufferId, Capability, ClearFlags, FramebufferId, GraphicsDevice,
    Primitive, ProgramId, RenderbufferId, TextureFormat, TextureId, TextureImage, TextureKind,
    UniformLocation, UniformValue, Viewport,
};
use crate::render::{RenderError, RenderResult};

/// `glPointSize`, which `glow` does not wrap
type PointSizeFn = unsafe extern "system" fn(f32);

/// Graphics device backed by a current OpenGL context
///
/// The context must stay current on the calling thread for the device's
/// whole lifetime. A single vertex array object is bound at construction and
/// all attribute streams go through it.
pub struct GlDevice {
    gl: glow::Context,
    point_size: PointSizeFn,
    vertex_array: glow::NativeVertexArray,
    max_samples: u32,
}

impl std::fmt::Debug for GlDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlDevice")
            .field("max_samples", &self.max_samples)
            .finish_non_exhaustive()
    }
}

impl GlDevice {
    /// Load the GL entry points through `loader` and set up the shared vertex array
    ///
    /// # Safety
    ///
    /// The context `loader` resolves against must be current on the calling
    /// thread and outlive the device.
    pub unsafe fn from_loader<F>(mut loader: F) -> RenderResult<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        let point_size = load_point_size(&mut loader)?;
        let gl = glow::Context::from_loader_function(loader);
        Self::with_context(gl, point_size)
    }

    fn with_context(gl: glow::Context, point_size: PointSizeFn) -> RenderResult<Self> {
        // SAFETY: from_loader's caller guarantees the context is current.
        let (vertex_array, max_samples) = unsafe {
            let vertex_array = gl.create_vertex_array().map_err(RenderError::ResourceCreation)?;
            gl.bind_vertex_array(Some(vertex_array));
            let max_samples = gl.get_parameter_i32(glow::MAX_SAMPLES).max(1) as u32;
            log::info!(
                "OpenGL {} on {} ({} max samples)",
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER),
                max_samples
            );
            (vertex_array, max_samples)
        };

        Ok(Self { gl, point_size, vertex_array, max_samples })
    }

    /// Raw `glow` context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn compile_stage(&self, stage: u32, source: &str) -> RenderResult<glow::NativeShader> {
        unsafe {
            let shader = self.gl.create_shader(stage).map_err(RenderError::ResourceCreation)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if self.gl.get_shader_compile_status(shader) {
                Ok(shader)
            } else {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                Err(RenderError::ShaderCompile {
                    stage: if stage == glow::VERTEX_SHADER { "vertex" } else { "fragment" },
                    log,
                })
            }
        }
    }
}

/// Resolve `glPointSize`; a null entry point means no usable context
fn load_point_size<F>(loader: &mut F) -> RenderResult<PointSizeFn>
where
    F: FnMut(&str) -> *const c_void,
{
    let address = loader("glPointSize");
    if address.is_null() {
        return Err(RenderError::ResourceCreation("glPointSize entry point not found".to_string()));
    }
    // SAFETY: a non-null address for glPointSize has the GL signature void(GLfloat).
    Ok(unsafe { std::mem::transmute::<*const c_void, PointSizeFn>(address) })
}

impl Drop for GlDevice {
    fn drop(&mut self) {
        unsafe {
            self.gl.delete_vertex_array(self.vertex_array);
        }
    }
}

const fn texture_target(kind: TextureKind) -> u32 {
    match kind {
        TextureKind::Texture2D => glow::TEXTURE_2D,
        TextureKind::Cubemap => glow::TEXTURE_CUBE_MAP,
        TextureKind::Multisample2D => glow::TEXTURE_2D_MULTISAMPLE,
    }
}

const fn attachment_point(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color0 => glow::COLOR_ATTACHMENT0,
        Attachment::Depth => glow::DEPTH_ATTACHMENT,
        Attachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
    }
}

const fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::Multisample => glow::MULTISAMPLE,
        Capability::CullFace => glow::CULL_FACE,
    }
}

const fn primitive_mode(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::Lines => glow::LINES,
        Primitive::Points => glow::POINTS,
    }
}

impl GraphicsDevice for GlDevice {
    fn max_samples(&self) -> u32 {
        self.max_samples
    }

    fn create_buffer(&mut self) -> RenderResult<BufferId> {
        let buffer = unsafe { self.gl.create_buffer() }.map_err(RenderError::ResourceCreation)?;
        Ok(BufferId(buffer.0))
    }

    fn upload_buffer(&mut self, buffer: BufferId, data: &[f32]) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(buffer.0)));
            self.gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(data),
                glow::STATIC_DRAW,
            );
        }
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        unsafe {
            self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer.map(|b| glow::NativeBuffer(b.0)));
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn create_texture_2d(&mut self, image: &TextureImage) -> RenderResult<TextureId> {
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                image.width as i32,
                image.height as i32,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                Some(image.pixels.as_slice()),
            );
            self.gl.generate_mipmap(glow::TEXTURE_2D);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(TextureId(texture.0))
        }
    }

    fn create_cubemap(&mut self, faces: &[TextureImage; 6]) -> RenderResult<TextureId> {
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            for (index, face) in faces.iter().enumerate() {
                self.gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + index as u32,
                    0,
                    glow::RGBA8 as i32,
                    face.width as i32,
                    face.height as i32,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    Some(face.pixels.as_slice()),
                );
            }
            set_cubemap_parameters(&self.gl);
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            Ok(TextureId(texture.0))
        }
    }

    fn create_render_cubemap(&mut self, resolution: u32) -> RenderResult<TextureId> {
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            for index in 0..6 {
                self.gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + index,
                    0,
                    glow::RGB8 as i32,
                    resolution as i32,
                    resolution as i32,
                    0,
                    glow::RGB,
                    glow::UNSIGNED_BYTE,
                    None,
                );
            }
            set_cubemap_parameters(&self.gl);
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            Ok(TextureId(texture.0))
        }
    }

    fn create_multisample_texture(
        &mut self,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> RenderResult<TextureId> {
        let internal_format = match format {
            TextureFormat::Rgb => glow::RGB8,
            TextureFormat::Depth => glow::DEPTH_COMPONENT24,
        };
        unsafe {
            let texture = self.gl.create_texture().map_err(RenderError::ResourceCreation)?;
            self.gl.bind_texture(glow::TEXTURE_2D_MULTISAMPLE, Some(texture));
            self.gl.tex_image_2d_multisample(
                glow::TEXTURE_2D_MULTISAMPLE,
                samples as i32,
                internal_format as i32,
                width as i32,
                height as i32,
                true,
            );
            self.gl.bind_texture(glow::TEXTURE_2D_MULTISAMPLE, None);
            Ok(TextureId(texture.0))
        }
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn create_depth_stencil_buffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        unsafe {
            let renderbuffer = self.gl.create_renderbuffer().map_err(RenderError::ResourceCreation)?;
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                width as i32,
                height as i32,
            );
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            Ok(RenderbufferId(renderbuffer.0))
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        unsafe { self.gl.delete_renderbuffer(glow::NativeRenderbuffer(renderbuffer.0)) }
    }

    fn create_framebuffer(&mut self) -> RenderResult<FramebufferId> {
        let framebuffer = unsafe { self.gl.create_framebuffer() }.map_err(RenderError::ResourceCreation)?;
        Ok(FramebufferId(framebuffer.0))
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        unsafe { self.gl.delete_framebuffer(glow::NativeFramebuffer(framebuffer.0)) }
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::FRAMEBUFFER,
                framebuffer.map(|f| glow::NativeFramebuffer(f.0)),
            );
        }
    }

    fn attach_texture(&mut self, attachment: Attachment, target: AttachTarget, texture: TextureId) {
        let texture_target = match target {
            AttachTarget::Multisample2D => glow::TEXTURE_2D_MULTISAMPLE,
            AttachTarget::Cube(face) => glow::TEXTURE_CUBE_MAP_POSITIVE_X + face.index(),
        };
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                attachment_point(attachment),
                texture_target,
                Some(glow::NativeTexture(texture.0)),
                0,
            );
        }
    }

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferId) {
        unsafe {
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                attachment_point(attachment),
                glow::RENDERBUFFER,
                Some(glow::NativeRenderbuffer(renderbuffer.0)),
            );
        }
    }

    fn framebuffer_complete(&mut self) -> bool {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE }
    }

    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId> {
        let vertex = self.compile_stage(glow::VERTEX_SHADER, vertex_source)?;
        let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, fragment_source) {
            Ok(fragment) => fragment,
            Err(error) => {
                unsafe { self.gl.delete_shader(vertex) };
                return Err(error);
            }
        };

        unsafe {
            let program = self.gl.create_program().map_err(RenderError::ResourceCreation)?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);

            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);

            if linked {
                Ok(ProgramId(program.0))
            } else {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                Err(RenderError::ShaderLink(log))
            }
        }
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe { self.gl.get_uniform_location(glow::NativeProgram(program.0), name) }
            .map(|location| UniformLocation(location.0))
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { self.gl.use_program(Some(glow::NativeProgram(program.0))) }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe {
            match value {
                UniformValue::Mat4(matrix) => {
                    self.gl.uniform_matrix_4_f32_slice(Some(&location), false, &matrix);
                }
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(Some(&location), x, y, z),
                UniformValue::Int(value) => self.gl.uniform_1_i32(Some(&location), value),
            }
        }
    }

    fn enable_stream(&mut self, slot: u32, buffer: BufferId, components: u32) {
        unsafe {
            self.gl.enable_vertex_attrib_array(slot);
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(glow::NativeBuffer(buffer.0)));
            self.gl.vertex_attrib_pointer_f32(slot, components as i32, glow::FLOAT, false, 0, 0);
        }
    }

    fn disable_stream(&mut self, slot: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(slot) }
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: Option<TextureId>) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(texture_target(kind), texture.map(|t| glow::NativeTexture(t.0)));
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        unsafe {
            self.gl.viewport(
                viewport.x,
                viewport.y,
                viewport.width as i32,
                viewport.height as i32,
            );
        }
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(mask);
        }
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(capability_enum(capability));
            } else {
                self.gl.disable(capability_enum(capability));
            }
        }
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        unsafe { self.gl.depth_mask(enabled) }
    }

    fn set_point_size(&mut self, size: f32) {
        unsafe { (self.point_size)(size) }
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        unsafe { self.gl.draw_arrays(primitive_mode(primitive), first as i32, count as i32) }
    }
}

unsafe fn set_cubemap_parameters(gl: &glow::Context) {
    let target = glow::TEXTURE_CUBE_MAP;
    gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
    gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
}
