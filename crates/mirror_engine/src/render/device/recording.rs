//! Headless device that records every call
//!
//! Used by the pipeline tests: the renderer runs unchanged against a
//! [`RecordingDevice`] and the resulting [`GpuCommand`] log is inspected.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroU32;

use super::{
    Attachment, AttachTarget, BufferId, Capability, ClearFlags, FramebufferId, GraphicsDevice,
    Primitive, ProgramId, RenderbufferId, TextureFormat, TextureId, TextureImage, TextureKind,
    UniformLocation, UniformValue, Viewport,
};
use crate::render::{RenderError, RenderResult};

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GpuCommand {
    CreateBuffer(BufferId),
    UploadBuffer { buffer: BufferId, data: Vec<f32> },
    BindArrayBuffer(Option<BufferId>),
    DeleteBuffer(BufferId),
    CreateTexture2D { texture: TextureId, width: u32, height: u32 },
    CreateCubemap(TextureId),
    CreateRenderCubemap { texture: TextureId, resolution: u32 },
    CreateMultisampleTexture { texture: TextureId, format: TextureFormat, samples: u32, width: u32, height: u32 },
    DeleteTexture(TextureId),
    CreateDepthStencilBuffer { renderbuffer: RenderbufferId, width: u32, height: u32 },
    DeleteRenderbuffer(RenderbufferId),
    CreateFramebuffer(FramebufferId),
    DeleteFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    AttachTexture { attachment: Attachment, target: AttachTarget, texture: TextureId },
    AttachRenderbuffer { attachment: Attachment, renderbuffer: RenderbufferId },
    CompileProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniform { location: UniformLocation, value: UniformValue },
    EnableStream { slot: u32, buffer: BufferId, components: u32 },
    DisableStream(u32),
    BindTexture { unit: u32, kind: TextureKind, texture: Option<TextureId> },
    SetViewport(Viewport),
    Clear { flags: ClearFlags, color: [f32; 4] },
    SetCapability { capability: Capability, enabled: bool },
    SetDepthMask(bool),
    SetPointSize(f32),
    DrawArrays { primitive: Primitive, first: u32, count: u32 },
}

/// [`GraphicsDevice`] that performs no rendering and logs each call
///
/// Handles are allocated from one increasing counter shared by all object
/// kinds. Uniform locations are handed out for names that occur in the
/// program's source text, mirroring how unused uniforms resolve to nothing
/// on a real driver.
#[derive(Debug)]
pub struct RecordingDevice {
    commands: Vec<GpuCommand>,
    next_handle: u32,
    max_samples: u32,
    sources: HashMap<ProgramId, String>,
    locations: HashMap<(ProgramId, String), UniformLocation>,
    next_location: u32,
    live_textures: BTreeSet<TextureId>,
    live_framebuffers: BTreeSet<FramebufferId>,
    live_renderbuffers: BTreeSet<RenderbufferId>,
    live_buffers: BTreeSet<BufferId>,
    failing_compiles: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// Recording device reporting a maximum of 8 samples
    pub fn new() -> Self {
        Self::with_max_samples(8)
    }

    /// Recording device reporting the given sample limit
    pub fn with_max_samples(max_samples: u32) -> Self {
        Self {
            commands: Vec::new(),
            next_handle: 0,
            max_samples,
            sources: HashMap::new(),
            locations: HashMap::new(),
            next_location: 0,
            live_textures: BTreeSet::new(),
            live_framebuffers: BTreeSet::new(),
            live_renderbuffers: BTreeSet::new(),
            live_buffers: BTreeSet::new(),
            failing_compiles: false,
        }
    }

    /// Make every subsequent `compile_program` fail with a link error
    pub fn fail_compiles(&mut self, fail: bool) {
        self.failing_compiles = fail;
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the command log
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Forget recorded commands, keeping live resources
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Recorded draw calls in submission order
    pub fn draw_calls(&self) -> impl Iterator<Item = (Primitive, u32)> + '_ {
        self.commands.iter().filter_map(|command| match command {
            GpuCommand::DrawArrays { primitive, count, .. } => Some((*primitive, *count)),
            _ => None,
        })
    }

    /// Whether the texture has been created and not yet deleted
    pub fn texture_alive(&self, texture: TextureId) -> bool {
        self.live_textures.contains(&texture)
    }

    /// Whether the framebuffer has been created and not yet deleted
    pub fn framebuffer_alive(&self, framebuffer: FramebufferId) -> bool {
        self.live_framebuffers.contains(&framebuffer)
    }

    /// Number of live textures
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    /// Number of live buffers
    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    /// Number of live renderbuffers
    pub fn live_renderbuffer_count(&self) -> usize {
        self.live_renderbuffers.len()
    }

    /// Location previously handed out for `name` in `program`
    pub fn location_of(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.locations.get(&(program, name.to_owned())).copied()
    }

    fn allocate(&mut self) -> RenderResult<NonZeroU32> {
        self.next_handle += 1;
        NonZeroU32::new(self.next_handle)
            .ok_or_else(|| RenderError::ResourceCreation("handle counter overflow".into()))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn max_samples(&self) -> u32 {
        self.max_samples
    }

    fn create_buffer(&mut self) -> RenderResult<BufferId> {
        let buffer = BufferId(self.allocate()?);
        self.live_buffers.insert(buffer);
        self.commands.push(GpuCommand::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn upload_buffer(&mut self, buffer: BufferId, data: &[f32]) {
        self.commands.push(GpuCommand::UploadBuffer { buffer, data: data.to_vec() });
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.commands.push(GpuCommand::BindArrayBuffer(buffer));
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.live_buffers.remove(&buffer);
        self.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn create_texture_2d(&mut self, image: &TextureImage) -> RenderResult<TextureId> {
        let texture = TextureId(self.allocate()?);
        self.live_textures.insert(texture);
        self.commands.push(GpuCommand::CreateTexture2D {
            texture,
            width: image.width,
            height: image.height,
        });
        Ok(texture)
    }

    fn create_cubemap(&mut self, _faces: &[TextureImage; 6]) -> RenderResult<TextureId> {
        let texture = TextureId(self.allocate()?);
        self.live_textures.insert(texture);
        self.commands.push(GpuCommand::CreateCubemap(texture));
        Ok(texture)
    }

    fn create_render_cubemap(&mut self, resolution: u32) -> RenderResult<TextureId> {
        let texture = TextureId(self.allocate()?);
        self.live_textures.insert(texture);
        self.commands.push(GpuCommand::CreateRenderCubemap { texture, resolution });
        Ok(texture)
    }

    fn create_multisample_texture(
        &mut self,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> RenderResult<TextureId> {
        let texture = TextureId(self.allocate()?);
        self.live_textures.insert(texture);
        self.commands.push(GpuCommand::CreateMultisampleTexture {
            texture,
            format,
            samples,
            width,
            height,
        });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.live_textures.remove(&texture);
        self.commands.push(GpuCommand::DeleteTexture(texture));
    }

    fn create_depth_stencil_buffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        let renderbuffer = RenderbufferId(self.allocate()?);
        self.live_renderbuffers.insert(renderbuffer);
        self.commands.push(GpuCommand::CreateDepthStencilBuffer { renderbuffer, width, height });
        Ok(renderbuffer)
    }

    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId) {
        self.live_renderbuffers.remove(&renderbuffer);
        self.commands.push(GpuCommand::DeleteRenderbuffer(renderbuffer));
    }

    fn create_framebuffer(&mut self) -> RenderResult<FramebufferId> {
        let framebuffer = FramebufferId(self.allocate()?);
        self.live_framebuffers.insert(framebuffer);
        self.commands.push(GpuCommand::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.live_framebuffers.remove(&framebuffer);
        self.commands.push(GpuCommand::DeleteFramebuffer(framebuffer));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.commands.push(GpuCommand::BindFramebuffer(framebuffer));
    }

    fn attach_texture(&mut self, attachment: Attachment, target: AttachTarget, texture: TextureId) {
        self.commands.push(GpuCommand::AttachTexture { attachment, target, texture });
    }

    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferId) {
        self.commands.push(GpuCommand::AttachRenderbuffer { attachment, renderbuffer });
    }

    fn framebuffer_complete(&mut self) -> bool {
        true
    }

    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId> {
        if self.failing_compiles {
            return Err(RenderError::ShaderLink("recording device: link failure requested".into()));
        }
        let program = ProgramId(self.allocate()?);
        self.sources.insert(program, format!("{vertex_source}\n{fragment_source}"));
        self.commands.push(GpuCommand::CompileProgram(program));
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.sources.remove(&program);
        self.commands.push(GpuCommand::DeleteProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let key = (program, name.to_owned());
        if let Some(location) = self.locations.get(&key) {
            return Some(*location);
        }
        let declared = self.sources.get(&program)?.contains(name);
        if !declared {
            return None;
        }
        let location = UniformLocation(self.next_location);
        self.next_location += 1;
        self.locations.insert(key, location);
        Some(location)
    }

    fn use_program(&mut self, program: ProgramId) {
        self.commands.push(GpuCommand::UseProgram(program));
    }

    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue) {
        self.commands.push(GpuCommand::SetUniform { location, value });
    }

    fn enable_stream(&mut self, slot: u32, buffer: BufferId, components: u32) {
        self.commands.push(GpuCommand::EnableStream { slot, buffer, components });
    }

    fn disable_stream(&mut self, slot: u32) {
        self.commands.push(GpuCommand::DisableStream(slot));
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: Option<TextureId>) {
        self.commands.push(GpuCommand::BindTexture { unit, kind, texture });
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(GpuCommand::SetViewport(viewport));
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear { flags, color });
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.commands.push(GpuCommand::SetCapability { capability, enabled });
    }

    fn set_depth_mask(&mut self, enabled: bool) {
        self.commands.push(GpuCommand::SetDepthMask(enabled));
    }

    fn set_point_size(&mut self, size: f32) {
        self.commands.push(GpuCommand::SetPointSize(size));
    }

    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32) {
        self.commands.push(GpuCommand::DrawArrays { primitive, first, count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique_across_kinds() {
        let mut device = RecordingDevice::new();
        let buffer = device.create_buffer().unwrap();
        let texture = device.create_render_cubemap(64).unwrap();
        let framebuffer = device.create_framebuffer().unwrap();

        assert_ne!(buffer.0, texture.0);
        assert_ne!(texture.0, framebuffer.0);
        assert_eq!(device.commands().len(), 3);
    }

    #[test]
    fn test_uniform_locations_follow_source_text() {
        let mut device = RecordingDevice::new();
        let program = device
            .compile_program("uniform mat4 modelMatrix;", "uniform vec3 eyePosition;")
            .unwrap();

        let model = device.uniform_location(program, "modelMatrix");
        assert!(model.is_some());
        assert_eq!(device.uniform_location(program, "modelMatrix"), model);
        assert!(device.uniform_location(program, "eyePosition").is_some());
        assert!(device.uniform_location(program, "lightPosition").is_none());
    }

    #[test]
    fn test_deleted_resources_are_not_alive() {
        let mut device = RecordingDevice::new();
        let texture = device
            .create_multisample_texture(TextureFormat::Rgb, 4, 16, 16)
            .unwrap();
        assert!(device.texture_alive(texture));

        device.delete_texture(texture);
        assert!(!device.texture_alive(texture));
        assert_eq!(device.live_texture_count(), 0);
    }

    #[test]
    fn test_compile_failure_is_reported() {
        let mut device = RecordingDevice::new();
        device.fail_compiles(true);
        assert!(matches!(
            device.compile_program("", ""),
            Err(RenderError::ShaderLink(_))
        ));
    }
}
