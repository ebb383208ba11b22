//! Graphics device abstraction
//!
//! The renderer talks to the immediate-mode graphics API exclusively through
//! [`GraphicsDevice`]. Every method maps onto one (or a small, fixed group of)
//! API calls so that the order of calls issued by a pass is the order the
//! driver sees.
//!
//! Two implementations exist:
//!
//! - [`GlDevice`]: OpenGL 3.3 core through `glow`
//! - [`RecordingDevice`]: headless, records each call as a [`GpuCommand`]
//!
//! Resource creation returns [`RenderResult`]; per-frame state changes and
//! draws cannot fail at this level.

use std::num::NonZeroU32;

use bitflags::bitflags;

use crate::render::RenderResult;

pub mod gl;
pub mod recording;

pub use gl::GlDevice;
pub use recording::{GpuCommand, RecordingDevice};

/// Handle to a vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub NonZeroU32);

/// Handle to a texture object of any kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub NonZeroU32);

/// Handle to a framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub NonZeroU32);

/// Handle to a renderbuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderbufferId(pub NonZeroU32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub NonZeroU32);

/// Resolved location of a uniform inside a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// Primitive topology for `draw_arrays`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Independent triangles
    Triangles,
    /// Independent line segments
    Lines,
    /// Points
    Points,
}

/// Binding target of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// Regular 2D texture
    Texture2D,
    /// Six-face cube map
    Cubemap,
    /// Multisampled 2D texture
    Multisample2D,
}

/// Storage format of a render-target texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit RGB color
    Rgb,
    /// 24-bit depth
    Depth,
}

/// Framebuffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attachment {
    /// First color attachment
    Color0,
    /// Depth attachment
    Depth,
    /// Combined depth and stencil attachment
    DepthStencil,
}

/// Face of a cube map, in API order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// All faces in API order (+X, -X, +Y, -Y, +Z, -Z)
    pub const ALL: [Self; 6] = [
        Self::PositiveX,
        Self::NegativeX,
        Self::PositiveY,
        Self::NegativeY,
        Self::PositiveZ,
        Self::NegativeZ,
    ];

    /// Offset from the +X face target
    pub const fn index(self) -> u32 {
        self as u32
    }
}

/// Texture image a framebuffer attachment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachTarget {
    /// The whole multisampled 2D texture
    Multisample2D,
    /// One face of a cube map
    Cube(CubeFace),
}

/// Fixed-function capabilities toggled by the passes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Depth testing
    DepthTest,
    /// Multisample rasterization
    Multisample,
    /// Back-face culling
    CullFace,
}

bitflags! {
    /// Buffers cleared by [`GraphicsDevice::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color buffer
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
    }
}

/// Rectangle of the bound framebuffer that rasterization maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    /// Left edge in pixels
    pub x: i32,
    /// Bottom edge in pixels
    pub y: i32,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Viewport {
    /// Viewport anchored at the origin
    pub const fn sized(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Value uploaded to a uniform location
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    /// Three-component vector
    Vec3([f32; 3]),
    /// Integer (also used for sampler units)
    Int(i32),
}

impl UniformValue {
    /// Build a matrix value from a column-major nalgebra matrix
    pub fn mat4(matrix: &crate::foundation::math::Mat4) -> Self {
        let mut data = [0.0; 16];
        data.copy_from_slice(matrix.as_slice());
        Self::Mat4(data)
    }

    /// Build a vector value
    pub fn vec3(vector: &crate::foundation::math::Vec3) -> Self {
        Self::Vec3([vector.x, vector.y, vector.z])
    }
}

/// Decoded RGBA8 image ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA8 rows
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Single-color image of the given size
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.iter().copied().cycle().take((width * height * 4) as usize).collect();
        Self { width, height, pixels }
    }
}

/// Immediate-mode graphics API used by the rendering pipeline
///
/// Calls execute in submission order on the calling thread. Implementations
/// keep the API's global-state semantics: `use_program`, `bind_framebuffer`,
/// `set_viewport` and friends stay in effect until changed.
pub trait GraphicsDevice {
    /// Largest sample count supported for multisampled textures
    fn max_samples(&self) -> u32;

    /// Create an empty vertex buffer
    fn create_buffer(&mut self) -> RenderResult<BufferId>;

    /// Bind `buffer` as the array buffer and replace its contents
    fn upload_buffer(&mut self, buffer: BufferId, data: &[f32]);

    /// Bind (or unbind) the array buffer
    fn bind_array_buffer(&mut self, buffer: Option<BufferId>);

    /// Release a vertex buffer
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Create a mipmapped, repeating 2D texture from an image
    fn create_texture_2d(&mut self, image: &TextureImage) -> RenderResult<TextureId>;

    /// Create a cube map from six images (+X, -X, +Y, -Y, +Z, -Z)
    fn create_cubemap(&mut self, faces: &[TextureImage; 6]) -> RenderResult<TextureId>;

    /// Create an empty RGB cube map usable as a render target
    fn create_render_cubemap(&mut self, resolution: u32) -> RenderResult<TextureId>;

    /// Create a multisampled render-target texture
    fn create_multisample_texture(
        &mut self,
        format: TextureFormat,
        samples: u32,
        width: u32,
        height: u32,
    ) -> RenderResult<TextureId>;

    /// Release a texture
    fn delete_texture(&mut self, texture: TextureId);

    /// Create a depth-stencil renderbuffer
    fn create_depth_stencil_buffer(&mut self, width: u32, height: u32) -> RenderResult<RenderbufferId>;

    /// Release a renderbuffer
    fn delete_renderbuffer(&mut self, renderbuffer: RenderbufferId);

    /// Create an empty framebuffer object
    fn create_framebuffer(&mut self) -> RenderResult<FramebufferId>;

    /// Release a framebuffer object
    fn delete_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Bind a framebuffer for reading and drawing; `None` selects the default one
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    /// Attach a texture image to the bound framebuffer
    fn attach_texture(&mut self, attachment: Attachment, target: AttachTarget, texture: TextureId);

    /// Attach a renderbuffer to the bound framebuffer
    fn attach_renderbuffer(&mut self, attachment: Attachment, renderbuffer: RenderbufferId);

    /// Whether the bound framebuffer is complete
    fn framebuffer_complete(&mut self) -> bool;

    /// Compile and link a vertex + fragment program
    fn compile_program(&mut self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramId);

    /// Location of an active uniform, `None` if the program has no such uniform
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Install a program for subsequent uniform uploads and draws
    fn use_program(&mut self, program: ProgramId);

    /// Upload a uniform value to the program in use
    fn set_uniform(&mut self, location: UniformLocation, value: UniformValue);

    /// Enable attribute `slot` and source it from `buffer`, `components` floats per vertex
    fn enable_stream(&mut self, slot: u32, buffer: BufferId, components: u32);

    /// Disable attribute `slot`
    fn disable_stream(&mut self, slot: u32);

    /// Bind a texture (or unbind with `None`) on a texture unit
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: Option<TextureId>);

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Clear buffers of the bound framebuffer, color buffer to `color`
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// Enable or disable a fixed-function capability
    fn set_capability(&mut self, capability: Capability, enabled: bool);

    /// Enable or disable depth writes
    fn set_depth_mask(&mut self, enabled: bool);

    /// Rasterized size of points
    fn set_point_size(&mut self, size: f32);

    /// Draw `count` vertices starting at `first` from the enabled streams
    fn draw_arrays(&mut self, primitive: Primitive, first: u32, count: u32);
}
