//! # Rendering System
//!
//! Forward renderer with an optional reflection prepass and a
//! post-processing resolve, driven frame by frame from the application.
//!
//! ## Architecture
//!
//! - **Device**: [`GraphicsDevice`] seam over the immediate-mode API
//! - **Shaders**: [`ShaderRegistry`] of programs with precomputed binding plans
//! - **Targets**: offscreen multisampled target and the reflection cubemap
//! - **Passes**: reflection capture, entity dispatch, post-process, debug overlay
//! - **Renderer**: owns the targets and passes and sequences one frame
//!
//! ## Frame Sequence
//!
//! ```text
//! render()
//!   ├── resize_screen()                 (only when the context carries a resize)
//!   ├── render_reflection_cubemap()     (only when reflections are enabled)
//!   ├── offscreen target: render_entities(Main) + display_bounding_volumes()
//!   ├── render_screen()                 (resolve to the default framebuffer)
//!   └── reset_render()
//! ```

use thiserror::Error;

use crate::assets::AssetError;

pub mod device;
pub mod shader;
pub mod window;

mod context;
mod passes;
mod renderer;
mod targets;

#[cfg(test)]
mod renderer_tests;

pub use context::{DebugVolumes, RenderContext, RenderMode};
pub use device::{GlDevice, GraphicsDevice, GpuCommand, RecordingDevice};
pub use passes::{EntityPass, CUBE_FACE_ORIENTATIONS};
pub use renderer::{PostShaders, Renderer};
pub use shader::{BindingPlan, ShaderProgram, ShaderRegistry};
pub use targets::{OffscreenTarget, ReflectionTarget};

/// Rendering error types
///
/// Only resource creation can fail; per-frame drawing has no error paths.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A GPU object could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// A shader stage failed to compile
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile {
        /// Pipeline stage name
        stage: &'static str,
        /// Driver info log
        log: String,
    },

    /// A program failed to link
    #[error("Failed to link shader program: {0}")]
    ShaderLink(String),

    /// A framebuffer did not pass the completeness check
    #[error("Framebuffer '{0}' is incomplete")]
    IncompleteFramebuffer(&'static str),

    /// An entity points past the end of the shader registry
    #[error("Entity '{entity}' uses shader slot {index} but only {available} shaders are loaded")]
    InvalidShaderIndex {
        /// Entity name
        entity: String,
        /// Requested slot
        index: usize,
        /// Registry size
        available: usize,
    },

    /// A named shader is not in the registry
    #[error("Shader '{0}' is not loaded")]
    MissingShader(String),

    /// Loading an asset failed
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
