//! # Mirror Engine
//!
//! A forward renderer built directly on an immediate-mode graphics API
//! (OpenGL 3.3 core through `glow`).
//!
//! ## Features
//!
//! - **Reflection capture**: six-face cubemap prepass from a secondary camera
//! - **Forward main pass**: name-free, plan-driven uniform and attribute binding
//! - **Post-processing**: multisampled offscreen target resolved on a fullscreen quad
//! - **Debug overlay**: bounding boxes and spheres drawn through a scratch buffer
//! - **Headless testing**: every pass runs against a recording device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mirror_engine::prelude::*;
//!
//! fn frame(
//!     device: &mut dyn GraphicsDevice,
//!     renderer: &mut Renderer,
//!     scene: &mut Scene,
//!     context: &mut RenderContext,
//! ) -> Result<(), RenderError> {
//!     renderer.render(device, scene, context)
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod assets;
pub mod scene;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::math::{Vec3, Mat4, Transform},
        scene::{Entity, EntityTraits, Scene, Camera, CameraSet, Orientation},
        render::{
            GraphicsDevice, GlDevice, RecordingDevice, Renderer, RenderContext, RenderError,
            RenderMode, DebugVolumes, ShaderRegistry, ShaderProgram,
        },
        core::config::{ApplicationConfig, RendererConfig, WindowConfig, AssetConfig},
        config::{Config, ConfigError},
    };
}
