//! Render passes
//!
//! Each pass issues a fixed sequence of device calls. The [`Renderer`]
//! decides when each one runs.
//!
//! [`Renderer`]: crate::render::Renderer

pub(crate) mod debug_overlay;
pub(crate) mod entity_pass;
pub(crate) mod post_process;
pub(crate) mod reflection;

pub use entity_pass::EntityPass;
pub use reflection::CUBE_FACE_ORIENTATIONS;
