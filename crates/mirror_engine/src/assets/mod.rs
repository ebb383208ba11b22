//! Asset loading
//!
//! Simple producers that turn files into data the scene and renderer
//! consume: OBJ geometry, RGBA images and cubemaps, GLSL sources with their
//! declared interface, plus procedural fallbacks for missing models.

use std::path::PathBuf;

use thiserror::Error;

pub mod image_loader;
pub mod obj_loader;
pub mod primitives;
pub mod shader_loader;

pub use image_loader::{load_cubemap_faces, load_texture_image, CUBEMAP_FACE_FILES};
pub use obj_loader::ObjLoader;
pub use shader_loader::{parse_interface, ShaderInterface, ShaderSource};

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset not found
    #[error("Asset not found: {0}")]
    NotFound(PathBuf),

    /// Malformed file contents
    #[error("Parse error in {path}: line {line}: {message}")]
    Parse {
        /// Source file
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Invalid asset data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Image decoding failed
    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for asset loading
pub type AssetResult<T> = Result<T, AssetError>;
