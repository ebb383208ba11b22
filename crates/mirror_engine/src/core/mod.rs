//! # Core Engine Module
//!
//! Shared configuration used by the renderer and the application.
//!
//! ## Organization
//!
//! - **Config**: Unified configuration for window, renderer, assets and logging

pub mod config;

// Re-export commonly used config types
pub use config::{
    ApplicationConfig,
    EngineConfig,
    WindowConfig,
    RendererConfig,
    AssetConfig,
};
