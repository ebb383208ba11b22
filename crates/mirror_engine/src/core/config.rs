//! # Unified Configuration System
//!
//! All configuration structures in one place. Every section has defaults
//! matching the showcase scene, so a missing or partial file still yields a
//! usable configuration.
//!
//! ## Configuration Categories
//!
//! - **Engine Config**: logging
//! - **Window Config**: size, title, vsync, cursor capture
//! - **Renderer Config**: multisampling, reflection resolution, clear colors
//! - **Asset Config**: asset and shader directories

use serde::{Serialize, Deserialize};
use std::path::PathBuf;

use crate::config::{Config, ConfigError};

/// # Engine Configuration
///
/// Core behavior shared by every subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter, overridable through `RUST_LOG`
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Window Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial framebuffer width
    pub width: u32,
    /// Initial framebuffer height
    pub height: u32,
    /// Wait for vertical blank on buffer swap
    pub vsync: bool,
    /// Start on the primary monitor in fullscreen
    pub fullscreen: bool,
    /// Hide and lock the cursor for mouse look
    pub capture_cursor: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Mirror Engine".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            fullscreen: false,
            capture_cursor: true,
        }
    }
}

/// # Renderer Configuration
///
/// Settings consumed by [`crate::render::Renderer`] at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Sample count of the offscreen target, clamped to the device maximum
    pub msaa_samples: u32,
    /// Edge length in pixels of each reflection cubemap face
    pub reflection_resolution: u32,
    /// Clear color of the offscreen target
    pub clear_color: [f32; 4],
    /// Clear color of the default framebuffer before the resolve quad
    pub screen_clear_color: [f32; 4],
    /// Whether reflection capture starts enabled
    pub reflections: bool,
    /// Segments per great circle when drawing bounding spheres
    pub sphere_segments: u32,
}

impl RendererConfig {
    /// Set the multisample count
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.msaa_samples = samples;
        self
    }

    /// Set the reflection cubemap resolution
    pub fn with_reflection_resolution(mut self, resolution: u32) -> Self {
        self.reflection_resolution = resolution;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.msaa_samples == 0 {
            return Err(ConfigError::Invalid("msaa_samples must be at least 1".to_string()));
        }
        if !self.reflection_resolution.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "reflection_resolution must be a power of two, got {}",
                self.reflection_resolution
            )));
        }
        if self.sphere_segments < 3 {
            return Err(ConfigError::Invalid("sphere_segments must be at least 3".to_string()));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            msaa_samples: 16,
            reflection_resolution: 2048,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            screen_clear_color: [0.5, 0.5, 0.5, 0.5],
            reflections: false,
            sphere_segments: 100,
        }
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Base directory for models and textures
    pub root: PathBuf,
    /// Directory holding one sub-directory per shader program
    pub shader_dir: PathBuf,
}

impl AssetConfig {
    /// Resolve a path relative to the asset root
    pub fn resolve(&self, relative: impl AsRef<std::path::Path>) -> PathBuf {
        self.root.join(relative)
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("resources"),
            shader_dir: PathBuf::from("shaders"),
        }
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Window configuration
    pub window: WindowConfig,
    /// Rendering system configuration
    pub renderer: RendererConfig,
    /// Asset locations
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        self.renderer.validate()
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_showcase() {
        let config = ApplicationConfig::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.renderer.msaa_samples, 16);
        assert_eq!(config.renderer.reflection_resolution, 2048);
        assert!(!config.renderer.reflections);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let text = r#"
            [renderer]
            msaa_samples = 4

            [window]
            title = "Test"
        "#;
        let config: ApplicationConfig = toml::from_str(text).unwrap();
        assert_eq!(config.renderer.msaa_samples, 4);
        assert_eq!(config.renderer.reflection_resolution, 2048);
        assert_eq!(config.window.title, "Test");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.engine.log_level, "info");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ApplicationConfig::default();
        config.renderer.reflection_resolution = 1000;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ApplicationConfig::default();
        config.window.height = 0;
        assert!(config.validate().is_err());

        let config = RendererConfig::default().with_samples(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("mirror_engine_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mirror.toml");

        let mut config = ApplicationConfig::default();
        config.renderer = config.renderer.with_reflection_resolution(512);
        config.save_to_file(&path).unwrap();

        let loaded = ApplicationConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = ApplicationConfig::load_from_file("settings.ini");
        assert!(result.is_err());
        let missing = ApplicationConfig::load_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(missing, ApplicationConfig::default());
    }
}
