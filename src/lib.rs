//! QPlayer Preview - scene graph and forward renderer for the 3D preview pane
//!
//! The host UI owns the graphics context and implements [`backend::RenderBackend`]
//! against it. This crate keeps the scene and turns it into a sorted, batched
//! stream of backend commands each frame.
//!
//! # Features
//! - Retained-mode [`scene::SceneGraph`] with cached world transforms and bounds
//! - Ray picking against mesh triangles
//! - Materials with blend/depth/cull state and render queues
//! - WGSL shader validation and uniform reflection
//! - Forward [`renderer::Renderer`] that sorts by render queue and skips
//!   redundant state changes
//! - [`backend::RecordingBackend`] for headless rendering and tests

pub mod backend;
pub mod error;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use backend::{RecordingBackend, RenderBackend};
pub use error::{ConfigError, MeshError, RenderError, SceneError, ShaderError, TextureError};
pub use renderer::{FrameStats, Renderer};
pub use resources::Assets;
pub use scene::{Camera, SceneGraph, SharedScene, Transform};

use serde::Deserialize;
use std::path::Path;

/// Configuration for the preview renderer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Colour the frame is cleared to
    pub clear_color: [f32; 4],
    /// Skip objects whose world bounds are outside the camera frustum
    pub frustum_culling: bool,
    /// Sort opaque draws front-to-back after grouping by shader and material
    pub sort_opaque_by_distance: bool,
    /// Log a summary line every N frames (0 disables)
    pub stats_log_interval: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.1, 0.1, 0.12, 1.0],
            frustum_culling: true,
            sort_opaque_by_distance: false,
            stats_log_interval: 0,
        }
    }
}

impl RendererConfig {
    /// Parse a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Load a configuration from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_ron_str(&text)?;
        log::debug!("Loaded renderer config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_fill_missing_fields() {
        let config = RendererConfig::from_ron_str("(frustum_culling: false)").unwrap();
        assert!(!config.frustum_culling);
        assert_eq!(config.clear_color, RendererConfig::default().clear_color);
    }

    #[test]
    fn config_rejects_garbage() {
        let err = RendererConfig::from_ron_str("(frustum_culling: 12").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn config_load_missing_file() {
        let err = RendererConfig::load("/definitely/not/here.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
