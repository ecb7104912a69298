//! Configuration system

pub use serde::{Serialize, Deserialize};

use crate::render::BlendFactor;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }

    /// Parse from a TOML document
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse from a RON document
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Initial state of a [`DebugRenderer`](crate::debug::DebugRenderer)
///
/// Missing fields fall back to [`Default`], so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugRendererConfig {
    /// RGBA colour applied to all debug geometry
    pub colour: [f32; 4],
    /// Line width in pixels
    pub line_size: f32,
    /// Point diameter in pixels
    pub point_size: f32,
    /// Depth-test debug geometry against the scene
    pub depth_enabled: bool,
    /// Shade debug geometry with scene lighting
    pub lighting_enabled: bool,
    /// Alpha-blend debug geometry
    pub blend_enabled: bool,
    /// Source blend factor
    pub blend_src: BlendFactor,
    /// Destination blend factor
    pub blend_dst: BlendFactor,
    /// Vertices each debug mesh reserves up front
    pub initial_vertex_capacity: usize,
    /// Indices each debug mesh reserves up front
    pub initial_index_capacity: usize,
}

impl Default for DebugRendererConfig {
    fn default() -> Self {
        Self {
            colour: [1.0, 1.0, 1.0, 1.0],
            line_size: 1.0,
            point_size: 1.0,
            depth_enabled: true,
            lighting_enabled: false,
            blend_enabled: false,
            blend_src: BlendFactor::SrcAlpha,
            blend_dst: BlendFactor::OneMinusSrcAlpha,
            initial_vertex_capacity: 1024,
            initial_index_capacity: 2048,
        }
    }
}

impl Config for DebugRendererConfig {}
