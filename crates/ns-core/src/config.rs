//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the keys it wants
//! to override:
//!
//! ```json
//! { "link_color": "#1F77B4", "emulator": { "program": "konsole" } }
//! ```

use crate::emulator::EmulatorConfig;
use crate::layout::LayoutConfig;
use crate::model::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the diagram controller and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub layout: LayoutConfig,

    /// Color of newly drawn links. Default: black.
    pub link_color: Color,

    /// Color of newly placed text annotations. Default: black.
    pub text_color: Color,

    /// Distance in canvas units within which a click selects a link.
    pub link_pick_tolerance: f64,

    pub emulator: EmulatorConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            link_color: Color::BLACK,
            text_color: Color::BLACK,
            link_pick_tolerance: 4.0,
            emulator: EmulatorConfig::default(),
        }
    }
}

/// A config file that could not be read or parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }
}
