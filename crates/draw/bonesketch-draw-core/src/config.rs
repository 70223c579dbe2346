use std::path::{Path, PathBuf};

use bonesketch_api_core::json::read_typed;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::DrawError;

/// Renderer settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Canvas fill before the first instruction.
    pub background: Color,
    /// Appended to the input stem when naming rendered images.
    pub output_suffix: String,
    pub preview_max_width: u32,
    pub preview_max_height: u32,
    /// Searched before the system font directories.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            background: Color::WHITE,
            output_suffix: "_draw".into(),
            preview_max_width: 800,
            preview_max_height: 800,
            font_dirs: Vec::new(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DrawError> {
        Ok(read_typed(path)?)
    }
}
