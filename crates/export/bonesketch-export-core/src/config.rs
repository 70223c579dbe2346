use std::path::{Path, PathBuf};

use bonesketch_api_core::json::read_typed;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

/// Exporter settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Vertex groups captured from meshes deformed by the armature.
    pub vertex_groups: Vec<String>,
    pub export_shape_keys: bool,
    /// Overrides the directory derived from the render output path.
    pub output_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            vertex_groups: vec!["group1".into(), "group2".into(), "group3".into()],
            export_shape_keys: true,
            output_dir: None,
        }
    }
}

impl ExportConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        Ok(read_typed(path)?)
    }
}
