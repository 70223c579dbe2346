//! Pose snapshot: the per-frame JSON document written by the exporter.
//!
//! Serializes to:
//!   {
//!     "bones":  { "<name>": BoneRecord, ... },
//!     "camera": CameraRecord,
//!     "<vertex group>": VertexGroupRecord, ...
//!     "shape_keys": { "<key>": weight, "shape_keys_<mesh>": { ... } }
//!   }
//! Sections without a source are omitted.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Screen coordinate written for points that cannot be projected.
pub const OFFSCREEN: [i64; 2] = [-1, -1];

/// Top-level keys owned by fixed sections. Vertex groups share the top level
/// and must not use these names.
pub const RESERVED_SECTIONS: [&str; 3] = ["bones", "camera", "shape_keys"];

pub fn is_reserved_section(name: &str) -> bool {
    RESERVED_SECTIONS.contains(&name)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bones: Option<IndexMap<String, BoneRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraRecord>,

    /// Vertex group sections keyed by group name, written at the top level.
    #[serde(flatten)]
    pub vertex_groups: IndexMap<String, VertexGroupRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_keys: Option<IndexMap<String, ShapeKeyEntry>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoneRecord {
    pub global_coords: [f64; 3],
    pub screen_coords: [i64; 2],
    pub tail_global_coords: [f64; 3],
    pub tail_screen_coords: [i64; 2],
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraRecord {
    pub location: [f64; 3],
    pub rotation_euler: [f64; 3],
    pub focal_length: f64,
    pub resolution_x: f64,
    pub resolution_y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexGroupRecord {
    pub vertices: Vec<VertexRecord>,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub vertex_index: usize,
    pub screen_coords: [i64; 2],
    pub global_coords: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub edge_index: usize,
    pub screen_coords: [[i64; 2]; 2],
}

/// A shape key weight, or the weights of an additional mesh nested under
/// `shape_keys_<mesh name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeKeyEntry {
    Weight(f64),
    Mesh(IndexMap<String, f64>),
}

impl PoseSnapshot {
    pub fn is_empty(&self) -> bool {
        self.bones.is_none()
            && self.camera.is_none()
            && self.vertex_groups.is_empty()
            && self.shape_keys.is_none()
    }

    pub fn bone(&self, name: &str) -> Option<&BoneRecord> {
        self.bones.as_ref().and_then(|bones| bones.get(name))
    }

    /// Names of bones without a parent, in snapshot order.
    pub fn root_bones(&self) -> Vec<&str> {
        let Some(bones) = &self.bones else {
            return Vec::new();
        };
        bones
            .keys()
            .filter(|name| {
                !bones
                    .values()
                    .any(|b| b.children.iter().any(|c| c == *name))
            })
            .map(String::as_str)
            .collect()
    }
}
