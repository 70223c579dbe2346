//! Scene state as the host application reports it for one frame.
//!
//! Matrices are row-major 4x4 arrays (`matrix[row][col]`), translation in the
//! last column, matching how hosts usually print them. Bone heads and tails are
//! in armature space; mesh vertices are in object space.

use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

pub type RowMatrix = [[f64; 4]; 4];

pub fn identity_rows() -> RowMatrix {
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

pub fn to_matrix(rows: &RowMatrix) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}

/// Apply an affine world matrix to a point.
pub fn transform_point(matrix: &Matrix4<f64>, p: [f64; 3]) -> Vector3<f64> {
    matrix.transform_point(&Point3::new(p[0], p[1], p[2])).coords
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseBone {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    pub head: [f64; 3],
    pub tail: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armature {
    pub name: String,
    #[serde(default = "identity_rows")]
    pub matrix_world: RowMatrix,
    #[serde(default)]
    pub bones: Vec<PoseBone>,
}

impl Armature {
    pub fn world(&self) -> Matrix4<f64> {
        to_matrix(&self.matrix_world)
    }

    pub fn bone(&self, name: &str) -> Option<&PoseBone> {
        self.bones.iter().find(|b| b.name == name)
    }

    pub fn bone_mut(&mut self, name: &str) -> Option<&mut PoseBone> {
        self.bones.iter_mut().find(|b| b.name == name)
    }

    /// Bones naming `name` as parent, in declaration order.
    pub fn children_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a PoseBone> + 'a {
        self.bones
            .iter()
            .filter(move |b| b.parent.as_deref() == Some(name))
    }

    /// Bones without a parent. A parent name that matches no bone also makes
    /// the bone a root, otherwise it would be unreachable.
    pub fn roots(&self) -> impl Iterator<Item = &PoseBone> + '_ {
        self.bones.iter().filter(|b| match b.parent.as_deref() {
            None => true,
            Some(parent) => self.bone(parent).is_none(),
        })
    }
}

/// Projection model of a camera. Unrecognized host types are kept by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CameraKind {
    Persp,
    Ortho,
    Other(String),
}

impl From<String> for CameraKind {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PERSP" | "PERSPECTIVE" => CameraKind::Persp,
            "ORTHO" | "ORTHOGRAPHIC" => CameraKind::Ortho,
            _ => CameraKind::Other(s),
        }
    }
}

impl From<CameraKind> for String {
    fn from(kind: CameraKind) -> Self {
        match kind {
            CameraKind::Persp => "PERSP".to_string(),
            CameraKind::Ortho => "ORTHO".to_string(),
            CameraKind::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorFit {
    #[default]
    Auto,
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraObject {
    #[serde(rename = "type", default = "default_camera_kind")]
    pub kind: CameraKind,
    pub location: [f64; 3],
    /// XYZ Euler rotation in radians.
    #[serde(default)]
    pub rotation_euler: [f64; 3],
    /// Focal length in millimetres.
    #[serde(default = "default_lens")]
    pub lens: f64,
    #[serde(default = "default_sensor_width")]
    pub sensor_width: f64,
    #[serde(default = "default_sensor_height")]
    pub sensor_height: f64,
    #[serde(default)]
    pub sensor_fit: SensorFit,
    #[serde(default = "default_ortho_scale")]
    pub ortho_scale: f64,
    #[serde(default)]
    pub shift_x: f64,
    #[serde(default)]
    pub shift_y: f64,
}

fn default_camera_kind() -> CameraKind {
    CameraKind::Persp
}

fn default_lens() -> f64 {
    50.0
}

fn default_sensor_width() -> f64 {
    36.0
}

fn default_sensor_height() -> f64 {
    24.0
}

fn default_ortho_scale() -> f64 {
    6.0
}

impl CameraObject {
    /// Perspective camera at `location` with the host's default optics.
    pub fn perspective(location: [f64; 3], rotation_euler: [f64; 3]) -> Self {
        CameraObject {
            kind: CameraKind::Persp,
            location,
            rotation_euler,
            lens: default_lens(),
            sensor_width: default_sensor_width(),
            sensor_height: default_sensor_height(),
            sensor_fit: SensorFit::Auto,
            ortho_scale: default_ortho_scale(),
            shift_x: 0.0,
            shift_y: 0.0,
        }
    }

    pub fn orthographic(location: [f64; 3], rotation_euler: [f64; 3], ortho_scale: f64) -> Self {
        CameraObject {
            kind: CameraKind::Ortho,
            ortho_scale,
            ..Self::perspective(location, rotation_euler)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupWeight {
    pub group: usize,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshVertex {
    pub co: [f64; 3],
    /// Position after modifiers (armature deform etc.) for the current frame.
    #[serde(default)]
    pub deformed_co: Option<[f64; 3]>,
    #[serde(default)]
    pub groups: Vec<GroupWeight>,
}

impl MeshVertex {
    pub fn evaluated_co(&self) -> [f64; 3] {
        self.deformed_co.unwrap_or(self.co)
    }

    pub fn weight_in(&self, group: usize) -> Option<f64> {
        self.groups
            .iter()
            .find(|g| g.group == group)
            .map(|g| g.weight)
    }

    /// Member of `group` with a positive weight. Zero-weight assignments
    /// don't count.
    pub fn is_member_of(&self, group: usize) -> bool {
        matches!(self.weight_in(group), Some(w) if w > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeKey {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub name: String,
    /// Name of the armature deforming this mesh, if any.
    #[serde(default)]
    pub armature: Option<String>,
    #[serde(default = "identity_rows")]
    pub matrix_world: RowMatrix,
    /// Vertex group names; a group's index is its position here.
    #[serde(default)]
    pub vertex_groups: Vec<String>,
    #[serde(default)]
    pub vertices: Vec<MeshVertex>,
    #[serde(default)]
    pub edges: Vec<[usize; 2]>,
    #[serde(default)]
    pub shape_keys: Vec<ShapeKey>,
}

impl Mesh {
    pub fn world(&self) -> Matrix4<f64> {
        to_matrix(&self.matrix_world)
    }

    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.vertex_groups.iter().position(|g| g == name)
    }

    pub fn is_deformed_by(&self, armature: &Armature) -> bool {
        self.armature.as_deref() == Some(armature.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub resolution_x: u32,
    pub resolution_y: u32,
    pub resolution_percentage: u32,
    /// Render output path; its directory receives the exported snapshots.
    pub filepath: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            resolution_x: 1920,
            resolution_y: 1080,
            resolution_percentage: 100,
            filepath: String::new(),
        }
    }
}

impl RenderSettings {
    fn scale(&self) -> f64 {
        f64::from(self.resolution_percentage) / 100.0
    }

    /// Output width in pixels after the resolution percentage.
    pub fn scaled_width(&self) -> f64 {
        f64::from(self.resolution_x) * self.scale()
    }

    pub fn scaled_height(&self) -> f64 {
        f64::from(self.resolution_y) * self.scale()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: i32,
    pub end: i32,
    pub step: i32,
}

impl FrameRange {
    pub fn new(start: i32, end: i32, step: i32) -> Self {
        FrameRange { start, end, step }
    }

    /// Frames from `start` to `end` inclusive.
    pub fn frames(&self) -> Result<impl Iterator<Item = i32>, ExportError> {
        let step = usize::try_from(self.step)
            .ok()
            .filter(|s| *s > 0)
            .ok_or(ExportError::InvalidFrameStep(self.step))?;
        Ok((self.start..=self.end).step_by(step))
    }

    pub fn total(&self) -> i32 {
        self.end - self.start + 1
    }
}

/// Everything the exporter reads for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneState {
    pub armature: Option<Armature>,
    pub camera: Option<CameraObject>,
    pub meshes: Vec<Mesh>,
    pub render: RenderSettings,
}

/// Access to a host scene. Implementations position the scene at a frame and
/// report its state.
pub trait SceneSource {
    fn frame_range(&self) -> FrameRange;

    fn state_at(&mut self, frame: i32) -> Result<SceneState, ExportError>;
}
