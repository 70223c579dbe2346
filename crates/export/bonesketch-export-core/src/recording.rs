//! A scene captured to JSON: a base state plus sparse per-frame overrides.
//!
//! ```json
//! {
//!   "frame_start": 1, "frame_end": 3,
//!   "render": {"resolution_x": 640, "resolution_y": 480, "filepath": "out/"},
//!   "armature": {"name": "Armature", "bones": [...]},
//!   "camera": {"type": "PERSP", "location": [0, -10, 0], "rotation_euler": [1.5708, 0, 0]},
//!   "meshes": [...],
//!   "frames": {
//!     "2": {"bones": {"hand.L": {"head": [1, 0, 1], "tail": [1, 0, 2]}}},
//!     "3": {"camera": null}
//!   }
//! }
//! ```
//!
//! Overrides are not cumulative: frame N is the base state with frame N's
//! override applied. `"camera": null` removes the camera for that frame.

use std::collections::BTreeMap;
use std::path::Path;

use bonesketch_api_core::json::read_typed;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExportError;
use crate::scene::{
    Armature, CameraObject, FrameRange, Mesh, RenderSettings, SceneSource, SceneState,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonePose {
    pub head: [f64; 3],
    pub tail: [f64; 3],
}

/// Changes applied on top of the base state for one frame. Absent fields keep
/// the base value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameOverride {
    #[serde(deserialize_with = "present")]
    pub armature: Option<Option<Armature>>,
    pub bones: IndexMap<String, BonePose>,
    #[serde(deserialize_with = "present")]
    pub camera: Option<Option<CameraObject>>,
    pub meshes: Option<Vec<Mesh>>,
    pub render: Option<RenderSettings>,
}

// Distinguishes a key given as `null` (Some(None)) from a missing key (None).
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneRecording {
    #[serde(default = "default_frame_start")]
    pub frame_start: i32,
    #[serde(default)]
    pub frame_end: Option<i32>,
    #[serde(default = "default_frame_step")]
    pub frame_step: i32,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub armature: Option<Armature>,
    #[serde(default)]
    pub camera: Option<CameraObject>,
    #[serde(default)]
    pub meshes: Vec<Mesh>,
    #[serde(default)]
    pub frames: BTreeMap<i32, FrameOverride>,
}

fn default_frame_start() -> i32 {
    1
}

fn default_frame_step() -> i32 {
    1
}

/// `SceneSource` backed by a `SceneRecording`.
#[derive(Debug, Clone)]
pub struct RecordedScene {
    recording: SceneRecording,
}

impl RecordedScene {
    pub fn new(recording: SceneRecording) -> Result<Self, ExportError> {
        if recording.frame_step <= 0 {
            return Err(ExportError::InvalidFrameStep(recording.frame_step));
        }
        let range = frame_range_of(&recording);
        if range.end < range.start {
            return Err(ExportError::Recording(format!(
                "frame_end {} is before frame_start {}",
                range.end, range.start
            )));
        }
        Ok(RecordedScene { recording })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let recording: SceneRecording = read_typed(path)?;
        Self::new(recording)
    }

    pub fn recording(&self) -> &SceneRecording {
        &self.recording
    }

    fn base_state(&self) -> SceneState {
        SceneState {
            armature: self.recording.armature.clone(),
            camera: self.recording.camera.clone(),
            meshes: self.recording.meshes.clone(),
            render: self.recording.render.clone(),
        }
    }
}

fn frame_range_of(recording: &SceneRecording) -> FrameRange {
    let start = recording.frame_start;
    // frames listed beyond the start imply the end when it is not given
    let end = recording.frame_end.unwrap_or_else(|| {
        recording
            .frames
            .keys()
            .next_back()
            .copied()
            .map_or(start, |last| last.max(start))
    });
    FrameRange::new(start, end, recording.frame_step)
}

impl SceneSource for RecordedScene {
    fn frame_range(&self) -> FrameRange {
        frame_range_of(&self.recording)
    }

    fn state_at(&mut self, frame: i32) -> Result<SceneState, ExportError> {
        let range = self.frame_range();
        if frame < range.start || frame > range.end {
            return Err(ExportError::FrameOutOfRange {
                frame,
                start: range.start,
                end: range.end,
            });
        }
        let mut state = self.base_state();
        if let Some(ov) = self.recording.frames.get(&frame) {
            apply_override(&mut state, ov, frame);
        }
        Ok(state)
    }
}

fn apply_override(state: &mut SceneState, ov: &FrameOverride, frame: i32) {
    if let Some(armature) = &ov.armature {
        state.armature = armature.clone();
    }
    if !ov.bones.is_empty() {
        match state.armature.as_mut() {
            Some(armature) => {
                for (name, pose) in &ov.bones {
                    match armature.bone_mut(name) {
                        Some(bone) => {
                            bone.head = pose.head;
                            bone.tail = pose.tail;
                        }
                        None => log::warn!("frame {frame}: pose for unknown bone '{name}' ignored"),
                    }
                }
            }
            None => log::warn!("frame {frame}: bone poses given but the scene has no armature"),
        }
    }
    if let Some(camera) = &ov.camera {
        state.camera = camera.clone();
    }
    if let Some(meshes) = &ov.meshes {
        state.meshes = meshes.clone();
    }
    if let Some(render) = &ov.render {
        state.render = render.clone();
    }
}
