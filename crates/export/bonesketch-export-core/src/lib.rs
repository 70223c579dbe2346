//! bonesketch-export-core: walks a posed skeleton frame by frame, projects it
//! through the active camera and writes one pose snapshot per frame.

pub mod config;
pub mod error;
pub mod exporter;
pub mod projection;
pub mod recording;
pub mod scene;

pub use config::ExportConfig;
pub use error::ExportError;
pub use exporter::{frame_file_name, render_output_dir, ExportSummary, Exporter};
pub use projection::{screen_coords, world_to_camera_view};
pub use recording::{RecordedScene, SceneRecording};
pub use scene::{
    Armature, CameraKind, CameraObject, FrameRange, Mesh, MeshVertex, PoseBone, RenderSettings,
    SceneSource, SceneState, SensorFit, ShapeKey,
};
