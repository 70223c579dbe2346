//! bonesketch-api-core: pose snapshot model and constant namespace shared by
//! the exporter, the drawing interpreter and the trimmer.

pub mod json;
pub mod namespace;
pub mod scalar;
pub mod snapshot;

pub use json::ApiError;
pub use namespace::ConstantNamespace;
pub use scalar::{Scalar, ScalarKind};
pub use snapshot::{
    is_reserved_section, BoneRecord, CameraRecord, EdgeRecord, PoseSnapshot, ShapeKeyEntry,
    VertexGroupRecord, VertexRecord, OFFSCREEN, RESERVED_SECTIONS,
};
