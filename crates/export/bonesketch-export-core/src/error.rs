use std::path::PathBuf;

use bonesketch_api_core::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame step must be positive, got {0}")]
    InvalidFrameStep(i32),
    #[error("frame {frame} is outside the recorded range {start}..={end}")]
    FrameOutOfRange { frame: i32, start: i32, end: i32 },
    #[error("invalid scene recording: {0}")]
    Recording(String),
}
