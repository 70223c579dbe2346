use std::path::PathBuf;

use bonesketch_api_core::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrimError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("rename table, line {line}: {reason}")]
    Csv { line: u64, reason: String },
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document has no 'bones' object")]
    NoBones,
    #[error("cannot create directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<csv::Error> for TrimError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, |p| p.line());
        TrimError::Csv {
            line,
            reason: err.to_string(),
        }
    }
}
