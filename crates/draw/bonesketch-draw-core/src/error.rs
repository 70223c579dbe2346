use std::path::PathBuf;

use bonesketch_api_core::ApiError;
use thiserror::Error;

use crate::color::ColorError;
use crate::expr::ExprError;

#[derive(Debug, Error)]
pub enum DrawError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("expression error: {0}")]
    Expr(#[from] ExprError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("unknown draw_type '{0}'")]
    UnknownDrawType(String),
    #[error("parameter '{name}': {reason}")]
    Param { name: String, reason: String },
    #[error("canvas size: {0}")]
    CanvasSize(String),
    #[error("font '{0}' not found")]
    FontNotFound(String),
    #[error("font file {} is not usable: {reason}", path.display())]
    Font { path: PathBuf, reason: String },
    #[error("bitmap {}: {source}", path.display())]
    Bitmap {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("no custom drawing registered as '{0}'")]
    UnresolvedCustom(String),
    #[error("custom drawing '{key}' failed: {reason}")]
    Custom { key: String, reason: String },
    #[error("cannot decode custom drawing output: {0}")]
    CustomImage(#[source] image::ImageError),
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DrawError {
    pub(crate) fn param(name: &str, reason: impl Into<String>) -> Self {
        DrawError::Param {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
