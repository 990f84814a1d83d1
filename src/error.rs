use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid color {0:?}, expected #RRGGBB")]
    InvalidColor(String),

    #[error("{0} is not a TrueType font")]
    InvalidFont(PathBuf),

    #[error("cannot read font directory {path}: {source}")]
    FontDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session script: {0}")]
    Script(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WatermarkError>;
