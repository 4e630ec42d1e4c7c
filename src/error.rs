use std::path::PathBuf;
use thiserror::Error;

/// Error returned from a single analysis invocation.
///
/// The run-level aggregator logs these and drops the failed analysis from
/// the result set; sibling analyses are unaffected.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("capture not found: {0}")]
    CaptureNotFound(PathBuf),

    #[error("malformed capture: {0}")]
    MalformedCapture(String),

    #[error("capture contained no frames")]
    EmptyCapture,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}
