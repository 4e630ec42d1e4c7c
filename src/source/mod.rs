pub mod jsonl;

use crate::error::AnalysisError;
use crate::pipeline::types::{CaptureInfo, FrameObservations};
use std::path::PathBuf;

/// A readable stream of per-frame model output, in capture order.
pub trait FrameSource: Send {
    fn info(&self) -> &CaptureInfo;
    /// Next frame's observations, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<FrameObservations>, AnalysisError>;
}

/// Opens a fresh `FrameSource` per analysis. Each analysis re-reads the
/// capture through its own instance, so analyses never share reader state.
pub trait SourceFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameSource>, AnalysisError>;
}

/// Factory over a capture file on disk.
pub struct CaptureFile {
    path: PathBuf,
}

impl CaptureFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourceFactory for CaptureFile {
    fn open(&self) -> Result<Box<dyn FrameSource>, AnalysisError> {
        Ok(Box::new(jsonl::JsonlSource::open(&self.path)?))
    }
}

/// In-memory capture, for tests and embedding: substitutes for the external
/// recognition model without touching disk.
#[derive(Clone)]
pub struct Replay {
    pub info: CaptureInfo,
    pub frames: Vec<FrameObservations>,
}

impl SourceFactory for Replay {
    fn open(&self) -> Result<Box<dyn FrameSource>, AnalysisError> {
        Ok(Box::new(ReplaySource {
            info: self.info.clone(),
            frames: self.frames.clone().into_iter(),
        }))
    }
}

struct ReplaySource {
    info: CaptureInfo,
    frames: std::vec::IntoIter<FrameObservations>,
}

impl FrameSource for ReplaySource {
    fn info(&self) -> &CaptureInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<FrameObservations>, AnalysisError> {
        Ok(self.frames.next())
    }
}
