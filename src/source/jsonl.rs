// JSONL capture reader.
//
// A capture file is the serialized output of the external recognition model:
// the first non-empty line is a `CaptureInfo` header, every following line
// is one frame's `FrameObservations`.

use crate::error::AnalysisError;
use crate::pipeline::types::{CaptureInfo, FrameObservations};
use crate::source::FrameSource;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

#[derive(Debug)]
pub struct JsonlSource {
    info: CaptureInfo,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl JsonlSource {
    pub fn open(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            return Err(AnalysisError::CaptureNotFound(path.to_path_buf()));
        }

        let file = File::open(path)?;
        let mut lines = BufReader::new(file).lines();
        let mut line_no = 0;

        let header = loop {
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    break line;
                }
                None => {
                    return Err(AnalysisError::MalformedCapture(
                        "missing capture header line".into(),
                    ))
                }
            }
        };

        let info: CaptureInfo = serde_json::from_str(header.trim())
            .map_err(|e| AnalysisError::MalformedCapture(format!("bad header: {e}")))?;

        Ok(Self {
            info,
            lines,
            line_no,
        })
    }
}

impl FrameSource for JsonlSource {
    fn info(&self) -> &CaptureInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<FrameObservations>, AnalysisError> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            let line = line?;
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            return serde_json::from_str(trimmed).map(Some).map_err(|e| {
                AnalysisError::MalformedCapture(format!("line {}: {e}", self.line_no))
            });
        }
    }
}
