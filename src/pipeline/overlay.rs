// Overlay instructions for the downstream rendering layer.
//
// The pipeline does not touch pixels; analyses describe what should be drawn
// on each frame and stream the commands to a JSONL artifact a renderer can
// replay against the source video.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLUE: Color = Color { r: 0, g: 0, b: 255 };
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 255, b: 0 };
    pub const YELLOW: Color = Color {
        r: 255,
        g: 255,
        b: 0,
    };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayCommand {
    Rect {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
        thickness: u32,
    },
    Circle {
        x: f32,
        y: f32,
        radius: u32,
        color: Color,
        filled: bool,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        color: Color,
        scale: f32,
        thickness: u32,
    },
}

/// All overlay commands for one frame.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameOverlay {
    pub frame_index: usize,
    pub commands: Vec<OverlayCommand>,
}

/// Text drawn twice: the colored body plus a thin black pass on top for
/// legibility against arbitrary footage.
pub fn outlined_text(
    text: impl Into<String>,
    x: f32,
    y: f32,
    color: Color,
    scale: f32,
    thickness: u32,
) -> [OverlayCommand; 2] {
    let text = text.into();
    [
        OverlayCommand::Text {
            text: text.clone(),
            x,
            y,
            color,
            scale,
            thickness,
        },
        OverlayCommand::Text {
            text,
            x,
            y,
            color: Color::BLACK,
            scale,
            thickness: (thickness / 2).max(1),
        },
    ]
}

/// Streams frame overlays into a JSONL artifact. Frames with no commands are
/// omitted; the renderer treats absent frames as nothing-to-draw.
pub struct OverlayWriter {
    out: BufWriter<File>,
    path: PathBuf,
    frames_written: usize,
}

impl OverlayWriter {
    pub fn create(path: PathBuf) -> Result<Self, AnalysisError> {
        let out = BufWriter::new(File::create(&path)?);
        Ok(Self {
            out,
            path,
            frames_written: 0,
        })
    }

    pub fn push(&mut self, overlay: &FrameOverlay) -> Result<(), AnalysisError> {
        if overlay.commands.is_empty() {
            return Ok(());
        }
        serde_json::to_writer(&mut self.out, overlay)?;
        self.out.write_all(b"\n")?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    pub fn finish(mut self) -> Result<PathBuf, AnalysisError> {
        self.out.flush()?;
        Ok(self.path)
    }
}
