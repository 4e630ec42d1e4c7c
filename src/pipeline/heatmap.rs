// Per-identifier occupancy heatmaps rendered to PNG artifacts.

use crate::error::AnalysisError;
use crate::pipeline::types::{AnalysisConfig, AnalysisOutput, Point};
use crate::source::FrameSource;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const MIN_HEAT_CONFIDENCE: f32 = 0.3;
const STAMP_RADIUS: i32 = 10;
const BLUR_SIGMA: f32 = 5.0;

/// Accumulates one occupancy buffer per track identifier by stamping a
/// filled disc at each detection centroid.
pub struct HeatmapBuilder {
    width: u32,
    height: u32,
    maps: BTreeMap<u32, Vec<f32>>,
}

impl HeatmapBuilder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            maps: BTreeMap::new(),
        }
    }

    /// Stamp one centroid. Out-of-frame centroids are dropped.
    pub fn stamp(&mut self, track_id: u32, center: Point) {
        let (w, h) = (self.width as i32, self.height as i32);
        let (cx, cy) = (center.x as i32, center.y as i32);
        if cx < 0 || cx >= w || cy < 0 || cy >= h {
            return;
        }

        let map = self
            .maps
            .entry(track_id)
            .or_insert_with(|| vec![0.0; (self.width * self.height) as usize]);

        for dy in -STAMP_RADIUS..=STAMP_RADIUS {
            for dx in -STAMP_RADIUS..=STAMP_RADIUS {
                if dx * dx + dy * dy > STAMP_RADIUS * STAMP_RADIUS {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if x < 0 || x >= w || y < 0 || y >= h {
                    continue;
                }
                map[(y * w + x) as usize] = 255.0;
            }
        }
    }

    pub fn player_count(&self) -> usize {
        self.maps.len()
    }

    /// Blur, min-max normalize, and colormap every accumulated buffer into
    /// `dir`, one PNG per identifier.
    pub fn render(&self, dir: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
        fs::create_dir_all(dir)?;
        let (w, h) = (self.width, self.height);
        let mut paths = Vec::with_capacity(self.maps.len());

        for (track_id, map) in &self.maps {
            let gray = GrayImage::from_fn(w, h, |x, y| {
                Luma([map[(y * w + x) as usize].min(255.0) as u8])
            });
            let blurred = image::imageops::blur(&gray, BLUR_SIGMA);

            let (mut lo, mut hi) = (u8::MAX, u8::MIN);
            for pixel in blurred.pixels() {
                lo = lo.min(pixel[0]);
                hi = hi.max(pixel[0]);
            }
            let range = (hi.saturating_sub(lo)).max(1) as f32;

            let colored = RgbImage::from_fn(w, h, |x, y| {
                let v = blurred.get_pixel(x, y)[0];
                let scaled = (((v - lo) as f32 / range) * 255.0) as u8;
                jet(scaled)
            });

            let path = dir.join(format!("player_{track_id}_heatmap.png"));
            colored.save(&path)?;
            paths.push(path);
        }

        Ok(paths)
    }
}

/// Jet-style colormap: low values map toward blue, high toward red.
fn jet(v: u8) -> Rgb<u8> {
    let x = v as f32 / 255.0;
    let channel = |offset: f32| ((1.5 - (4.0 * x - offset).abs()).clamp(0.0, 1.0) * 255.0) as u8;
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Heatmap analysis: accumulate identified centroids over the capture and
/// render one colorized occupancy map per player.
pub fn heatmap_analysis(
    source: &mut dyn FrameSource,
    out_dir: &Path,
    _config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let info = source.info().clone();
    let mut builder = HeatmapBuilder::new(info.width, info.height);
    let mut frames = 0usize;

    while let Some(frame) = source.next_frame()? {
        frames += 1;
        for det in frame
            .detections
            .iter()
            .filter(|d| d.is_person() && d.confidence >= MIN_HEAT_CONFIDENCE)
        {
            let Some(track_id) = det.track_id else { continue };
            builder.stamp(track_id, det.bbox.centroid());
        }
    }

    if frames == 0 {
        return Err(AnalysisError::EmptyCapture);
    }
    tracing::debug!(
        "heatmap: {} identifiers accumulated over {} frames",
        builder.player_count(),
        frames
    );

    let dir = out_dir.join("heatmaps");
    let paths = builder.render(&dir)?;
    tracing::info!("heatmap: wrote {} player maps to {:?}", paths.len(), dir);

    Ok(AnalysisOutput::Artifact {
        name: "Player Heatmaps".to_string(),
        path: dir,
    })
}
