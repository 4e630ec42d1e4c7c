// Kinematic estimator: trajectory deltas to speeds and intensity bands.

use crate::error::AnalysisError;
use crate::pipeline::tracker::TrackStore;
use crate::pipeline::types::{AnalysisConfig, AnalysisOutput};
use crate::source::FrameSource;
use serde::Serialize;
use std::path::Path;

const MIN_SPEED_CONFIDENCE: f32 = 0.3;
const FPS_FALLBACK: f64 = 30.0;

/// Movement intensity bands over instantaneous speed in m/s.
/// Half-open, lower-inclusive: they partition [0, inf).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Walking,
    Jogging,
    Sprinting,
}

impl Intensity {
    pub fn classify(speed_mps: f32) -> Self {
        if speed_mps < 2.0 {
            Intensity::Walking
        } else if speed_mps < 5.0 {
            Intensity::Jogging
        } else {
            Intensity::Sprinting
        }
    }
}

/// Band shares as integer percentages of all samples. Truncating, so the
/// three values may sum to slightly under 100; that shortfall is part of the
/// reported format and is not corrected here.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct IntensityDistribution {
    pub walking: u8,
    pub jogging: u8,
    pub sprinting: u8,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SpeedReport {
    pub average_speed: f32,
    pub max_speed: f32,
    pub intensity: IntensityDistribution,
}

/// Per-track speed statistics, exported to `track_speeds.csv`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TrackSpeed {
    pub track_id: u32,
    pub samples: usize,
    pub mean_mps: f32,
    pub max_mps: f32,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Fold completed tracks into the run's speed report.
///
/// Needs the full trajectories: per-track mean/max require end-of-run data,
/// so this runs after the frame loop, not inside it. Tracks with fewer than
/// two samples contribute nothing. With no samples at all, every output is
/// zero-valued rather than an error.
pub fn summarize(
    store: &TrackStore,
    fps: f64,
    pixels_per_meter: f32,
) -> (SpeedReport, Vec<TrackSpeed>) {
    let mut per_track = Vec::new();
    let mut band_counts = [0usize; 3];
    let mut total_samples = 0usize;

    for (track_id, points) in store.iter() {
        if points.len() < 2 {
            continue;
        }

        let mut speeds = Vec::with_capacity(points.len() - 1);
        for pair in points.windows(2) {
            let dx = pair[1].x - pair[0].x;
            let dy = pair[1].y - pair[0].y;
            let dist_px = (dx * dx + dy * dy).sqrt();
            let speed_mps = dist_px / pixels_per_meter * fps as f32;

            match Intensity::classify(speed_mps) {
                Intensity::Walking => band_counts[0] += 1,
                Intensity::Jogging => band_counts[1] += 1,
                Intensity::Sprinting => band_counts[2] += 1,
            }
            total_samples += 1;
            speeds.push(speed_mps);
        }

        let mean = speeds.iter().sum::<f32>() / speeds.len() as f32;
        let max = speeds.iter().copied().fold(f32::MIN, f32::max);
        per_track.push(TrackSpeed {
            track_id,
            samples: speeds.len(),
            mean_mps: mean,
            max_mps: max,
        });
    }

    let average_speed = if per_track.is_empty() {
        0.0
    } else {
        per_track.iter().map(|t| t.mean_mps).sum::<f32>() / per_track.len() as f32
    };
    let max_speed = per_track
        .iter()
        .map(|t| t.max_mps)
        .fold(0.0f32, f32::max);

    let intensity = if total_samples > 0 {
        let pct = |count: usize| ((count as f64 / total_samples as f64) * 100.0) as u8;
        IntensityDistribution {
            walking: pct(band_counts[0]),
            jogging: pct(band_counts[1]),
            sprinting: pct(band_counts[2]),
        }
    } else {
        IntensityDistribution::default()
    };

    (
        SpeedReport {
            average_speed: round2(average_speed),
            max_speed: round2(max_speed),
            intensity,
        },
        per_track,
    )
}

/// Speed analysis: build trajectories over the whole capture, then report
/// inline metrics and export per-track statistics.
pub fn speed_analysis(
    source: &mut dyn FrameSource,
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let fps = match source.info().fps {
        fps if fps > 0.0 => fps,
        _ => FPS_FALLBACK,
    };

    let mut store = TrackStore::new();
    while let Some(frame) = source.next_frame()? {
        store.observe(
            frame
                .detections
                .iter()
                .filter(|d| d.is_person() && d.confidence >= MIN_SPEED_CONFIDENCE),
        );
    }

    let (report, per_track) = summarize(&store, fps, config.pixels_per_meter);

    let csv_path = out_dir.join("track_speeds.csv");
    let mut csv = csv::Writer::from_path(&csv_path)?;
    for row in &per_track {
        csv.serialize(row)?;
    }
    csv.flush()?;

    tracing::info!(
        "speed: {} tracks, avg {:.2} m/s, max {:.2} m/s",
        per_track.len(),
        report.average_speed,
        report.max_speed
    );

    Ok(AnalysisOutput::Metrics {
        name: "Player Speed Analysis".to_string(),
        data: report,
    })
}
