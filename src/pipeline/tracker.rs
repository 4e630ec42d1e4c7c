// Trajectory tracker: per-identifier centroid history.

use crate::error::AnalysisError;
use crate::pipeline::overlay::{Color, FrameOverlay, OverlayCommand, OverlayWriter};
use crate::pipeline::types::{AnalysisConfig, AnalysisOutput, Detection, Point};
use crate::source::FrameSource;
use std::collections::BTreeMap;
use std::path::Path;

const MIN_TRACK_CONFIDENCE: f32 = 0.4;

/// Append-only centroid sequences keyed by track identifier.
///
/// Identifiers are only meaningful within one run; a store is created at run
/// start and discarded at run end. Memory grows with frame count times
/// concurrently tracked identifiers; callers bound run length. Gaps (frames
/// where an identifier is not detected) are not interpolated.
#[derive(Debug, Default)]
pub struct TrackStore {
    tracks: BTreeMap<u32, Vec<Point>>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append each identified detection's box centroid to its track.
    /// Detections without a track identifier are silently skipped.
    pub fn observe<'a>(&mut self, detections: impl IntoIterator<Item = &'a Detection>) {
        for det in detections {
            let Some(id) = det.track_id else { continue };
            self.tracks.entry(id).or_default().push(det.bbox.centroid());
        }
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[Point])> {
        self.tracks.iter().map(|(id, pts)| (*id, pts.as_slice()))
    }
}

/// Tracking analysis: accumulate trajectories and emit one box overlay per
/// kept detection.
pub fn tracking_analysis(
    source: &mut dyn FrameSource,
    out_dir: &Path,
    _config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let mut store = TrackStore::new();
    let mut writer = OverlayWriter::create(out_dir.join("tracking_overlays.jsonl"))?;

    while let Some(frame) = source.next_frame()? {
        let kept: Vec<&Detection> = frame
            .detections
            .iter()
            .filter(|d| d.is_person() && d.confidence >= MIN_TRACK_CONFIDENCE)
            .collect();

        let commands = kept
            .iter()
            .map(|d| OverlayCommand::Rect {
                x1: d.bbox.x1,
                y1: d.bbox.y1,
                x2: d.bbox.x2,
                y2: d.bbox.y2,
                color: Color::BLUE,
                thickness: 2,
            })
            .collect();

        store.observe(kept);
        writer.push(&FrameOverlay {
            frame_index: frame.frame_index,
            commands,
        })?;
    }

    tracing::info!(
        "tracking: {} identifiers over {} annotated frames",
        store.track_count(),
        writer.frames_written()
    );
    let path = writer.finish()?;
    Ok(AnalysisOutput::Artifact {
        name: "Player Tracking".to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::BBox;

    fn det(track_id: Option<u32>, x1: f32, y1: f32) -> Detection {
        Detection {
            bbox: BBox {
                x1,
                y1,
                x2: x1 + 10.0,
                y2: y1 + 20.0,
            },
            track_id,
            confidence: 0.9,
            class_name: Some("person".into()),
            keypoints: None,
        }
    }

    #[test]
    fn appends_centroids_per_identifier() {
        let mut store = TrackStore::new();
        store.observe(&[det(Some(1), 0.0, 0.0), det(Some(2), 100.0, 100.0)]);
        store.observe(&[det(Some(1), 10.0, 0.0)]);

        let tracks: Vec<_> = store.iter().collect();
        assert_eq!(tracks.len(), 2);
        let (id, points) = tracks[0];
        assert_eq!(id, 1);
        assert_eq!(points, &[Point { x: 5.0, y: 10.0 }, Point { x: 15.0, y: 10.0 }]);
    }

    #[test]
    fn unidentified_detections_are_skipped() {
        let mut store = TrackStore::new();
        store.observe(&[det(None, 0.0, 0.0), det(Some(7), 0.0, 0.0)]);
        assert_eq!(store.track_count(), 1);
    }

    #[test]
    fn gaps_are_not_interpolated() {
        let mut store = TrackStore::new();
        store.observe(&[det(Some(1), 0.0, 0.0), det(Some(2), 0.0, 0.0)]);
        // identifier 2 misses this frame
        store.observe(&[det(Some(1), 10.0, 0.0)]);
        store.observe(&[det(Some(1), 20.0, 0.0), det(Some(2), 30.0, 0.0)]);

        let by_id: std::collections::BTreeMap<u32, usize> =
            store.iter().map(|(id, pts)| (id, pts.len())).collect();
        assert_eq!(by_id[&1], 3);
        assert_eq!(by_id[&2], 2);
    }
}
