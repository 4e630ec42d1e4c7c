// Biomechanical angle engine: joint angles from keypoints, plus the
// one-frame-lookback elbow monitor used by the bowling action analysis.

use crate::error::AnalysisError;
use crate::pipeline::overlay::{Color, FrameOverlay, OverlayCommand, OverlayWriter};
use crate::pipeline::types::{AnalysisConfig, AnalysisOutput, KeypointSet, Landmark, Point};
use crate::source::FrameSource;
use std::collections::HashMap;
use std::path::Path;

const MIN_POSE_CONFIDENCE: f32 = 0.4;

/// Per-frame elbow-angle delta above which the action is flagged.
pub const ELBOW_DELTA_LIMIT: f32 = 15.0;

/// Interior angle at `joint` in degrees, from the vectors `a - joint` and
/// `c - joint`. A zero-length vector makes the angle undefined; it is
/// reported as 0.0 instead of an error. The cosine is clamped to [-1, 1] to
/// tolerate floating-point overshoot before `acos`.
pub fn joint_angle(a: Point, joint: Point, c: Point) -> f32 {
    let v1 = (a.x - joint.x, a.y - joint.y);
    let v2 = (c.x - joint.x, c.y - joint.y);

    let n1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let n2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }

    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

pub fn point_distance(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// A valid right-arm reading for one identifier in one frame.
#[derive(Debug, Clone, Copy)]
pub struct ElbowReading {
    pub angle: f32,
    pub elbow: Point,
    pub anomaly: bool,
}

/// Tracks the previous elbow angle per identifier and flags abrupt changes.
///
/// One frame of lookback only: the anomaly is a raw per-frame boolean with
/// no smoothing or debouncing, so single-frame keypoint jitter can produce
/// false positives. That is a known property of this detector, not something
/// to paper over here.
#[derive(Debug, Default)]
pub struct BowlingMonitor {
    previous: HashMap<u32, f32>,
}

impl BowlingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the right arm (shoulder, elbow, wrist) for one identifier.
    /// If any of the three landmarks is unobserved the frame is skipped
    /// entirely: nothing is flagged and the stored angle is left untouched.
    pub fn observe(
        &mut self,
        track_id: u32,
        keypoints: &KeypointSet,
        min_confidence: f32,
    ) -> Option<ElbowReading> {
        let shoulder = keypoints.observed(Landmark::RightShoulder, min_confidence)?;
        let elbow = keypoints.observed(Landmark::RightElbow, min_confidence)?;
        let wrist = keypoints.observed(Landmark::RightWrist, min_confidence)?;

        let angle = joint_angle(shoulder, elbow, wrist);
        let anomaly = self
            .previous
            .get(&track_id)
            .is_some_and(|prev| (prev - angle).abs() > ELBOW_DELTA_LIMIT);
        self.previous.insert(track_id, angle);

        Some(ElbowReading {
            angle,
            elbow,
            anomaly,
        })
    }
}

/// Bowling action analysis: flag possible illegal actions per identifier.
pub fn pose_analysis(
    source: &mut dyn FrameSource,
    out_dir: &Path,
    config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let mut monitor = BowlingMonitor::new();
    let mut writer = OverlayWriter::create(out_dir.join("pose_overlays.jsonl"))?;
    let mut anomaly_frames = 0usize;

    while let Some(frame) = source.next_frame()? {
        let mut commands = Vec::new();

        for det in frame
            .detections
            .iter()
            .filter(|d| d.is_person() && d.confidence >= MIN_POSE_CONFIDENCE)
        {
            let (Some(track_id), Some(keypoints)) = (det.track_id, det.keypoints.as_ref()) else {
                continue;
            };
            let Some(reading) = monitor.observe(track_id, keypoints, config.keypoint_confidence)
            else {
                continue;
            };

            if reading.anomaly {
                anomaly_frames += 1;
                commands.push(OverlayCommand::Text {
                    text: "POSSIBLE CHUCK".to_string(),
                    x: reading.elbow.x,
                    y: reading.elbow.y - 20.0,
                    color: Color::RED,
                    scale: 0.7,
                    thickness: 2,
                });
            }
            commands.push(OverlayCommand::Circle {
                x: reading.elbow.x,
                y: reading.elbow.y,
                radius: 5,
                color: Color::YELLOW,
                filled: true,
            });
        }

        writer.push(&FrameOverlay {
            frame_index: frame.frame_index,
            commands,
        })?;
    }

    tracing::info!(
        "pose: {} annotated frames, {} anomaly flags",
        writer.frames_written(),
        anomaly_frames
    );
    let path = writer.finish()?;
    Ok(AnalysisOutput::Artifact {
        name: "Pose Analysis".to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::Keypoint;

    fn pt(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    fn right_arm(shoulder: (f32, f32), elbow: (f32, f32), wrist: (f32, f32)) -> KeypointSet {
        let mut pts = [Keypoint {
            x: 1.0,
            y: 1.0,
            confidence: 1.0,
        }; 17];
        for (landmark, (x, y)) in [
            (Landmark::RightShoulder, shoulder),
            (Landmark::RightElbow, elbow),
            (Landmark::RightWrist, wrist),
        ] {
            pts[landmark.index()] = Keypoint {
                x,
                y,
                confidence: 1.0,
            };
        }
        KeypointSet(pts)
    }

    #[test]
    fn coincident_points_give_zero_angle() {
        let joint = pt(5.0, 5.0);
        assert_eq!(joint_angle(joint, joint, pt(10.0, 5.0)), 0.0);
        assert_eq!(joint_angle(pt(10.0, 5.0), joint, joint), 0.0);
    }

    #[test]
    fn straight_line_is_one_eighty() {
        let angle = joint_angle(pt(0.0, 0.0), pt(5.0, 0.0), pt(10.0, 0.0));
        assert!((angle - 180.0).abs() < 1e-3, "got {angle}");
    }

    #[test]
    fn perpendicular_arms_are_ninety() {
        let angle = joint_angle(pt(0.0, 0.0), pt(0.0, 5.0), pt(5.0, 5.0));
        assert!((angle - 90.0).abs() < 1e-3, "got {angle}");
    }

    #[test]
    fn first_valid_frame_never_flags() {
        let mut monitor = BowlingMonitor::new();
        let reading = monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.0)), 0.25)
            .unwrap();
        assert!(!reading.anomaly);
    }

    #[test]
    fn abrupt_angle_change_flags_anomaly() {
        let mut monitor = BowlingMonitor::new();
        // straight arm: 180 degrees
        monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.0)), 0.25)
            .unwrap();
        // bent to 90 degrees: delta 90 > 15
        let reading = monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (5.0, 5.0)), 0.25)
            .unwrap();
        assert!(reading.anomaly);
        assert!((reading.angle - 90.0).abs() < 1e-3);
    }

    #[test]
    fn small_angle_change_stays_quiet() {
        let mut monitor = BowlingMonitor::new();
        monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.0)), 0.25)
            .unwrap();
        // ~175.2 degrees, delta under the limit
        let reading = monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.42)), 0.25)
            .unwrap();
        assert!(!reading.anomaly);
    }

    #[test]
    fn unobserved_landmark_skips_without_touching_history() {
        let mut monitor = BowlingMonitor::new();
        monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.0)), 0.25)
            .unwrap();

        // Wrist reported at the origin: not observed, frame skipped
        let skipped = monitor.observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (0.0, 0.0)), 0.25);
        assert!(skipped.is_none());

        // The stored angle is still the straight arm, so a later 90-degree
        // frame flags against it.
        let reading = monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (5.0, 5.0)), 0.25)
            .unwrap();
        assert!(reading.anomaly);
    }

    #[test]
    fn identifiers_keep_separate_histories() {
        let mut monitor = BowlingMonitor::new();
        monitor
            .observe(1, &right_arm((0.0, 0.0), (5.0, 0.0), (10.0, 0.0)), 0.25)
            .unwrap();
        // First frame for identifier 2, despite identifier 1's history
        let reading = monitor
            .observe(2, &right_arm((0.0, 0.0), (5.0, 0.0), (5.0, 5.0)), 0.25)
            .unwrap();
        assert!(!reading.anomaly);
    }
}
