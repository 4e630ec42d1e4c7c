use crate::pipeline::kinematics::SpeedReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A 2D point in pixel coordinates
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// Axis-aligned bounding box in pixel coordinates
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn centroid(&self) -> Point {
        Point {
            x: (self.x1 + self.x2) / 2.0,
            y: (self.y1 + self.y2) / 2.0,
        }
    }
}

/// One estimated body landmark position with its per-point confidence
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub confidence: f32,
}

/// COCO 17-point landmark layout, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Landmark {
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Fixed-topology keypoint estimate for one detection.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct KeypointSet(pub [Keypoint; 17]);

impl KeypointSet {
    /// Raw landmark position, regardless of observation status.
    pub fn position(&self, landmark: Landmark) -> Point {
        let kp = self.0[landmark.index()];
        Point { x: kp.x, y: kp.y }
    }

    /// Landmark position if observed: a point at exactly (0,0) or below the
    /// per-point confidence threshold counts as not observed.
    pub fn observed(&self, landmark: Landmark, min_confidence: f32) -> Option<Point> {
        let kp = self.0[landmark.index()];
        if (kp.x == 0.0 && kp.y == 0.0) || kp.confidence < min_confidence {
            return None;
        }
        Some(Point { x: kp.x, y: kp.y })
    }
}

/// One detection emitted by the upstream recognition model.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Detection {
    pub bbox: BBox,
    #[serde(default)]
    pub track_id: Option<u32>,
    pub confidence: f32,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<KeypointSet>,
}

impl Detection {
    /// The upstream model is expected to filter to "person" already; an
    /// absent class name is treated as person.
    pub fn is_person(&self) -> bool {
        self.class_name.as_deref().map_or(true, |c| c == "person")
    }
}

/// Capture header: properties of the recorded frame stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CaptureInfo {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    #[serde(default)]
    pub frame_count: Option<usize>,
}

/// One frame's worth of model output.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FrameObservations {
    pub frame_index: usize,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// The analyses a run can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisKind {
    Tracking,
    Heatmap,
    Pose,
    Shot,
    Speed,
}

impl AnalysisKind {
    pub fn display_name(self) -> &'static str {
        match self {
            AnalysisKind::Tracking => "Player Tracking",
            AnalysisKind::Heatmap => "Player Heatmaps",
            AnalysisKind::Pose => "Pose Analysis",
            AnalysisKind::Shot => "Shot Analysis",
            AnalysisKind::Speed => "Player Speed Analysis",
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            AnalysisKind::Tracking => "tracking",
            AnalysisKind::Heatmap => "heatmap",
            AnalysisKind::Pose => "pose",
            AnalysisKind::Shot => "shot",
            AnalysisKind::Speed => "speed",
        };
        f.write_str(token)
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tracking" => Ok(AnalysisKind::Tracking),
            "heatmap" => Ok(AnalysisKind::Heatmap),
            "pose" => Ok(AnalysisKind::Pose),
            "shot" => Ok(AnalysisKind::Shot),
            "speed" => Ok(AnalysisKind::Speed),
            other => Err(format!("unknown analysis type: {other}")),
        }
    }
}

/// Tunables shared by the analyses, injected per invocation.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Pixel-to-meter calibration constant
    pub pixels_per_meter: f32,
    /// Minimum per-keypoint confidence for a landmark to count as observed
    pub keypoint_confidence: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: 50.0,
            keypoint_confidence: 0.25,
        }
    }
}

/// Result record for one completed analysis.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisOutput {
    /// A file-producing analysis; `path` points into the run directory.
    Artifact { name: String, path: PathBuf },
    /// An analysis whose result is inline structured data.
    Metrics { name: String, data: SpeedReport },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypoints_with(landmark: Landmark, kp: Keypoint) -> KeypointSet {
        let mut pts = [Keypoint {
            x: 1.0,
            y: 1.0,
            confidence: 1.0,
        }; 17];
        pts[landmark.index()] = kp;
        KeypointSet(pts)
    }

    #[test]
    fn landmark_indices_follow_coco_order() {
        assert_eq!(Landmark::Nose.index(), 0);
        assert_eq!(Landmark::RightShoulder.index(), 6);
        assert_eq!(Landmark::RightElbow.index(), 8);
        assert_eq!(Landmark::RightWrist.index(), 10);
        assert_eq!(Landmark::RightAnkle.index(), 16);
    }

    #[test]
    fn origin_keypoint_counts_as_unobserved() {
        let kps = keypoints_with(
            Landmark::RightElbow,
            Keypoint {
                x: 0.0,
                y: 0.0,
                confidence: 0.9,
            },
        );
        assert!(kps.observed(Landmark::RightElbow, 0.25).is_none());
        assert!(kps.observed(Landmark::RightWrist, 0.25).is_some());
    }

    #[test]
    fn low_confidence_keypoint_counts_as_unobserved() {
        let kps = keypoints_with(
            Landmark::RightWrist,
            Keypoint {
                x: 40.0,
                y: 50.0,
                confidence: 0.1,
            },
        );
        assert!(kps.observed(Landmark::RightWrist, 0.25).is_none());
        // Raw position stays addressable either way
        assert_eq!(kps.position(Landmark::RightWrist), Point { x: 40.0, y: 50.0 });
    }

    #[test]
    fn analysis_kind_round_trips_through_tokens() {
        for kind in [
            AnalysisKind::Tracking,
            AnalysisKind::Heatmap,
            AnalysisKind::Pose,
            AnalysisKind::Shot,
            AnalysisKind::Speed,
        ] {
            assert_eq!(kind.to_string().parse::<AnalysisKind>(), Ok(kind));
        }
        assert!("plinko".parse::<AnalysisKind>().is_err());
    }
}
