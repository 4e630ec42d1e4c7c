// Shot taxonomy classifier: a fixed cascade of angle/distance predicates.

use crate::error::AnalysisError;
use crate::pipeline::angles::{joint_angle, point_distance};
use crate::pipeline::overlay::{outlined_text, Color, FrameOverlay, OverlayWriter};
use crate::pipeline::types::{AnalysisConfig, AnalysisOutput, KeypointSet, Landmark, Point};
use crate::source::FrameSource;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotLabel {
    CoverDrive,
    FrontFootDefensive,
    BackFootDefensive,
    BackFootPunch,
    SweepShot,
    PullShot,
    FlickShot,
    RestShot,
}

impl ShotLabel {
    pub fn name(self) -> &'static str {
        match self {
            ShotLabel::CoverDrive => "Cover Drive",
            ShotLabel::FrontFootDefensive => "Front Foot Defensive",
            ShotLabel::BackFootDefensive => "Back Foot Defensive",
            ShotLabel::BackFootPunch => "Back Foot Punch",
            ShotLabel::SweepShot => "Sweep Shot",
            ShotLabel::PullShot => "Pull Shot",
            ShotLabel::FlickShot => "Flick Shot",
            ShotLabel::RestShot => "Rest Shot",
        }
    }

    pub fn is_rest(self) -> bool {
        self == ShotLabel::RestShot
    }
}

impl fmt::Display for ShotLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-frame classifier input: six joint angles in degrees and two
/// resolution-normalized distances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub right_knee: f32,
    pub left_knee: f32,
    pub right_elbow: f32,
    pub left_elbow: f32,
    pub right_hip: f32,
    pub left_hip: f32,
    /// Right wrist to nose, points divided by frame size, distance x100
    pub wrist_nose: f32,
    /// Right ankle to left ankle, same normalization
    pub ankle_gap: f32,
}

impl FeatureVector {
    /// Build from a full 17-point keypoint set. Landmark positions are used
    /// as reported; the shot path has no partial-keypoint tolerance, so the
    /// caller only invokes this when a full set is present.
    pub fn from_keypoints(keypoints: &KeypointSet, width: f32, height: f32) -> Self {
        let p = |landmark| keypoints.position(landmark);

        let right_elbow = joint_angle(
            p(Landmark::RightShoulder),
            p(Landmark::RightElbow),
            p(Landmark::RightWrist),
        );
        let left_elbow = joint_angle(
            p(Landmark::LeftShoulder),
            p(Landmark::LeftElbow),
            p(Landmark::LeftWrist),
        );
        let right_hip = joint_angle(
            p(Landmark::RightShoulder),
            p(Landmark::RightHip),
            p(Landmark::RightKnee),
        );
        let left_hip = joint_angle(
            p(Landmark::LeftShoulder),
            p(Landmark::LeftHip),
            p(Landmark::LeftKnee),
        );
        let right_knee = joint_angle(
            p(Landmark::RightHip),
            p(Landmark::RightKnee),
            p(Landmark::RightAnkle),
        );
        let left_knee = joint_angle(
            p(Landmark::LeftHip),
            p(Landmark::LeftKnee),
            p(Landmark::LeftAnkle),
        );

        let norm = |pt: Point| Point {
            x: pt.x / width,
            y: pt.y / height,
        };
        let wrist_nose =
            point_distance(norm(p(Landmark::RightWrist)), norm(p(Landmark::Nose))) * 100.0;
        let ankle_gap =
            point_distance(norm(p(Landmark::RightAnkle)), norm(p(Landmark::LeftAnkle))) * 100.0;

        Self {
            right_knee,
            left_knee,
            right_elbow,
            left_elbow,
            right_hip,
            left_hip,
            wrist_nose,
            ankle_gap,
        }
    }
}

fn within(value: f32, low: f32, high: f32) -> bool {
    value > low && value < high
}

/// Map a feature vector to a shot label.
///
/// The predicates overlap and are evaluated top to bottom; the first match
/// wins and later predicates are never consulted. Both the ordering and the
/// numeric bounds are an empirically tuned fixed table reproduced as-is.
pub fn classify(f: &FeatureVector) -> ShotLabel {
    // Cover Drive
    if within(f.right_knee, 90.0, 170.0)
        && within(f.left_knee, 80.0, 160.0)
        && within(f.right_elbow, 50.0, 145.0)
        && within(f.left_elbow, 55.0, 170.0)
        && within(f.right_hip, 120.0, 180.0)
        && within(f.left_hip, 100.0, 165.0)
        && within(f.wrist_nose, 5.0, 13.0)
    {
        return ShotLabel::CoverDrive;
    }

    // Front Foot Defensive
    if within(f.right_knee, 100.0, 180.0)
        && within(f.left_knee, 100.0, 165.0)
        && (within(f.right_elbow, 50.0, 105.0) || within(f.left_elbow, 80.0, 180.0))
        && within(f.right_hip, 70.0, 180.0)
        && within(f.left_hip, 90.0, 180.0)
        && within(f.wrist_nose, 10.0, 20.0)
        && f.ankle_gap > 10.0
    {
        return ShotLabel::FrontFootDefensive;
    }

    // Back Foot Defensive
    if within(f.right_knee, 150.0, 180.0)
        && within(f.left_knee, 160.0, 180.0)
        && f.right_elbow < 140.0
        && within(f.left_elbow, 30.0, 140.0)
        && within(f.right_hip, 160.0, 180.0)
        && within(f.left_hip, 160.0, 180.0)
        && within(f.wrist_nose, 2.0, 6.0)
        && within(f.ankle_gap, 3.0, 6.0)
    {
        return ShotLabel::BackFootDefensive;
    }

    // Back Foot Punch
    if within(f.right_knee, 160.0, 180.0)
        && within(f.left_knee, 160.0, 180.0)
        && within(f.right_elbow, 70.0, 150.0)
        && within(f.left_elbow, 70.0, 180.0)
        && within(f.right_hip, 160.0, 180.0)
        && within(f.left_hip, 165.0, 180.0)
        && within(f.wrist_nose, 4.0, 13.0)
        && f.ankle_gap > 3.0
    {
        return ShotLabel::BackFootPunch;
    }

    // Sweep Shot
    if within(f.right_knee, 70.0, 110.0)
        && within(f.left_knee, 100.0, 180.0)
        && within(f.right_elbow, 40.0, 180.0)
        && within(f.left_elbow, 90.0, 170.0)
        && within(f.right_hip, 120.0, 175.0)
        && within(f.left_hip, 90.0, 175.0)
    {
        return ShotLabel::SweepShot;
    }

    // Pull Shot
    if within(f.right_knee, 150.0, 180.0)
        && within(f.left_knee, 150.0, 180.0)
        && within(f.right_elbow, 65.0, 180.0)
        && within(f.left_elbow, 20.0, 160.0)
        && within(f.right_hip, 160.0, 180.0)
        && within(f.left_hip, 160.0, 180.0)
        && within(f.wrist_nose, 2.0, 13.0)
        && within(f.ankle_gap, 1.0, 12.0)
    {
        return ShotLabel::PullShot;
    }

    // Flick Shot
    if within(f.right_knee, 130.0, 180.0)
        && within(f.left_knee, 165.0, 180.0)
        && within(f.right_elbow, 110.0, 180.0)
        && within(f.left_elbow, 110.0, 160.0)
        && within(f.right_hip, 140.0, 180.0)
        && within(f.left_hip, 130.0, 150.0)
    {
        return ShotLabel::FlickShot;
    }

    ShotLabel::RestShot
}

/// Displayed-label hysteresis: holds the last non-rest classification for
/// the rest of the run. The classifier itself stays memoryless.
#[derive(Debug, Clone, Copy)]
pub struct ShotState {
    current: ShotLabel,
}

impl Default for ShotState {
    fn default() -> Self {
        Self {
            current: ShotLabel::RestShot,
        }
    }
}

impl ShotState {
    pub fn update(&mut self, observed: ShotLabel) -> ShotLabel {
        if !observed.is_rest() {
            self.current = observed;
        }
        self.current
    }

    pub fn current(&self) -> ShotLabel {
        self.current
    }
}

/// Shot analysis: classify each fully-observed frame and overlay the held
/// label plus the angle readouts.
pub fn shot_analysis(
    source: &mut dyn FrameSource,
    out_dir: &Path,
    _config: &AnalysisConfig,
) -> Result<AnalysisOutput, AnalysisError> {
    let info = source.info().clone();
    let (width, height) = (info.width as f32, info.height as f32);

    let mut state = ShotState::default();
    let mut writer = OverlayWriter::create(out_dir.join("shot_overlays.jsonl"))?;

    while let Some(frame) = source.next_frame()? {
        let mut commands = Vec::new();

        // The model reports at most one batter of interest; read the first
        // detection carrying a full keypoint set. Frames without one leave
        // the displayed label untouched.
        if let Some(keypoints) = frame.detections.first().and_then(|d| d.keypoints.as_ref()) {
            let features = FeatureVector::from_keypoints(keypoints, width, height);
            let displayed = state.update(classify(&features));

            commands.extend(outlined_text(
                format!("SHOT: {displayed}"),
                30.0,
                50.0,
                Color::GREEN,
                1.3,
                5,
            ));

            let readouts = [
                ("R Knee", features.right_knee),
                ("R Elbow", features.right_elbow),
                ("L Elbow", features.left_elbow),
                ("L Knee", features.left_knee),
                ("R Hip", features.right_hip),
                ("L Hip", features.left_hip),
            ];
            for (i, (label, value)) in readouts.iter().enumerate() {
                commands.extend(outlined_text(
                    format!("{label}: {}", *value as i32),
                    30.0,
                    150.0 + 50.0 * i as f32,
                    Color::RED,
                    0.7,
                    2,
                ));
            }
        }

        writer.push(&FrameOverlay {
            frame_index: frame.frame_index,
            commands,
        })?;
    }

    tracing::info!(
        "shot: {} classified frames, final label {:?}",
        writer.frames_written(),
        state.current()
    );
    let path = writer.finish()?;
    Ok(AnalysisOutput::Artifact {
        name: "Shot Analysis".to_string(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_vector() -> FeatureVector {
        FeatureVector {
            right_knee: 0.0,
            left_knee: 0.0,
            right_elbow: 0.0,
            left_elbow: 0.0,
            right_hip: 0.0,
            left_hip: 0.0,
            wrist_nose: 0.0,
            ankle_gap: 0.0,
        }
    }

    fn cover_drive_vector() -> FeatureVector {
        FeatureVector {
            right_knee: 120.0,
            left_knee: 120.0,
            right_elbow: 100.0,
            left_elbow: 120.0,
            right_hip: 150.0,
            left_hip: 150.0,
            wrist_nose: 8.0,
            ankle_gap: 5.0,
        }
    }

    #[test]
    fn no_predicate_match_is_rest() {
        assert_eq!(classify(&rest_vector()), ShotLabel::RestShot);
    }

    #[test]
    fn classification_is_pure() {
        let f = cover_drive_vector();
        assert_eq!(classify(&f), classify(&f));
        assert_eq!(classify(&f), ShotLabel::CoverDrive);
    }

    #[test]
    fn cascade_order_breaks_overlapping_matches() {
        // Satisfies both the Cover Drive and Front Foot Defensive
        // predicates; the earlier cascade entry must win.
        let f = FeatureVector {
            right_knee: 150.0,
            left_knee: 150.0,
            right_elbow: 100.0,
            left_elbow: 150.0,
            right_hip: 150.0,
            left_hip: 150.0,
            wrist_nose: 12.0,
            ankle_gap: 15.0,
        };
        assert_eq!(classify(&f), ShotLabel::CoverDrive);
    }

    #[test]
    fn back_foot_defensive_beats_back_foot_punch() {
        // Inside both back-foot predicates; the defensive entry sits higher
        // in the cascade.
        let f = FeatureVector {
            right_knee: 170.0,
            left_knee: 170.0,
            right_elbow: 100.0,
            left_elbow: 100.0,
            right_hip: 170.0,
            left_hip: 170.0,
            wrist_nose: 5.0,
            ankle_gap: 5.0,
        };
        assert_eq!(classify(&f), ShotLabel::BackFootDefensive);
    }

    #[test]
    fn pull_shot_reachable_past_earlier_entries() {
        // wrist_nose 10 falls outside both back-foot-defensive (2..6) and
        // front-foot-defensive (>10 strict) windows, left_elbow 50 is below
        // the punch window, leaving Pull Shot as the first match.
        let f = FeatureVector {
            right_knee: 170.0,
            left_knee: 170.0,
            right_elbow: 100.0,
            left_elbow: 50.0,
            right_hip: 170.0,
            left_hip: 170.0,
            wrist_nose: 10.0,
            ankle_gap: 5.0,
        };
        assert_eq!(classify(&f), ShotLabel::PullShot);
    }

    #[test]
    fn sweep_shot_ignores_distances() {
        let f = FeatureVector {
            right_knee: 90.0,
            left_knee: 140.0,
            right_elbow: 100.0,
            left_elbow: 120.0,
            right_hip: 150.0,
            left_hip: 150.0,
            wrist_nose: 50.0,
            ankle_gap: 50.0,
        };
        assert_eq!(classify(&f), ShotLabel::SweepShot);
    }

    #[test]
    fn shot_state_never_reverts_to_rest() {
        let mut state = ShotState::default();
        let observed = [
            ShotLabel::RestShot,
            ShotLabel::CoverDrive,
            ShotLabel::RestShot,
            ShotLabel::RestShot,
        ];
        let displayed: Vec<ShotLabel> = observed.iter().map(|s| state.update(*s)).collect();
        assert_eq!(
            displayed,
            vec![
                ShotLabel::RestShot,
                ShotLabel::CoverDrive,
                ShotLabel::CoverDrive,
                ShotLabel::CoverDrive,
            ]
        );
    }

    #[test]
    fn shot_state_switches_between_real_shots() {
        let mut state = ShotState::default();
        state.update(ShotLabel::PullShot);
        assert_eq!(state.update(ShotLabel::SweepShot), ShotLabel::SweepShot);
        assert_eq!(state.update(ShotLabel::RestShot), ShotLabel::SweepShot);
    }
}
