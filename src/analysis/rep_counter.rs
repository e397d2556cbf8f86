// src/analysis/rep_counter.rs
//
// Arm-curl repetition counter, one counter per side. A rep is a full
// down→up excursion of the elbow angle: stage flips to "down" past the
// extension threshold, and a rep completes when the angle later drops
// below the flexion threshold. The displayed angle is EMA-smoothed; the
// stage logic runs on the raw angle.

use serde::Serialize;

use crate::geometry::angle_between;
use crate::types::{JointName, PoseFrame, RehabConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RepSummary {
    pub reps_left: u32,
    pub reps_right: u32,
    pub stage_left: Option<Stage>,
    pub stage_right: Option<Stage>,
    pub angle_left: Option<f64>,
    pub angle_right: Option<f64>,
}

#[derive(Debug, Default)]
struct SideCounter {
    reps: u32,
    stage: Option<Stage>,
    smooth_angle: Option<f64>,
}

impl SideCounter {
    fn update(&mut self, raw_angle: f64, config: &RehabConfig) {
        self.smooth_angle = Some(match self.smooth_angle {
            None => raw_angle,
            Some(prev) => config.angle_alpha * raw_angle + (1.0 - config.angle_alpha) * prev,
        });
        if raw_angle > config.down_threshold_deg {
            self.stage = Some(Stage::Down);
        }
        if raw_angle < config.up_threshold_deg && self.stage == Some(Stage::Down) {
            self.stage = Some(Stage::Up);
            self.reps += 1;
        }
    }
}

pub struct RepCounter {
    config: RehabConfig,
    left: SideCounter,
    right: SideCounter,
}

impl RepCounter {
    pub fn new(config: &RehabConfig) -> Self {
        Self {
            config: config.clone(),
            left: SideCounter::default(),
            right: SideCounter::default(),
        }
    }

    pub fn update(&mut self, frame: &PoseFrame) -> RepSummary {
        use JointName::*;
        if let Some(angle) = elbow_angle(frame, LeftShoulder, LeftElbow, LeftWrist) {
            self.left.update(angle, &self.config);
        }
        if let Some(angle) = elbow_angle(frame, RightShoulder, RightElbow, RightWrist) {
            self.right.update(angle, &self.config);
        }
        self.summary()
    }

    pub fn summary(&self) -> RepSummary {
        RepSummary {
            reps_left: self.left.reps,
            reps_right: self.right.reps,
            stage_left: self.left.stage,
            stage_right: self.right.stage,
            angle_left: self.left.smooth_angle,
            angle_right: self.right.smooth_angle,
        }
    }

    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.left = SideCounter::default();
        self.right = SideCounter::default();
    }
}

fn elbow_angle(
    frame: &PoseFrame,
    shoulder: JointName,
    elbow: JointName,
    wrist: JointName,
) -> Option<f64> {
    match (frame.point(shoulder), frame.point(elbow), frame.point(wrist)) {
        (Some(a), Some(b), Some(c)) => Some(angle_between(a, b, c)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Joint;

    /// Left arm pivoting at the elbow: `deg` is the elbow angle.
    fn arm_pose(deg: f64) -> PoseFrame {
        use JointName::*;
        let mut frame = PoseFrame::default();
        let put = |frame: &mut PoseFrame, name, x: f64, y: f64| {
            frame.joints.insert(
                name,
                Joint {
                    x: x.round() as i32,
                    y: y.round() as i32,
                    visibility: 1.0,
                },
            );
        };
        // Shoulder above the elbow; wrist swings on a 100px radius.
        put(&mut frame, LeftShoulder, 300.0, 100.0);
        put(&mut frame, LeftElbow, 300.0, 200.0);
        let theta = (180.0 - deg).to_radians();
        put(
            &mut frame,
            LeftWrist,
            300.0 + 100.0 * theta.sin(),
            200.0 + 100.0 * theta.cos(),
        );
        frame
    }

    #[test]
    fn test_full_excursion_counts_one_rep() {
        let mut counter = RepCounter::new(&RehabConfig::default());
        counter.update(&arm_pose(170.0)); // extended → down
        counter.update(&arm_pose(90.0));
        let summary = counter.update(&arm_pose(20.0)); // flexed → up, rep
        assert_eq!(summary.reps_left, 1);
        assert_eq!(summary.stage_left, Some(Stage::Up));
    }

    #[test]
    fn test_flexion_without_prior_extension_does_not_count() {
        let mut counter = RepCounter::new(&RehabConfig::default());
        let summary = counter.update(&arm_pose(20.0));
        assert_eq!(summary.reps_left, 0);
        assert_eq!(summary.stage_left, None);
    }

    #[test]
    fn test_two_cycles_count_two_reps() {
        let mut counter = RepCounter::new(&RehabConfig::default());
        for _ in 0..2 {
            counter.update(&arm_pose(170.0));
            counter.update(&arm_pose(20.0));
        }
        assert_eq!(counter.summary().reps_left, 2);
    }

    #[test]
    fn test_missing_side_is_untouched() {
        let mut counter = RepCounter::new(&RehabConfig::default());
        let summary = counter.update(&arm_pose(170.0));
        assert_eq!(summary.reps_right, 0);
        assert_eq!(summary.angle_right, None);
    }

    #[test]
    fn test_reset() {
        let mut counter = RepCounter::new(&RehabConfig::default());
        counter.update(&arm_pose(170.0));
        counter.update(&arm_pose(20.0));
        counter.reset();
        let summary = counter.summary();
        assert_eq!(summary.reps_left, 0);
        assert_eq!(summary.stage_left, None);
    }
}
