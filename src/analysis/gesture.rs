// src/analysis/gesture.rs
//
// Help-gesture recognition. Two interchangeable strategies over the same
// pose frame, selected once at construction:
//
//   ArmsCrossed — five geometric predicates on wrists/elbows/shoulders,
//                 active when at least 3 hold.
//   Waving      — a raised wrist swinging side to side, active when the
//                 windowed history shows >= min_swings direction reversals.
//
// Each strategy owns its "active since / last active" bookkeeping, which
// the HELP state machine consumes for sustain and quiet timing.

use std::collections::VecDeque;

use crate::geometry::distance;
use crate::types::{GestureMode, JointName, PoseFrame, WavingConfig};

const ARMS_CROSSED_MIN_CRITERIA: usize = 3;
const ELBOW_FLEXED_MAX_DEG: f64 = 120.0;
const WRISTS_CLOSE_RATIO: f64 = 0.7;
const OPPOSITE_SHOULDER_RATIO: f64 = 0.9;
const CHEST_BAND_ABOVE: f64 = 0.2;
const CHEST_BAND_BELOW: f64 = 0.6;

/// Per-frame recognizer output plus the timing bookkeeping downstream
/// needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureObservation {
    pub active: bool,
    /// Start of the current uninterrupted activity streak.
    pub active_since: Option<f64>,
    /// Last frame time at which the gesture was active.
    pub last_active_at: Option<f64>,
}

pub enum GestureRecognizer {
    ArmsCrossed(ArmsCrossedRecognizer),
    Waving(WavingRecognizer),
}

impl GestureRecognizer {
    pub fn new(mode: GestureMode, waving: &WavingConfig) -> Self {
        match mode {
            GestureMode::ArmsCrossed => Self::ArmsCrossed(ArmsCrossedRecognizer::default()),
            GestureMode::Waving => Self::Waving(WavingRecognizer::new(waving.clone())),
        }
    }

    pub fn update(&mut self, t: f64, frame: &PoseFrame) -> GestureObservation {
        match self {
            Self::ArmsCrossed(r) => r.update(t, frame),
            Self::Waving(r) => r.update(t, frame),
        }
    }
}

#[derive(Debug, Default)]
struct StreakClock {
    active_since: Option<f64>,
    last_active_at: Option<f64>,
}

impl StreakClock {
    fn observe(&mut self, t: f64, active: bool) -> GestureObservation {
        if active {
            if self.active_since.is_none() {
                self.active_since = Some(t);
            }
            self.last_active_at = Some(t);
        } else {
            self.active_since = None;
        }
        GestureObservation {
            active,
            active_since: self.active_since,
            last_active_at: self.last_active_at,
        }
    }
}

#[derive(Default)]
pub struct ArmsCrossedRecognizer {
    clock: StreakClock,
}

impl ArmsCrossedRecognizer {
    fn update(&mut self, t: f64, frame: &PoseFrame) -> GestureObservation {
        let active = detect_arms_crossed(frame);
        self.clock.observe(t, active)
    }
}

/// Five-criterion arms-crossed vote. Missing shoulders, wrists, or hips
/// make the gesture inactive outright; a missing elbow only fails the
/// flexion criterion.
fn detect_arms_crossed(frame: &PoseFrame) -> bool {
    use JointName::*;
    let (Some(ls), Some(rs), Some(lw), Some(rw), Some(shoulders_mid), Some(hips_mid)) = (
        frame.point(LeftShoulder),
        frame.point(RightShoulder),
        frame.point(LeftWrist),
        frame.point(RightWrist),
        frame.shoulders_mid(),
        frame.hips_mid(),
    ) else {
        return false;
    };

    let shoulder_w = distance(ls, rs).max(1.0);
    let torso_h = distance(shoulders_mid, hips_mid).max(1.0);
    let mid_x = shoulders_mid.0;
    let shoulder_y = shoulders_mid.1;

    // 1) Wrists on opposite sides of the shoulder midline.
    let opposite_sides = (lw.0 - mid_x) * (rw.0 - mid_x) < 0.0;

    // 2) Wrists close together relative to shoulder width.
    let wrists_close = distance(lw, rw) / shoulder_w < WRISTS_CLOSE_RATIO;

    // 3) Both wrists in the chest band.
    let min_y = shoulder_y - CHEST_BAND_ABOVE * torso_h;
    let max_y = shoulder_y + CHEST_BAND_BELOW * torso_h;
    let in_chest_band =
        lw.1 >= min_y && lw.1 <= max_y && rw.1 >= min_y && rw.1 <= max_y;

    // 4) Both elbows flexed.
    let elbow_angle = |shoulder, elbow, wrist| -> Option<f64> {
        match (frame.point(shoulder), frame.point(elbow), frame.point(wrist)) {
            (Some(a), Some(b), Some(c)) => Some(crate::geometry::angle_between(a, b, c)),
            _ => None,
        }
    };
    let elbows_flexed = matches!(
        (
            elbow_angle(LeftShoulder, LeftElbow, LeftWrist),
            elbow_angle(RightShoulder, RightElbow, RightWrist),
        ),
        (Some(l), Some(r)) if l < ELBOW_FLEXED_MAX_DEG && r < ELBOW_FLEXED_MAX_DEG
    );

    // 5) Each wrist near the opposite shoulder.
    let near_opposite_shoulders = distance(lw, rs) / shoulder_w < OPPOSITE_SHOULDER_RATIO
        && distance(rw, ls) / shoulder_w < OPPOSITE_SHOULDER_RATIO;

    let score = [
        opposite_sides,
        wrists_close,
        in_chest_band,
        elbows_flexed,
        near_opposite_shoulders,
    ]
    .iter()
    .filter(|&&c| c)
    .count();

    score >= ARMS_CROSSED_MIN_CRITERIA
}

#[derive(Debug, Clone, Copy)]
struct WristSample {
    t: f64,
    x: f64,
}

pub struct WavingRecognizer {
    config: WavingConfig,
    history: VecDeque<WristSample>,
    clock: StreakClock,
}

impl WavingRecognizer {
    fn new(config: WavingConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            clock: StreakClock::default(),
        }
    }

    fn update(&mut self, t: f64, frame: &PoseFrame) -> GestureObservation {
        let active = self.detect(t, frame);
        self.clock.observe(t, active)
    }

    fn detect(&mut self, t: f64, frame: &PoseFrame) -> bool {
        use JointName::*;
        let (Some(ls), Some(rs), Some(lw), Some(rw), Some(shoulders_mid), Some(hips_mid)) = (
            frame.point(LeftShoulder),
            frame.point(RightShoulder),
            frame.point(LeftWrist),
            frame.point(RightWrist),
            frame.shoulders_mid(),
            frame.hips_mid(),
        ) else {
            return false;
        };

        let shoulder_w = distance(ls, rs).max(1.0);
        let torso_h = distance(shoulders_mid, hips_mid).max(1.0);
        let min_hand_y = shoulders_mid.1 - self.config.hand_raised_min_y * torso_h;

        let left_raised = lw.1 < min_hand_y;
        let right_raised = rw.1 < min_hand_y;

        // No gesture persists without a raised hand.
        if !left_raised && !right_raised {
            self.history.clear();
            return false;
        }

        let wrist = if left_raised { lw } else { rw };
        self.history.push_back(WristSample { t, x: wrist.0 });

        let cutoff = t - self.config.time_window_s;
        while self.history.front().map_or(false, |s| s.t < cutoff) {
            self.history.pop_front();
        }

        if self.history.len() < 3 {
            return false;
        }

        self.count_swings(shoulder_w) >= self.config.min_swings
    }

    /// Direction reversals across the windowed history whose horizontal
    /// delta exceeds the swing threshold. Re-derived from scratch each
    /// frame so stale reversals age out with the window.
    fn count_swings(&self, shoulder_w: f64) -> u32 {
        let threshold_px = shoulder_w * self.config.swing_threshold;
        let mut swings = 0;
        let mut last_dir: Option<bool> = None; // true = moving right
        for (prev, curr) in self.history.iter().zip(self.history.iter().skip(1)) {
            let dx = curr.x - prev.x;
            if dx.abs() > threshold_px {
                let dir = dx > 0.0;
                if last_dir.is_some_and(|d| d != dir) {
                    swings += 1;
                }
                last_dir = Some(dir);
            }
        }
        swings
    }
}
