// src/types.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geometry;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub stream: StreamConfig,
    pub fall: FallConfig,
    pub gesture: GestureConfig,
    pub help: HelpConfig,
    pub waving: WavingConfig,
    pub rehab: RehabConfig,
    pub roi: RoiConfig,
    pub notify: NotifyConfig,
    pub input: InputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FallConfig {
    pub conf_threshold: f32,
    pub horizontal_angle_deg: f64,
    pub ground_y_ratio: f64,
    pub sudden_speed_thresh: f64,
    pub inactivity_window_s: f64,
    pub inactivity_speed_thresh: f64,
}

impl Default for FallConfig {
    fn default() -> Self {
        Self {
            conf_threshold: 0.45,
            horizontal_angle_deg: 55.0,
            ground_y_ratio: 0.8,
            sudden_speed_thresh: 280.0,
            inactivity_window_s: 2.5,
            inactivity_speed_thresh: 18.0,
        }
    }
}

/// Which help-gesture strategy the detector is built with. Selected once at
/// construction, never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GestureMode {
    #[default]
    ArmsCrossed,
    Waving,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GestureConfig {
    pub mode: GestureMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpConfig {
    /// Minimum continuous gesture duration before HELP activates.
    /// `None` picks the per-mode default: 0.4s arms-crossed, 1.5s waving.
    pub sustain_s: Option<f64>,
    pub hold_s: f64,
    pub clear_after_quiet_s: f64,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            sustain_s: None,
            hold_s: 6.0,
            clear_after_quiet_s: 2.0,
        }
    }
}

impl HelpConfig {
    pub fn resolved_sustain_s(&self, mode: GestureMode) -> f64 {
        self.sustain_s.unwrap_or(match mode {
            GestureMode::ArmsCrossed => 0.4,
            GestureMode::Waving => 1.5,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WavingConfig {
    pub min_swings: u32,
    /// Fraction of shoulder width a horizontal delta must exceed to count.
    pub swing_threshold: f64,
    pub time_window_s: f64,
    /// Fraction of torso height above the shoulder line a wrist must reach.
    pub hand_raised_min_y: f64,
}

impl Default for WavingConfig {
    fn default() -> Self {
        Self {
            min_swings: 2,
            swing_threshold: 0.15,
            time_window_s: 2.0,
            hand_raised_min_y: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RehabConfig {
    pub enabled: bool,
    pub up_threshold_deg: f64,
    pub down_threshold_deg: f64,
    pub angle_alpha: f64,
}

impl Default for RehabConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            up_threshold_deg: 30.0,
            down_threshold_deg: 160.0,
            angle_alpha: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiConfig {
    pub path: String,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            path: "bed_roi.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub enabled: bool,
    pub cooldown_s: f64,
    pub telegram: TelegramConfig,
    pub alarm: AlarmConfig,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cooldown_s: 60.0,
            telegram: TelegramConfig::default(),
            alarm: AlarmConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TelegramConfig {
    pub proxy_url: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    pub endpoint_url: String,
    pub api_key: String,
    pub device_id: String,
    pub retries: u32,
    pub timeout_ms: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: String::new(),
            device_id: String::new(),
            retries: 2,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub dir: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: "recordings".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// The 13 body joints the pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JointName {
    Nose,
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

/// One joint sample in stream pixel space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Joint {
    pub x: i32,
    pub y: i32,
    pub visibility: f32,
}

impl Joint {
    pub fn point(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// A single pose frame: monotonic timestamp plus whatever joints the
/// detector resolved. Absent joints are legal everywhere downstream.
#[derive(Debug, Clone, Default)]
pub struct PoseFrame {
    pub t: f64,
    pub joints: HashMap<JointName, Joint>,
}

impl PoseFrame {
    pub fn point(&self, name: JointName) -> Option<(f64, f64)> {
        self.joints.get(&name).map(|j| j.point())
    }

    pub fn has_pose(&self) -> bool {
        !self.joints.is_empty()
    }

    pub fn shoulders_mid(&self) -> Option<(f64, f64)> {
        Some(geometry::midpoint(
            self.point(JointName::LeftShoulder)?,
            self.point(JointName::RightShoulder)?,
        ))
    }

    pub fn hips_mid(&self) -> Option<(f64, f64)> {
        Some(geometry::midpoint(
            self.point(JointName::LeftHip)?,
            self.point(JointName::RightHip)?,
        ))
    }

    /// Torso center: midpoint of the shoulder and hip midpoints, falling
    /// back to whichever midpoint is available.
    pub fn torso_center(&self) -> Option<(f64, f64)> {
        match (self.shoulders_mid(), self.hips_mid()) {
            (Some(s), Some(h)) => Some(geometry::midpoint(s, h)),
            (_, Some(h)) => Some(h),
            (Some(s), _) => Some(s),
            _ => None,
        }
    }
}

/// The 8 displayed joint angles, in degrees. Missing or degenerate
/// constituent points report 0°.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct JointAngles {
    pub left_elbow: f64,
    pub right_elbow: f64,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    pub left_hip: f64,
    pub right_hip: f64,
    pub left_knee: f64,
    pub right_knee: f64,
}

impl JointAngles {
    pub fn measure(frame: &PoseFrame) -> Self {
        use JointName::*;
        let angle = |a: JointName, b: JointName, c: JointName| -> f64 {
            match (frame.point(a), frame.point(b), frame.point(c)) {
                (Some(a), Some(b), Some(c)) => geometry::angle_between(a, b, c),
                _ => 0.0,
            }
        };
        Self {
            left_elbow: angle(LeftShoulder, LeftElbow, LeftWrist),
            right_elbow: angle(RightShoulder, RightElbow, RightWrist),
            left_shoulder: angle(LeftHip, LeftShoulder, LeftElbow),
            right_shoulder: angle(RightHip, RightShoulder, RightElbow),
            left_hip: angle(LeftShoulder, LeftHip, LeftKnee),
            right_hip: angle(RightShoulder, RightHip, RightKnee),
            left_knee: angle(LeftHip, LeftKnee, LeftAnkle),
            right_knee: angle(RightHip, RightKnee, RightAnkle),
        }
    }
}

/// Resolved per-frame status, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Help,
    Emergency,
    SafeSleeping,
    Safe,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Help => "HELP",
            Status::Emergency => "EMERGENCY",
            Status::SafeSleeping => "SAFE_SLEEPING",
            Status::Safe => "SAFE",
        }
    }

}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame output of the core.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub status: Status,
    pub fall_confidence: f32,
    pub fall_timer_s: f64,
    pub gesture_active: bool,
    pub joint_angles: JointAngles,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<crate::analysis::RepSummary>,
}

/// Kind of outbound alert, each with its own independent cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Help,
    Fall,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Help => "help",
            AlertKind::Fall => "fall",
        }
    }
}

/// Context handed to the notifier with each dispatch attempt.
#[derive(Debug, Clone, Copy)]
pub struct AlertContext {
    pub confidence: Option<f32>,
    pub timestamp: f64,
}
