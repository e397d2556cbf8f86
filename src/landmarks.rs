// src/landmarks.rs
//
// Landmark Frame Adapter: turns one frame of raw pose-model output
// (normalized landmark list) into a typed, pixel-space PoseFrame.
// Stateless; a short detection (<33 entries) yields an empty joint map,
// which every consumer treats as "no pose", never as an error.

use serde::Deserialize;
use std::collections::HashMap;

use crate::types::{Joint, JointName, PoseFrame};

/// Minimum landmark count for a usable detection.
pub const EXPECTED_LANDMARKS: usize = 33;

/// Fixed indices of the consumed joints in the pose model's output.
const MODEL_INDEX: [(JointName, usize); 13] = [
    (JointName::Nose, 0),
    (JointName::LeftShoulder, 11),
    (JointName::RightShoulder, 12),
    (JointName::LeftElbow, 13),
    (JointName::RightElbow, 14),
    (JointName::LeftWrist, 15),
    (JointName::RightWrist, 16),
    (JointName::LeftHip, 23),
    (JointName::RightHip, 24),
    (JointName::LeftKnee, 25),
    (JointName::RightKnee, 26),
    (JointName::LeftAnkle, 27),
    (JointName::RightAnkle, 28),
];

/// One raw frame as recorded from the detector: normalized [x, y, visibility]
/// triples, coordinates in [0, 1].
#[derive(Debug, Clone, Deserialize)]
pub struct RawFrame {
    pub timestamp_s: f64,
    pub landmarks: Vec<[f32; 3]>,
}

/// Scale a raw frame into the target pixel space. Stream space and display
/// space are two independent scalings of the same detection; the core only
/// ever consumes the stream scaling.
pub fn to_pose_frame(raw: &RawFrame, width: u32, height: u32) -> PoseFrame {
    let mut joints = HashMap::new();
    if raw.landmarks.len() >= EXPECTED_LANDMARKS {
        for (name, idx) in MODEL_INDEX {
            let [x, y, visibility] = raw.landmarks[idx];
            joints.insert(
                name,
                Joint {
                    x: (x as f64 * width as f64).round() as i32,
                    y: (y as f64 * height as f64).round() as i32,
                    visibility,
                },
            );
        }
    }
    PoseFrame {
        t: raw.timestamp_s,
        joints,
    }
}
