// src/analysis/orientation.rs
//
// Torso orientation and ground proximity. Stateless per frame.

use crate::geometry;
use crate::types::{FallConfig, StreamConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct OrientationSignals {
    pub torso_angle_deg: f64,
    pub horizontal: bool,
    pub ground_proximity: bool,
}

pub struct OrientationAnalyzer {
    horizontal_angle_deg: f64,
    ground_y_px: f64,
}

impl OrientationAnalyzer {
    pub fn new(fall: &FallConfig, stream: &StreamConfig) -> Self {
        Self {
            horizontal_angle_deg: fall.horizontal_angle_deg,
            ground_y_px: fall.ground_y_ratio * stream.height as f64,
        }
    }

    /// Missing midpoints degrade to "no evidence": 0° torso angle and no
    /// ground proximity.
    pub fn assess(
        &self,
        shoulders_mid: Option<(f64, f64)>,
        hips_mid: Option<(f64, f64)>,
    ) -> OrientationSignals {
        let torso_angle_deg = match (shoulders_mid, hips_mid) {
            (Some(s), Some(h)) => geometry::torso_vertical_angle(s, h),
            _ => 0.0,
        };
        OrientationSignals {
            torso_angle_deg,
            horizontal: torso_angle_deg >= self.horizontal_angle_deg,
            ground_proximity: hips_mid.map_or(false, |h| h.1 >= self.ground_y_px),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> OrientationAnalyzer {
        OrientationAnalyzer::new(&FallConfig::default(), &StreamConfig::default())
    }

    #[test]
    fn test_upright_pose_is_not_horizontal() {
        let signals = analyzer().assess(Some((320.0, 100.0)), Some((320.0, 200.0)));
        assert!(!signals.horizontal);
        assert!(signals.torso_angle_deg < 1.0);
    }

    #[test]
    fn test_lying_pose_is_horizontal() {
        let signals = analyzer().assess(Some((200.0, 300.0)), Some((350.0, 300.0)));
        assert!(signals.horizontal);
        assert!((signals.torso_angle_deg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_threshold_boundary() {
        let lean = |deg: f64| {
            let dy = 100.0 * deg.to_radians().cos();
            let dx = 100.0 * deg.to_radians().sin();
            analyzer().assess(Some((100.0, 100.0)), Some((100.0 + dx, 100.0 + dy)))
        };
        assert!(lean(56.0).horizontal);
        assert!(!lean(54.0).horizontal);
    }

    #[test]
    fn test_ground_proximity_at_frame_bottom() {
        // 0.8 × 360 = 288px.
        let a = analyzer();
        assert!(a.assess(None, Some((320.0, 288.0))).ground_proximity);
        assert!(!a.assess(None, Some((320.0, 287.0))).ground_proximity);
    }

    #[test]
    fn test_missing_joints_degrade_neutrally() {
        let signals = analyzer().assess(None, None);
        assert_eq!(signals.torso_angle_deg, 0.0);
        assert!(!signals.horizontal);
        assert!(!signals.ground_proximity);
    }
}
