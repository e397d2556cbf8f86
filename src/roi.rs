// src/roi.rs
//
// Bed region-of-interest: a persisted quadrilateral in stream pixel space,
// written by an external editor and only read here. Suppresses fall scoring
// for a horizontal subject resting inside it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Ordered quadrilateral, any simple (possibly rotated) shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiPolygon {
    pub points: [(f64, f64); 4],
}

impl RoiPolygon {
    /// Axis-aligned rectangle, the shape the editor produces by default.
    pub fn from_rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            points: [(x, y), (x + w, y), (x + w, y + h), (x, y + h)],
        }
    }

    /// Copy of this polygon rotated by `angle_deg` about `center`.
    pub fn rotated(&self, angle_deg: f64, center: (f64, f64)) -> Self {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let mut points = self.points;
        for p in &mut points {
            let dx = p.0 - center.0;
            let dy = p.1 - center.1;
            *p = (
                center.0 + dx * cos - dy * sin,
                center.1 + dx * sin + dy * cos,
            );
        }
        Self { points }
    }

    /// Even-odd ray-cast containment test. Degenerate polygons (zero area)
    /// contain nothing.
    pub fn contains(&self, p: (f64, f64)) -> bool {
        if self.is_degenerate() {
            return false;
        }
        let mut inside = false;
        let mut j = 3;
        for i in 0..4 {
            let (xi, yi) = self.points[i];
            let (xj, yj) = self.points[j];
            if (yi > p.1) != (yj > p.1) && p.0 < (xj - xi) * (p.1 - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn is_degenerate(&self) -> bool {
        // Shoelace area of the quad.
        let mut area2 = 0.0;
        let mut j = 3;
        for i in 0..4 {
            let (xi, yi) = self.points[i];
            let (xj, yj) = self.points[j];
            area2 += xj * yi - xi * yj;
            j = i;
        }
        area2.abs() < 1e-9
    }
}

/// Load the persisted ROI. Absent or unreadable file means "no gating".
pub fn load_roi(path: &Path) -> Option<RoiPolygon> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            info!("No ROI file at {}, fall gating disabled", path.display());
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(roi) => {
            info!("Loaded bed ROI from {}", path.display());
            Some(roi)
        }
        Err(e) => {
            warn!("Ignoring unreadable ROI file {}: {}", path.display(), e);
            None
        }
    }
}

/// Persist (or with `None`, delete) the ROI. The editor side of the
/// persistence interface; the detection path only loads.
#[allow(dead_code)]
pub fn save_roi(path: &Path, roi: Option<&RoiPolygon>) -> Result<()> {
    match roi {
        Some(roi) => {
            let json = serde_json::to_string_pretty(roi)?;
            fs::write(path, json)
                .with_context(|| format!("writing ROI to {}", path.display()))?;
        }
        None => {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("removing ROI at {}", path.display()))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_containment() {
        let roi = RoiPolygon::from_rect(100.0, 50.0, 200.0, 80.0);
        assert!(roi.contains((200.0, 90.0)));
        assert!(!roi.contains((99.0, 90.0)));
        assert!(!roi.contains((200.0, 131.0)));
    }

    #[test]
    fn test_rotation_invariance() {
        // A point inside stays inside after rotating polygon and point by
        // the same angle about the same center.
        let roi = RoiPolygon::from_rect(100.0, 100.0, 120.0, 60.0);
        let inside = (150.0, 120.0);
        let center = (160.0, 130.0);
        for angle in [15.0, 37.0, 90.0, 145.0, 213.0] {
            let rotated = roi.rotated(angle, center);
            let (sin, cos) = angle.to_radians().sin_cos();
            let dx = inside.0 - center.0;
            let dy = inside.1 - center.1;
            let rotated_point = (
                center.0 + dx * cos - dy * sin,
                center.1 + dx * sin + dy * cos,
            );
            assert!(
                rotated.contains(rotated_point),
                "containment lost at {angle}°"
            );
        }
    }

    #[test]
    fn test_rotated_quad_is_not_bounding_box() {
        // A corner of the original rect falls outside the rotated quad.
        let roi = RoiPolygon::from_rect(0.0, 0.0, 100.0, 100.0).rotated(45.0, (50.0, 50.0));
        assert!(roi.contains((50.0, 50.0)));
        assert!(!roi.contains((5.0, 5.0)));
    }

    #[test]
    fn test_degenerate_contains_nothing() {
        let roi = RoiPolygon {
            points: [(10.0, 10.0); 4],
        };
        assert!(!roi.contains((10.0, 10.0)));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let path = std::env::temp_dir().join("fallwatch_roi_roundtrip.json");
        let roi = RoiPolygon::from_rect(10.0, 20.0, 30.0, 40.0).rotated(30.0, (25.0, 40.0));

        save_roi(&path, Some(&roi)).unwrap();
        assert_eq!(load_roi(&path), Some(roi));

        save_roi(&path, None).unwrap();
        assert_eq!(load_roi(&path), None);
    }

    #[test]
    fn test_missing_file_loads_none() {
        let path = std::env::temp_dir().join("fallwatch_roi_never_written.json");
        assert_eq!(load_roi(&path), None);
    }
}
