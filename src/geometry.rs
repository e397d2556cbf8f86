// src/geometry.rs
//
// Pure 2D helpers shared by every analyzer. Degenerate inputs (coincident
// points, zero-length vectors) short-circuit to neutral values instead of
// dividing by zero.

/// Euclidean distance between two points.
pub fn distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

/// Midpoint of two points, rounded to whole pixels to stay in the same
/// integer pixel space as joint coordinates.
pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (((a.0 + b.0) / 2.0).round(), ((a.1 + b.1) / 2.0).round())
}

/// Angle at vertex `b` of the triangle `a-b-c`, in degrees [0, 180].
/// Returns 0 when either limb has zero length.
pub fn angle_between(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    let ba = (a.0 - b.0, a.1 - b.1);
    let bc = (c.0 - b.0, c.1 - b.1);
    let mag_ba = ba.0.hypot(ba.1);
    let mag_bc = bc.0.hypot(bc.1);
    if mag_ba == 0.0 || mag_bc == 0.0 {
        return 0.0;
    }
    let cos = ((ba.0 * bc.0 + ba.1 * bc.1) / (mag_ba * mag_bc)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Angle of the shoulder-midpoint → hip-midpoint vector against true
/// vertical, in degrees. 0° is fully upright, 90° fully horizontal
/// (screen y grows downward). Coincident midpoints give 0.
///
/// Measured via the arccosine of the normalized vertical component; the
/// clamp keeps floating-point overshoot out of acos's domain.
pub fn torso_vertical_angle(shoulders_mid: (f64, f64), hips_mid: (f64, f64)) -> f64 {
    let vx = hips_mid.0 - shoulders_mid.0;
    let vy = hips_mid.1 - shoulders_mid.1;
    let mag = vx.hypot(vy);
    if mag == 0.0 {
        return 0.0;
    }
    (vy / mag).clamp(-1.0, 1.0).acos().to_degrees()
}
