// src/analysis/motion.rs
//
// Torso-center speed tracking. Keeps a capped ring buffer of raw samples
// for the instantaneous delta and an EMA-smoothed speed for the derived
// flags. The fall signature this feeds is "sudden motion immediately
// followed by stillness".

use std::collections::VecDeque;

use crate::geometry;
use crate::types::FallConfig;

/// Elapsed-time floor: frames can arrive with equal or backwards
/// timestamps; the denominator never drops below this.
const MIN_DT_S: f64 = 1e-3;

const HISTORY_CAP: usize = 90;
const EMA_ALPHA: f64 = 0.3;

#[derive(Debug, Clone, Copy)]
pub struct MotionSample {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MotionSignals {
    pub smoothed_speed: f64,
    pub sudden: bool,
    pub inactive_after_sudden: bool,
}

pub struct MotionAnalyzer {
    sudden_speed_thresh: f64,
    inactivity_window_s: f64,
    inactivity_speed_thresh: f64,
    history: VecDeque<MotionSample>,
    speed_ema: Option<f64>,
    last_sudden_at: Option<f64>,
}

impl MotionAnalyzer {
    pub fn new(config: &FallConfig) -> Self {
        Self {
            sudden_speed_thresh: config.sudden_speed_thresh,
            inactivity_window_s: config.inactivity_window_s,
            inactivity_speed_thresh: config.inactivity_speed_thresh,
            history: VecDeque::with_capacity(HISTORY_CAP),
            speed_ema: None,
            last_sudden_at: None,
        }
    }

    /// Feed one frame. `center` is the torso center if the frame resolved
    /// one; an unresolvable center contributes a zero speed sample to the
    /// EMA (no evidence of motion), matching the rest of the pipeline's
    /// neutral-degradation rule.
    pub fn update(&mut self, t: f64, center: Option<(f64, f64)>) -> MotionSignals {
        let mut speed = 0.0;
        if let Some((x, y)) = center {
            if let Some(last) = self.history.back() {
                let dt = (t - last.t).max(MIN_DT_S);
                speed = geometry::distance((x, y), (last.x, last.y)) / dt;
            }
            // Keep the buffer's timestamps non-decreasing even if the
            // source hiccups backwards.
            let t_stored = self.history.back().map_or(t, |last| t.max(last.t));
            self.history.push_back(MotionSample { t: t_stored, x, y });
            if self.history.len() > HISTORY_CAP {
                self.history.pop_front();
            }
        }

        let smoothed = match self.speed_ema {
            None => speed,
            Some(prev) => EMA_ALPHA * speed + (1.0 - EMA_ALPHA) * prev,
        };
        self.speed_ema = Some(smoothed);

        let sudden = smoothed >= self.sudden_speed_thresh;
        if sudden {
            self.last_sudden_at = Some(t);
        }
        let inactive_after_sudden = self
            .last_sudden_at
            .map_or(false, |at| t - at <= self.inactivity_window_s)
            && smoothed <= self.inactivity_speed_thresh;

        MotionSignals {
            smoothed_speed: smoothed,
            sudden,
            inactive_after_sudden,
        }
    }

    #[allow(dead_code)]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> MotionAnalyzer {
        MotionAnalyzer::new(&FallConfig::default())
    }

    #[test]
    fn test_zero_dt_never_produces_infinite_speed() {
        let mut m = analyzer();
        m.update(1.0, Some((0.0, 0.0)));
        let signals = m.update(1.0, Some((100.0, 0.0)));
        assert!(signals.smoothed_speed.is_finite());
        // 100px over the clamped 1ms floor → raw 100_000 px/s, EMA'd at 0.3.
        assert!((signals.smoothed_speed - 30_000.0).abs() < 1.0);
    }

    #[test]
    fn test_backwards_timestamp_is_clamped_not_rejected() {
        let mut m = analyzer();
        m.update(2.0, Some((0.0, 0.0)));
        let signals = m.update(1.5, Some((1.0, 0.0)));
        assert!(signals.smoothed_speed.is_finite());
        assert_eq!(m.history_len(), 2);
    }

    #[test]
    fn test_ema_seeded_by_first_value() {
        let mut m = analyzer();
        // First call has no previous sample, so speed 0 seeds the EMA.
        let signals = m.update(0.0, Some((50.0, 50.0)));
        assert_eq!(signals.smoothed_speed, 0.0);
    }

    #[test]
    fn test_history_capped_at_ninety() {
        let mut m = analyzer();
        for i in 0..200 {
            m.update(i as f64 * 0.033, Some((0.0, 0.0)));
        }
        assert_eq!(m.history_len(), 90);
    }

    #[test]
    fn test_sudden_then_still_flags_inactivity() {
        let mut m = analyzer();
        let mut t = 0.0;
        m.update(t, Some((0.0, 0.0)));
        // Large jumps until the EMA crosses the sudden threshold.
        let mut x = 0.0;
        let mut sudden_seen = false;
        for _ in 0..20 {
            t += 0.033;
            x += 40.0; // ~1200 px/s raw
            sudden_seen |= m.update(t, Some((x, 0.0))).sudden;
        }
        assert!(sudden_seen);

        // Freeze in place: EMA decays toward 0 within the 2.5s window.
        let mut inactive_seen = false;
        for _ in 0..40 {
            t += 0.033;
            let signals = m.update(t, Some((x, 0.0)));
            if signals.inactive_after_sudden {
                inactive_seen = true;
                break;
            }
        }
        assert!(inactive_seen, "stillness right after sudden motion must flag");
    }

    #[test]
    fn test_stillness_without_prior_sudden_is_not_flagged() {
        let mut m = analyzer();
        for i in 0..60 {
            let signals = m.update(i as f64 * 0.033, Some((100.0, 100.0)));
            assert!(!signals.inactive_after_sudden);
        }
    }

    #[test]
    fn test_inactivity_window_expires() {
        let mut m = analyzer();
        let mut t = 0.0;
        let mut x = 0.0;
        m.update(t, Some((x, 0.0)));
        for _ in 0..20 {
            t += 0.033;
            x += 40.0;
            m.update(t, Some((x, 0.0)));
        }
        // Let the EMA decay, then jump past the 2.5s window.
        for _ in 0..60 {
            t += 0.033;
            m.update(t, Some((x, 0.0)));
        }
        t += 3.0;
        let signals = m.update(t, Some((x, 0.0)));
        assert!(!signals.inactive_after_sudden);
    }
}
