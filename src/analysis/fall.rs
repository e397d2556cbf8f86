// src/analysis/fall.rs
//
// Fall confidence scoring and the fall-window hysteresis timer.
//
// Confidence is a weighted sum of four boolean signals — each contributes
// its full weight or nothing. A sleeping subject (horizontal inside the
// bed ROI) forces the confidence to exactly 0, which also zeroes the
// displayed metric, not just the safe flag.

use crate::types::FallConfig;

const W_HORIZONTAL: f32 = 0.35;
const W_GROUND: f32 = 0.25;
const W_SUDDEN: f32 = 0.25;
const W_INACTIVE: f32 = 0.15;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallInputs {
    pub horizontal: bool,
    pub ground_proximity: bool,
    pub sudden: bool,
    pub inactive_after_sudden: bool,
    pub sleeping: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct FallAssessment {
    pub confidence: f32,
    pub safe: bool,
    /// Seconds the current fall episode has been active; 0 outside a
    /// window.
    pub timer_s: f64,
}

/// Window flag and trigger timestamp set and cleared together.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FallWindow {
    Clear,
    Open { triggered_at: f64 },
}

pub struct FallScorer {
    conf_threshold: f32,
    window: FallWindow,
}

impl FallScorer {
    pub fn new(config: &FallConfig) -> Self {
        Self {
            conf_threshold: config.conf_threshold,
            window: FallWindow::Clear,
        }
    }

    pub fn in_window(&self) -> bool {
        matches!(self.window, FallWindow::Open { .. })
    }

    pub fn update(&mut self, t: f64, inputs: FallInputs) -> FallAssessment {
        let mut confidence = 0.0;
        if inputs.horizontal {
            confidence += W_HORIZONTAL;
        }
        if inputs.ground_proximity {
            confidence += W_GROUND;
        }
        if inputs.sudden {
            confidence += W_SUDDEN;
        }
        if inputs.inactive_after_sudden {
            confidence += W_INACTIVE;
        }
        // Sleeping always overrides fall scoring.
        if inputs.sleeping {
            confidence = 0.0;
        }

        let safe = confidence < self.conf_threshold || inputs.sleeping;

        // Only the safe→unsafe transition starts a window; repeating
        // unsafe frames must not reset its origin.
        self.window = match (self.window, safe) {
            (FallWindow::Clear, false) => FallWindow::Open { triggered_at: t },
            (open @ FallWindow::Open { .. }, false) => open,
            (_, true) => FallWindow::Clear,
        };

        // Clamped so a backwards timestamp hiccup never reports a
        // negative episode length.
        let timer_s = match self.window {
            FallWindow::Open { triggered_at } => (t - triggered_at).max(0.0),
            FallWindow::Clear => 0.0,
        };

        FallAssessment {
            confidence,
            safe,
            timer_s,
        }
    }
}
