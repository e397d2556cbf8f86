// src/analysis/help.rs
//
// HELP state machine: sustain, then hold, then quiet-clear.
//
//   Idle ──gesture active──▶ Sustaining ──active ≥ sustain_s──▶ Active
//   Active: every active frame pushes expires_at to now + hold_s.
//   Active ──▶ Idle only when now ≥ expires_at AND the gesture has been
//   inactive for ≥ clear_after_quiet_s. The double condition keeps a
//   single dropped frame from flicker-clearing a live request.

use crate::types::{GestureMode, HelpConfig};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HelpState {
    Idle,
    Sustaining { since: f64 },
    Active { since: f64, expires_at: f64 },
}

pub struct HelpMachine {
    sustain_s: f64,
    hold_s: f64,
    clear_after_quiet_s: f64,
    state: HelpState,
    last_active_at: Option<f64>,
}

impl HelpMachine {
    pub fn new(config: &HelpConfig, mode: GestureMode) -> Self {
        Self {
            sustain_s: config.resolved_sustain_s(mode),
            hold_s: config.hold_s,
            clear_after_quiet_s: config.clear_after_quiet_s,
            state: HelpState::Idle,
            last_active_at: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> HelpState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, HelpState::Active { .. })
    }

    /// Advance one frame. Returns whether HELP is active after the
    /// transition.
    pub fn update(&mut self, t: f64, gesture_active: bool) -> bool {
        if gesture_active {
            self.last_active_at = Some(t);
        }
        self.state = Self::step(
            self.state,
            t,
            gesture_active,
            self.last_active_at,
            self.sustain_s,
            self.hold_s,
            self.clear_after_quiet_s,
        );
        self.is_active()
    }

    /// Pure transition function, kept separate so the double-condition
    /// clear is testable without an instance.
    fn step(
        state: HelpState,
        t: f64,
        gesture_active: bool,
        last_active_at: Option<f64>,
        sustain_s: f64,
        hold_s: f64,
        clear_after_quiet_s: f64,
    ) -> HelpState {
        match state {
            HelpState::Idle => {
                if gesture_active {
                    HelpState::Sustaining { since: t }
                } else {
                    HelpState::Idle
                }
            }
            HelpState::Sustaining { since } => {
                if !gesture_active {
                    HelpState::Idle
                } else if t - since >= sustain_s {
                    HelpState::Active {
                        since: t,
                        expires_at: t + hold_s,
                    }
                } else {
                    HelpState::Sustaining { since }
                }
            }
            HelpState::Active { since, expires_at } => {
                if gesture_active {
                    // The hold window never shrinks while the trigger
                    // persists.
                    HelpState::Active {
                        since,
                        expires_at: t + hold_s,
                    }
                } else {
                    let quiet = t - last_active_at.unwrap_or(0.0);
                    if t >= expires_at && quiet >= clear_after_quiet_s {
                        HelpState::Idle
                    } else {
                        HelpState::Active { since, expires_at }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> HelpMachine {
        // Arms-crossed variant: sustain 0.4s, hold 6s, quiet 2s.
        HelpMachine::new(&HelpConfig::default(), GestureMode::ArmsCrossed)
    }

    fn drive(m: &mut HelpMachine, from: f64, to: f64, step: f64, active: bool) -> bool {
        let mut t = from;
        let mut out = m.is_active();
        while t <= to + 1e-9 {
            out = m.update(t, active);
            t += step;
        }
        out
    }

    #[test]
    fn test_sustain_just_under_threshold_does_not_activate() {
        let mut m = machine();
        assert!(!drive(&mut m, 0.0, 0.39, 0.01, true));
    }

    #[test]
    fn test_sustain_past_threshold_activates() {
        let mut m = machine();
        assert!(drive(&mut m, 0.0, 0.41, 0.01, true));
    }

    #[test]
    fn test_hold_expiry_alone_does_not_clear() {
        let mut m = machine();
        drive(&mut m, 0.0, 1.0, 0.05, true);
        assert!(m.is_active());
        // Gesture stops at t=1.0; hold expires at ~7.0. At t=7.5 the hold
        // has expired AND quiet (6.5s) elapsed — but probe just past
        // expiry with quiet not yet elapsed first:
        // keep gesture active until t=6.0 so expiry lands at 12.0.
        drive(&mut m, 1.0, 6.0, 0.05, true);
        // Quiet starts at 6.0. At 12.5: expired (>=12.0) and quiet 6.5s →
        // clears. At 11.0: not expired, quiet 5s → still active.
        assert!(drive(&mut m, 6.05, 11.0, 0.05, false));
        assert!(!drive(&mut m, 11.05, 12.5, 0.05, false));
    }

    #[test]
    fn test_quiet_alone_does_not_clear() {
        let mut m = machine();
        drive(&mut m, 0.0, 1.0, 0.05, true);
        // Expiry sits at ~7.0. Quiet for 3s (> 2s) by t=4.0, but the hold
        // has not expired → still active.
        assert!(drive(&mut m, 1.05, 4.0, 0.05, false));
    }

    #[test]
    fn test_clears_when_both_conditions_hold() {
        let mut m = machine();
        drive(&mut m, 0.0, 1.0, 0.05, true);
        // Hold expires at 7.0; quiet since 1.0. At 7.05 both hold.
        assert!(!drive(&mut m, 1.05, 7.05, 0.05, false));
    }

    #[test]
    fn test_single_dropped_frame_does_not_clear() {
        let mut m = machine();
        drive(&mut m, 0.0, 1.0, 0.05, true);
        m.update(1.05, false); // one dropped frame
        assert!(m.is_active());
        assert!(m.update(1.10, true));
    }

    #[test]
    fn test_streak_shorter_than_sustain_resets() {
        let mut m = machine();
        // 0.2s bursts separated by gaps never reach the 0.4s sustain.
        for burst in 0..5 {
            let start = burst as f64;
            drive(&mut m, start, start + 0.2, 0.05, true);
            m.update(start + 0.3, false);
        }
        assert!(!m.is_active());
    }

    #[test]
    fn test_waving_variant_uses_longer_sustain() {
        let mut m = HelpMachine::new(&HelpConfig::default(), GestureMode::Waving);
        assert!(!drive(&mut m, 0.0, 1.4, 0.05, true));
        assert!(drive(&mut m, 1.45, 1.6, 0.05, true));
    }
}
