// src/detector.rs
//
// The long-lived core instance. Owns every piece of mutable detection
// state — motion history, gesture bookkeeping, HELP and fall-window
// machines — and advances all of it exactly once per incoming frame.
// Classification never fails: missing joints degrade to neutral evidence
// all the way down.

use crate::analysis::{
    FallInputs, FallScorer, GestureRecognizer, HelpMachine, MotionAnalyzer, OrientationAnalyzer,
    RepCounter,
};
use crate::pipeline::{EventBus, PipelineEvent};
use crate::roi::RoiPolygon;
use crate::types::{Config, JointAngles, PoseFrame, Status, StatusResult};

const EVENT_QUEUE_DEPTH: usize = 64;

pub struct FallDetector {
    roi: Option<RoiPolygon>,
    motion: MotionAnalyzer,
    orientation: OrientationAnalyzer,
    gesture: GestureRecognizer,
    help: HelpMachine,
    fall: FallScorer,
    reps: Option<RepCounter>,
    last_status: Status,
    last_timer_s: f64,
    events: EventBus,
}

impl FallDetector {
    pub fn new(config: &Config, roi: Option<RoiPolygon>) -> Self {
        Self {
            roi,
            motion: MotionAnalyzer::new(&config.fall),
            orientation: OrientationAnalyzer::new(&config.fall, &config.stream),
            gesture: GestureRecognizer::new(config.gesture.mode, &config.waving),
            help: HelpMachine::new(&config.help, config.gesture.mode),
            fall: FallScorer::new(&config.fall),
            reps: config.rehab.enabled.then(|| RepCounter::new(&config.rehab)),
            last_status: Status::Safe,
            last_timer_s: 0.0,
            events: EventBus::new(EVENT_QUEUE_DEPTH),
        }
    }

    /// The ROI editor writes between frames; the core just swaps in the
    /// new snapshot at the next frame boundary.
    pub fn set_roi(&mut self, roi: Option<RoiPolygon>) {
        self.roi = roi;
    }

    pub fn status(&self) -> Status {
        self.last_status
    }

    pub fn drain_events(&mut self) -> Vec<PipelineEvent> {
        self.events.drain()
    }

    pub fn process_frame(&mut self, frame: &PoseFrame) -> StatusResult {
        let shoulders_mid = frame.shoulders_mid();
        let hips_mid = frame.hips_mid();
        let torso_center = frame.torso_center();

        let motion = self.motion.update(frame.t, torso_center);
        let orientation = self.orientation.assess(shoulders_mid, hips_mid);
        let joint_angles = JointAngles::measure(frame);

        let observation = self.gesture.update(frame.t, frame);
        let help_active = self.help.update(frame.t, observation.active);

        // Sleeping gate: a horizontal subject resting inside the bed ROI
        // must not be scored as fallen.
        let reference = torso_center.or(hips_mid);
        let sleeping = orientation.horizontal
            && match (reference, &self.roi) {
                (Some(point), Some(roi)) => roi.contains(point),
                _ => false,
            };

        let was_in_window = self.fall.in_window();
        let assessment = self.fall.update(
            frame.t,
            FallInputs {
                horizontal: orientation.horizontal,
                ground_proximity: orientation.ground_proximity,
                sudden: motion.sudden,
                inactive_after_sudden: motion.inactive_after_sudden,
                sleeping,
            },
        );
        if !was_in_window && self.fall.in_window() {
            self.events.publish(PipelineEvent::FallWindowOpened {
                t: frame.t,
                confidence: assessment.confidence,
            });
        } else if was_in_window && !self.fall.in_window() {
            self.events.publish(PipelineEvent::FallWindowClosed {
                t: frame.t,
                duration_s: self.last_timer_s,
            });
        }
        self.last_timer_s = assessment.timer_s;

        let status = resolve_status(help_active, assessment.safe, sleeping);
        if status != self.last_status {
            self.events.publish(PipelineEvent::StatusChanged {
                from: self.last_status,
                to: status,
                t: frame.t,
                fall_confidence: assessment.confidence,
            });
            self.last_status = status;
        }

        let reps = self.reps.as_mut().map(|counter| counter.update(frame));

        StatusResult {
            status,
            fall_confidence: assessment.confidence,
            fall_timer_s: assessment.timer_s,
            gesture_active: observation.active,
            joint_angles,
            reps,
        }
    }
}

/// Fixed-priority merge: an explicit help request always outranks the
/// automatic fall verdict.
fn resolve_status(help_active: bool, safe: bool, sleeping: bool) -> Status {
    if help_active {
        Status::Help
    } else if !safe && !sleeping {
        Status::Emergency
    } else if sleeping {
        Status::SafeSleeping
    } else {
        Status::Safe
    }
}
