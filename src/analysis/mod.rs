// src/analysis/mod.rs
//
// Per-frame signal analyzers feeding the status resolver.
//
// Signal flow:
//   PoseFrame → motion ───────────────┐ (sudden / inactivity)
//   PoseFrame → orientation ──────────┼→ fall scorer → safe / timer
//   ROI gate  → sleeping ─────────────┘
//   PoseFrame → gesture → help machine → HELP active
//
// Orchestrated by detector::FallDetector.

pub mod fall;
pub mod gesture;
pub mod help;
pub mod motion;
pub mod orientation;
pub mod rep_counter;

// Re-exports for ergonomic access from the detector and main.rs
pub use fall::{FallAssessment, FallInputs, FallScorer};
pub use gesture::{GestureObservation, GestureRecognizer};
pub use help::{HelpMachine, HelpState};
pub use motion::{MotionAnalyzer, MotionSignals};
pub use orientation::{OrientationAnalyzer, OrientationSignals};
pub use rep_counter::{RepCounter, RepSummary};
