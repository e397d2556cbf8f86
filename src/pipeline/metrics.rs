// src/pipeline/metrics.rs
//
// Run observability. Counters shared between the frame loop and the
// dispatch worker; summarized per recording and at shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_pose: Arc<AtomicU64>,
    pub status_transitions: Arc<AtomicU64>,
    pub help_events: Arc<AtomicU64>,
    pub fall_events: Arc<AtomicU64>,
    pub notifications_sent: Arc<AtomicU64>,
    pub notification_failures: Arc<AtomicU64>,
    pub notifications_suppressed: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_pose: Arc::new(AtomicU64::new(0)),
            status_transitions: Arc::new(AtomicU64::new(0)),
            help_events: Arc::new(AtomicU64::new(0)),
            fall_events: Arc::new(AtomicU64::new(0)),
            notifications_sent: Arc::new(AtomicU64::new(0)),
            notification_failures: Arc::new(AtomicU64::new(0)),
            notifications_suppressed: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            frames_with_pose: self.frames_with_pose.load(Ordering::Relaxed),
            status_transitions: self.status_transitions.load(Ordering::Relaxed),
            help_events: self.help_events.load(Ordering::Relaxed),
            fall_events: self.fall_events.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notification_failures: self.notification_failures.load(Ordering::Relaxed),
            notifications_suppressed: self.notifications_suppressed.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_pose: u64,
    pub status_transitions: u64,
    pub help_events: u64,
    pub fall_events: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    pub notifications_suppressed: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
