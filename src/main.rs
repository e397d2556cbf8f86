// src/main.rs

mod analysis;
mod config;
mod detector;
mod geometry;
mod landmarks;
mod notifier;
mod pipeline;
mod roi;
mod types;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use detector::FallDetector;
use landmarks::RawFrame;
use notifier::{AlarmWebhookNotifier, TelegramNotifier};
use pipeline::{
    spawn_dispatch_worker, AlertRequest, CooldownStore, NotificationGate, PipelineEvent,
    PipelineMetrics, ALERT_QUEUE_DEPTH,
};
use roi::RoiPolygon;
use types::{AlertKind, Config, Status};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let have_config = Path::new(&config_path).exists();
    let config = if have_config {
        Config::load(Path::new(&config_path))?
    } else {
        Config::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("fallwatch={}", config.logging.level))
            }),
        )
        .init();

    info!("🧍 Fallwatch starting");
    if !have_config {
        warn!("No config at {}, using built-in defaults", config_path);
    }
    info!(
        "Gesture mode: {:?}, fall threshold {:.2}, cooldown {:.0}s",
        config.gesture.mode, config.fall.conf_threshold, config.notify.cooldown_s
    );

    let roi = roi::load_roi(Path::new(&config.roi.path));

    let metrics = PipelineMetrics::new();

    let (gate, worker) = if config.notify.enabled {
        let telegram = TelegramNotifier::new(&config.notify.telegram)?;
        let webhook = AlarmWebhookNotifier::new(&config.notify.alarm)?;
        let forward = webhook.is_configured().then_some(webhook);
        let (tx, rx) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let store = CooldownStore::new();
        let gate = NotificationGate::new(config.notify.cooldown_s, store.clone(), tx);
        let worker = spawn_dispatch_worker(rx, telegram, forward, store, metrics.clone());
        (Some(gate), Some(worker))
    } else {
        info!("Notifications disabled");
        (None, None)
    };

    let recordings = find_recordings(&config.input.dir)?;
    if recordings.is_empty() {
        error!("No .jsonl recordings found in {}", config.input.dir);
        return Ok(());
    }
    info!("Found {} recording(s) to process", recordings.len());

    for (idx, path) in recordings.iter().enumerate() {
        info!(
            "Processing recording {}/{}: {}",
            idx + 1,
            recordings.len(),
            path.display()
        );
        if let Err(e) = process_recording(path, &config, roi, gate.as_ref(), &metrics) {
            error!("Failed to process {}: {:#}", path.display(), e);
        }
    }

    let summary = metrics.summary();
    info!(
        "Run complete: {} frames ({} with pose) in {:.1}s ({:.1} fps)",
        summary.total_frames, summary.frames_with_pose, summary.elapsed_secs, summary.fps
    );
    info!(
        "Events: {} HELP, {} FALL across {} transitions; notifications: {} sent, {} failed, {} suppressed",
        summary.help_events,
        summary.fall_events,
        summary.status_transitions,
        summary.notifications_sent,
        summary.notification_failures,
        summary.notifications_suppressed
    );

    // Close the alert queue and let in-flight dispatches finish.
    drop(gate);
    if let Some(worker) = worker {
        let _ = worker.await;
    }

    Ok(())
}

fn find_recordings(dir: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .map_or(false, |ext| ext == "jsonl")
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// Replay one landmark recording through a fresh detector at recorded
/// cadence.
fn process_recording(
    path: &Path,
    config: &Config,
    roi: Option<RoiPolygon>,
    gate: Option<&NotificationGate>,
    metrics: &PipelineMetrics,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut detector = FallDetector::new(config, roi);

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawFrame = match serde_json::from_str(&line) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "{}:{}: skipping malformed frame: {}",
                    path.display(),
                    line_no + 1,
                    e
                );
                continue;
            }
        };
        let frame = landmarks::to_pose_frame(&raw, config.stream.width, config.stream.height);
        metrics.inc(&metrics.total_frames);
        if frame.has_pose() {
            metrics.inc(&metrics.frames_with_pose);
        }

        let result = detector.process_frame(&frame);
        debug!(
            "t={:.2}s status={} conf={:.2} timer={:.1}s gesture={}",
            frame.t,
            result.status,
            result.fall_confidence,
            result.fall_timer_s,
            result.gesture_active
        );

        for event in detector.drain_events() {
            handle_event(event, gate, metrics);
        }
    }

    Ok(())
}

fn handle_event(
    event: PipelineEvent,
    gate: Option<&NotificationGate>,
    metrics: &PipelineMetrics,
) {
    match event {
        PipelineEvent::StatusChanged {
            from,
            to,
            t,
            fall_confidence,
        } => {
            metrics.inc(&metrics.status_transitions);
            info!("Status {} → {} at t={:.2}s", from, to, t);
            let request = match to {
                Status::Help => {
                    metrics.inc(&metrics.help_events);
                    Some(AlertRequest {
                        kind: AlertKind::Help,
                        confidence: None,
                        t,
                    })
                }
                Status::Emergency => {
                    metrics.inc(&metrics.fall_events);
                    Some(AlertRequest {
                        kind: AlertKind::Fall,
                        confidence: Some(fall_confidence),
                        t,
                    })
                }
                _ => None,
            };
            if let (Some(request), Some(gate)) = (request, gate) {
                if !gate.offer(request) {
                    metrics.inc(&metrics.notifications_suppressed);
                }
            }
        }
        PipelineEvent::FallWindowOpened { t, confidence } => {
            warn!(
                "Fall window opened at t={:.2}s (confidence {:.2})",
                t, confidence
            );
        }
        PipelineEvent::FallWindowClosed { t, duration_s } => {
            info!("Fall window closed at t={:.2}s after {:.1}s", t, duration_s);
        }
    }
}
