// src/pipeline/dispatcher.rs
//
// Notification gate and dispatch worker.
//
// The gate runs synchronously inside the frame loop: it checks the
// per-kind cooldown and hands qualifying alerts to a bounded channel, so
// frame processing never waits on the network. The worker owns the actual
// delivery and advances the cooldown store only on confirmed success —
// a failed dispatch leaves the store untouched so the next qualifying
// transition retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::notifier::{AlarmWebhookNotifier, Notifier};
use crate::pipeline::metrics::PipelineMetrics;
use crate::types::{AlertContext, AlertKind};

pub const ALERT_QUEUE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct AlertRequest {
    pub kind: AlertKind,
    pub confidence: Option<f32>,
    /// Frame time of the triggering transition, in monotonic stream
    /// seconds — the same domain the cooldown store compares against.
    pub t: f64,
}

/// Last confirmed dispatch time per alert kind. HELP and FALL never share
/// a slot.
#[derive(Debug, Clone, Default)]
pub struct CooldownStore {
    inner: Arc<Mutex<HashMap<AlertKind, f64>>>,
}

impl CooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_dispatch(&self, kind: AlertKind) -> Option<f64> {
        self.inner.lock().expect("cooldown store poisoned").get(&kind).copied()
    }

    pub fn record_success(&self, kind: AlertKind, t: f64) {
        self.inner.lock().expect("cooldown store poisoned").insert(kind, t);
    }
}

pub struct NotificationGate {
    cooldown_s: f64,
    store: CooldownStore,
    tx: mpsc::Sender<AlertRequest>,
}

impl NotificationGate {
    pub fn new(cooldown_s: f64, store: CooldownStore, tx: mpsc::Sender<AlertRequest>) -> Self {
        Self {
            cooldown_s,
            store,
            tx,
        }
    }

    /// Offer one qualifying status transition. Returns whether the alert
    /// was enqueued for delivery.
    pub fn offer(&self, req: AlertRequest) -> bool {
        if let Some(last) = self.store.last_dispatch(req.kind) {
            if req.t - last < self.cooldown_s {
                debug!(
                    "Suppressed {} alert at t={:.2}s (cooldown, last sent {:.2}s)",
                    req.kind.as_str(),
                    req.t,
                    last
                );
                return false;
            }
        }
        match self.tx.try_send(req) {
            Ok(()) => true,
            Err(e) => {
                warn!("Alert queue rejected {} alert: {}", req.kind.as_str(), e);
                false
            }
        }
    }
}

/// Consume queued alerts, deliver them, and commit cooldowns on success.
/// The secondary alarm webhook fires only after a confirmed primary
/// delivery and never affects the cooldown.
pub fn spawn_dispatch_worker<N>(
    mut rx: mpsc::Receiver<AlertRequest>,
    notifier: N,
    forward: Option<AlarmWebhookNotifier>,
    store: CooldownStore,
    metrics: PipelineMetrics,
) -> JoinHandle<()>
where
    N: Notifier + Send + Sync + 'static,
{
    tokio::spawn(async move {
        while let Some(req) = rx.recv().await {
            let ctx = AlertContext {
                confidence: req.confidence,
                timestamp: req.t,
            };
            if notifier.notify(req.kind, ctx).await {
                store.record_success(req.kind, req.t);
                metrics.inc(&metrics.notifications_sent);
                if let Some(webhook) = &forward {
                    if !webhook.forward(req.kind, ctx).await && webhook.is_configured() {
                        warn!("Alarm webhook fan-out failed for {} alert", req.kind.as_str());
                    }
                }
            } else {
                metrics.inc(&metrics.notification_failures);
                warn!(
                    "{} alert at t={:.2}s not delivered; cooldown left open for retry",
                    req.kind.as_str(),
                    req.t
                );
            }
        }
        info!("Dispatch worker shut down");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockNotifier {
        succeed: AtomicBool,
        calls: Arc<Mutex<Vec<AlertKind>>>,
    }

    impl MockNotifier {
        fn new(succeed: bool) -> (Self, Arc<Mutex<Vec<AlertKind>>>) {
            let calls = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    succeed: AtomicBool::new(succeed),
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    impl Notifier for MockNotifier {
        fn notify(
            &self,
            kind: AlertKind,
            _ctx: AlertContext,
        ) -> impl std::future::Future<Output = bool> + Send {
            self.calls.lock().unwrap().push(kind);
            let ok = self.succeed.load(Ordering::SeqCst);
            async move { ok }
        }
    }

    fn request(kind: AlertKind, t: f64) -> AlertRequest {
        AlertRequest {
            kind,
            confidence: Some(0.85),
            t,
        }
    }

    /// Closing the gate drops the only sender, letting the worker drain
    /// and exit.
    async fn shutdown(gate: NotificationGate, worker: JoinHandle<()>) {
        drop(gate);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_success_commits_cooldown_and_suppresses_repeat() {
        let (tx, rx) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let store = CooldownStore::new();
        let gate = NotificationGate::new(60.0, store.clone(), tx);
        let (notifier, calls) = MockNotifier::new(true);
        let worker =
            spawn_dispatch_worker(rx, notifier, None, store.clone(), PipelineMetrics::new());

        assert!(gate.offer(request(AlertKind::Help, 10.0)));
        shutdown(gate, worker).await;

        assert_eq!(store.last_dispatch(AlertKind::Help), Some(10.0));
        assert_eq!(calls.lock().unwrap().len(), 1);
        // Within the 60s window the gate refuses; past it, it accepts.
        let (tx2, _rx2) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let gate = NotificationGate::new(60.0, store.clone(), tx2);
        assert!(!gate.offer(request(AlertKind::Help, 50.0)));
        assert!(gate.offer(request(AlertKind::Help, 70.1)));
    }

    #[tokio::test]
    async fn test_failure_leaves_cooldown_open() {
        let (tx, rx) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let store = CooldownStore::new();
        let gate = NotificationGate::new(60.0, store.clone(), tx);
        let metrics = PipelineMetrics::new();
        let (notifier, _calls) = MockNotifier::new(false);
        let worker = spawn_dispatch_worker(rx, notifier, None, store.clone(), metrics.clone());

        assert!(gate.offer(request(AlertKind::Fall, 10.0)));
        shutdown(gate, worker).await;

        assert_eq!(store.last_dispatch(AlertKind::Fall), None);
        assert_eq!(
            metrics
                .notification_failures
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
        // The very next qualifying transition retries.
        let (tx2, _rx2) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let gate = NotificationGate::new(60.0, store.clone(), tx2);
        assert!(gate.offer(request(AlertKind::Fall, 10.5)));
    }

    #[tokio::test]
    async fn test_cooldowns_are_independent_per_kind() {
        let (tx, rx) = mpsc::channel(ALERT_QUEUE_DEPTH);
        let store = CooldownStore::new();
        let gate = NotificationGate::new(60.0, store.clone(), tx);
        let (notifier, calls) = MockNotifier::new(true);
        let worker =
            spawn_dispatch_worker(rx, notifier, None, store.clone(), PipelineMetrics::new());

        // A HELP dispatch must not block an immediately-following FALL.
        assert!(gate.offer(request(AlertKind::Help, 10.0)));
        assert!(gate.offer(request(AlertKind::Fall, 10.1)));
        shutdown(gate, worker).await;

        assert_eq!(store.last_dispatch(AlertKind::Help), Some(10.0));
        assert_eq!(store.last_dispatch(AlertKind::Fall), Some(10.1));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }
}
