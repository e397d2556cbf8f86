// src/pipeline/mod.rs

pub mod dispatcher;
pub mod event_bus;
pub mod metrics;

pub use dispatcher::{
    spawn_dispatch_worker, AlertRequest, CooldownStore, NotificationGate, ALERT_QUEUE_DEPTH,
};
pub use event_bus::{EventBus, PipelineEvent};
pub use metrics::PipelineMetrics;
