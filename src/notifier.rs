// src/notifier.rs
//
// Outbound alert transports. The core only sees the Notifier capability;
// the concrete transports here are a Telegram proxy relay (primary) and a
// unified alarm webhook (best-effort secondary fan-out).

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

use crate::types::{AlarmConfig, AlertContext, AlertKind, TelegramConfig};

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_BACKOFF_MS: u64 = 500;

/// Capability handed to the dispatch worker. Returns whether the alert was
/// confirmed delivered; only a `true` here starts the cooldown.
pub trait Notifier {
    fn notify(&self, kind: AlertKind, ctx: AlertContext) -> impl Future<Output = bool> + Send;
}

/// Sends alert texts through a Telegram bot proxy (the proxy holds the bot
/// token; we only post `{chat_id, text}`).
pub struct TelegramNotifier {
    client: reqwest::Client,
    proxy_url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            proxy_url: config.proxy_url.clone(),
            chat_id: config.chat_id.clone(),
        })
    }

    fn message_text(kind: AlertKind, ctx: AlertContext) -> String {
        let wall_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        match kind {
            AlertKind::Help => format!(
                "🆘 HELP: assistance gesture detected\nTime: {wall_time}\nStream t: {:.1}s",
                ctx.timestamp
            ),
            AlertKind::Fall => format!(
                "🚨 EMERGENCY: FALL DETECTED\nTime: {wall_time}\nFall Confidence: {}%",
                (ctx.confidence.unwrap_or(0.0) * 100.0).round()
            ),
        }
    }
}

impl Notifier for TelegramNotifier {
    fn notify(&self, kind: AlertKind, ctx: AlertContext) -> impl Future<Output = bool> + Send {
        let client = self.client.clone();
        let proxy_url = self.proxy_url.clone();
        let chat_id = self.chat_id.clone();
        async move {
            if proxy_url.is_empty() || chat_id.is_empty() {
                warn!("Telegram transport not configured, dropping {} alert", kind.as_str());
                return false;
            }
            let body = json!({
                "chat_id": chat_id,
                "text": TelegramNotifier::message_text(kind, ctx),
            });
            match client.post(&proxy_url).json(&body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Telegram {} alert delivered", kind.as_str());
                    true
                }
                Ok(resp) => {
                    warn!(
                        "Telegram proxy rejected {} alert: HTTP {}",
                        kind.as_str(),
                        resp.status()
                    );
                    false
                }
                Err(e) => {
                    warn!("Telegram {} alert failed: {}", kind.as_str(), e);
                    false
                }
            }
        }
    }
}

/// Forwards a unified alarm payload to a configurable endpoint with bounded
/// retries and linear backoff. Secondary transport: its outcome never
/// touches the cooldown store.
pub struct AlarmWebhookNotifier {
    client: reqwest::Client,
    config: AlarmConfig,
}

impl AlarmWebhookNotifier {
    pub fn new(config: &AlarmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.endpoint_url.is_empty()
    }

    fn payload(&self, kind: AlertKind, ctx: AlertContext) -> serde_json::Value {
        json!({
            "event": "alarm",
            "original_type": kind.as_str(),
            "device_id": if self.config.device_id.is_empty() {
                serde_json::Value::Null
            } else {
                json!(self.config.device_id)
            },
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "severity": "high",
            "metadata": {
                "confidence": ctx.confidence,
                "stream_t": ctx.timestamp,
            },
        })
    }

    pub async fn forward(&self, kind: AlertKind, ctx: AlertContext) -> bool {
        if !self.is_configured() {
            return false;
        }
        let payload = self.payload(kind, ctx);
        for attempt in 0..=self.config.retries {
            let mut req = self.client.post(&self.config.endpoint_url).json(&payload);
            if !self.config.api_key.is_empty() {
                req = req.header("x-api-key", &self.config.api_key);
            }
            match req.send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Alarm webhook accepted {} alert", kind.as_str());
                    return true;
                }
                Ok(resp) => warn!(
                    "Alarm webhook attempt {}/{} rejected: HTTP {}",
                    attempt + 1,
                    self.config.retries + 1,
                    resp.status()
                ),
                Err(e) => warn!(
                    "Alarm webhook attempt {}/{} failed: {}",
                    attempt + 1,
                    self.config.retries + 1,
                    e
                ),
            }
            if attempt < self.config.retries {
                tokio::time::sleep(Duration::from_millis(
                    RETRY_BACKOFF_MS * (attempt as u64 + 1),
                ))
                .await;
            }
        }
        false
    }
}
