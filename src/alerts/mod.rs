mod log_sink;
mod webhook;

pub use log_sink::LogAlertSink;
pub use webhook::WebhookAlertSink;

use std::future::Future;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ALERT_TITLE: &str = "HawkWatch Security Alert";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Accent colour used by notification surfaces.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::High => "#ef4444",
            Severity::Medium => "#f59e0b",
            Severity::Low => "#10b981",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub color: String,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: ALERT_TITLE.to_string(),
            description: description.into(),
            severity,
            color: severity.color().to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Delivery side of the alert channel (push notification, modal, webhook...).
///
/// Failures are returned to the caller, which logs them and moves on; sinks
/// must not retry on their own.
pub trait AlertSink: Send + Sync {
    fn dispatch(&self, alert: &Alert) -> impl Future<Output = Result<()>> + Send;
}

/// Log line always, webhook when configured.
pub struct FanoutAlertSink {
    log: LogAlertSink,
    webhook: Option<WebhookAlertSink>,
}

impl FanoutAlertSink {
    pub fn new(webhook: Option<WebhookAlertSink>) -> Self {
        Self {
            log: LogAlertSink,
            webhook,
        }
    }
}

impl AlertSink for FanoutAlertSink {
    async fn dispatch(&self, alert: &Alert) -> Result<()> {
        self.log.dispatch(alert).await?;
        if let Some(webhook) = &self.webhook {
            webhook.dispatch(alert).await?;
        }
        Ok(())
    }
}
