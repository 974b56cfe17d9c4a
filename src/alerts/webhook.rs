use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Serialize;

use super::{Alert, AlertSink};

const WEBHOOK_TIMEOUT_SECS: u64 = 5;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WebhookPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    alert: &'a Alert,
}

/// Posts each alert as JSON to an HTTP endpoint (push relay, chat hook, ...).
pub struct WebhookAlertSink {
    http: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .context("failed to build webhook HTTP client")?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl AlertSink for WebhookAlertSink {
    async fn dispatch(&self, alert: &Alert) -> Result<()> {
        let payload = WebhookPayload {
            kind: "security_alert",
            alert,
        };

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("alert webhook {} unreachable", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("alert webhook {} answered {status}", self.url);
        }
        Ok(())
    }
}
