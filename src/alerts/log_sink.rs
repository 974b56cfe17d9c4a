use anyhow::Result;
use log::warn;

use super::{Alert, AlertSink};

/// Writes alerts to the log. Always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    async fn dispatch(&self, alert: &Alert) -> Result<()> {
        warn!(
            "[alert:{}] {}: {}",
            alert.severity.as_str(),
            alert.title,
            alert.description
        );
        Ok(())
    }
}
