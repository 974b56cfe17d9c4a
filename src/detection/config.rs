use std::{fmt, time::Duration};

use crate::settings::MonitorSettings;

/// Read-only classifier configuration. Without an API key the classifier
/// stays in mock mode for its whole lifetime.
#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    /// Model identifiers, most preferred first; the last one is the final fallback.
    pub model_preference_order: Vec<String>,
    pub api_base: String,
    pub request_timeout: Duration,
}

impl ClassifierConfig {
    pub fn from_settings(settings: &MonitorSettings, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model_preference_order: settings.models.clone(),
            api_base: settings.api_base.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs.max(1)),
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default(), None)
    }
}

impl fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_preference_order", &self.model_preference_order)
            .field("api_base", &self.api_base)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
