use anyhow::{anyhow, Result};

use crate::capture::Frame;

use super::{
    config::ClassifierConfig,
    events::{minute_second, Classification},
    mock::{MockGenerator, MockReason},
    parse::parse_events,
    prompt::build_prompt,
    remote::{first_success, FailureKind, GeminiClient, GenerativeModel},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Turns one frame into hazard events.
///
/// Never fails: a missing frame, a missing credential, an unreachable model
/// or an unparseable answer all produce mock output instead. `raw` tells the
/// caller which path was taken.
pub struct HazardClassifier<M> {
    config: ClassifierConfig,
    remote: Option<M>,
    mock: MockGenerator,
}

impl HazardClassifier<GeminiClient> {
    /// Builds the production classifier; the HTTP client exists only with a key.
    pub fn from_config(config: ClassifierConfig, mock: MockGenerator) -> Result<Self> {
        let remote = match &config.api_key {
            Some(key) => Some(GeminiClient::new(
                key.clone(),
                config.api_base.clone(),
                config.request_timeout,
            )?),
            None => None,
        };
        Ok(Self::new(config, remote, mock))
    }
}

impl<M: GenerativeModel> HazardClassifier<M> {
    pub fn new(config: ClassifierConfig, remote: Option<M>, mock: MockGenerator) -> Self {
        let remote = remote.filter(|_| config.has_credentials());
        if remote.is_some() {
            log_info!(
                "hazard classifier using remote models {:?}",
                config.model_preference_order
            );
        } else {
            log_warn!("no model API key configured, hazard classifier runs in demo mode");
        }
        Self {
            config,
            remote,
            mock,
        }
    }

    pub fn is_demo_mode(&self) -> bool {
        self.remote.is_none()
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub async fn classify(&self, image: Option<&Frame>, context: &str) -> Classification {
        let (Some(frame), Some(remote)) = (image, self.remote.as_ref()) else {
            log_info!("no frame or no credential, using mock analysis");
            return self.mock.generate(self.mock_reason());
        };

        match self.classify_remote(remote, frame, context).await {
            Ok(classification) => classification,
            Err(err) => {
                log_warn!(
                    "remote classification failed ({}), falling back to mock data: {err:#}",
                    FailureKind::of(&err).hint()
                );
                self.mock.generate(MockReason::ApiFallback)
            }
        }
    }

    fn mock_reason(&self) -> MockReason {
        if self.config.has_credentials() {
            MockReason::ApiFallback
        } else {
            MockReason::NoCredentials
        }
    }

    async fn classify_remote(&self, remote: &M, frame: &Frame, context: &str) -> Result<Classification> {
        let prompt = build_prompt(context);
        let request_timeout = self.config.request_timeout;
        let (model, text) = first_success(&self.config.model_preference_order, |model| {
            let attempt = remote.generate(model, &prompt, frame);
            async move {
                match tokio::time::timeout(request_timeout, attempt).await {
                    Ok(reply) => reply,
                    Err(_) => Err(anyhow!(
                        "{model} timed out after {}ms",
                        request_timeout.as_millis()
                    )),
                }
            }
        })
        .await?;
        log_debug!("raw response from {model}: {text}");

        let events = parse_events(&text, &minute_second(&self.mock.clock().now()))?;
        log_info!("{model} reported {} events", events.len());
        Ok(Classification { events, raw: text })
    }
}
