use std::{future::Future, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::capture::{frame::JPEG_MIME, Frame};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// A hosted multimodal model that turns an instruction plus one image into text.
pub trait GenerativeModel: Send + Sync {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
        frame: &Frame,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Coarse reason for a remote failure, for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    PermissionDenied,
    RateLimited,
    TimedOut,
    Other,
}

impl FailureKind {
    pub fn of(err: &anyhow::Error) -> Self {
        let message = format!("{err:#}").to_lowercase();
        if message.contains("404") || message.contains("not found") {
            FailureKind::NotFound
        } else if message.contains("403")
            || message.contains("401")
            || message.contains("permission")
        {
            FailureKind::PermissionDenied
        } else if message.contains("429") || message.contains("quota") {
            FailureKind::RateLimited
        } else if message.contains("timed out") {
            FailureKind::TimedOut
        } else {
            FailureKind::Other
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            FailureKind::NotFound => "model not accessible or API key invalid",
            FailureKind::PermissionDenied => "permission denied",
            FailureKind::RateLimited => "rate limited",
            FailureKind::TimedOut => "timed out",
            FailureKind::Other => "request failed",
        }
    }
}

/// Tries each candidate in order and returns the first success together with
/// the candidate that produced it. Exhaustion returns the last error.
pub async fn first_success<'a, T, F, Fut>(
    candidates: &'a [String],
    mut attempt: F,
) -> Result<(&'a str, T)>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err = None;
    for candidate in candidates {
        match attempt(candidate.as_str()).await {
            Ok(value) => return Ok((candidate.as_str(), value)),
            Err(err) => {
                log_warn!(
                    "{candidate} unavailable ({}): {err:#}",
                    FailureKind::of(&err).hint()
                );
                last_err = Some(err);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("no model identifiers configured")))
}

/// `generateContent` client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build model HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            api_base: api_base.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            model
        )
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, model: &str, prompt: &str, frame: &Frame) -> Result<String> {
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    { "inline_data": { "mime_type": JPEG_MIME, "data": frame.to_base64() } }
                ]
            }]
        });

        let response = self
            .http
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("request to {model} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("{model} returned {status}: {}", truncate(&detail, 300));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .with_context(|| format!("{model} returned an unreadable body"))?;

        payload
            .text()
            .ok_or_else(|| anyhow!("{model} returned no text candidates"))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
