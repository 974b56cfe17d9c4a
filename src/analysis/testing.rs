//! In-memory collaborators for loop tests.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, Result};
use rand::{
    rngs::{mock::StepRng, StdRng},
    RngCore, SeedableRng,
};
use tokio::time::Duration;

use crate::{
    alerts::{Alert, AlertSink},
    capture::{frame::test_png, Frame, FrameSource},
    detection::{
        events::fixed_clock, ClassifierConfig, GenerativeModel, HazardClassifier, MockGenerator,
    },
};

#[derive(Clone)]
pub(crate) struct CountingFrames {
    frame: Option<Frame>,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl CountingFrames {
    pub(crate) fn with_frame() -> Self {
        let frame = Frame::from_image_bytes(&test_png(4, 4), 70).expect("test frame");
        Self::new(Some(frame))
    }

    pub(crate) fn empty() -> Self {
        Self::new(None)
    }

    fn new(frame: Option<Frame>) -> Self {
        Self {
            frame,
            delay: None,
            calls: Arc::default(),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl FrameSource for CountingFrames {
    async fn capture_frame(&self) -> Option<Frame> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.frame.clone()
    }
}

/// Replies with fixed text, or never answers at all.
#[derive(Clone)]
pub(crate) struct RecordingModel {
    reply: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingModel {
    pub(crate) fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Arc::default(),
        }
    }

    pub(crate) fn hanging() -> Self {
        Self {
            reply: None,
            prompts: Arc::default(),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl GenerativeModel for RecordingModel {
    async fn generate(&self, _model: &str, prompt: &str, _frame: &Frame) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => std::future::pending().await,
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct RecordingAlerts {
    delay: Option<Duration>,
    sent: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlerts {
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl AlertSink for RecordingAlerts {
    async fn dispatch(&self, alert: &Alert) -> Result<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.sent.lock().unwrap().push(alert.clone());
        Ok(())
    }
}

pub(crate) struct FailingAlerts;

impl AlertSink for FailingAlerts {
    async fn dispatch(&self, _alert: &Alert) -> Result<()> {
        Err(anyhow!("notification service unavailable"))
    }
}

/// Demo-mode classifier. With `always_dangerous` every call yields the
/// loitering entry; otherwise draws come from a fixed seed.
pub(crate) fn demo_classifier(always_dangerous: bool) -> HazardClassifier<RecordingModel> {
    let rng: Box<dyn RngCore + Send> = if always_dangerous {
        Box::new(StepRng::new(1 << 62, 0))
    } else {
        Box::new(StdRng::seed_from_u64(7))
    };
    HazardClassifier::new(
        ClassifierConfig::default(),
        None,
        MockGenerator::new(rng, Arc::new(fixed_clock(1, 2))),
    )
}

/// Remote classifier whose mock fallback always yields the loitering entry.
pub(crate) fn remote_classifier(model: RecordingModel) -> HazardClassifier<RecordingModel> {
    let config = ClassifierConfig {
        api_key: Some("test-key".into()),
        ..ClassifierConfig::default()
    };
    HazardClassifier::new(
        config,
        Some(model),
        MockGenerator::new(Box::new(StepRng::new(1 << 62, 0)), Arc::new(fixed_clock(1, 2))),
    )
}
