use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use log::{info, warn};
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    alerts::{AlertSink, Severity},
    capture::FrameSource,
    detection::{DetectedEvent, GenerativeModel, HazardClassifier},
    settings::MonitorSettings,
};

use super::{
    event_log::EventLog,
    loop_worker::{analysis_loop, LoopContext},
    state::{LoopSnapshot, LoopState},
    MonitorEvent,
};

const NOTIFY_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopOptions {
    pub period: Duration,
    pub capture_timeout: Duration,
    pub alert_severity: Severity,
}

impl LoopOptions {
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self {
            period: Duration::from_millis(settings.interval_ms.max(1)),
            capture_timeout: Duration::from_millis(settings.capture_timeout_ms.max(1)),
            alert_severity: settings.alert_severity,
        }
    }
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self::from_settings(&MonitorSettings::default())
    }
}

struct Worker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Arms and disarms the periodic capture/classify/alert loop.
///
/// `stop` is the single cancellation point: it cancels the schedule and
/// returns without waiting for a cycle that is already running. Whatever
/// that cycle produces afterwards is discarded.
pub struct AnalysisController<F, M, A> {
    ctx: Arc<LoopContext<F, M, A>>,
    worker: Arc<Mutex<Option<Worker>>>,
    // Stopped workers that may still be finishing a cycle.
    draining: Arc<Mutex<Vec<JoinHandle<()>>>>,
    options: LoopOptions,
}

impl<F, M, A> Clone for AnalysisController<F, M, A> {
    fn clone(&self) -> Self {
        Self {
            ctx: Arc::clone(&self.ctx),
            worker: Arc::clone(&self.worker),
            draining: Arc::clone(&self.draining),
            options: self.options,
        }
    }
}

impl<F, M, A> AnalysisController<F, M, A>
where
    F: FrameSource + 'static,
    M: GenerativeModel + 'static,
    A: AlertSink + 'static,
{
    pub fn new(frames: F, classifier: HazardClassifier<M>, alerts: A, options: LoopOptions) -> Self {
        let (transcript, _) = watch::channel(String::new());
        let (notifier, _) = broadcast::channel(NOTIFY_CAPACITY);

        Self {
            ctx: Arc::new(LoopContext {
                frames,
                classifier,
                alerts,
                alert_severity: options.alert_severity,
                state: Mutex::new(LoopState::new()),
                log: EventLog::new(),
                transcript,
                notifier,
            }),
            worker: Arc::new(Mutex::new(None)),
            draining: Arc::new(Mutex::new(Vec::new())),
            options,
        }
    }

    /// idle -> armed. Runs the first cycle right away, then every period.
    pub async fn start(&self) -> Result<LoopSnapshot> {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            bail!("analysis loop already armed");
        }

        let session_id = Uuid::new_v4().to_string();
        self.ctx
            .state
            .lock()
            .await
            .arm(session_id.clone(), Utc::now());

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(analysis_loop(
            Arc::clone(&self.ctx),
            session_id.clone(),
            self.options.period,
            self.options.capture_timeout,
            cancel_token.clone(),
        ));
        *worker = Some(Worker {
            handle,
            cancel_token,
        });
        drop(worker);

        info!("analysis session {session_id} started");
        let snapshot = self.snapshot().await;
        self.notify(MonitorEvent::StateChanged(snapshot.clone()));
        Ok(snapshot)
    }

    /// armed -> idle. A no-op when already idle.
    pub async fn stop(&self) -> Result<()> {
        let Some(worker) = self.worker.lock().await.take() else {
            return Ok(());
        };

        worker.cancel_token.cancel();
        {
            let mut draining = self.draining.lock().await;
            draining.retain(|handle| !handle.is_finished());
            draining.push(worker.handle);
        }

        let session_id = {
            let mut state = self.ctx.state.lock().await;
            state.disarm();
            state.session_id.clone().unwrap_or_default()
        };
        info!("analysis session {session_id} stopped");

        let snapshot = self.snapshot().await;
        self.notify(MonitorEvent::StateChanged(snapshot));
        Ok(())
    }

    /// Stops the loop and waits for any in-flight cycle to wind down.
    pub async fn shutdown(&self) -> Result<()> {
        self.stop().await?;

        let handles: Vec<_> = self.draining.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(err) = handle.await.context("analysis loop task failed to join") {
                warn!("{err:#}");
            }
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> LoopSnapshot {
        let state = self.ctx.state.lock().await.clone();
        LoopSnapshot {
            state,
            event_count: self.ctx.log.len().await,
        }
    }

    pub async fn is_armed(&self) -> bool {
        self.ctx.state.lock().await.is_armed()
    }

    /// Latest speech transcript; used as context from the next cycle on.
    pub fn set_transcript(&self, transcript: impl Into<String>) {
        self.ctx.transcript.send_replace(transcript.into());
    }

    pub async fn events(&self) -> Vec<DetectedEvent> {
        self.ctx.log.snapshot().await
    }

    pub async fn clear_events(&self) {
        self.ctx.log.clear().await;
        self.notify(MonitorEvent::EventsCleared);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.ctx.notifier.subscribe()
    }

    pub fn is_demo_mode(&self) -> bool {
        self.ctx.classifier.is_demo_mode()
    }

    fn notify(&self, event: MonitorEvent) {
        // No subscribers is fine.
        let _ = self.ctx.notifier.send(event);
    }
}
