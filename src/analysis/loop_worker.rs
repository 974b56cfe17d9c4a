use std::sync::Arc;

use tokio::{
    sync::{broadcast, watch, Mutex},
    time::{Duration, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    alerts::{Alert, AlertSink, Severity},
    capture::FrameSource,
    detection::{GenerativeModel, HazardClassifier},
};

use super::{event_log::EventLog, state::LoopState, MonitorEvent};

// Set to false to silence per-cycle logging
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Everything a cycle touches, shared between the controller and its worker.
pub(crate) struct LoopContext<F, M, A> {
    pub(crate) frames: F,
    pub(crate) classifier: HazardClassifier<M>,
    pub(crate) alerts: A,
    pub(crate) alert_severity: Severity,
    pub(crate) state: Mutex<LoopState>,
    pub(crate) log: EventLog,
    pub(crate) transcript: watch::Sender<String>,
    pub(crate) notifier: broadcast::Sender<MonitorEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The frame source had nothing; the classifier was not called.
    NoFrame,
    /// Frame capture ran past the capture timeout; the classifier was not called.
    TimedOut,
    /// The loop was stopped while this cycle was in flight; results dropped.
    Discarded { events: usize },
    Completed { events: usize, alerts: u64 },
}

/// Runs one cycle now, then one per `period`, until `cancel_token` fires.
///
/// Cycles run inline, so they never overlap; ticks missed while a slow cycle
/// is in flight are skipped rather than queued.
pub(crate) async fn analysis_loop<F, M, A>(
    ctx: Arc<LoopContext<F, M, A>>,
    session_id: String,
    period: Duration,
    capture_timeout: Duration,
    cancel_token: CancellationToken,
) where
    F: FrameSource,
    M: GenerativeModel,
    A: AlertSink,
{
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    log_info!("analysis loop armed for session {session_id} every {}ms", period.as_millis());

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("analysis loop for session {session_id} shutting down");
                break;
            }
            _ = ticker.tick() => {
                let started = Instant::now();
                let outcome = run_cycle(&ctx, &cancel_token, capture_timeout).await;
                log_debug!(
                    "cycle finished in {}ms for session {session_id}: {outcome:?}",
                    started.elapsed().as_millis()
                );
            }
        }
    }
}

/// Capture, classify, then fan out over the returned events.
///
/// Only capture is bounded here; the classifier bounds its own remote
/// attempts and masks their failures.
pub(crate) async fn run_cycle<F, M, A>(
    ctx: &LoopContext<F, M, A>,
    cancel_token: &CancellationToken,
    capture_timeout: Duration,
) -> CycleOutcome
where
    F: FrameSource,
    M: GenerativeModel,
    A: AlertSink,
{
    let frame = match tokio::time::timeout(capture_timeout, ctx.frames.capture_frame()).await {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            log_info!("no frame captured, skipping analysis");
            return skip_cycle(ctx, cancel_token, CycleOutcome::NoFrame).await;
        }
        Err(_) => {
            log_warn!("frame capture exceeded {}ms, skipping cycle", capture_timeout.as_millis());
            return skip_cycle(ctx, cancel_token, CycleOutcome::TimedOut).await;
        }
    };

    let transcript = ctx.transcript.borrow().clone();
    let classification = ctx.classifier.classify(Some(&frame), &transcript).await;

    if cancel_token.is_cancelled() {
        let events = classification.events.len();
        log_info!("loop stopped mid-cycle, discarding {events} events");
        return CycleOutcome::Discarded { events };
    }

    let events = classification.events;
    let event_count = events.len();
    ctx.log.append(events.iter().cloned()).await;

    let mut alerts = 0;
    for event in events {
        if event.is_dangerous {
            let alert = Alert::new(event.description.clone(), ctx.alert_severity);
            match ctx.alerts.dispatch(&alert).await {
                Ok(()) => alerts += 1,
                Err(err) => log_error!("alert dispatch failed for '{}': {err:#}", event.description),
            }
        }
        let _ = ctx.notifier.send(MonitorEvent::EventDetected(event));
    }

    let outcome = CycleOutcome::Completed {
        events: event_count,
        alerts,
    };

    // A restart during fan-out has already reset the counters for a new session.
    if cancel_token.is_cancelled() {
        log_info!("loop stopped during alert fan-out, cycle not counted");
        return outcome;
    }

    let cycles_completed = {
        let mut state = ctx.state.lock().await;
        state.record_cycle(alerts);
        state.cycles_completed
    };
    let _ = ctx
        .notifier
        .send(MonitorEvent::CycleFinished { cycles_completed });

    outcome
}

async fn skip_cycle<F, M, A>(
    ctx: &LoopContext<F, M, A>,
    cancel_token: &CancellationToken,
    outcome: CycleOutcome,
) -> CycleOutcome {
    if cancel_token.is_cancelled() {
        return outcome;
    }

    let cycles_skipped = {
        let mut state = ctx.state.lock().await;
        state.record_skip();
        state.cycles_skipped
    };
    let _ = ctx
        .notifier
        .send(MonitorEvent::CycleSkipped { cycles_skipped });
    outcome
}
