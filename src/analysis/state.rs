use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::DetectedEvent;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LoopStatus {
    #[default]
    Idle,
    Armed,
}

/// Loop bookkeeping for the current (or last) arming. Mutated only by the
/// controller and its worker.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoopState {
    pub status: LoopStatus,
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub cycles_completed: u64,
    /// Cycles that ended early because no frame was available.
    pub cycles_skipped: u64,
    pub alerts_dispatched: u64,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.status == LoopStatus::Armed
    }

    pub fn arm(&mut self, session_id: String, started_at: DateTime<Utc>) {
        *self = Self {
            status: LoopStatus::Armed,
            session_id: Some(session_id),
            started_at: Some(started_at),
            ..Self::default()
        };
    }

    /// Back to idle. Counters are kept so the last session can still be inspected.
    pub fn disarm(&mut self) {
        self.status = LoopStatus::Idle;
    }

    pub fn record_cycle(&mut self, alerts: u64) {
        self.cycles_completed += 1;
        self.alerts_dispatched += alerts;
    }

    pub fn record_skip(&mut self) {
        self.cycles_skipped += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoopSnapshot {
    pub state: LoopState,
    pub event_count: usize,
}

/// Notifications for whatever renders the timeline.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum MonitorEvent {
    StateChanged(LoopSnapshot),
    EventDetected(DetectedEvent),
    CycleFinished { cycles_completed: u64 },
    /// A cycle ended without classification (no frame, or capture timed out).
    CycleSkipped { cycles_skipped: u64 },
    EventsCleared,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_resets_counters_and_disarm_keeps_them() {
        let mut state = LoopState::new();
        state.arm("first".into(), Utc::now());
        state.record_cycle(2);
        state.record_skip();
        state.disarm();

        assert_eq!(state.status, LoopStatus::Idle);
        assert_eq!(state.cycles_completed, 1);
        assert_eq!(state.alerts_dispatched, 2);

        state.arm("second".into(), Utc::now());
        assert!(state.is_armed());
        assert_eq!(state.session_id.as_deref(), Some("second"));
        assert_eq!(state.cycles_completed, 0);
        assert_eq!(state.cycles_skipped, 0);
    }

    #[test]
    fn monitor_events_are_tagged() {
        let json = serde_json::to_value(MonitorEvent::CycleFinished { cycles_completed: 3 }).unwrap();
        assert_eq!(json["type"], "cycleFinished");
        assert_eq!(json["payload"]["cycles_completed"], 3);
    }
}
