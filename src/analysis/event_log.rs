use std::sync::Arc;

use tokio::sync::Mutex;

use crate::detection::DetectedEvent;

/// Append-only timeline of detected events, in cycle-completion order.
/// Never reordered or deduplicated; `clear` is the only way entries leave.
#[derive(Clone, Default)]
pub struct EventLog {
    inner: Arc<Mutex<Vec<DetectedEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append(&self, events: impl IntoIterator<Item = DetectedEvent>) -> usize {
        let mut guard = self.inner.lock().await;
        guard.extend(events);
        guard.len()
    }

    pub async fn snapshot(&self) -> Vec<DetectedEvent> {
        self.inner.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}
