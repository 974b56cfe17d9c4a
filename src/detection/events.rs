use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

/// `raw` of a mock result produced because no credential is configured.
pub const DEMO_MODE_RAW: &str = "Demo mode - no API key provided";
/// `raw` of a mock result substituted for a failed remote call.
pub const API_FALLBACK_RAW: &str = "Mock fallback due to API error";

/// One observation reported for a frame. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedEvent {
    /// Wall-clock `mm:ss` of the cycle that produced it.
    pub timestamp: String,
    pub description: String,
    pub is_dangerous: bool,
}

/// Output of one classifier call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub events: Vec<DetectedEvent>,
    /// Model text for remote results, or one of the mock markers.
    pub raw: String,
}

impl Classification {
    /// True when this result was fabricated rather than returned by a model.
    pub fn is_synthetic(&self) -> bool {
        self.raw == DEMO_MODE_RAW || self.raw == API_FALLBACK_RAW
    }
}

/// Wall clock used for event timestamps; swapped out in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

pub fn minute_second(at: &DateTime<Local>) -> String {
    format!("{:02}:{:02}", at.minute(), at.second())
}

#[cfg(test)]
pub(crate) struct FixedClock(pub DateTime<Local>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[cfg(test)]
pub(crate) fn fixed_clock(minute: u32, second: u32) -> FixedClock {
    use chrono::TimeZone;

    let at = Local
        .with_ymd_and_hms(2024, 1, 15, 10, minute, second)
        .single()
        .expect("unambiguous local time");
    FixedClock(at)
}
