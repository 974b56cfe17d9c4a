use std::sync::{Arc, Mutex};

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};

use super::events::{
    minute_second, Classification, Clock, DetectedEvent, SystemClock, API_FALLBACK_RAW,
    DEMO_MODE_RAW,
};

/// Canned observations; description and danger flag are always drawn together.
pub const MOCK_TABLE: [(&str, bool); 10] = [
    ("Person detected in frame", false),
    ("Normal movement patterns observed", false),
    ("Suspicious behavior detected - loitering", true),
    ("Person appears distressed or in pain", true),
    ("Fall detected - person on ground", true),
    ("Regular activity - person walking normally", false),
    ("Potential shoplifting behavior observed", true),
    ("Person clutching chest - possible medical emergency", true),
    ("Camera detecting motion in area", false),
    ("AI analysis complete - no threats detected", false),
];

const EMIT_PROBABILITY: f64 = 0.7;

/// Why a cycle is served synthetic output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockReason {
    NoCredentials,
    ApiFallback,
}

impl MockReason {
    pub fn suffix(&self) -> &'static str {
        match self {
            MockReason::NoCredentials => "(demo mode)",
            MockReason::ApiFallback => "(API fallback)",
        }
    }

    pub fn raw(&self) -> &'static str {
        match self {
            MockReason::NoCredentials => DEMO_MODE_RAW,
            MockReason::ApiFallback => API_FALLBACK_RAW,
        }
    }
}

/// Fabricates at most one plausible event per call.
pub struct MockGenerator {
    rng: Mutex<Box<dyn RngCore + Send>>,
    clock: Arc<dyn Clock>,
}

impl MockGenerator {
    pub fn new(rng: Box<dyn RngCore + Send>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rng: Mutex::new(rng),
            clock,
        }
    }

    pub fn from_entropy() -> Self {
        Self::new(Box::new(StdRng::from_entropy()), Arc::new(SystemClock))
    }

    pub fn generate(&self, reason: MockReason) -> Classification {
        let (index, emit) = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let index = rng.gen_range(0..MOCK_TABLE.len());
            (index, rng.gen_bool(EMIT_PROBABILITY))
        };

        let events = if emit {
            let (description, is_dangerous) = MOCK_TABLE[index];
            vec![DetectedEvent {
                timestamp: minute_second(&self.clock.now()),
                description: format!("{description} {}", reason.suffix()),
                is_dangerous,
            }]
        } else {
            Vec::new()
        };

        Classification {
            events,
            raw: reason.raw().to_string(),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::events::fixed_clock;
    use rand::rngs::mock::StepRng;

    fn generator(rng: impl RngCore + Send + 'static) -> MockGenerator {
        MockGenerator::new(Box::new(rng), Arc::new(fixed_clock(12, 3)))
    }

    fn table_flag(description: &str) -> bool {
        MOCK_TABLE
            .iter()
            .find(|(text, _)| description.starts_with(text))
            .map(|(_, flag)| *flag)
            .expect("description comes from the table")
    }

    #[test]
    fn zero_draws_emit_first_entry_in_demo_mode() {
        let result = generator(StepRng::new(0, 0)).generate(MockReason::NoCredentials);

        assert_eq!(result.raw, DEMO_MODE_RAW);
        assert_eq!(
            result.events,
            vec![DetectedEvent {
                timestamp: "12:03".into(),
                description: "Person detected in frame (demo mode)".into(),
                is_dangerous: false,
            }]
        );
    }

    #[test]
    fn quarter_draw_picks_dangerous_loitering_entry() {
        // 2^62 / 2^64 = 0.25 -> index 2 of 10, and 0.25 < 0.7 -> emit.
        let result = generator(StepRng::new(1 << 62, 0)).generate(MockReason::ApiFallback);

        assert_eq!(result.raw, API_FALLBACK_RAW);
        assert_eq!(result.events.len(), 1);
        assert_eq!(
            result.events[0].description,
            "Suspicious behavior detected - loitering (API fallback)"
        );
        assert!(result.events[0].is_dangerous);
    }

    #[test]
    fn high_emission_draw_produces_no_event() {
        // Index draw 0, emission draw u64::MAX which is above the 0.7 threshold.
        let result = generator(StepRng::new(0, u64::MAX)).generate(MockReason::NoCredentials);

        assert!(result.events.is_empty());
        assert_eq!(result.raw, DEMO_MODE_RAW);
    }

    #[test]
    fn never_more_than_one_event_and_flag_matches_table() {
        for seed in 0..500u64 {
            let result = generator(StdRng::seed_from_u64(seed)).generate(MockReason::ApiFallback);
            assert!(result.events.len() <= 1);
            for event in &result.events {
                assert!(event.description.ends_with(" (API fallback)"));
                assert_eq!(event.is_dangerous, table_flag(&event.description));
            }
        }
    }

    #[test]
    fn emission_rate_is_roughly_seventy_percent() {
        let generator = generator(StdRng::seed_from_u64(42));
        let emitted = (0..2_000)
            .filter(|_| !generator.generate(MockReason::NoCredentials).events.is_empty())
            .count();
        assert!((1_200..1_600).contains(&emitted), "emitted {emitted}");
    }
}
