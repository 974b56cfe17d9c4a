pub mod classifier;
pub mod config;
pub mod events;
pub mod mock;
pub mod parse;
pub mod prompt;
pub mod remote;

pub use classifier::HazardClassifier;
pub use config::ClassifierConfig;
pub use events::{Classification, Clock, DetectedEvent, SystemClock};
pub use mock::{MockGenerator, MockReason};
pub use remote::{GeminiClient, GenerativeModel};
