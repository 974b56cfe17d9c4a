pub mod controller;
pub mod event_log;
pub mod loop_worker;
pub mod state;

#[cfg(test)]
mod testing;

pub use controller::{AnalysisController, LoopOptions};
pub use event_log::EventLog;
pub use loop_worker::CycleOutcome;
pub use state::{LoopSnapshot, LoopState, LoopStatus, MonitorEvent};
