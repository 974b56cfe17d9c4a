//! Log macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! The capture, classification and loop modules log on every cycle, which is
//! noisy at a 3 second period. Each of those modules declares its own switch:
//! ```rust,ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("cycle finished with {} events", count);
//! ```
//! With the flag off the calls compile to nothing; with it on they forward to
//! the `log` facade and are filtered by `RUST_LOG` as usual.

/// Info-level log line, emitted only when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn-level counterpart of [`log_info!`].
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level counterpart of [`log_info!`].
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}

/// Debug-level counterpart of [`log_info!`]; used for raw model payloads.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

/// Initializes `env_logger` once for the process.
///
/// `RUST_LOG` wins when set. Otherwise the default is Info, or Debug when
/// `HAWKWATCH_DEBUG` is `1`/`true`.
pub fn init() {
    let level = if debug_enabled() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A second init (tests, embedding) is harmless.
    let _ = builder.try_init();
}

pub fn debug_enabled() -> bool {
    std::env::var("HAWKWATCH_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
