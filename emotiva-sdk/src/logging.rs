//! Opt-in logging setup for applications embedding the SDK.
//!
//! The SDK itself only emits `tracing` events; nothing is printed unless
//! the host application installs a subscriber, either its own or one of
//! the presets here.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging preset for different environments
#[derive(Debug, Clone, Copy)]
pub enum LoggingMode {
    /// No subscriber installed; all events are dropped
    Silent,
    /// Compact stderr output at info level
    Development,
    /// Verbose output with source locations at debug level
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install a subscriber for the chosen mode.
///
/// Call once, early, before any SDK operation that might log.
///
/// # Environment Variables
///
/// - `EMOTIVA_LOG_LEVEL`: override the level filter (error … trace)
/// - `RUST_LOG`: honored when `EMOTIVA_LOG_LEVEL` is unset
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(env_filter("info"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let subscriber = Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(env_filter("debug"));

            subscriber
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Pick the mode from `EMOTIVA_LOG_MODE` (silent, development, debug),
/// defaulting to silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = match std::env::var("EMOTIVA_LOG_MODE").as_deref() {
        Ok("development") => LoggingMode::Development,
        Ok("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    };
    init_logging(mode)
}

fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("EMOTIVA_LOG_LEVEL") {
        EnvFilter::new(level)
    } else if let Ok(rust_log) = std::env::var("RUST_LOG") {
        EnvFilter::new(rust_log)
    } else {
        EnvFilter::new(default_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_mode_never_fails() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }
}
