//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. `RUST_LOG` wins over the
//! configured level.

use crate::container::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("Subscriber init failed: {0}")]
    Init(String),
}

/// Install the global subscriber described by `config`.
pub fn init_telemetry(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .try_init()
            .map_err(|e| TelemetryError::Init(e.to_string()))
    }
}

/// Install a test subscriber. Safe to call from every test.
pub fn init_test_telemetry() {
    let config = LoggingConfig {
        level: "debug".to_string(),
        json_logs: false,
    };
    let _ = init_telemetry(&config);
}
