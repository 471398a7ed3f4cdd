//! Tracing bootstrap for hosts embedding the gate

use crate::error::{GateError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter, overridden by `RUST_LOG`
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,

    /// Include the event target
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl TracingConfig {
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_json_format(mut self) -> Self {
        self.json_format = true;
        self
    }

    pub fn without_target(mut self) -> Self {
        self.with_target = false;
        self
    }
}

/// Install a global subscriber. Fails instead of panicking when one is
/// already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| GateError::Telemetry(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_target(config.with_target)
            .with_file(true)
            .with_line_number(true);
        subscriber.with(fmt_layer).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.with_target)
            .with_writer(std::io::stderr);
        subscriber.with(fmt_layer).try_init()
    };

    installed.map_err(|e| GateError::Telemetry(e.to_string()))
}
