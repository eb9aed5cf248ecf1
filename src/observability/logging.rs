//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber
//! - Pick the output format (pretty for development, JSON for production)
//! - Apply the configured log level
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - Initialization is idempotent: a second call is a no-op

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Build the filter: `RUST_LOG` if present, otherwise the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "service_gateway={level},tower_http={level}",
            level = config.log_level
        ))
    })
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));
    let result = match config.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        let config = ObservabilityConfig {
            log_format: LogFormat::Json,
            ..Default::default()
        };
        init_logging(&config);
        init_logging(&config);
    }
}
