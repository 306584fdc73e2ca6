//! Structured logging setup.
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured default filter
//! - JSON output for machine consumption, pretty output otherwise
//! - Never panics when a global subscriber is already installed

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

use crate::config::schema::LoggingConfig;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("global subscriber already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Build the filter: environment first, then the configured default.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|e| LoggingError::Filter {
        filter: config.filter.clone(),
        reason: e.to_string(),
    })
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_filter_is_used() {
        let config = LoggingConfig {
            filter: "fuel=debug".into(),
            json: false,
        };
        if std::env::var("RUST_LOG").is_err() {
            let filter = build_filter(&config).unwrap();
            assert_eq!(filter.to_string(), "fuel=debug");
        }
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        let config = LoggingConfig {
            filter: "fuel=notalevel".into(),
            json: false,
        };
        if std::env::var("RUST_LOG").is_err() {
            assert!(matches!(build_filter(&config), Err(LoggingError::Filter { .. })));
        }
    }
}
