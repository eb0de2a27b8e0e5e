//! Tracing subscriber setup.

use crate::config::LogFormat;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Errors from [`init`].
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log level {level:?}: {reason}")]
    InvalidLevel {
        /// Configured directive.
        level: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Build the filter: `RUST_LOG` when set, otherwise `level`, lowered to
/// `debug` in debug mode.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidLevel`] if `level` does not parse.
pub fn env_filter(level: &str, debug: bool) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let level = if debug { "debug" } else { level };
    EnvFilter::try_new(level).map_err(|e| TelemetryError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError`] for a bad level or if a subscriber is already
/// installed.
pub fn init(format: LogFormat, level: &str, debug: bool) -> Result<(), TelemetryError> {
    let filter = env_filter(level, debug)?;

    let (json, text) = match format {
        LogFormat::Json => (Some(fmt::layer().json().with_current_span(true)), None),
        LogFormat::Text => (None, Some(fmt::layer().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let err = env_filter("todokit=verbose", false).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidLevel { .. }));
    }

    #[test]
    fn debug_mode_lowers_the_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }

        let filter = env_filter("warn", true).unwrap();
        assert_eq!(filter.to_string(), "debug");

        let filter = env_filter("warn", false).unwrap();
        assert_eq!(filter.to_string(), "warn");
    }
}
