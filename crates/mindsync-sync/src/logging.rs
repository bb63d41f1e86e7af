//! Tracing subscriber setup for applications embedding the engine
//!
//! `RUST_LOG` takes precedence over the configured level. Calling [`init`]
//! again after a subscriber is installed does nothing.

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mindsync_core::config::{LogFormat, LoggingConfig};

/// Builds the filter: `RUST_LOG` if set, the configured level otherwise
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level '{}'", config.level)),
    }
}

/// Installs the global fmt subscriber
///
/// Returns `Ok(true)` if this call installed it and `Ok(false)` if a
/// global subscriber was already in place.
pub fn init(config: &LoggingConfig) -> Result<bool> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init().is_ok(),
        LogFormat::Pretty => builder.try_init().is_ok(),
    };

    if installed {
        debug!(level = %config.level, format = ?config.format, "Logging initialized");
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "mindsync=verbose".into(),
            format: LogFormat::Pretty,
        };
        assert!(env_filter(&config).is_err());
    }

    #[test]
    fn test_second_init_is_noop() {
        let config = LoggingConfig::default();
        let _ = init(&config).unwrap();
        assert!(!init(&config).unwrap());
    }
}
