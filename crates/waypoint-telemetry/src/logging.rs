//! Structured logging.
//!
//! Installs a global `tracing` subscriber that writes either JSON lines
//! (production) or human-readable output (development) to stderr. The
//! `RUST_LOG` environment variable, when set, overrides the configured
//! level.
//!
//! # Example
//!
//! ```rust,no_run
//! use waypoint_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development().with_service_name("greeter"))?;
//! tracing::info!("ready");
//! # Ok::<(), waypoint_telemetry::TelemetryError>(())
//! ```

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{TelemetryError, TelemetryResult};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `waypoint_server=debug,info`
    pub level: String,

    /// Emit JSON lines instead of pretty output
    pub json_format: bool,

    /// Log span open/close events
    pub span_events: bool,

    /// Include the event target (module path)
    pub include_target: bool,

    /// Service name recorded on the startup event
    pub service_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            include_target: true,
            service_name: "waypoint".to_string(),
        }
    }
}

impl LogConfig {
    /// Pretty, verbose output for local work.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            ..Self::default()
        }
    }

    /// JSON output at `info`.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Sets the filter directive.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Sets the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Chooses JSON or pretty output.
    #[must_use]
    pub fn with_json_format(mut self, json: bool) -> Self {
        self.json_format = json;
        self
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad directive and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = create_env_filter(config)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    // Exactly one of the two layers is present.
    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_span_events(span_events.clone())
            .with_current_span(true)
    });
    let pretty_layer = (!config.json_format).then(|| {
        fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_target(config.include_target)
            .with_span_events(span_events)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.level,
        json = config.json_format,
        "logging initialized"
    );
    Ok(())
}

/// Builds the filter: `RUST_LOG` when set, otherwise `config.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] if `config.level` does not parse.
pub fn create_env_filter(config: &LogConfig) -> TelemetryResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
        directive: config.level.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let dev = LogConfig::development();
        assert_eq!(dev.level, "debug");
        assert!(!dev.json_format);
        assert!(dev.span_events);

        let prod = LogConfig::production();
        assert_eq!(prod.level, "info");
        assert!(prod.json_format);
        assert!(!prod.span_events);
    }

    #[test]
    fn test_builder_methods() {
        let config = LogConfig::default()
            .with_level("warn")
            .with_service_name("greeter")
            .with_json_format(false);
        assert_eq!(config.level, "warn");
        assert_eq!(config.service_name, "greeter");
        assert!(!config.json_format);
    }

    #[test]
    fn test_invalid_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LogConfig::default().with_level("waypoint=[");
        let err = create_env_filter(&config).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn test_valid_level_parses() {
        assert!(create_env_filter(&LogConfig::default().with_level("waypoint_server=debug,info")).is_ok());
    }
}
