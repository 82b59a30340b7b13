//! Telemetry error types.

use thiserror::Error;
use waypoint_core::ErrorKind;

/// Errors raised while setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {reason}")]
    InvalidFilter {
        /// The rejected directive
        directive: String,
        /// Parser message
        reason: String,
    },

    /// Installing the global subscriber failed.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

impl From<TelemetryError> for waypoint_core::Error {
    fn from(err: TelemetryError) -> Self {
        Self::wrap(err, "telemetry setup failed", ErrorKind::Setup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelemetryError::InvalidFilter {
            directive: "=[".to_string(),
            reason: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "invalid log filter `=[`: bad");

        let err = TelemetryError::LoggingInit("already set".to_string());
        assert!(err.to_string().contains("already set"));
    }

    #[test]
    fn test_converts_into_setup_error() {
        let err: waypoint_core::Error = TelemetryError::LoggingInit("already set".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Setup);
        assert_eq!(
            err.render(),
            "telemetry setup failed: failed to initialize logging: already set"
        );
    }
}
