//! Server configuration types.
//!
//! This module provides configuration types for the Waypoint server,
//! using the builder pattern for ergonomic construction.
//!
//! # Example
//!
//! ```rust
//! use waypoint_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .request_timeout(Duration::from_secs(5))
//!     .max_body_bytes(64 * 1024)
//!     .build();
//!
//! assert_eq!(config.request_timeout(), Duration::from_secs(5));
//! ```

use std::time::Duration;

/// Default per-request deadline in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default response body limit for [`Server::serve`](crate::Server::serve).
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deadline for one request's whole handler chain
    request_timeout: Duration,

    /// Response body limit for the buffered writer used by `serve`
    max_body_bytes: usize,

    /// Whether fallback bodies include the rendered error chain
    expose_error_details: bool,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns the response body limit used by `serve`.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Returns whether fallback bodies include the rendered error chain.
    #[must_use]
    pub fn expose_error_details(&self) -> bool {
        self.expose_error_details
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    request_timeout: Duration,
    max_body_bytes: usize,
    expose_error_details: bool,
}

impl ServerConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            expose_error_details: false,
        }
    }

    /// Sets the per-request deadline.
    ///
    /// A request whose chain has not finished by then is abandoned and
    /// answered with `504 Gateway Timeout`.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the response body limit used by `serve`.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Includes the rendered error chain in fallback bodies.
    ///
    /// Useful in development; leaks internals, so keep it off in production.
    #[must_use]
    pub fn expose_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            request_timeout: self.request_timeout,
            max_body_bytes: self.max_body_bytes,
            expose_error_details: self.expose_error_details,
        }
    }
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(
            config.request_timeout(),
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
        assert_eq!(config.max_body_bytes(), DEFAULT_MAX_BODY_BYTES);
        assert!(!config.expose_error_details());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = ServerConfig::builder()
            .request_timeout(Duration::from_millis(250))
            .max_body_bytes(16)
            .expose_error_details(true)
            .build();

        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.max_body_bytes(), 16);
        assert!(config.expose_error_details());
    }

    #[test]
    fn test_config_clone() {
        let config = ServerConfig::builder().max_body_bytes(42).build();
        let cloned = config.clone();
        assert_eq!(config.max_body_bytes(), cloned.max_body_bytes());
    }
}
