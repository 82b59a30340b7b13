//! Logging setup for Waypoint services.
//!
//! Every Waypoint crate logs through `tracing`; this crate installs the
//! subscriber that turns those events into output. Call [`init_logging`]
//! once at process start:
//!
//! ```rust,no_run
//! use waypoint_telemetry::{init_logging, LogConfig};
//!
//! fn main() -> Result<(), waypoint_telemetry::TelemetryError> {
//!     init_logging(&LogConfig::production().with_service_name("greeter"))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
