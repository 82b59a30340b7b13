//! Greeter error types.

use thiserror::Error;

/// Failures raised by the greeter's own resources.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GreeterError {
    /// The directory was used after release.
    #[error("directory is closed")]
    DirectoryClosed,

    /// The outbox was used after release.
    #[error("outbox is closed")]
    OutboxClosed,

    /// A recipient address without a domain.
    #[error("invalid mail address `{0}`")]
    InvalidAddress(String),

    /// A mail relay that is not `host:port`.
    #[error("invalid mail relay `{0}`, expected host:port")]
    InvalidRelay(String),
}
