//! Error chains for Waypoint.
//!
//! This module provides the [`Error`] type, the single error type that flows
//! through handlers, the router, the server and the resource lifecycle.
//!
//! An [`Error`] is one node of a chain: it carries an [`ErrorKind`], a context
//! message and an optional wrapped cause. Wrapping never discards anything:
//! every layer added with [`Error::wrap`] keeps full access to the layers
//! below it, down to the original root cause.
//!
//! # Error kinds
//!
//! | `ErrorKind` | Raised by | Phase |
//! |---|---|---|
//! | `Config` | route registration, server construction | startup |
//! | `Setup` | resource acquisition | startup |
//! | `Request` | handlers | per request |
//! | `Write` | response writers | per request |
//!
//! # Example
//!
//! ```
//! use waypoint_core::{Error, ErrorKind};
//!
//! let root = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
//! let err = Error::wrap(root, "connect to user store", ErrorKind::Setup);
//! let err = Error::wrap(err, "startup", ErrorKind::Setup);
//!
//! assert_eq!(err.render(), "startup: connect to user store: connection refused");
//! assert_eq!(err.root_cause().to_string(), "connection refused");
//! ```

use std::error::Error as StdError;
use std::fmt;

/// Boxed, thread-safe standard error used as a wrapped cause.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias using [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of a failure by the phase that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid or incomplete wiring found at startup (duplicate route,
    /// malformed pattern, missing dependency).
    Config,
    /// A resource failed to acquire.
    Setup,
    /// A handler failed while serving one request.
    Request,
    /// Writing to a response writer failed.
    Write,
}

impl ErrorKind {
    /// Returns the lowercase name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Setup => "setup",
            Self::Request => "request",
            Self::Write => "write",
        }
    }

    /// Returns `true` for kinds that abort startup.
    #[must_use]
    pub const fn is_startup(&self) -> bool {
        matches!(self, Self::Config | Self::Setup)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in an error chain.
///
/// `Display` prints only this node's message, following the `std` convention
/// that causes are reached through [`source`](StdError::source).
/// [`Error::render`] prints the whole chain, outermost first.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Creates a root error with no cause.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// Creates a setup error.
    #[must_use]
    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Setup, message)
    }

    /// Creates a request error.
    #[must_use]
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Request, message)
    }

    /// Creates a write error.
    #[must_use]
    pub fn write(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Write, message)
    }

    /// Wraps `cause` in a new layer carrying `message` and `kind`.
    ///
    /// The cause may be any standard error, including another [`Error`].
    pub fn wrap(cause: impl Into<BoxError>, message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(cause.into()),
        }
    }

    /// Returns the kind of this (outermost) layer.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns this layer's context message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind of the innermost [`Error`] layer in the chain.
    ///
    /// Foreign causes below it (e.g. an `io::Error`) carry no kind, so the
    /// deepest Waypoint layer decides.
    #[must_use]
    pub fn root_kind(&self) -> ErrorKind {
        let mut kind = self.kind;
        let mut current: Option<&(dyn StdError + 'static)> = self.source();
        while let Some(err) = current {
            if let Some(layer) = err.downcast_ref::<Error>() {
                kind = layer.kind;
            }
            current = err.source();
        }
        kind
    }

    /// Returns the innermost error of the chain.
    #[must_use]
    pub fn root_cause(&self) -> &(dyn StdError + 'static) {
        let mut current: &(dyn StdError + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }

    /// Iterates over every layer, outermost (this error) first.
    pub fn chain(&self) -> Chain<'_> {
        Chain {
            next: Some(self),
        }
    }

    /// Returns `true` if any layer of the chain is of `kind`.
    #[must_use]
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.chain()
            .filter_map(|err| err.downcast_ref::<Error>())
            .any(|layer| layer.kind == kind)
    }

    /// Renders every layer's message, outermost to innermost, joined by `": "`.
    #[must_use]
    pub fn render(&self) -> String {
        self.chain()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// Iterator over the layers of an error chain.
///
/// Returned by [`Error::chain`].
#[derive(Debug)]
pub struct Chain<'a> {
    next: Option<&'a (dyn StdError + 'static)>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn StdError + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.source();
        Some(current)
    }
}

/// Extension trait for attaching context to fallible results.
///
/// # Example
///
/// ```
/// use waypoint_core::{ErrorKind, ResultExt};
///
/// let parsed: Result<u16, _> = "80a".parse::<u16>();
/// let err = parsed.wrap_err(ErrorKind::Config, "parse port").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::Config);
/// assert!(err.render().starts_with("parse port: "));
/// ```
pub trait ResultExt<T> {
    /// Wraps the error, if any, in a new layer.
    fn wrap_err(self, kind: ErrorKind, message: impl Into<String>) -> Result<T>;

    /// Like [`wrap_err`](ResultExt::wrap_err) but builds the message lazily.
    fn wrap_err_with<F, M>(self, kind: ErrorKind, message: F) -> Result<T>
    where
        F: FnOnce() -> M,
        M: Into<String>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<BoxError>,
{
    fn wrap_err(self, kind: ErrorKind, message: impl Into<String>) -> Result<T> {
        self.map_err(|cause| Error::wrap(cause, message, kind))
    }

    fn wrap_err_with<F, M>(self, kind: ErrorKind, message: F) -> Result<T>
    where
        F: FnOnce() -> M,
        M: Into<String>,
    {
        self.map_err(|cause| Error::wrap(cause, message(), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn io_root() -> io::Error {
        io::Error::new(io::ErrorKind::NotFound, "no such table: users")
    }

    #[test]
    fn test_root_error() {
        let err = Error::request("missing form value");
        assert_eq!(err.kind(), ErrorKind::Request);
        assert_eq!(err.root_kind(), ErrorKind::Request);
        assert_eq!(err.to_string(), "missing form value");
        assert!(err.source().is_none());
        assert_eq!(err.chain().count(), 1);
    }

    #[test]
    fn test_double_wrap_keeps_root_cause_and_kind() {
        let root = Error::setup("dial tcp: refused");
        let once = Error::wrap(root, "ctx1", ErrorKind::Setup);
        let twice = Error::wrap(once, "ctx2", ErrorKind::Setup);

        assert_eq!(twice.kind(), ErrorKind::Setup);
        assert_eq!(twice.root_kind(), ErrorKind::Setup);
        assert_eq!(twice.root_cause().to_string(), "dial tcp: refused");

        let rendered = twice.render();
        assert!(rendered.contains("ctx1"));
        assert!(rendered.contains("ctx2"));
        assert_eq!(rendered, "ctx2: ctx1: dial tcp: refused");
    }

    #[test]
    fn test_root_kind_survives_rewrapping_with_other_kinds() {
        let root = Error::write("client disconnected");
        let err = Error::wrap(root, "render greeting", ErrorKind::Request);
        let err = Error::wrap(err, "POST /greet", ErrorKind::Request);

        assert_eq!(err.kind(), ErrorKind::Request);
        assert_eq!(err.root_kind(), ErrorKind::Write);
        assert!(err.has_kind(ErrorKind::Write));
        assert!(!err.has_kind(ErrorKind::Config));
    }

    #[test]
    fn test_foreign_root_cause() {
        let err = Error::wrap(io_root(), "open store", ErrorKind::Setup);
        let root = err.root_cause();
        assert_eq!(root.to_string(), "no such table: users");
        assert!(root.downcast_ref::<io::Error>().is_some());
        assert_eq!(err.root_kind(), ErrorKind::Setup);
    }

    #[test]
    fn test_chain_order() {
        let err = Error::wrap(
            Error::wrap(io_root(), "inner", ErrorKind::Setup),
            "outer",
            ErrorKind::Setup,
        );
        let messages: Vec<String> = err.chain().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["outer", "inner", "no such table: users"]);
    }

    #[test]
    fn test_display_is_one_layer_render_is_chain() {
        let err = Error::wrap(io_root(), "open store", ErrorKind::Setup);
        assert_eq!(format!("{err}"), "open store");
        assert_eq!(err.render(), "open store: no such table: users");
        assert_eq!(
            StdError::source(&err).map(ToString::to_string).as_deref(),
            Some("no such table: users")
        );
    }

    #[test]
    fn test_result_ext() {
        let result: std::result::Result<(), io::Error> = Err(io_root());
        let err = result
            .wrap_err_with(ErrorKind::Setup, || format!("acquire {}", "store"))
            .unwrap_err();
        assert_eq!(err.message(), "acquire store");
        assert_eq!(err.render(), "acquire store: no such table: users");
    }

    #[test]
    fn test_kind_helpers() {
        assert!(ErrorKind::Config.is_startup());
        assert!(ErrorKind::Setup.is_startup());
        assert!(!ErrorKind::Request.is_startup());
        assert!(!ErrorKind::Write.is_startup());
        assert_eq!(ErrorKind::Write.to_string(), "write");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<Error>();
    }
}
