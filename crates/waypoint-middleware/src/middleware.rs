//! Core middleware trait and types.
//!
//! This module defines the [`Middleware`] trait that all middleware stages
//! implement. A middleware wraps a handler: it can run logic before the
//! wrapped handler, after it, or instead of it.
//!
//! Wrapping a handler yields another handler, so wrapped chains are used
//! exactly like plain handlers (registered in a router, wrapped again, ...).
//!
//! # Example
//!
//! ```
//! use waypoint_core::{HandlerFuture, Request, ResponseWriter};
//! use waypoint_middleware::{Middleware, Next};
//!
//! struct LoggingMiddleware;
//!
//! impl Middleware for LoggingMiddleware {
//!     fn name(&self) -> &'static str {
//!         "logging"
//!     }
//!
//!     fn process<'a>(
//!         &'a self,
//!         writer: &'a mut dyn ResponseWriter,
//!         request: &'a Request,
//!         next: Next<'a>,
//!     ) -> HandlerFuture<'a> {
//!         Box::pin(async move {
//!             tracing::info!(path = request.path(), "before");
//!             let result = next.run(&mut *writer, request).await;
//!             tracing::info!(status = %writer.status(), "after");
//!             result
//!         })
//!     }
//! }
//! ```

use std::sync::Arc;

use waypoint_core::{boxed, BoxHandler, Handler, HandlerFuture, Request, ResponseWriter};

/// A type-erased middleware that can be stored in a vector.
pub type BoxedMiddleware = Arc<dyn Middleware>;

/// The core middleware trait.
///
/// Middleware receives the response writer, the request, and a [`Next`]
/// callback that runs the wrapped handler.
///
/// # Invariants
///
/// - Middleware calls `next.run()` at most once; not calling it
///   short-circuits the chain
/// - Middleware SHOULD NOT suppress errors from the wrapped handler
pub trait Middleware: Send + Sync + 'static {
    /// Returns the name of this middleware stage.
    ///
    /// This name is used for logging and debugging.
    fn name(&self) -> &'static str;

    /// Process the request through this middleware.
    fn process<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
        next: Next<'a>,
    ) -> HandlerFuture<'a>;

    /// Wraps `handler`, returning the composed handler.
    fn wrap<H: Handler>(self, handler: H) -> BoxHandler
    where
        Self: Sized,
    {
        layer(Arc::new(self), boxed(handler))
    }
}

/// Wraps `inner` with a shared middleware.
#[must_use]
pub fn layer(middleware: BoxedMiddleware, inner: BoxHandler) -> BoxHandler {
    Arc::new(Layered { middleware, inner })
}

/// A handler composed of one middleware around an inner handler.
struct Layered {
    middleware: BoxedMiddleware,
    inner: BoxHandler,
}

impl Handler for Layered {
    fn handle<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: &'a Request) -> HandlerFuture<'a> {
        self.middleware
            .process(writer, request, Next::new(self.inner.as_ref()))
    }
}

/// Callback to invoke the wrapped handler.
///
/// `run` consumes `self`, so the wrapped handler runs at most once per
/// `process` call.
pub struct Next<'a> {
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    /// Creates a `Next` that will invoke `handler`.
    #[must_use]
    pub fn new(handler: &'a dyn Handler) -> Self {
        Self { handler }
    }

    /// Invokes the wrapped handler.
    ///
    /// The request may be the one the middleware received or a derived one
    /// it built locally.
    pub fn run<'b>(self, writer: &'b mut dyn ResponseWriter, request: &'b Request) -> HandlerFuture<'b>
    where
        'a: 'b,
    {
        self.handler.handle(writer, request)
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// A middleware that can be created from a closure.
///
/// This allows defining simple middleware without implementing the trait directly.
///
/// # Example
///
/// ```
/// use std::time::Instant;
/// use waypoint_middleware::FnMiddleware;
///
/// let timing = FnMiddleware::new("timing", |writer, request, next| {
///     Box::pin(async move {
///         let start = Instant::now();
///         let result = next.run(writer, request).await;
///         tracing::debug!(elapsed = ?start.elapsed(), "request finished");
///         result
///     })
/// });
/// ```
pub struct FnMiddleware<F> {
    name: &'static str,
    func: F,
}

impl<F> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request, Next<'a>) -> HandlerFuture<'a>
        + Send
        + Sync
        + 'static,
{
    /// Creates a new closure-based middleware.
    pub fn new(name: &'static str, func: F) -> Self {
        Self { name, func }
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request, Next<'a>) -> HandlerFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn process<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
        next: Next<'a>,
    ) -> HandlerFuture<'a> {
        (self.func)(writer, request, next)
    }
}

impl<F> std::fmt::Debug for FnMiddleware<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMiddleware")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
