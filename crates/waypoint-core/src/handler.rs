//! Handler trait for request processing.
//!
//! The [`Handler`] trait is the single capability every request handler
//! exposes: given a [`ResponseWriter`] and a [`Request`], write a response or
//! fail. Routers, middleware layers and the server are handlers themselves,
//! so they all compose uniformly.
//!
//! Plain functions and closures become handlers through the
//! [`handler_fn`] (async) and [`sync_handler`] (synchronous) adapters.
//!
//! # Example
//!
//! ```rust
//! use waypoint_core::{sync_handler, BufferedWriter, Handler, Request};
//!
//! let hello = sync_handler(|writer, _request| {
//!     writer.write_str("hello")?;
//!     Ok(())
//! });
//!
//! # tokio_test::block_on(async {
//! let mut writer = BufferedWriter::new();
//! hello.handle(&mut writer, &Request::builder().build()).await.unwrap();
//! assert_eq!(writer.body(), b"hello");
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::writer::ResponseWriter;

/// A boxed, sendable future.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The future returned by [`Handler::handle`].
pub type HandlerFuture<'a> = BoxFuture<'a, Result<(), Error>>;

/// A shared, type-erased handler.
pub type BoxHandler = Arc<dyn Handler>;

/// Serves one request.
///
/// # Contract
///
/// - On success the handler has written zero or more bytes to `writer`.
/// - On failure it returns an [`Error`]; bytes already written stay written.
/// - The handler must not keep `writer` or `request` past the call; the
///   borrow lifetimes enforce this.
///
/// # Example
///
/// ```rust
/// use waypoint_core::{Handler, HandlerFuture, Request, ResponseWriter};
///
/// struct Static(&'static str);
///
/// impl Handler for Static {
///     fn handle<'a>(
///         &'a self,
///         writer: &'a mut dyn ResponseWriter,
///         _request: &'a Request,
///     ) -> HandlerFuture<'a> {
///         Box::pin(async move {
///             writer.write(self.0.as_bytes())?;
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Handles a request.
    fn handle<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
    ) -> HandlerFuture<'a>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn handle<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
    ) -> HandlerFuture<'a> {
        (**self).handle(writer, request)
    }
}

impl<H: Handler + ?Sized> Handler for Box<H> {
    fn handle<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
    ) -> HandlerFuture<'a> {
        (**self).handle(writer, request)
    }
}

/// Converts a handler into a [`BoxHandler`].
pub fn boxed<H: Handler>(handler: H) -> BoxHandler {
    Arc::new(handler)
}

/// Adapter turning an async closure into a [`Handler`].
///
/// Created by [`handler_fn`].
pub struct HandlerFn<F> {
    func: F,
}

/// Wraps a closure returning a boxed future as a [`Handler`].
///
/// # Example
///
/// ```rust
/// use waypoint_core::{handler_fn, Handler};
///
/// let greet = handler_fn(|writer, request| {
///     Box::pin(async move {
///         let name = request.form_value("name").unwrap_or("stranger");
///         writer.write_str(&format!("Hello, {name}!"))?;
///         Ok(())
///     })
/// });
/// # fn assert_handler<H: Handler>(_: &H) {}
/// # assert_handler(&greet);
/// ```
pub fn handler_fn<F>(func: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request) -> HandlerFuture<'a>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { func }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut dyn ResponseWriter, &'a Request) -> HandlerFuture<'a>
        + Send
        + Sync
        + 'static,
{
    fn handle<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
    ) -> HandlerFuture<'a> {
        (self.func)(writer, request)
    }
}

impl<F> std::fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

/// Adapter turning a synchronous function into a [`Handler`].
///
/// Created by [`sync_handler`].
pub struct SyncHandler<F> {
    func: F,
}

/// Wraps a plain function or closure as a [`Handler`].
///
/// The function runs to completion inside the returned future, so it should
/// not block for long.
pub fn sync_handler<F>(func: F) -> SyncHandler<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> Result<(), Error> + Send + Sync + 'static,
{
    SyncHandler { func }
}

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&mut dyn ResponseWriter, &Request) -> Result<(), Error> + Send + Sync + 'static,
{
    fn handle<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
    ) -> HandlerFuture<'a> {
        Box::pin(std::future::ready((self.func)(writer, request)))
    }
}

impl<F> std::fmt::Debug for SyncHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandler").finish_non_exhaustive()
    }
}
