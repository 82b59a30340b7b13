//! The server aggregate.
//!
//! A [`Server`] owns the router (optionally wrapped in a middleware
//! [`Stack`]), the shared dependency handles and the configuration. It is
//! itself a [`Handler`] and the recovery boundary of the system: nothing
//! that goes wrong inside a request escapes it.
//!
//! # Recovery
//!
//! | Outcome of the chain | Response |
//! |---|---|
//! | success | whatever the chain wrote |
//! | [`Request`](ErrorKind::Request) error or panic | `500`, `INTERNAL_ERROR` envelope |
//! | [`Write`](ErrorKind::Write) error | nothing more is written, logged at `debug` |
//! | deadline exceeded | `504`, `HANDLER_TIMEOUT` envelope |
//!
//! A fallback body is only written if nothing was written yet or the writer
//! can still discard its partial output.

use std::any::{Any, TypeId};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::FutureExt;
use http::StatusCode;
use http_body_util::Full;
use waypoint_core::di::Container;
use waypoint_core::{
    BufferedWriter, Error, ErrorEnvelope, ErrorKind, Handler, HandlerFuture, Request,
    ResponseWriter,
};
use waypoint_middleware::{Middleware, Stack};
use waypoint_router::{RouteInfo, Router};

use crate::config::ServerConfig;

/// Envelope code for recovered failures.
pub const INTERNAL_ERROR_CODE: &str = "INTERNAL_ERROR";

/// Envelope code for requests that exceeded their deadline.
pub const HANDLER_TIMEOUT_CODE: &str = "HANDLER_TIMEOUT";

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";
const HANDLER_TIMEOUT_MESSAGE: &str = "request handler timed out";

/// The assembled request-serving aggregate.
///
/// Built once at startup with [`Server::builder`] and shared (usually in an
/// `Arc`) by every request afterwards. Nothing in it is mutated at request
/// time.
///
/// # Example
///
/// ```rust
/// use waypoint_core::sync_handler;
/// use waypoint_router::Router;
/// use waypoint_server::Server;
///
/// let mut router = Router::new();
/// router
///     .get("/health", sync_handler(|writer, _| {
///         writer.write_str("ok")?;
///         Ok(())
///     }))
///     .unwrap();
///
/// let server = Server::builder().router(router).build().unwrap();
///
/// # tokio_test::block_on(async {
/// let response = server
///     .serve(http::Request::get("/health").body(bytes::Bytes::new()).unwrap())
///     .await;
/// assert_eq!(response.status(), 200);
/// # });
/// ```
pub struct Server {
    /// Router wrapped in the middleware stack
    entry: Arc<dyn Handler>,
    /// Registered routes, for listings
    routes: Vec<RouteInfo>,
    /// Middleware names, outermost first
    middleware: Vec<&'static str>,
    /// Shared dependency handles
    container: Container,
    /// Server configuration
    config: ServerConfig,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("routes", &self.routes.len())
            .field("middleware", &self.middleware)
            .field("container", &self.container)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns a shared dependency handle.
    #[must_use]
    pub fn resolve<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve()
    }

    /// Returns a shared dependency handle or a configuration error.
    ///
    /// # Errors
    ///
    /// Returns a [`Config`](ErrorKind::Config) error if `T` was not supplied.
    pub fn resolve_required<T>(&self) -> Result<Arc<T>, Error>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.resolve_required()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the registered routes.
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Returns the middleware names, outermost first.
    #[must_use]
    pub fn middleware(&self) -> &[&'static str] {
        &self.middleware
    }

    /// Runs one request through the chain inside the recovery boundary.
    ///
    /// Never fails: every failure has been converted into a response (or
    /// logged, when the writer can no longer take one) when this returns.
    pub async fn dispatch(&self, writer: &mut dyn ResponseWriter, request: &Request) {
        let deadline = self.config.request_timeout();
        let inner = &mut *writer;
        // Constructing the chain future can panic as well as polling it
        let chain = AssertUnwindSafe(async move { self.entry.handle(inner, request).await }).catch_unwind();

        let outcome = tokio::time::timeout(deadline, chain).await;

        match outcome {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(error))) => self.recover(writer, request, &error),
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    method = %request.method(),
                    path = request.path(),
                    panic = %message,
                    "request handler panicked"
                );
                self.fallback(
                    writer,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_CODE,
                    INTERNAL_ERROR_MESSAGE,
                    Some(format!("handler panicked: {message}")),
                );
            }
            Err(_elapsed) => {
                tracing::warn!(
                    method = %request.method(),
                    path = request.path(),
                    timeout_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                    "request handler timed out"
                );
                self.fallback(
                    writer,
                    StatusCode::GATEWAY_TIMEOUT,
                    HANDLER_TIMEOUT_CODE,
                    HANDLER_TIMEOUT_MESSAGE,
                    None,
                );
            }
        }
    }

    /// Converts an `http` request, dispatches it, and returns the buffered
    /// response.
    ///
    /// The response body is limited to
    /// [`max_body_bytes`](ServerConfig::max_body_bytes); a handler exceeding
    /// it gets a write error and the partial body is returned as is.
    pub async fn serve(&self, request: http::Request<Bytes>) -> http::Response<Full<Bytes>> {
        let request = Request::from(request);
        let mut writer = BufferedWriter::with_limit(self.config.max_body_bytes());
        self.dispatch(&mut writer, &request).await;
        writer.into_response()
    }

    fn recover(&self, writer: &mut dyn ResponseWriter, request: &Request, error: &Error) {
        if error.has_kind(ErrorKind::Write) {
            tracing::debug!(
                method = %request.method(),
                path = request.path(),
                error = %error.render(),
                "response write failed, abandoning request"
            );
            return;
        }

        tracing::error!(
            method = %request.method(),
            path = request.path(),
            kind = %error.kind(),
            error = %error.render(),
            "request failed"
        );
        self.fallback(
            writer,
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_ERROR_CODE,
            INTERNAL_ERROR_MESSAGE,
            Some(error.render()),
        );
    }

    fn fallback(
        &self,
        writer: &mut dyn ResponseWriter,
        status: StatusCode,
        code: &str,
        message: &str,
        detail: Option<String>,
    ) {
        if writer.bytes_written() > 0 && !writer.discard() {
            tracing::warn!(
                status = status.as_u16(),
                bytes_written = writer.bytes_written(),
                "response already committed, fallback suppressed"
            );
            return;
        }

        let message = match detail {
            Some(detail) if self.config.expose_error_details() => detail,
            _ => message.to_string(),
        };
        if let Err(e) = ErrorEnvelope::new(code, message).write_to(writer, status) {
            tracing::debug!(error = %e, "failed to write fallback response");
        }
    }
}

impl Handler for Server {
    fn handle<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.dispatch(writer, request).await;
            Ok(())
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Builder for configuring and creating a [`Server`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use waypoint_router::Router;
/// use waypoint_server::Server;
///
/// struct Store;
///
/// let err = Server::builder()
///     .router(Router::new())
///     .require::<Store>()
///     .build()
///     .unwrap_err();
/// assert!(err.to_string().contains("Store"));
///
/// let server = Server::builder()
///     .router(Router::new())
///     .dependency(Arc::new(Store))
///     .require::<Store>()
///     .build()
///     .unwrap();
/// assert!(server.resolve::<Store>().is_some());
/// ```
#[derive(Default)]
pub struct ServerBuilder {
    router: Option<Router>,
    stack: Stack,
    container: Container,
    required: Vec<(TypeId, &'static str)>,
    config: Option<ServerConfig>,
}

impl std::fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("has_router", &self.router.is_some())
            .field("stack", &self.stack)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

impl ServerBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the router. Required.
    #[must_use]
    pub fn router(mut self, router: Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Adds a middleware around the router, inside any added before it.
    #[must_use]
    pub fn middleware<M: Middleware>(mut self, middleware: M) -> Self {
        self.stack = self.stack.push(middleware);
        self
    }

    /// Appends a whole middleware stack around the router.
    #[must_use]
    pub fn stack(mut self, stack: Stack) -> Self {
        self.stack = self.stack.append(stack);
        self
    }

    /// Supplies a shared dependency handle.
    #[must_use]
    pub fn dependency<T>(mut self, handle: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.container.register(handle);
        self
    }

    /// Declares that `build` must fail unless a `T` handle was supplied.
    #[must_use]
    pub fn require<T>(mut self) -> Self
    where
        T: ?Sized + 'static,
    {
        self.required
            .push((TypeId::of::<T>(), std::any::type_name::<T>()));
        self
    }

    /// Sets the server configuration. Defaults to [`ServerConfig::default`].
    #[must_use]
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Returns a [`Config`](ErrorKind::Config) error if no router was set
    /// or a required dependency is missing.
    pub fn build(self) -> Result<Server, Error> {
        let router = self
            .router
            .ok_or_else(|| Error::config("server requires a router"))?;

        let missing: Vec<&str> = self
            .required
            .iter()
            .filter(|(id, _)| !self.container.contains_id(*id))
            .map(|(_, name)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "missing required dependencies: {}",
                missing.join(", ")
            )));
        }

        let routes = router.routes().to_vec();
        for route in &routes {
            tracing::debug!(method = %route.method, pattern = %route.pattern, "route");
        }
        let middleware = self.stack.names();
        let entry = self.stack.apply(router);

        tracing::info!(
            routes = routes.len(),
            middleware = middleware.len(),
            dependencies = self.container.len(),
            "server built"
        );

        Ok(Server {
            entry,
            routes,
            middleware,
            container: self.container,
            config: self.config.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use waypoint_core::{handler_fn, sync_handler};

    trait Store: Send + Sync {
        fn label(&self) -> &'static str;
    }

    struct MemoryStore;

    impl Store for MemoryStore {
        fn label(&self) -> &'static str {
            "memory"
        }
    }

    fn server_with(router: Router, config: ServerConfig) -> Server {
        Server::builder().router(router).config(config).build().unwrap()
    }

    fn envelope(writer: &BufferedWriter) -> ErrorEnvelope {
        serde_json::from_slice(writer.body()).unwrap()
    }

    async fn dispatch(server: &Server, uri: &str) -> BufferedWriter {
        let mut writer = BufferedWriter::new();
        server
            .handle(&mut writer, &Request::builder().uri(uri).build())
            .await
            .unwrap();
        writer
    }

    #[test]
    fn test_build_requires_router() {
        let err = Server::builder().build().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("router"));
    }

    #[test]
    fn test_build_reports_missing_dependencies() {
        let err = Server::builder()
            .router(Router::new())
            .require::<dyn Store>()
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("Store"));
    }

    #[test]
    fn test_resolve_trait_object_dependency() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore);
        let server = Server::builder()
            .router(Router::new())
            .dependency(store)
            .require::<dyn Store>()
            .build()
            .unwrap();

        assert_eq!(server.resolve::<dyn Store>().unwrap().label(), "memory");
        assert!(server.resolve_required::<MemoryStore>().is_err());
    }

    #[tokio::test]
    async fn test_request_error_becomes_500() {
        let mut router = Router::new();
        router
            .get("/fail", sync_handler(|_, _| Err(Error::request("lookup failed"))))
            .unwrap();
        let server = server_with(router, ServerConfig::default());

        let writer = dispatch(&server, "/fail").await;
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            writer.body_text(),
            r#"{"error":{"code":"INTERNAL_ERROR","message":"internal server error"}}"#
        );
    }

    #[tokio::test]
    async fn test_partial_body_is_discarded_before_fallback() {
        let mut router = Router::new();
        router
            .get("/half", sync_handler(|writer, _| {
                writer.write_str("Hello, ")?;
                Err(Error::request("lost the name"))
            }))
            .unwrap();
        let server = server_with(router, ServerConfig::default());

        let writer = dispatch(&server, "/half").await;
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(envelope(&writer).error.code, INTERNAL_ERROR_CODE);
    }

    /// A writer that has already flushed its output and cannot take it back.
    struct StreamingWriter {
        inner: BufferedWriter,
    }

    impl ResponseWriter for StreamingWriter {
        fn status(&self) -> StatusCode {
            self.inner.status()
        }

        fn set_status(&mut self, status: StatusCode) {
            self.inner.set_status(status);
        }

        fn insert_header(&mut self, name: http::HeaderName, value: http::HeaderValue) {
            self.inner.insert_header(name, value);
        }

        fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
            self.inner.write(bytes)
        }

        fn bytes_written(&self) -> usize {
            self.inner.bytes_written()
        }
    }

    #[tokio::test]
    async fn test_committed_response_is_left_alone() {
        let mut router = Router::new();
        router
            .get("/half", sync_handler(|writer, _| {
                writer.write_str("Hello, ")?;
                Err(Error::request("lost the name"))
            }))
            .unwrap();
        let server = server_with(router, ServerConfig::default());

        let mut writer = StreamingWriter {
            inner: BufferedWriter::new(),
        };
        server
            .handle(&mut writer, &Request::builder().uri("/half").build())
            .await
            .unwrap();

        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.inner.body_text(), "Hello, ");
    }

    #[tokio::test]
    async fn test_write_error_gets_no_fallback() {
        let mut router = Router::new();
        router
            .get("/big", sync_handler(|writer, _| {
                writer.write_str("0123456789")?;
                Ok(())
            }))
            .unwrap();
        let server = server_with(router, ServerConfig::builder().max_body_bytes(4).build());

        let response = server
            .serve(http::Request::get("/big").body(Bytes::new()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_panic_is_recovered() {
        let mut router = Router::new();
        router
            .get("/panic", sync_handler(|_, _| panic!("invariant violated")))
            .unwrap();
        let server = server_with(
            router,
            ServerConfig::builder().expose_error_details(true).build(),
        );

        let writer = dispatch(&server, "/panic").await;
        assert_eq!(writer.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = envelope(&writer);
        assert_eq!(body.error.code, INTERNAL_ERROR_CODE);
        assert!(body.error.message.contains("invariant violated"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_504() {
        let mut router = Router::new();
        router
            .get("/slow", handler_fn(|_, _| {
                Box::pin(async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                })
            }))
            .unwrap();
        let server = server_with(
            router,
            ServerConfig::builder()
                .request_timeout(Duration::from_millis(100))
                .build(),
        );

        let writer = dispatch(&server, "/slow").await;
        assert_eq!(writer.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(envelope(&writer).error.code, HANDLER_TIMEOUT_CODE);
    }

    #[tokio::test]
    async fn test_expose_error_details_renders_chain() {
        let mut router = Router::new();
        router
            .get("/fail", sync_handler(|_, _| {
                Err(Error::wrap(
                    Error::request("row not found"),
                    "lookup user",
                    ErrorKind::Request,
                ))
            }))
            .unwrap();
        let server = server_with(
            router,
            ServerConfig::builder().expose_error_details(true).build(),
        );

        let writer = dispatch(&server, "/fail").await;
        assert_eq!(envelope(&writer).error.message, "lookup user: row not found");
    }

    #[test]
    fn test_panic_message_payloads() {
        let boxed: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic payload");
    }
}
