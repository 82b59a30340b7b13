//! High-level router API.
//!
//! This module provides the main [`Router`] struct, which maps
//! `(method, path pattern)` pairs to handlers and is itself a [`Handler`].

use http::header::ALLOW;
use http::{HeaderValue, Method, StatusCode};
use waypoint_core::{
    boxed, BoxHandler, Error, Handler, HandlerFuture, Params, Request, ResponseWriter,
};

use crate::method_router::allow_header_value;
use crate::node::Node;
use crate::pattern::Pattern;

/// Body written for unmatched paths.
const NOT_FOUND_BODY: &str = "404 page not found\n";

/// Body written when the path matches but the method does not.
const METHOD_NOT_ALLOWED_BODY: &str = "405 method not allowed\n";

/// The outcome of looking up a request in the routing tree.
pub enum RouteMatch<'a> {
    /// A handler is registered for the method and path.
    Matched {
        /// The handler to run
        handler: &'a BoxHandler,
        /// Extracted path parameters
        params: Params,
    },
    /// The path matched but not for this method.
    MethodNotAllowed(Vec<Method>),
    /// No pattern matched the path.
    NotFound,
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Matched { params, .. } => {
                f.debug_struct("Matched").field("params", params).finish_non_exhaustive()
            }
            Self::MethodNotAllowed(allowed) => f.debug_tuple("MethodNotAllowed").field(allowed).finish(),
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// A registered `(method, pattern)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// HTTP method
    pub method: Method,
    /// Normalized pattern (trailing slash removed)
    pub pattern: String,
}

/// Dispatches requests to handlers by method and path.
///
/// Routes are matched in O(k) time where k is the number of path segments.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use waypoint_core::sync_handler;
/// use waypoint_router::Router;
///
/// let mut router = Router::new();
/// router
///     .register(Method::GET, "/users/{id}", sync_handler(|writer, request| {
///         writer.write_str(request.param("id").unwrap_or_default())?;
///         Ok(())
///     }))
///     .unwrap();
///
/// assert!(router.register(Method::GET, "/users/{id}/", sync_handler(|_, _| Ok(()))).is_err());
/// ```
///
/// # Route Priority
///
/// When multiple routes could match, the router uses the following priority:
///
/// 1. **Static segments** (e.g., `/users/me`)
/// 2. **Parameter segments** (e.g., `/users/{id}`)
/// 3. **Wildcard segments** (e.g., `/files/*path`)
///
/// A failed deeper match backtracks, so `/static/img/*rest` wins over
/// `/static/*rest` for `/static/img/logo.png`, and `/static/*rest` still
/// serves `/static/css/site.css`.
#[derive(Debug, Clone, Default)]
pub struct Router {
    /// Root node of the routing tree
    root: Node,
    /// Registered routes in registration order
    routes: Vec<RouteInfo>,
}

impl Router {
    /// Creates a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` requests matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern is malformed or
    /// `(method, pattern)` is already registered. The router is unchanged
    /// on error.
    pub fn register<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> Result<(), Error> {
        self.register_boxed(method, pattern, boxed(handler))
    }

    /// Registers an already type-erased handler.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn register_boxed(&mut self, method: Method, pattern: &str, handler: BoxHandler) -> Result<(), Error> {
        let parsed = Pattern::parse(pattern)?;
        // Validate against a scratch copy so a conflict leaves no half-built branch
        let mut root = self.root.clone();
        root.insert(&parsed, method.clone(), handler)?;
        self.root = root;

        tracing::debug!(method = %method, pattern = %parsed, "route registered");
        self.routes.push(RouteInfo {
            method,
            pattern: parsed.to_string(),
        });
        Ok(())
    }

    /// Shorthand for `register(Method::GET, ..)`.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.register(Method::GET, pattern, handler)
    }

    /// Shorthand for `register(Method::POST, ..)`.
    ///
    /// # Errors
    ///
    /// Same as [`Router::register`].
    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.register(Method::POST, pattern, handler)
    }

    /// Looks up the handler for a method and path.
    ///
    /// A more specific pattern registered only for other methods does not
    /// hide a less specific one that accepts `method`. The result is
    /// [`RouteMatch::MethodNotAllowed`] only when no matching pattern has
    /// `method`, listing the methods of every pattern that matched the path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut allowed = Vec::new();
        match self.root.lookup(Some(method), path, &mut allowed) {
            Some((handler, params)) => RouteMatch::Matched { handler, params },
            None if allowed.is_empty() => RouteMatch::NotFound,
            None => RouteMatch::MethodNotAllowed(allowed),
        }
    }

    /// Returns the methods registered for the patterns matching `path`.
    ///
    /// Empty if no pattern matches.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut allowed = Vec::new();
        self.root.lookup(None, path, &mut allowed);
        allowed
    }

    /// Returns the registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Returns the number of registered `(method, pattern)` pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Handler for Router {
    fn handle<'a>(&'a self, writer: &'a mut dyn ResponseWriter, request: &'a Request) -> HandlerFuture<'a> {
        Box::pin(async move {
            match self.match_route(request.method(), request.path()) {
                RouteMatch::Matched { handler, params } => {
                    if params.is_empty() {
                        handler.handle(writer, request).await
                    } else {
                        let routed = request.with_params(params);
                        handler.handle(writer, &routed).await
                    }
                }
                RouteMatch::MethodNotAllowed(allowed) => {
                    tracing::debug!(
                        method = %request.method(),
                        path = request.path(),
                        "method not allowed"
                    );
                    writer.set_status(StatusCode::METHOD_NOT_ALLOWED);
                    if let Ok(value) = HeaderValue::from_str(&allow_header_value(&allowed)) {
                        writer.insert_header(ALLOW, value);
                    }
                    writer.write_str(METHOD_NOT_ALLOWED_BODY)?;
                    Ok(())
                }
                RouteMatch::NotFound => {
                    tracing::debug!(path = request.path(), "no route matched");
                    writer.set_status(StatusCode::NOT_FOUND);
                    writer.write_str(NOT_FOUND_BODY)?;
                    Ok(())
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::{sync_handler, BufferedWriter, ErrorKind};

    fn echo(tag: &'static str) -> impl Handler {
        sync_handler(move |writer, request| {
            writer.write_str(tag)?;
            for (name, value) in request.params().iter() {
                writer.write_str(&format!(" {name}={value}"))?;
            }
            Ok(())
        })
    }

    async fn dispatch(router: &Router, method: Method, uri: &str) -> BufferedWriter {
        let request = Request::builder().method(method).uri(uri).build();
        let mut writer = BufferedWriter::new();
        router.handle(&mut writer, &request).await.unwrap();
        writer
    }

    #[test]
    fn test_router_new() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut router = Router::new();
        router.register(Method::GET, "/users", echo("a")).unwrap();
        let err = router.register(Method::GET, "/users/", echo("b")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("duplicate route"));
        assert_eq!(router.len(), 1);
    }

    #[test]
    fn test_malformed_pattern_rejected() {
        let mut router = Router::new();
        let err = router.register(Method::GET, "users", echo("a")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(router.is_empty());
    }

    #[test]
    fn test_failed_registration_leaves_tree_untouched() {
        let mut router = Router::new();
        router.get("/users/{id}", echo("a")).unwrap();
        assert!(router.get("/users/{name}/posts", echo("b")).is_err());
        assert!(router.allowed_methods("/users/1/posts").is_empty());
    }

    #[test]
    fn test_routes_listing() {
        let mut router = Router::new();
        router.get("/users/", echo("list")).unwrap();
        router.post("/users", echo("create")).unwrap();

        let routes: Vec<(Method, &str)> = router
            .routes()
            .iter()
            .map(|route| (route.method.clone(), route.pattern.as_str()))
            .collect();
        assert_eq!(routes, vec![(Method::GET, "/users"), (Method::POST, "/users")]);
    }

    #[test]
    fn test_same_pattern_shares_method_router() {
        let mut router = Router::new();
        router.get("/users", echo("list")).unwrap();
        router.post("/users", echo("create")).unwrap();
        assert_eq!(router.allowed_methods("/users").len(), 2);
    }

    #[tokio::test]
    async fn test_static_route() {
        let mut router = Router::new();
        router.get("/health", echo("ok")).unwrap();

        let writer = dispatch(&router, Method::GET, "/health").await;
        assert_eq!(writer.status(), StatusCode::OK);
        assert_eq!(writer.body_text(), "ok");
    }

    #[tokio::test]
    async fn test_param_route_attaches_params() {
        let mut router = Router::new();
        router.get("/users/{id}/posts/{post}", echo("post")).unwrap();

        let writer = dispatch(&router, Method::GET, "/users/7/posts/42").await;
        assert_eq!(writer.body_text(), "post id=7 post=42");
    }

    #[tokio::test]
    async fn test_static_beats_param() {
        let mut router = Router::new();
        router.get("/users/{id}", echo("param")).unwrap();
        router.get("/users/me", echo("static")).unwrap();

        assert_eq!(dispatch(&router, Method::GET, "/users/me").await.body_text(), "static");
        assert_eq!(
            dispatch(&router, Method::GET, "/users/5").await.body_text(),
            "param id=5"
        );
    }

    #[tokio::test]
    async fn test_deepest_prefix_wins() {
        let mut router = Router::new();
        router.get("/static/*rest", echo("shallow")).unwrap();
        router.get("/static/img/*rest", echo("deep")).unwrap();

        assert_eq!(
            dispatch(&router, Method::GET, "/static/img/logo.png").await.body_text(),
            "deep rest=logo.png"
        );
        assert_eq!(
            dispatch(&router, Method::GET, "/static/css/site.css").await.body_text(),
            "shallow rest=css/site.css"
        );
        assert_eq!(
            dispatch(&router, Method::GET, "/static/img").await.body_text(),
            "shallow rest=img"
        );
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut router = Router::new();
        router.get("/users", echo("list")).unwrap();

        let writer = dispatch(&router, Method::GET, "/nothing").await;
        assert_eq!(writer.status(), StatusCode::NOT_FOUND);
        assert_eq!(writer.body_text(), NOT_FOUND_BODY);
    }

    #[tokio::test]
    async fn test_method_not_allowed_lists_methods() {
        let mut router = Router::new();
        router.get("/users", echo("list")).unwrap();
        router.post("/users", echo("create")).unwrap();

        let writer = dispatch(&router, Method::DELETE, "/users").await;
        assert_eq!(writer.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(writer.headers().get(ALLOW).unwrap(), "GET, POST");
        assert_eq!(router.allowed_methods("/users"), vec![Method::GET, Method::POST]);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let mut router = Router::new();
        router
            .get("/fail", sync_handler(|_, _| Err(Error::request("store unavailable"))))
            .unwrap();

        let request = Request::builder().uri("/fail").build();
        let mut writer = BufferedWriter::new();
        let err = router.handle(&mut writer, &request).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
        assert_eq!(err.message(), "store unavailable");
    }

    #[tokio::test]
    async fn test_query_string_ignored_for_matching() {
        let mut router = Router::new();
        router.get("/search", echo("search")).unwrap();

        let writer = dispatch(&router, Method::GET, "/search?q=rust").await;
        assert_eq!(writer.body_text(), "search");
    }
}
