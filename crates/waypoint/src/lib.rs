//! # Waypoint
//!
//! A request-serving core for HTTP services. A service is assembled from
//! small pieces:
//!
//! - **Handlers** answer one operation and write to a
//!   [`ResponseWriter`](core::ResponseWriter)
//! - a **Router** maps method + path patterns to handlers
//! - **Middleware** wraps handlers, outermost first
//! - a **Server** owns the composed chain and turns handler failures into
//!   `500` responses instead of crashing
//! - a **ResourceScope** acquires long-lived resources and releases them in
//!   reverse order
//!
//! ## Quick Start
//!
//! ```rust
//! use waypoint::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut router = Router::new();
//! router.get("/hello/{name}", sync_handler(|writer, request| {
//!     let name = request.param("name").unwrap_or("stranger");
//!     writer.write_str(&format!("Hello, {name}!"))?;
//!     Ok(())
//! }))?;
//!
//! let server = Server::builder()
//!     .router(router)
//!     .middleware(RequestId::new())
//!     .build()?;
//!
//! let request = http::Request::get("/hello/Ann").body(bytes::Bytes::new())?;
//! let response = server.serve(request).await;
//! assert_eq!(response.status(), http::StatusCode::OK);
//! # Ok(())
//! # }
//! ```
//!
//! ## Request flow
//!
//! ```text
//! serve → recovery boundary → middleware (outer → inner) → Router → Handler
//!                                                                     ↓
//! response ← fallback envelope on failure ← middleware (inner → outer) ┘
//! ```

#![doc(html_root_url = "https://docs.rs/waypoint/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use waypoint_core as core;

// Re-export server types
pub use waypoint_server as server;

// Re-export middleware types
pub use waypoint_middleware as middleware;

// Re-export router types
pub use waypoint_router as router;

// Re-export logging setup
pub use waypoint_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// ```rust
/// use waypoint::prelude::*;
/// ```
pub mod prelude {
    pub use waypoint_core::{
        handler_fn, sync_handler, BoxHandler, BufferedWriter, Error, ErrorKind, Handler,
        HandlerFuture, Request, ResponseWriter, ResultExt,
    };

    // Re-export DI types
    pub use waypoint_core::di::Container;

    pub use waypoint_middleware::{
        FnMiddleware, Guard, Middleware, Next, RequestId, RequestTracing, Stack,
    };

    pub use waypoint_router::Router;

    pub use waypoint_server::{
        Resource, ResourceGuard, ResourceScope, Server, ServerBuilder, ServerConfig,
    };

    pub use waypoint_telemetry::{init_logging, LogConfig};
}
