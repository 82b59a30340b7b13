//! Radix tree router for Waypoint.
//!
//! The [`Router`] maps `(method, path pattern)` pairs to handlers and is a
//! [`Handler`](waypoint_core::Handler) itself, so it can be wrapped in
//! middleware or mounted inside a server like any other handler.
//!
//! # Features
//!
//! - **Segment Tree Matching**: O(k) path lookup in the number of segments
//! - **Path Parameters**: Extract named parameters from paths (`/users/{id}`)
//! - **Wildcards**: Catch-all prefix routes (`/files/*path`)
//! - **Method-Based Routing**: `405 Method Not Allowed` with an `Allow` header
//! - **Checked Registration**: duplicate or malformed patterns are
//!   configuration errors, reported at startup
//!
//! # Example
//!
//! ```rust
//! use http::Method;
//! use waypoint_core::{sync_handler, BufferedWriter, Handler, Request};
//! use waypoint_router::Router;
//!
//! let mut router = Router::new();
//! router
//!     .get("/users/{id}", sync_handler(|writer, request| {
//!         writer.write_str(&format!("user {}", request.param("id").unwrap_or("?")))?;
//!         Ok(())
//!     }))
//!     .unwrap();
//!
//! # tokio_test::block_on(async {
//! let mut writer = BufferedWriter::new();
//! let request = Request::builder().uri("/users/123").build();
//! router.handle(&mut writer, &request).await.unwrap();
//! assert_eq!(writer.body_text(), "user 123");
//! # });
//! ```
//!
//! # Architecture
//!
//! Each tree node is one pattern segment:
//!
//! ```text
//!                    (root)
//!                      │
//!              ┌───────┴───────┐
//!              │               │
//!            "users"        "files"
//!              │               │
//!        ┌─────┴─────┐        "*path"
//!        │           │
//!       (leaf)    "{id}"
//!   [GET,POST]      │
//!                 (leaf)
//!              [GET,DELETE]
//! ```

mod method_router;
mod node;
mod pattern;
mod router;

pub use method_router::{allow_header_value, MethodRouter};
pub use node::Node;
pub use pattern::{Pattern, Segment};
pub use router::{RouteInfo, RouteMatch, Router};
