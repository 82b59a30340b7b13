//! # Waypoint Middleware
//!
//! Handler composition for Waypoint.
//!
//! A [`Middleware`] wraps a handler and yields a handler, so cross-cutting
//! concerns (request IDs, tracing, access checks) are layered around
//! business handlers without the handlers knowing about them.
//!
//! ## Composition Order
//!
//! ```text
//! Stack [A, B] applied to H = A(B(H))
//!
//! request  → A → B → H
//! response ← A ← B ←┘
//! ```
//!
//! A middleware that does not call [`Next::run`] short-circuits: nothing
//! inside it runs, and outer layers still see its result exactly once.
//!
//! ## Example
//!
//! ```
//! use waypoint_core::{sync_handler, Request};
//! use waypoint_middleware::{Guard, RequestId, RequestTracing, Stack};
//!
//! let stack = Stack::new()
//!     .push(RequestId::new())
//!     .push(RequestTracing::new())
//!     .push(Guard::new(|request: &Request| request.header("authorization").is_some()));
//!
//! let handler = stack.apply(sync_handler(|writer, _request| {
//!     writer.write_str("secret")?;
//!     Ok(())
//! }));
//! # let _ = handler;
//! assert_eq!(stack.names(), vec!["request_id", "request_tracing", "guard"]);
//! ```

#![doc(html_root_url = "https://docs.rs/waypoint-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod middleware;
pub mod stack;
pub mod stages;

// Re-export main types at crate root
pub use middleware::{layer, BoxedMiddleware, FnMiddleware, Middleware, Next};
pub use stack::Stack;
pub use stages::{Guard, RequestId, RequestTracing, REQUEST_ID_HEADER};
