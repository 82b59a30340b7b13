//! Built-in middleware stages.
//!
//! | Stage | Middleware | Purpose |
//! |-------|------------|---------|
//! | [`request_id`] | [`RequestId`] | Generate/propagate `x-request-id` (UUID v7) |
//! | [`tracing`](self::tracing) | [`RequestTracing`] | Span per request, completion log with latency |
//! | [`guard`] | [`Guard`] | Reject requests failing a predicate |
//!
//! A typical stack puts [`RequestId`] outermost so every later log line
//! carries the ID.

pub mod guard;
pub mod request_id;
pub mod tracing;

// Re-export main types
pub use self::guard::Guard;
pub use self::request_id::{RequestId, REQUEST_ID_HEADER};
pub use self::tracing::RequestTracing;
