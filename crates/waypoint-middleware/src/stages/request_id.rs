//! Request ID middleware.
//!
//! This middleware assigns a unique request ID to each incoming request.
//! The ID is used for log correlation and support ticket references.
//!
//! ## Request ID Sources
//!
//! 1. **X-Request-ID header**: used when trusted and a valid UUID
//! 2. **Generated UUID v7**: otherwise
//!
//! UUID v7 is time-ordered, so IDs sort by arrival.
//!
//! ## Response Header
//!
//! The middleware always sets the `X-Request-ID` header on the response
//! before the inner handler runs, and records the ID on a tracing span that
//! covers the rest of the chain.

use http::header::{HeaderName, HeaderValue};
use tracing::Instrument;
use uuid::Uuid;
use waypoint_core::{HandlerFuture, Request, ResponseWriter};

use crate::middleware::{Middleware, Next};

/// The header name for request ID propagation.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Middleware that generates or propagates request IDs.
#[derive(Debug, Clone, Default)]
pub struct RequestId {
    /// Whether to trust incoming request ID headers.
    ///
    /// Typically `false` for external traffic and `true` for internal
    /// service-to-service calls.
    trust_incoming: bool,
}

impl RequestId {
    /// Creates a middleware that always generates fresh IDs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a middleware that reuses valid incoming `X-Request-ID` headers.
    #[must_use]
    pub fn trust_incoming() -> Self {
        Self {
            trust_incoming: true,
        }
    }

    /// Extracts the request ID from headers if trusted and valid.
    fn extract_request_id(&self, request: &Request) -> Option<Uuid> {
        if !self.trust_incoming {
            return None;
        }

        request
            .header(REQUEST_ID_HEADER)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

impl Middleware for RequestId {
    fn name(&self) -> &'static str {
        "request_id"
    }

    fn process<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
        next: Next<'a>,
    ) -> HandlerFuture<'a> {
        let request_id = self
            .extract_request_id(request)
            .unwrap_or_else(Uuid::now_v7);

        let rendered = request_id.to_string();
        if let Ok(value) = HeaderValue::from_str(&rendered) {
            writer.insert_header(HeaderName::from_static(REQUEST_ID_HEADER), value);
        }

        let span = tracing::info_span!("request_id", request_id = %rendered);
        Box::pin(next.run(writer, request).instrument(span))
    }
}
