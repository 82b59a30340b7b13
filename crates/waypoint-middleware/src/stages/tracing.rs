//! Request tracing middleware.
//!
//! Opens one `http_request` span per request and emits a structured log
//! line when the inner chain finishes.
//!
//! ## Span Fields
//!
//! - `method` - HTTP method
//! - `path` - Request path
//!
//! ## Completion Event Fields
//!
//! - `status` - Response status code
//! - `bytes` - Body bytes written
//! - `latency_ms` - Time spent in the inner chain

use std::time::Instant;

use tracing::Instrument;
use waypoint_core::{HandlerFuture, Request, ResponseWriter};

use crate::middleware::{Middleware, Next};

/// Middleware that wraps each request in a tracing span.
#[derive(Debug, Clone, Default)]
pub struct RequestTracing {
    /// Service name recorded on every span.
    service_name: Option<String>,
}

impl RequestTracing {
    /// Creates a new tracing middleware.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `service_name` on every request span.
    #[must_use]
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }
}

impl Middleware for RequestTracing {
    fn name(&self) -> &'static str {
        "request_tracing"
    }

    fn process<'a>(
        &'a self,
        writer: &'a mut dyn ResponseWriter,
        request: &'a Request,
        next: Next<'a>,
    ) -> HandlerFuture<'a> {
        let span = tracing::info_span!(
            "http_request",
            service = self.service_name.as_deref().unwrap_or("waypoint"),
            method = %request.method(),
            path = request.path(),
        );

        Box::pin(
            async move {
                let start = Instant::now();
                let result = next.run(&mut *writer, request).await;
                let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(()) => tracing::info!(
                        status = writer.status().as_u16(),
                        bytes = writer.bytes_written(),
                        latency_ms,
                        "request completed"
                    ),
                    Err(error) => tracing::warn!(
                        kind = %error.kind(),
                        error = %error,
                        latency_ms,
                        "request failed"
                    ),
                }
                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use waypoint_core::{sync_handler, BufferedWriter, Error, ErrorKind, Handler};

    #[test]
    fn test_middleware_name() {
        assert_eq!(RequestTracing::new().name(), "request_tracing");
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let handler = RequestTracing::new()
            .with_service_name("greeter")
            .wrap(sync_handler(|writer, _| {
                writer.set_status(StatusCode::CREATED);
                writer.write_str("made")?;
                Ok(())
            }));

        let mut writer = BufferedWriter::new();
        handler
            .handle(&mut writer, &Request::builder().uri("/things").build())
            .await
            .unwrap();
        assert_eq!(writer.status(), StatusCode::CREATED);
        assert_eq!(writer.body_text(), "made");
    }

    #[tokio::test]
    async fn test_propagates_errors() {
        let handler = RequestTracing::new().wrap(sync_handler(|_, _| Err(Error::request("nope"))));

        let mut writer = BufferedWriter::new();
        let err = handler
            .handle(&mut writer, &Request::builder().build())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Request);
    }
}
