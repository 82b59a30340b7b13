//! Request guard middleware.
//!
//! A [`Guard`] admits a request only when its predicate accepts it.
//! Rejected requests never reach the inner handler; the guard answers with
//! a JSON error envelope and the configured status (`401` by default).

use http::StatusCode;
use waypoint_core::{ErrorEnvelope, HandlerFuture, Request, ResponseWriter};

use crate::middleware::{Middleware, Next};

/// Middleware that short-circuits requests rejected by a predicate.
///
/// # Example
///
/// ```
/// use waypoint_core::Request;
/// use waypoint_middleware::Guard;
///
/// let guard = Guard::new(|request: &Request| request.header("authorization").is_some());
/// # let _ = guard;
/// ```
pub struct Guard<P> {
    name: &'static str,
    predicate: P,
    status: StatusCode,
    code: String,
    message: String,
}

impl<P> Guard<P>
where
    P: Fn(&Request) -> bool + Send + Sync + 'static,
{
    /// Creates a guard that rejects with `401 Unauthorized`.
    pub fn new(predicate: P) -> Self {
        Self {
            name: "guard",
            predicate,
            status: StatusCode::UNAUTHORIZED,
            code: error_code(StatusCode::UNAUTHORIZED),
            message: "unauthorized".to_string(),
        }
    }

    /// Sets the rejection status. The envelope code follows the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self.code = error_code(status);
        self
    }

    /// Sets the rejection message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Sets the name used in logs and stack listings.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

/// `403 Forbidden` → `FORBIDDEN`.
fn error_code(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("REJECTED")
        .to_ascii_uppercase()
        .replace(' ', "_")
}

impl<P> Middleware for Guard<P>
where
    P: Fn(&Request) -> bool + Send + Sync + 'static,
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
        if (self.predicate)(request) {
            return next.run(writer, request);
        }

        tracing::debug!(
            guard = self.name,
            path = request.path(),
            status = self.status.as_u16(),
            "request rejected"
        );
        let envelope = ErrorEnvelope::new(self.code.as_str(), self.message.as_str());
        Box::pin(std::future::ready(envelope.write_to(writer, self.status)))
    }
}

impl<P> std::fmt::Debug for Guard<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("name", &self.name)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use waypoint_core::{sync_handler, BufferedWriter, Handler};

    fn counting_handler(calls: &Arc<AtomicUsize>) -> impl waypoint_core::Handler {
        let calls = Arc::clone(calls);
        sync_handler(move |writer, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            writer.write_str("inner")?;
            Ok(())
        })
    }

    fn has_token(request: &Request) -> bool {
        request.header("authorization") == Some("Bearer letmein")
    }

    #[tokio::test]
    async fn test_admits_accepted_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Guard::new(has_token).wrap(counting_handler(&calls));

        let request = Request::builder()
            .header("authorization", "Bearer letmein")
            .build();
        let mut writer = BufferedWriter::new();
        handler.handle(&mut writer, &request).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(writer.body_text(), "inner");
    }

    #[tokio::test]
    async fn test_rejects_with_401_by_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Guard::new(has_token).wrap(counting_handler(&calls));

        let mut writer = BufferedWriter::new();
        handler
            .handle(&mut writer, &Request::builder().build())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(writer.status(), StatusCode::UNAUTHORIZED);
        let envelope: ErrorEnvelope = serde_json::from_slice(writer.body()).unwrap();
        assert_eq!(envelope, ErrorEnvelope::new("UNAUTHORIZED", "unauthorized"));
    }

    #[tokio::test]
    async fn test_custom_status_and_message() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = Guard::new(|_: &Request| false)
            .with_status(StatusCode::FORBIDDEN)
            .with_message("admins only")
            .named("admin_guard")
            .wrap(counting_handler(&calls));

        let mut writer = BufferedWriter::new();
        handler
            .handle(&mut writer, &Request::builder().build())
            .await
            .unwrap();

        assert_eq!(writer.status(), StatusCode::FORBIDDEN);
        let envelope: ErrorEnvelope = serde_json::from_slice(writer.body()).unwrap();
        assert_eq!(envelope.error.code, "FORBIDDEN");
        assert_eq!(envelope.error.message, "admins only");
    }

    #[test]
    fn test_error_code_from_status() {
        assert_eq!(error_code(StatusCode::UNAUTHORIZED), "UNAUTHORIZED");
        assert_eq!(error_code(StatusCode::TOO_MANY_REQUESTS), "TOO_MANY_REQUESTS");
    }
}
