//! JSON error envelope.
//!
//! Responses generated by Waypoint itself (recovery fallbacks, guard
//! rejections) share one body shape:
//!
//! ```json
//! {"error":{"code":"INTERNAL_ERROR","message":"internal server error"}}
//! ```

use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::writer::ResponseWriter;

/// Serializable error envelope for HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error details.
    pub error: ErrorDetail,
}

/// Error detail within an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    /// Sets `status` and a JSON content type, then writes the envelope.
    ///
    /// # Errors
    ///
    /// Returns a [`Write`](crate::ErrorKind::Write) error if the body could
    /// not be written.
    pub fn write_to(&self, writer: &mut dyn ResponseWriter, status: StatusCode) -> Result<(), Error> {
        let body = serde_json::to_vec(self)
            .map_err(|e| Error::wrap(e, "failed to encode error envelope", crate::ErrorKind::Write))?;
        writer.set_status(status);
        writer.insert_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        writer.write(&body)?;
        Ok(())
    }
}
