//! Response writers.
//!
//! A [`ResponseWriter`] is the capability a handler uses to produce its
//! response: it accepts body bytes (append-only, possibly in several
//! writes), a status code and headers. The transport that owns the writer
//! decides what happens to the bytes; Waypoint only ships the in-memory
//! [`BufferedWriter`].

use bytes::{Bytes, BytesMut};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use http_body_util::Full;

use crate::error::Error;

/// Sink for one request's response.
///
/// Exactly one writer exists per request and it is never retained past the
/// dispatch that received it.
pub trait ResponseWriter: Send {
    /// Returns the status that will be sent. Defaults to `200 OK`.
    fn status(&self) -> StatusCode;

    /// Sets the response status.
    fn set_status(&mut self, status: StatusCode);

    /// Inserts a response header, replacing any previous value.
    fn insert_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Appends `bytes` to the body and returns how many were accepted.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`Write`](crate::ErrorKind::Write) when the
    /// sink can no longer accept data (client gone, size limit exceeded).
    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error>;

    /// Returns the number of body bytes accepted so far.
    fn bytes_written(&self) -> usize;

    /// Drops the body written so far and resets the status, if the sink
    /// still can.
    ///
    /// Headers are kept, so values set by outer middleware (such as a
    /// request ID) survive into the fallback response. Returns `false` when
    /// the response is already committed. Used by the recovery boundary
    /// before it writes a fallback response.
    fn discard(&mut self) -> bool {
        false
    }
}

impl dyn ResponseWriter + '_ {
    /// Writes a UTF-8 string to the body.
    pub fn write_str(&mut self, s: &str) -> Result<usize, Error> {
        self.write(s.as_bytes())
    }
}

/// A [`ResponseWriter`] that buffers the whole response in memory.
///
/// # Example
///
/// ```
/// use waypoint_core::{BufferedWriter, ResponseWriter};
/// use http::StatusCode;
///
/// let mut writer = BufferedWriter::new();
/// writer.write(b"Hello, ").unwrap();
/// writer.write(b"Bob!").unwrap();
///
/// assert_eq!(writer.status(), StatusCode::OK);
/// assert_eq!(writer.body(), b"Hello, Bob!");
/// ```
#[derive(Debug, Default)]
pub struct BufferedWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    limit: Option<usize>,
    closed: bool,
}

impl BufferedWriter {
    /// Creates an empty writer without a size limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer that rejects bodies larger than `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Marks the peer as gone; every later write fails.
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns `true` once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the response headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body written so far.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Converts the buffered data into an `http` response.
    #[must_use]
    pub fn into_response(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseWriter for BufferedWriter {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        if self.closed {
            return Err(Error::write("response writer is closed"));
        }
        if let Some(limit) = self.limit {
            if self.body.len() + bytes.len() > limit {
                return Err(Error::write(format!(
                    "response body exceeds limit of {limit} bytes"
                )));
            }
        }
        self.body.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn bytes_written(&self) -> usize {
        self.body.len()
    }

    fn discard(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.body.clear();
        self.status = StatusCode::OK;
        true
    }
}
