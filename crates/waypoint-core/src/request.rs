//! The request view handed to handlers.
//!
//! A [`Request`] is built by the transport from a decoded HTTP request and
//! is read-only from the handler's point of view. The router attaches the
//! path parameters it captured; form values are decoded once, at
//! construction, from the query string and from an
//! `application/x-www-form-urlencoded` body.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method, Uri};

/// Media type of URL-encoded form bodies.
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Named path parameters captured during routing.
///
/// Parameters keep the order in which they appear in the route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value of the named parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Drops parameters past `len`. Used when the router backtracks.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// A decoded request.
///
/// # Example
///
/// ```
/// use waypoint_core::Request;
/// use http::Method;
///
/// let request = Request::builder()
///     .method(Method::POST)
///     .uri("/greet?lang=en")
///     .form_body("name=Bob")
///     .build();
///
/// assert_eq!(request.path(), "/greet");
/// assert_eq!(request.form_value("name"), Some("Bob"));
/// assert_eq!(request.form_value("lang"), Some("en"));
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    form: Vec<(String, String)>,
    params: Params,
}

impl Request {
    /// Creates a request with an empty body.
    #[must_use]
    pub fn new(method: Method, uri: Uri) -> Self {
        Self::from_parts(method, uri, HeaderMap::new(), Bytes::new())
    }

    /// Creates a request builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Creates a request from its decoded parts.
    #[must_use]
    pub fn from_parts(method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Self {
        let form = decode_form(&uri, &headers, &body);
        Self {
            method,
            uri,
            headers,
            body,
            form,
            params: Params::new(),
        }
    }

    /// Returns the request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the first value of a form field.
    ///
    /// Body fields take precedence over query fields of the same name.
    #[must_use]
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns a path parameter captured by the router.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Returns every captured path parameter.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Returns a copy of this request carrying `params`.
    #[must_use]
    pub fn with_params(&self, params: Params) -> Self {
        Self {
            params,
            ..self.clone()
        }
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts.method, parts.uri, parts.headers, body)
    }
}

fn decode_form(uri: &Uri, headers: &HeaderMap, body: &Bytes) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = Vec::new();

    let is_form_body = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(FORM_URLENCODED));
    if is_form_body {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
            Ok(fields) => form.extend(fields),
            Err(e) => tracing::debug!(error = %e, "ignoring undecodable form body"),
        }
    }

    if let Some(query) = uri.query() {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(fields) => form.extend(fields),
            Err(e) => tracing::debug!(error = %e, "ignoring undecodable query string"),
        }
    }

    form
}

/// Builder for [`Request`].
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Method,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestBuilder {
    /// Sets the method. Defaults to `GET`.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the URI. Invalid URIs fall back to `/`.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        self.uri = uri.parse().ok();
        self
    }

    /// Adds a header. Invalid names or values are skipped.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets a raw body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a URL-encoded form body and its content type.
    #[must_use]
    pub fn form_body(self, encoded: &str) -> Self {
        self.header(CONTENT_TYPE.as_str(), FORM_URLENCODED)
            .body(encoded.to_string())
    }

    /// Builds the request.
    #[must_use]
    pub fn build(self) -> Request {
        let uri = self.uri.unwrap_or_else(|| Uri::from_static("/"));
        Request::from_parts(self.method, uri, self.headers, self.body)
    }
}
