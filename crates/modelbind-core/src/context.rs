//! Request context types.
//!
//! The [`HttpContext`] carries the ambient request data that formatters and
//! filters read: method, URI, headers, the body stream and per-request
//! features.

use crate::body::RequestBody;
use crate::features::Features;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use modelbind_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    ///
    /// UUID v7 incorporates a Unix timestamp, making IDs time-ordered
    /// and suitable for distributed systems.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    ///
    /// This is useful when parsing request IDs from headers or other sources.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RequestId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RequestId> for Uuid {
    fn from(id: RequestId) -> Self {
        id.0
    }
}

/// Ambient data for one inbound request.
///
/// Formatters see the request through an [`HttpContext`]: the declared
/// content type, the body stream and any features installed earlier in the
/// pipeline (for example by the form limits filter).
///
/// # Example
///
/// ```
/// use modelbind_core::HttpContext;
///
/// let ctx = HttpContext::builder()
///     .header("content-type", "application/json")
///     .body("{}")
///     .build();
/// assert_eq!(ctx.content_type(), Some("application/json"));
/// ```
#[derive(Debug)]
pub struct HttpContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: RequestBody,

    /// Per-request features such as the form feature.
    features: Features,
}

impl HttpContext {
    /// Creates a context from request parts and a body.
    #[must_use]
    pub fn from_parts(parts: http::request::Parts, body: RequestBody) -> Self {
        let mut ctx = Self {
            request_id: RequestId::new(),
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            features: Features::new(),
        };
        if let Some(id) = parts.extensions.get::<RequestId>() {
            ctx.request_id = *id;
        }
        ctx
    }

    /// Creates a context from an [`http::Request`].
    #[must_use]
    pub fn from_request(request: http::Request<RequestBody>) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body)
    }

    /// Returns a builder for assembling a context by hand.
    #[must_use]
    pub fn builder() -> HttpContextBuilder {
        HttpContextBuilder::new()
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the request headers mutably.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns the declared `Content-Type`, if present and valid text.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Returns the declared `Content-Length`, if present and numeric.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok())
    }

    /// Returns the request body.
    #[must_use]
    pub const fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Returns the per-request features.
    #[must_use]
    pub const fn features(&self) -> &Features {
        &self.features
    }

    /// Returns the per-request features mutably.
    pub fn features_mut(&mut self) -> &mut Features {
        &mut self.features
    }
}

impl Default for HttpContext {
    fn default() -> Self {
        HttpContextBuilder::new().build()
    }
}

/// Builder for [`HttpContext`].
///
/// Defaults to `GET /` with no headers and an empty body. Header values that
/// are not valid HTTP header text are skipped.
#[derive(Debug, Default)]
pub struct HttpContextBuilder {
    request_id: Option<RequestId>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl HttpContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request ID.
    #[must_use]
    pub fn request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request URI.
    #[must_use]
    pub fn uri(mut self, uri: Uri) -> Self {
        self.uri = uri;
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn content_type(self, content_type: &str) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets all headers at once.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets a buffered body.
    #[must_use]
    pub fn body(mut self, body: impl Into<bytes::Bytes>) -> Self {
        self.body = Some(RequestBody::from_bytes(body));
        self
    }

    /// Sets a prepared body, such as a streaming one.
    #[must_use]
    pub fn request_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> HttpContext {
        HttpContext {
            request_id: self.request_id.unwrap_or_default(),
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            body: self.body.unwrap_or_default(),
            features: Features::new(),
        }
    }
}
