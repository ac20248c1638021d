use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Uri, Version};

use crate::{Error, Result};

/// HTTP request representation handed to [`Handler`](crate::Handler)s.
///
/// Deliberately minimal: method, target, headers and a fully buffered body.
/// Transport adapters construct one per incoming request.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: Method,
	pub uri: Uri,
	pub version: Version,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl Request {
	/// Create a request from its parts.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Request;
	/// use http::{HeaderMap, Method, Uri, Version};
	/// use bytes::Bytes;
	///
	/// let request = Request::new(
	///     Method::GET,
	///     Uri::from_static("/tasks"),
	///     Version::HTTP_11,
	///     HeaderMap::new(),
	///     Bytes::new(),
	/// );
	/// assert_eq!(request.path(), "/tasks");
	/// ```
	pub fn new(
		method: Method,
		uri: Uri,
		version: Version,
		headers: HeaderMap,
		body: Bytes,
	) -> Self {
		Self {
			method,
			uri,
			version,
			headers,
			body,
		}
	}

	/// Start building a request. Defaults: `GET /` over HTTP/1.1 with no
	/// headers and an empty body.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Request;
	/// use http::Method;
	///
	/// let request = Request::builder()
	///     .method(Method::POST)
	///     .uri("/tasks")
	///     .header("Accept", "text/html")
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.header("accept"), Some("text/html"));
	/// ```
	pub fn builder() -> RequestBuilder {
		RequestBuilder::new()
	}

	/// The path portion of the request target.
	pub fn path(&self) -> &str {
		self.uri.path()
	}

	/// The raw query string, if any.
	pub fn query(&self) -> Option<&str> {
		self.uri.query()
	}

	/// Look up a header value as a string. Non-UTF-8 values read as absent.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}

	/// The `Content-Type` header, if present.
	pub fn content_type(&self) -> Option<&str> {
		self.header(http::header::CONTENT_TYPE.as_str())
	}
}

/// Builder for [`Request`], mainly used by tests and transport adapters.
pub struct RequestBuilder {
	method: Method,
	uri: String,
	version: Version,
	headers: HeaderMap,
	body: Bytes,
}

impl RequestBuilder {
	fn new() -> Self {
		Self {
			method: Method::GET,
			uri: "/".to_string(),
			version: Version::HTTP_11,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn method(mut self, method: Method) -> Self {
		self.method = method;
		self
	}

	pub fn uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = uri.into();
		self
	}

	pub fn version(mut self, version: Version) -> Self {
		self.version = version;
		self
	}

	/// Replace the full header map.
	pub fn headers(mut self, headers: HeaderMap) -> Self {
		self.headers = headers;
		self
	}

	/// Append one header. Invalid names or values are ignored.
	pub fn header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	pub fn body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Build the request, parsing the accumulated URI.
	pub fn build(self) -> Result<Request> {
		let uri: Uri = self
			.uri
			.parse()
			.map_err(|e| Error::Internal(format!("invalid request uri '{}': {e}", self.uri)))?;

		Ok(Request::new(
			self.method,
			uri,
			self.version,
			self.headers,
			self.body,
		))
	}
}
