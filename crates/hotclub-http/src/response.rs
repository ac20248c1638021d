use bytes::Bytes;
use futures::stream::Stream;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use std::pin::Pin;

use crate::Error;

/// HTTP response representation produced by [`Handler`](crate::Handler)s.
///
/// Most responses carry a buffered `body`. A response converted from a
/// [`StreamingResponse`] instead carries a chunk stream; [`Response::into_body_stream`]
/// yields either form as a stream so transports and middleware handle both
/// uniformly.
pub struct Response {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
	stream: Option<StreamBody>,
}

impl std::fmt::Debug for Response {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Response")
			.field("status", &self.status)
			.field("headers", &self.headers)
			.field("body", &self.body)
			.field("streaming", &self.stream.is_some())
			.finish()
	}
}

/// Streaming HTTP response: a status, headers and a chunk stream that the
/// transport forwards as chunks arrive. Dropping the response drops the
/// stream, which is what terminates the producer on client disconnect.
pub struct StreamingResponse<S> {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub stream: S,
}

/// Boxed chunk stream used when the concrete stream type is erased.
pub type StreamBody = Pin<Box<dyn Stream<Item = crate::Result<Bytes>> + Send>>;

impl Response {
	/// Create a response with the given status and empty body.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Response;
	/// use http::StatusCode;
	///
	/// let response = Response::new(StatusCode::OK);
	/// assert_eq!(response.status, StatusCode::OK);
	/// assert!(response.body.is_empty());
	/// ```
	pub fn new(status: StatusCode) -> Self {
		Self {
			status,
			headers: HeaderMap::new(),
			body: Bytes::new(),
			stream: None,
		}
	}

	/// HTTP 200 OK.
	pub fn ok() -> Self {
		Self::new(StatusCode::OK)
	}

	/// HTTP 204 No Content.
	pub fn no_content() -> Self {
		Self::new(StatusCode::NO_CONTENT)
	}

	/// HTTP 500 Internal Server Error.
	pub fn internal_server_error() -> Self {
		Self::new(StatusCode::INTERNAL_SERVER_ERROR)
	}

	/// HTTP 200 with an HTML body and `Content-Type: text/html`.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Response;
	///
	/// let response = Response::html("<p>hi</p>");
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "text/html; charset=utf-8"
	/// );
	/// assert_eq!(response.body, bytes::Bytes::from("<p>hi</p>"));
	/// ```
	pub fn html(body: impl Into<Bytes>) -> Self {
		Self::ok().with_body(body).with_typed_header(
			http::header::CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		)
	}

	/// Set the response body.
	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Add a header by name and value. Invalid names or values are ignored.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Response;
	///
	/// let response = Response::ok().with_header("HX-Retarget", "#errors");
	/// assert_eq!(
	///     response.headers.get("hx-retarget").unwrap().to_str().unwrap(),
	///     "#errors"
	/// );
	/// ```
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			HeaderName::from_bytes(name.as_bytes()),
			HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Add a header using typed name and value.
	pub fn with_typed_header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Merge every entry of `headers` into this response, overwriting on
	/// collision. Used to carry handler-set headers (cookies and the like)
	/// onto a response the dispatcher built.
	pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
		for (name, value) in headers {
			self.headers.insert(name.clone(), value.clone());
		}
		self
	}

	/// Set a JSON body and the matching `Content-Type` header.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Response;
	/// use serde_json::json;
	///
	/// let response = Response::ok().with_json(&json!({"detail": "ok"})).unwrap();
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "application/json"
	/// );
	/// ```
	pub fn with_json<T: Serialize>(mut self, data: &T) -> crate::Result<Self> {
		let json = serde_json::to_vec(data).map_err(|e| Error::Serialization(e.to_string()))?;
		self.body = Bytes::from(json);
		self.headers.insert(
			http::header::CONTENT_TYPE,
			HeaderValue::from_static("application/json"),
		);
		Ok(self)
	}

	/// Whether this response carries a chunk stream rather than a buffered body.
	pub fn is_streaming(&self) -> bool {
		self.stream.is_some()
	}

	/// Consume the response body as a chunk stream.
	///
	/// A buffered body becomes a single-chunk stream, so callers can treat
	/// every response the same way when writing it out.
	pub fn into_body_stream(self) -> StreamBody {
		match self.stream {
			Some(stream) => stream,
			None => Box::pin(futures::stream::once(futures::future::ready(Ok(self.body)))),
		}
	}
}

/// The default JSON rendering of an error: `{"detail": ...}` with the
/// error's status. Validation errors expose their structured detail list.
/// The error mapper produces richer HTML responses where appropriate; this
/// conversion is the fallback every other path relies on.
impl From<Error> for Response {
	fn from(error: Error) -> Self {
		let status = error.status_code();
		let body = match &error {
			Error::Validation(details) => serde_json::json!({ "detail": details }),
			other => serde_json::json!({ "detail": other.to_string() }),
		};

		Response::new(status)
			.with_json(&body)
			.unwrap_or_else(|_| Response::internal_server_error())
	}
}

/// Box a typed streaming response into a [`Response`] so it can travel
/// through [`Handler`](crate::Handler)s and middleware unchanged.
impl<S> From<StreamingResponse<S>> for Response
where
	S: Stream<Item = crate::Result<Bytes>> + Send + 'static,
{
	fn from(streaming: StreamingResponse<S>) -> Self {
		Self {
			status: streaming.status,
			headers: streaming.headers,
			body: Bytes::new(),
			stream: Some(Box::pin(streaming.stream)),
		}
	}
}

impl<S> StreamingResponse<S>
where
	S: Stream<Item = crate::Result<Bytes>> + Send + 'static,
{
	/// Create a streaming response with OK status.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::StreamingResponse;
	/// use futures::stream;
	/// use bytes::Bytes;
	/// use http::StatusCode;
	///
	/// let chunks = vec![Ok(Bytes::from("a")), Ok(Bytes::from("b"))];
	/// let response = StreamingResponse::new(stream::iter(chunks));
	/// assert_eq!(response.status, StatusCode::OK);
	/// ```
	pub fn new(stream: S) -> Self {
		Self {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			stream,
		}
	}

	/// Set the status code.
	pub fn status(mut self, status: StatusCode) -> Self {
		self.status = status;
		self
	}

	/// Add a header.
	pub fn header(mut self, key: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(key, value);
		self
	}

	/// Set the `Content-Type` header.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::StreamingResponse;
	/// use futures::stream;
	/// use bytes::Bytes;
	///
	/// let chunks = vec![Ok(Bytes::from("data: x\n\n"))];
	/// let response = StreamingResponse::new(stream::iter(chunks))
	///     .media_type("text/event-stream");
	/// assert_eq!(
	///     response.headers.get("content-type").unwrap().to_str().unwrap(),
	///     "text/event-stream"
	/// );
	/// ```
	pub fn media_type(self, media_type: &str) -> Self {
		self.header(
			http::header::CONTENT_TYPE,
			HeaderValue::from_str(media_type)
				.unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
		)
	}
}

impl<S> StreamingResponse<S> {
	/// Consume the response and return the underlying stream.
	pub fn into_stream(self) -> S {
		self.stream
	}
}
