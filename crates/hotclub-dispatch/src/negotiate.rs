//! Request classification.
//!
//! Every request is classified exactly once, before the handler runs, into
//! the representation it should receive: HTML for hypermedia clients (htmx
//! fragments, full pages, variant-tagged fragments) or JSON for API
//! clients. The outcome drives both the success path in
//! [`ComponentView`](crate::ComponentView) and the error path in
//! [`ErrorMapper`](crate::ErrorMapper), so both always agree on the
//! representation a client gets.

use hotclub_http::Request;

/// Header naming the template variant the client wants, e.g. `row` to get
/// `Task.row.html` instead of `Task.html`. Its presence alone forces HTML.
pub const VARIANT_HEADER: &str = "hc-variant";

/// Header htmx sets on every request it issues. Its presence marks the
/// request as a fragment exchange, which is always HTML.
pub const FRAGMENT_HEADER: &str = "hx-request";

/// The representation a response body should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
	/// Rendered markup: a fragment for htmx swaps or a full document.
	Html,
	/// Plain serialized data for API clients.
	Json,
}

/// The outcome of classifying one request.
///
/// Built once per request via [`Negotiation::classify`] and threaded through
/// dispatch, so the variant header is read in a single place.
#[derive(Debug, Clone)]
pub struct Negotiation {
	mode: RenderMode,
	variant: Option<String>,
	event_stream: bool,
}

impl Negotiation {
	/// Classify `request` into the representation it should receive.
	///
	/// Checks run in a fixed order and the first match wins:
	///
	/// 1. a non-empty variant header forces HTML;
	/// 2. a fragment header (any value but `false`) forces HTML;
	/// 3. a request `Content-Type` of `application/json` forces JSON, even
	///    when the `Accept` header also lists `text/html`;
	/// 4. an `Accept` header with any comma-separated part starting with
	///    `text/html` selects HTML;
	/// 5. anything else, including no `Accept` header at all, gets JSON.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_dispatch::{Negotiation, RenderMode};
	/// use hotclub_http::Request;
	///
	/// let request = Request::builder()
	///     .header("hx-request", "true")
	///     .header("hc-variant", "row")
	///     .build()
	///     .unwrap();
	/// let negotiation = Negotiation::classify(&request);
	///
	/// assert_eq!(negotiation.mode(), RenderMode::Html);
	/// assert_eq!(negotiation.variant(), Some("row"));
	/// ```
	pub fn classify(request: &Request) -> Self {
		let variant = request
			.header(VARIANT_HEADER)
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.map(str::to_string);
		let event_stream = accept_includes(request, "text/event-stream");

		let mode = if variant.is_some() || is_fragment_request(request) {
			RenderMode::Html
		} else if request
			.content_type()
			.is_some_and(|value| value.starts_with("application/json"))
		{
			RenderMode::Json
		} else if accept_includes(request, "text/html") {
			RenderMode::Html
		} else {
			RenderMode::Json
		};

		tracing::debug!(
			?mode,
			variant = variant.as_deref(),
			event_stream,
			"classified request representation"
		);
		Self {
			mode,
			variant,
			event_stream,
		}
	}

	pub fn mode(&self) -> RenderMode {
		self.mode
	}

	pub fn is_html(&self) -> bool {
		self.mode == RenderMode::Html
	}

	/// The requested template variant, already trimmed and non-empty.
	pub fn variant(&self) -> Option<&str> {
		self.variant.as_deref()
	}

	/// Whether the client asked for `text/event-stream`.
	pub fn accepts_event_stream(&self) -> bool {
		self.event_stream
	}

	/// Whether errors should be rendered as HTML for this client.
	///
	/// Wider than [`Negotiation::is_html`]: an SSE subscriber is a browser
	/// construct, so its errors render as markup too even though the
	/// `Accept` header never mentions `text/html`.
	pub fn wants_html_errors(&self) -> bool {
		self.is_html() || self.event_stream
	}
}

fn is_fragment_request(request: &Request) -> bool {
	request
		.header(FRAGMENT_HEADER)
		.is_some_and(|value| !value.trim().eq_ignore_ascii_case("false"))
}

fn accept_includes(request: &Request, media_type: &str) -> bool {
	request
		.header(http::header::ACCEPT.as_str())
		.is_some_and(|accept| {
			accept
				.split(',')
				.any(|part| part.trim().starts_with(media_type))
		})
}
