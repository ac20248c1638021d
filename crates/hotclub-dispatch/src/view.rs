//! Content-negotiating view dispatch.
//!
//! [`ComponentView`] wraps an async handler that returns a [`ViewResult`]
//! and turns it into an HTTP response in whichever representation the
//! request negotiated: components render to markup for hypermedia clients
//! and serialize to JSON for API clients, from the same handler return
//! value.
//!
//! The handler's result shape is a closed union ([`ViewValue`]) and each
//! shape has exactly one rendering per representation. Anything outside the
//! union is unrepresentable, so dispatch is a total match rather than a
//! chain of downcasts.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{Stream, StreamExt};
use http::{HeaderMap, StatusCode};
use serde::Serialize;
use serde_json::Value;

use hotclub_components::{
	Component, Content, Div, Environment, RenderOptions, SafeString, render,
};
use hotclub_http::{
	Error, Handler, Request, Response, Result, StreamBody, StreamingResponse,
};

use crate::negotiate::{Negotiation, RenderMode};
use crate::sse::{EVENT_STREAM_MEDIA_TYPE, EventStream};

/// Boxed stream of view values produced by a streaming handler.
pub type ViewStream = Pin<Box<dyn Stream<Item = Result<ViewValue>> + Send>>;

/// Combines rendered fragments into one enclosing component.
///
/// The default wrapper is [`Div`]; anything that can absorb a list of
/// [`Content`] items works, including closures that pre-configure classes
/// or attributes on the container.
pub type Wrapper = Arc<dyn Fn(Vec<Content>) -> Box<dyn Component> + Send + Sync>;

/// Every shape a view handler may return.
///
/// Dispatch maps each shape to one rendering per representation mode; the
/// pairings are documented on [`ComponentView`].
pub enum ViewValue {
	/// Nothing to say: `204 No Content` as JSON, an empty fragment as HTML.
	Empty,
	/// A self-rendering component.
	Component(Box<dyn Component>),
	/// A plain data record. Serializes as-is; HTML needs a fixed template
	/// configured via [`ViewOptions::with_template`].
	Record(Value),
	/// Pre-rendered HTML, used verbatim. The caller vouches for safety.
	Fragment(String),
	/// Many records to wrap: each item renders, then a wrapper combines
	/// the fragments into one enclosing element.
	Sequence(Vec<ViewValue>),
	/// A stream of items, one response chunk each. Requires
	/// [`ViewOptions::streaming`].
	Stream(ViewStream),
	/// A fully built response that must pass through dispatch untouched.
	Raw(Response),
}

impl ViewValue {
	/// Wrap a component.
	pub fn component(component: impl Component + 'static) -> Self {
		Self::Component(Box::new(component))
	}

	/// Serialize any record type into the [`ViewValue::Record`] shape.
	pub fn record<T: Serialize>(record: &T) -> Result<Self> {
		let value =
			serde_json::to_value(record).map_err(|e| Error::Serialization(e.to_string()))?;
		Ok(Self::Record(value))
	}

	/// Wrap a sequence of components.
	pub fn components<I, C>(components: I) -> Self
	where
		I: IntoIterator<Item = C>,
		C: Component + 'static,
	{
		Self::Sequence(
			components
				.into_iter()
				.map(ViewValue::component)
				.collect(),
		)
	}

	/// Wrap a stream of values.
	pub fn stream<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<ViewValue>> + Send + 'static,
	{
		Self::Stream(Box::pin(stream))
	}

	fn kind(&self) -> &'static str {
		match self {
			Self::Empty => "empty",
			Self::Component(_) => "component",
			Self::Record(_) => "record",
			Self::Fragment(_) => "fragment",
			Self::Sequence(_) => "sequence",
			Self::Stream(_) => "stream",
			Self::Raw(_) => "response",
		}
	}

	fn into_json(self) -> Result<Value> {
		match self {
			Self::Empty => Ok(Value::Null),
			Self::Component(component) => component.to_json(),
			Self::Record(value) => Ok(value),
			Self::Fragment(html) => Ok(Value::String(html)),
			Self::Sequence(items) => items
				.into_iter()
				.map(ViewValue::into_json)
				.collect::<Result<Vec<_>>>()
				.map(Value::Array),
			other => Err(Error::NotRenderable(format!(
				"a handler result of kind '{}' has no JSON serialization",
				other.kind()
			))),
		}
	}
}

impl std::fmt::Debug for ViewValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_tuple("ViewValue").field(&self.kind()).finish()
	}
}

impl From<&str> for ViewValue {
	fn from(html: &str) -> Self {
		Self::Fragment(html.to_string())
	}
}

impl From<String> for ViewValue {
	fn from(html: String) -> Self {
		Self::Fragment(html)
	}
}

impl From<Response> for ViewValue {
	fn from(response: Response) -> Self {
		Self::Raw(response)
	}
}

/// What a view handler hands back to dispatch: a value plus optional
/// response decorations.
///
/// Headers are merged onto whatever response dispatch builds, so handlers
/// can set cookies or htmx headers while still returning typed values. A
/// status override replaces the default the chosen shape would get.
///
/// # Examples
///
/// ```
/// use hotclub_dispatch::ViewResult;
/// use http::StatusCode;
///
/// let result = ViewResult::fragment("<li>ready</li>")
///     .with_status(StatusCode::CREATED)
///     .with_header("HX-Trigger", "task-created");
/// ```
pub struct ViewResult {
	value: ViewValue,
	headers: HeaderMap,
	status: Option<StatusCode>,
}

impl ViewResult {
	pub fn new(value: ViewValue) -> Self {
		Self {
			value,
			headers: HeaderMap::new(),
			status: None,
		}
	}

	/// A single component.
	pub fn component(component: impl Component + 'static) -> Self {
		Self::new(ViewValue::component(component))
	}

	/// A serialized record.
	pub fn record<T: Serialize>(record: &T) -> Result<Self> {
		Ok(Self::new(ViewValue::record(record)?))
	}

	/// Pre-rendered HTML used verbatim.
	pub fn fragment(html: impl Into<String>) -> Self {
		Self::new(ViewValue::Fragment(html.into()))
	}

	/// No content.
	pub fn empty() -> Self {
		Self::new(ViewValue::Empty)
	}

	/// A stream of values; the view must enable streaming.
	pub fn stream<S>(stream: S) -> Self
	where
		S: Stream<Item = Result<ViewValue>> + Send + 'static,
	{
		Self::new(ViewValue::stream(stream))
	}

	/// A pre-built response that dispatch passes through untouched.
	pub fn raw(response: Response) -> Self {
		Self::new(ViewValue::Raw(response))
	}

	/// Merge a header onto the final response. Invalid names or values are
	/// ignored, matching [`Response::with_header`].
	pub fn with_header(mut self, name: &str, value: &str) -> Self {
		if let (Ok(name), Ok(value)) = (
			http::header::HeaderName::from_bytes(name.as_bytes()),
			http::header::HeaderValue::from_str(value),
		) {
			self.headers.insert(name, value);
		}
		self
	}

	/// Override the status the rendered shape would default to.
	pub fn with_status(mut self, status: StatusCode) -> Self {
		self.status = Some(status);
		self
	}
}

impl From<Response> for ViewResult {
	fn from(response: Response) -> Self {
		Self::new(ViewValue::Raw(response))
	}
}

/// A template name bound to the environment that can render it, for views
/// whose handlers return plain records instead of components.
#[derive(Clone)]
pub struct FixedTemplate {
	name: String,
	environment: Arc<Environment>,
}

impl FixedTemplate {
	pub fn new(name: impl Into<String>, environment: Arc<Environment>) -> Self {
		Self {
			name: name.into(),
			environment,
		}
	}

	/// Render a record's fields through the fixed template. String values
	/// are escaped on the way in.
	fn render_record(&self, record: &Value) -> Result<String> {
		let Value::Object(fields) = record else {
			return Err(Error::NotRenderable(
				"a record for a fixed template must be a JSON object".into(),
			));
		};
		let mut context = hotclub_components::RenderContext::new();
		for (key, value) in fields {
			context.insert(key.clone(), value)?;
		}
		self.environment.render(&self.name, &context.to_tera()?)
	}

	/// Render a component's declared fields through the fixed template,
	/// bypassing its own lineage. No render-pipeline extras (classes,
	/// attributes, ambient context) are added.
	fn render_component(&self, component: &dyn Component) -> Result<String> {
		let context = component.context()?;
		self.environment.render(&self.name, &context.to_tera()?)
	}
}

impl std::fmt::Debug for FixedTemplate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FixedTemplate")
			.field("name", &self.name)
			.finish()
	}
}

/// Per-view dispatch configuration.
///
/// # Examples
///
/// ```
/// use hotclub_dispatch::ViewOptions;
///
/// let options = ViewOptions::new().html_only().with_retry_ms(2000);
/// ```
#[derive(Clone, Default)]
pub struct ViewOptions {
	html_only: bool,
	streaming: bool,
	template: Option<FixedTemplate>,
	wrapper: Option<Wrapper>,
	event: Option<String>,
	retry_ms: Option<u64>,
}

impl ViewOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Reject JSON-classified requests with `406 Not Acceptable` before
	/// the handler runs, so side effects never happen for a client that
	/// cannot consume the rendered shape.
	pub fn html_only(mut self) -> Self {
		self.html_only = true;
		self
	}

	/// Allow the handler to return [`ViewValue::Stream`]: server-sent
	/// events for HTML clients, JSON lines for API clients.
	pub fn streaming(mut self) -> Self {
		self.streaming = true;
		self
	}

	/// Render record results through one fixed template instead of
	/// per-component lineage resolution.
	pub fn with_template(mut self, name: impl Into<String>, environment: Arc<Environment>) -> Self {
		self.template = Some(FixedTemplate::new(name, environment));
		self
	}

	/// Combine sequence results with this wrapper instead of a bare
	/// [`Div`].
	pub fn with_wrapper<F>(mut self, wrapper: F) -> Self
	where
		F: Fn(Vec<Content>) -> Box<dyn Component> + Send + Sync + 'static,
	{
		self.wrapper = Some(Arc::new(wrapper));
		self
	}

	/// Event name stamped on every server-sent event frame.
	pub fn with_event(mut self, event: impl Into<String>) -> Self {
		self.event = Some(event.into());
		self
	}

	/// Reconnection delay stamped on every server-sent event frame.
	pub fn with_retry_ms(mut self, retry_ms: u64) -> Self {
		self.retry_ms = Some(retry_ms);
		self
	}
}

impl std::fmt::Debug for ViewOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ViewOptions")
			.field("html_only", &self.html_only)
			.field("streaming", &self.streaming)
			.field("template", &self.template)
			.field("wrapper", &self.wrapper.is_some())
			.field("event", &self.event)
			.field("retry_ms", &self.retry_ms)
			.finish()
	}
}

/// An async view handler with content negotiation.
///
/// Classification happens once, before the handler runs. The handler's
/// [`ViewValue`] then maps to a response by shape and mode:
///
/// | shape      | HTML                                   | JSON               |
/// |------------|----------------------------------------|--------------------|
/// | `Empty`    | empty fragment                         | `204 No Content`   |
/// | `Component`| lineage render (negotiated variant)    | `to_json`          |
/// | `Record`   | fixed template (else not renderable)   | as-is              |
/// | `Fragment` | verbatim                               | JSON string        |
/// | `Sequence` | render each, wrap                      | JSON array         |
/// | `Stream`   | server-sent events                     | JSON lines         |
/// | `Raw`      | passthrough                            | passthrough        |
///
/// # Examples
///
/// ```no_run
/// use hotclub_components::{Div, Content};
/// use hotclub_dispatch::{ComponentView, ViewResult};
///
/// let view = ComponentView::new(|_request: hotclub_http::Request| async {
///     Ok::<_, hotclub_http::Error>(ViewResult::component(Div::new(vec![Content::from("hello")])))
/// });
/// ```
pub struct ComponentView<F> {
	handler: F,
	options: ViewOptions,
}

impl<F> ComponentView<F> {
	pub fn new(handler: F) -> Self {
		Self {
			handler,
			options: ViewOptions::default(),
		}
	}

	pub fn with_options(mut self, options: ViewOptions) -> Self {
		self.options = options;
		self
	}
}

/// Handler shape produced by [`ComponentView::blocking`].
pub type BlockingHandler =
	Box<dyn Fn(Request) -> BoxFuture<'static, Result<ViewResult>> + Send + Sync>;

impl ComponentView<BlockingHandler> {
	/// Wrap a synchronous handler, running it on the blocking thread pool
	/// so it never stalls the async runtime.
	pub fn blocking<H>(handler: H) -> Self
	where
		H: Fn(Request) -> Result<ViewResult> + Send + Sync + Clone + 'static,
	{
		ComponentView::new(Box::new(move |request: Request| {
			let handler = handler.clone();
			async move {
				tokio::task::spawn_blocking(move || handler(request))
					.await
					.map_err(|err| Error::Internal(format!("blocking handler panicked: {err}")))?
			}
			.boxed()
		}) as BlockingHandler)
	}
}

#[async_trait]
impl<F, Fut> Handler for ComponentView<F>
where
	F: Fn(Request) -> Fut + Send + Sync,
	Fut: Future<Output = Result<ViewResult>> + Send,
{
	async fn handle(&self, request: Request) -> Result<Response> {
		let negotiation = Negotiation::classify(&request);

		if self.options.html_only && !negotiation.is_html() {
			return Err(Error::http(
				StatusCode::NOT_ACCEPTABLE,
				"This route can only provide HTML responses. Please set Accept headers.",
			));
		}

		let result = (self.handler)(request).await?;
		respond(result, &negotiation, &self.options)
	}
}

fn respond(result: ViewResult, negotiation: &Negotiation, options: &ViewOptions) -> Result<Response> {
	let ViewResult {
		value,
		headers,
		status,
	} = result;

	// Escape hatch: a handler-built response passes through untouched,
	// in either mode.
	if let ViewValue::Raw(response) = value {
		return Ok(response);
	}

	match negotiation.mode() {
		RenderMode::Json => respond_json(value, &headers, status, options),
		RenderMode::Html => respond_html(value, &headers, status, negotiation, options),
	}
}

fn respond_json(
	value: ViewValue,
	headers: &HeaderMap,
	status: Option<StatusCode>,
	options: &ViewOptions,
) -> Result<Response> {
	let response = match value {
		ViewValue::Empty => Response::no_content(),
		ViewValue::Stream(stream) if options.streaming => json_lines_response(stream),
		ViewValue::Stream(_) => return Err(stream_without_streaming()),
		other => Response::ok().with_json(&other.into_json()?)?,
	};
	Ok(finalize(response, headers, status))
}

fn respond_html(
	value: ViewValue,
	headers: &HeaderMap,
	status: Option<StatusCode>,
	negotiation: &Negotiation,
	options: &ViewOptions,
) -> Result<Response> {
	let response = match value {
		ViewValue::Empty => Response::html(""),
		ViewValue::Stream(stream) if options.streaming => {
			event_stream_response(stream, negotiation, options)
		}
		ViewValue::Stream(_) => return Err(stream_without_streaming()),
		ViewValue::Sequence(items) => {
			let contents = items
				.into_iter()
				.map(|item| sequence_content(item, negotiation, options))
				.collect::<Result<Vec<_>>>()?;
			let wrapped = wrap(contents, options);
			Response::html(render(wrapped.as_ref(), &RenderOptions::default())?.into_inner())
		}
		single => Response::html(single_markup(single, negotiation, options)?),
	};
	Ok(finalize(response, headers, status))
}

fn single_markup(
	value: ViewValue,
	negotiation: &Negotiation,
	options: &ViewOptions,
) -> Result<String> {
	match value {
		ViewValue::Component(component) => component_markup(
			component.as_ref(),
			negotiation.variant(),
			options.template.as_ref(),
		),
		ViewValue::Fragment(html) => Ok(html),
		ViewValue::Record(record) => match &options.template {
			Some(template) => template.render_record(&record),
			None => Err(not_renderable("record")),
		},
		other => Err(not_renderable(other.kind())),
	}
}

/// One item of a sequence, rendered to a fragment the wrapper splices in
/// verbatim.
fn sequence_content(
	value: ViewValue,
	negotiation: &Negotiation,
	options: &ViewOptions,
) -> Result<Content> {
	let markup = match value {
		ViewValue::Component(component) => component_markup(
			component.as_ref(),
			negotiation.variant(),
			options.template.as_ref(),
		)?,
		ViewValue::Fragment(html) => html,
		ViewValue::Record(record) => match &options.template {
			Some(template) => template.render_record(&record)?,
			None => return Err(not_renderable("record")),
		},
		other => return Err(not_renderable(other.kind())),
	};
	Ok(Content::Safe(SafeString::new(markup)))
}

fn component_markup(
	component: &dyn Component,
	variant: Option<&str>,
	template: Option<&FixedTemplate>,
) -> Result<String> {
	// A fixed template bypasses lineage resolution, variants included.
	if let Some(template) = template {
		return template.render_component(component);
	}
	let options = RenderOptions::new().variant_opt(variant.map(str::to_string));
	Ok(render(component, &options)?.into_inner())
}

fn wrap(contents: Vec<Content>, options: &ViewOptions) -> Box<dyn Component> {
	match &options.wrapper {
		Some(wrapper) => wrapper(contents),
		None => Box::new(Div::new(contents)),
	}
}

fn event_stream_response(
	stream: ViewStream,
	negotiation: &Negotiation,
	options: &ViewOptions,
) -> Response {
	let variant = negotiation.variant().map(str::to_string);
	let template = options.template.clone();
	let rendered = stream.map(move |item| {
		item.and_then(|value| stream_item_markup(value, variant.as_deref(), template.as_ref()))
	});

	let mut events = EventStream::new(rendered);
	if let Some(event) = &options.event {
		events = events.with_event(event.clone());
	}
	if let Some(retry) = options.retry_ms {
		events = events.with_retry_ms(retry);
	}

	StreamingResponse::new(events.into_body())
		.media_type(EVENT_STREAM_MEDIA_TYPE)
		.into()
}

fn stream_item_markup(
	value: ViewValue,
	variant: Option<&str>,
	template: Option<&FixedTemplate>,
) -> Result<String> {
	match value {
		ViewValue::Component(component) => {
			component_markup(component.as_ref(), variant, template)
		}
		ViewValue::Fragment(html) => Ok(html),
		ViewValue::Record(record) => match template {
			Some(template) => template.render_record(&record),
			None => Err(not_renderable("record")),
		},
		other => Err(not_renderable(other.kind())),
	}
}

fn json_lines_response(stream: ViewStream) -> Response {
	let lines = stream.map(|item| {
		item.and_then(|value| value.into_json()).and_then(|json| {
			serde_json::to_string(&json)
				.map(|mut line| {
					line.push('\n');
					Bytes::from(line)
				})
				.map_err(|e| Error::Serialization(e.to_string()))
		})
	});
	StreamingResponse::new(Box::pin(lines) as StreamBody)
		.media_type("application/jsonl")
		.into()
}

fn finalize(mut response: Response, headers: &HeaderMap, status: Option<StatusCode>) -> Response {
	if let Some(status) = status {
		response.status = status;
	}
	response.with_headers(headers)
}

fn stream_without_streaming() -> Error {
	Error::NotRenderable(
		"handler returned a stream but the view is not configured for streaming".into(),
	)
}

fn not_renderable(kind: &str) -> Error {
	Error::NotRenderable(format!(
		"a handler result of kind '{kind}' cannot be rendered as HTML; \
		 return a component, a sequence of components, or a pre-rendered fragment"
	))
}
