//! Error-to-response mapping.
//!
//! [`ErrorMapper`] sits at the outer edge of a handler chain and turns
//! every [`Error`] a handler surfaces into a response the client can
//! consume. API clients always get the structured JSON shape. Hypermedia
//! clients get a rendered error fragment instead, but only for client
//! errors: a 4xx is something the user can see and fix, a 5xx is an
//! operational condition that keeps its JSON shape regardless of the
//! `Accept` header.
//!
//! Error templates resolve by lookup key, optionally variant-qualified,
//! first in an application-registered environment and then in the built-in
//! one, so applications can restyle the defaults without forking them.

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use hotclub_components::{Environment, RenderContext};
use hotclub_http::{Error, Handler, Middleware, Request, Response, Result};

use crate::negotiate::Negotiation;

/// Swap target for validation fragments when the error carries no
/// directive of its own. The built-in `ValidationError.html` renders a
/// container with this class, so repeated failures replace the previous
/// fragment instead of stacking.
pub const ERROR_CONTAINER_SELECTOR: &str = "closest .hotclub-error-container";

static BUILTIN_ERROR_ENV: Lazy<Arc<Environment>> = Lazy::new(|| {
	Arc::new(
		Environment::from_templates(&[
			("HttpError.html", include_str!("../templates/HttpError.html")),
			(
				"ValidationError.html",
				include_str!("../templates/ValidationError.html"),
			),
		])
		.expect("built-in error templates are valid"),
	)
});

static ERROR_ENV: Lazy<RwLock<Option<Arc<Environment>>>> = Lazy::new(|| RwLock::new(None));

/// Register an environment consulted before the built-in error templates.
///
/// Lets an application restyle `HttpError.html` and `ValidationError.html`
/// or provide templates for custom lookup keys set via
/// [`HttpError::with_template`](hotclub_http::HttpError::with_template).
pub fn set_error_environment(environment: Arc<Environment>) {
	*ERROR_ENV.write() = Some(environment);
}

/// Remove the application error environment.
pub fn clear_error_environment() {
	*ERROR_ENV.write() = None;
}

/// Human-readable reason phrase rendered next to the status code in error
/// fragments.
pub fn status_text(status: StatusCode) -> &'static str {
	match status {
		StatusCode::BAD_REQUEST => "Bad Request",
		StatusCode::UNAUTHORIZED => "Unauthorized",
		StatusCode::FORBIDDEN => "Forbidden",
		StatusCode::NOT_FOUND => "Not Found",
		StatusCode::METHOD_NOT_ALLOWED => "Method Not Allowed",
		StatusCode::NOT_ACCEPTABLE => "Not Acceptable",
		StatusCode::CONFLICT => "Conflict",
		StatusCode::UNPROCESSABLE_ENTITY => "Validation Error",
		_ => "Error",
	}
}

/// Middleware that converts handler errors into responses.
///
/// Should be the outermost middleware so it also catches errors raised by
/// anything stacked inside it.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hotclub_dispatch::{ComponentView, ErrorMapper, ViewResult};
/// use hotclub_http::MiddlewareChain;
///
/// let view = ComponentView::new(|_request| async { Ok(ViewResult::empty()) });
/// let chain = MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()));
/// ```
#[derive(Debug, Default)]
pub struct ErrorMapper;

impl ErrorMapper {
	pub fn new() -> Self {
		Self
	}
}

#[async_trait]
impl Middleware for ErrorMapper {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response> {
		// Classify before the handler consumes the request; the error path
		// must agree with dispatch on the representation.
		let negotiation = Negotiation::classify(&request);
		match next.handle(request).await {
			Ok(response) => Ok(response),
			Err(error) => Ok(map_error(error, &negotiation)),
		}
	}
}

/// Map one error to its response under the given classification.
///
/// Client errors render as HTML fragments when the client wants markup and
/// a template exists for the error's lookup key; everything else falls
/// through to the structured JSON shape.
pub fn map_error(error: Error, negotiation: &Negotiation) -> Response {
	let status = error.status_code();

	if status.is_server_error() {
		tracing::error!(error = %error, "handler failed");
	}

	if negotiation.wants_html_errors() && status.is_client_error() {
		match html_error_response(&error, negotiation) {
			Ok(Some(response)) => return response,
			Ok(None) => {
				tracing::debug!(status = %status, "no error template found, responding with JSON");
			}
			Err(render_error) => {
				tracing::warn!(
					error = %render_error,
					"error template failed to render, responding with JSON"
				);
			}
		}
	}

	Response::from(error)
}

fn html_error_response(error: &Error, negotiation: &Negotiation) -> Result<Option<Response>> {
	match error {
		Error::Http(http_error) => {
			let key = http_error.template.as_deref().unwrap_or("HttpError");
			let Some((environment, template)) = lookup(key, negotiation.variant()) else {
				return Ok(None);
			};

			let mut context = RenderContext::new();
			context.insert("status_code", &http_error.status.as_u16())?;
			context.insert("status_text", &status_text(http_error.status))?;
			context.insert("detail", &http_error.detail)?;

			let mut response = Response::html(environment.render(&template, &context.to_tera()?)?);
			response.status = http_error.status;
			if let Some(retarget) = &http_error.retarget {
				response = response.with_header("HX-Retarget", retarget);
			}
			if let Some(reswap) = &http_error.reswap {
				response = response.with_header("HX-Reswap", reswap);
			}
			Ok(Some(response))
		}
		Error::Validation(details) => {
			let Some((environment, template)) = lookup("ValidationError", negotiation.variant())
			else {
				return Ok(None);
			};

			let status = StatusCode::UNPROCESSABLE_ENTITY;
			let mut context = RenderContext::new();
			context.insert("status_code", &status.as_u16())?;
			context.insert("status_text", &status_text(status))?;
			context.insert("errors", details)?;

			let mut response = Response::html(environment.render(&template, &context.to_tera()?)?)
				.with_header("HX-Retarget", ERROR_CONTAINER_SELECTOR)
				.with_header("HX-Reswap", "outerHTML");
			response.status = status;
			Ok(Some(response))
		}
		_ => Ok(None),
	}
}

/// Find the first environment holding a template for `key`, preferring a
/// variant-qualified name within each environment and the application
/// environment over the built-in one.
fn lookup(key: &str, variant: Option<&str>) -> Option<(Arc<Environment>, String)> {
	let mut candidates = Vec::with_capacity(2);
	if let Some(variant) = variant {
		candidates.push(format!("{key}.{variant}.html"));
	}
	candidates.push(format!("{key}.html"));

	let application = ERROR_ENV.read().clone();
	for environment in application
		.into_iter()
		.chain(std::iter::once(BUILTIN_ERROR_ENV.clone()))
	{
		for candidate in &candidates {
			if environment.has_template(candidate) {
				return Some((environment, candidate.clone()));
			}
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use hotclub_http::ErrorDetail;
	use rstest::rstest;
	use serial_test::serial;

	struct Fails(fn() -> Error);

	#[async_trait]
	impl Handler for Fails {
		async fn handle(&self, _request: Request) -> Result<Response> {
			Err((self.0)())
		}
	}

	fn mapped(error: fn() -> Error, headers: &[(&str, &str)]) -> Response {
		let mut builder = Request::builder();
		for (name, value) in headers {
			builder = builder.header(name, value);
		}
		let request = builder.build().unwrap();

		let chain = hotclub_http::MiddlewareChain::new(Arc::new(Fails(error)))
			.with_middleware(Arc::new(ErrorMapper::new()));
		tokio_test::block_on(chain.handle(request)).unwrap()
	}

	fn body_str(response: &Response) -> &str {
		std::str::from_utf8(&response.body).unwrap()
	}

	#[rstest]
	#[case(StatusCode::BAD_REQUEST, "Bad Request")]
	#[case(StatusCode::UNAUTHORIZED, "Unauthorized")]
	#[case(StatusCode::FORBIDDEN, "Forbidden")]
	#[case(StatusCode::NOT_FOUND, "Not Found")]
	#[case(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")]
	#[case(StatusCode::NOT_ACCEPTABLE, "Not Acceptable")]
	#[case(StatusCode::CONFLICT, "Conflict")]
	#[case(StatusCode::UNPROCESSABLE_ENTITY, "Validation Error")]
	#[case(StatusCode::GONE, "Error")]
	#[case(StatusCode::INTERNAL_SERVER_ERROR, "Error")]
	fn test_status_text(#[case] status: StatusCode, #[case] expected: &str) {
		assert_eq!(status_text(status), expected);
	}

	#[test]
	#[serial]
	fn test_client_error_renders_fragment_for_html_client() {
		let response = mapped(
			|| Error::http(StatusCode::NOT_FOUND, "Task not found"),
			&[("hx-request", "true")],
		);

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		assert_eq!(
			response.headers.get("content-type").unwrap(),
			"text/html; charset=utf-8"
		);
		assert_eq!(
			body_str(&response),
			"<div class=\"hotclub-error\"><strong>404 Not Found</strong><p>Task not found</p></div>"
		);
	}

	#[test]
	#[serial]
	fn test_client_error_stays_json_for_api_client() {
		let response = mapped(
			|| Error::http(StatusCode::NOT_FOUND, "Task not found"),
			&[("accept", "application/json")],
		);

		assert_eq!(response.status, StatusCode::NOT_FOUND);
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body, serde_json::json!({"detail": "Task not found"}));
	}

	#[test]
	#[serial]
	fn test_server_error_is_always_json() {
		let response = mapped(
			|| Error::Internal("database unreachable".into()),
			&[("hx-request", "true")],
		);

		assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body, serde_json::json!({"detail": "database unreachable"}));
	}

	#[test]
	#[serial]
	fn test_event_stream_client_counts_as_html() {
		// An SSE subscriber cannot send Accept: text/html, but its errors
		// land in a browser all the same.
		let response = mapped(
			|| Error::http(StatusCode::FORBIDDEN, "No access"),
			&[("accept", "text/event-stream")],
		);

		assert_eq!(response.status, StatusCode::FORBIDDEN);
		assert!(body_str(&response).contains("403 Forbidden"));
	}

	#[test]
	#[serial]
	fn test_retarget_directives_become_headers() {
		let response = mapped(
			|| {
				Error::Http(
					hotclub_http::HttpError::new(StatusCode::CONFLICT, "Name taken")
						.with_retarget("#signup-errors")
						.with_reswap("innerHTML"),
				)
			},
			&[("hx-request", "true")],
		);

		assert_eq!(response.headers.get("hx-retarget").unwrap(), "#signup-errors");
		assert_eq!(response.headers.get("hx-reswap").unwrap(), "innerHTML");
	}

	#[test]
	#[serial]
	fn test_plain_http_error_sets_no_retarget_headers() {
		let response = mapped(
			|| Error::http(StatusCode::NOT_FOUND, "gone"),
			&[("hx-request", "true")],
		);

		assert!(response.headers.get("hx-retarget").is_none());
		assert!(response.headers.get("hx-reswap").is_none());
	}

	#[test]
	#[serial]
	fn test_validation_error_renders_list_with_default_retarget() {
		let response = mapped(
			|| {
				Error::Validation(vec![
					ErrorDetail::new(["body", "email"], "Field required", "missing"),
					ErrorDetail::new(["body", "age"], "Must be a number", "value_error"),
				])
			},
			&[("hx-request", "true")],
		);

		assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
		let body = body_str(&response);
		assert!(body.starts_with("<div class=\"hotclub-error-container\">"));
		assert!(body.contains("<strong>422 Validation Error</strong>"));
		assert!(body.contains("<li>body.email: Field required</li>"));
		assert!(body.contains("<li>body.age: Must be a number</li>"));
		assert_eq!(
			response.headers.get("hx-retarget").unwrap(),
			"closest .hotclub-error-container"
		);
		assert_eq!(response.headers.get("hx-reswap").unwrap(), "outerHTML");
	}

	#[test]
	#[serial]
	fn test_validation_error_stays_structured_for_api_client() {
		let response = mapped(
			|| {
				Error::Validation(vec![ErrorDetail::new(
					["body", "email"],
					"Field required",
					"missing",
				)])
			},
			&[("accept", "application/json")],
		);

		assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body", "email"]));
		assert_eq!(body["detail"][0]["type"], "missing");
	}

	#[test]
	#[serial]
	fn test_error_detail_message_is_escaped() {
		let response = mapped(
			|| {
				Error::Validation(vec![ErrorDetail::new(
					["body", "bio"],
					"<script>alert(1)</script>",
					"value_error",
				)])
			},
			&[("hx-request", "true")],
		);

		let body = body_str(&response);
		assert!(!body.contains("<script>"));
		assert!(body.contains("&lt;script&gt;"));
	}

	#[test]
	#[serial]
	fn test_application_environment_overrides_builtin_template() {
		set_error_environment(Arc::new(
			Environment::from_templates(&[(
				"HttpError.html",
				"<section>{{ status_code }}: {{ detail }}</section>",
			)])
			.unwrap(),
		));

		let response = mapped(
			|| Error::http(StatusCode::NOT_FOUND, "nope"),
			&[("hx-request", "true")],
		);
		clear_error_environment();

		assert_eq!(body_str(&response), "<section>404: nope</section>");
	}

	#[test]
	#[serial]
	fn test_custom_template_key_resolves_in_application_environment() {
		set_error_environment(Arc::new(
			Environment::from_templates(&[(
				"LoginError.html",
				"<p class=\"login-error\">{{ detail }}</p>",
			)])
			.unwrap(),
		));

		let response = mapped(
			|| {
				Error::Http(
					hotclub_http::HttpError::new(StatusCode::UNAUTHORIZED, "Wrong password")
						.with_template("LoginError"),
				)
			},
			&[("hx-request", "true")],
		);
		clear_error_environment();

		assert_eq!(
			body_str(&response),
			"<p class=\"login-error\">Wrong password</p>"
		);
	}

	#[test]
	#[serial]
	fn test_custom_template_key_without_template_falls_back_to_json() {
		let response = mapped(
			|| {
				Error::Http(
					hotclub_http::HttpError::new(StatusCode::UNAUTHORIZED, "Wrong password")
						.with_template("LoginError"),
				)
			},
			&[("hx-request", "true")],
		);

		let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
		assert_eq!(body, serde_json::json!({"detail": "Wrong password"}));
	}

	#[test]
	#[serial]
	fn test_variant_qualified_error_template_wins() {
		set_error_environment(Arc::new(
			Environment::from_templates(&[
				("HttpError.html", "<div>{{ detail }}</div>"),
				("HttpError.toast.html", "<span class=\"toast\">{{ detail }}</span>"),
			])
			.unwrap(),
		));

		let response = mapped(
			|| Error::http(StatusCode::CONFLICT, "busy"),
			&[("hc-variant", "toast")],
		);
		clear_error_environment();

		assert_eq!(body_str(&response), "<span class=\"toast\">busy</span>");
	}

	#[test]
	#[serial]
	fn test_detail_is_escaped_in_fragment() {
		let response = mapped(
			|| Error::http(StatusCode::BAD_REQUEST, "<img src=x onerror=alert(1)>"),
			&[("hx-request", "true")],
		);

		let body = body_str(&response);
		assert!(!body.contains("<img"));
		assert!(body.contains("&lt;img"));
	}

	#[tokio::test]
	#[serial]
	async fn test_successful_responses_pass_through() {
		struct Succeeds;

		#[async_trait]
		impl Handler for Succeeds {
			async fn handle(&self, _request: Request) -> Result<Response> {
				Ok(Response::html("<p>fine</p>"))
			}
		}

		let chain = hotclub_http::MiddlewareChain::new(Arc::new(Succeeds))
			.with_middleware(Arc::new(ErrorMapper::new()));
		let request = Request::builder().header("hx-request", "true").build().unwrap();

		let response = chain.handle(request).await.unwrap();

		assert_eq!(response.status, StatusCode::OK);
		assert_eq!(body_str(&response), "<p>fine</p>");
	}
}
