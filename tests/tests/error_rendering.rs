//! Error rendering integration tests
//!
//! Cover the error mapper sitting in front of dispatching handlers:
//! - client errors rendered as fragments for htmx, JSON for the API
//! - validation failures from form binding, with re-targeting headers
//! - server errors staying JSON for every client
//! - application templates overriding the built-in error markup

use std::sync::Arc;

use hotclub::prelude::*;
use hotclub::{clear_error_environment, set_error_environment};
use hotclub_integration_tests::{api_request, body_text, fragment_request};
use http::{Method, StatusCode};
use serial_test::serial;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Signup {
	email: String,
	name: String,
}

fn signup_schema() -> FormSchema {
	FormSchema::new()
		.with_field(FieldSpec::new("email", InputKind::Email).with_label("Email"))
		.unwrap()
		.with_field(FieldSpec::new("name", InputKind::Text).with_label("Name"))
		.unwrap()
}

fn failing_view(error: impl Fn() -> Error + Send + Sync + 'static) -> MiddlewareChain {
	let view = ComponentView::new(move |_request| {
		let error = error();
		async move { Err::<ViewResult, _>(error) }
	});
	MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()))
}

/// A 404 from the handler reaches the htmx client as the built-in error
/// fragment.
#[tokio::test]
#[serial]
async fn test_not_found_renders_builtin_fragment_for_htmx() {
	let chain = failing_view(|| Error::http(StatusCode::NOT_FOUND, "Task not found"));

	let response = chain.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"text/html; charset=utf-8"
	);
	assert_eq!(
		body_text(&response),
		"<div class=\"hotclub-error\"><strong>404 Not Found</strong><p>Task not found</p></div>"
	);
}

/// The same 404 stays structured JSON for API clients.
#[tokio::test]
#[serial]
async fn test_not_found_stays_json_for_api_clients() {
	let chain = failing_view(|| Error::http(StatusCode::NOT_FOUND, "Task not found"));

	let response = chain.handle(api_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"application/json"
	);
	let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
	assert_eq!(body, serde_json::json!({"detail": "Task not found"}));
}

/// A form binding failure travels from the schema through dispatch to a
/// 422 fragment with re-targeting headers.
#[tokio::test]
#[serial]
async fn test_form_binding_failure_renders_validation_fragment() {
	let view = ComponentView::new(|request: Request| async move {
		let schema = signup_schema();
		let body = String::from_utf8_lossy(&request.body).into_owned();
		let signup: Signup = schema.bind(&body)?;
		Ok(ViewResult::fragment(format!("<p>welcome {}</p>", signup.name)))
	});
	let chain =
		MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()));

	let request = Request::builder()
		.method(Method::POST)
		.uri("/signup")
		.header("hx-request", "true")
		.body("")
		.build()
		.unwrap();
	let response = chain.handle(request).await.unwrap();

	assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert_eq!(
		response.headers.get("hx-retarget").unwrap(),
		"closest .hotclub-error-container"
	);
	assert_eq!(response.headers.get("hx-reswap").unwrap(), "outerHTML");
	let body = body_text(&response);
	assert!(body.starts_with(
		"<div class=\"hotclub-error-container\"><strong>422 Validation Error</strong>"
	));
	assert!(body.contains("<li>body.email: Field required</li>"));
	assert!(body.contains("<li>body.name: Field required</li>"));
}

/// Server errors are never rendered as fragments, even for htmx clients.
#[tokio::test]
#[serial]
async fn test_server_errors_stay_json_for_htmx() {
	let chain = failing_view(|| Error::Internal("database connection lost".into()));

	let response = chain.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"application/json"
	);
	let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
	assert_eq!(body, serde_json::json!({"detail": "database connection lost"}));
}

/// An application error environment restyles the built-in markup.
#[tokio::test]
#[serial]
async fn test_application_error_templates_override_builtin() {
	let environment = Environment::from_templates(&[(
		"HttpError.html",
		"<section>{{ status_code }}: {{ detail }}</section>",
	)])
	.unwrap();
	set_error_environment(Arc::new(environment));

	let chain = failing_view(|| Error::http(StatusCode::NOT_FOUND, "nope"));
	let response = chain.handle(fragment_request()).await.unwrap();
	clear_error_environment();

	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(body_text(&response), "<section>404: nope</section>");
}
