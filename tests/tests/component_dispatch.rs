//! Component dispatch integration tests
//!
//! Cover the path from request classification to the final response:
//! - one handler serving fragments, JSON and variant-tagged markup
//! - list results combined into a single wrapped fragment
//! - html-only enforcement happening before handler side effects
//! - handler-set headers and status surviving dispatch
//! - ambient context providers staying request-scoped

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use hotclub::prelude::*;
use hotclub::with_provider;
use hotclub_integration_tests::{
	Banner, TaskCard, api_request, body_text, fragment_request, variant_request,
};
use http::StatusCode;

/// One handler, two representations: markup for htmx, JSON for the API.
#[tokio::test]
async fn test_one_handler_serves_fragment_and_json() {
	let view = ComponentView::new(|_request| async {
		Ok(ViewResult::component(TaskCard::new("Write docs", "dizzy")))
	});

	let html = view.handle(fragment_request()).await.unwrap();
	assert_eq!(html.status, StatusCode::OK);
	assert_eq!(
		body_text(&html),
		"<article class=\"task\"><h2>Write docs</h2><p>dizzy</p></article>"
	);

	let json = view.handle(api_request()).await.unwrap();
	let value: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
	assert_eq!(
		value,
		serde_json::json!({"title": "Write docs", "owner": "dizzy"})
	);
}

/// The variant header picks the alternate template without any handler
/// involvement.
#[tokio::test]
async fn test_variant_header_steers_template_selection() {
	let view = ComponentView::new(|_request| async {
		Ok(ViewResult::component(TaskCard::new("Write docs", "dizzy")))
	});

	let response = view.handle(variant_request("row")).await.unwrap();

	assert_eq!(
		body_text(&response),
		"<tr><td>Write docs</td><td>dizzy</td></tr>"
	);
}

/// A list result renders each item and wraps the fragments in a container,
/// preserving order.
#[tokio::test]
async fn test_list_result_is_wrapped_in_one_fragment() {
	let view = ComponentView::new(|_request| async {
		Ok(ViewResult::new(ViewValue::components(vec![
			TaskCard::new("One", "a"),
			TaskCard::new("Two", "b"),
		])))
	});

	let response = view.handle(fragment_request()).await.unwrap();

	assert_eq!(
		body_text(&response),
		"<div><article class=\"task\"><h2>One</h2><p>a</p></article>\
		<article class=\"task\"><h2>Two</h2><p>b</p></article></div>"
	);

	let json = view.handle(api_request()).await.unwrap();
	let value: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
	assert_eq!(value.as_array().unwrap().len(), 2);
	assert_eq!(value[0]["title"], "One");
	assert_eq!(value[1]["title"], "Two");
}

/// An html-only write view refuses API clients before running, so the
/// write never happens for a client that cannot consume the result.
#[tokio::test]
async fn test_html_only_view_rejects_api_clients_before_side_effects() {
	static CALLS: AtomicUsize = AtomicUsize::new(0);

	let view = ComponentView::new(|_request| async {
		CALLS.fetch_add(1, Ordering::SeqCst);
		Ok(ViewResult::component(TaskCard::new("Created", "dizzy")))
	})
	.with_options(ViewOptions::new().html_only());
	let chain =
		MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()));

	let refused = chain.handle(api_request()).await.unwrap();
	assert_eq!(refused.status, StatusCode::NOT_ACCEPTABLE);
	let body: serde_json::Value = serde_json::from_slice(&refused.body).unwrap();
	assert_eq!(
		body,
		serde_json::json!({
			"detail": "This route can only provide HTML responses. Please set Accept headers."
		})
	);
	assert_eq!(CALLS.load(Ordering::SeqCst), 0, "handler must not run");

	let accepted = chain.handle(fragment_request()).await.unwrap();
	assert_eq!(accepted.status, StatusCode::OK);
	assert_eq!(CALLS.load(Ordering::SeqCst), 1);
}

/// Handler-set status and headers decorate the rendered response.
#[tokio::test]
async fn test_handler_status_and_headers_survive_dispatch() {
	let view = ComponentView::new(|_request| async {
		Ok(ViewResult::component(TaskCard::new("New", "dizzy"))
			.with_status(StatusCode::CREATED)
			.with_header("HX-Trigger", "task-created"))
	});

	let response = view.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::CREATED);
	assert_eq!(response.headers.get("hx-trigger").unwrap(), "task-created");
	assert!(body_text(&response).starts_with("<article"));
}

/// A raw response shortcuts dispatch entirely.
#[tokio::test]
async fn test_raw_response_passes_through() {
	let view = ComponentView::new(|_request| async {
		Ok(ViewResult::raw(
			Response::new(StatusCode::SEE_OTHER).with_header("location", "/tasks"),
		))
	});

	let response = view.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::SEE_OTHER);
	assert_eq!(response.headers.get("location").unwrap(), "/tasks");
}

/// Concurrent requests each render with their own ambient context.
#[tokio::test]
async fn test_context_providers_stay_request_scoped() {
	let view = Arc::new(ComponentView::new(|_request| async {
		Ok(ViewResult::component(Banner::new("deploy finished")))
	}));

	let alpha = {
		let view = view.clone();
		tokio::spawn(with_provider(
			|| {
				let mut context = RenderContext::new();
				context.insert("site", &"alpha").unwrap();
				context
			},
			async move { view.handle(fragment_request()).await },
		))
	};
	let beta = {
		let view = view.clone();
		tokio::spawn(with_provider(
			|| {
				let mut context = RenderContext::new();
				context.insert("site", &"beta").unwrap();
				context
			},
			async move { view.handle(fragment_request()).await },
		))
	};

	let alpha = alpha.await.unwrap().unwrap();
	let beta = beta.await.unwrap().unwrap();

	assert_eq!(body_text(&alpha), "<header>alpha: deploy finished</header>");
	assert_eq!(body_text(&beta), "<header>beta: deploy finished</header>");
}
