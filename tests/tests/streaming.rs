//! Streaming dispatch integration tests
//!
//! Cover handlers that return item streams:
//! - server-sent event framing for HTML clients, with event names,
//!   retry hints and per-request variants
//! - JSON lines for API clients
//! - a handler-spawned producer feeding items through a channel
//! - render failures surfacing as stream errors, not silent drops
//! - streams being refused when the view does not opt in

use std::sync::Arc;

use futures::{StreamExt, stream};
use hotclub::prelude::*;
use hotclub_integration_tests::{
	TaskCard, api_request, fragment_request, streamed_text, variant_request,
};
use http::StatusCode;
use tokio_stream::wrappers::ReceiverStream;

fn task_stream_view(options: ViewOptions) -> impl Handler {
	ComponentView::new(|_request| async {
		let items = vec![
			Ok(ViewValue::component(TaskCard::new("One", "a"))),
			Ok(ViewValue::component(TaskCard::new("Two", "b"))),
		];
		Ok(ViewResult::stream(stream::iter(items)))
	})
	.with_options(options)
}

/// HTML clients get each item as a rendered server-sent event frame,
/// stamped with the configured event name and retry hint.
#[tokio::test]
async fn test_html_clients_get_sse_frames() {
	let view = task_stream_view(
		ViewOptions::new()
			.streaming()
			.with_event("task")
			.with_retry_ms(5000),
	);

	let response = view.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::OK);
	assert!(response.is_streaming());
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"text/event-stream"
	);
	assert_eq!(
		streamed_text(response).await,
		"event: task\ndata: <article class=\"task\"><h2>One</h2><p>a</p></article>\nretry: 5000\n\n\
		 event: task\ndata: <article class=\"task\"><h2>Two</h2><p>b</p></article>\nretry: 5000\n\n"
	);
}

/// The variant header applies to every streamed item.
#[tokio::test]
async fn test_variant_applies_to_each_stream_item() {
	let view = task_stream_view(ViewOptions::new().streaming());

	let response = view.handle(variant_request("row")).await.unwrap();

	assert_eq!(
		streamed_text(response).await,
		"data: <tr><td>One</td><td>a</td></tr>\n\ndata: <tr><td>Two</td><td>b</td></tr>\n\n"
	);
}

/// API clients get one JSON document per line.
#[tokio::test]
async fn test_json_clients_get_json_lines() {
	let view = task_stream_view(ViewOptions::new().streaming());

	let response = view.handle(api_request()).await.unwrap();

	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"application/jsonl"
	);
	let text = streamed_text(response).await;
	assert_eq!(
		text,
		"{\"owner\":\"a\",\"title\":\"One\"}\n{\"owner\":\"b\",\"title\":\"Two\"}\n"
	);
	for line in text.lines() {
		serde_json::from_str::<serde_json::Value>(line).unwrap();
	}
}

/// A handler may spawn its own producer and return the receiving side of
/// a channel; frames go out as items arrive.
#[tokio::test]
async fn test_channel_fed_stream_frames_items_as_produced() {
	let view = ComponentView::new(|_request| async {
		let (sender, receiver) = tokio::sync::mpsc::channel(2);
		tokio::spawn(async move {
			for card in [TaskCard::new("One", "a"), TaskCard::new("Two", "b")] {
				if sender.send(Ok(ViewValue::component(card))).await.is_err() {
					break;
				}
			}
		});
		Ok(ViewResult::stream(ReceiverStream::new(receiver)))
	})
	.with_options(ViewOptions::new().streaming().with_event("task"));

	let response = view.handle(fragment_request()).await.unwrap();

	assert!(response.is_streaming());
	assert_eq!(
		streamed_text(response).await,
		"event: task\ndata: <article class=\"task\"><h2>One</h2><p>a</p></article>\n\n\
		 event: task\ndata: <article class=\"task\"><h2>Two</h2><p>b</p></article>\n\n"
	);
}

/// An item that cannot be rendered turns into a stream error after the
/// frames that already went out.
#[tokio::test]
async fn test_render_failure_surfaces_as_stream_error() {
	let view = ComponentView::new(|_request| async {
		let items = vec![
			Ok(ViewValue::component(TaskCard::new("One", "a"))),
			ViewValue::record(&serde_json::json!({"title": "broken"})),
		];
		Ok(ViewResult::stream(stream::iter(items)))
	})
	.with_options(ViewOptions::new().streaming());

	let response = view.handle(fragment_request()).await.unwrap();
	let chunks: Vec<_> = response.into_body_stream().collect().await;

	assert_eq!(chunks.len(), 2);
	let first = String::from_utf8(chunks[0].as_ref().unwrap().to_vec()).unwrap();
	assert!(first.starts_with("data: <article"));
	assert!(chunks[1].is_err());
}

/// A stream from a view that never opted in is a server error, and server
/// errors stay JSON even for HTML clients.
#[tokio::test]
async fn test_stream_requires_streaming_to_be_enabled() {
	let view = task_stream_view(ViewOptions::new());
	let chain =
		MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()));

	let response = chain.handle(fragment_request()).await.unwrap();

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		response.headers.get("content-type").unwrap(),
		"application/json"
	);
	let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
	assert!(
		body["detail"]
			.as_str()
			.unwrap()
			.contains("not configured for streaming")
	);
}
