//! Server-sent event framing.
//!
//! [`EventStream`] wraps a stream of pre-rendered string payloads and frames
//! each one as an SSE message. The wrapper is forward-only and unbuffered:
//! each payload is pulled, framed, and emitted exactly once, in order.

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use hotclub_http::{Result, StreamBody};

/// The SSE media type.
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// A stream of string payloads framed as server-sent events.
///
/// Each payload becomes one message. Depending on configuration the frame
/// is one of exactly four shapes:
///
/// ```text
/// data: {payload}\n\n
/// event: {name}\ndata: {payload}\n\n
/// data: {payload}\nretry: {ms}\n\n
/// event: {name}\ndata: {payload}\nretry: {ms}\n\n
/// ```
///
/// # Examples
///
/// ```
/// use futures::{executor::block_on, stream, StreamExt};
/// use hotclub_dispatch::EventStream;
///
/// let items = stream::iter(vec![Ok("one".to_string()), Ok("two".to_string())]);
/// let frames: Vec<_> = block_on(
///     EventStream::new(items)
///         .with_event("task-update")
///         .into_frames()
///         .collect::<Vec<_>>(),
/// );
///
/// assert_eq!(frames[0].as_ref().unwrap(), "event: task-update\ndata: one\n\n");
/// assert_eq!(frames[1].as_ref().unwrap(), "event: task-update\ndata: two\n\n");
/// ```
pub struct EventStream<S> {
	items: S,
	event: Option<String>,
	retry_ms: Option<u64>,
}

impl<S> EventStream<S>
where
	S: Stream<Item = Result<String>> + Send + 'static,
{
	pub fn new(items: S) -> Self {
		Self {
			items,
			event: None,
			retry_ms: None,
		}
	}

	/// Set the event name sent with every frame.
	pub fn with_event(mut self, event: impl Into<String>) -> Self {
		self.event = Some(event.into());
		self
	}

	/// Set the reconnection delay advertised with every frame.
	pub fn with_retry_ms(mut self, retry_ms: u64) -> Self {
		self.retry_ms = Some(retry_ms);
		self
	}

	/// Frame each payload as an SSE message, preserving order.
	///
	/// Payload errors pass through unframed so the dispatcher can decide
	/// how to surface a mid-stream failure.
	pub fn into_frames(self) -> impl Stream<Item = Result<String>> + Send + 'static {
		let Self {
			items,
			event,
			retry_ms,
		} = self;
		items.map(move |item| item.map(|payload| frame(&payload, event.as_deref(), retry_ms)))
	}

	/// The framed stream as a boxed chunk-stream body.
	pub fn into_body(self) -> StreamBody {
		Box::pin(self.into_frames().map(|item| item.map(Bytes::from)))
	}
}

fn frame(payload: &str, event: Option<&str>, retry_ms: Option<u64>) -> String {
	match (event, retry_ms) {
		(None, None) => format!("data: {payload}\n\n"),
		(Some(event), None) => format!("event: {event}\ndata: {payload}\n\n"),
		(None, Some(retry)) => format!("data: {payload}\nretry: {retry}\n\n"),
		(Some(event), Some(retry)) => {
			format!("event: {event}\ndata: {payload}\nretry: {retry}\n\n")
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use futures::stream;
	use hotclub_http::Error;
	use rstest::rstest;

	async fn collect_frames<S>(events: EventStream<S>) -> Vec<Result<String>>
	where
		S: Stream<Item = Result<String>> + Send + 'static,
	{
		events.into_frames().collect().await
	}

	fn items(payloads: &[&str]) -> impl Stream<Item = Result<String>> + Send + 'static {
		stream::iter(
			payloads
				.iter()
				.map(|payload| Ok(payload.to_string()))
				.collect::<Vec<_>>(),
		)
	}

	#[rstest]
	#[case::bare(None, None, "data: <li>x</li>\n\n")]
	#[case::event(Some("update"), None, "event: update\ndata: <li>x</li>\n\n")]
	#[case::retry(None, Some(1500), "data: <li>x</li>\nretry: 1500\n\n")]
	#[case::event_and_retry(
		Some("update"),
		Some(1500),
		"event: update\ndata: <li>x</li>\nretry: 1500\n\n"
	)]
	#[tokio::test]
	async fn test_frame_shapes(
		#[case] event: Option<&str>,
		#[case] retry_ms: Option<u64>,
		#[case] expected: &str,
	) {
		// Arrange
		let mut events = EventStream::new(items(&["<li>x</li>"]));
		if let Some(event) = event {
			events = events.with_event(event);
		}
		if let Some(retry) = retry_ms {
			events = events.with_retry_ms(retry);
		}

		// Act
		let frames = collect_frames(events).await;

		// Assert
		assert_eq!(frames.len(), 1);
		assert_eq!(frames[0].as_ref().unwrap(), expected);
	}

	#[tokio::test]
	async fn test_n_items_produce_n_frames_in_order() {
		let events = EventStream::new(items(&["a", "b", "c"]));

		let frames = collect_frames(events).await;

		let payloads: Vec<_> = frames.into_iter().map(|f| f.unwrap()).collect();
		assert_eq!(
			payloads,
			vec!["data: a\n\n", "data: b\n\n", "data: c\n\n"]
		);
	}

	#[tokio::test]
	async fn test_item_errors_pass_through() {
		let underlying = stream::iter(vec![
			Ok("fine".to_string()),
			Err(Error::Internal("source failed".into())),
		]);

		let frames = collect_frames(EventStream::new(underlying)).await;

		assert_eq!(frames[0].as_ref().unwrap(), "data: fine\n\n");
		assert!(frames[1].is_err());
	}

	#[tokio::test]
	async fn test_into_body_yields_framed_bytes() {
		let body = EventStream::new(items(&["x"])).with_retry_ms(200).into_body();

		let chunks: Vec<_> = body.collect().await;
		assert_eq!(chunks.len(), 1);
		assert_eq!(
			chunks[0].as_ref().unwrap(),
			&Bytes::from("data: x\nretry: 200\n\n")
		);
	}
}
