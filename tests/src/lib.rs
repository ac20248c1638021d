//! Shared fixtures for the integration tests: a miniature task-board
//! application exercising components, forms and dispatch together.

use std::sync::Arc;

use futures::StreamExt;
use hotclub::{Component, Environment, Lineage, Request, RenderContext, Response, Result};
use once_cell::sync::Lazy;
use serde::Serialize;

static APP_ENV: Lazy<Arc<Environment>> = Lazy::new(|| {
	Arc::new(
		Environment::from_templates(&[
			(
				"TaskCard.html",
				"<article class=\"task\"><h2>{{ title }}</h2><p>{{ owner }}</p></article>",
			),
			(
				"TaskCard.row.html",
				"<tr><td>{{ title }}</td><td>{{ owner }}</td></tr>",
			),
			("Banner.html", "<header>{{ site }}: {{ message }}</header>"),
		])
		.expect("fixture templates are valid"),
	)
});

/// The template environment of the fixture application.
pub fn app_environment() -> Arc<Environment> {
	APP_ENV.clone()
}

/// A task as the fixture application renders it: full card by default, a
/// table row under the `row` variant.
#[derive(Debug, Clone, Serialize)]
pub struct TaskCard {
	pub title: String,
	pub owner: String,
}

impl TaskCard {
	pub fn new(title: impl Into<String>, owner: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			owner: owner.into(),
		}
	}
}

impl Component for TaskCard {
	fn lineage(&self) -> Lineage {
		Lineage::new("TaskCard", app_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("title", &self.title)?;
		context.insert("owner", &self.owner)?;
		Ok(context)
	}

	fn to_json(&self) -> Result<serde_json::Value> {
		Ok(serde_json::to_value(self)?)
	}
}

/// A status line whose `site` value comes from the ambient context
/// provider rather than from the component's own fields.
#[derive(Debug, Clone, Serialize)]
pub struct Banner {
	pub message: String,
}

impl Banner {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

impl Component for Banner {
	fn lineage(&self) -> Lineage {
		Lineage::new("Banner", app_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("message", &self.message)?;
		Ok(context)
	}

	fn to_json(&self) -> Result<serde_json::Value> {
		Ok(serde_json::to_value(self)?)
	}
}

/// A request as htmx sends it.
pub fn fragment_request() -> Request {
	Request::builder()
		.header("hx-request", "true")
		.build()
		.expect("fixture request is valid")
}

/// A request as an API client sends it.
pub fn api_request() -> Request {
	Request::builder()
		.header("accept", "application/json")
		.build()
		.expect("fixture request is valid")
}

/// A fragment request asking for a template variant.
pub fn variant_request(variant: &str) -> Request {
	Request::builder()
		.header("hx-request", "true")
		.header("hc-variant", variant)
		.build()
		.expect("fixture request is valid")
}

/// The buffered body as text.
pub fn body_text(response: &Response) -> String {
	String::from_utf8(response.body.to_vec()).expect("body is utf-8")
}

/// Collect a streaming body into one string.
pub async fn streamed_text(response: Response) -> String {
	let chunks: Vec<_> = response.into_body_stream().collect().await;
	chunks
		.into_iter()
		.map(|chunk| String::from_utf8(chunk.expect("stream item").to_vec()).expect("utf-8"))
		.collect()
}
