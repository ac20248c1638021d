//! # hotclub
//!
//! Server-side components and content negotiation for HTML-over-the-wire
//! services, in the htmx style.
//!
//! A handler builds typed, self-rendering components; hotclub decides per
//! request whether they leave as escaped HTML fragments or as JSON, from
//! the same return value. Templates resolve along each component's
//! ancestor chain with optional per-request variants, attribute and class
//! values are validated at construction time, and errors render as
//! fragments for hypermedia clients while API clients keep structured
//! JSON.
//!
//! ## Feature Flags
//!
//! - `full` (default) - everything below
//! - `components` - component model, template resolution, built-in elements
//! - `forms` - form schemas compiled to widget component trees
//! - `dispatch` - content-negotiating views, streaming, error mapping
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use hotclub::prelude::*;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Task {
//!     title: String,
//!     done: bool,
//! }
//!
//! impl Component for Task {
//!     fn lineage(&self) -> Lineage {
//!         Lineage::new("Task", app_environment())
//!     }
//!
//!     fn context(&self) -> Result<RenderContext> {
//!         let mut context = RenderContext::new();
//!         context.insert("title", &self.title)?;
//!         context.insert("done", &self.done)?;
//!         Ok(context)
//!     }
//!
//!     fn to_json(&self) -> Result<serde_json::Value> {
//!         Ok(serde_json::to_value(self)?)
//!     }
//! }
//!
//! // One handler serves htmx fragments and JSON API clients alike.
//! let list_tasks = ComponentView::new(|_request| async {
//!     Ok(ViewResult::new(ViewValue::components(load_tasks().await?)))
//! });
//!
//! let app = MiddlewareChain::new(Arc::new(list_tasks))
//!     .with_middleware(Arc::new(ErrorMapper::new()));
//! ```

// Re-export HTTP primitives
pub use hotclub_http::{
	Error, ErrorDetail, Handler, HttpError, Middleware, MiddlewareChain, Request, RequestBuilder,
	Response, Result, StreamBody, StreamingResponse,
};

// Re-export the component model
#[cfg(feature = "components")]
pub use hotclub_components::{
	Component, Content, RenderContext, RenderOptions, render,
};

// Re-export template environments and resolution
#[cfg(feature = "components")]
pub use hotclub_components::{
	CachedResolver, Environment, Lineage, ResolvedTemplate, TemplateBinding,
};

// Re-export the safety model
#[cfg(feature = "components")]
pub use hotclub_components::{
	AttrValue, CssClasses, HtmlAttributes, SafeString, escape_html,
};

// Re-export ambient context providers
#[cfg(feature = "components")]
pub use hotclub_components::{
	ContextProvider, clear_global_provider, current_context, set_global_provider, with_provider,
};

// Re-export built-in elements
#[cfg(feature = "components")]
pub use hotclub_components::{
	Anchor, Break, Button, Div, Heading, HttpMethod, Image, ListView, Page, Paragraph, Span,
	TargetType, builtin_environment,
};

// Re-export form schemas and widgets
#[cfg(feature = "forms")]
pub use hotclub_forms::{
	FieldSpec, Form, FormSchema, InputKind, InputOption, InputWidget, forms_environment,
};

// Re-export view dispatch
#[cfg(feature = "dispatch")]
pub use hotclub_dispatch::{
	BlockingHandler, ComponentView, FixedTemplate, Negotiation, RenderMode, ViewOptions,
	ViewResult, ViewStream, ViewValue, Wrapper,
};

// Re-export negotiation headers
#[cfg(feature = "dispatch")]
pub use hotclub_dispatch::{FRAGMENT_HEADER, VARIANT_HEADER};

// Re-export streaming
#[cfg(feature = "dispatch")]
pub use hotclub_dispatch::{EVENT_STREAM_MEDIA_TYPE, EventStream};

// Re-export error mapping
#[cfg(feature = "dispatch")]
pub use hotclub_dispatch::{
	ERROR_CONTAINER_SELECTOR, ErrorMapper, clear_error_environment, map_error,
	set_error_environment, status_text,
};

/// Commonly used types, importable in one line.
pub mod prelude {
	pub use crate::{
		Error, ErrorDetail, Handler, HttpError, Middleware, MiddlewareChain, Request, Response,
		Result,
	};

	// External
	pub use async_trait::async_trait;
	pub use serde::{Deserialize, Serialize};

	#[cfg(feature = "components")]
	pub use crate::{
		Component, Content, CssClasses, Environment, HtmlAttributes, Lineage, RenderContext,
		RenderOptions, SafeString, render,
	};

	#[cfg(feature = "forms")]
	pub use crate::{FieldSpec, Form, FormSchema, InputKind};

	#[cfg(feature = "dispatch")]
	pub use crate::{
		ComponentView, ErrorMapper, Negotiation, RenderMode, ViewOptions, ViewResult, ViewValue,
	};
}
