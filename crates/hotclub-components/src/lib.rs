//! Self-rendering components for hotclub.
//!
//! A component is a typed record that carries its own template identity:
//! handlers build components, and the render pipeline turns them into
//! escaped HTML through an ancestor-chain template lookup with optional
//! per-request variants. The same record serializes to JSON unchanged, so
//! one return value can serve both hypermedia and API clients.
//!
//! Escaping happens when values enter a [`RenderContext`]: plain text is
//! HTML-escaped, nested components are pre-rendered, and the attribute and
//! class collections only ever hold allow-listed characters, so templates
//! splice everything verbatim.

mod component;
mod context;
mod elements;
mod environment;
mod lineage;
mod safety;

pub use component::{Component, Content, RenderContext, RenderOptions, render};
pub use context::{
	ContextProvider, clear_global_provider, current_context, set_global_provider, with_provider,
};
pub use elements::{
	Anchor, Break, Button, Div, Heading, HttpMethod, Image, ListView, Page, Paragraph, Span,
	TargetType, builtin_environment,
};
pub use environment::Environment;
pub use lineage::{CachedResolver, Lineage, ResolvedTemplate, TemplateBinding};
pub use safety::{AttrValue, CssClasses, HtmlAttributes, SafeString, escape_html};
