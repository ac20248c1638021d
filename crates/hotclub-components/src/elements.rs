//! Built-in HTML elements.
//!
//! A small library of ready-made components for composing pages without
//! hand-written markup: a document shell, text elements, links and
//! htmx-wired buttons, lists. Each renders through the shared built-in
//! environment and exposes the same class/attribute hooks, so containers can
//! decorate their children before rendering.

use std::sync::Arc;

use hotclub_http::{Error, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Value, json};

use crate::component::{Component, Content, RenderContext};
use crate::environment::Environment;
use crate::lineage::Lineage;
use crate::safety::{AttrValue, CssClasses, HtmlAttributes, SafeString};

static BUILTIN_ENV: Lazy<Arc<Environment>> = Lazy::new(|| {
	Arc::new(
		Environment::from_templates(&[
			("Page.html", include_str!("../templates/Page.html")),
			("Heading.html", include_str!("../templates/Heading.html")),
			("Paragraph.html", include_str!("../templates/Paragraph.html")),
			("Span.html", include_str!("../templates/Span.html")),
			("Div.html", include_str!("../templates/Div.html")),
			("Break.html", include_str!("../templates/Break.html")),
			("Anchor.html", include_str!("../templates/Anchor.html")),
			("Button.html", include_str!("../templates/Button.html")),
			("Image.html", include_str!("../templates/Image.html")),
			("ListView.html", include_str!("../templates/ListView.html")),
		])
		.expect("built-in templates are valid"),
	)
});

/// The environment holding the built-in element templates.
///
/// Custom components can derive their lineage from it to inherit an
/// element's template as a fallback.
pub fn builtin_environment() -> Arc<Environment> {
	BUILTIN_ENV.clone()
}

/// Link target frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TargetType {
	#[serde(rename = "_self")]
	SameFrame,
	#[serde(rename = "_blank")]
	NewWindow,
	#[serde(rename = "_parent")]
	ParentFrame,
	#[serde(rename = "_top")]
	FullBody,
}

impl TargetType {
	pub fn as_str(&self) -> &'static str {
		match self {
			TargetType::SameFrame => "_self",
			TargetType::NewWindow => "_blank",
			TargetType::ParentFrame => "_parent",
			TargetType::FullBody => "_top",
		}
	}
}

impl std::fmt::Display for TargetType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// HTTP verb wired into an htmx trigger attribute (`hx-get`, `hx-post`, ..).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
	Get,
	Post,
	Put,
	Patch,
	Delete,
}

impl HttpMethod {
	pub fn as_str(&self) -> &'static str {
		match self {
			HttpMethod::Get => "get",
			HttpMethod::Post => "post",
			HttpMethod::Put => "put",
			HttpMethod::Patch => "patch",
			HttpMethod::Delete => "delete",
		}
	}
}

impl std::fmt::Display for HttpMethod {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

macro_rules! impl_styleable {
	($($ty:ty),+ $(,)?) => {$(
		impl $ty {
			/// Add a CSS class, validated against the allowed charset.
			pub fn with_class(mut self, name: impl Into<String>) -> Result<Self> {
				self.css.insert(name)?;
				Ok(self)
			}

			/// Add an HTML attribute, validated against the allowed charset.
			pub fn with_attribute(
				mut self,
				key: impl Into<String>,
				value: impl Into<AttrValue>,
			) -> Result<Self> {
				self.attrs.insert(key, value)?;
				Ok(self)
			}

			/// Merge classes contributed by a container.
			pub fn merge_classes(&mut self, other: &CssClasses) {
				self.css.merge(other);
			}

			/// Merge attributes contributed by a container; later entries win.
			pub fn merge_attributes(&mut self, other: &HtmlAttributes) {
				self.attrs.merge(other);
			}
		}
	)+};
}

impl_styleable!(
	Page, Heading, Paragraph, Span, Div, Anchor, Button, Image, ListView,
);

fn items_markup(items: &[Content]) -> Result<SafeString> {
	let mut combined = String::new();
	for item in items {
		combined.push_str(item.render()?.as_str());
	}
	Ok(SafeString::new(combined))
}

fn items_json(items: &[Content]) -> Result<Value> {
	items
		.iter()
		.map(Content::to_json)
		.collect::<Result<Vec<_>>>()
		.map(Value::Array)
}

/// Full document shell: doctype, head with title and the htmx runtime, body
/// holding the page content.
#[derive(Clone)]
pub struct Page {
	title: String,
	content: Content,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Page {
	pub fn new(title: impl Into<String>, content: impl Into<Content>) -> Self {
		Self {
			title: title.into(),
			content: content.into(),
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}
}

impl Component for Page {
	fn lineage(&self) -> Lineage {
		Lineage::new("Page", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("title", &self.title)?;
		context.insert_content("content", &self.content)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "title": self.title, "content": self.content.to_json()? }))
	}
}

/// `<h1>` through `<h6>`.
#[derive(Clone)]
pub struct Heading {
	level: u8,
	content: Content,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Heading {
	pub fn new(level: u8, content: impl Into<Content>) -> Result<Self> {
		if !(1..=6).contains(&level) {
			return Err(Error::Internal(format!(
				"heading level {level} is out of range 1..=6"
			)));
		}
		Ok(Self {
			level,
			content: content.into(),
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		})
	}
}

impl Component for Heading {
	fn lineage(&self) -> Lineage {
		Lineage::new("Heading", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("level", &self.level)?;
		context.insert_content("content", &self.content)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "level": self.level, "content": self.content.to_json()? }))
	}
}

/// `<p>`.
#[derive(Debug, Clone)]
pub struct Paragraph {
	content: Content,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Paragraph {
	pub fn new(content: impl Into<Content>) -> Self {
		Self {
			content: content.into(),
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}
}

impl Component for Paragraph {
	fn lineage(&self) -> Lineage {
		Lineage::new("Paragraph", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert_content("content", &self.content)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "content": self.content.to_json()? }))
	}
}

/// `<span>` wrapping a sequence of items.
#[derive(Clone)]
pub struct Span {
	items: Vec<Content>,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Span {
	pub fn new(items: Vec<Content>) -> Self {
		Self {
			items,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn push(&mut self, item: impl Into<Content>) {
		self.items.push(item.into());
	}
}

impl Component for Span {
	fn lineage(&self) -> Lineage {
		Lineage::new("Span", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert_safe("items", items_markup(&self.items)?);
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "items": items_json(&self.items)? }))
	}
}

/// `<div>` wrapping a sequence of items. Doubles as the default wrapper when
/// a handler returns several records for an HTML response.
#[derive(Clone)]
pub struct Div {
	items: Vec<Content>,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Div {
	pub fn new(items: Vec<Content>) -> Self {
		Self {
			items,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn push(&mut self, item: impl Into<Content>) {
		self.items.push(item.into());
	}
}

impl Component for Div {
	fn lineage(&self) -> Lineage {
		Lineage::new("Div", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert_safe("items", items_markup(&self.items)?);
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "items": items_json(&self.items)? }))
	}
}

/// `<br>`.
#[derive(Clone, Copy)]
pub struct Break;

impl Component for Break {
	fn lineage(&self) -> Lineage {
		Lineage::new("Break", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		Ok(RenderContext::new())
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({}))
	}
}

/// `<a>` with an explicit target frame.
#[derive(Clone)]
pub struct Anchor {
	route: String,
	content: Content,
	target: TargetType,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Anchor {
	pub fn new(route: impl Into<String>, content: impl Into<Content>) -> Self {
		Self {
			route: route.into(),
			content: content.into(),
			target: TargetType::SameFrame,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn with_target(mut self, target: TargetType) -> Self {
		self.target = target;
		self
	}
}

impl Component for Anchor {
	fn lineage(&self) -> Lineage {
		Lineage::new("Anchor", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("route", &self.route)?;
		context.insert("target", &self.target.as_str())?;
		context.insert_content("content", &self.content)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({
			"route": self.route,
			"content": self.content.to_json()?,
			"target": self.target,
		}))
	}
}

/// `<button>` issuing an htmx request to `route` when clicked.
#[derive(Clone)]
pub struct Button {
	route: String,
	content: Content,
	verb: HttpMethod,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Button {
	pub fn new(route: impl Into<String>, content: impl Into<Content>) -> Self {
		Self {
			route: route.into(),
			content: content.into(),
			verb: HttpMethod::Get,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn with_verb(mut self, verb: HttpMethod) -> Self {
		self.verb = verb;
		self
	}
}

impl Component for Button {
	fn lineage(&self) -> Lineage {
		Lineage::new("Button", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("route", &self.route)?;
		context.insert("verb", &self.verb.as_str())?;
		context.insert_content("content", &self.content)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({
			"route": self.route,
			"content": self.content.to_json()?,
			"verb": self.verb,
		}))
	}
}

/// `<img>`.
#[derive(Clone)]
pub struct Image {
	source: String,
	alt: Option<String>,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Image {
	pub fn new(source: impl Into<String>) -> Self {
		Self {
			source: source.into(),
			alt: None,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
		self.alt = Some(alt.into());
		self
	}
}

impl Component for Image {
	fn lineage(&self) -> Lineage {
		Lineage::new("Image", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut context = RenderContext::new();
		context.insert("source", &self.source)?;
		context.insert("alt", &self.alt)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "source": self.source, "alt": self.alt }))
	}
}

/// `<ul>` or `<ol>` with one `<li>` per item.
#[derive(Clone)]
pub struct ListView {
	items: Vec<Content>,
	ordered: bool,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl ListView {
	pub fn new(items: Vec<Content>) -> Self {
		Self {
			items,
			ordered: false,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	pub fn ordered(mut self) -> Self {
		self.ordered = true;
		self
	}

	pub fn push(&mut self, item: impl Into<Content>) {
		self.items.push(item.into());
	}
}

impl Component for ListView {
	fn lineage(&self) -> Lineage {
		Lineage::new("ListView", builtin_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let tag = if self.ordered { "ol" } else { "ul" };

		let mut context = RenderContext::new();
		context.insert("tag", &tag)?;
		context.insert_content_list("items", &self.items)?;
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({ "items": items_json(&self.items)?, "ordered": self.ordered }))
	}
}
