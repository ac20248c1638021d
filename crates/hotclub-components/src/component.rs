//! The component model: typed records that know how to render themselves.
//!
//! A [`Component`] pairs a schema (its fields, exposed through
//! [`Component::context`]) with a template lookup identity (its
//! [`Lineage`]). Rendering builds a context in which plain text is already
//! escaped and nested components are already rendered, resolves a template
//! through the ancestor chain and hands both to the engine.

use std::collections::BTreeSet;
use std::sync::Arc;

use hotclub_http::{Error, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::context::current_context;
use crate::environment::to_template_error;
use crate::lineage::Lineage;
use crate::safety::{CssClasses, HtmlAttributes, SafeString, escape_html};

/// A renderable field value.
///
/// This is the closed union the render pipeline dispatches on when a field
/// can hold "text or markup or another component": plain text is escaped,
/// safe markup passes through, child components render recursively, and
/// sequences concatenate.
#[derive(Clone, Default)]
pub enum Content {
	#[default]
	Empty,
	Text(String),
	Safe(SafeString),
	Child(Arc<dyn Component>),
	Many(Vec<Content>),
}

impl Content {
	/// Wrap a component as embeddable content.
	pub fn child(component: impl Component + 'static) -> Self {
		Content::Child(Arc::new(component))
	}

	/// Wrap an already shared component.
	pub fn shared(component: Arc<dyn Component>) -> Self {
		Content::Child(component)
	}

	/// Render to safe markup: escape text, pass safe markup through,
	/// recursively render children, concatenate sequences.
	pub fn render(&self) -> Result<SafeString> {
		match self {
			Content::Empty => Ok(SafeString::default()),
			Content::Text(text) => Ok(SafeString::new(escape_html(text))),
			Content::Safe(safe) => Ok(safe.clone()),
			Content::Child(component) => render(component.as_ref(), &RenderOptions::default()),
			Content::Many(items) => {
				let mut combined = String::new();
				for item in items {
					combined.push_str(item.render()?.as_str());
				}
				Ok(SafeString::new(combined))
			}
		}
	}

	/// The JSON representation used by passthrough responses: raw text,
	/// the child's own JSON, arrays for sequences.
	pub fn to_json(&self) -> Result<Value> {
		match self {
			Content::Empty => Ok(Value::Null),
			Content::Text(text) => Ok(Value::String(text.clone())),
			Content::Safe(safe) => Ok(Value::String(safe.as_str().to_string())),
			Content::Child(component) => component.to_json(),
			Content::Many(items) => items
				.iter()
				.map(Content::to_json)
				.collect::<Result<Vec<_>>>()
				.map(Value::Array),
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			Content::Empty => true,
			Content::Text(text) => text.is_empty(),
			Content::Safe(safe) => safe.is_empty(),
			Content::Child(_) => false,
			Content::Many(items) => items.iter().all(Content::is_empty),
		}
	}
}

impl std::fmt::Debug for Content {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Content::Empty => f.write_str("Content::Empty"),
			Content::Text(text) => f.debug_tuple("Content::Text").field(text).finish(),
			Content::Safe(safe) => f.debug_tuple("Content::Safe").field(safe).finish(),
			Content::Child(_) => f.write_str("Content::Child(..)"),
			Content::Many(items) => f.debug_tuple("Content::Many").field(items).finish(),
		}
	}
}

impl From<&str> for Content {
	fn from(text: &str) -> Self {
		Content::Text(text.to_string())
	}
}

impl From<String> for Content {
	fn from(text: String) -> Self {
		Content::Text(text)
	}
}

impl From<SafeString> for Content {
	fn from(safe: SafeString) -> Self {
		Content::Safe(safe)
	}
}

impl From<Vec<Content>> for Content {
	fn from(items: Vec<Content>) -> Self {
		Content::Many(items)
	}
}

impl Serialize for Content {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let value = self.to_json().map_err(serde::ser::Error::custom)?;
		value.serialize(serializer)
	}
}

/// The key-value mapping handed to the template engine for one render call.
///
/// Insertion is where escaping happens: [`RenderContext::insert`] escapes
/// every string inside the serialized value, while the `insert_safe` and
/// content-aware variants feed pre-rendered markup through verbatim.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
	values: Map<String, Value>,
}

impl RenderContext {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert a serializable value, escaping every string in it.
	pub fn insert(&mut self, key: impl Into<String>, value: &impl Serialize) -> Result<()> {
		let value = serde_json::to_value(value)?;
		self.values.insert(key.into(), escape_value(value));
		Ok(())
	}

	/// Insert pre-escaped markup verbatim.
	pub fn insert_safe(&mut self, key: impl Into<String>, safe: SafeString) {
		self.values
			.insert(key.into(), Value::String(safe.into_inner()));
	}

	/// Insert content as one safe markup string (sequences concatenate).
	pub fn insert_content(&mut self, key: impl Into<String>, content: &Content) -> Result<()> {
		let rendered = content.render()?;
		self.insert_safe(key, rendered);
		Ok(())
	}

	/// Insert a list of content items as an array of safe markup strings,
	/// for templates that iterate rather than splice one blob.
	pub fn insert_content_list(
		&mut self,
		key: impl Into<String>,
		items: &[Content],
	) -> Result<()> {
		let rendered = items
			.iter()
			.map(|item| item.render().map(|safe| Value::String(safe.into_inner())))
			.collect::<Result<Vec<_>>>()?;
		self.values.insert(key.into(), Value::Array(rendered));
		Ok(())
	}

	pub(crate) fn insert_json(&mut self, key: impl Into<String>, value: Value) {
		self.values.insert(key.into(), value);
	}

	pub fn remove(&mut self, key: &str) -> Option<Value> {
		self.values.remove(key)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.values.contains_key(key)
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	/// Overlay `other`; its entries win on collision.
	pub fn merge(&mut self, other: RenderContext) {
		for (key, value) in other.values {
			self.values.insert(key, value);
		}
	}

	/// Convert into the engine's context type.
	pub fn to_tera(&self) -> Result<tera::Context> {
		tera::Context::from_serialize(&self.values).map_err(to_template_error)
	}
}

impl Serialize for RenderContext {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		self.values.serialize(serializer)
	}
}

fn escape_value(value: Value) -> Value {
	match value {
		Value::String(text) => Value::String(escape_html(&text)),
		Value::Array(items) => Value::Array(items.into_iter().map(escape_value).collect()),
		Value::Object(map) => Value::Object(
			map.into_iter()
				.map(|(key, value)| (key, escape_value(value)))
				.collect(),
		),
		other => other,
	}
}

/// Per-call rendering parameters.
///
/// `include` names opt-in fields served by [`Component::supplemental`];
/// `exclude` removes keys from the final context; `variant` selects an
/// alternate template; `extra_context` is merged last and wins collisions.
#[derive(Clone, Default)]
pub struct RenderOptions {
	include: Vec<String>,
	exclude: BTreeSet<String>,
	variant: Option<String>,
	extra_context: RenderContext,
}

impl RenderOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Pull the named supplemental field into the context.
	pub fn include(mut self, field: impl Into<String>) -> Self {
		self.include.push(field.into());
		self
	}

	/// Drop the named field from the context.
	pub fn exclude(mut self, field: impl Into<String>) -> Self {
		self.exclude.insert(field.into());
		self
	}

	/// Render through the named template variant.
	pub fn variant(mut self, variant: impl Into<String>) -> Self {
		self.variant = Some(variant.into());
		self
	}

	/// Set the optional variant from negotiation output.
	pub fn variant_opt(mut self, variant: Option<String>) -> Self {
		self.variant = variant;
		self
	}

	/// Merge these values into the context last, overriding everything.
	pub fn extra_context(mut self, context: RenderContext) -> Self {
		self.extra_context = context;
		self
	}

	pub fn variant_name(&self) -> Option<&str> {
		self.variant.as_deref()
	}
}

/// A schema-validated record capable of rendering itself to escaped markup.
///
/// Implementations provide their template identity and field values; the
/// provided [`Component::html`] method is the zero-argument auto-render used
/// when one component is embedded inside another's content.
pub trait Component: Send + Sync {
	/// Template lookup identity: leaf name plus ancestor chain.
	fn lineage(&self) -> Lineage;

	/// Declared and computed fields with their current live values.
	fn context(&self) -> Result<RenderContext>;

	/// CSS classes serialized under the fixed `css_classes` context key.
	fn css_classes(&self) -> Option<&CssClasses> {
		None
	}

	/// Extra attributes serialized under the fixed `attributes` context key.
	fn attributes(&self) -> Option<&HtmlAttributes> {
		None
	}

	/// Ad-hoc values carried beyond the declared schema, merged into every
	/// render of this instance.
	fn extra_context(&self) -> Option<&RenderContext> {
		None
	}

	/// Serve a field only reachable through `include`, typically one that
	/// is expensive or backed by external data. Return `None` for unknown
	/// names; return `Some(Err(..))` when the backing data exists but was
	/// never loaded.
	fn supplemental(&self, _field: &str) -> Option<Result<Value>> {
		None
	}

	/// The JSON representation used when a handler result passes through
	/// unrendered.
	fn to_json(&self) -> Result<Value>;

	/// Render with default options. This is the implicit path taken when a
	/// component is embedded in another component's content; parameterized
	/// rendering goes through [`render`] explicitly.
	fn html(&self) -> Result<SafeString> {
		render(self, &RenderOptions::default())
	}
}

/// Render a component to safe markup.
///
/// Pipeline: build the field context (declared fields, then the extras
/// side-map, then `include`d supplemental fields, minus `exclude`), add the
/// fixed keys (`css_classes`, `attributes`, `component`,
/// `template_variant`), layer provider context underneath and
/// `extra_context` on top, then resolve the template through the ancestor
/// chain and invoke the engine.
///
/// # Examples
///
/// ```
/// use hotclub_components::{
///     Component, Environment, Lineage, RenderContext, RenderOptions, render,
/// };
/// use std::sync::Arc;
///
/// struct Greeting {
///     name: String,
/// }
///
/// impl Component for Greeting {
///     fn lineage(&self) -> Lineage {
///         let env =
///             Arc::new(Environment::from_templates(&[("Greeting.html", "hi {{ name }}")]).unwrap());
///         Lineage::new("Greeting", env)
///     }
///
///     fn context(&self) -> hotclub_http::Result<RenderContext> {
///         let mut context = RenderContext::new();
///         context.insert("name", &self.name)?;
///         Ok(context)
///     }
///
///     fn to_json(&self) -> hotclub_http::Result<serde_json::Value> {
///         Ok(serde_json::json!({ "name": self.name }))
///     }
/// }
///
/// let greeting = Greeting { name: "django".into() };
/// let html = render(&greeting, &RenderOptions::default()).unwrap();
/// assert_eq!(html.as_str(), "hi django");
/// ```
pub fn render<C>(component: &C, options: &RenderOptions) -> Result<SafeString>
where
	C: Component + ?Sized,
{
	let lineage = component.lineage();

	let mut fields = component.context()?;
	if let Some(extra) = component.extra_context() {
		fields.merge(extra.clone());
	}

	for field in &options.include {
		match component.supplemental(field) {
			Some(Ok(value)) => fields.insert_json(field.clone(), escape_value(value)),
			Some(Err(err)) => return Err(err),
			None => {
				return Err(Error::UnloadedField {
					component: lineage.leaf_name().to_string(),
					field: field.clone(),
				});
			}
		}
	}

	for field in &options.exclude {
		fields.remove(field);
	}

	let css = component
		.css_classes()
		.map(CssClasses::to_attr)
		.unwrap_or_default();
	fields.insert_safe("css_classes", css);

	let attrs = component
		.attributes()
		.map(HtmlAttributes::to_attr)
		.unwrap_or_default();
	fields.insert_safe("attributes", attrs);

	// Base templates shared through the chain can branch on the concrete
	// subtype and the active variant.
	fields.insert_json("component", Value::String(lineage.leaf_name().to_string()));
	fields.insert_json(
		"template_variant",
		options
			.variant
			.clone()
			.map(|v| Value::String(escape_html(&v)))
			.unwrap_or(Value::Null),
	);

	let mut context = current_context();
	context.merge(fields);
	context.merge(options.extra_context.clone());

	let resolved = lineage.resolve(options.variant_name())?;
	let html = resolved
		.environment
		.render(&resolved.template, &context.to_tera()?)?;
	Ok(SafeString::new(html))
}
