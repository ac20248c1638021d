//! Form components.
//!
//! [`InputWidget`] renders one [`FieldSpec`]; most kinds share the
//! `FormInput` base template through the ancestor chain, while select and
//! radio widgets carry their own templates for the option loop. [`Form`]
//! wraps a widget sequence in an htmx-submitting `<form>`.

use std::sync::Arc;

use hotclub_components::{
	AttrValue, Component, Content, CssClasses, Environment, HtmlAttributes, HttpMethod, Lineage,
	RenderContext, SafeString,
};
use hotclub_http::Result;
use once_cell::sync::Lazy;
use serde_json::{Value, json};

use crate::schema::{FieldSpec, FormSchema};

static FORMS_ENV: Lazy<Arc<Environment>> = Lazy::new(|| {
	Arc::new(
		Environment::from_templates(&[
			("Form.html", include_str!("../templates/Form.html")),
			("FormInput.html", include_str!("../templates/FormInput.html")),
			("SelectInput.html", include_str!("../templates/SelectInput.html")),
			("RadioInput.html", include_str!("../templates/RadioInput.html")),
		])
		.expect("form templates are valid"),
	)
});

/// The environment holding the form templates.
pub fn forms_environment() -> Arc<Environment> {
	FORMS_ENV.clone()
}

/// One rendered input control.
#[derive(Debug, Clone)]
pub struct InputWidget {
	field: FieldSpec,
}

impl InputWidget {
	pub fn new(field: FieldSpec) -> Self {
		Self { field }
	}

	pub fn field(&self) -> &FieldSpec {
		&self.field
	}
}

impl Component for InputWidget {
	fn lineage(&self) -> Lineage {
		let base = Lineage::new("FormInput", forms_environment());
		Lineage::derived(self.field.kind().component_name(), forms_environment(), &base)
	}

	fn context(&self) -> Result<RenderContext> {
		let options: Vec<Value> = self
			.field
			.options()
			.iter()
			.map(|option| {
				json!({
					"value": option.value,
					"label": option.label,
					"selected": self.field.selected() == Some(option.value.as_str()),
					"disabled": self.field.is_disabled(&option.value),
				})
			})
			.collect();

		let mut context = RenderContext::new();
		context.insert("id", &self.field.name())?;
		context.insert("kind", &self.field.kind().as_str())?;
		context.insert("label", &self.field.label())?;
		context.insert("value", &self.field.value())?;
		context.insert("required", &self.field.required())?;
		context.insert("options", &options)?;
		Ok(context)
	}

	fn to_json(&self) -> Result<Value> {
		Ok(json!({
			"name": self.field.name(),
			"kind": self.field.kind().as_str(),
			"label": self.field.label(),
			"required": self.field.required(),
		}))
	}
}

/// An htmx-submitting `<form>` around a sequence of widgets.
#[derive(Clone)]
pub struct Form {
	id: Option<String>,
	route: String,
	verb: HttpMethod,
	items: Vec<Content>,
	css: CssClasses,
	attrs: HtmlAttributes,
}

impl Form {
	/// A form posting to `route`; the verb defaults to POST.
	pub fn new(route: impl Into<String>, items: Vec<Content>) -> Self {
		Self {
			id: None,
			route: route.into(),
			verb: HttpMethod::Post,
			items,
			css: CssClasses::new(),
			attrs: HtmlAttributes::new(),
		}
	}

	/// Build from a schema: widget-break pairs, then a submit control.
	pub fn from_schema(
		schema: &FormSchema,
		route: impl Into<String>,
		verb: HttpMethod,
		id: Option<&str>,
	) -> Self {
		let mut items = Vec::with_capacity(schema.fields().len() * 2 + 1);
		for field in schema.fields() {
			items.push(Content::child(InputWidget::new(field.clone())));
			items.push(Content::child(hotclub_components::Break));
		}
		items.push(Content::child(InputWidget::new(FieldSpec::submit())));

		let mut form = Form::new(route, items).with_verb(verb);
		form.id = id.map(str::to_string);
		form
	}

	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn with_verb(mut self, verb: HttpMethod) -> Self {
		self.verb = verb;
		self
	}

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

	pub fn push(&mut self, item: impl Into<Content>) {
		self.items.push(item.into());
	}
}

impl Component for Form {
	fn lineage(&self) -> Lineage {
		Lineage::new("Form", forms_environment())
	}

	fn context(&self) -> Result<RenderContext> {
		let mut combined = String::new();
		for item in &self.items {
			combined.push_str(item.render()?.as_str());
		}

		let mut context = RenderContext::new();
		context.insert("id", &self.id)?;
		context.insert("route", &self.route)?;
		context.insert("verb", &self.verb.as_str())?;
		context.insert_safe("items", SafeString::new(combined));
		Ok(context)
	}

	fn css_classes(&self) -> Option<&CssClasses> {
		Some(&self.css)
	}

	fn attributes(&self) -> Option<&HtmlAttributes> {
		Some(&self.attrs)
	}

	fn to_json(&self) -> Result<Value> {
		let items = self
			.items
			.iter()
			.map(Content::to_json)
			.collect::<Result<Vec<_>>>()?;
		Ok(json!({
			"id": self.id,
			"route": self.route,
			"verb": self.verb.as_str(),
			"items": items,
		}))
	}
}
