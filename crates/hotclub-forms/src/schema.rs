//! Declarative form schemas.
//!
//! A [`FormSchema`] is an ordered list of [`FieldSpec`]s, each naming an
//! input widget and its attributes. Schemas never persist; they compile to a
//! component tree on demand and drive typed binding of submitted bodies.

use std::collections::BTreeSet;

use hotclub_components::HttpMethod;
use hotclub_http::{Error, Result};
use serde::de::DeserializeOwned;

use crate::binding::bind_schema;
use crate::widgets::Form;

/// The input widget backing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
	Text,
	Email,
	Password,
	Hidden,
	Checkbox,
	Radio,
	Select,
	Submit,
	Reset,
}

impl InputKind {
	/// The `type` attribute value emitted into markup.
	pub fn as_str(&self) -> &'static str {
		match self {
			InputKind::Text => "text",
			InputKind::Email => "email",
			InputKind::Password => "password",
			InputKind::Hidden => "hidden",
			InputKind::Checkbox => "checkbox",
			InputKind::Radio => "radio",
			InputKind::Select => "select",
			InputKind::Submit => "submit",
			InputKind::Reset => "reset",
		}
	}

	/// The component name used for template lookup; kinds without a
	/// dedicated template fall back to the shared `FormInput` base.
	pub fn component_name(&self) -> &'static str {
		match self {
			InputKind::Text => "TextInput",
			InputKind::Email => "EmailInput",
			InputKind::Password => "PasswordInput",
			InputKind::Hidden => "HiddenInput",
			InputKind::Checkbox => "CheckboxInput",
			InputKind::Radio => "RadioInput",
			InputKind::Select => "SelectInput",
			InputKind::Submit => "SubmitInput",
			InputKind::Reset => "ResetInput",
		}
	}

	/// Whether this kind carries an option list.
	pub fn is_choice(&self) -> bool {
		matches!(self, InputKind::Select | InputKind::Radio)
	}

	/// Whether this kind submits data (submit/reset controls do not).
	pub fn submits_data(&self) -> bool {
		!matches!(self, InputKind::Submit | InputKind::Reset)
	}
}

/// One choice in a select or radio group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputOption {
	pub value: String,
	pub label: String,
}

impl InputOption {
	pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
		Self {
			value: value.into(),
			label: label.into(),
		}
	}
}

/// One field of a form: a name, a widget kind and the widget's attributes.
///
/// Choice invariants hold from construction on: only choice kinds accept
/// options, the selected value must be one of them, and disabled values must
/// be a subset of them.
///
/// # Examples
///
/// ```
/// use hotclub_forms::{FieldSpec, InputKind, InputOption};
///
/// let status = FieldSpec::new("status", InputKind::Select)
/// 	.with_label("Status")
/// 	.with_options(vec![
/// 		InputOption::new("active", "Active"),
/// 		InputOption::new("done", "Done"),
/// 	])
/// 	.unwrap()
/// 	.with_selected("active")
/// 	.unwrap();
/// assert_eq!(status.name(), "status");
/// assert!(status.required());
/// ```
#[derive(Debug, Clone)]
pub struct FieldSpec {
	name: String,
	kind: InputKind,
	label: Option<String>,
	value: Option<String>,
	required: bool,
	options: Vec<InputOption>,
	selected: Option<String>,
	disabled: BTreeSet<String>,
}

impl FieldSpec {
	pub fn new(name: impl Into<String>, kind: InputKind) -> Self {
		Self {
			name: name.into(),
			kind,
			label: None,
			value: None,
			required: true,
			options: Vec::new(),
			selected: None,
			disabled: BTreeSet::new(),
		}
	}

	/// The trailing submit control appended to every compiled form.
	pub(crate) fn submit() -> Self {
		Self::new("submit", InputKind::Submit).optional()
	}

	/// Set the visible label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = Some(label.into());
		self
	}

	/// Set the pre-filled value (hidden inputs usually need one).
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	/// Mark the field as optional; fields are required by default.
	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	/// Attach the choice list. Fails for kinds that take no options.
	pub fn with_options(mut self, options: Vec<InputOption>) -> Result<Self> {
		if !self.kind.is_choice() {
			return Err(Error::Internal(format!(
				"field '{}' has kind '{}' which takes no options",
				self.name,
				self.kind.as_str()
			)));
		}
		self.options = options;
		Ok(self)
	}

	/// Pre-select one of the attached options.
	pub fn with_selected(mut self, value: impl Into<String>) -> Result<Self> {
		let value = value.into();
		if !self.options.iter().any(|option| option.value == value) {
			return Err(Error::Internal(format!(
				"selected value '{}' is not an option of field '{}'",
				value, self.name
			)));
		}
		self.selected = Some(value);
		Ok(self)
	}

	/// Disable one of the attached options.
	pub fn with_disabled(mut self, value: impl Into<String>) -> Result<Self> {
		let value = value.into();
		if !self.options.iter().any(|option| option.value == value) {
			return Err(Error::Internal(format!(
				"disabled value '{}' is not an option of field '{}'",
				value, self.name
			)));
		}
		self.disabled.insert(value);
		Ok(self)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> InputKind {
		self.kind
	}

	pub fn label(&self) -> Option<&str> {
		self.label.as_deref()
	}

	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	pub fn required(&self) -> bool {
		self.required
	}

	pub fn options(&self) -> &[InputOption] {
		&self.options
	}

	pub fn selected(&self) -> Option<&str> {
		self.selected.as_deref()
	}

	pub fn is_disabled(&self, value: &str) -> bool {
		self.disabled.contains(value)
	}
}

/// An ordered, uniquely named collection of fields.
#[derive(Debug, Clone, Default)]
pub struct FormSchema {
	fields: Vec<FieldSpec>,
}

impl FormSchema {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a field; names must be unique within the schema.
	pub fn with_field(mut self, field: FieldSpec) -> Result<Self> {
		if self.fields.iter().any(|f| f.name == field.name) {
			return Err(Error::Internal(format!(
				"form schema already has a field named '{}'",
				field.name
			)));
		}
		self.fields.push(field);
		Ok(self)
	}

	pub fn fields(&self) -> &[FieldSpec] {
		&self.fields
	}

	pub fn field(&self, name: &str) -> Option<&FieldSpec> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// Compile to a renderable form: one widget per field interleaved with
	/// line breaks, a submit control at the end.
	pub fn compile(&self, route: impl Into<String>, verb: HttpMethod, id: Option<&str>) -> Form {
		Form::from_schema(self, route, verb, id)
	}

	/// Bind an url-encoded body against this schema and deserialize it.
	///
	/// All per-field violations are collected into one validation error:
	/// required fields must be present and non-empty, choice fields must
	/// submit an enabled option, checkboxes map presence to `true`.
	pub fn bind<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
		bind_schema(self, body)
	}
}
