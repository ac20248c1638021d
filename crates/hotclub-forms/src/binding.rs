//! Typed binding of submitted form bodies.
//!
//! Submissions arrive url-encoded; binding checks them against the schema
//! field by field, collects every violation into one structured validation
//! error, and only then deserializes into the caller's type.

use std::collections::BTreeMap;

use hotclub_http::{Error, ErrorDetail, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::schema::{FieldSpec, FormSchema, InputKind};

pub(crate) fn bind_schema<T: DeserializeOwned>(schema: &FormSchema, body: &str) -> Result<T> {
	let pairs: Vec<(String, String)> =
		serde_urlencoded::from_str(body).map_err(|err| decode_error(err.to_string()))?;

	// Duplicate keys keep the last submitted value.
	let mut submitted = BTreeMap::new();
	for (key, value) in pairs {
		submitted.insert(key, value);
	}

	let mut values = Map::new();
	let mut errors = Vec::new();

	for field in schema.fields() {
		if !field.kind().submits_data() {
			continue;
		}
		let name = field.name();

		match field.kind() {
			// A required checkbox must be ticked; an optional one maps
			// absence to false.
			InputKind::Checkbox => {
				if submitted.contains_key(name) {
					values.insert(name.to_string(), Value::Bool(true));
				} else if field.required() {
					errors.push(missing_error(name));
				} else {
					values.insert(name.to_string(), Value::Bool(false));
				}
			}
			InputKind::Select | InputKind::Radio => match submitted.get(name) {
				Some(value) if is_enabled_option(field, value) => {
					values.insert(name.to_string(), Value::String(value.clone()));
				}
				Some(_) => errors.push(choice_error(field)),
				None if field.required() => errors.push(missing_error(name)),
				None => {}
			},
			_ => match submitted.get(name) {
				// Browsers submit empty strings for blank inputs; for a
				// required field that counts as missing.
				Some(value) if value.is_empty() && field.required() => {
					errors.push(missing_error(name));
				}
				Some(value) => {
					values.insert(name.to_string(), Value::String(value.clone()));
				}
				None if field.required() => errors.push(missing_error(name)),
				None => {}
			},
		}
	}

	if !errors.is_empty() {
		return Err(Error::Validation(errors));
	}

	serde_json::from_value(Value::Object(values)).map_err(|err| decode_error(err.to_string()))
}

fn is_enabled_option(field: &FieldSpec, value: &str) -> bool {
	field.options().iter().any(|option| option.value == value) && !field.is_disabled(value)
}

fn missing_error(name: &str) -> ErrorDetail {
	ErrorDetail::new(["body", name], "Field required", "missing")
}

fn choice_error(field: &FieldSpec) -> ErrorDetail {
	let allowed: Vec<&str> = field
		.options()
		.iter()
		.filter(|option| !field.is_disabled(&option.value))
		.map(|option| option.value.as_str())
		.collect();
	ErrorDetail::new(
		["body", field.name()],
		format!("Input should be one of: {}", allowed.join(", ")),
		"enum",
	)
}

fn decode_error(msg: String) -> Error {
	Error::Validation(vec![ErrorDetail::new(["body"], msg, "value_error")])
}
