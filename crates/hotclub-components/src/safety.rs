//! Attribute and CSS-class safety model.
//!
//! Dynamically constructed markup fragments (attribute maps, class sets) are
//! validated at construction time against a character allow-list, so an
//! invalid component can never reach a client. Serialized forms are
//! [`SafeString`]s: the render pipeline inserts them verbatim instead of
//! escaping them a second time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use hotclub_http::{Error, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Markup that is already escaped or otherwise known-safe. Values of this
/// type are inserted into render contexts without further escaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeString(String);

impl SafeString {
	/// Wrap a string the caller asserts is safe to emit as-is.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn into_inner(self) -> String {
		self.0
	}
}

impl fmt::Display for SafeString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for SafeString {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<SafeString> for String {
	fn from(safe: SafeString) -> Self {
		safe.0
	}
}

/// Escape the five HTML metacharacters. Everything the render pipeline
/// receives as plain text goes through here exactly once.
///
/// # Examples
///
/// ```
/// use hotclub_components::escape_html;
///
/// assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#x27;");
/// assert_eq!(escape_html("plain"), "plain");
/// ```
pub fn escape_html(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

// Printable ASCII minus space, quotes, backtick, angle brackets, slash and
// equals. Anything outside this set can break out of an attribute position.
fn is_allowed_char(c: char) -> bool {
	c.is_ascii_graphic() && !matches!(c, '"' | '\'' | '`' | '<' | '>' | '/' | '=')
}

fn validate_token(what: &str, value: &str) -> Result<()> {
	if value.is_empty() {
		return Err(Error::UnsafeContent(format!("{what} must not be empty")));
	}
	validate_text(what, value)
}

fn validate_text(what: &str, value: &str) -> Result<()> {
	match value.chars().find(|c| !is_allowed_char(*c)) {
		Some(c) => Err(Error::UnsafeContent(format!(
			"{what} '{value}' contains disallowed character {c:?}"
		))),
		None => Ok(()),
	}
}

/// A validated set of CSS class names.
///
/// Serialization is deterministic: names are emitted sorted and joined by
/// single spaces, so the same set always serializes to the same bytes no
/// matter the insertion order.
///
/// # Examples
///
/// ```
/// use hotclub_components::CssClasses;
///
/// let mut classes = CssClasses::new();
/// classes.insert("card")?;
/// classes.insert("active")?;
/// assert_eq!(classes.to_attr().as_str(), "active card");
///
/// assert!(classes.insert("oops>").is_err());
/// # Ok::<(), hotclub_http::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssClasses {
	names: BTreeSet<String>,
}

impl CssClasses {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a set from an iterator of names, validating each.
	pub fn from_names<I, S>(names: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut classes = Self::new();
		for name in names {
			classes.insert(name)?;
		}
		Ok(classes)
	}

	/// Add one class name. Fails if the name contains a disallowed
	/// character or is empty.
	pub fn insert(&mut self, name: impl Into<String>) -> Result<()> {
		let name = name.into();
		validate_token("css class", &name)?;
		self.names.insert(name);
		Ok(())
	}

	/// Add every name from `names`.
	pub fn extend<I, S>(&mut self, names: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		for name in names {
			self.insert(name)?;
		}
		Ok(())
	}

	/// Union with another validated set. Containers use this to fold their
	/// own classes into children before rendering.
	pub fn merge(&mut self, other: &CssClasses) {
		self.names.extend(other.names.iter().cloned());
	}

	pub fn contains(&self, name: &str) -> bool {
		self.names.contains(name)
	}

	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}

	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Serialize as the value of a `class` attribute.
	pub fn to_attr(&self) -> SafeString {
		let joined = self
			.names
			.iter()
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join(" ");
		SafeString(joined)
	}
}

impl Serialize for CssClasses {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut seq = serializer.serialize_seq(Some(self.names.len()))?;
		for name in &self.names {
			seq.serialize_element(name)?;
		}
		seq.end()
	}
}

/// Value of one HTML attribute: text, or a boolean flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
	Text(String),
	/// `true` renders as the bare key; `false` is omitted entirely.
	Flag(bool),
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::Text(value.to_string())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::Text(value)
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Flag(value)
	}
}

impl Serialize for AttrValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self {
			AttrValue::Text(text) => serializer.serialize_str(text),
			AttrValue::Flag(flag) => serializer.serialize_bool(*flag),
		}
	}
}

/// A validated map of extra HTML attributes.
///
/// Keys and text values are checked against the allow-list at insertion.
/// The key `class` is owned by [`CssClasses`] and rejected here, so the two
/// serialization paths can never fight over one attribute.
///
/// # Examples
///
/// ```
/// use hotclub_components::HtmlAttributes;
///
/// let mut attrs = HtmlAttributes::new();
/// attrs.insert("id", "task-1")?;
/// attrs.insert("disabled", true)?;
/// attrs.insert("hidden", false)?;
/// assert_eq!(attrs.to_attr().as_str(), r#"disabled id="task-1""#);
///
/// assert!(attrs.insert("class", "nope").is_err());
/// # Ok::<(), hotclub_http::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlAttributes {
	entries: BTreeMap<String, AttrValue>,
}

impl HtmlAttributes {
	pub fn new() -> Self {
		Self::default()
	}

	/// Build a map from `(key, value)` pairs, validating each.
	pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<AttrValue>,
	{
		let mut attrs = Self::new();
		for (key, value) in pairs {
			attrs.insert(key, value)?;
		}
		Ok(attrs)
	}

	/// Insert one attribute. The key must be non-empty, within the
	/// allow-list and not `class`; text values must be within the
	/// allow-list (empty text is fine).
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Result<()> {
		let key = key.into();
		validate_token("attribute key", &key)?;
		if key.eq_ignore_ascii_case("class") {
			return Err(Error::UnsafeContent(
				"the 'class' attribute is managed through CssClasses, not the attribute map"
					.to_string(),
			));
		}

		let value = value.into();
		if let AttrValue::Text(text) = &value {
			validate_text(&format!("attribute '{key}' value"), text)?;
		}

		self.entries.insert(key, value);
		Ok(())
	}

	/// Overlay another validated map; `other` wins on key collision.
	pub fn merge(&mut self, other: &HtmlAttributes) {
		for (key, value) in &other.entries {
			self.entries.insert(key.clone(), value.clone());
		}
	}

	pub fn get(&self, key: &str) -> Option<&AttrValue> {
		self.entries.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Serialize as attribute markup: `key="value"` pairs space-joined,
	/// bare keys for true flags, nothing for false flags.
	pub fn to_attr(&self) -> SafeString {
		let mut parts = Vec::with_capacity(self.entries.len());
		for (key, value) in &self.entries {
			match value {
				AttrValue::Text(text) => parts.push(format!("{key}=\"{text}\"")),
				AttrValue::Flag(true) => parts.push(key.clone()),
				AttrValue::Flag(false) => {}
			}
		}
		SafeString(parts.join(" "))
	}
}

impl Serialize for HtmlAttributes {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.entries.len()))?;
		for (key, value) in &self.entries {
			map.serialize_entry(key, value)?;
		}
		map.end()
	}
}
