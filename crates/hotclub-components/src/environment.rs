//! Template environment wrapper.
//!
//! The engine itself is a black box behind this type: the rest of the crate
//! only ever asks "do you have this template" and "render it with this
//! context". Environments are immutable once built and shared via `Arc`.

use std::path::Path;

use hotclub_http::{Error, Result};
use tera::Tera;

/// A set of compiled templates with one search namespace.
///
/// Auto-escaping is disabled on construction: escaping happens while the
/// render context is built (plain strings are escaped there, pre-rendered
/// markup is inserted verbatim), so templates interpolate values as-is.
#[derive(Debug)]
pub struct Environment {
	tera: Tera,
}

impl Environment {
	/// Load every `.html` file under `dir` (recursively).
	///
	/// Template names are paths relative to `dir`, e.g. `Task.html` or
	/// `errors/HttpError.html`.
	pub fn from_directory(dir: impl AsRef<Path>) -> Result<Self> {
		let glob = format!("{}/**/*.html", dir.as_ref().display());
		let tera = Tera::new(&glob).map_err(to_template_error)?;
		Ok(Self::wrap(tera))
	}

	/// Build an environment from in-memory `(name, source)` pairs.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_components::Environment;
	///
	/// let env = Environment::from_templates(&[("Task.html", "{{ title }}")]).unwrap();
	/// assert!(env.has_template("Task.html"));
	/// assert!(!env.has_template("Other.html"));
	/// ```
	pub fn from_templates(templates: &[(&str, &str)]) -> Result<Self> {
		let mut tera = Tera::default();
		tera.add_raw_templates(templates.to_vec())
			.map_err(to_template_error)?;
		Ok(Self::wrap(tera))
	}

	fn wrap(mut tera: Tera) -> Self {
		tera.autoescape_on(vec![]);
		Self { tera }
	}

	/// Whether a template with exactly this name exists.
	pub fn has_template(&self, name: &str) -> bool {
		self.tera.get_template_names().any(|n| n == name)
	}

	/// Names of all templates in this environment, sorted.
	pub fn template_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.tera.get_template_names().collect();
		names.sort_unstable();
		names
	}

	/// Render `name` with the given context. The template must exist;
	/// resolution decides that before calling in here.
	pub fn render(&self, name: &str, context: &tera::Context) -> Result<String> {
		self.tera.render(name, context).map_err(to_template_error)
	}

	/// Register a named filter usable from templates in this environment.
	/// Must happen before the environment is shared.
	pub fn register_filter<F>(&mut self, name: &str, filter: F)
	where
		F: tera::Filter + 'static,
	{
		self.tera.register_filter(name, filter);
	}
}

// Tera's Display only covers the outermost layer; walk the source chain so
// a syntax error inside a template names the actual problem.
pub(crate) fn to_template_error(err: tera::Error) -> Error {
	let mut message = err.to_string();
	let mut source = std::error::Error::source(&err);
	while let Some(cause) = source {
		message.push_str(": ");
		message.push_str(&cause.to_string());
		source = cause.source();
	}
	Error::Template(message)
}
