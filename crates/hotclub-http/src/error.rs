use http::StatusCode;
use serde::Serialize;

/// Result alias used across the hotclub crates.
pub type Result<T> = std::result::Result<T, Error>;

/// One structured violation captured while binding or validating submitted
/// data. Serializes as `{"loc": [...], "msg": "...", "type": "..."}`, the
/// shape clients of the JSON surface already understand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
	/// Path to the offending value, e.g. `["body", "email"]`.
	pub loc: Vec<String>,
	/// Human-readable message.
	pub msg: String,
	/// Machine-readable violation kind, e.g. `"missing"`.
	#[serde(rename = "type")]
	pub kind: String,
}

impl ErrorDetail {
	/// Create a new detail record.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::ErrorDetail;
	///
	/// let detail = ErrorDetail::new(["body", "email"], "field required", "missing");
	/// assert_eq!(detail.loc, vec!["body", "email"]);
	/// assert_eq!(detail.kind, "missing");
	/// ```
	pub fn new<L, S>(loc: L, msg: impl Into<String>, kind: impl Into<String>) -> Self
	where
		L: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			loc: loc.into_iter().map(Into::into).collect(),
			msg: msg.into(),
			kind: kind.into(),
		}
	}
}

/// An HTTP-level failure with an explicit status code and client-facing
/// detail message.
///
/// Beyond status and detail, an error may carry presentation hints consumed
/// by the error mapper when the client wants HTML: an alternate template
/// lookup key, and re-targeting directives telling a fragment-swapping
/// frontend where to place the rendered error and how to splice it in.
///
/// # Examples
///
/// ```
/// use hotclub_http::HttpError;
/// use http::StatusCode;
///
/// let error = HttpError::new(StatusCode::NOT_FOUND, "Item not found")
///     .with_retarget("#detail-pane")
///     .with_reswap("innerHTML");
/// assert_eq!(error.status, StatusCode::NOT_FOUND);
/// assert_eq!(error.retarget.as_deref(), Some("#detail-pane"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpError {
	pub status: StatusCode,
	pub detail: String,
	/// Template lookup key override; defaults to the error kind name.
	pub template: Option<String>,
	/// CSS selector naming where the rendered error fragment belongs.
	pub retarget: Option<String>,
	/// Swap strategy for splicing the fragment in (e.g. `outerHTML`).
	pub reswap: Option<String>,
}

impl HttpError {
	/// Create an error with the given status and detail.
	pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
		Self {
			status,
			detail: detail.into(),
			template: None,
			retarget: None,
			reswap: None,
		}
	}

	/// Use a custom template lookup key instead of the default.
	pub fn with_template(mut self, name: impl Into<String>) -> Self {
		self.template = Some(name.into());
		self
	}

	/// Direct the rendered fragment at the element matching `selector`.
	pub fn with_retarget(mut self, selector: impl Into<String>) -> Self {
		self.retarget = Some(selector.into());
		self
	}

	/// Set the swap strategy used when the fragment is spliced in.
	pub fn with_reswap(mut self, strategy: impl Into<String>) -> Self {
		self.reswap = Some(strategy.into());
		self
	}
}

impl std::fmt::Display for HttpError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.detail)
	}
}

fn template_not_found_message(component: &str, variant: &Option<String>) -> String {
	match variant {
		Some(v) => format!("no template found for component '{component}' with variant '{v}'"),
		None => format!("no template found for component '{component}'"),
	}
}

/// Error taxonomy shared by every hotclub crate.
///
/// [`Error::Http`] and [`Error::Validation`] are expected client-facing
/// conditions with dedicated response shapes; the remaining variants are
/// programmer errors surfaced as 500s with full diagnostic context and are
/// never retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Explicit status + detail raised by handler code.
	#[error("{0}")]
	Http(HttpError),

	/// Submitted data was rejected; one entry per violation.
	#[error("validation failed with {} error(s)", .0.len())]
	Validation(Vec<ErrorDetail>),

	/// Template resolution exhausted the component's ancestor chain.
	/// Always names the original (leaf) component, never an ancestor.
	#[error("{}", template_not_found_message(.component, .variant))]
	TemplateNotFound {
		component: String,
		variant: Option<String>,
	},

	/// An attribute key/value or CSS class contained a character outside
	/// the allowed set. Raised at construction time, never at render time.
	#[error("unsafe content: {0}")]
	UnsafeContent(String),

	/// The handler returned a shape the dispatcher cannot map to a
	/// response.
	#[error("response is not renderable: {0}")]
	NotRenderable(String),

	/// A field named by `include` is backed by external data that was
	/// never loaded.
	#[error(
		"field '{field}' on component '{component}' is not loaded; \
		 fetch it eagerly or leave it out of include"
	)]
	UnloadedField { component: String, field: String },

	/// The template engine failed while rendering a resolved template.
	#[error("template error: {0}")]
	Template(String),

	#[error("serialization error: {0}")]
	Serialization(String),

	#[error("{0}")]
	Internal(String),
}

impl Error {
	/// Shorthand for an [`Error::Http`] without presentation hints.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::Error;
	/// use http::StatusCode;
	///
	/// let error = Error::http(StatusCode::NOT_FOUND, "Item not found");
	/// assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
	/// assert_eq!(error.to_string(), "Item not found");
	/// ```
	pub fn http(status: StatusCode, detail: impl Into<String>) -> Self {
		Error::Http(HttpError::new(status, detail))
	}

	/// The response status this error maps to.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_http::{Error, ErrorDetail};
	/// use http::StatusCode;
	///
	/// let details = vec![ErrorDetail::new(["body", "name"], "field required", "missing")];
	/// assert_eq!(Error::Validation(details).status_code(), StatusCode::UNPROCESSABLE_ENTITY);
	/// assert_eq!(
	///     Error::Internal("broken".into()).status_code(),
	///     StatusCode::INTERNAL_SERVER_ERROR,
	/// );
	/// ```
	pub fn status_code(&self) -> StatusCode {
		match self {
			Error::Http(http_error) => http_error.status,
			Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Serialization(err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_detail_serializes_with_type_key() {
		let detail = ErrorDetail::new(["body", "email"], "field required", "missing");
		let json = serde_json::to_value(&detail).unwrap();

		assert_eq!(json["loc"], serde_json::json!(["body", "email"]));
		assert_eq!(json["msg"], "field required");
		assert_eq!(json["type"], "missing");
	}

	#[test]
	fn test_http_error_display_is_detail() {
		let error = Error::http(StatusCode::NOT_FOUND, "Item not found");
		assert_eq!(error.to_string(), "Item not found");
	}

	#[test]
	fn test_template_not_found_names_variant_when_present() {
		let error = Error::TemplateNotFound {
			component: "Task".to_string(),
			variant: Some("table".to_string()),
		};
		assert_eq!(
			error.to_string(),
			"no template found for component 'Task' with variant 'table'"
		);

		let without = Error::TemplateNotFound {
			component: "Task".to_string(),
			variant: None,
		};
		assert_eq!(without.to_string(), "no template found for component 'Task'");
	}

	#[test]
	fn test_status_codes() {
		assert_eq!(
			Error::http(StatusCode::CONFLICT, "busy").status_code(),
			StatusCode::CONFLICT
		);
		assert_eq!(
			Error::Validation(vec![]).status_code(),
			StatusCode::UNPROCESSABLE_ENTITY
		);
		assert_eq!(
			Error::UnsafeContent("bad".into()).status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
		assert_eq!(
			Error::TemplateNotFound {
				component: "X".into(),
				variant: None
			}
			.status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn test_http_error_builders() {
		let error = HttpError::new(StatusCode::BAD_REQUEST, "nope")
			.with_template("FormError")
			.with_retarget("closest form")
			.with_reswap("outerHTML");

		assert_eq!(error.template.as_deref(), Some("FormError"));
		assert_eq!(error.retarget.as_deref(), Some("closest form"));
		assert_eq!(error.reswap.as_deref(), Some("outerHTML"));
	}
}
