//! Ancestor-chain template resolution.
//!
//! Every component type carries a [`Lineage`]: an explicit, ordered list of
//! `(name, environment)` bindings, leaf first. Resolution tries each binding
//! in turn with the candidate name derived from the binding and the
//! requested variant, and the first environment that has the candidate
//! wins. A type with no template of its own therefore inherits its
//! ancestor's, and each ancestor may live in a completely different
//! search path.
//!
//! Resolution is deliberately per-call (template sets may be reloaded
//! between requests in development); [`CachedResolver`] is the opt-in
//! memoized variant for deployments where environments never change.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use hotclub_http::{Error, Result};
use parking_lot::RwLock;

use crate::environment::Environment;

/// One entry in an ancestor chain: a lookup name bound to the environment
/// searched for it.
#[derive(Clone)]
pub struct TemplateBinding {
	pub name: Cow<'static, str>,
	pub environment: Arc<Environment>,
}

/// The template lookup identity of a component type. Built once per type
/// (typically behind a `Lazy`) and cloned cheaply per render.
#[derive(Clone)]
pub struct Lineage {
	bindings: Vec<TemplateBinding>,
}

/// Outcome of a successful resolution: the concrete template name and the
/// environment it was found in.
#[derive(Debug)]
pub struct ResolvedTemplate<'a> {
	pub template: String,
	pub environment: &'a Arc<Environment>,
}

impl Lineage {
	/// A chain of one: the type renders through its own template or not at
	/// all.
	pub fn new(name: impl Into<Cow<'static, str>>, environment: Arc<Environment>) -> Self {
		Self {
			bindings: vec![TemplateBinding {
				name: name.into(),
				environment,
			}],
		}
	}

	/// A chain that tries `name` in `environment` first and then falls
	/// back to everything `parent` would try.
	///
	/// # Examples
	///
	/// ```
	/// use hotclub_components::{Environment, Lineage};
	/// use std::sync::Arc;
	///
	/// let base_env = Arc::new(Environment::from_templates(&[("Input.html", "<input>")]).unwrap());
	/// let app_env = Arc::new(Environment::from_templates(&[]).unwrap());
	///
	/// let base = Lineage::new("Input", base_env);
	/// let email = Lineage::derived("EmailInput", app_env, &base);
	///
	/// // EmailInput has no template anywhere, so Input.html is used
	/// let resolved = email.resolve(None).unwrap();
	/// assert_eq!(resolved.template, "Input.html");
	/// ```
	pub fn derived(
		name: impl Into<Cow<'static, str>>,
		environment: Arc<Environment>,
		parent: &Lineage,
	) -> Self {
		let mut bindings = Vec::with_capacity(parent.bindings.len() + 1);
		bindings.push(TemplateBinding {
			name: name.into(),
			environment,
		});
		bindings.extend(parent.bindings.iter().cloned());
		Self { bindings }
	}

	/// Same chain, different leaf lookup name. Supports components that
	/// render under a name other than their own type name.
	pub fn renamed(&self, name: impl Into<Cow<'static, str>>) -> Self {
		let mut lineage = self.clone();
		lineage.bindings[0].name = name.into();
		lineage
	}

	/// The name resolution failures are reported under.
	pub fn leaf_name(&self) -> &str {
		&self.bindings[0].name
	}

	pub fn bindings(&self) -> &[TemplateBinding] {
		&self.bindings
	}

	fn candidate(name: &str, variant: Option<&str>) -> String {
		match variant {
			Some(variant) => format!("{name}.{variant}.html"),
			None => format!("{name}.html"),
		}
	}

	fn locate(&self, variant: Option<&str>) -> Result<usize> {
		for (index, binding) in self.bindings.iter().enumerate() {
			let candidate = Self::candidate(&binding.name, variant);
			if binding.environment.has_template(&candidate) {
				tracing::debug!(
					component = self.leaf_name(),
					template = %candidate,
					depth = index,
					"resolved template"
				);
				return Ok(index);
			}
		}

		Err(Error::TemplateNotFound {
			component: self.leaf_name().to_string(),
			variant: variant.map(str::to_string),
		})
	}

	fn resolved_at(&self, index: usize, variant: Option<&str>) -> ResolvedTemplate<'_> {
		let binding = &self.bindings[index];
		ResolvedTemplate {
			template: Self::candidate(&binding.name, variant),
			environment: &binding.environment,
		}
	}

	/// Walk the chain for `"{name}.{variant}.html"` (or `"{name}.html"`
	/// without a variant). Exhausting the chain reports the leaf name,
	/// never an ancestor's.
	pub fn resolve(&self, variant: Option<&str>) -> Result<ResolvedTemplate<'_>> {
		let index = self.locate(variant)?;
		Ok(self.resolved_at(index, variant))
	}
}

/// Memoizing wrapper around [`Lineage::resolve`].
///
/// Caches which chain entry satisfied a `(leaf name, variant)` pair. Only
/// correct while the underlying environments are not reloaded, which is why
/// it is opt-in rather than the default.
#[derive(Default)]
pub struct CachedResolver {
	entries: RwLock<HashMap<(String, Option<String>), usize>>,
}

impl CachedResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Resolve through the cache, falling back to a full walk on miss.
	pub fn resolve<'a>(
		&self,
		lineage: &'a Lineage,
		variant: Option<&str>,
	) -> Result<ResolvedTemplate<'a>> {
		let key = (
			lineage.leaf_name().to_string(),
			variant.map(str::to_string),
		);

		if let Some(&index) = self.entries.read().get(&key)
			&& index < lineage.bindings().len()
		{
			return Ok(lineage.resolved_at(index, variant));
		}

		let index = lineage.locate(variant)?;
		self.entries.write().insert(key, index);
		Ok(lineage.resolved_at(index, variant))
	}

	/// Forget everything, e.g. after swapping template directories.
	pub fn clear(&self) {
		self.entries.write().clear();
	}
}
