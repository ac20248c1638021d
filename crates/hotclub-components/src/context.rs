//! Ambient render context.
//!
//! Applications register a provider that contributes request-scoped values
//! (the authenticated user, a CSRF token, asset URLs) to every render
//! without threading them through each call site. Providers layer underneath
//! component fields, so a component key always wins a collision.

use std::future::Future;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::component::RenderContext;

/// Produces the ambient context for one render call.
///
/// Called once per render, so values are live rather than captured at
/// registration time.
pub type ContextProvider = Arc<dyn Fn() -> RenderContext + Send + Sync>;

static GLOBAL_PROVIDER: Lazy<RwLock<Option<ContextProvider>>> = Lazy::new(|| RwLock::new(None));

tokio::task_local! {
	static SCOPED_PROVIDER: ContextProvider;
}

/// Register the process-wide fallback provider.
///
/// # Examples
///
/// ```
/// use hotclub_components::{RenderContext, clear_global_provider, current_context, set_global_provider};
///
/// set_global_provider(|| {
/// 	let mut context = RenderContext::new();
/// 	context.insert("site_name", &"hotclub").unwrap();
/// 	context
/// });
/// assert_eq!(current_context().get("site_name").unwrap(), "hotclub");
///
/// clear_global_provider();
/// assert!(current_context().is_empty());
/// ```
pub fn set_global_provider(provider: impl Fn() -> RenderContext + Send + Sync + 'static) {
	*GLOBAL_PROVIDER.write() = Some(Arc::new(provider));
}

/// Remove the process-wide provider.
pub fn clear_global_provider() {
	*GLOBAL_PROVIDER.write() = None;
}

/// Run `future` with `provider` as the ambient context source.
///
/// The provider is task-local: concurrent requests each see their own, and
/// it shadows the global provider for the duration of the future.
pub async fn with_provider<F>(
	provider: impl Fn() -> RenderContext + Send + Sync + 'static,
	future: F,
) -> F::Output
where
	F: Future,
{
	SCOPED_PROVIDER.scope(Arc::new(provider), future).await
}

/// The ambient context for the current call: the task-scoped provider if one
/// is active, else the global provider, else empty.
pub fn current_context() -> RenderContext {
	if let Ok(provider) = SCOPED_PROVIDER.try_with(Clone::clone) {
		return provider();
	}
	// Clone out of the lock before invoking; a provider that re-registers
	// itself must not deadlock.
	let global = GLOBAL_PROVIDER.read().clone();
	match global {
		Some(provider) => provider(),
		None => RenderContext::new(),
	}
}
