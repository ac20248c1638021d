use async_trait::async_trait;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Core request-processing abstraction: everything that can turn a request
/// into a response implements this.
#[async_trait]
pub trait Handler: Send + Sync {
	async fn handle(&self, request: Request) -> Result<Response>;
}

/// Blanket implementation for `Arc<T>` so `Arc<dyn Handler>` is itself a
/// Handler.
#[async_trait]
impl<T: Handler + ?Sized> Handler for Arc<T> {
	async fn handle(&self, request: Request) -> Result<Response> {
		(**self).handle(request).await
	}
}

/// Request/response processing layered around a handler. Middleware receive
/// the request plus the next handler in the chain and decide whether and how
/// to forward.
#[async_trait]
pub trait Middleware: Send + Sync {
	async fn process(&self, request: Request, next: Arc<dyn Handler>) -> Result<Response>;
}

/// Composes middleware around a terminal handler. Middleware run in the
/// order they were added, each wrapping everything after it.
///
/// # Examples
///
/// ```no_run
/// use hotclub_http::{Handler, Middleware, MiddlewareChain, Request, Response};
/// use std::sync::Arc;
/// use async_trait::async_trait;
///
/// struct Inner;
///
/// #[async_trait]
/// impl Handler for Inner {
///     async fn handle(&self, _request: Request) -> hotclub_http::Result<Response> {
///         Ok(Response::ok())
///     }
/// }
///
/// struct Passthrough;
///
/// #[async_trait]
/// impl Middleware for Passthrough {
///     async fn process(
///         &self,
///         request: Request,
///         next: Arc<dyn Handler>,
///     ) -> hotclub_http::Result<Response> {
///         next.handle(request).await
///     }
/// }
///
/// let chain = MiddlewareChain::new(Arc::new(Inner)).with_middleware(Arc::new(Passthrough));
/// ```
pub struct MiddlewareChain {
	middlewares: Vec<Arc<dyn Middleware>>,
	handler: Arc<dyn Handler>,
}

impl MiddlewareChain {
	/// Create a chain terminating at `handler`.
	pub fn new(handler: Arc<dyn Handler>) -> Self {
		Self {
			middlewares: Vec::new(),
			handler,
		}
	}

	/// Add a middleware, builder style.
	pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
		self.middlewares.push(middleware);
		self
	}

	/// Add a middleware in place.
	pub fn add_middleware(&mut self, middleware: Arc<dyn Middleware>) {
		self.middlewares.push(middleware);
	}
}

#[async_trait]
impl Handler for MiddlewareChain {
	async fn handle(&self, request: Request) -> Result<Response> {
		if self.middlewares.is_empty() {
			return self.handler.handle(request).await;
		}

		// Fold the chain back to front so the first-added middleware sees
		// the request first.
		let mut current: Arc<dyn Handler> = self.handler.clone();
		for middleware in self.middlewares.iter().rev() {
			current = Arc::new(ComposedHandler {
				middleware: middleware.clone(),
				next: current,
			});
		}

		current.handle(request).await
	}
}

struct ComposedHandler {
	middleware: Arc<dyn Middleware>,
	next: Arc<dyn Handler>,
}

#[async_trait]
impl Handler for ComposedHandler {
	async fn handle(&self, request: Request) -> Result<Response> {
		self.middleware.process(request, self.next.clone()).await
	}
}
