//! Content negotiation and view dispatch for hotclub.
//!
//! One handler, two audiences: a view returns typed values and this crate
//! decides, per request, whether they leave as rendered HTML fragments or
//! as JSON. Classification runs once per request and drives the success
//! path ([`ComponentView`]) and the error path ([`ErrorMapper`]) alike, so
//! a client never gets markup on success and JSON on failure.
//!
//! Streaming views emit server-sent events for hypermedia clients and
//! line-delimited JSON for API clients, framed by [`EventStream`].

mod errors;
mod negotiate;
mod sse;
mod view;

pub use errors::{
	ERROR_CONTAINER_SELECTOR, ErrorMapper, clear_error_environment, map_error,
	set_error_environment, status_text,
};
pub use negotiate::{FRAGMENT_HEADER, Negotiation, RenderMode, VARIANT_HEADER};
pub use sse::{EVENT_STREAM_MEDIA_TYPE, EventStream};
pub use view::{
	BlockingHandler, ComponentView, FixedTemplate, ViewOptions, ViewResult, ViewStream, ViewValue,
	Wrapper,
};
