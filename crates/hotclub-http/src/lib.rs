//! HTTP primitives shared by the hotclub crates.
//!
//! This crate owns the request/response representation the rest of the
//! workspace glues onto, the [`Handler`]/[`Middleware`] traits that form the
//! processing pipeline, and the [`Error`] taxonomy every other crate
//! propagates. Nothing here binds to a server; the types are designed to be
//! adapted onto whatever transport hosts the application.

mod error;
mod handler;
mod request;
mod response;

pub use error::{Error, ErrorDetail, HttpError, Result};
pub use handler::{Handler, Middleware, MiddlewareChain};
pub use request::{Request, RequestBuilder};
pub use response::{Response, StreamBody, StreamingResponse};
