//! Declarative forms for hotclub.
//!
//! Describe a form once as a [`FormSchema`], then compile it to a renderable
//! component tree and bind submissions back into typed values. Widgets are
//! ordinary components: most input kinds share one base template through the
//! ancestor chain, and the compiled `<form>` submits through htmx.

mod binding;
pub mod schema;
pub mod widgets;

pub use schema::{FieldSpec, FormSchema, InputKind, InputOption};
pub use widgets::{Form, InputWidget, forms_environment};
