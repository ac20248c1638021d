//! Form flow integration tests
//!
//! Cover the schema round trip: compile to markup, serve through
//! dispatch, bind the submission, and re-render the outcome.

use std::sync::Arc;

use hotclub::HttpMethod;
use hotclub::prelude::*;
use hotclub_integration_tests::{api_request, body_text, fragment_request};
use http::{Method, StatusCode};

#[derive(Debug, Deserialize)]
struct Signup {
	email: String,
}

fn signup_schema() -> FormSchema {
	FormSchema::new()
		.with_field(FieldSpec::new("email", InputKind::Email).with_label("Email"))
		.unwrap()
}

fn post_request(body: &str) -> Request {
	Request::builder()
		.method(Method::POST)
		.uri("/signup")
		.header("hx-request", "true")
		.body(body.to_string())
		.build()
		.unwrap()
}

/// A schema compiles to a complete htmx form: labelled widgets separated
/// by breaks, then the submit control.
#[test]
fn test_schema_compiles_to_exact_form_markup() {
	let form = signup_schema().compile("/signup", HttpMethod::Post, Some("signup-form"));

	let html = render(&form, &RenderOptions::default()).unwrap();

	assert_eq!(
		html.as_str(),
		"<form hx-post=\"/signup\" id=\"signup-form\">\
		 <label for=\"email\">Email</label>\
		 <input type=\"email\" id=\"email\" name=\"email\" required>\
		 <br><input type=\"submit\" id=\"submit\" name=\"submit\"></form>"
	);
}

/// A compiled form is a component like any other: markup for htmx,
/// structure for the API.
#[tokio::test]
async fn test_form_dispatches_as_html_and_json() {
	let view = ComponentView::new(|_request| async {
		let form = signup_schema().compile("/signup", HttpMethod::Post, Some("signup-form"));
		Ok(ViewResult::component(form))
	});

	let html = view.handle(fragment_request()).await.unwrap();
	assert!(body_text(&html).starts_with("<form hx-post=\"/signup\" id=\"signup-form\">"));

	let json = view.handle(api_request()).await.unwrap();
	let body: serde_json::Value = serde_json::from_slice(&json.body).unwrap();
	assert_eq!(body["route"], "/signup");
	assert_eq!(body["verb"], "post");
	assert_eq!(body["items"][0]["name"], "email");
}

/// One handler carries the whole signup flow: render the form, reject a
/// bad submission with field errors, accept a good one.
#[tokio::test]
async fn test_signup_flow_round_trip() {
	let view = ComponentView::new(|request: Request| async move {
		let schema = signup_schema();
		if request.method == Method::GET {
			let form = schema.compile("/signup", HttpMethod::Post, Some("signup-form"));
			return Ok(ViewResult::component(form));
		}
		let body = String::from_utf8_lossy(&request.body).into_owned();
		let signup: Signup = schema.bind(&body)?;
		Ok(ViewResult::fragment(format!("<p>welcome {}</p>", signup.email)))
	});
	let chain =
		MiddlewareChain::new(Arc::new(view)).with_middleware(Arc::new(ErrorMapper::new()));

	let blank_form = chain.handle(fragment_request()).await.unwrap();
	assert_eq!(blank_form.status, StatusCode::OK);
	assert!(body_text(&blank_form).contains("name=\"email\""));

	let rejected = chain.handle(post_request("email=")).await.unwrap();
	assert_eq!(rejected.status, StatusCode::UNPROCESSABLE_ENTITY);
	assert!(body_text(&rejected).contains("<li>body.email: Field required</li>"));
	assert_eq!(
		rejected.headers.get("hx-retarget").unwrap(),
		"closest .hotclub-error-container"
	);

	let accepted = chain
		.handle(post_request("email=dizzy%40example.com"))
		.await
		.unwrap();
	assert_eq!(accepted.status, StatusCode::OK);
	assert_eq!(body_text(&accepted), "<p>welcome dizzy@example.com</p>");
}
