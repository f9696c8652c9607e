#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::Value;
// self
use marketplace_gateway::{
	_preludet::*,
	api::{Credentials, LoginOutcome},
	events::SessionEvent,
};

#[tokio::test]
async fn login_with_otp_stores_verified_token() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url());
	let listener = RecordingListener::default();

	gateway.subscribe(listener.clone());

	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.header_missing("authorization")
				.json_body(serde_json::json!({ "email": "buyer@example.com", "password": "hunter2" }));
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"message\":\"OTP sent to your email\"}");
		})
		.await;
	let verify = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/verify-otp")
				.json_body(serde_json::json!({ "email": "buyer@example.com", "otp": "424242" }));
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
				.body("{\"jwtToken\":\"abc123\"}");
		})
		.await;
	let outcome = gateway
		.login(&Credentials::new("buyer@example.com", "hunter2"))
		.await
		.expect("Login should succeed.");

	assert_eq!(
		outcome,
		LoginOutcome::OtpRequired { message: Some("OTP sent to your email".into()) }
	);
	assert_eq!(gateway.access_token(), None);

	let token = gateway.verify_otp("buyer@example.com", "424242").await.expect("OTP should verify.");

	assert_eq!(token.expose(), "abc123");
	assert_eq!(gateway.access_token(), Some(token));
	assert_eq!(listener.events(), vec![SessionEvent::SignedIn]);

	login.assert_async().await;
	verify.assert_async().await;
}

#[tokio::test]
async fn refresh_cookie_authenticates_refresh_endpoint() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "refreshToken=r1; Path=/; HttpOnly")
				.body("{\"jwtToken\":\"abc123\"}");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/refresh")
				.header("cookie", "refreshToken=r1")
				.header_missing("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"jwtToken\":\"xyz789\"}");
		})
		.await;
	let outcome = gateway
		.login(&Credentials::new("seller@example.com", "s3cret"))
		.await
		.expect("Login should succeed.");

	assert_eq!(outcome, LoginOutcome::SignedIn);

	let token = gateway.refresh().await.expect("Refresh should succeed.");

	assert_eq!(token.expose(), "xyz789");
	assert_eq!(gateway.access_token(), Some(token));

	refresh.assert_async().await;
}

#[tokio::test]
async fn rejected_login_is_a_plain_failure() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url());
	let listener = RecordingListener::default();

	gateway.subscribe(listener.clone());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Invalid credentials\"}");
		})
		.await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body("{\"jwtToken\":\"never\"}");
		})
		.await;
	let err = gateway
		.login(&Credentials::new("buyer@example.com", "wrong"))
		.await
		.expect_err("Bad credentials should fail.");

	match err {
		Error::Request(rejection) => {
			assert_eq!(rejection.status, 401);
			assert_eq!(rejection.message, "Invalid credentials");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(listener.events().is_empty());

	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn verify_without_token_reports_missing_token() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url());

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/verify-otp");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;

	let err = gateway
		.verify_otp("buyer@example.com", "000000")
		.await
		.expect_err("A response without jwtToken should fail.");

	assert!(matches!(err, Error::MissingToken { ref path } if path == "/auth/verify-otp"));
	assert_eq!(gateway.access_token(), None);
}

#[tokio::test]
async fn logout_clears_token_even_when_backend_fails() {
	let server = MockServer::start_async().await;
	let gateway = build_reqwest_test_gateway(&server.base_url());
	let listener = RecordingListener::default();

	gateway.subscribe(listener.clone());
	gateway.set_access_token("abc123");

	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout").header("authorization", "Bearer abc123");
			then.status(500).body("upstream unavailable");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(200).body("{\"jwtToken\":\"never\"}");
		})
		.await;
	let err = gateway.logout().await.expect_err("Backend failure should be reported.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(gateway.access_token(), None);
	assert_eq!(listener.events(), vec![SessionEvent::LoggedOut]);

	logout.assert_async().await;
	refresh.assert_calls_async(0).await;

	let product = server
		.mock_async(|when, then| {
			when.method(GET).path("/products/1").header_missing("authorization");
			then.status(200).header("content-type", "application/json").body("{\"id\":1}");
		})
		.await;
	let body: Value = gateway.get("/products/1").await.expect("Anonymous fetch should succeed.");

	assert_eq!(body["id"], 1);

	product.assert_async().await;
}
