// std
use std::{collections::VecDeque, sync::Arc};
// crates.io
use http::{StatusCode, header::AUTHORIZATION};
use parking_lot::Mutex;
use tokio::sync::Barrier;
// self
use marketplace_gateway::{
	config::GatewayConfig,
	error::{AuthExpiredError, Error, RefreshError, TransportError},
	events::{SessionEvent, SessionListener},
	gateway::Gateway,
	transport::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
	url::Url,
};

#[derive(Debug)]
struct ConnectionReset;
impl std::fmt::Display for ConnectionReset {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		write!(f, "Connection reset by peer.")
	}
}
impl std::error::Error for ConnectionReset {}

enum Step {
	Respond(StatusCode, &'static str),
	Fail,
}

/// Transport replaying a scripted sequence of outcomes and recording every request.
#[derive(Default)]
struct ScriptedTransport {
	script: Mutex<VecDeque<Step>>,
	seen: Mutex<Vec<TransportRequest>>,
	gate: Option<Arc<Barrier>>,
}
impl ScriptedTransport {
	fn new(steps: impl IntoIterator<Item = Step>) -> Self {
		Self { script: Mutex::new(steps.into_iter().collect()), ..Default::default() }
	}

	fn paths(&self) -> Vec<String> {
		self.seen.lock().iter().map(|request| request.url.path().to_owned()).collect()
	}
}
impl HttpTransport for ScriptedTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let is_refresh = request.url.path() == "/auth/refresh";

		self.seen.lock().push(request);

		let step = self.script.lock().pop_front();

		Box::pin(async move {
			if let (Some(gate), false) = (&self.gate, is_refresh) {
				gate.wait().await;
			}

			match step {
				Some(Step::Respond(status, body)) => Ok(TransportResponse::new(status, body)),
				Some(Step::Fail) | None => Err(TransportError::network(ConnectionReset)),
			}
		})
	}
}

fn config() -> GatewayConfig {
	GatewayConfig::builder(Url::parse("https://api.example.test").expect("Fixture URL should parse."))
		.build()
		.expect("Fixture configuration should validate.")
}

fn gateway(transport: ScriptedTransport) -> Gateway<ScriptedTransport> {
	Gateway::with_transport(config(), transport)
}

#[tokio::test]
async fn transport_failures_never_trigger_refresh() {
	let transport = ScriptedTransport::new([Step::Fail]);
	let gateway = gateway(transport);

	gateway.set_access_token("abc123");

	let err = gateway
		.get::<serde_json::Value>("/inventory")
		.await
		.expect_err("Network failure should surface.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
	assert_eq!(gateway.transport.paths(), vec!["/inventory".to_owned()]);
	assert_eq!(gateway.metrics.refresh_attempts(), 0);
	assert_eq!(gateway.access_token().as_ref().map(|token| token.expose()), Some("abc123"));
}

#[tokio::test]
async fn refresh_transport_failure_ends_session() {
	let transport =
		ScriptedTransport::new([Step::Respond(StatusCode::UNAUTHORIZED, ""), Step::Fail]);
	let gateway = gateway(transport);
	let expired = Arc::new(Mutex::new(Vec::new()));
	let sink = expired.clone();

	gateway.subscribe(move |event: &SessionEvent| {
		if let SessionEvent::AuthExpired { login_path, .. } = event {
			sink.lock().push(login_path.clone());
		}
	});
	gateway.set_access_token("abc123");

	let err = gateway
		.get::<serde_json::Value>("/users/me")
		.await
		.expect_err("Refresh transport failure should surface.");

	assert!(matches!(err, Error::Refresh(RefreshError::Transport(_))));
	assert!(err.is_auth_failure());
	assert_eq!(gateway.access_token(), None);
	assert_eq!(*expired.lock(), vec!["/login".to_owned()]);
	assert_eq!(gateway.transport.paths(), vec!["/users/me".to_owned(), "/auth/refresh".to_owned()]);

	let refresh = &gateway.transport.seen.lock()[1];

	assert!(refresh.headers.get(AUTHORIZATION).is_none());
	assert!(refresh.body.is_none());
}

#[tokio::test]
async fn waiter_behind_failed_refresh_sees_cleared_session() {
	let transport = ScriptedTransport {
		gate: Some(Arc::new(Barrier::new(2))),
		..ScriptedTransport::new([
			Step::Respond(StatusCode::UNAUTHORIZED, ""),
			Step::Respond(StatusCode::UNAUTHORIZED, ""),
			Step::Respond(StatusCode::UNAUTHORIZED, "{\"message\":\"refresh expired\"}"),
		])
	};
	let gateway = gateway(transport);
	let events = Arc::new(Mutex::new(0_usize));
	let counter = events.clone();

	gateway.subscribe(move |event: &SessionEvent| {
		if matches!(event, SessionEvent::AuthExpired { .. }) {
			*counter.lock() += 1;
		}
	});
	gateway.set_access_token("stale");

	let (first, second) = tokio::join!(
		gateway.get::<serde_json::Value>("/auctions/1"),
		gateway.get::<serde_json::Value>("/auctions/2"),
	);
	let mut errors = [first.expect_err("First should fail."), second.expect_err("Second should fail.")];

	errors.sort_by_key(|err| matches!(err, Error::AuthExpired(_)));

	assert!(matches!(&errors[0], Error::Refresh(RefreshError::Rejected { status: 401, .. })));
	assert!(matches!(&errors[1], Error::AuthExpired(AuthExpiredError::SessionCleared)));
	assert_eq!(*events.lock(), 1);
	assert_eq!(gateway.metrics.refresh_attempts(), 1);
	assert_eq!(gateway.metrics.refreshes_shared(), 1);
	assert_eq!(gateway.access_token(), None);
}

#[test]
fn listener_trait_accepts_closures() {
	fn assert_listener<L: SessionListener>(_: &L) {}

	assert_listener(&|_: &SessionEvent| {});
}
