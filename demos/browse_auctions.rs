//! Demonstrates the gateway recovering from an expired access token: the first auction fetch is
//! rejected with 401, the refresh cookie mints a new token, and the fetch is retried once.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use marketplace_gateway::{
	api::Credentials,
	config::GatewayConfig,
	events::SessionEvent,
	gateway::ReqwestGateway,
	url::Url,
};

#[derive(Debug, Deserialize)]
struct Auction {
	id: u64,
	title: String,
	#[serde(rename = "currentBid")]
	current_bid: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "refreshToken=demo-refresh; Path=/; HttpOnly")
				.body("{\"jwtToken\":\"expired-access\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/auctions/5").header("authorization", "Bearer expired-access");
			then.status(401).body("{\"message\":\"jwt expired\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").header("cookie", "refreshToken=demo-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"jwtToken\":\"fresh-access\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/auctions/5").header("authorization", "Bearer fresh-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":5,\"title\":\"Vintage camera\",\"currentBid\":120}");
		})
		.await;

	let config = GatewayConfig::builder(Url::parse(&server.base_url())?)
		.user_agent("marketplace-gateway-demo")
		.build()?;
	let gateway = ReqwestGateway::new(config)?;

	gateway.subscribe(|event: &SessionEvent| match event {
		SessionEvent::AuthExpired { login_path, reason, .. } =>
			println!("session expired ({reason}); redirecting to {login_path}"),
		other => println!("session event: {other}"),
	});

	let outcome = gateway.login(&Credentials::new("buyer@example.com", "hunter2")).await?;

	println!("login outcome: {outcome:?}");

	let auction: Auction = gateway.resources().auction(5).await?;

	println!(
		"auction #{} {:?} at {} (retries: {}, refreshes: {})",
		auction.id,
		auction.title,
		auction.current_bid,
		gateway.metrics.retries(),
		gateway.metrics.refresh_successes(),
	);

	Ok(())
}
