//! Cookie-authenticated token refresh with an optional single-flight guard.
//!
//! The refresh endpoint is called with no body and no `Authorization` header; the HTTP-only
//! refresh cookie held by the transport authenticates it. A successful call stores the new
//! `jwtToken`. Any failure clears the stored token and publishes
//! [`SessionEvent::AuthExpired`] exactly once for that failed call.
//!
//! With [`GatewayConfig::dedupe_refresh`](crate::config::GatewayConfig::dedupe_refresh)
//! enabled, refreshes are serialized and a 401 whose token epoch is already stale reuses the
//! outcome of the refresh that ran while it waited instead of issuing another one.

// crates.io
use http::{HeaderValue, Method, header::ACCEPT};
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{AuthExpiredError, RefreshError},
	events::SessionEvent,
	gateway::Gateway,
	obs::{self, CallOutcome, CallSpan, CallStage},
	transport::{HttpTransport, TransportRequest},
};

/// Body returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
	#[serde(rename = "jwtToken", default)]
	jwt_token: Option<String>,
}

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Mints a new access token through the refresh endpoint.
	///
	/// Useful at start-up to restore a session from the refresh cookie. A failure ends the
	/// session exactly like a failed refresh inside [`Gateway::execute`].
	pub async fn refresh(&self) -> Result<AccessToken> {
		if self.config.dedupe_refresh {
			let _singleflight = self.refresh_guard.lock().await;

			self.refresh_now().await
		} else {
			self.refresh_now().await
		}
	}

	/// Resolves a 401 observed on a request sent at token epoch `sent_epoch`.
	pub(crate) async fn recover(&self, sent_epoch: u64) -> Result<AccessToken> {
		if !self.config.dedupe_refresh {
			return self.refresh_now().await;
		}

		let _singleflight = self.refresh_guard.lock().await;
		let current = self.state.snapshot();

		if current.epoch != sent_epoch {
			self.metrics.record_refresh_shared();
			obs::record_call_outcome(CallStage::Refresh, CallOutcome::Shared);
			obs::debug_refresh_shared(current.epoch);

			return current.token.ok_or_else(|| AuthExpiredError::SessionCleared.into());
		}

		self.refresh_now().await
	}

	async fn refresh_now(&self) -> Result<AccessToken> {
		const STAGE: CallStage = CallStage::Refresh;

		let span = CallSpan::new(STAGE, Method::POST.as_str(), &self.config.refresh_path);

		obs::record_call_outcome(STAGE, CallOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let url = self.config.refresh_endpoint()?;
		let mut request = TransportRequest::new(Method::POST, url).with_timeout(self.config.timeout);

		request.headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		match span.instrument(self.call_refresh_endpoint(request)).await {
			Ok(token) => {
				self.state.set(token.clone());
				self.metrics.record_refresh_success();
				obs::record_call_outcome(STAGE, CallOutcome::Success);
				self.emit(SessionEvent::TokenRefreshed);

				Ok(token)
			},
			Err(err) => {
				self.state.clear();
				self.metrics.record_refresh_failure();
				obs::record_call_outcome(STAGE, CallOutcome::Failure);

				let reason = err.to_string();

				obs::warn_session_expired(&reason);
				self.emit(SessionEvent::AuthExpired {
					login_path: self.config.login_path.clone(),
					reason,
					occurred_at: OffsetDateTime::now_utc(),
				});

				Err(err.into())
			},
		}
	}

	async fn call_refresh_endpoint(
		&self,
		request: TransportRequest,
	) -> Result<AccessToken, RefreshError> {
		let response = self.transport.send(request).await.map_err(RefreshError::Transport)?;

		if !response.is_success() {
			return Err(RefreshError::Rejected {
				status: response.status.as_u16(),
				message: response.error_message(),
			});
		}

		let body = response.json::<RefreshResponse>().map_err(RefreshError::Decode)?;

		body.jwt_token
			.filter(|token| !token.is_empty())
			.map(AccessToken::new)
			.ok_or(RefreshError::MissingToken)
	}
}
