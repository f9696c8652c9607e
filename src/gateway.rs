//! Authenticated request gateway: every backend call flows through [`Gateway`].

pub mod envelope;
pub mod refresh;

mod dispatch;
mod metrics;

pub use envelope::*;
pub use metrics::GatewayMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, TokenState},
	config::GatewayConfig,
	events::{ListenerSet, SessionEvent, SessionListener},
	transport::HttpTransport,
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, transport::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Mediates every outbound backend call and owns the access token lifecycle.
///
/// The gateway attaches the current token as a bearer credential, observes responses for
/// `401 Unauthorized`, refreshes through the cookie-authenticated refresh endpoint, and retries
/// the original request exactly once. When the refresh fails it clears the token and publishes
/// [`SessionEvent::AuthExpired`] to subscribed listeners. Clones share the token, listeners,
/// refresh guard, and metrics.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Validated configuration.
	pub config: Arc<GatewayConfig>,
	/// Shared counters for requests and refresh outcomes.
	pub metrics: Arc<GatewayMetrics>,
	state: Arc<TokenState>,
	listeners: ListenerSet,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(config: GatewayConfig, transport: impl Into<Arc<T>>) -> Self {
		Self {
			transport: transport.into(),
			config: Arc::new(config),
			metrics: Default::default(),
			state: Default::default(),
			listeners: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Stores `token`; subsequent requests carry it.
	pub fn set_access_token(&self, token: impl Into<AccessToken>) {
		self.state.set(token.into());
	}

	/// Returns the current token, or `None` when unset.
	pub fn access_token(&self) -> Option<AccessToken> {
		self.state.get()
	}

	/// Removes the stored token; subsequent requests carry no `Authorization` header.
	pub fn clear_access_token(&self) {
		self.state.clear();
	}

	/// Registers a listener for session events.
	pub fn subscribe(&self, listener: impl 'static + SessionListener) {
		self.listeners.push(Arc::new(listener));
	}

	pub(crate) fn emit(&self, event: SessionEvent) {
		self.listeners.emit(event);
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a cookie-aware reqwest transport built from `config`.
	pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::from_config(&config)?;

		Ok(Self::with_transport(config, transport))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			state: self.state.clone(),
			listeners: self.listeners.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("token_set", &self.state.get().is_some())
			.field("listeners", &self.listeners)
			.finish()
	}
}
