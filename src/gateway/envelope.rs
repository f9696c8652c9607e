//! Immutable request snapshots and per-request options.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, IdempotencyKey},
	config::GatewayConfig,
	error::ConfigError,
	transport::TransportRequest,
};

const APPLICATION_JSON: &str = "application/json";

/// Position of a request in the refresh-and-retry cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Attempt {
	/// First dispatch; a 401 may trigger one refresh.
	#[default]
	Initial,
	/// Dispatched again after a refresh; a 401 is terminal.
	Retried,
}
impl Attempt {
	/// Whether a 401 on this attempt may still trigger a refresh.
	pub const fn may_refresh(self) -> bool {
		matches!(self, Self::Initial)
	}
}

/// Caller-controlled knobs for a single request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Extra headers. `Authorization` is always owned by the gateway and is ignored here.
	pub headers: HeaderMap,
	/// Query pairs appended to the request URL.
	pub query: Vec<(String, String)>,
	/// Caller-supplied idempotency key, forwarded verbatim.
	pub idempotency_key: Option<IdempotencyKey>,
	/// Timeout overriding the configured default.
	pub timeout: Option<Duration>,
	/// Send without a bearer token; a 401 is a plain rejection.
	pub anonymous: bool,
	/// Attach the token but treat a 401 as a plain rejection.
	pub skip_refresh: bool,
}
impl RequestOptions {
	/// Adds or replaces a header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Appends a query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Attaches an `Idempotency-Key` header.
	pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
		self.idempotency_key = Some(key);

		self
	}

	/// Overrides the timeout for this request.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sends the request without a bearer token (login, OTP verification).
	pub fn anonymous(mut self) -> Self {
		self.anonymous = true;

		self
	}

	/// Keeps the bearer token but never refreshes on a 401 (logout).
	pub fn skip_refresh(mut self) -> Self {
		self.skip_refresh = true;

		self
	}
}

/// Snapshot of a request captured before dispatch.
///
/// Envelopes are never mutated once built; moving to the retry produces a new envelope with
/// [`Attempt::Retried`], so the at-most-once retry bound is carried by the value itself.
#[derive(Clone, Debug)]
pub struct RequestEnvelope {
	method: Method,
	path: String,
	headers: HeaderMap,
	query: Vec<(String, String)>,
	body: Option<Vec<u8>>,
	timeout: Option<Duration>,
	anonymous: bool,
	skip_refresh: bool,
	attempt: Attempt,
}
impl RequestEnvelope {
	/// Captures a request, serializing `body` as JSON.
	pub fn new<B>(
		method: Method,
		path: impl Into<String>,
		body: Option<&B>,
		options: RequestOptions,
	) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let RequestOptions { mut headers, query, idempotency_key, timeout, anonymous, skip_refresh } =
			options;
		if timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ConfigError::NonPositiveTimeout);
		}

		let body = body
			.map(serde_json::to_vec)
			.transpose()
			.map_err(|source| ConfigError::InvalidBody { source })?;

		headers.remove(AUTHORIZATION);

		if let Some(key) = idempotency_key {
			let value = HeaderValue::from_str(&key).map_err(|_| ConfigError::InvalidHeader {
				name: IdempotencyKey::HEADER.into(),
			})?;

			headers.insert(HeaderName::from_static("idempotency-key"), value);
		}

		Ok(Self {
			method,
			path: path.into(),
			headers,
			query,
			body,
			timeout,
			anonymous,
			skip_refresh,
			attempt: Attempt::Initial,
		})
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path relative to the configured base URL.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Position in the refresh-and-retry cycle.
	pub fn attempt(&self) -> Attempt {
		self.attempt
	}

	/// Whether a 401 on this envelope may trigger a refresh.
	pub fn refreshable(&self) -> bool {
		!self.anonymous && !self.skip_refresh && self.attempt.may_refresh()
	}

	/// Whether a 401 on this envelope belongs to the authenticated session at all.
	pub fn is_session_bound(&self) -> bool {
		!self.anonymous && !self.skip_refresh
	}

	/// Produces the retry envelope.
	pub fn into_retry(self) -> Self {
		Self { attempt: Attempt::Retried, ..self }
	}

	/// Resolves the envelope into a transport request, attaching `token` when present.
	pub fn to_transport(
		&self,
		config: &GatewayConfig,
		token: Option<&AccessToken>,
	) -> Result<TransportRequest, ConfigError> {
		let mut url = config.endpoint(&self.path)?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		let mut headers = self.headers.clone();

		headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));

		if self.body.is_some() {
			headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
		}
		if let Some(token) = token.filter(|_| !self.anonymous) {
			let mut value = HeaderValue::from_str(&token.bearer())
				.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		Ok(TransportRequest {
			method: self.method.clone(),
			url,
			headers,
			body: self.body.clone(),
			timeout: self.timeout.or(Some(config.timeout)),
		})
	}
}
