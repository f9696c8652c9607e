//! Transport primitives for backend calls.
//!
//! The module exposes [`HttpTransport`] alongside the [`TransportRequest`] and
//! [`TransportResponse`] values it exchanges, so embedders and tests can plug in their own HTTP
//! stack without losing the gateway's refresh semantics. The default [`ReqwestTransport`] keeps
//! a cookie store, which is how the HTTP-only refresh credential reaches the refresh endpoint.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
// crates.io
use http::{HeaderMap, Method, StatusCode};
// self
use crate::{
	_prelude::*,
	error::{DecodeError, RequestError, TransportError},
};
#[cfg(feature = "reqwest")]
use crate::{config::GatewayConfig, error::ConfigError};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

const MESSAGE_PREVIEW_LEN: usize = 512;

/// Abstraction over HTTP stacks able to execute gateway requests.
///
/// The trait is the gateway's only dependency on an HTTP client. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by clones of a gateway, and must
/// carry any cookies the backend sets (the refresh credential lives in one) on later calls.
/// Non-2xx statuses are responses, not errors: only failures that never produced a status
/// belong in [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Dispatches `request` and resolves with the raw response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Fully resolved outbound request.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers, with `Authorization` marked sensitive when present.
	pub headers: HeaderMap,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout override.
	pub timeout: Option<Duration>,
}
impl TransportRequest {
	/// Creates a request with no headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None }
	}

	/// Overrides the timeout.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

/// Raw response captured by a transport.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response from its parts.
	pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: HeaderMap::new(), body: body.into() }
	}

	/// Whether the status is 2xx.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Whether the status is `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Decodes the JSON body. An empty body decodes as `null`.
	pub fn json<T>(&self) -> Result<T, DecodeError>
	where
		T: DeserializeOwned,
	{
		let bytes: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"null"
		} else {
			&self.body
		};
		let mut de = serde_json::Deserializer::from_slice(bytes);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| DecodeError { source, status: self.status.as_u16() })
	}

	/// Converts a non-2xx response into a [`RequestError`] with the server's message.
	pub fn to_request_error(&self) -> RequestError {
		RequestError::new(self.status.as_u16(), self.error_message())
	}

	/// Extracts the server-supplied message: a JSON `message` or `error` field, the body text,
	/// or the status reason phrase, in that order.
	pub fn error_message(&self) -> String {
		if let Ok(value) = serde_json::from_slice::<serde_json::Value>(&self.body) {
			for field in ["message", "error"] {
				if let Some(message) = value.get(field).and_then(serde_json::Value::as_str) {
					return message.to_owned();
				}
			}
		}

		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		if !text.is_empty() {
			return text.chars().take(MESSAGE_PREVIEW_LEN).collect();
		}

		self.status
			.canonical_reason()
			.map(str::to_owned)
			.unwrap_or_else(|| format!("HTTP {}", self.status.as_u16()))
	}
}

/// Default transport backed by a cookie-aware [`ReqwestClient`].
///
/// Redirects are not followed: the backend answers REST calls directly and a redirect would
/// otherwise hide a 401 behind a login page.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie store, the configured timeout, and user agent.
	pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
		let mut builder = ReqwestClient::builder()
			.cookie_store(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(to_std(config.timeout));

		if let Some(user_agent) = config.user_agent.as_deref() {
			builder = builder.user_agent(user_agent);
		}

		builder.build().map(Self).map_err(ConfigError::http_client_build)
	}

	/// Wraps an existing reqwest [`ReqwestClient`]. Enable its cookie store so refresh
	/// credentials survive between calls.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method, request.url).headers(request.headers);

			if let Some(body) = request.body {
				builder = builder.body(body);
			}
			if let Some(timeout) = request.timeout {
				builder = builder.timeout(to_std(timeout));
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn to_std(duration: Duration) -> StdDuration {
	StdDuration::try_from(duration).unwrap_or(StdDuration::ZERO)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_body_decodes_as_null() {
		let response = TransportResponse::new(StatusCode::NO_CONTENT, Vec::new());

		response.json::<()>().expect("Empty body should decode into unit.");
		assert_eq!(
			response.json::<Option<u32>>().expect("Empty body should decode into None."),
			None
		);
	}

	#[test]
	fn decode_errors_carry_json_path() {
		#[derive(Debug, Deserialize)]
		struct Auction {
			#[allow(dead_code)]
			id: u64,
		}

		let response = TransportResponse::new(StatusCode::OK, br#"{"id":"five"}"#.to_vec());
		let err = response.json::<Auction>().expect_err("String id should fail to decode.");

		assert_eq!(err.status, 200);
		assert_eq!(err.source.path().to_string(), "id");
	}

	#[test]
	fn error_message_prefers_json_fields_then_text_then_reason() {
		let json = TransportResponse::new(
			StatusCode::CONFLICT,
			br#"{"message":"Auction already closed"}"#.to_vec(),
		);

		assert_eq!(json.to_request_error(), RequestError::new(409, "Auction already closed"));

		let error_field =
			TransportResponse::new(StatusCode::BAD_REQUEST, br#"{"error":"bad otp"}"#.to_vec());

		assert_eq!(error_field.error_message(), "bad otp");

		let text = TransportResponse::new(StatusCode::BAD_GATEWAY, b"  upstream down \n".to_vec());

		assert_eq!(text.error_message(), "upstream down");

		let empty = TransportResponse::new(StatusCode::NOT_FOUND, Vec::new());

		assert_eq!(empty.error_message(), "Not Found");
	}
}
