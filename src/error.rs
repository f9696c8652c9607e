//! Gateway-level error types shared across requests, refreshes, and transports.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Backend rejected the request with a non-401 status.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Authentication could not be recovered after the refresh cycle.
	#[error(transparent)]
	AuthExpired(#[from] AuthExpiredError),
	/// Refresh endpoint failed; the session has been ended.
	#[error(transparent)]
	Refresh(#[from] RefreshError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Successful response body could not be decoded into the requested type.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// A sign-in endpoint answered 2xx without issuing a `jwtToken`.
	#[error("Response from `{path}` did not contain a jwtToken.")]
	MissingToken {
		/// Endpoint path that omitted the token.
		path: String,
	},
}
impl Error {
	/// Returns the HTTP status attached to the failure, when the backend produced one.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Request(e) => Some(e.status),
			Self::AuthExpired(AuthExpiredError::RetryRejected(e)) => Some(e.status),
			Self::Refresh(RefreshError::Rejected { status, .. }) => Some(*status),
			Self::Decode(e) => Some(e.status),
			_ => None,
		}
	}

	/// Whether the failure ended (or reflects an ended) authenticated session.
	pub fn is_auth_failure(&self) -> bool {
		matches!(self, Self::AuthExpired(_) | Self::Refresh(_))
	}
}

/// Non-2xx response surfaced verbatim to the caller.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Backend rejected the request with status {status}: {message}.")]
pub struct RequestError {
	/// HTTP status code returned by the backend.
	pub status: u16,
	/// Server-supplied message, falling back to the body text or reason phrase.
	pub message: String,
}
impl RequestError {
	/// Creates a new request error.
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self { status, message: message.into() }
	}

	/// Whether the backend answered `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}

/// Terminal authentication failures that do not trigger another refresh.
#[derive(Debug, ThisError)]
pub enum AuthExpiredError {
	/// The request was already retried after a refresh and was rejected again.
	#[error("Request was rejected after the token refresh retry: {0}")]
	RetryRejected(RequestError),
	/// The session was cleared while this request waited on a concurrent refresh.
	#[error("Session was cleared while waiting for a concurrent token refresh.")]
	SessionCleared,
}

/// Failures raised by the refresh endpoint. Always terminal for the session.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// Refresh call never produced a response.
	#[error("Token refresh failed at the transport layer.")]
	Transport(#[source] TransportError),
	/// Refresh endpoint answered with a non-2xx status.
	#[error("Token refresh was rejected with status {status}: {message}.")]
	Rejected {
		/// HTTP status code returned by the refresh endpoint.
		status: u16,
		/// Server-supplied message.
		message: String,
	},
	/// Refresh response lacked a usable `jwtToken`.
	#[error("Token refresh response did not contain a jwtToken.")]
	MissingToken,
	/// Refresh response was not valid JSON.
	#[error("Token refresh response could not be decoded.")]
	Decode(#[source] DecodeError),
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request exceeded its configured timeout.
	#[error("Request to the backend timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A URL could not be parsed or joined.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than http(s).
	#[error("Base URL scheme `{scheme}` is not supported; use http or https.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL carries a query string or fragment.
	#[error("Base URL must not carry a query string or fragment.")]
	BaseUrlHasQuery,
	/// A configured path is empty or not absolute.
	#[error("The {field} path `{value}` must be non-empty and start with '/'.")]
	InvalidPath {
		/// Configuration field name.
		field: &'static str,
		/// Offending value.
		value: String,
	},
	/// Timeout must be strictly positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// A header name or value is not legal HTTP.
	#[error("Header `{name}` has an invalid name or value.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized.")]
	InvalidBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Required environment variable is unset.
	#[error("Environment variable `{name}` is not set.")]
	MissingEnv {
		/// Variable name.
		name: &'static str,
	},
	/// Environment variable could not be parsed.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Parsing failure summary.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}

/// A response body that could not be deserialized into the requested type.
#[derive(Debug, ThisError)]
#[error("Response body with status {status} could not be decoded at `{}`.", .source.path())]
pub struct DecodeError {
	/// Structured parsing failure, including the JSON path.
	#[source]
	pub source: serde_path_to_error::Error<serde_json::Error>,
	/// HTTP status code of the decoded response.
	pub status: u16,
}
