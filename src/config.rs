//! Gateway configuration and its validating builder.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the backend origin.
pub const ENV_BASE_URL: &str = "MARKETPLACE_API_BASE_URL";
/// Environment variable overriding the request timeout, in whole seconds.
pub const ENV_TIMEOUT_SECS: &str = "MARKETPLACE_API_TIMEOUT_SECS";
/// Environment variable overriding the login entry path.
pub const ENV_LOGIN_PATH: &str = "MARKETPLACE_LOGIN_PATH";

/// Validated settings for a [`Gateway`](crate::gateway::Gateway).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGatewayConfig", into = "RawGatewayConfig")]
pub struct GatewayConfig {
	/// Backend origin every request path is resolved against.
	pub base_url: Url,
	/// Path of the cookie-authenticated refresh endpoint.
	pub refresh_path: String,
	/// Login entry point reported to listeners when the session ends.
	pub login_path: String,
	/// Default per-request timeout.
	pub timeout: Duration,
	/// Whether concurrent 401s share one in-flight refresh.
	pub dedupe_refresh: bool,
	/// Optional `User-Agent` header for the default transport.
	pub user_agent: Option<String>,
}
impl GatewayConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh";
	/// Default login entry path.
	pub const DEFAULT_LOGIN_PATH: &'static str = "/login";
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: Duration = Duration::seconds(30);

	/// Creates a builder seeded with the provided base URL.
	pub fn builder(base_url: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(base_url)
	}

	/// Loads configuration from `MARKETPLACE_API_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let raw = lookup(ENV_BASE_URL).ok_or(ConfigError::MissingEnv { name: ENV_BASE_URL })?;
		let base_url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnv {
			name: ENV_BASE_URL,
			reason: e.to_string(),
		})?;
		let mut builder = Self::builder(base_url);

		if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
			let secs = raw.trim().parse::<i64>().map_err(|e| ConfigError::InvalidEnv {
				name: ENV_TIMEOUT_SECS,
				reason: e.to_string(),
			})?;

			builder = builder.timeout(Duration::seconds(secs));
		}
		if let Some(path) = lookup(ENV_LOGIN_PATH) {
			builder = builder.login_path(path.trim());
		}

		builder.build()
	}

	/// Resolves `path` (optionally carrying a query string) against the base URL, keeping any
	/// path prefix the base URL has.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let joined = if path.starts_with('/') {
			format!("{base}{path}")
		} else {
			format!("{base}/{path}")
		};

		Ok(Url::parse(&joined)?)
	}

	/// Resolves the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			scheme => return Err(ConfigError::UnsupportedScheme { scheme: scheme.to_owned() }),
		}

		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(ConfigError::BaseUrlHasQuery);
		}

		validate_path("refresh", &self.refresh_path)?;
		validate_path("login", &self.login_path)?;

		if !self.timeout.is_positive() {
			return Err(ConfigError::NonPositiveTimeout);
		}

		Ok(())
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	/// Backend origin.
	pub base_url: Url,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login entry path.
	pub login_path: String,
	/// Default request timeout.
	pub timeout: Duration,
	/// Refresh de-duplication toggle.
	pub dedupe_refresh: bool,
	/// Optional `User-Agent` header.
	pub user_agent: Option<String>,
}
impl GatewayConfigBuilder {
	/// Creates a new builder with default paths and timeout.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			refresh_path: GatewayConfig::DEFAULT_REFRESH_PATH.into(),
			login_path: GatewayConfig::DEFAULT_LOGIN_PATH.into(),
			timeout: GatewayConfig::DEFAULT_TIMEOUT,
			dedupe_refresh: true,
			user_agent: None,
		}
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login entry path reported on session expiry.
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the default request timeout.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Enables or disables single-flight refresh.
	pub fn dedupe_refresh(mut self, enabled: bool) -> Self {
		self.dedupe_refresh = enabled;

		self
	}

	/// Sets the `User-Agent` header used by the default transport.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		let config = GatewayConfig {
			base_url: self.base_url,
			refresh_path: self.refresh_path,
			login_path: self.login_path,
			timeout: self.timeout,
			dedupe_refresh: self.dedupe_refresh,
			user_agent: self.user_agent,
		};

		config.validate()?;

		Ok(config)
	}
}

#[derive(Deserialize, Serialize)]
struct RawGatewayConfig {
	base_url: Url,
	#[serde(default = "default_refresh_path")]
	refresh_path: String,
	#[serde(default = "default_login_path")]
	login_path: String,
	#[serde(default = "default_timeout_ms")]
	timeout_ms: i64,
	#[serde(default = "default_dedupe_refresh")]
	dedupe_refresh: bool,
	#[serde(default)]
	user_agent: Option<String>,
}
impl TryFrom<RawGatewayConfig> for GatewayConfig {
	type Error = ConfigError;

	fn try_from(raw: RawGatewayConfig) -> Result<Self, Self::Error> {
		let mut builder = GatewayConfig::builder(raw.base_url)
			.refresh_path(raw.refresh_path)
			.login_path(raw.login_path)
			.timeout(Duration::milliseconds(raw.timeout_ms))
			.dedupe_refresh(raw.dedupe_refresh);

		if let Some(user_agent) = raw.user_agent {
			builder = builder.user_agent(user_agent);
		}

		builder.build()
	}
}
impl From<GatewayConfig> for RawGatewayConfig {
	fn from(config: GatewayConfig) -> Self {
		Self {
			base_url: config.base_url,
			refresh_path: config.refresh_path,
			login_path: config.login_path,
			timeout_ms: whole_millis(config.timeout),
			dedupe_refresh: config.dedupe_refresh,
			user_agent: config.user_agent,
		}
	}
}

fn default_refresh_path() -> String {
	GatewayConfig::DEFAULT_REFRESH_PATH.into()
}

fn default_login_path() -> String {
	GatewayConfig::DEFAULT_LOGIN_PATH.into()
}

fn default_timeout_ms() -> i64 {
	whole_millis(GatewayConfig::DEFAULT_TIMEOUT)
}

fn whole_millis(timeout: Duration) -> i64 {
	i64::try_from(timeout.whole_milliseconds()).unwrap_or(i64::MAX)
}

fn default_dedupe_refresh() -> bool {
	true
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if !value.starts_with('/') {
		Err(ConfigError::InvalidPath { field, value: value.to_owned() })
	} else {
		Ok(())
	}
}
