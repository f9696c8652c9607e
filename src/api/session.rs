//! Authentication flows that set and clear the gateway's access token.

// crates.io
use http::Method;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	events::SessionEvent,
	gateway::{Gateway, RequestOptions},
	transport::HttpTransport,
};

/// Login endpoint path.
pub const LOGIN_PATH: &str = "/auth/login";
/// OTP verification endpoint path.
pub const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
/// Logout endpoint path.
pub const LOGOUT_PATH: &str = "/auth/logout";

/// Email + password credentials.
#[derive(Clone, Serialize)]
pub struct Credentials {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl Credentials {
	/// Creates a new credential pair.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

#[derive(Debug, Serialize)]
struct OtpSubmission<'a> {
	email: &'a str,
	otp: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionResponse {
	#[serde(rename = "jwtToken")]
	jwt_token: Option<String>,
	message: Option<String>,
}

/// Result of a login call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
	/// The backend issued an access token, which the gateway now holds.
	SignedIn,
	/// The backend sent a one-time password; finish with [`Gateway::verify_otp`].
	OtpRequired {
		/// Server-supplied prompt, if any.
		message: Option<String>,
	},
}

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Submits credentials. Stores the token when the backend issues one directly.
	pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome> {
		let response: SessionResponse = self
			.request(Method::POST, LOGIN_PATH, Some(credentials), RequestOptions::default().anonymous())
			.await?;

		match response.jwt_token.filter(|token| !token.is_empty()) {
			Some(token) => {
				self.sign_in(AccessToken::new(token));

				Ok(LoginOutcome::SignedIn)
			},
			None => Ok(LoginOutcome::OtpRequired { message: response.message }),
		}
	}

	/// Verifies the one-time password and stores the issued token.
	pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AccessToken> {
		let response: SessionResponse = self
			.request(
				Method::POST,
				VERIFY_OTP_PATH,
				Some(&OtpSubmission { email, otp }),
				RequestOptions::default().anonymous(),
			)
			.await?;
		let token = response
			.jwt_token
			.filter(|token| !token.is_empty())
			.map(AccessToken::new)
			.ok_or_else(|| Error::MissingToken { path: VERIFY_OTP_PATH.into() })?;

		self.sign_in(token.clone());

		Ok(token)
	}

	/// Ends the session on the backend and locally.
	///
	/// The local token is cleared and [`SessionEvent::LoggedOut`] is published even when the
	/// backend call fails; the backend error is still returned.
	pub async fn logout(&self) -> Result<()> {
		let result = self
			.request::<(), serde_json::Value>(
				Method::POST,
				LOGOUT_PATH,
				None,
				RequestOptions::default().skip_refresh(),
			)
			.await;

		self.clear_access_token();
		self.emit(SessionEvent::LoggedOut);

		result.map(|_| ())
	}

	fn sign_in(&self, token: AccessToken) {
		self.set_access_token(token);
		self.emit(SessionEvent::SignedIn);
	}
}
