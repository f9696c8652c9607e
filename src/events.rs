//! Session lifecycle events published by the gateway.
//!
//! The gateway never navigates. When a refresh fails it clears the token and publishes
//! [`SessionEvent::AuthExpired`]; the application shell subscribes a [`SessionListener`] and
//! reacts by routing to the login entry point.

// self
use crate::_prelude::*;

/// Observable change in the authenticated session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
	/// A token was issued by login or OTP verification.
	SignedIn,
	/// The refresh endpoint minted a new access token.
	TokenRefreshed,
	/// The caller logged out and the token was cleared.
	LoggedOut,
	/// Refresh failed; the token was cleared and the user must sign in again.
	AuthExpired {
		/// Login entry point the shell should navigate to.
		login_path: String,
		/// Human-readable refresh failure.
		reason: String,
		/// When the session ended.
		occurred_at: OffsetDateTime,
	},
}
impl SessionEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(&self) -> &'static str {
		match self {
			Self::SignedIn => "signed_in",
			Self::TokenRefreshed => "token_refreshed",
			Self::LoggedOut => "logged_out",
			Self::AuthExpired { .. } => "auth_expired",
		}
	}
}
impl Display for SessionEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Subscriber notified synchronously after each session state change.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// Handles a single event. Implementations must not block.
	fn on_event(&self, event: &SessionEvent);
}
impl<F> SessionListener for F
where
	F: Send + Sync + Fn(&SessionEvent),
{
	fn on_event(&self, event: &SessionEvent) {
		self(event)
	}
}

/// Registered listeners shared by clones of a gateway.
#[derive(Clone, Default)]
pub(crate) struct ListenerSet(Arc<RwLock<Vec<Arc<dyn SessionListener>>>>);
impl ListenerSet {
	pub(crate) fn push(&self, listener: Arc<dyn SessionListener>) {
		self.0.write().push(listener);
	}

	pub(crate) fn emit(&self, event: SessionEvent) {
		let listeners = self.0.read().clone();

		for listener in listeners {
			listener.on_event(&event);
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.0.read().len()
	}
}
impl Debug for ListenerSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "ListenerSet({})", self.len())
	}
}
