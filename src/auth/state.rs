//! In-memory access token state owned by the gateway.

// self
use crate::{_prelude::*, auth::AccessToken};

/// Token value observed together with the epoch it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSnapshot {
	/// Token present at observation time, if any.
	pub token: Option<AccessToken>,
	/// Monotonic counter advanced by every set or clear.
	pub epoch: u64,
}

#[derive(Debug, Default)]
struct Slot {
	token: Option<AccessToken>,
	epoch: u64,
}

/// Process-memory holder for the current access token.
///
/// The state starts empty, is set on login or refresh, and is cleared on logout or a failed
/// refresh. Every mutation advances the epoch so in-flight requests can tell whether the token
/// they were sent with is still current. The lock is never held across an `.await`.
#[derive(Debug, Default)]
pub struct TokenState(RwLock<Slot>);
impl TokenState {
	/// Stores a token, replacing any previous one.
	pub fn set(&self, token: AccessToken) -> u64 {
		let mut slot = self.0.write();

		slot.token = Some(token);
		slot.epoch += 1;

		slot.epoch
	}

	/// Returns the current token, if any.
	pub fn get(&self) -> Option<AccessToken> {
		self.0.read().token.clone()
	}

	/// Removes the stored token.
	pub fn clear(&self) -> u64 {
		let mut slot = self.0.write();

		slot.token = None;
		slot.epoch += 1;

		slot.epoch
	}

	/// Returns the token and epoch read under the same lock.
	pub fn snapshot(&self) -> TokenSnapshot {
		let slot = self.0.read();

		TokenSnapshot { token: slot.token.clone(), epoch: slot.epoch }
	}

	/// Returns the current epoch.
	pub fn epoch(&self) -> u64 {
		self.0.read().epoch
	}
}
