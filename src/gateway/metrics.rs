// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for gateway calls and refreshes.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
	requests: AtomicU64,
	retries: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
	refresh_shared: AtomicU64,
}
impl GatewayMetrics {
	/// Returns the number of caller requests dispatched.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of post-refresh retries.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of calls made to the refresh endpoint.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that minted a token.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that ended the session.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	/// Returns the number of 401s answered by a concurrent refresh instead of a new call.
	pub fn refreshes_shared(&self) -> u64 {
		self.refresh_shared.load(Ordering::Relaxed)
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_shared(&self) {
		self.refresh_shared.fetch_add(1, Ordering::Relaxed);
	}
}
