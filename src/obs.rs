//! Optional observability helpers for gateway calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `marketplace_gateway.call` with the `stage`,
//!   `method`, and `path` fields.
//! - Enable `metrics` to increment the `marketplace_gateway_call_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`. A 401 answered by a refresh another
//!   request already ran is counted once under `refresh` with the `shared` outcome.
//!
//! Access tokens never appear in spans or metric labels.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Gateway stages observed per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallStage {
	/// First dispatch of a caller's request.
	Request,
	/// Call to the refresh endpoint.
	Refresh,
	/// Single retry after a successful refresh.
	Retry,
}
impl CallStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallStage::Request => "request",
			CallStage::Refresh => "refresh",
			CallStage::Retry => "retry",
		}
	}
}
impl Display for CallStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a gateway stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Outcome reused from a refresh another request completed.
	Shared,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
			CallOutcome::Shared => "shared",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(CallStage::Refresh.to_string(), "refresh");
		assert_eq!(
			[CallOutcome::Attempt, CallOutcome::Success, CallOutcome::Failure, CallOutcome::Shared]
				.map(CallOutcome::as_str),
			["attempt", "success", "failure", "shared"]
		);
	}
}
