// self
use crate::obs::{CallOutcome, CallStage};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(stage: CallStage, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"marketplace_gateway_call_total",
			"stage" => stage.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (stage, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_call_outcome_noop_without_metrics() {
		record_call_outcome(CallStage::Refresh, CallOutcome::Failure);
		record_call_outcome(CallStage::Refresh, CallOutcome::Shared);
	}
}
