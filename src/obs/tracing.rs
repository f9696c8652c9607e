// self
use crate::{_prelude::*, obs::CallStage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by gateway stages.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the stage, method, and request path.
	pub fn new(stage: CallStage, method: &str, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"marketplace_gateway.call",
				stage = stage.as_str(),
				method,
				path
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning that the session ended after a failed refresh.
pub(crate) fn warn_session_expired(reason: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(reason, "token refresh failed; session cleared");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Emits a debug event when a 401 is answered by a refresh another request already ran.
pub(crate) fn debug_refresh_shared(epoch: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(epoch, "reusing token from a concurrent refresh");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = epoch;
	}
}
