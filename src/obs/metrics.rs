// self
use crate::{
	obs::{FlowKind, FlowOutcome},
	session::LogoutReason,
};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"rentdesk_session_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records a logout the user did not ask for.
pub fn record_forced_logout(reason: LogoutReason) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason = reason.as_str(), "Session was logged out.");

	#[cfg(feature = "metrics")]
	{
		metrics::counter!("rentdesk_session_forced_logout_total", "reason" => reason.as_str())
			.increment(1);
	}

	#[cfg(not(any(feature = "tracing", feature = "metrics")))]
	{
		let _ = reason;
	}
}
