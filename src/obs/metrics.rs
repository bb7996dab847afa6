// self
use crate::obs::{OpKind, OpOutcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
///
/// Labels: `op`, `outcome`, and `class` (the failure class, or `none`).
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pwndoc_client_op_total",
			"op" => kind.as_str(),
			"outcome" => outcome.as_str(),
			"class" => outcome.class_label()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::obs::FailureClass;

	#[test]
	fn every_outcome_records_without_recorder() {
		for outcome in [
			OpOutcome::Attempt,
			OpOutcome::Retry,
			OpOutcome::Success,
			OpOutcome::Failure(FailureClass::Transport),
		] {
			record_op_outcome(OpKind::Request, outcome);
		}
	}
}
