// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{Operation, Outcome};

/// Bumps `pogo_auth_operation_total{operation, outcome}`.
pub fn record_outcome(operation: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"pogo_auth_operation_total",
		"operation" => operation.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (operation, outcome);
}

/// Records wall time of a whole call, quota waits included.
pub fn record_latency(operation: Operation, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!("pogo_auth_operation_seconds", "operation" => operation.as_str())
		.record(elapsed.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (operation, elapsed);
}

/// Publishes the last remaining-request count reported by the signing service.
pub fn record_quota_remaining(remaining: i64) {
	#[cfg(feature = "metrics")]
	metrics::gauge!("pogo_auth_hash_quota_remaining").set(remaining as f64);
	#[cfg(not(feature = "metrics"))]
	let _ = remaining;
}
