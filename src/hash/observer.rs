//! Best-effort notifications about finished signing calls.

// self
use crate::{_prelude::*, error::BoxError, hash::RateLimitSnapshot};

/// Outcome of one signing call, reported once per call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HashReport {
	/// Time spent in the call, including any quota waits.
	pub latency: std::time::Duration,
	/// HTTP status of the final response; `None` when no response was received.
	pub status: Option<u16>,
	/// Quota window after the call.
	pub rate_limit: RateLimitSnapshot,
	/// Failure message; `None` on success.
	pub failure: Option<String>,
}
impl HashReport {
	/// Returns `true` when the call produced a hash.
	pub fn is_success(&self) -> bool {
		self.failure.is_none()
	}
}

/// Receives a [`HashReport`] for every terminal signing outcome.
///
/// Errors returned here are logged and dropped; they never replace the call's own result.
pub trait HashObserver
where
	Self: Send + Sync,
{
	/// Handles one report.
	fn on_report(&self, report: &HashReport) -> Result<(), BoxError>;
}
impl<F> HashObserver for F
where
	F: Send + Sync + Fn(&HashReport) -> Result<(), BoxError>,
{
	fn on_report(&self, report: &HashReport) -> Result<(), BoxError> {
		self(report)
	}
}
