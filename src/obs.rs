//! Observability hooks shared by the login and signing paths.
//!
//! Everything here compiles to a no-op unless the matching feature is on:
//!
//! - `tracing`: one `pogo_auth.operation` span per login or signing call, plus warn/debug
//!   events for retries, quota waits, and observer failures.
//! - `metrics`: the `pogo_auth_operation_total` counter (labels `operation`, `outcome`), the
//!   `pogo_auth_operation_seconds` histogram, and the `pogo_auth_hash_quota_remaining` gauge.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// What is being observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// SSO ticket exchange.
	Login,
	/// Signing-service request.
	Hash,
}
impl Operation {
	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Login => "login",
			Operation::Hash => "hash",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How a call ended, or that it started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Call entered.
	Attempt,
	/// Call returned a value.
	Success,
	/// The remote side refused the username/password pair or the signing key.
	Rejected,
	/// The signing quota was exhausted.
	Throttled,
	/// Any other failure.
	Failure,
}
impl Outcome {
	/// Classifies a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Outcome::Success,
			Err(Error::InvalidCredentials { .. } | Error::HashUnauthorized { .. }) => Outcome::Rejected,
			Err(Error::HashQuotaExceeded { .. }) => Outcome::Throttled,
			Err(_) => Outcome::Failure,
		}
	}

	/// Label used in metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Rejected => "rejected",
			Outcome::Throttled => "throttled",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn results_map_to_outcomes() {
		assert_eq!(Outcome::of(&Ok(())), Outcome::Success);
		assert_eq!(
			Outcome::of::<()>(&Err(Error::InvalidCredentials { message: "bad password".into() })),
			Outcome::Rejected
		);
		assert_eq!(
			Outcome::of::<()>(&Err(Error::HashUnauthorized { message: "unknown key".into() })),
			Outcome::Rejected
		);
		assert_eq!(
			Outcome::of::<()>(&Err(Error::HashQuotaExceeded {
				message: "Exceeded hash limit!".into(),
				retry_in: None,
			})),
			Outcome::Throttled
		);
		assert_eq!(Outcome::of::<()>(&Err(Error::hash("boom", Some(502)))), Outcome::Failure);
		assert_eq!(Outcome::Throttled.to_string(), "throttled");
	}
}
