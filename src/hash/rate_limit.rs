//! Quota window shared by every caller signing with the same key.
//!
//! The signing service reports its quota through response headers. [`RateLimitState`] keeps the
//! latest values behind one lock so concurrent callers read and write them atomically, and lets
//! blocked callers suspend until the current period ends or another caller observes a new one.

// std
use std::pin::pin;
// crates.io
use tokio::sync::Notify;
// self
use crate::{
	_prelude::*,
	clock::Clock,
	http::{self, http::HeaderMap},
};

const MAX_REQUEST_COUNT: &str = "x-maxrequestcount";
const RATE_PERIOD_END: &str = "x-rateperiodend";
const RATE_REQUESTS_REMAINING: &str = "x-raterequestsremaining";
const RATE_LIMIT_SECONDS: &str = "x-ratelimitseconds";
const AUTH_TOKEN_EXPIRATION: &str = "x-authtokenexpiration";

/// Decides when a window with no remaining requests counts as exhausted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
	/// Exhausted while `remaining <= 0` and the recorded period has not ended yet.
	#[default]
	UntilPeriodEnd,
	/// Exhausted while `remaining <= 0` and the recorded period has already ended, i.e. until a
	/// response reports a refreshed count.
	AfterPeriodEnd,
}

/// Point-in-time copy of a [`RateLimitState`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
	/// Requests allowed per period (`X-MaxRequestCount`).
	pub max_requests: Option<u32>,
	/// Requests left in the current period (`X-RateRequestsRemaining`).
	pub remaining: Option<i64>,
	/// Period length in seconds (`X-RateLimitSeconds`).
	pub period_secs: Option<i64>,
	/// End of the current period (`X-RatePeriodEnd`).
	pub period_end: Option<OffsetDateTime>,
	/// Expiry of the signing key (`X-AuthTokenExpiration`).
	pub key_expiration: Option<OffsetDateTime>,
	/// Whether at least one response has been observed.
	pub observed: bool,
}
impl RateLimitSnapshot {
	/// Returns whether a new request should be held back at `now` under `policy`.
	///
	/// Nothing is exhausted before the first response, nor while the remaining count or
	/// period end is unknown.
	pub fn is_exhausted(&self, policy: QuotaPolicy, now: OffsetDateTime) -> bool {
		if !self.observed {
			return false;
		}

		let (Some(remaining), Some(period_end)) = (self.remaining, self.period_end) else {
			return false;
		};

		remaining <= 0
			&& match policy {
				QuotaPolicy::UntilPeriodEnd => now <= period_end,
				QuotaPolicy::AfterPeriodEnd => now > period_end,
			}
	}

	/// Time left until the recorded period ends, when it lies after `now`.
	pub fn retry_in(&self, now: OffsetDateTime) -> Option<Duration> {
		self.period_end.map(|end| end - now).filter(|wait| wait.is_positive())
	}
}

/// Shared quota window for one signing key.
#[derive(Debug, Default)]
pub struct RateLimitState {
	window: Mutex<Window>,
	period_changed: Notify,
}
#[derive(Debug, Default)]
struct Window {
	snapshot: RateLimitSnapshot,
	closed: bool,
}
impl RateLimitState {
	/// Returns a copy of the current window.
	pub fn snapshot(&self) -> RateLimitSnapshot {
		self.window.lock().snapshot
	}

	/// Refreshes the window from signing-service response headers.
	///
	/// Missing or malformed headers leave the matching field untouched. A changed period end
	/// releases every caller suspended in [`Self::wait_for_reset`].
	pub fn update_from_headers(&self, headers: &HeaderMap) {
		let period_changed = {
			let mut window = self.window.lock();
			let snapshot = &mut window.snapshot;
			let previous_end = snapshot.period_end;

			if let Some(max) = http::header_parse(headers, MAX_REQUEST_COUNT) {
				snapshot.max_requests = Some(max);
			}
			if let Some(remaining) = http::header_parse(headers, RATE_REQUESTS_REMAINING) {
				snapshot.remaining = Some(remaining);
			}
			if let Some(secs) = http::header_parse(headers, RATE_LIMIT_SECONDS) {
				snapshot.period_secs = Some(secs);
			}
			if let Some(end) = unix_header(headers, RATE_PERIOD_END) {
				snapshot.period_end = Some(end);
			}
			if let Some(expiry) = unix_header(headers, AUTH_TOKEN_EXPIRATION) {
				snapshot.key_expiration = Some(expiry);
			}

			snapshot.observed = true;

			snapshot.period_end != previous_end
		};

		if period_changed {
			self.period_changed.notify_waiters();
		}
	}

	/// Suspends until the recorded period ends or another caller observes a new period.
	///
	/// Returns immediately when no period end is known or it already passed according to
	/// `clock`. Fails with [`Error::Hash`] once the state has been [closed](Self::close).
	/// Must be polled inside a Tokio runtime with the time driver enabled.
	pub async fn wait_for_reset(&self, clock: &dyn Clock) -> Result<()> {
		let mut notified = pin!(self.period_changed.notified());

		// Register before reading the window so an update in between is not missed.
		notified.as_mut().enable();

		let wait = {
			let window = self.window.lock();

			if window.closed {
				return Err(interrupted());
			}

			match window.snapshot.retry_in(clock.now()) {
				Some(wait) => wait,
				None => return Ok(()),
			}
		};
		let wait = std::time::Duration::try_from(wait).unwrap_or_default();

		tokio::select! {
			_ = notified => {
				if self.window.lock().closed { Err(interrupted()) } else { Ok(()) }
			},
			_ = tokio::time::sleep(wait) => Ok(()),
		}
	}

	/// Wakes every suspended caller with an error and fails all future waits.
	pub fn close(&self) {
		self.window.lock().closed = true;
		self.period_changed.notify_waiters();
	}

	/// Returns whether [`Self::close`] has been called.
	pub fn is_closed(&self) -> bool {
		self.window.lock().closed
	}
}

fn unix_header(headers: &HeaderMap, name: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp(http::header_parse(headers, name)?).ok()
}

fn interrupted() -> Error {
	Error::hash("Interrupted while waiting for the hash quota to reset.", None)
}
