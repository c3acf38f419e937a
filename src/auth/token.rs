//! Session ticket state owned by credential providers.

pub mod secret;

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret, error::ConfigError};

/// Session ticket plus the instant after which it must not be used.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialToken {
	/// Ticket value; callers must avoid logging it.
	pub token: TokenSecret,
	/// Expiry instant recorded when the ticket was issued.
	pub expires_at: OffsetDateTime,
}
impl CredentialToken {
	/// Creates a token that expires `lifetime` after `issued_at`.
	///
	/// Fails with [`ConfigError::ExpiryOutOfRange`] when the expiry cannot be represented.
	pub fn issued(
		token: impl Into<String>,
		issued_at: OffsetDateTime,
		lifetime: Duration,
	) -> Result<Self, ConfigError> {
		let expires_at = issued_at.checked_add(lifetime).ok_or(ConfigError::ExpiryOutOfRange)?;

		Ok(Self { token: TokenSecret::new(token), expires_at })
	}

	/// Returns `true` once `instant` is strictly past the recorded expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant > self.expires_at
	}
}
impl Debug for CredentialToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialToken")
			.field("token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
