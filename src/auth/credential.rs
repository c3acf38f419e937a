//! Credential provider contract consumed by the request envelope builder.
//!
//! Every outgoing API request calls [`CredentialProvider::auth_info`] first. Providers keep
//! their session ticket in memory and only touch the network when the ticket is missing,
//! expired, or an explicit refresh is requested.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Auxiliary value the game client stamps into every auth token fragment.
pub const AUTH_TOKEN_UNKNOWN2: i32 = 59;

/// Boxed future returned by [`CredentialProvider`] operations.
pub type CredentialFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Capability that supplies session credentials for outgoing requests.
///
/// Implementations use interior mutability so one provider can be shared behind an `Arc`.
/// Concurrent refreshes on the same instance are not deduplicated: two callers that both
/// request `refresh = true` may both perform a login, and the last one to finish wins.
pub trait CredentialProvider
where
	Self: Send + Sync,
{
	/// Short provider label written into [`AuthInfo::provider`].
	fn provider_name(&self) -> &'static str;

	/// Returns the current session ticket, logging in first when `refresh` is set or the
	/// ticket expired.
	fn token_id(&self, refresh: bool) -> CredentialFuture<'_, TokenSecret>;

	/// Returns a freshly built [`AuthInfo`], logging in first when `refresh` is set or the
	/// ticket expired.
	fn auth_info(&self, refresh: bool) -> CredentialFuture<'_, AuthInfo>;

	/// Returns `true` once the injected clock is strictly past the recorded expiry.
	fn is_token_id_expired(&self) -> bool;

	/// Clears the ticket and its expiry unconditionally.
	fn reset(&self);
}

/// Credential fragment attached to each request envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthInfo {
	/// Provider label (`"ptc"` for Pokémon Trainer Club).
	pub provider: String,
	/// Token fragment.
	pub token: AuthToken,
}
impl AuthInfo {
	/// Builds the fragment for `provider` around `contents`.
	pub fn new(provider: impl Into<String>, contents: TokenSecret) -> Self {
		Self { provider: provider.into(), token: AuthToken { contents, unknown2: AUTH_TOKEN_UNKNOWN2 } }
	}
}
impl Debug for AuthInfo {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthInfo").field("provider", &self.provider).field("token", &self.token).finish()
	}
}

/// Token part of [`AuthInfo`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
	/// Session ticket.
	pub contents: TokenSecret,
	/// Fixed auxiliary value, always [`AUTH_TOKEN_UNKNOWN2`].
	pub unknown2: i32,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn auth_info_carries_fixed_auxiliary_field() {
		let info = AuthInfo::new("ptc", TokenSecret::new("TGT-1"));

		assert_eq!(info.provider, "ptc");
		assert_eq!(info.token.contents.expose(), "TGT-1");
		assert_eq!(info.token.unknown2, 59);
		assert!(!format!("{info:?}").contains("TGT-1"));
	}
}
