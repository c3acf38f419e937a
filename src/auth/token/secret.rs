//! Redacting wrapper for session tickets and signing keys.

// self
use crate::_prelude::*;

/// Ticket or key material that never shows up in `Debug`/`Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value, for building request headers and form bodies only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// An empty signing key or ticket is never usable.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn keys_and_tickets_stay_out_of_logs() {
		let key = TokenSecret::new("sekrit-signing-key");
		let rendered = format!("{key:?} {key} {:?}", Some(&key));

		assert!(!rendered.contains("sekrit"));
		assert_eq!(format!("{key:?}"), "TokenSecret(<redacted>)");
		assert_eq!(key.expose(), "sekrit-signing-key");
		assert!(TokenSecret::new("").is_empty());
	}

	#[test]
	fn serializes_as_a_bare_string() {
		let secret: TokenSecret = serde_json::from_str("\"TGT-1\"").expect("Secret should deserialize.");

		assert_eq!(secret.expose(), "TGT-1");
		assert_eq!(serde_json::to_string(&secret).expect("Secret should serialize."), "\"TGT-1\"");
	}
}
