//! Signing-service generations.
//!
//! The endpoint, version number, `unk25` constant, and coordinate encoding all drift between
//! service deployments. A [`VersionProfile`] pins one generation so a single
//! [`SigningClient`](crate::hash::SigningClient) can target any of them.

// self
use crate::{_prelude::*, error::ConfigError, http};

/// `User-Agent` sent to the signing service unless a profile overrides it.
pub const DEFAULT_SIGNING_USER_AGENT: &str = concat!("pogo-auth/", env!("CARGO_PKG_VERSION"));

const POKEHASH_V121_2_ENDPOINT: &str = "https://pokehash.buddyauth.com/api/v121_2/hash";

/// How coordinates are written into the signing request body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationEncoding {
	/// `latitude64`/`longitude64`/`accuracy64` carrying the IEEE-754 bit pattern as `i64`.
	#[default]
	BitPattern,
	/// `latitude`/`longitude`/`altitude` as plain JSON numbers.
	Decimal,
}

/// One signing-service generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionProfile {
	/// Human-readable label used in logs.
	pub name: String,
	/// Hash endpoint receiving the signing `POST`.
	pub endpoint: Url,
	/// Protocol version number reported through [`HashProvider`](crate::hash::HashProvider).
	pub hash_version: i32,
	/// Opaque constant that must track the deployed generation.
	pub unk25: i64,
	/// Body shape for coordinates.
	pub location_encoding: LocationEncoding,
	/// `User-Agent` header.
	pub user_agent: String,
}
impl VersionProfile {
	/// Starts a builder for a profile targeting `endpoint`.
	pub fn builder(endpoint: Url) -> VersionProfileBuilder {
		VersionProfileBuilder::new(endpoint)
	}

	/// PokeHash `v121_2` generation (hash version 5100, decimal coordinates).
	pub fn pokehash_v121_2() -> Self {
		Self {
			name: "pokehash-v121_2".into(),
			endpoint: Url::parse(POKEHASH_V121_2_ENDPOINT)
				.unwrap_or_else(|_| unreachable!("invalid built-in URL: {POKEHASH_V121_2_ENDPOINT}")),
			hash_version: 5100,
			unk25: -8_832_040_574_896_607_694,
			location_encoding: LocationEncoding::Decimal,
			user_agent: DEFAULT_SIGNING_USER_AGENT.into(),
		}
	}

	/// Validates invariants for the profile.
	pub fn validate(&self) -> Result<(), ConfigError> {
		http::ensure_secure_endpoint("hash", &self.endpoint)
	}
}

/// Builder for [`VersionProfile`] values.
#[derive(Debug)]
pub struct VersionProfileBuilder {
	profile: VersionProfile,
}
impl VersionProfileBuilder {
	fn new(endpoint: Url) -> Self {
		Self {
			profile: VersionProfile {
				name: endpoint.host_str().unwrap_or("custom").to_owned(),
				endpoint,
				hash_version: 0,
				unk25: 0,
				location_encoding: LocationEncoding::default(),
				user_agent: DEFAULT_SIGNING_USER_AGENT.into(),
			},
		}
	}

	/// Sets the log label.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.profile.name = name.into();

		self
	}

	/// Sets the protocol version number.
	pub fn hash_version(mut self, hash_version: i32) -> Self {
		self.profile.hash_version = hash_version;

		self
	}

	/// Sets the `unk25` constant.
	pub fn unk25(mut self, unk25: i64) -> Self {
		self.profile.unk25 = unk25;

		self
	}

	/// Sets the coordinate encoding.
	pub fn location_encoding(mut self, encoding: LocationEncoding) -> Self {
		self.profile.location_encoding = encoding;

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.profile.user_agent = user_agent.into();

		self
	}

	/// Consumes the builder and validates the resulting profile.
	pub fn build(self) -> Result<VersionProfile, ConfigError> {
		self.profile.validate()?;

		Ok(self.profile)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn pokehash_profile_matches_deployed_generation() {
		let profile = VersionProfile::pokehash_v121_2();

		assert_eq!(profile.endpoint.as_str(), POKEHASH_V121_2_ENDPOINT);
		assert_eq!(profile.hash_version, 5100);
		assert_eq!(profile.unk25, -8832040574896607694);
		assert_eq!(profile.location_encoding, LocationEncoding::Decimal);
		assert!(profile.validate().is_ok());
	}

	#[test]
	fn builder_defaults_to_bit_patterns() {
		let profile = VersionProfile::builder(
			Url::parse("https://hash.example.com/api/v1/hash").expect("Fixture URL should parse."),
		)
		.hash_version(5704)
		.build()
		.expect("HTTPS profile should build.");

		assert_eq!(profile.name, "hash.example.com");
		assert_eq!(profile.location_encoding, LocationEncoding::BitPattern);
		assert_eq!(profile.user_agent, DEFAULT_SIGNING_USER_AGENT);
	}

	#[test]
	fn builder_rejects_plain_http_endpoints() {
		let err = VersionProfile::builder(
			Url::parse("http://hash.example.com/api/v1/hash").expect("Fixture URL should parse."),
		)
		.build()
		.expect_err("Plain HTTP endpoint should be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "hash", .. }));
	}
}
