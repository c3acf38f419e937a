//! PTC single-sign-on credentials and rate-limit-aware request signing for Pokémon GO API
//! clients. Refresh session tickets on demand and hash every envelope without tripping the quota.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod error;
pub mod hash;
pub mod http;
pub mod obs;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{PtcConfig, PtcCredentialProvider, SsoEndpoints},
		clock::{Clock, ManualClock},
		hash::{LocationEncoding, RateLimitState, SigningClient, SigningConfig, VersionProfile},
		http::ReqwestHttpClient,
	};

	/// PTC provider type alias used by reqwest-backed integration tests.
	pub type ReqwestTestProvider = PtcCredentialProvider<ReqwestHttpClient>;
	/// Signing client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSigner = SigningClient<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Fixed instant every [`ManualClock`] fixture starts from.
	pub fn test_epoch() -> OffsetDateTime {
		time::macros::datetime!(2025-01-01 00:00 UTC)
	}

	/// Builds a [`PtcConfig`] whose SSO endpoints point at the provided mock base URL.
	pub fn test_ptc_config(base: &str) -> PtcConfig {
		let endpoints = SsoEndpoints {
			authorize: Url::parse(&format!("{base}/sso/oauth2.0/authorize"))
				.expect("Mock authorize endpoint should parse."),
			login: Url::parse(&format!("{base}/sso/login"))
				.expect("Mock login endpoint should parse."),
			service: Url::parse(&format!("{base}/sso/oauth2.0/callbackAuthorize"))
				.expect("Mock service endpoint should parse."),
		};

		PtcConfig::builder().endpoints(endpoints).build().expect("Mock PTC config should build.")
	}

	/// Constructs a reqwest-backed [`PtcCredentialProvider`] driven by a [`ManualClock`].
	pub fn build_reqwest_test_provider(
		base: &str,
		username: &str,
		password: &str,
	) -> (ReqwestTestProvider, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(test_epoch()));
		let shared: Arc<dyn Clock> = clock.clone();
		let provider = PtcCredentialProvider::with_http_client(
			test_ptc_config(base),
			username,
			password,
			test_reqwest_http_client(),
			shared,
		)
		.expect("Mock PTC provider should build.");

		(provider, clock)
	}

	/// Builds a bit-pattern [`VersionProfile`] that targets the provided mock endpoint.
	pub fn test_profile(endpoint: &str) -> VersionProfile {
		VersionProfile::builder(
			Url::parse(endpoint).expect("Mock signing endpoint should parse."),
		)
		.name("mock")
		.hash_version(5704)
		.unk25(-816_976_800_928_766_045)
		.location_encoding(LocationEncoding::BitPattern)
		.build()
		.expect("Mock version profile should build.")
	}

	/// Constructs a reqwest-backed [`SigningClient`] plus its shared [`RateLimitState`].
	pub fn build_reqwest_test_signer(
		endpoint: &str,
		key: &str,
		blocking: bool,
	) -> (ReqwestTestSigner, Arc<RateLimitState>, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(test_epoch()));
		let shared: Arc<dyn Clock> = clock.clone();
		let state = Arc::new(RateLimitState::default());
		let config = SigningConfig::new(key, test_profile(endpoint)).with_blocking(blocking);
		let signer = SigningClient::with_http_client(
			config,
			state.clone(),
			test_reqwest_http_client(),
			shared,
		);

		(signer, state, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
