//! PTC single-sign-on settings: endpoints, device identity, token lifetime, retry policy.

// self
use crate::{_prelude::*, error::ConfigError, http};

/// Hard ceiling on login attempts per call, whatever the configured bound.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;

const DEFAULT_AUTHORIZE_URL: &str = "https://sso.pokemon.com/sso/oauth2.0/authorize";
const DEFAULT_LOGIN_URL: &str = "https://sso.pokemon.com/sso/login";
const DEFAULT_SERVICE_URL: &str = "https://sso.pokemon.com/sso/oauth2.0/callbackAuthorize";
const DEFAULT_REDIRECT_URI: &str = "https://www.nianticlabs.com/pokemongo/error";
const DEFAULT_CLIENT_ID: &str = "mobile-app_pokemon-go";
const DEFAULT_LOCALE: &str = "en_US";
/// Seconds the SSO service honors a ticket; configured lifetimes may not exceed it.
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 7200;

// Refresh a little before the service-side validity runs out.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7195;

/// SSO endpoints contacted by the login flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoEndpoints {
	/// OAuth authorize endpoint that hands out the login context.
	pub authorize: Url,
	/// CAS login endpoint receiving the credential form.
	pub login: Url,
	/// Callback passed as the `service` query parameter on login.
	pub service: Url,
}
impl Default for SsoEndpoints {
	fn default() -> Self {
		Self {
			authorize: default_url(DEFAULT_AUTHORIZE_URL),
			login: default_url(DEFAULT_LOGIN_URL),
			service: default_url(DEFAULT_SERVICE_URL),
		}
	}
}

/// Device identity headers presented on every SSO request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
	/// `User-Agent` header.
	pub user_agent: String,
	/// `X-Unity-Version` header.
	pub unity_version: String,
	/// `Accept-Language` header.
	pub accept_language: String,
}
impl Default for DeviceIdentity {
	fn default() -> Self {
		Self {
			user_agent: "pokemongo/1 CFNetwork/811.4.18 Darwin/16.5.0".into(),
			unity_version: "5.5.1f1".into(),
			accept_language: "en-US".into(),
		}
	}
}

/// Whole-flow retry policy for the login exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Retries only happen while this is set.
	pub enabled: bool,
	/// Total attempts per login, clamped to `1..=MAX_LOGIN_ATTEMPTS`.
	pub max_attempts: u32,
}
impl RetryPolicy {
	/// Policy that performs exactly one attempt.
	pub const fn disabled() -> Self {
		Self { enabled: false, max_attempts: 1 }
	}

	/// Number of attempts a login call may perform.
	pub fn attempts(&self) -> u32 {
		if self.enabled { self.max_attempts.clamp(1, MAX_LOGIN_ATTEMPTS) } else { 1 }
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { enabled: true, max_attempts: MAX_LOGIN_ATTEMPTS }
	}
}

/// Validated PTC login configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PtcConfig {
	/// SSO endpoints.
	pub endpoints: SsoEndpoints,
	/// Device identity headers.
	pub identity: DeviceIdentity,
	/// OAuth client identifier sent to the authorize endpoint.
	pub client_id: String,
	/// Redirect URI sent to the authorize endpoint.
	pub redirect_uri: Url,
	/// Locale sent as a query parameter and form field.
	pub locale: String,
	/// Seconds a fresh ticket is considered valid.
	pub token_lifetime_secs: i64,
	/// Retry policy for the whole flow.
	pub retry: RetryPolicy,
}
impl PtcConfig {
	/// Returns a builder seeded with the production defaults.
	pub fn builder() -> PtcConfigBuilder {
		PtcConfigBuilder::default()
	}

	/// Ticket lifetime as a [`Duration`].
	pub fn token_lifetime(&self) -> Duration {
		Duration::seconds(self.token_lifetime_secs)
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		http::ensure_secure_endpoint("authorize", &self.endpoints.authorize)?;
		http::ensure_secure_endpoint("login", &self.endpoints.login)?;
		http::ensure_secure_endpoint("service", &self.endpoints.service)?;

		if self.token_lifetime_secs <= 0 {
			return Err(ConfigError::NonPositiveTokenLifetime);
		}
		if self.token_lifetime_secs > MAX_TOKEN_LIFETIME_SECS {
			return Err(ConfigError::TokenLifetimeTooLong {
				secs: self.token_lifetime_secs,
				max_secs: MAX_TOKEN_LIFETIME_SECS,
			});
		}

		Ok(())
	}
}
impl Default for PtcConfig {
	fn default() -> Self {
		Self {
			endpoints: SsoEndpoints::default(),
			identity: DeviceIdentity::default(),
			client_id: DEFAULT_CLIENT_ID.into(),
			redirect_uri: default_url(DEFAULT_REDIRECT_URI),
			locale: DEFAULT_LOCALE.into(),
			token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
			retry: RetryPolicy::default(),
		}
	}
}

/// Builder for [`PtcConfig`] values.
#[derive(Debug, Default)]
pub struct PtcConfigBuilder {
	config: PtcConfig,
}
impl PtcConfigBuilder {
	/// Overrides the SSO endpoints.
	pub fn endpoints(mut self, endpoints: SsoEndpoints) -> Self {
		self.config.endpoints = endpoints;

		self
	}

	/// Overrides the device identity headers.
	pub fn identity(mut self, identity: DeviceIdentity) -> Self {
		self.config.identity = identity;

		self
	}

	/// Overrides the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.config.client_id = client_id.into();

		self
	}

	/// Overrides the redirect URI.
	pub fn redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.config.redirect_uri = redirect_uri;

		self
	}

	/// Overrides the locale.
	pub fn locale(mut self, locale: impl Into<String>) -> Self {
		self.config.locale = locale.into();

		self
	}

	/// Overrides the ticket lifetime.
	pub fn token_lifetime(mut self, lifetime: Duration) -> Self {
		self.config.token_lifetime_secs = lifetime.whole_seconds();

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, retry: RetryPolicy) -> Self {
		self.config.retry = retry;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<PtcConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn default_url(raw: &'static str) -> Url {
	// Constants above are valid absolute URLs.
	Url::parse(raw).unwrap_or_else(|_| unreachable!("invalid built-in URL: {raw}"))
}
