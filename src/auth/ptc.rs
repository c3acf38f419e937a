//! Pokémon Trainer Club credential provider.
//!
//! [`PtcCredentialProvider`] keeps the `CASTGC` session ticket in memory, hands it out
//! while it is fresh, and re-runs the single-sign-on exchange whenever the ticket expired
//! or the caller forces a refresh. The ticket lifetime is deliberately shorter than the
//! service-side validity so refreshes happen ahead of rejections.

pub mod config;
pub mod cookie;
pub mod login;

pub use config::*;
pub use cookie::TICKET_COOKIE;
pub use login::LoginStage;

// std
use std::{
	sync::atomic::{AtomicBool, Ordering},
	time::Instant,
};
// self
use crate::{
	_prelude::*,
	auth::{AuthInfo, CredentialFuture, CredentialProvider, CredentialToken, TokenSecret},
	clock::Clock,
	http::HttpTransport,
	obs::{self, Operation, OperationSpan, Outcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Provider label written into [`AuthInfo`].
pub const PTC_PROVIDER: &str = "ptc";

#[cfg(feature = "reqwest")]
/// Provider specialized for the crate's default reqwest transport.
pub type ReqwestPtcCredentialProvider = PtcCredentialProvider<ReqwestHttpClient>;

/// Credential provider backed by the PTC single-sign-on flow.
pub struct PtcCredentialProvider<C>
where
	C: ?Sized + HttpTransport,
{
	config: PtcConfig,
	username: String,
	password: TokenSecret,
	http_client: Arc<C>,
	clock: Arc<dyn Clock>,
	token: Mutex<Option<CredentialToken>>,
	retry_enabled: AtomicBool,
}
impl<C> PtcCredentialProvider<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a provider on top of the caller-provided transport and clock.
	///
	/// The configuration is validated here; no network call happens until the first
	/// credential request (or [`Self::login`]).
	pub fn with_http_client(
		config: PtcConfig,
		username: impl Into<String>,
		password: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		config.validate()?;

		let retry_enabled = AtomicBool::new(config.retry.enabled);

		Ok(Self {
			config,
			username: username.into(),
			password: TokenSecret::new(password),
			http_client: http_client.into(),
			clock,
			token: Mutex::new(None),
			retry_enabled,
		})
	}

	/// Returns the configuration this provider logs in with.
	pub fn config(&self) -> &PtcConfig {
		&self.config
	}

	/// Enables or disables login retries for subsequent calls.
	pub fn set_retry_enabled(&self, enabled: bool) {
		self.retry_enabled.store(enabled, Ordering::Relaxed);
	}

	/// Returns whether login retries are currently enabled.
	pub fn retry_enabled(&self) -> bool {
		self.retry_enabled.load(Ordering::Relaxed)
	}

	/// Returns a copy of the stored ticket state, if any.
	pub fn current_token(&self) -> Option<CredentialToken> {
		self.token.lock().clone()
	}

	/// Runs the SSO exchange unconditionally and stores the resulting ticket.
	pub async fn login(&self) -> Result<CredentialToken> {
		let span = OperationSpan::new(Operation::Login, "ptc_login");
		let started = Instant::now();

		obs::record_outcome(Operation::Login, Outcome::Attempt);

		let result = span
			.instrument(async {
				let policy =
					RetryPolicy { enabled: self.retry_enabled(), ..self.config.retry };
				let ticket = login::LoginFlow::new(&self.config, self.http_client.as_ref())
					.run(&self.username, self.password.expose(), policy.attempts())
					.await?;
				let token =
					CredentialToken::issued(ticket, self.clock.now(), self.config.token_lifetime())?;

				*self.token.lock() = Some(token.clone());

				Ok(token)
			})
			.await;

		obs::record_outcome(Operation::Login, Outcome::of(&result));
		obs::record_latency(Operation::Login, started.elapsed());

		result
	}

	async fn fresh_token(&self, refresh: bool) -> Result<TokenSecret> {
		if !refresh {
			let now = self.clock.now();
			let cached = self.token.lock().as_ref().filter(|token| !token.is_expired_at(now)).cloned();

			if let Some(token) = cached {
				return Ok(token.token);
			}
		}

		Ok(self.login().await?.token)
	}
}
#[cfg(feature = "reqwest")]
impl PtcCredentialProvider<ReqwestHttpClient> {
	/// Creates a provider with its own reqwest transport and the system clock.
	pub fn new(
		config: PtcConfig,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Self> {
		config.validate()?;

		let http_client = ReqwestHttpClient::new()?;

		Self::with_http_client(config, username, password, http_client, crate::clock::system())
	}

	/// Creates a provider and logs in immediately.
	pub async fn connect(
		config: PtcConfig,
		username: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Self> {
		let provider = Self::new(config, username, password)?;

		provider.login().await?;

		Ok(provider)
	}
}
impl<C> CredentialProvider for PtcCredentialProvider<C>
where
	C: ?Sized + HttpTransport,
{
	fn provider_name(&self) -> &'static str {
		PTC_PROVIDER
	}

	fn token_id(&self, refresh: bool) -> CredentialFuture<'_, TokenSecret> {
		Box::pin(self.fresh_token(refresh))
	}

	fn auth_info(&self, refresh: bool) -> CredentialFuture<'_, AuthInfo> {
		Box::pin(async move {
			let token = self.fresh_token(refresh).await?;

			Ok(AuthInfo::new(PTC_PROVIDER, token))
		})
	}

	fn is_token_id_expired(&self) -> bool {
		let now = self.clock.now();

		self.token.lock().as_ref().is_none_or(|token| token.is_expired_at(now))
	}

	fn reset(&self) {
		*self.token.lock() = None;
	}
}
impl<C> Debug for PtcCredentialProvider<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PtcCredentialProvider")
			.field("username", &self.username)
			.field("token", &*self.token.lock())
			.field("retry_enabled", &self.retry_enabled())
			.finish()
	}
}
