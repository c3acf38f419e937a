//! Signing-service client.
//!
//! [`SigningClient`] turns a [`HashRequest`] into one `POST` against the profile endpoint,
//! folds the response into a [`Hash`], and keeps the shared [`RateLimitState`] current from
//! every response it sees. In blocking mode quota exhaustion suspends the caller until the
//! period resets; otherwise it surfaces as [`Error::HashQuotaExceeded`].

// std
use std::time::Instant;
// crates.io
use oauth2::http::{Method, StatusCode};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	clock::Clock,
	error::{ConfigError, TransportError},
	hash::{
		Hash, HashFuture, HashObserver, HashProvider, HashReport, HashRequest, QuotaPolicy,
		RateLimitState, VersionProfile,
		wire::{SigningRequestBody, SigningResponseBody},
	},
	http::{HttpResponse, HttpTransport, RequestBuilder},
	obs::{self, Operation, OperationSpan, Outcome},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Default bound on transparent retries after `429` responses in blocking mode.
pub const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 5;

const BAD_REQUEST: &str = "Bad hash request!";
const UNAUTHORIZED: &str = "Unauthorized hash request!";
const THROTTLED: &str = "Exceeded hash limit!";
const QUOTA_EXHAUSTED: &str = "Hash quota exhausted for the current period.";

#[cfg(feature = "reqwest")]
/// Signing client specialized for the crate's default reqwest transport.
pub type ReqwestSigningClient = SigningClient<ReqwestHttpClient>;

/// Settings for one signing key.
#[derive(Clone, Debug)]
pub struct SigningConfig {
	/// Signing key sent as `X-AuthToken`.
	pub key: TokenSecret,
	/// Targeted service generation.
	pub profile: VersionProfile,
	/// Suspend on quota exhaustion instead of failing.
	///
	/// Waiting uses `tokio::time`, so blocking calls must run inside a Tokio runtime with the
	/// time driver enabled. Non-blocking calls have no runtime requirement.
	pub blocking: bool,
	/// Pre-flight exhaustion rule.
	pub quota_policy: QuotaPolicy,
	/// Retries after `429` in blocking mode before giving up.
	pub max_throttle_retries: u32,
}
impl SigningConfig {
	/// Creates a non-blocking configuration for `key` against `profile`.
	pub fn new(key: impl Into<String>, profile: VersionProfile) -> Self {
		Self {
			key: TokenSecret::new(key),
			profile,
			blocking: false,
			quota_policy: QuotaPolicy::default(),
			max_throttle_retries: DEFAULT_MAX_THROTTLE_RETRIES,
		}
	}

	/// Toggles blocking mode.
	pub fn with_blocking(mut self, blocking: bool) -> Self {
		self.blocking = blocking;

		self
	}

	/// Overrides the pre-flight exhaustion rule.
	pub fn with_quota_policy(mut self, policy: QuotaPolicy) -> Self {
		self.quota_policy = policy;

		self
	}

	/// Overrides the `429` retry bound used in blocking mode.
	pub fn with_max_throttle_retries(mut self, retries: u32) -> Self {
		self.max_throttle_retries = retries;

		self
	}

	/// Validates invariants for the configuration.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.key.is_empty() {
			return Err(ConfigError::EmptySigningKey);
		}

		self.profile.validate()
	}
}

/// [`HashProvider`] backed by the remote signing service.
pub struct SigningClient<C>
where
	C: ?Sized + HttpTransport,
{
	config: SigningConfig,
	state: Arc<RateLimitState>,
	http_client: Arc<C>,
	clock: Arc<dyn Clock>,
	observer: Option<Arc<dyn HashObserver>>,
}
impl<C> SigningClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client on top of the caller-provided transport and clock.
	///
	/// Clients signing with the same key must share `state`.
	pub fn with_http_client(
		config: SigningConfig,
		state: Arc<RateLimitState>,
		http_client: impl Into<Arc<C>>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { config, state, http_client: http_client.into(), clock, observer: None }
	}

	/// Attaches an observer notified once per signing call.
	pub fn with_observer(mut self, observer: Arc<dyn HashObserver>) -> Self {
		self.observer = Some(observer);

		self
	}

	/// Returns the client configuration.
	pub fn config(&self) -> &SigningConfig {
		&self.config
	}

	/// Returns the shared quota state.
	pub fn rate_limit(&self) -> &Arc<RateLimitState> {
		&self.state
	}

	async fn sign(&self, request: &HashRequest) -> Result<Hash> {
		let span = OperationSpan::new(Operation::Hash, "sign");
		let started = Instant::now();

		obs::record_outcome(Operation::Hash, Outcome::Attempt);

		let (result, status) = span.instrument(self.settle(request)).await;

		let latency = started.elapsed();
		let rate_limit = self.state.snapshot();

		obs::record_outcome(Operation::Hash, Outcome::of(&result));
		obs::record_latency(Operation::Hash, latency);

		if let Some(remaining) = rate_limit.remaining {
			obs::record_quota_remaining(remaining);
		}

		self.report(HashReport {
			latency,
			status,
			rate_limit,
			failure: result.as_ref().err().map(ToString::to_string),
		});

		result
	}

	/// Runs the call to its terminal outcome, returning the last HTTP status seen.
	async fn settle(&self, request: &HashRequest) -> (Result<Hash>, Option<u16>) {
		if let Err(e) = self.preflight().await {
			return (Err(e), None);
		}

		let body = match serde_json::to_vec(&SigningRequestBody::new(
			request,
			self.config.profile.location_encoding,
		)) {
			Ok(body) => body,
			Err(e) => return (Err(hash_error("Failed to encode the hash request.", None, e)), None),
		};
		let mut throttled = 0;

		loop {
			let response = match self.send(body.clone()).await {
				Ok(response) => response,
				Err(e) => return (Err(e), None),
			};
			let status = response.status();

			self.state.update_from_headers(response.headers());

			let message = service_message(&response);
			let result = match status {
				StatusCode::OK => parse_hash(&response),
				StatusCode::BAD_REQUEST =>
					Err(Error::hash(message.unwrap_or_else(|| BAD_REQUEST.into()), Some(400))),
				StatusCode::UNAUTHORIZED => Err(Error::HashUnauthorized {
					message: message.unwrap_or_else(|| UNAUTHORIZED.into()),
				}),
				StatusCode::NOT_FOUND => Err(Error::hash(
					format!("Hash endpoint {} not found (404).", self.config.profile.endpoint),
					Some(404),
				)),
				StatusCode::TOO_MANY_REQUESTS => {
					let message = message.unwrap_or_else(|| THROTTLED.into());

					if !self.config.blocking {
						Err(self.quota_exceeded(message))
					} else if throttled >= self.config.max_throttle_retries {
						Err(self.quota_exceeded(format!(
							"{message} (gave up after {throttled} throttled retries)"
						)))
					} else {
						throttled += 1;

						obs::warn(
							Operation::Hash,
							format_args!(
								"Throttled by the hash service ({throttled}/{}); waiting for the quota to reset.",
								self.config.max_throttle_retries
							),
						);

						if let Err(e) = self.state.wait_for_reset(self.clock.as_ref()).await {
							return (Err(e), Some(429));
						}

						continue;
					}
				},
				status => Err(Error::hash(
					match message {
						Some(message) => format!("{message} ({})", status.as_u16()),
						None => format!("Received unknown response code! ({})", status.as_u16()),
					},
					Some(status.as_u16()),
				)),
			};

			return (result, Some(status.as_u16()));
		}
	}

	async fn preflight(&self) -> Result<()> {
		let now = self.clock.now();
		let snapshot = self.state.snapshot();

		if !snapshot.is_exhausted(self.config.quota_policy, now) {
			return Ok(());
		}
		if !self.config.blocking {
			return Err(Error::HashQuotaExceeded {
				message: QUOTA_EXHAUSTED.into(),
				retry_in: snapshot.retry_in(now),
			});
		}

		obs::debug(Operation::Hash, "Hash quota exhausted; waiting for the period to reset.");

		self.state.wait_for_reset(self.clock.as_ref()).await
	}

	async fn send(&self, body: Vec<u8>) -> Result<HttpResponse> {
		let profile = &self.config.profile;
		let request = RequestBuilder::new(Method::POST, profile.endpoint.clone())
			.header("x-authtoken", self.config.key.expose())
			.header("content-type", "application/json")
			.header("user-agent", &profile.user_agent)
			.body(body)
			.build()
			.map_err(|e| hash_error("Failed to build the hash request.", None, TransportError::from(e)))?;

		self.http_client.execute(request).await.map_err(|e| {
			hash_error("Failed to perform the hash request.", None, TransportError::from(e))
		})
	}

	fn quota_exceeded(&self, message: String) -> Error {
		Error::HashQuotaExceeded { message, retry_in: self.state.snapshot().retry_in(self.clock.now()) }
	}

	fn report(&self, report: HashReport) {
		let Some(observer) = &self.observer else {
			return;
		};

		if let Err(e) = observer.on_report(&report) {
			obs::warn(Operation::Hash, format_args!("Hash observer failed: {e}."));
		}
	}
}
#[cfg(feature = "reqwest")]
impl SigningClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest transport and the system clock.
	pub fn new(config: SigningConfig, state: Arc<RateLimitState>) -> Result<Self> {
		config.validate()?;

		let http_client = ReqwestHttpClient::new()?;

		Ok(Self::with_http_client(config, state, http_client, crate::clock::system()))
	}
}
impl<C> HashProvider for SigningClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn provide<'a>(&'a self, request: &'a HashRequest) -> HashFuture<'a> {
		Box::pin(self.sign(request))
	}

	fn hash_version(&self) -> i32 {
		self.config.profile.hash_version
	}

	fn unk25(&self) -> i64 {
		self.config.profile.unk25
	}
}
impl<C> Debug for SigningClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SigningClient")
			.field("config", &self.config)
			.field("rate_limit", &self.state.snapshot())
			.field("observer", &self.observer.is_some())
			.finish()
	}
}

fn parse_hash(response: &HttpResponse) -> Result<Hash> {
	let mut deserializer = serde_json::Deserializer::from_slice(response.body());
	let body: SigningResponseBody = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| hash_error("Hash service returned a malformed payload.", Some(200), e))?;

	Ok(body.into())
}

/// Trimmed response body, when the service sent one.
fn service_message(response: &HttpResponse) -> Option<String> {
	let body = String::from_utf8_lossy(response.body());
	let body = body.trim();

	if body.is_empty() { None } else { Some(body.to_owned()) }
}

fn hash_error(
	message: &str,
	status: Option<u16>,
	source: impl 'static + Send + Sync + StdError,
) -> Error {
	Error::Hash { message: message.into(), status, source: Some(Box::new(source)) }
}
