//! PTC single-sign-on ticket exchange.
//!
//! One attempt walks `FetchLoginContext → SubmitCredentials → ExtractTicket`: fetch the
//! one-time `lt`/`execution` pair from the authorize endpoint, post the credential form to
//! the CAS login endpoint, surface any structured error payload, and finally read the
//! `CASTGC` ticket from the `Set-Cookie` headers. Failed attempts restart the whole exchange
//! with a fresh cookie jar until the retry budget runs out.

// crates.io
use oauth2::http::Method;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::ptc::{
		config::PtcConfig,
		cookie::{self, LoginCookieJar},
	},
	error::{LoginError, TransportError},
	http::{HttpResponse, HttpTransport, RequestBuilder},
	obs::{self, Operation},
};

const EVENT_ID: &str = "submit";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Stages of a single login attempt, used to label failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoginStage {
	/// GET on the authorize endpoint for the `lt`/`execution` pair.
	FetchLoginContext,
	/// POST of the credential form to the login endpoint.
	SubmitCredentials,
	/// Ticket lookup in the login response cookies.
	ExtractTicket,
}
impl LoginStage {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			LoginStage::FetchLoginContext => "fetch_login_context",
			LoginStage::SubmitCredentials => "submit_credentials",
			LoginStage::ExtractTicket => "extract_ticket",
		}
	}
}
impl Display for LoginStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One-time login context handed out by the authorize endpoint.
#[derive(Debug, Deserialize)]
struct LoginContext {
	lt: String,
	execution: String,
}

/// Error payload returned by the login endpoint on rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SsoErrorPayload {
	error: Option<String>,
	errors: Option<Vec<String>>,
}
impl SsoErrorPayload {
	/// Single `error` wins; otherwise every `errors` entry is quoted and comma-joined.
	pub(crate) fn message(&self) -> Option<String> {
		if let Some(error) = self.error.as_deref().filter(|error| !error.is_empty()) {
			return Some(error.to_owned());
		}

		let errors = self.errors.as_deref().filter(|errors| !errors.is_empty())?;

		Some(errors.iter().map(|error| format!("\"{error}\"")).collect::<Vec<_>>().join(", "))
	}
}

/// Drives the SSO exchange for one provider call.
pub(crate) struct LoginFlow<'a, C>
where
	C: ?Sized + HttpTransport,
{
	config: &'a PtcConfig,
	transport: &'a C,
}
impl<'a, C> LoginFlow<'a, C>
where
	C: ?Sized + HttpTransport,
{
	pub(crate) fn new(config: &'a PtcConfig, transport: &'a C) -> Self {
		Self { config, transport }
	}

	/// Runs up to `attempts` full exchanges and returns the ticket of the first success.
	pub(crate) async fn run(&self, username: &str, password: &str, attempts: u32) -> Result<String> {
		let attempts = attempts.max(1);
		let mut attempt = 1;

		loop {
			let err = match self.attempt(username, password).await {
				Ok(ticket) => return Ok(ticket),
				Err(err) => err,
			};

			match &err {
				LoginError::Rejected { message } if is_credential_rejection(message) =>
					return Err(Error::InvalidCredentials { message: message.clone() }),
				_ => (),
			}
			if attempt >= attempts {
				return Err(Error::LoginFailed { attempts: attempt, source: err });
			}

			obs::warn(
				Operation::Login,
				format_args!("Login attempt {attempt}/{attempts} failed: {err}. Retrying."),
			);

			attempt += 1;
		}
	}

	async fn attempt(&self, username: &str, password: &str) -> Result<String, LoginError> {
		let mut jar = LoginCookieJar::default();
		let context = self.fetch_login_context(&mut jar).await?;
		let response = self.submit_credentials(&mut jar, &context, username, password).await?;
		let body = String::from_utf8_lossy(response.body()).into_owned();

		if !body.is_empty() {
			let payload: SsoErrorPayload = parse_json(LoginStage::SubmitCredentials, &body)?;

			if let Some(message) = payload.message() {
				return Err(LoginError::Rejected { message });
			}
		}

		cookie::extract_ticket(&response).ok_or(LoginError::MissingTicket { body })
	}

	async fn fetch_login_context(
		&self,
		jar: &mut LoginCookieJar,
	) -> Result<LoginContext, LoginError> {
		const STAGE: LoginStage = LoginStage::FetchLoginContext;

		let mut url = self.config.endpoints.authorize.clone();

		url.query_pairs_mut()
			.append_pair("client_id", &self.config.client_id)
			.append_pair("redirect_uri", self.config.redirect_uri.as_str())
			.append_pair("locale", &self.config.locale);

		let response = self.send(STAGE, jar, RequestBuilder::new(Method::GET, url)).await?;

		if response.status().is_server_error() {
			return Err(LoginError::Status { stage: STAGE, status: response.status().as_u16() });
		}

		parse_json(STAGE, &String::from_utf8_lossy(response.body()))
	}

	async fn submit_credentials(
		&self,
		jar: &mut LoginCookieJar,
		context: &LoginContext,
		username: &str,
		password: &str,
	) -> Result<HttpResponse, LoginError> {
		const STAGE: LoginStage = LoginStage::SubmitCredentials;

		let mut url = self.config.endpoints.login.clone();

		url.query_pairs_mut().append_pair("service", self.config.endpoints.service.as_str());

		let form = form_urlencoded::Serializer::new(String::new())
			.append_pair("lt", &context.lt)
			.append_pair("execution", &context.execution)
			.append_pair("_eventId", EVENT_ID)
			.append_pair("locale", &self.config.locale)
			.append_pair("username", username)
			.append_pair("password", password)
			.finish();
		let request = RequestBuilder::new(Method::POST, url)
			.header("content-type", FORM_CONTENT_TYPE)
			.body(form.into_bytes());
		let response = self.send(STAGE, jar, request).await?;

		if response.status().is_server_error() {
			return Err(LoginError::Status { stage: STAGE, status: response.status().as_u16() });
		}

		Ok(response)
	}

	async fn send(
		&self,
		stage: LoginStage,
		jar: &mut LoginCookieJar,
		request: RequestBuilder,
	) -> Result<HttpResponse, LoginError> {
		let url = request.url().clone();
		let identity = &self.config.identity;
		let mut request = request
			.header("user-agent", &identity.user_agent)
			.header("x-unity-version", &identity.unity_version)
			.header("accept-language", &identity.accept_language);

		if let Some(cookies) = jar.header_for(&url) {
			request = request.header("cookie", &cookies);
		}

		let request = request
			.build()
			.map_err(|e| LoginError::Transport { stage, source: TransportError::Request(e) })?;
		let response = self
			.transport
			.execute(request)
			.await
			.map_err(|e| LoginError::Transport { stage, source: TransportError::from(e) })?;

		jar.save_from_response(&url, &response);

		Ok(response)
	}
}

/// Messages that point at the username/password pair rather than the exchange itself.
pub(crate) fn is_credential_rejection(message: &str) -> bool {
	let lowered = message.to_ascii_lowercase();

	["password", "username", "credentials"].iter().any(|needle| lowered.contains(needle))
}

fn parse_json<T>(stage: LoginStage, body: &str) -> Result<T, LoginError>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_str(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| LoginError::Parse { stage, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn payload(raw: &str) -> SsoErrorPayload {
		serde_json::from_str(raw).expect("Error payload fixture should parse.")
	}

	#[test]
	fn single_error_is_used_verbatim() {
		assert_eq!(payload(r#"{"error":"bad creds"}"#).message(), Some("bad creds".into()));
	}

	#[test]
	fn multiple_errors_are_quoted_and_joined() {
		assert_eq!(payload(r#"{"errors":["a","b"]}"#).message(), Some("\"a\", \"b\"".into()));
		assert_eq!(payload(r#"{"errors":["only"]}"#).message(), Some("\"only\"".into()));
	}

	#[test]
	fn empty_payloads_carry_no_message() {
		assert_eq!(payload("{}").message(), None);
		assert_eq!(payload(r#"{"error":"","errors":[]}"#).message(), None);
	}

	#[test]
	fn credential_rejections_are_recognized() {
		assert!(is_credential_rejection("Your username or password is incorrect."));
		assert!(is_credential_rejection("Invalid CREDENTIALS"));
		assert!(!is_credential_rejection("bad creds"));
		assert!(!is_credential_rejection("Service unavailable"));
	}

	#[test]
	fn parse_failures_name_the_stage() {
		let err = parse_json::<SsoErrorPayload>(LoginStage::SubmitCredentials, "<html>")
			.expect_err("HTML body should not parse.");

		assert!(matches!(err, LoginError::Parse { stage: LoginStage::SubmitCredentials, .. }));
	}
}
