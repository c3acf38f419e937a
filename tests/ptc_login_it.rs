// crates.io
use httpmock::prelude::*;
// self
use pogo_auth::{
	_preludet::*,
	auth::{CredentialProvider, LoginStage, PtcConfig, PtcCredentialProvider, RetryPolicy},
	clock::{Clock, ManualClock},
	error::LoginError,
};

const USERNAME: &str = "ash";
const PASSWORD: &str = "pikachu";
const AUTHORIZE_PATH: &str = "/sso/oauth2.0/authorize";
const LOGIN_PATH: &str = "/sso/login";
const CONTEXT_BODY: &str = "{\"lt\":\"LT-1-abc\",\"execution\":\"e1s1\"}";

async fn mock_login_context<'a>(server: &'a MockServer) -> httpmock::Mock<'a> {
	server
		.mock_async(|when, then| {
			when.method(GET)
				.path(AUTHORIZE_PATH)
				.query_param("client_id", "mobile-app_pokemon-go")
				.query_param("redirect_uri", "https://www.nianticlabs.com/pokemongo/error")
				.query_param("locale", "en_US")
				.header("user-agent", "pokemongo/1 CFNetwork/811.4.18 Darwin/16.5.0")
				.header("x-unity-version", "5.5.1f1");
			then.status(200)
				.header("content-type", "application/json")
				.header("set-cookie", "JSESSIONID=s1; Path=/sso")
				.body(CONTEXT_BODY);
		})
		.await
}

async fn mock_login_success<'a>(server: &'a MockServer, ticket: &str) -> httpmock::Mock<'a> {
	let service = server.url("/sso/oauth2.0/callbackAuthorize");
	let cookie = format!("CASTGC={ticket}; Path=/sso; Secure");

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(LOGIN_PATH)
				.query_param("service", service)
				.header("content-type", "application/x-www-form-urlencoded")
				.header("cookie", "JSESSIONID=s1");
			then.status(302)
				.header("location", "https://www.nianticlabs.com/pokemongo/error?ticket=ST-1")
				.header("set-cookie", cookie);
		})
		.await
}

#[tokio::test]
async fn login_extracts_ticket_and_reuses_it_until_expiry() {
	let server = MockServer::start_async().await;
	let context = mock_login_context(&server).await;
	let login = mock_login_success(&server, "TGT-42-abc").await;
	let (provider, clock) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	assert!(provider.is_token_id_expired());

	let info = provider.auth_info(false).await.expect("Initial login should succeed.");

	assert_eq!(info.provider, "ptc");
	assert_eq!(info.token.contents.expose(), "TGT-42-abc");
	assert_eq!(info.token.unknown2, 59);
	assert!(!provider.is_token_id_expired());

	let cached = provider.token_id(false).await.expect("Fresh ticket should be served from memory.");

	assert_eq!(cached.expose(), "TGT-42-abc");
	context.assert_calls_async(1).await;
	login.assert_calls_async(1).await;

	clock.advance(Duration::seconds(7195));

	assert!(!provider.is_token_id_expired());

	clock.advance(Duration::seconds(1));

	assert!(provider.is_token_id_expired());

	provider.auth_info(false).await.expect("Expired ticket should trigger a new login.");
	context.assert_calls_async(2).await;
	login.assert_calls_async(2).await;

	provider.auth_info(true).await.expect("Forced refresh should log in again.");
	login.assert_calls_async(3).await;

	let token = provider.current_token().expect("Ticket state should be stored after login.");

	assert_eq!(token.expires_at, clock.now() + Duration::seconds(7195));
}

#[tokio::test]
async fn reset_forces_the_next_call_to_log_in() {
	let server = MockServer::start_async().await;
	let _context = mock_login_context(&server).await;
	let login = mock_login_success(&server, "TGT-7").await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	provider.login().await.expect("Explicit login should succeed.");
	provider.reset();

	assert!(provider.is_token_id_expired());
	assert!(provider.current_token().is_none());

	provider.token_id(false).await.expect("Login after reset should succeed.");
	login.assert_calls_async(2).await;
}

#[tokio::test]
async fn joined_error_payload_is_retried_until_exhausted() {
	let server = MockServer::start_async().await;
	let context = mock_login_context(&server).await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"errors\":[\"a\",\"b\"]}");
		})
		.await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);
	let err = provider.auth_info(false).await.expect_err("Rejected logins should fail.");

	match err {
		Error::LoginFailed { attempts, source: LoginError::Rejected { message } } => {
			assert_eq!(attempts, 5);
			assert_eq!(message, "\"a\", \"b\"");
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	context.assert_calls_async(5).await;
	login.assert_calls_async(5).await;
	assert!(provider.current_token().is_none());
}

#[tokio::test]
async fn single_error_payload_surfaces_its_message() {
	let server = MockServer::start_async().await;
	let _context = mock_login_context(&server).await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200).header("content-type", "application/json").body("{\"error\":\"bad creds\"}");
		})
		.await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	provider.set_retry_enabled(false);

	let err = provider.auth_info(false).await.expect_err("Rejected login should fail.");

	assert_eq!(err.to_string(), "Login failed after 1 attempt(s): bad creds");
	login.assert_calls_async(1).await;
}

#[tokio::test]
async fn credential_rejection_is_not_retried() {
	let server = MockServer::start_async().await;
	let _context = mock_login_context(&server).await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":\"Your username or password is incorrect.\"}");
		})
		.await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);
	let err = provider.auth_info(false).await.expect_err("Wrong credentials should fail.");

	assert!(matches!(
		err,
		Error::InvalidCredentials { ref message } if message == "Your username or password is incorrect."
	));
	login.assert_calls_async(1).await;
}

#[tokio::test]
async fn disabled_retry_makes_exactly_one_attempt() {
	let server = MockServer::start_async().await;
	let context = server
		.mock_async(|when, then| {
			when.method(GET).path(AUTHORIZE_PATH);
			then.status(503);
		})
		.await;
	let login = mock_login_success(&server, "TGT-unused").await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	provider.set_retry_enabled(false);

	let err = provider.auth_info(false).await.expect_err("Unavailable SSO should fail.");

	assert!(matches!(
		err,
		Error::LoginFailed {
			attempts: 1,
			source: LoginError::Status { stage: LoginStage::FetchLoginContext, status: 503 },
		}
	));
	context.assert_calls_async(1).await;
	login.assert_calls_async(0).await;
}

#[tokio::test]
async fn configured_attempt_bound_is_honored() {
	let server = MockServer::start_async().await;
	let context = mock_login_context(&server).await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(302).header("set-cookie", "JSESSIONID=s2; Path=/sso");
		})
		.await;
	let config = PtcConfig::builder()
		.endpoints(test_ptc_config(&server.base_url()).endpoints)
		.retry(RetryPolicy { enabled: true, max_attempts: 3 })
		.build()
		.expect("Mock PTC config should build.");
	let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(test_epoch()));
	let provider: ReqwestTestProvider = PtcCredentialProvider::with_http_client(
		config,
		USERNAME,
		PASSWORD,
		test_reqwest_http_client(),
		clock,
	)
	.expect("Mock PTC provider should build.");
	let err = provider.login().await.expect_err("Responses without a ticket should fail.");

	assert!(matches!(
		err,
		Error::LoginFailed { attempts: 3, source: LoginError::MissingTicket { ref body } } if body.is_empty()
	));
	context.assert_calls_async(3).await;
	login.assert_calls_async(3).await;
}

#[tokio::test]
async fn deletion_cookie_is_reported_as_missing_ticket() {
	let server = MockServer::start_async().await;
	let _context = mock_login_context(&server).await;
	let _login = server
		.mock_async(|when, then| {
			when.method(POST).path(LOGIN_PATH);
			then.status(302).header("set-cookie", "CASTGC=; Max-Age=0; Path=/sso");
		})
		.await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	provider.set_retry_enabled(false);

	let err = provider.login().await.expect_err("A cleared ticket cookie should fail.");

	assert!(matches!(
		err,
		Error::LoginFailed { attempts: 1, source: LoginError::MissingTicket { .. } }
	));
	assert!(provider.current_token().is_none());
}

#[tokio::test]
async fn malformed_login_context_is_a_parse_failure() {
	let server = MockServer::start_async().await;
	let _context = server
		.mock_async(|when, then| {
			when.method(GET).path(AUTHORIZE_PATH);
			then.status(200).header("content-type", "text/html").body("<html>maintenance</html>");
		})
		.await;
	let (provider, _) = build_reqwest_test_provider(&server.base_url(), USERNAME, PASSWORD);

	provider.set_retry_enabled(false);

	let err = provider.login().await.expect_err("HTML login context should fail.");

	assert!(matches!(
		err,
		Error::LoginFailed {
			source: LoginError::Parse { stage: LoginStage::FetchLoginContext, .. },
			..
		}
	));
}
