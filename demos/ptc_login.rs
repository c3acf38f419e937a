//! Demonstrates logging in through a mocked PTC single-sign-on service with the default reqwest
//! transport, then serving the cached ticket without touching the network again.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use pogo_auth::{
	auth::{CredentialProvider, PtcConfig, PtcCredentialProvider, SsoEndpoints},
	clock,
	http::ReqwestHttpClient,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let context_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/sso/oauth2.0/authorize");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"lt\":\"LT-demo\",\"execution\":\"e1s1\"}");
		})
		.await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/sso/login");
			then.status(302).header("set-cookie", "CASTGC=TGT-demo-ticket; Path=/sso; Secure");
		})
		.await;
	let config = PtcConfig::builder()
		.endpoints(SsoEndpoints {
			authorize: Url::parse(&server.url("/sso/oauth2.0/authorize"))?,
			login: Url::parse(&server.url("/sso/login"))?,
			service: Url::parse(&server.url("/sso/oauth2.0/callbackAuthorize"))?,
		})
		.build()?;
	let provider = <PtcCredentialProvider<ReqwestHttpClient>>::with_http_client(
		config,
		"ash",
		"pikachu",
		ReqwestHttpClient::new()?,
		clock::system(),
	)?;
	let info = provider.auth_info(false).await?;

	println!("Logged in via {}: {}.", info.provider, info.token.contents.expose());

	let cached = provider.token_id(false).await?;

	println!("Cached ticket reused: {}.", cached.expose() == info.token.contents.expose());

	context_mock.assert_async().await;
	login_mock.assert_async().await;

	Ok(())
}
