//! Demonstrates signing one envelope against a mocked hash service, sharing the quota state and
//! printing every report the observer receives.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use pogo_auth::{
	clock,
	error::BoxError,
	hash::{
		HashObserver, HashProvider, HashReport, HashRequest, RateLimitState, SigningClient,
		SigningConfig, VersionProfile,
	},
	http::ReqwestHttpClient,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let hash_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/hash").header("x-authtoken", "demo-key");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-maxrequestcount", "150")
				.header("x-raterequestsremaining", "149")
				.header("x-ratelimitseconds", "60")
				.body("{\"locationAuthHash\":4294967298,\"locationHash\":12,\"requestHashes\":[42]}");
		})
		.await;
	let profile = VersionProfile::builder(Url::parse(&server.url("/api/v1/hash"))?)
		.name("demo")
		.hash_version(5704)
		.build()?;
	let observer: Arc<dyn HashObserver> =
		Arc::new(|report: &HashReport| -> std::result::Result<(), BoxError> {
			println!(
				"Hash call finished in {:?} with status {:?}; {:?} requests left.",
				report.latency, report.status, report.rate_limit.remaining
			);

			Ok(())
		});
	let state = Arc::new(RateLimitState::default());
	let signer = <SigningClient<ReqwestHttpClient>>::with_http_client(
		SigningConfig::new("demo-key", profile).with_blocking(true),
		state.clone(),
		ReqwestHttpClient::new()?,
		clock::system(),
	)
	.with_observer(observer);
	let hash = signer
		.provide(&HashRequest {
			timestamp: 1_735_689_600_000,
			latitude: 35.6762,
			longitude: 139.6503,
			altitude: 40.0,
			auth_ticket: b"ticket".to_vec(),
			session_data: b"session".to_vec(),
			requests: vec![b"get_player".to_vec()],
		})
		.await?;

	println!("Signed envelope: {hash:?}.");
	println!("Quota after the call: {:?}.", state.snapshot());

	hash_mock.assert_async().await;

	Ok(())
}
