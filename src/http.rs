//! Transport primitives shared by the SSO login flow and the signing client.
//!
//! The module exposes [`HttpTransport`] so downstream crates can plug in custom HTTP
//! stacks (or test doubles) while the crate keeps speaking plain [`HttpRequest`] /
//! [`HttpResponse`] values. Transports must never follow redirects: the SSO flow reads
//! its ticket from the `302` response itself.

pub use oauth2::{HttpClientError, HttpRequest, HttpResponse, http};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
use oauth2::http::{HeaderMap, HeaderName, HeaderValue, Method};
// self
use crate::_prelude::*;

/// Boxed future returned by [`HttpTransport::execute`].
pub type HttpFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, HttpClientError<E>>> + 'a + Send>>;

/// Abstraction over HTTP transports able to execute a single request.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by
/// every provider and signer built from it, and the returned future must be `Send`.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes `request` without following redirects.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	type TransportError = T::TransportError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		(**self).execute(request)
	}
}

/// Small builder that keeps header handling out of the flow code.
#[derive(Debug)]
pub(crate) struct RequestBuilder {
	method: Method,
	url: Url,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl RequestBuilder {
	pub(crate) fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: Vec::new() }
	}

	/// Sets (replacing) a header; invalid values are skipped with the request still usable.
	pub(crate) fn header(mut self, name: &'static str, value: &str) -> Self {
		if let Ok(value) = HeaderValue::from_str(value) {
			self.headers.insert(HeaderName::from_static(name), value);
		}

		self
	}

	pub(crate) fn url(&self) -> &Url {
		&self.url
	}

	pub(crate) fn body(mut self, body: Vec<u8>) -> Self {
		self.body = body;

		self
	}

	pub(crate) fn build(self) -> Result<HttpRequest, http::Error> {
		let mut builder = http::Request::builder().method(self.method).uri(self.url.as_str());

		if let Some(headers) = builder.headers_mut() {
			headers.extend(self.headers);
		}

		builder.body(self.body)
	}
}

/// Returns every value of `name` that is valid UTF-8.
pub(crate) fn header_values<'a>(
	headers: &'a HeaderMap,
	name: &'a str,
) -> impl Iterator<Item = &'a str> + 'a {
	headers.get_all(name).iter().filter_map(|value| value.to_str().ok())
}

/// Parses the first value of `name` as `T`.
pub(crate) fn header_parse<T>(headers: &HeaderMap, name: &str) -> Option<T>
where
	T: FromStr,
{
	headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Rejects non-HTTPS endpoints; loopback hosts are exempt so local mocks keep working.
pub(crate) fn ensure_secure_endpoint(
	endpoint: &'static str,
	url: &Url,
) -> Result<(), crate::error::ConfigError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || loopback {
		Ok(())
	} else {
		Err(crate::error::ConfigError::InsecureEndpoint { endpoint, url: url.to_string() })
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Configure any custom [`ReqwestClient`] to disable redirect following.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestHttpClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestHttpClient(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_builder_sets_method_uri_and_headers() {
		let url = Url::parse("https://example.com/hash?x=1").expect("Fixture URL should parse.");
		let request = RequestBuilder::new(Method::POST, url)
			.header("x-authtoken", "key")
			.header("content-type", "application/json")
			.body(b"{}".to_vec())
			.build()
			.expect("Request should build.");

		assert_eq!(request.method(), &Method::POST);
		assert_eq!(request.uri().to_string(), "https://example.com/hash?x=1");
		assert_eq!(request.headers().get("x-authtoken").map(|v| v.as_bytes()), Some(&b"key"[..]));
		assert_eq!(request.body(), b"{}");
	}

	#[test]
	fn header_helpers_parse_and_iterate() {
		let mut headers = HeaderMap::new();

		headers.append("set-cookie", HeaderValue::from_static("a=1"));
		headers.append("set-cookie", HeaderValue::from_static("b=2"));
		headers.insert("x-maxrequestcount", HeaderValue::from_static(" 150 "));

		assert_eq!(header_values(&headers, "set-cookie").collect::<Vec<_>>(), vec!["a=1", "b=2"]);
		assert_eq!(header_parse::<u32>(&headers, "x-maxrequestcount"), Some(150));
		assert_eq!(header_parse::<u32>(&headers, "x-missing"), None);
	}

	#[test]
	fn secure_endpoint_rule_exempts_loopback() {
		let parse = |raw: &str| Url::parse(raw).expect("Fixture URL should parse.");

		assert!(ensure_secure_endpoint("login", &parse("https://sso.pokemon.com/sso/login")).is_ok());
		assert!(ensure_secure_endpoint("login", &parse("http://127.0.0.1:8080/sso/login")).is_ok());
		assert!(ensure_secure_endpoint("login", &parse("http://localhost/sso/login")).is_ok());
		assert!(matches!(
			ensure_secure_endpoint("login", &parse("http://sso.pokemon.com/sso/login")),
			Err(crate::error::ConfigError::InsecureEndpoint { endpoint: "login", .. })
		));
	}
}
