//! Cookie handling scoped to a single login attempt.

// self
use crate::{
	_prelude::*,
	http::{self, HttpResponse},
};

/// Name of the ticket-granting cookie issued after a successful login.
pub const TICKET_COOKIE: &str = "CASTGC";

/// In-memory cookie jar keyed by host.
///
/// A jar lives exactly as long as one login attempt and is never persisted or shared.
#[derive(Debug, Default)]
pub(crate) struct LoginCookieJar {
	hosts: HashMap<String, Vec<(String, String)>>,
}
impl LoginCookieJar {
	/// Stores every `Set-Cookie` pair of `response`, replacing same-named cookies.
	pub(crate) fn save_from_response(&mut self, url: &Url, response: &HttpResponse) {
		let Some(host) = url.host_str() else {
			return;
		};
		let cookies = self.hosts.entry(host.to_owned()).or_default();

		for header in http::header_values(response.headers(), "set-cookie") {
			let Some((name, value)) = parse_pair(header) else {
				continue;
			};

			cookies.retain(|(existing, _)| existing != name);
			cookies.push((name.to_owned(), value.to_owned()));
		}
	}

	/// Renders the `Cookie` header for `url`, if any cookie is stored for its host.
	pub(crate) fn header_for(&self, url: &Url) -> Option<String> {
		let cookies = self.hosts.get(url.host_str()?)?;

		if cookies.is_empty() {
			return None;
		}

		Some(
			cookies
				.iter()
				.map(|(name, value)| format!("{name}={value}"))
				.collect::<Vec<_>>()
				.join("; "),
		)
	}
}

/// Extracts the `CASTGC` value from the `Set-Cookie` headers of `response`.
pub(crate) fn extract_ticket(response: &HttpResponse) -> Option<String> {
	http::header_values(response.headers(), "set-cookie").find_map(ticket_from_header)
}

/// Returns the text between `CASTGC=` and the next `;` (or the end of the header).
///
/// An empty value is a deletion cookie and yields `None`.
pub(crate) fn ticket_from_header(header: &str) -> Option<String> {
	let marker = format!("{TICKET_COOKIE}=");
	let start = header.find(&marker)? + marker.len();
	let rest = &header[start..];
	let ticket = rest[..rest.find(';').unwrap_or(rest.len())].trim();

	if ticket.is_empty() { None } else { Some(ticket.to_owned()) }
}

fn parse_pair(header: &str) -> Option<(&str, &str)> {
	let pair = header.split(';').next()?;
	let (name, value) = pair.split_once('=')?;
	let name = name.trim();

	if name.is_empty() { None } else { Some((name, value.trim())) }
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::HeaderValue;
	// self
	use super::*;

	fn response_with_cookies(cookies: &[&'static str]) -> HttpResponse {
		let mut response = HttpResponse::new(Vec::new());

		for cookie in cookies {
			response.headers_mut().append("set-cookie", HeaderValue::from_static(cookie));
		}

		response
	}

	#[test]
	fn ticket_is_cut_at_the_first_semicolon() {
		assert_eq!(ticket_from_header("CASTGC=abc123; Path=/; Secure"), Some("abc123".into()));
		assert_eq!(ticket_from_header("CASTGC=TGT-9-xyz"), Some("TGT-9-xyz".into()));
		assert_eq!(ticket_from_header("JSESSIONID=1; Path=/"), None);
	}

	#[test]
	fn deletion_cookie_is_not_a_ticket() {
		assert_eq!(ticket_from_header("CASTGC=; Max-Age=0; Path=/sso"), None);
		assert_eq!(ticket_from_header("CASTGC="), None);
		assert_eq!(
			extract_ticket(&response_with_cookies(&["CASTGC=; Max-Age=0", "CASTGC=TGT-2; Path=/"])),
			Some("TGT-2".into())
		);
	}

	#[test]
	fn extract_ticket_scans_every_set_cookie_header() {
		let response = response_with_cookies(&[
			"JSESSIONID=s1; Path=/sso",
			"CASTGC=TGT-42-abc; Path=/sso; Secure",
		]);

		assert_eq!(extract_ticket(&response), Some("TGT-42-abc".into()));
		assert_eq!(extract_ticket(&response_with_cookies(&["a=b"])), None);
	}

	#[test]
	fn jar_replays_cookies_for_the_same_host_only() {
		let mut jar = LoginCookieJar::default();
		let sso = Url::parse("https://sso.pokemon.com/sso/login").expect("Fixture URL should parse.");
		let other = Url::parse("https://example.com/").expect("Fixture URL should parse.");

		jar.save_from_response(&sso, &response_with_cookies(&["JSESSIONID=s1; Path=/", "lb=2"]));
		jar.save_from_response(&sso, &response_with_cookies(&["JSESSIONID=s2; Path=/"]));

		assert_eq!(jar.header_for(&sso), Some("lb=2; JSESSIONID=s2".into()));
		assert_eq!(jar.header_for(&other), None);
	}
}
