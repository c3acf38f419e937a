//! Crate-level error types shared by the credential and signing subsystems.

// self
use crate::{_prelude::*, auth::LoginStage};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for opaque sources and observer failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// SSO login failed; `source` is the cause of the final attempt.
	#[error("Login failed after {attempts} attempt(s): {source}")]
	LoginFailed {
		/// Number of attempts performed before giving up.
		attempts: u32,
		/// Failure observed on the last attempt.
		#[source]
		source: LoginError,
	},
	/// SSO rejected the submitted username/password pair.
	#[error("SSO rejected the credentials: {message}")]
	InvalidCredentials {
		/// Rejection message returned by the SSO service.
		message: String,
	},
	/// Signing failed for a reason without a more specific variant.
	#[error("{message}")]
	Hash {
		/// Service- or client-supplied message.
		message: String,
		/// HTTP status code, when a response was received.
		status: Option<u16>,
		/// Underlying transport failure, if any.
		#[source]
		source: Option<BoxError>,
	},
	/// Signing service rejected the key.
	#[error("Hash service rejected the key: {message}")]
	HashUnauthorized {
		/// Service- or client-supplied message.
		message: String,
	},
	/// Signing quota for the current period is exhausted.
	#[error("Hash quota exceeded: {message}")]
	HashQuotaExceeded {
		/// Service- or client-supplied message.
		message: String,
		/// Time left until the recorded period ends, when known.
		retry_in: Option<Duration>,
	},
}
impl Error {
	pub(crate) fn hash(message: impl Into<String>, status: Option<u16>) -> Self {
		Self::Hash { message: message.into(), status, source: None }
	}

	/// Returns `true` for the signing-related variants.
	pub fn is_hash_error(&self) -> bool {
		matches!(self, Self::Hash { .. } | Self::HashUnauthorized { .. } | Self::HashQuotaExceeded { .. })
	}

	/// Returns `true` for the login-related variants.
	pub fn is_login_error(&self) -> bool {
		matches!(self, Self::LoginFailed { .. } | Self::InvalidCredentials { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// An endpoint URL is not acceptable.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Token lifetime must be positive.
	#[error("The token lifetime must be positive.")]
	NonPositiveTokenLifetime,
	/// Token lifetime exceeds the service-side ticket validity.
	#[error("The token lifetime of {secs}s exceeds the {max_secs}s ticket validity.")]
	TokenLifetimeTooLong {
		/// Configured lifetime in seconds.
		secs: i64,
		/// Largest accepted lifetime in seconds.
		max_secs: i64,
	},
	/// Ticket expiry falls outside the representable date range.
	#[error("The ticket expiry is out of range.")]
	ExpiryOutOfRange,
	/// Signing key is empty.
	#[error("The signing key must not be empty.")]
	EmptySigningKey,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Cause of a single failed SSO attempt.
#[derive(Debug, ThisError)]
pub enum LoginError {
	/// The HTTP exchange itself failed.
	#[error("Network failure during {stage}.")]
	Transport {
		/// Stage that issued the request.
		stage: LoginStage,
		/// Transport failure.
		#[source]
		source: TransportError,
	},
	/// The SSO service answered with an unusable status.
	#[error("SSO answered {status} during {stage}.")]
	Status {
		/// Stage that issued the request.
		stage: LoginStage,
		/// HTTP status code.
		status: u16,
	},
	/// A response body could not be decoded.
	#[error("SSO returned a malformed payload during {stage}.")]
	Parse {
		/// Stage whose response failed to decode.
		stage: LoginStage,
		/// Structured decoding failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The SSO service rejected the submission with an error payload.
	#[error("{message}")]
	Rejected {
		/// Message (or joined messages) from the error payload.
		message: String,
	},
	/// The login response carried no `CASTGC` cookie.
	#[error("Failed to fetch token, body: {body}")]
	MissingTicket {
		/// Raw response body kept for diagnosis.
		body: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote endpoint.")]
	Io(#[from] std::io::Error),
	/// Request could not be assembled.
	#[error("HTTP request could not be built.")]
	Request(#[from] oauth2::http::Error),
	/// Transport reported a failure without a typed cause.
	#[error("HTTP client error occurred while calling the remote endpoint: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl<E> From<oauth2::HttpClientError<E>> for TransportError
where
	E: 'static + Send + Sync + std::error::Error,
{
	fn from(e: oauth2::HttpClientError<E>) -> Self {
		match e {
			oauth2::HttpClientError::Reqwest(inner) => Self::Network { source: inner },
			oauth2::HttpClientError::Http(inner) => Self::Request(inner),
			oauth2::HttpClientError::Io(inner) => Self::Io(inner),
			oauth2::HttpClientError::Other(message) => Self::Other { message },
			_ => Self::Other { message: "unclassified transport failure".into() },
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_failure_display_carries_last_cause() {
		let err = Error::LoginFailed {
			attempts: 5,
			source: LoginError::Rejected { message: "bad creds".into() },
		};

		assert_eq!(err.to_string(), "Login failed after 5 attempt(s): bad creds");
		assert!(err.is_login_error());
		assert!(!err.is_hash_error());
	}

	#[test]
	fn http_client_errors_map_into_transport_variants() {
		let other: TransportError =
			oauth2::HttpClientError::<std::io::Error>::Other("boom".into()).into();

		assert!(matches!(other, TransportError::Other { ref message } if message == "boom"));

		let io: TransportError = oauth2::HttpClientError::<std::io::Error>::Io(
			std::io::Error::other("reset"),
		)
		.into();

		assert!(matches!(io, TransportError::Io(_)));
	}
}
