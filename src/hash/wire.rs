//! JSON bodies exchanged with the signing service.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	hash::{Hash, HashRequest, LocationEncoding, fold_hash},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SigningRequestBody {
	#[serde(skip_serializing_if = "Option::is_none")]
	latitude64: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	longitude64: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	accuracy64: Option<i64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	latitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	longitude: Option<f64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	altitude: Option<f64>,
	timestamp: u64,
	auth_ticket: String,
	session_data: String,
	requests: Vec<String>,
}
impl SigningRequestBody {
	pub(crate) fn new(request: &HashRequest, encoding: LocationEncoding) -> Self {
		let mut body = Self {
			latitude64: None,
			longitude64: None,
			accuracy64: None,
			latitude: None,
			longitude: None,
			altitude: None,
			timestamp: request.timestamp,
			auth_ticket: STANDARD.encode(&request.auth_ticket),
			session_data: STANDARD.encode(&request.session_data),
			requests: request.requests.iter().map(|payload| STANDARD.encode(payload)).collect(),
		};

		match encoding {
			LocationEncoding::BitPattern => {
				body.latitude64 = Some(request.latitude.to_bits() as i64);
				body.longitude64 = Some(request.longitude.to_bits() as i64);
				body.accuracy64 = Some(request.altitude.to_bits() as i64);
			},
			LocationEncoding::Decimal => {
				body.latitude = Some(request.latitude);
				body.longitude = Some(request.longitude);
				body.altitude = Some(request.altitude);
			},
		}

		body
	}
}

/// Hash as written by the service; some deployments emit unsigned values.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(untagged)]
enum WireHash {
	Signed(i64),
	Unsigned(u64),
}
impl From<WireHash> for i64 {
	fn from(value: WireHash) -> Self {
		match value {
			WireHash::Signed(value) => value,
			WireHash::Unsigned(value) => value as i64,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SigningResponseBody {
	location_auth_hash: WireHash,
	location_hash: WireHash,
	#[serde(default)]
	request_hashes: Vec<WireHash>,
}
impl From<SigningResponseBody> for Hash {
	fn from(body: SigningResponseBody) -> Self {
		Self {
			location_auth_hash: fold_hash(body.location_auth_hash.into()),
			location_hash: fold_hash(body.location_hash.into()),
			request_hashes: body.request_hashes.into_iter().map(i64::from).collect(),
		}
	}
}
