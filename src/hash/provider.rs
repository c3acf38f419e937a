//! Hash provider contract consumed by the request envelope builder.

// self
use crate::_prelude::*;

/// Boxed future returned by [`HashProvider::provide`].
pub type HashFuture<'a> = Pin<Box<dyn Future<Output = Result<Hash>> + 'a + Send>>;

/// Capability that computes the integrity hashes attached to every outgoing request.
pub trait HashProvider
where
	Self: Send + Sync,
{
	/// Hashes `request`, failing with a classified hash error on any non-success outcome.
	fn provide<'a>(&'a self, request: &'a HashRequest) -> HashFuture<'a>;

	/// Protocol version number of the targeted service generation.
	fn hash_version(&self) -> i32;

	/// Opaque constant that must match the targeted service generation exactly.
	fn unk25(&self) -> i64;
}

/// Inputs to one signing call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HashRequest {
	/// Request timestamp in unix milliseconds.
	pub timestamp: u64,
	/// Latitude in degrees.
	pub latitude: f64,
	/// Longitude in degrees.
	pub longitude: f64,
	/// Altitude (sent as accuracy by bit-pattern profiles).
	pub altitude: f64,
	/// Serialized auth ticket of the envelope.
	pub auth_ticket: Vec<u8>,
	/// Session data of the envelope.
	pub session_data: Vec<u8>,
	/// Serialized request payloads, in envelope order.
	pub requests: Vec<Vec<u8>>,
}

/// Signing service output for one [`HashRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hash {
	/// Folded location-auth hash.
	pub location_auth_hash: i32,
	/// Folded location hash.
	pub location_hash: i32,
	/// Per-request hashes, in request order and unmodified.
	pub request_hashes: Vec<i64>,
}

/// Folds a 64-bit service hash into 32 bits by XOR-ing its high and low halves.
pub fn fold_hash(value: i64) -> i32 {
	let bits = value as u64;

	((bits & 0xFFFF_FFFF) ^ (bits >> 32)) as u32 as i32
}
