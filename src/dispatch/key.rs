//! Endpoint normalization and dedup keys.

// self
use crate::{_prelude::*, http::Method};

/// Strips leading slashes and a redundant leading `api/` segment.
///
/// Callers may pass `"/api/events"`, `"api/events"`, or `"events"`; all resolve to `"events"`
/// because the configured base URL already ends in `/api`.
pub fn normalize_endpoint(endpoint: &str) -> &str {
	let trimmed = endpoint.trim_start_matches('/');

	match trimmed.strip_prefix("api/") {
		Some(rest) => rest.trim_start_matches('/'),
		None => trimmed,
	}
}

/// Identifies "the same logical request" for supersession: `METHOD-endpoint`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestKey {
	method: Method,
	endpoint: String,
}
impl RequestKey {
	/// Builds a key from a method and a raw (un-normalized) endpoint.
	pub fn new(method: Method, endpoint: &str) -> Self {
		Self { method, endpoint: normalize_endpoint(endpoint).to_owned() }
	}

	/// HTTP verb component.
	pub fn method(&self) -> Method {
		self.method
	}

	/// Normalized endpoint component.
	pub fn endpoint(&self) -> &str {
		&self.endpoint
	}
}
impl Debug for RequestKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "RequestKey({self})")
	}
}
impl Display for RequestKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}-{}", self.method, self.endpoint)
	}
}
