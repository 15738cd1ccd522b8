//! Client-level error types shared across dispatch, storage, and configuration.

// self
use crate::{_prelude::*, dispatch::RequestKey};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Backend answered with a non-success status.
	///
	/// The display form is the bare message so it can be surfaced to users as-is.
	#[error("{message}")]
	Api {
		/// HTTP status code returned by the backend.
		status: u16,
		/// Message lifted from the body's `error`/`message` field, or a status fallback.
		message: String,
	},
	/// Request was superseded by a newer same-key request or cancelled explicitly.
	#[error("Request {key} was cancelled.")]
	Cancelled {
		/// Dedup key of the aborted request.
		key: RequestKey,
	},
	/// Client-side rate limit rejected the call before it reached the network.
	#[error("Too many attempts for `{key}`; retry after {retry_at}.")]
	RateLimited {
		/// Caller-supplied rate limit key.
		key: String,
		/// Instant at which the current window resets.
		retry_at: OffsetDateTime,
	},
}
impl Error {
	/// Returns `true` when the error only signals a superseded or cancelled request.
	///
	/// Callers usually swallow these silently instead of showing them to the user.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Self::Cancelled { .. })
	}

	/// HTTP status code associated with the failure, when one exists.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api { status, .. } => Some(*status),
			Self::Decode(DecodeError::Json { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Raw value that failed validation.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https, got `{scheme}`.")]
	UnsupportedScheme {
		/// Offending scheme.
		scheme: String,
	},
	/// Base URL carries a query string or fragment.
	#[error("Base URL `{url}` must not carry a query or fragment.")]
	BaseUrlHasQuery {
		/// Offending URL.
		url: String,
	},
	/// Token storage key is empty.
	#[error("Token storage key cannot be empty.")]
	EmptyTokenKey,
	/// Endpoint could not be joined onto the base URL.
	#[error("Endpoint `{endpoint}` cannot be joined onto the base URL.")]
	InvalidEndpoint {
		/// Normalized endpoint path.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Rate limit sweep period is zero.
	#[error("Sweep period must be greater than zero.")]
	ZeroSweepPeriod,
	/// JSON request body could not be serialized.
	#[error("Request body could not be serialized.")]
	BodySerialize(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// A JSON-typed success body was malformed.
	#[error("Backend returned malformed JSON (status {status}).")]
	Json {
		/// HTTP status code of the response.
		status: u16,
		/// Parser failure.
		#[source]
		source: serde_json::Error,
	},
	/// The JSON body did not match the requested type.
	#[error("Response does not match the expected shape at `{path}`.")]
	Shape {
		/// Path to the offending field.
		path: String,
		/// Deserializer failure.
		#[source]
		source: serde_json::Error,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DecodeError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		let path = e.path().to_string();

		Self::Shape { path, source: e.into_inner() }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
