//! Backend endpoint configuration.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Storage key the app writes the bearer token under on login.
pub const DEFAULT_TOKEN_KEY: &str = "user-token";

const API_SEGMENT: &str = "api";

/// Resolved client configuration.
///
/// `base_url` always ends with the `/api` segment; endpoint paths are joined beneath it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
	/// Origin plus `/api` suffix.
	pub base_url: Url,
	/// Device storage key holding the bearer token.
	#[serde(default = "default_token_key")]
	pub token_key: String,
	/// Optional per-request timeout applied by the transport.
	#[serde(default)]
	pub timeout: Option<StdDuration>,
	/// Optional user agent applied by the transport.
	#[serde(default)]
	pub user_agent: Option<String>,
}
impl ApiConfig {
	/// Starts a builder for the provided origin (e.g. `http://10.0.0.2:5000`).
	pub fn builder(origin: impl Into<String>) -> ApiConfigBuilder {
		ApiConfigBuilder::new(origin)
	}

	/// Joins an already-normalized endpoint onto the base URL.
	pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, ConfigError> {
		let raw = format!("{}/{endpoint}", self.base_url.as_str().trim_end_matches('/'));

		Url::parse(&raw)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: endpoint.to_owned(), source })
	}

	/// Origin used by the realtime socket (base URL without the `/api` suffix).
	pub fn realtime_url(&self) -> Url {
		let mut url = self.base_url.clone();
		let path = url.path().trim_end_matches('/');
		let trimmed = path.strip_suffix(API_SEGMENT).unwrap_or(path).trim_end_matches('/');
		let path = if trimmed.is_empty() { "/".to_owned() } else { trimmed.to_owned() };

		url.set_path(&path);

		url
	}
}

fn default_token_key() -> String {
	DEFAULT_TOKEN_KEY.into()
}

/// Builder for [`ApiConfig`] values.
#[derive(Debug)]
pub struct ApiConfigBuilder {
	/// Raw origin as supplied by the caller.
	pub origin: String,
	/// Device storage key holding the bearer token.
	pub token_key: String,
	/// Optional per-request timeout.
	pub timeout: Option<StdDuration>,
	/// Optional user agent.
	pub user_agent: Option<String>,
}
impl ApiConfigBuilder {
	/// Creates a new builder seeded with the provided origin.
	pub fn new(origin: impl Into<String>) -> Self {
		Self { origin: origin.into(), token_key: default_token_key(), timeout: None, user_agent: None }
	}

	/// Overrides the storage key used for the bearer token.
	pub fn token_key(mut self, key: impl Into<String>) -> Self {
		self.token_key = key.into();

		self
	}

	/// Sets a per-request timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Sets the user agent.
	pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
		self.user_agent = Some(agent.into());

		self
	}

	/// Validates the origin and produces the final configuration.
	pub fn build(self) -> Result<ApiConfig, ConfigError> {
		let mut base_url = Url::parse(self.origin.trim())
			.map_err(|source| ConfigError::InvalidBaseUrl { url: self.origin.clone(), source })?;

		if !matches!(base_url.scheme(), "http" | "https") {
			return Err(ConfigError::UnsupportedScheme { scheme: base_url.scheme().to_owned() });
		}
		if base_url.query().is_some() || base_url.fragment().is_some() {
			return Err(ConfigError::BaseUrlHasQuery { url: base_url.into() });
		}
		if self.token_key.trim().is_empty() {
			return Err(ConfigError::EmptyTokenKey);
		}

		let path = base_url.path().trim_end_matches('/').to_owned();
		let already_api = path.rsplit('/').next().is_some_and(|last| last == API_SEGMENT);

		if !already_api {
			base_url.set_path(&format!("{path}/{API_SEGMENT}"));
		} else {
			base_url.set_path(&path);
		}

		Ok(ApiConfig {
			base_url,
			token_key: self.token_key,
			timeout: self.timeout,
			user_agent: self.user_agent,
		})
	}
}
