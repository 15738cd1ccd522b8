//! Bearer token persistence bound to the configured storage key.

// self
use crate::{_prelude::*, store::KeyValueStore};

/// Redacted bearer token wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken(String);
impl BearerToken {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Formats the `Authorization` header value.
	pub fn authorization(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl AsRef<str> for BearerToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}
impl Display for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Reads and writes the session token under a fixed storage key.
#[derive(Clone)]
pub struct SessionTokens {
	store: Arc<dyn KeyValueStore>,
	key: String,
}
impl SessionTokens {
	/// Binds `store` to the provided token key.
	pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
		Self { store, key: key.into() }
	}

	/// Storage key the token lives under.
	pub fn key(&self) -> &str {
		&self.key
	}

	/// Loads the current token; empty values count as signed out.
	pub async fn load(&self) -> Result<Option<BearerToken>> {
		let raw = self.store.get(&self.key).await?;

		Ok(raw.filter(|value| !value.trim().is_empty()).map(BearerToken::new))
	}

	/// Persists the token issued on login or registration.
	pub async fn store(&self, token: &BearerToken) -> Result<()> {
		self.store.set(&self.key, token.expose().to_owned()).await?;

		Ok(())
	}

	/// Clears the token on logout or account deletion. Idempotent.
	pub async fn clear(&self) -> Result<()> {
		self.store.remove(&self.key).await?;

		Ok(())
	}
}
impl Debug for SessionTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTokens").field("key", &self.key).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn token_formatters_redact() {
		let token = BearerToken::new("super-secret");

		assert_eq!(format!("{token:?}"), "BearerToken(\"<redacted>\")");
		assert_eq!(format!("{token}"), "<redacted>");
		assert_eq!(token.authorization(), "Bearer super-secret");
	}

	#[tokio::test]
	async fn store_load_clear_cycle() {
		let backend = Arc::new(MemoryStore::default());
		let session = SessionTokens::new(backend.clone(), "user-token");

		assert!(session.load().await.expect("Load on empty store should succeed.").is_none());

		session.store(&BearerToken::new("abc")).await.expect("Storing token should succeed.");

		let loaded =
			session.load().await.expect("Load should succeed.").expect("Token should be present.");

		assert_eq!(loaded.expose(), "abc");

		session.clear().await.expect("First clear should succeed.");
		session.clear().await.expect("Second clear should be a no-op.");

		assert!(backend.is_empty());
	}

	#[tokio::test]
	async fn blank_token_counts_as_signed_out() {
		let backend = Arc::new(MemoryStore::with_entry("user-token", "  "));
		let session = SessionTokens::new(backend, "user-token");

		assert!(session.load().await.expect("Load should succeed.").is_none());
	}
}
