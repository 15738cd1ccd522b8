//! Application-scoped context owning the dispatcher and the rate limiter.
//!
//! One [`EventumClient`] is built per app instance and shared by reference (or `Arc`), so the
//! in-flight registry and the rate-limit table are scoped to it rather than living in globals.
//!
//! With the `tokio` feature (on by default), constructing a client inside a Tokio runtime
//! starts a background sweep that evicts expired rate-limit windows every five minutes. The
//! task stops once the last handle to the limiter is dropped. Without a runtime, call
//! [`RateLimiter::sweep`] periodically instead.

// self
use crate::{
	_prelude::*,
	config::ApiConfig,
	dispatch::{Dispatcher, RequestOptions},
	http::HttpTransport,
	rate_limit::{RateLimitDecision, RateLimitRule, RateLimiter},
	session::BearerToken,
	store::KeyValueStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestEventumClient = EventumClient<ReqwestTransport>;

/// Dispatcher plus rate limiter for a single application instance.
pub struct EventumClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Request dispatcher shared by every screen.
	pub dispatcher: Dispatcher<T>,
	/// Client-side action throttle.
	pub rate_limiter: Arc<RateLimiter>,
}
impl<T> EventumClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Bundles an existing dispatcher and limiter, starting the limiter's sweeper when possible.
	pub fn from_parts(dispatcher: Dispatcher<T>, rate_limiter: Arc<RateLimiter>) -> Self {
		#[cfg(feature = "tokio")]
		rate_limiter.spawn_default_sweeper();

		Self { dispatcher, rate_limiter }
	}

	/// Builds a client over a caller-provided transport with a system-clock limiter.
	pub fn with_transport(
		config: ApiConfig,
		store: Arc<dyn KeyValueStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self::from_parts(
			Dispatcher::with_transport(config, store, transport),
			Arc::new(RateLimiter::new()),
		)
	}

	/// Consults the limiter for `rate_key`, then dispatches when the call fits the window.
	///
	/// Throttled calls fail with [`Error::RateLimited`] without touching the network.
	pub async fn guarded(
		&self,
		rate_key: &str,
		rule: RateLimitRule,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<Value> {
		let RateLimitDecision { allowed, reset_at, .. } = self.rate_limiter.check_rule(rate_key, rule);

		if !allowed {
			return Err(Error::RateLimited { key: rate_key.to_owned(), retry_at: reset_at });
		}

		self.dispatcher.request(endpoint, options).await
	}

	/// Persists the token issued on login or registration.
	pub async fn login_with_token(&self, token: &BearerToken) -> Result<()> {
		self.dispatcher.session().store(token).await
	}

	/// Aborts outstanding requests and clears the stored token.
	pub async fn logout(&self) -> Result<()> {
		self.dispatcher.cancel_all();

		self.dispatcher.session().clear().await
	}
}
#[cfg(feature = "reqwest")]
impl EventumClient<ReqwestTransport> {
	/// Builds a reqwest-backed client from `config`.
	pub fn new(config: ApiConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
		Ok(Self::from_parts(Dispatcher::new(config, store)?, Arc::new(RateLimiter::new())))
	}
}
impl<T> Clone for EventumClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { dispatcher: self.dispatcher.clone(), rate_limiter: self.rate_limiter.clone() }
	}
}
impl<T> Debug for EventumClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EventumClient")
			.field("dispatcher", &self.dispatcher)
			.field("rate_limiter", &self.rate_limiter)
			.finish()
	}
}
