// self
use crate::{_prelude::*, http::Method};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedRequest<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedRequest<F> = F;

/// A span builder used by the dispatcher.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided method + normalized endpoint.
	pub fn new(method: Method, endpoint: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("eventum_client.request", method = method.as_str(), endpoint);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, endpoint);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedRequest<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event when a same-key request is aborted.
pub fn log_superseded(key: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%key, "aborting superseded request");
	#[cfg(not(feature = "tracing"))]
	let _ = key;
}

/// Emits a debug event when outstanding requests are cancelled explicitly.
pub fn log_cancelled(count: usize) {
	#[cfg(feature = "tracing")]
	tracing::debug!(count, "cancelled outstanding requests");
	#[cfg(not(feature = "tracing"))]
	let _ = count;
}

/// Emits a debug event when a rate limit check rejects a call.
pub fn log_throttled(key: &str, reset_at: OffsetDateTime) {
	#[cfg(feature = "tracing")]
	tracing::debug!(key, %reset_at, "rate limit window exhausted");
	#[cfg(not(feature = "tracing"))]
	let _ = (key, reset_at);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = RequestSpan::new(Method::Get, "events");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn log_helpers_do_not_panic() {
		log_superseded(&"GET-events");
		log_cancelled(0);
		log_throttled("comment:42", OffsetDateTime::UNIX_EPOCH);
	}
}
