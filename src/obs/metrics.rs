// self
use crate::{
	http::Method,
	obs::{RateLimitOutcome, RequestOutcome},
};

/// Records a request outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(method: Method, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"eventum_client_request_total",
			"method" => method.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

/// Records a rate limit decision via the global metrics recorder (when enabled).
pub fn record_rate_limit_outcome(outcome: RateLimitOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("eventum_client_rate_limit_total", "outcome" => outcome.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_installed_recorder() {
		record_request_outcome(Method::Post, RequestOutcome::Cancelled);
		record_rate_limit_outcome(RateLimitOutcome::Throttled);
	}
}
