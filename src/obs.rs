//! Optional observability helpers for dispatch and rate limiting.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `eventum_client.request` with the `method`
//!   and `endpoint` fields, plus debug events for supersession and throttling.
//! - Enable `metrics` to increment the `eventum_client_request_total` counter (labeled by
//!   `method` + `outcome`) and the `eventum_client_rate_limit_total` counter (labeled by
//!   `outcome`).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each dispatched request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to the dispatcher.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Superseded or explicitly cancelled.
	Cancelled,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
			RequestOutcome::Cancelled => "cancelled",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each rate limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RateLimitOutcome {
	/// The call fit in the window.
	Allowed,
	/// The window budget was exhausted.
	Throttled,
}
impl RateLimitOutcome {
	/// Returns a stable label suitable for metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RateLimitOutcome::Allowed => "allowed",
			RateLimitOutcome::Throttled => "throttled",
		}
	}
}
impl Display for RateLimitOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
