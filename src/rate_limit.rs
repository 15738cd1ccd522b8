//! Fixed-window rate limiting for client-side actions.
//!
//! The limiter bounds how often a caller-chosen key (typically `user + action`, e.g.
//! `"comment:42"`) may be attempted. It is a UX convenience only: the backend enforces the
//! authoritative limits, so the table lives in memory and never coordinates across processes.
//! Checks never fail; a throttled call is reported through [`RateLimitDecision::allowed`].

// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	obs::{self, RateLimitOutcome},
};
#[cfg(feature = "tokio")] use crate::error::ConfigError;

/// Default number of calls permitted per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;
/// Default window length (one minute).
pub const DEFAULT_WINDOW: Duration = Duration::milliseconds(60_000);
/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(5 * 60);

/// Budget applied to a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRule {
	/// Calls permitted per window.
	pub max_requests: u32,
	/// Window length.
	pub window: Duration,
}
impl RateLimitRule {
	/// Creates a rule allowing `max_requests` calls per `window`.
	pub const fn new(max_requests: u32, window: Duration) -> Self {
		Self { max_requests, window }
	}
}
impl Default for RateLimitRule {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
	}
}

/// Result of a single [`RateLimiter::check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitDecision {
	/// Whether the call may proceed.
	pub allowed: bool,
	/// Calls left in the current window.
	pub remaining: u32,
	/// Instant the current window ends.
	pub reset_at: OffsetDateTime,
}
impl RateLimitDecision {
	/// Time left until the window resets, clamped at zero.
	pub fn retry_in(&self, now: OffsetDateTime) -> Duration {
		let delta = self.reset_at - now;

		if delta.is_negative() { Duration::ZERO } else { delta }
	}
}

#[derive(Clone, Copy, Debug)]
struct WindowEntry {
	count: u32,
	reset_at: OffsetDateTime,
}

/// In-memory per-key window counter.
pub struct RateLimiter {
	entries: Mutex<HashMap<String, WindowEntry>>,
	clock: Arc<dyn Clock>,
}
impl RateLimiter {
	/// Creates a limiter reading time from the system clock.
	pub fn new() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}

	/// Creates a limiter reading time from `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { entries: Default::default(), clock }
	}

	/// Counts one attempt for `key` against `max_requests` per `window`.
	pub fn check(&self, key: &str, max_requests: u32, window: Duration) -> RateLimitDecision {
		let now = self.clock.now();
		let decision = self.check_at(key, max_requests, window, now);

		if decision.allowed {
			obs::record_rate_limit_outcome(RateLimitOutcome::Allowed);
		} else {
			obs::record_rate_limit_outcome(RateLimitOutcome::Throttled);
			obs::log_throttled(key, decision.reset_at);
		}

		decision
	}

	/// Same as [`check`](Self::check) with the budget taken from `rule`.
	pub fn check_rule(&self, key: &str, rule: RateLimitRule) -> RateLimitDecision {
		self.check(key, rule.max_requests, rule.window)
	}

	/// Same as [`check`](Self::check) with 10 calls per minute.
	pub fn check_default(&self, key: &str) -> RateLimitDecision {
		self.check_rule(key, RateLimitRule::default())
	}

	fn check_at(
		&self,
		key: &str,
		max_requests: u32,
		window: Duration,
		now: OffsetDateTime,
	) -> RateLimitDecision {
		if max_requests == 0 {
			return RateLimitDecision {
				allowed: false,
				remaining: 0,
				reset_at: now.saturating_add(window),
			};
		}

		let mut entries = self.entries.lock();

		if let Some(entry) = entries.get_mut(key).filter(|entry| now <= entry.reset_at) {
			if entry.count >= max_requests {
				return RateLimitDecision { allowed: false, remaining: 0, reset_at: entry.reset_at };
			}

			entry.count += 1;

			return RateLimitDecision {
				allowed: true,
				remaining: max_requests - entry.count,
				reset_at: entry.reset_at,
			};
		}

		let entry = WindowEntry { count: 1, reset_at: now.saturating_add(window) };

		entries.insert(key.to_owned(), entry);

		RateLimitDecision { allowed: true, remaining: max_requests - 1, reset_at: entry.reset_at }
	}

	/// Forgets the window tracked for `key`.
	pub fn reset(&self, key: &str) {
		self.entries.lock().remove(key);
	}

	/// Drops every entry whose window has elapsed, returning how many were removed.
	pub fn sweep(&self) -> usize {
		let now = self.clock.now();
		let mut entries = self.entries.lock();
		let before = entries.len();

		entries.retain(|_, entry| now <= entry.reset_at);

		before - entries.len()
	}

	/// Number of tracked keys.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when no key is tracked.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Runs [`sweep`](Self::sweep) every `period` on the current Tokio runtime.
	///
	/// The task holds a weak reference and exits once the limiter is dropped.
	#[cfg(feature = "tokio")]
	pub fn spawn_sweeper(
		self: &Arc<Self>,
		period: std::time::Duration,
	) -> Result<tokio::task::JoinHandle<()>, ConfigError> {
		if period.is_zero() {
			return Err(ConfigError::ZeroSweepPeriod);
		}

		let limiter = Arc::downgrade(self);

		Ok(tokio::spawn(async move {
			let mut ticker = tokio::time::interval(period);

			// The first tick completes immediately.
			ticker.tick().await;

			loop {
				ticker.tick().await;

				let Some(limiter) = limiter.upgrade() else { break };

				limiter.sweep();
			}
		}))
	}

	/// Starts the default five-minute sweeper when called inside a Tokio runtime.
	///
	/// Returns `None` when no runtime is available; callers then sweep manually.
	#[cfg(feature = "tokio")]
	pub fn spawn_default_sweeper(self: &Arc<Self>) -> Option<tokio::task::JoinHandle<()>> {
		tokio::runtime::Handle::try_current().ok()?;

		self.spawn_sweeper(DEFAULT_SWEEP_PERIOD).ok()
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter").field("tracked_keys", &self.len()).finish()
	}
}
