//! In-flight request registry keyed by [`RequestKey`].
//!
//! At most one entry exists per key. Registering a key aborts the previous holder; each entry
//! carries a generation so a superseded request finishing late never evicts its successor.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures::future::{AbortHandle, AbortRegistration};
// self
use crate::{_prelude::*, dispatch::RequestKey, obs};

#[derive(Debug)]
struct InFlight {
	generation: u64,
	handle: AbortHandle,
}

/// Registry of cancellation handles for outstanding requests.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
	entries: Mutex<HashMap<RequestKey, InFlight>>,
	next_generation: AtomicU64,
}
impl InFlightRegistry {
	/// Registers a new request under `key`, aborting any request already holding it.
	///
	/// The returned guard removes the entry when dropped, unless a newer request replaced it.
	pub fn register(&self, key: &RequestKey) -> (AbortRegistration, InFlightGuard<'_>) {
		let (handle, registration) = AbortHandle::new_pair();
		let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
		let previous = self.entries.lock().insert(key.clone(), InFlight { generation, handle });

		if let Some(previous) = previous {
			obs::log_superseded(key);
			previous.handle.abort();
		}

		(registration, InFlightGuard { registry: self, key: key.clone(), generation })
	}

	/// Aborts the request registered under `key`, returning whether one existed.
	pub fn cancel(&self, key: &RequestKey) -> bool {
		let removed = self.entries.lock().remove(key);

		match removed {
			Some(entry) => {
				entry.handle.abort();

				true
			},
			None => false,
		}
	}

	/// Aborts every outstanding request and clears the registry.
	pub fn cancel_all(&self) -> usize {
		let drained: Vec<_> = self.entries.lock().drain().collect();

		for (_, entry) in &drained {
			entry.handle.abort();
		}

		drained.len()
	}

	/// Number of outstanding requests.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when nothing is outstanding.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}

	/// Whether a request is outstanding under `key`.
	pub fn contains(&self, key: &RequestKey) -> bool {
		self.entries.lock().contains_key(key)
	}

	fn complete(&self, key: &RequestKey, generation: u64) {
		let mut entries = self.entries.lock();

		if entries.get(key).is_some_and(|entry| entry.generation == generation) {
			entries.remove(key);
		}
	}
}

/// RAII guard returned by [`InFlightRegistry::register`].
pub struct InFlightGuard<'a> {
	registry: &'a InFlightRegistry,
	key: RequestKey,
	generation: u64,
}
impl Debug for InFlightGuard<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("InFlightGuard")
			.field("key", &self.key)
			.field("generation", &self.generation)
			.finish()
	}
}
impl Drop for InFlightGuard<'_> {
	fn drop(&mut self) {
		self.registry.complete(&self.key, self.generation);
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use futures::future::Abortable;
	// self
	use super::*;
	use crate::http::Method;

	#[test]
	fn superseded_guard_keeps_successor_entry() {
		let registry = InFlightRegistry::default();
		let key = RequestKey::new(Method::Get, "events");
		let (_first_reg, first_guard) = registry.register(&key);
		let (_second_reg, second_guard) = registry.register(&key);

		assert_eq!(registry.len(), 1);

		drop(first_guard);

		assert!(registry.contains(&key), "Stale guard must not evict the newer request.");

		drop(second_guard);

		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn registering_same_key_aborts_previous() {
		let registry = InFlightRegistry::default();
		let key = RequestKey::new(Method::Post, "comments");
		let (first_reg, _first_guard) = registry.register(&key);
		let (second_reg, _second_guard) = registry.register(&key);
		let first = Abortable::new(async { 1 }, first_reg).await;
		let second = Abortable::new(async { 2 }, second_reg).await;

		assert!(first.is_err());
		assert_eq!(second.ok(), Some(2));
	}

	#[test]
	fn cancel_all_is_idempotent() {
		let registry = InFlightRegistry::default();
		let (_a, guard_a) = registry.register(&RequestKey::new(Method::Get, "events"));
		let (_b, guard_b) = registry.register(&RequestKey::new(Method::Get, "users/me"));

		assert_eq!(registry.cancel_all(), 2);
		assert_eq!(registry.cancel_all(), 0);
		assert!(registry.is_empty());

		drop(guard_a);
		drop(guard_b);

		assert!(registry.is_empty());
	}

	#[test]
	fn cancel_targets_one_key() {
		let registry = InFlightRegistry::default();
		let events = RequestKey::new(Method::Get, "events");
		let me = RequestKey::new(Method::Get, "users/me");
		let (_a, _guard_a) = registry.register(&events);
		let (_b, _guard_b) = registry.register(&me);

		assert!(registry.cancel(&events));
		assert!(!registry.cancel(&events));
		assert!(registry.contains(&me));
	}
}
