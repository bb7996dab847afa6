//! Counting permit pool bounding simultaneous in-flight requests.

// crates.io
use async_lock::{Semaphore, SemaphoreGuardArc};
// self
use crate::_prelude::*;

/// Permit held for the lifetime of one request; dropping it frees the slot.
pub struct Permit {
	_guard: SemaphoreGuardArc,
}
impl Debug for Permit {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Permit(..)")
	}
}

/// Bounded pool of request slots.
///
/// Resizing swaps in a fresh pool. Holders of permits from the old pool keep them until they
/// finish, so a shrink takes full effect once those requests drain.
pub struct ConcurrencyGate {
	pool: RwLock<(usize, Arc<Semaphore>)>,
}
impl ConcurrencyGate {
	/// Creates a gate admitting `limit` simultaneous holders (at least one).
	pub fn new(limit: usize) -> Self {
		let limit = limit.max(1);

		Self { pool: RwLock::new((limit, Arc::new(Semaphore::new(limit)))) }
	}

	/// Current capacity.
	pub fn limit(&self) -> usize {
		self.pool.read().0
	}

	/// Replaces the pool when `limit` differs from the current capacity.
	///
	/// Returns `true` when a new pool was installed.
	pub fn resize(&self, limit: usize) -> bool {
		let limit = limit.max(1);
		let mut pool = self.pool.write();

		if pool.0 == limit {
			return false;
		}

		tracing::debug!(from = pool.0, to = limit, "Recreating request permit pool.");

		*pool = (limit, Arc::new(Semaphore::new(limit)));

		true
	}

	/// Takes a permit without waiting, if one is free.
	pub fn try_acquire(&self) -> Option<Permit> {
		let semaphore = self.pool.read().1.clone();

		semaphore.try_acquire_arc().map(|guard| Permit { _guard: guard })
	}

	/// Waits up to `wait` for a permit.
	pub async fn acquire(&self, wait: Duration) -> Result<Permit> {
		let semaphore = self.pool.read().1.clone();

		tokio::time::timeout(wait, semaphore.acquire_arc())
			.await
			.map(|guard| Permit { _guard: guard })
			.map_err(|_| Error::Timeout { waited: wait })
	}
}
impl Debug for ConcurrencyGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConcurrencyGate").field("limit", &self.limit()).finish()
	}
}
