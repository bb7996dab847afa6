// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for executor traffic.
#[derive(Debug, Default)]
pub struct RequestMetrics {
	attempts: AtomicU64,
	retries: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RequestMetrics {
	/// Returns the number of times the transport was invoked.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of backoff sleeps taken after transport failures.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of executions that produced a success payload.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of executions that produced an error.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
