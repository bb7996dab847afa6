//! Rolling per-minute request budget.
//!
//! The limiter never rejects: once the window's budget is spent, callers wait until the
//! window rolls over. The whole check-wait-count sequence runs inside one async mutex, so
//! concurrent callers queue behind a waiting caller instead of racing the counter.

// crates.io
use tokio::time::{self, Instant};
// self
use crate::_prelude::*;

/// Length of one rate window.
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Counter state for the current window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateWindow {
	/// Instant the window opened.
	pub started_at: Instant,
	/// Requests admitted inside the window.
	pub count: u32,
}
impl RateWindow {
	/// Opens a fresh, empty window at `now`.
	pub fn open(now: Instant) -> Self {
		Self { started_at: now, count: 0 }
	}

	/// Instant the window rolls over.
	pub fn ends_at(&self) -> Instant {
		self.started_at + RATE_WINDOW
	}

	/// Decides whether one more request may start at `now` under `limit`.
	///
	/// Rolls the window over first when it has lapsed; otherwise an exhausted window yields a
	/// delay until it ends.
	pub fn evaluate(&mut self, now: Instant, limit: u32) -> RateLimitDecision {
		if now >= self.ends_at() {
			*self = Self::open(now);
		}
		if self.count >= limit {
			return RateLimitDecision::Delay(self.ends_at().saturating_duration_since(now));
		}

		RateLimitDecision::Allow
	}
}

/// Result of consulting a [`RateWindow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately.
	Allow,
	/// The window is exhausted; wait this long for it to roll over.
	Delay(Duration),
}

/// Async limiter enforcing a requests-per-minute budget.
#[derive(Debug)]
pub struct RateLimiter(AsyncMutex<Option<RateWindow>>);
impl RateLimiter {
	/// Creates a limiter with no open window.
	pub fn new() -> Self {
		Self(AsyncMutex::new(None))
	}

	/// Waits until a request may start under `limit`, then counts it.
	///
	/// Returns how long the caller was held back.
	pub async fn acquire(&self, limit: u32) -> Duration {
		let limit = limit.max(1);
		let mut guard = self.0.lock().await;
		let now = Instant::now();
		let window = guard.get_or_insert_with(|| RateWindow::open(now));
		let waited = match window.evaluate(now, limit) {
			RateLimitDecision::Allow => Duration::ZERO,
			RateLimitDecision::Delay(delay) => {
				tracing::warn!(limit, ?delay, "Rate limit reached; pausing until the window rolls over.");

				time::sleep(delay).await;

				*window = RateWindow::open(Instant::now());

				delay
			},
		};

		window.count += 1;

		waited
	}

	/// Requests admitted in the current window, if one is open.
	pub async fn in_window(&self) -> u32 {
		self.0.lock().await.map_or(0, |window| window.count)
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn window_transitions_between_accepting_and_exhausted() {
		let start = Instant::now();
		let mut window = RateWindow::open(start);

		for _ in 0..3 {
			assert_eq!(window.evaluate(start, 3), RateLimitDecision::Allow);

			window.count += 1;
		}

		assert_eq!(
			window.evaluate(start + Duration::from_secs(20), 3),
			RateLimitDecision::Delay(Duration::from_secs(40))
		);
		assert_eq!(window.evaluate(start + RATE_WINDOW, 3), RateLimitDecision::Allow);
		assert_eq!(window.count, 0, "Lapsed window should reset passively.");
	}

	#[tokio::test(start_paused = true)]
	async fn request_over_budget_waits_for_rollover() {
		let limiter = RateLimiter::default();
		let start = Instant::now();

		for _ in 0..10 {
			assert_eq!(limiter.acquire(10).await, Duration::ZERO);
		}

		assert_eq!(limiter.in_window().await, 10);

		let waited = limiter.acquire(10).await;

		assert_eq!(waited, RATE_WINDOW);
		assert!(start.elapsed() >= RATE_WINDOW);
		assert_eq!(limiter.in_window().await, 1);
	}

	#[tokio::test(start_paused = true)]
	async fn lapsed_window_resets_without_waiting() {
		let limiter = RateLimiter::default();

		for _ in 0..10 {
			limiter.acquire(10).await;
		}

		time::advance(RATE_WINDOW + Duration::from_secs(1)).await;

		assert_eq!(limiter.acquire(10).await, Duration::ZERO);
		assert_eq!(limiter.in_window().await, 1);
	}
}
