//! Retry delay policy.

// self
use crate::{_prelude::*, error::ConfigError};

/// Unit every strategy scales.
pub const BACKOFF_BASE: Duration = Duration::from_millis(1_000);

/// Shape of the wait between retry attempts. No jitter is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BackoffStrategy {
	/// Always one base unit.
	Fixed,
	/// One more base unit per attempt.
	Linear,
	/// Doubles every attempt.
	#[default]
	Exponential,
}
impl BackoffStrategy {
	/// Delay to wait after the failed attempt with zero-based index `attempt`.
	///
	/// Pure: the same index always yields the same delay.
	pub fn delay(self, attempt: u32) -> Duration {
		match self {
			Self::Fixed => BACKOFF_BASE,
			Self::Linear => BACKOFF_BASE.saturating_mul(attempt.saturating_add(1)),
			Self::Exponential =>
				BACKOFF_BASE.saturating_mul(2_u32.checked_pow(attempt).unwrap_or(u32::MAX)),
		}
	}

	/// Returns a stable label suitable for config files and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Fixed => "fixed",
			Self::Linear => "linear",
			Self::Exponential => "exponential",
		}
	}
}
impl Display for BackoffStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for BackoffStrategy {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"fixed" => Ok(Self::Fixed),
			"linear" => Ok(Self::Linear),
			"exponential" => Ok(Self::Exponential),
			_ => Err(ConfigError::UnknownBackoffStrategy { name: s.to_owned() }),
		}
	}
}
impl TryFrom<String> for BackoffStrategy {
	type Error = ConfigError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl From<BackoffStrategy> for String {
	fn from(value: BackoffStrategy) -> Self {
		value.as_str().to_owned()
	}
}

/// Attempt budget plus delay shape for one request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries allowed after the first attempt.
	pub max_retries: u32,
	/// Delay shape between attempts.
	pub strategy: BackoffStrategy,
}
impl RetryPolicy {
	/// Creates a policy allowing `max_retries` retries shaped by `strategy`.
	pub fn new(max_retries: u32, strategy: BackoffStrategy) -> Self {
		Self { max_retries, strategy }
	}

	/// Total attempts, counting the first one.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Delay before the retry following failed attempt `attempt`, or `None` when the budget
	/// is spent.
	pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
		(attempt < self.max_retries).then(|| self.strategy.delay(attempt))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn millis(strategy: BackoffStrategy) -> Vec<u128> {
		(0..3).map(|attempt| strategy.delay(attempt).as_millis()).collect()
	}

	#[test]
	fn strategies_match_documented_delays() {
		assert_eq!(millis(BackoffStrategy::Exponential), [1_000, 2_000, 4_000]);
		assert_eq!(millis(BackoffStrategy::Linear), [1_000, 2_000, 3_000]);
		assert_eq!(millis(BackoffStrategy::Fixed), [1_000, 1_000, 1_000]);
	}

	#[test]
	fn exponential_saturates_instead_of_overflowing() {
		assert!(BackoffStrategy::Exponential.delay(64) >= BackoffStrategy::Exponential.delay(31));
	}

	#[test]
	fn names_parse_case_insensitively() {
		assert_eq!("Exponential".parse::<BackoffStrategy>().ok(), Some(BackoffStrategy::Exponential));
		assert_eq!(" LINEAR ".parse::<BackoffStrategy>().ok(), Some(BackoffStrategy::Linear));
		assert!(matches!(
			"jittered".parse::<BackoffStrategy>(),
			Err(ConfigError::UnknownBackoffStrategy { .. })
		));
	}

	#[test]
	fn retry_policy_counts_attempts() {
		let policy = RetryPolicy::new(2, BackoffStrategy::Fixed);

		assert_eq!(policy.max_attempts(), 3);
		assert_eq!(policy.delay_after(0), Some(BACKOFF_BASE));
		assert_eq!(policy.delay_after(1), Some(BACKOFF_BASE));
		assert_eq!(policy.delay_after(2), None);
	}
}
