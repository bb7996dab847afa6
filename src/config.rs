//! Client configuration, accepted ranges, and the source trait the executor reads from.
//!
//! The executor never caches settings: it calls [`ConfigSource::snapshot`] once per request so
//! a UI that edits a [`SharedConfig`] sees the change on the next call.

// self
use crate::{_prelude::*, auth::Secret, error::ConfigError, exec::BackoffStrategy};

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("pwndoc-client/", env!("CARGO_PKG_VERSION"));

const TIMEOUT_SECS: (u64, u64) = (5, 120);
const MAX_RETRIES: (u32, u32) = (0, 10);
const CONCURRENCY: (usize, usize) = (1, 5);
const RATE_PER_MINUTE: (u32, u32) = (10, 600);
const REFRESH_THRESHOLD_MINUTES: (u32, u32) = (1, 30);

/// Settings consumed by the request executor and authenticator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
	/// Server root, e.g. `https://pwndoc.local:8443`; a trailing `/` is ignored.
	pub base_url: String,
	/// Login name.
	pub username: String,
	/// Login password.
	pub password: Secret,
	/// Accept any certificate and hostname. Off unless explicitly enabled.
	pub allow_insecure_tls: bool,
	/// Per-request timeout in seconds (5–120); also bounds the wait for a request slot.
	pub timeout_secs: u64,
	/// Retries after the first attempt on transport failure (0–10).
	pub max_retries: u32,
	/// Delay shape between retries.
	pub backoff: BackoffStrategy,
	/// Maximum simultaneous in-flight requests (1–5).
	pub concurrency_limit: usize,
	/// Maximum requests started per rolling minute (10–600).
	pub rate_limit_per_minute: u32,
	/// Refresh the token automatically once it nears expiry.
	pub auto_refresh_token: bool,
	/// How close to expiry a token counts as due for refresh, in minutes (1–30).
	pub token_refresh_threshold_minutes: u32,
	/// `User-Agent` header sent with every request.
	pub user_agent: String,
}
impl ClientConfig {
	/// Creates a config for `base_url` with default networking settings.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), ..Default::default() }
	}

	/// Sets the login credentials.
	pub fn with_credentials(
		mut self,
		username: impl Into<String>,
		password: impl Into<Secret>,
	) -> Self {
		self.username = username.into();
		self.password = password.into();

		self
	}

	/// Opts into accepting any certificate and hostname.
	pub fn with_insecure_tls(mut self, allow: bool) -> Self {
		self.allow_insecure_tls = allow;

		self
	}

	/// Sets the request timeout, clamped to 5–120 seconds.
	pub fn with_timeout_secs(mut self, secs: u64) -> Self {
		self.timeout_secs = secs.clamp(TIMEOUT_SECS.0, TIMEOUT_SECS.1);

		self
	}

	/// Sets the retry count, clamped to 0–10.
	pub fn with_max_retries(mut self, retries: u32) -> Self {
		self.max_retries = retries.clamp(MAX_RETRIES.0, MAX_RETRIES.1);

		self
	}

	/// Sets the backoff strategy.
	pub fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
		self.backoff = backoff;

		self
	}

	/// Sets the concurrency cap, clamped to 1–5.
	pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
		self.concurrency_limit = limit.clamp(CONCURRENCY.0, CONCURRENCY.1);

		self
	}

	/// Sets the per-minute request budget, clamped to 10–600.
	pub fn with_rate_limit_per_minute(mut self, limit: u32) -> Self {
		self.rate_limit_per_minute = limit.clamp(RATE_PER_MINUTE.0, RATE_PER_MINUTE.1);

		self
	}

	/// Toggles automatic token refresh.
	pub fn with_auto_refresh_token(mut self, enabled: bool) -> Self {
		self.auto_refresh_token = enabled;

		self
	}

	/// Sets the refresh threshold, clamped to 1–30 minutes.
	pub fn with_token_refresh_threshold_minutes(mut self, minutes: u32) -> Self {
		self.token_refresh_threshold_minutes =
			minutes.clamp(REFRESH_THRESHOLD_MINUTES.0, REFRESH_THRESHOLD_MINUTES.1);

		self
	}

	/// Overrides the `User-Agent` header; blank values fall back to the default.
	pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = user_agent.into();

		self
	}

	/// Re-applies every range clamp; use after deserializing untrusted settings.
	pub fn normalized(self) -> Self {
		let Self {
			timeout_secs,
			max_retries,
			concurrency_limit,
			rate_limit_per_minute,
			token_refresh_threshold_minutes,
			..
		} = self;

		self.with_timeout_secs(timeout_secs)
			.with_max_retries(max_retries)
			.with_concurrency_limit(concurrency_limit)
			.with_rate_limit_per_minute(rate_limit_per_minute)
			.with_token_refresh_threshold_minutes(token_refresh_threshold_minutes)
	}

	/// Request timeout as a [`Duration`].
	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	/// Refresh threshold as a [`Duration`].
	pub fn token_refresh_threshold(&self) -> Duration {
		Duration::from_secs(u64::from(self.token_refresh_threshold_minutes) * 60)
	}

	/// `User-Agent` to send, falling back to [`DEFAULT_USER_AGENT`] when blank.
	pub fn effective_user_agent(&self) -> &str {
		let trimmed = self.user_agent.trim();

		if trimmed.is_empty() { DEFAULT_USER_AGENT } else { trimmed }
	}

	/// Ensures the base URL is present and joins it with `path`.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.trim().trim_end_matches('/');

		if base.is_empty() {
			return Err(ConfigError::MissingBaseUrl);
		}

		Url::parse(&format!("{base}{path}"))
			.map_err(|source| ConfigError::InvalidBaseUrl { source })
	}

	/// Checks that the base URL is present and parses.
	pub fn validate_endpoint(&self) -> Result<(), ConfigError> {
		self.endpoint("").map(drop)
	}

	/// Checks everything a login needs before touching the network.
	pub fn validate_credentials(&self) -> Result<(), ConfigError> {
		self.validate_endpoint()?;

		if self.username.is_empty() {
			return Err(ConfigError::MissingUsername);
		}
		if self.password.is_empty() {
			return Err(ConfigError::MissingPassword);
		}

		Ok(())
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self {
			base_url: String::new(),
			username: String::new(),
			password: Secret::default(),
			allow_insecure_tls: false,
			timeout_secs: 15,
			max_retries: 3,
			backoff: BackoffStrategy::Exponential,
			concurrency_limit: 2,
			rate_limit_per_minute: 60,
			auto_refresh_token: true,
			token_refresh_threshold_minutes: 5,
			user_agent: DEFAULT_USER_AGENT.into(),
		}
	}
}

/// Narrow read interface through which the core consumes configuration.
pub trait ConfigSource
where
	Self: 'static + Send + Sync,
{
	/// Returns the settings to apply to the next operation.
	fn snapshot(&self) -> ClientConfig;
}
impl ConfigSource for ClientConfig {
	fn snapshot(&self) -> ClientConfig {
		self.clone()
	}
}

/// Live, shareable configuration; edits apply to the next request.
#[derive(Clone, Debug, Default)]
pub struct SharedConfig(Arc<RwLock<ClientConfig>>);
impl SharedConfig {
	/// Wraps `config` after normalizing it.
	pub fn new(config: ClientConfig) -> Self {
		Self(Arc::new(RwLock::new(config.normalized())))
	}

	/// Applies `edit` under the write lock, then re-normalizes the result.
	pub fn update(&self, edit: impl FnOnce(&mut ClientConfig)) {
		let mut guard = self.0.write();

		edit(&mut guard);

		*guard = std::mem::take(&mut *guard).normalized();
	}
}
impl ConfigSource for SharedConfig {
	fn snapshot(&self) -> ClientConfig {
		self.0.read().clone()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn setters_clamp_to_accepted_ranges() {
		let config = ClientConfig::new("https://pwndoc.local")
			.with_timeout_secs(1)
			.with_max_retries(99)
			.with_concurrency_limit(0)
			.with_rate_limit_per_minute(10_000)
			.with_token_refresh_threshold_minutes(0);

		assert_eq!(config.timeout_secs, 5);
		assert_eq!(config.max_retries, 10);
		assert_eq!(config.concurrency_limit, 1);
		assert_eq!(config.rate_limit_per_minute, 600);
		assert_eq!(config.token_refresh_threshold_minutes, 1);
	}

	#[test]
	fn deserialized_config_is_normalized_and_defaulted() {
		let config: ClientConfig = serde_json::from_str(
			r#"{"baseUrl":"https://pwndoc.local/","timeoutSecs":500,"backoff":"linear"}"#,
		)
		.expect("Partial config should deserialize with defaults.");
		let config = config.normalized();

		assert_eq!(config.timeout_secs, 120);
		assert_eq!(config.backoff, BackoffStrategy::Linear);
		assert_eq!(config.max_retries, 3);
		assert_eq!(config.concurrency_limit, 2);
		assert!(!config.allow_insecure_tls, "Insecure TLS must stay opt-in.");
	}

	#[test]
	fn endpoint_strips_trailing_slash() {
		let config = ClientConfig::new("https://pwndoc.local:8443/");
		let url = config.endpoint("/api/audits").expect("Endpoint should join cleanly.");

		assert_eq!(url.as_str(), "https://pwndoc.local:8443/api/audits");
	}

	#[test]
	fn validation_fails_fast_on_missing_fields() {
		assert!(matches!(ClientConfig::default().endpoint("/x"), Err(ConfigError::MissingBaseUrl)));
		assert!(matches!(
			ClientConfig::new("not a url").endpoint("/x"),
			Err(ConfigError::InvalidBaseUrl { .. })
		));
		assert!(matches!(
			ClientConfig::new("https://h").validate_credentials(),
			Err(ConfigError::MissingUsername)
		));
		assert!(matches!(
			ClientConfig::new("https://h").with_credentials("u", "").validate_credentials(),
			Err(ConfigError::MissingPassword)
		));
		assert!(
			ClientConfig::new("https://h").with_credentials("u", "p").validate_credentials().is_ok()
		);
	}

	#[test]
	fn blank_user_agent_falls_back_to_default() {
		let config = ClientConfig::default().with_user_agent("   ");

		assert_eq!(config.effective_user_agent(), DEFAULT_USER_AGENT);
		assert_eq!(
			ClientConfig::default().with_user_agent("Burp-PwnDoc").effective_user_agent(),
			"Burp-PwnDoc"
		);
	}

	#[test]
	fn shared_config_updates_are_visible_and_clamped() {
		let shared = SharedConfig::new(ClientConfig::new("https://pwndoc.local"));

		shared.update(|config| config.concurrency_limit = 42);

		assert_eq!(shared.snapshot().concurrency_limit, 5);
	}
}
