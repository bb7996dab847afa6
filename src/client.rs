//! High-level client facade wiring config, token, cookies, executor, and authenticator together.

// self
use crate::{
	_prelude::*,
	auth::{Authenticator, Secret, TokenState},
	config::{ClientConfig, ConfigSource},
	exec::{Executor, RequestMetrics},
	http::{ApiTransport, Method},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// PwnDoc API client.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and may be called from any number
/// of tasks at once.
pub struct PwnDocClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Settings source consulted on every call.
	pub config: Arc<dyn ConfigSource>,
	/// Current session token.
	pub token: Arc<TokenState>,
	/// Server session cookie.
	pub session: Arc<SessionStore>,
	/// Request pipeline.
	pub executor: Arc<Executor<T>>,
	/// Login and refresh.
	pub authenticator: Authenticator<T>,
}
#[cfg(feature = "reqwest")]
impl PwnDocClient<ReqwestTransport> {
	/// Builds a client backed by [`ReqwestTransport`].
	pub fn new(config: impl ConfigSource) -> Result<Self> {
		Ok(Self::with_transport(config, ReqwestTransport::new()?))
	}
}
impl<T> PwnDocClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Builds a client over a caller-supplied transport.
	pub fn with_transport(config: impl ConfigSource, transport: impl Into<Arc<T>>) -> Self {
		let config: Arc<dyn ConfigSource> = Arc::new(config);
		let token = Arc::new(TokenState::default());
		let session = Arc::new(SessionStore::default());
		let executor =
			Arc::new(Executor::new(config.clone(), transport, token.clone(), session.clone()));
		let authenticator = Authenticator::new(executor.clone());

		Self { config, token, session, executor, authenticator }
	}

	/// Validates the configured endpoint and credentials, then logs in.
	///
	/// Validation failures are reported before any network call.
	pub async fn connect(&self, otp: Option<&str>) -> Result<Secret> {
		let ClientConfig { username, password, .. } = self.checked_config()?;

		self.authenticator.login(&username, &password, otp).await
	}

	/// Renews the session token.
	pub async fn refresh_token(&self) -> Result<Secret> {
		self.authenticator.refresh().await
	}

	/// Refreshes a still-valid token that is about to expire, when auto-refresh is enabled.
	///
	/// Returns `true` if a refresh was performed.
	pub async fn ensure_fresh_token(&self) -> Result<bool> {
		let config = self.config.snapshot();

		if !config.auto_refresh_token || !self.token.has_valid_token() {
			return Ok(false);
		}

		self.authenticator.refresh_if_needed(config.token_refresh_threshold()).await
	}

	/// Sends one request through the executor.
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		body: Option<&Value>,
		requires_auth: bool,
	) -> Result<Value> {
		self.executor.execute(method, path, body, requires_auth).await
	}

	/// Authenticated `GET`.
	pub async fn get(&self, path: &str) -> Result<Value> {
		self.execute(Method::Get, path, None, true).await
	}

	/// `POST` with a JSON body.
	pub async fn post(&self, path: &str, body: &Value, requires_auth: bool) -> Result<Value> {
		self.execute(Method::Post, path, Some(body), requires_auth).await
	}

	/// Authenticated `PUT` with a JSON body.
	pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
		self.execute(Method::Put, path, Some(body), true).await
	}

	/// Authenticated `DELETE`.
	pub async fn delete(&self, path: &str) -> Result<Value> {
		self.execute(Method::Delete, path, None, true).await
	}

	/// Forgets the token and the session cookie.
	pub fn clear_session(&self) {
		self.authenticator.logout();
		self.session.clear();
	}

	/// Rebuilds the permit pool from the current config; returns `true` if it changed.
	pub fn update_concurrency_limit(&self) -> bool {
		self.executor.update_concurrency_limit()
	}

	/// Request counters.
	pub fn metrics(&self) -> &RequestMetrics {
		&self.executor.metrics
	}

	fn checked_config(&self) -> Result<ClientConfig> {
		let config = self.config.snapshot();

		config.validate_credentials()?;

		Ok(config)
	}
}
impl<T> Debug for PwnDocClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PwnDocClient")
			.field("token", &self.token)
			.field("session", &self.session)
			.field("executor", &self.executor)
			.finish()
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	use serde_json::json;
	// self
	use crate::{_preludet::*, auth::claims, config::ClientConfig, error::ConfigError};

	fn token_expiring_in(seconds: i64) -> String {
		let exp = OffsetDateTime::now_utc().unix_timestamp() + seconds;

		claims::unsigned_token(&json!({ "sub": "tester", "exp": exp }))
	}

	#[tokio::test]
	async fn connect_validates_before_network() {
		let client = build_reqwest_test_client(ClientConfig::new("http://127.0.0.1:9"));
		let err = client.connect(None).await.expect_err("Missing username should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingUsername)));
		assert_eq!(client.metrics().attempts(), 0);

		let client = build_reqwest_test_client(test_config(""));
		let err = client.connect(None).await.expect_err("Missing base URL should be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::MissingBaseUrl)));
	}

	#[tokio::test]
	async fn ensure_fresh_token_refreshes_only_near_expiry() {
		let server = MockServer::start_async().await;
		let rotated = token_expiring_in(3_600);
		let refresh = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/users/refreshtoken");
				then.status(200)
					.header("content-type", "application/json")
					.body(json!({ "status": "success", "datas": { "token": rotated } }).to_string());
			})
			.await;
		let client = build_reqwest_test_client(test_config(&server.base_url()));

		assert!(!client.ensure_fresh_token().await.expect("No token means nothing to refresh."));

		client.token.set(Some(&token_expiring_in(3_600)));

		assert!(!client.ensure_fresh_token().await.expect("Distant expiry should not refresh."));

		client.token.set(Some(&token_expiring_in(60)));

		assert!(client.ensure_fresh_token().await.expect("Near expiry should trigger a refresh."));
		assert_eq!(client.token.get().map(|token| token.expose().to_owned()), Some(rotated));

		refresh.assert_calls_async(1).await;
	}

	#[tokio::test]
	async fn concurrent_refreshes_hit_the_server_once() {
		let server = MockServer::start_async().await;
		let rotated = token_expiring_in(3_600);
		let refresh = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/users/refreshtoken");
				then.status(200)
					.header("content-type", "application/json")
					.body(json!({ "status": "success", "datas": { "token": rotated } }).to_string());
			})
			.await;
		let client = build_reqwest_test_client(test_config(&server.base_url()));

		client.token.set(Some(&token_expiring_in(30)));

		let (first, second) = tokio::join!(client.ensure_fresh_token(), client.ensure_fresh_token());
		let refreshed = [
			first.expect("First caller should succeed."),
			second.expect("Second caller should succeed."),
		];

		assert_eq!(refreshed.iter().filter(|done| **done).count(), 1);

		refresh.assert_calls_async(1).await;
	}

	#[tokio::test]
	async fn disabled_auto_refresh_is_a_no_op() {
		let client = build_reqwest_test_client(
			test_config("http://127.0.0.1:9").with_auto_refresh_token(false),
		);

		client.token.set(Some(&token_expiring_in(10)));

		assert!(!client.ensure_fresh_token().await.expect("Disabled auto-refresh never fails."));
		assert_eq!(client.metrics().attempts(), 0);
	}
}
