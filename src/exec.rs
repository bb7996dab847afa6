//! Request execution engine: permit gate, rate budget, and retry-with-backoff.
//!
//! [`Executor::execute`] runs, in order:
//!
//! 1. take a concurrency permit, waiting at most the configured request timeout;
//! 2. wait for room in the per-minute rate budget;
//! 3. attempt the exchange, retrying only transport failures after a backoff delay;
//! 4. capture `Set-Cookie` headers and classify the response.
//!
//! The permit is an RAII guard, so it is released on every exit path.

pub mod backoff;
pub mod gate;
mod metrics;
pub mod rate_limit;

pub use backoff::*;
pub use gate::*;
pub use metrics::RequestMetrics;
pub use rate_limit::*;

// self
use crate::{
	_prelude::*,
	api,
	auth::TokenState,
	config::{ClientConfig, ConfigSource},
	http::{ApiRequest, ApiResponse, ApiTransport, Method},
	obs::{self, FailureClass, OpKind, OpOutcome, OpSpan},
	session::SessionStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Executor specialized for the crate's default reqwest transport.
pub type ReqwestExecutor = Executor<ReqwestTransport>;

/// Endpoint-agnostic JSON request executor shared by every caller.
pub struct Executor<T>
where
	T: ?Sized + ApiTransport,
{
	/// Transport used for every exchange.
	pub transport: Arc<T>,
	/// Settings source consulted once per request.
	pub config: Arc<dyn ConfigSource>,
	/// Token attached to authenticated requests.
	pub token: Arc<TokenState>,
	/// Cookie jar replayed on every request.
	pub session: Arc<SessionStore>,
	/// Traffic counters.
	pub metrics: Arc<RequestMetrics>,
	gate: ConcurrencyGate,
	limiter: RateLimiter,
}
impl<T> Executor<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an executor sized from the current config snapshot.
	pub fn new(
		config: Arc<dyn ConfigSource>,
		transport: impl Into<Arc<T>>,
		token: Arc<TokenState>,
		session: Arc<SessionStore>,
	) -> Self {
		let gate = ConcurrencyGate::new(config.snapshot().concurrency_limit);

		Self {
			transport: transport.into(),
			config,
			token,
			session,
			metrics: Default::default(),
			gate,
			limiter: Default::default(),
		}
	}

	/// Executes one JSON API call and returns the parsed 2xx body.
	///
	/// Never panics across this boundary; every failure is classified into [`Error`].
	pub async fn execute(
		&self,
		method: Method,
		path: &str,
		body: Option<&Value>,
		requires_auth: bool,
	) -> Result<Value> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "execute");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.execute_inner(method, path, body, requires_auth)).await;

		match &result {
			Ok(_) => self.metrics.record_success(),
			Err(err) => {
				tracing::debug!(
					%method,
					path,
					class = %FailureClass::of(err),
					error = %err,
					"Request failed."
				);

				self.metrics.record_failure();
			},
		}

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Rebuilds the permit pool if the configured concurrency limit changed.
	///
	/// Requests already holding a permit run to completion on the old pool.
	pub fn update_concurrency_limit(&self) -> bool {
		self.gate.resize(self.config.snapshot().concurrency_limit)
	}

	/// Current permit pool capacity.
	pub fn concurrency_limit(&self) -> usize {
		self.gate.limit()
	}

	async fn execute_inner(
		&self,
		method: Method,
		path: &str,
		body: Option<&Value>,
		requires_auth: bool,
	) -> Result<Value> {
		let config = self.config.snapshot();
		let url = config.endpoint(path)?;
		let body = body.map(|json| json.to_string().into_bytes());

		self.gate.resize(config.concurrency_limit);

		let _permit = self.gate.acquire(config.timeout()).await?;

		self.limiter.acquire(config.rate_limit_per_minute).await;

		let policy = RetryPolicy::new(config.max_retries, config.backoff);
		let mut attempt = 0;

		loop {
			let request = self.build_request(&config, method, &url, body.clone(), requires_auth);

			tracing::debug!(%method, path, attempt, "Sending request.");

			self.metrics.record_attempt();

			let err = match self.transport.send(request).await {
				Ok(response) => return self.classify(response),
				Err(err) => err,
			};

			match policy.delay_after(attempt) {
				Some(delay) => {
					tracing::warn!(%method, path, attempt, ?delay, error = %err, "Transport failure; retrying.");

					self.metrics.record_retry();
					obs::record_op_outcome(OpKind::Request, OpOutcome::Retry);

					tokio::time::sleep(delay).await;

					attempt += 1;
				},
				None => return Err(Error::Transport { attempts: attempt + 1, source: err }),
			}
		}
	}

	fn build_request(
		&self,
		config: &ClientConfig,
		method: Method,
		url: &Url,
		body: Option<Vec<u8>>,
		requires_auth: bool,
	) -> ApiRequest {
		let mut headers = vec![
			("Content-Type", "application/json".to_owned()),
			("Accept", "application/json".to_owned()),
			("User-Agent", config.effective_user_agent().to_owned()),
		];

		if requires_auth {
			match self.token.valid_token() {
				Some(token) => headers.push(("Authorization", format!("JWT {}", token.expose()))),
				None => tracing::warn!(path = url.path(), "No valid token; sending unauthenticated."),
			}
		}
		if let Some(cookie) = self.session.header() {
			headers.push(("Cookie", cookie));
		}

		ApiRequest {
			method,
			url: url.clone(),
			headers,
			body,
			timeout: config.timeout(),
			accept_invalid_certs: config.allow_insecure_tls,
		}
	}

	fn classify(&self, response: ApiResponse) -> Result<Value> {
		self.session.capture(&response.set_cookies);

		if !response.is_success() {
			return Err(Error::HttpStatus {
				status: response.status,
				message: api::error_message(&response.body),
			});
		}

		let status = Some(response.status);
		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let value = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Serialization { status, source: source.into() })?;

		// Trailing bytes after the document make the whole body malformed.
		deserializer.end().map_err(|source| Error::Serialization { status, source: source.into() })?;

		Ok(value)
	}
}
impl<T> Debug for Executor<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Executor")
			.field("gate", &self.gate)
			.field("metrics", &self.metrics)
			.finish()
	}
}
