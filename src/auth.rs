//! Session authentication: credential login, token refresh, and the token state they maintain.

pub mod claims;
pub mod secret;
pub mod token;

pub use secret::Secret;
pub use token::*;

// self
use crate::{
	_prelude::*,
	api::{self, LoginRequest, TokenEnvelope},
	exec::Executor,
	http::{ApiTransport, Method},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

const NO_TOKEN_REASON: &str = "Invalid response format - no token found";

/// Obtains and renews session tokens through a shared [`Executor`].
///
/// Login failures clear the held token; refresh failures leave it untouched so callers may
/// continue with the current token until it expires.
pub struct Authenticator<T>
where
	T: ?Sized + ApiTransport,
{
	executor: Arc<Executor<T>>,
	refresh_guard: AsyncMutex<()>,
}
impl<T> Authenticator<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates an authenticator that stores tokens into the executor's [`TokenState`].
	pub fn new(executor: Arc<Executor<T>>) -> Self {
		Self { executor, refresh_guard: AsyncMutex::new(()) }
	}

	/// Token state shared with the executor.
	pub fn token(&self) -> &TokenState {
		&self.executor.token
	}

	/// Exchanges credentials (and an optional one-time password) for a session token.
	///
	/// An empty `otp` is treated as absent. When the server answers with an OTP challenge the
	/// token state is left as it was and [`Error::OtpRequired`] is returned.
	pub async fn login(&self, username: &str, password: &Secret, otp: Option<&str>) -> Result<Secret> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.login_inner(username, password, otp)).await;

		match &result {
			Ok(_) => tracing::info!(username, "Login succeeded."),
			Err(Error::OtpRequired) => tracing::info!(username, "Login requires a one-time password."),
			Err(err) => {
				tracing::warn!(username, error = %err, "Login failed.");

				self.token().clear();
			},
		}

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Renews the held token via the refresh endpoint.
	///
	/// Concurrent callers are serialized so only one refresh is in flight at a time.
	pub async fn refresh(&self) -> Result<Secret> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async {
				let _singleflight = self.refresh_guard.lock().await;

				self.refresh_inner().await
			})
			.await;

		match &result {
			Ok(_) => tracing::info!("Token refreshed."),
			Err(err) => tracing::warn!(error = %err, "Token refresh failed; keeping the current token."),
		}

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Refreshes the token when it is missing, expired, or expires within `threshold`.
	///
	/// Returns `true` if a refresh was performed. The check is repeated after acquiring the
	/// refresh guard so a burst of callers triggers a single refresh.
	pub async fn refresh_if_needed(&self, threshold: Duration) -> Result<bool> {
		if !self.token().needs_refresh(threshold) {
			return Ok(false);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if !self.token().needs_refresh(threshold) {
			return Ok(false);
		}

		let span = OpSpan::new(OpKind::Refresh, "refresh_if_needed");

		obs::record_op_outcome(OpKind::Refresh, OpOutcome::Attempt);

		let result = span.instrument(self.refresh_inner()).await;

		obs::record_op_outcome(OpKind::Refresh, OpOutcome::of(&result));

		result.map(|_| true)
	}

	/// Drops the held token.
	pub fn logout(&self) {
		self.token().clear();
	}

	async fn login_inner(
		&self,
		username: &str,
		password: &Secret,
		otp: Option<&str>,
	) -> Result<Secret> {
		let request = LoginRequest {
			username,
			password: password.expose(),
			totp_token: otp.filter(|code| !code.is_empty()),
		};
		let response = self
			.executor
			.execute(Method::Post, api::TOKEN_PATH, Some(&request.to_json()), false)
			.await
			.map_err(rejected_credentials)?;
		let envelope = decode(response)?;

		if let Some(token) = envelope.token() {
			self.token().set(Some(token));

			return Ok(Secret::new(token));
		}
		if envelope.otp_required() {
			return Err(Error::OtpRequired);
		}

		Err(Error::AuthenticationRequired { reason: NO_TOKEN_REASON.into() })
	}

	async fn refresh_inner(&self) -> Result<Secret> {
		let response = self
			.executor
			.execute(Method::Get, api::REFRESH_TOKEN_PATH, None, true)
			.await
			.map_err(rejected_credentials)?;
		let envelope = decode(response)?;
		let token = envelope
			.token()
			.ok_or_else(|| Error::AuthenticationRequired { reason: NO_TOKEN_REASON.into() })?;

		self.token().set(Some(token));

		Ok(Secret::new(token))
	}
}
impl<T> Debug for Authenticator<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator").field("token", self.token()).finish()
	}
}

fn decode(response: Value) -> Result<TokenEnvelope> {
	TokenEnvelope::decode(response)
		.map_err(|source| Error::Serialization { status: None, source: source.into() })
}

fn rejected_credentials(err: Error) -> Error {
	match err {
		Error::HttpStatus { status: status @ (401 | 403), message } => Error::AuthenticationRequired {
			reason: message.unwrap_or_else(|| format!("HTTP {status}")),
		},
		other => other,
	}
}
