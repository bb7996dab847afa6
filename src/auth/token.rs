//! Thread-safe session token state with JWT-derived expiry.

// self
use crate::{
	_prelude::*,
	auth::{claims, secret::Secret},
};

/// Snapshot of the held token and the expiry derived from its claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionToken {
	/// Token value; callers must avoid logging it.
	pub secret: Secret,
	/// Expiry read from the `exp` claim, or `None` when the token could not be parsed.
	pub expires_at: Option<OffsetDateTime>,
}
impl SessionToken {
	/// Wraps `token`, deriving its expiry from the embedded claims.
	pub fn parse(token: impl Into<String>) -> Self {
		let secret = Secret::new(token);
		let expires_at = claims::expiry_of(secret.expose());

		Self { secret, expires_at }
	}

	/// Returns `true` if the token is usable at `instant`.
	///
	/// Unknown expiry counts as non-expiring.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		self.expires_at.is_none_or(|expiry| instant < expiry)
	}
}

/// Holds the current session token behind a reader/writer lock.
///
/// Reads run concurrently; [`TokenState::set`] swaps token and expiry in one exclusive write so
/// readers never observe a token paired with another token's expiry.
#[derive(Debug, Default)]
pub struct TokenState(RwLock<Option<SessionToken>>);
impl TokenState {
	/// Stores `token`, replacing any previous one. `None` or an empty string clears the state.
	pub fn set(&self, token: Option<&str>) {
		let next = token.filter(|value| !value.is_empty()).map(SessionToken::parse);

		match &next {
			Some(held) => tracing::info!(
				length = held.secret.len(),
				expires_at = ?held.expires_at,
				"Session token stored."
			),
			None => tracing::info!("Session token cleared."),
		}

		*self.0.write() = next;
	}

	/// Drops the held token.
	pub fn clear(&self) {
		self.set(None);
	}

	/// Returns the held token regardless of validity.
	pub fn get(&self) -> Option<Secret> {
		self.0.read().as_ref().map(|held| held.secret.clone())
	}

	/// Returns the held token only while it is still valid.
	pub fn valid_token(&self) -> Option<Secret> {
		self.valid_token_at(OffsetDateTime::now_utc())
	}

	/// Returns the held token only if it is valid at `instant`.
	pub fn valid_token_at(&self, instant: OffsetDateTime) -> Option<Secret> {
		self.0
			.read()
			.as_ref()
			.filter(|held| held.is_valid_at(instant))
			.map(|held| held.secret.clone())
	}

	/// Returns a copy of the held token together with its expiry.
	pub fn snapshot(&self) -> Option<SessionToken> {
		self.0.read().clone()
	}

	/// Expiry of the held token, if one is held and its expiry is known.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.0.read().as_ref().and_then(|held| held.expires_at)
	}

	/// Returns `true` if a token is held and has not expired.
	pub fn has_valid_token(&self) -> bool {
		self.has_valid_token_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if a token is held and is valid at `instant`.
	pub fn has_valid_token_at(&self, instant: OffsetDateTime) -> bool {
		self.0.read().as_ref().is_some_and(|held| held.is_valid_at(instant))
	}

	/// Returns `true` if no valid token is held or it expires within `threshold`.
	pub fn needs_refresh(&self, threshold: Duration) -> bool {
		self.needs_refresh_at(OffsetDateTime::now_utc(), threshold)
	}

	/// [`TokenState::needs_refresh`] evaluated at `instant`.
	///
	/// A valid token with unknown expiry never needs a refresh.
	pub fn needs_refresh_at(&self, instant: OffsetDateTime, threshold: Duration) -> bool {
		let guard = self.0.read();
		let Some(held) = guard.as_ref().filter(|held| held.is_valid_at(instant)) else {
			return true;
		};

		held.expires_at.is_some_and(|expiry| expiry < instant + threshold)
	}

	/// Whole seconds until expiry, clamped at zero; `-1` when no expiry is known.
	pub fn remaining_ttl_seconds(&self) -> i64 {
		self.remaining_ttl_seconds_at(OffsetDateTime::now_utc())
	}

	/// [`TokenState::remaining_ttl_seconds`] evaluated at `instant`.
	pub fn remaining_ttl_seconds_at(&self, instant: OffsetDateTime) -> i64 {
		match self.expires_at() {
			Some(expiry) => (expiry - instant).whole_seconds().max(0),
			None => -1,
		}
	}
}
