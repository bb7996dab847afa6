//! Cookie-based session continuity layered underneath bearer-token auth.
//!
//! The store keeps a single `Cookie` header value rebuilt from the most recent response that
//! set cookies. There is no per-domain partitioning and no expiry tracking: the last writer
//! wins, and a racing reader at worst sends a cookie that is one response stale.

// self
use crate::_prelude::*;

/// Last-write-wins holder for the session `Cookie` header.
#[derive(Default)]
pub struct SessionStore(RwLock<Option<String>>);
impl SessionStore {
	/// Replaces the stored cookie with the `name=value` pairs from `set_cookies`.
	///
	/// Attributes after the first `;` (path, expiry, flags) are dropped. An empty slice leaves
	/// the current cookie untouched. Returns `true` when the cookie was replaced.
	pub fn capture<S>(&self, set_cookies: &[S]) -> bool
	where
		S: AsRef<str>,
	{
		let Some(header) = combine(set_cookies) else {
			return false;
		};

		tracing::debug!(cookies = set_cookies.len(), "Captured session cookies.");

		*self.0.write() = Some(header);

		true
	}

	/// Returns the value to send as the `Cookie` request header, if any.
	pub fn header(&self) -> Option<String> {
		self.0.read().clone()
	}

	/// Forgets the captured session.
	pub fn clear(&self) {
		*self.0.write() = None;
	}
}
impl Debug for SessionStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SessionStore").field(&self.0.read().as_ref().map(|_| "<redacted>")).finish()
	}
}

fn combine<S>(set_cookies: &[S]) -> Option<String>
where
	S: AsRef<str>,
{
	let pairs = set_cookies
		.iter()
		.map(|raw| {
			let raw = raw.as_ref();

			raw.split_once(';').map_or(raw, |(pair, _attributes)| pair).trim()
		})
		.filter(|pair| !pair.is_empty())
		.collect::<Vec<_>>();

	if pairs.is_empty() { None } else { Some(pairs.join("; ")) }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn strips_attributes_and_joins_pairs() {
		let store = SessionStore::default();

		assert!(store.capture(&["sid=abc; Path=/; HttpOnly", "refreshToken=xyz; Secure"]));
		assert_eq!(store.header().as_deref(), Some("sid=abc; refreshToken=xyz"));
	}

	#[test]
	fn last_response_wins() {
		let store = SessionStore::default();

		store.capture(&["sid=abc; Path=/", "theme=dark"]);
		store.capture(&["sid=def"]);

		assert_eq!(store.header().as_deref(), Some("sid=def"));
	}

	#[test]
	fn response_without_cookies_keeps_session() {
		let store = SessionStore::default();

		store.capture(&["sid=abc"]);

		assert!(!store.capture::<&str>(&[]));
		assert!(!store.capture(&["  ; Path=/"]));
		assert_eq!(store.header().as_deref(), Some("sid=abc"));

		store.clear();

		assert_eq!(store.header(), None);
	}
}
