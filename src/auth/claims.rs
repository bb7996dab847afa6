//! Minimal JWT claim inspection used to derive a token's expiry.
//!
//! Only the `exp` claim is read. Signatures are not verified; the server remains the authority
//! on validity and this expiry merely drives local refresh scheduling.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Extracts the `exp` claim (epoch seconds) from a compact three-segment JWT.
///
/// Returns `None` for anything that is not a well-formed token carrying a numeric `exp`;
/// callers treat that as "expiry unknown".
pub fn expiry_of(token: &str) -> Option<OffsetDateTime> {
	let mut segments = token.split('.');
	let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);

	if segments.next().is_some() {
		return None;
	}

	// Some issuers pad the segment even though compact JWTs should not.
	let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
	let claims = serde_json::from_slice::<Value>(&bytes).ok()?;
	let exp = claims.get("exp")?;
	let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|secs| secs.trunc() as i64))?;

	OffsetDateTime::from_unix_timestamp(seconds).ok()
}

/// Builds an unsigned compact token whose payload is `claims`; handy for tests and fixtures.
pub fn unsigned_token(claims: &Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.sig")
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	#[test]
	fn reads_numeric_exp_claim() {
		let token = unsigned_token(&json!({ "sub": "alice", "exp": 1_735_689_600 }));

		assert_eq!(expiry_of(&token), Some(macros::datetime!(2025-01-01 00:00 UTC)));
	}

	#[test]
	fn accepts_fractional_exp_and_padded_payload() {
		let token = unsigned_token(&json!({ "exp": 1_735_689_600.75 }));
		let mut parts = token.split('.').map(str::to_owned).collect::<Vec<_>>();

		parts[1].push_str("==");

		assert_eq!(expiry_of(&parts.join(".")), Some(macros::datetime!(2025-01-01 00:00 UTC)));
	}

	#[test]
	fn malformed_tokens_have_no_expiry() {
		assert_eq!(expiry_of("not-a-jwt"), None);
		assert_eq!(expiry_of("a.b"), None);
		assert_eq!(expiry_of("a.b.c.d"), None);
		assert_eq!(expiry_of("a.!!!.c"), None);
		assert_eq!(expiry_of(&unsigned_token(&json!({ "sub": "no-exp" }))), None);
		assert_eq!(expiry_of(&unsigned_token(&json!({ "exp": "soon" }))), None);
	}
}
