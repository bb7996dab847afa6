//! PwnDoc wire conventions shared by the executor and authenticator.
//!
//! Every response is a JSON object whose `datas` field holds either the payload or an error
//! string. Authentication responses may instead carry `status: "totprequired"`.

// self
use crate::_prelude::*;

/// Token issuance endpoint.
pub const TOKEN_PATH: &str = "/api/users/token";
/// Token refresh endpoint.
pub const REFRESH_TOKEN_PATH: &str = "/api/users/refreshtoken";
/// Envelope `status` value signalling a one-time-password challenge.
pub const OTP_REQUIRED_STATUS: &str = "totprequired";

const BODY_PREVIEW_CHARS: usize = 100;

/// Login request body.
#[derive(Clone)]
pub struct LoginRequest<'a> {
	/// Account name.
	pub username: &'a str,
	/// Account password.
	pub password: &'a str,
	/// One-time password, when the caller has one.
	pub totp_token: Option<&'a str>,
}
impl LoginRequest<'_> {
	/// Renders the JSON body; `totpToken` is omitted when no OTP is supplied.
	pub fn to_json(&self) -> Value {
		let mut body = serde_json::json!({ "username": self.username, "password": self.password });

		if let Some(otp) = self.totp_token {
			body["totpToken"] = Value::from(otp);
		}

		body
	}
}
impl Debug for LoginRequest<'_> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.field("totp_token", &self.totp_token.map(|_| "<redacted>"))
			.finish()
	}
}

/// Shape of a token issuance or refresh response.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenEnvelope {
	/// Envelope status, e.g. `success` or `totprequired`.
	#[serde(default)]
	pub status: Option<String>,
	/// Payload; an object with `token` on success.
	#[serde(default)]
	pub datas: Option<Value>,
}
impl TokenEnvelope {
	/// Decodes `value`, reporting the failing path on mismatch.
	pub fn decode(value: Value) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		serde_path_to_error::deserialize(value)
	}

	/// The issued token, if the payload carries one.
	pub fn token(&self) -> Option<&str> {
		self.datas.as_ref()?.get("token")?.as_str()
	}

	/// Returns `true` when the server is asking for a one-time password.
	pub fn otp_required(&self) -> bool {
		self.status.as_deref() == Some(OTP_REQUIRED_STATUS)
	}
}

/// Returns the `datas` payload of an envelope.
pub fn datas(envelope: &Value) -> Option<&Value> {
	envelope.get("datas")
}

/// Extracts a human-readable server message from an error body.
///
/// Prefers a primitive `datas` field (string, number, or boolean); falls back to the first
/// characters of a non-JSON body.
pub fn error_message(body: &[u8]) -> Option<String> {
	match serde_json::from_slice::<Value>(body) {
		Ok(json) => match datas(&json)? {
			Value::String(message) => Some(message.clone()),
			primitive @ (Value::Number(_) | Value::Bool(_)) => Some(primitive.to_string()),
			_ => None,
		},
		Err(_) => {
			let text = String::from_utf8_lossy(body);
			let text = text.trim();

			(!text.is_empty()).then(|| text.chars().take(BODY_PREVIEW_CHARS).collect())
		},
	}
}
