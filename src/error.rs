//! Client-level error types shared across the executor, authenticator, and facade.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error returned by every public operation.
///
/// Nothing crosses the executor or authenticator boundary as a panic; transport failures are
/// caught and reclassified into one of these variants.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem detected before any network call.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Server demands a one-time password; re-run the login with one.
	#[error("Server requires a one-time password to complete authentication.")]
	OtpRequired,
	/// Credentials were rejected or no usable token was issued.
	#[error("Authentication required: {reason}.")]
	AuthenticationRequired {
		/// Server- or client-supplied reason string.
		reason: String,
	},
	/// Server answered with a non-2xx status.
	#[error("HTTP {status}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Server message extracted from the response body, when available.
		message: Option<String>,
	},
	/// Transport failed on every permitted attempt.
	#[error("Request failed after {attempts} attempt(s).")]
	Transport {
		/// Number of attempts made, including the first one.
		attempts: u32,
		/// Failure observed on the last attempt.
		#[source]
		source: TransportError,
	},
	/// No concurrency permit became available in time; no network call was made.
	#[error("Timed out after {waited:?} waiting for a free request slot.")]
	Timeout {
		/// How long the caller waited.
		waited: Duration,
	},
	/// A 2xx response carried a body that is not valid JSON for the expected shape.
	#[error("Server returned malformed JSON.")]
	Serialization {
		/// HTTP status code of the response, when the failure happened at the transport edge.
		status: Option<u16>,
		/// Parsing failure.
		#[source]
		source: DecodeError,
	},
}
impl Error {
	/// Returns `true` for the authentication-required class, including the OTP challenge.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::OtpRequired | Self::AuthenticationRequired { .. })
	}

	/// Returns `true` if the executor would retry this failure.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport { .. })
	}

	/// Returns the HTTP status code attached to the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus { status, .. } => Some(*status),
			Self::Serialization { status, .. } => *status,
			_ => None,
		}
	}
}

/// Reasons a response body could not be decoded.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body parsed but did not match the expected shape.
	#[error("Unexpected JSON shape at `{}`.", .0.path())]
	Shape(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Body is not a single well-formed JSON document.
	#[error("Body is not valid JSON.")]
	Syntax(#[from] serde_json::Error),
}

/// Configuration and validation failures raised before any request is sent.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL is empty.
	#[error("Base URL is required.")]
	MissingBaseUrl,
	/// Base URL (or base URL + path) does not parse.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Username is empty.
	#[error("Username is required.")]
	MissingUsername,
	/// Password is empty.
	#[error("Password is required.")]
	MissingPassword,
	/// Backoff strategy name is not one of fixed, linear, or exponential.
	#[error("Unknown backoff strategy `{name}`.")]
	UnknownBackoffStrategy {
		/// Rejected strategy name.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (DNS, TCP, TLS, IO); the only retried class.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the server.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
