//! Observability helpers for client operations.
//!
//! - Every public async operation runs inside a `pwndoc_client.op` span carrying the `op`
//!   (operation) and `stage` (call site) fields.
//! - Enable the `metrics` feature to increment the `pwndoc_client_op_total` counter, labeled by
//!   `op`, `outcome`, and `class`. Failures carry their error class; every other outcome is
//!   labeled `class="none"`. Transport retries inside the executor count as `outcome="retry"`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Credential login (token issuance).
	Login,
	/// Token refresh.
	Refresh,
	/// Generic API request through the executor.
	Request,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::Login => "login",
			OpKind::Refresh => "refresh",
			OpKind::Request => "request",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Error class of a failed operation, one per [`Error`] family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureClass {
	/// Local configuration rejected before any network call.
	Config,
	/// Credentials rejected, token missing, or one-time password demanded.
	Authentication,
	/// Server answered with a non-2xx status.
	HttpStatus,
	/// Transport failed on every permitted attempt.
	Transport,
	/// No request slot freed up in time.
	Timeout,
	/// Response body could not be decoded.
	Serialization,
}
impl FailureClass {
	/// Classifies an error.
	pub fn of(err: &Error) -> Self {
		match err {
			Error::Config(_) => Self::Config,
			Error::OtpRequired | Error::AuthenticationRequired { .. } => Self::Authentication,
			Error::HttpStatus { .. } => Self::HttpStatus,
			Error::Transport { .. } => Self::Transport,
			Error::Timeout { .. } => Self::Timeout,
			Error::Serialization { .. } => Self::Serialization,
		}
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureClass::Config => "config",
			FailureClass::Authentication => "authentication",
			FailureClass::HttpStatus => "http_status",
			FailureClass::Transport => "transport",
			FailureClass::Timeout => "timeout",
			FailureClass::Serialization => "serialization",
		}
	}
}
impl Display for FailureClass {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Transport failure that will be retried after a backoff delay.
	Retry,
	/// Failure returned to the caller.
	Failure(FailureClass),
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Retry => "retry",
			OpOutcome::Failure(_) => "failure",
		}
	}

	/// Error class of a failure; `None` for every other outcome.
	pub const fn class(self) -> Option<FailureClass> {
		match self {
			OpOutcome::Failure(class) => Some(class),
			_ => None,
		}
	}

	/// Label for the `class` metric dimension.
	pub const fn class_label(self) -> &'static str {
		match self.class() {
			Some(class) => class.as_str(),
			None => "none",
		}
	}

	/// Maps a finished result to its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Self::Success,
			Err(err) => Self::Failure(FailureClass::of(err)),
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.class() {
			Some(class) => write!(f, "{}:{class}", self.as_str()),
			None => f.write_str(self.as_str()),
		}
	}
}
