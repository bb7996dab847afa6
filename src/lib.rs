//! Resilient PwnDoc API client: JWT session lifecycle, bounded concurrency, per-minute rate
//! budgets, and retry-with-backoff over a pluggable HTTP transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod exec;
pub mod http;
pub mod obs;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{client::PwnDocClient, config::ClientConfig, http::ReqwestTransport};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = PwnDocClient<ReqwestTransport>;

	/// Builds a config pointing at `base_url` with test credentials and no retries, so failures
	/// surface without backoff sleeps. TLS verification is off so self-signed mock servers work.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::new(base_url)
			.with_credentials("tester", "hunter2")
			.with_insecure_tls(true)
			.with_max_retries(0)
			.with_timeout_secs(5)
	}

	/// Constructs a [`PwnDocClient`] backed by the reqwest transport used across integration
	/// tests.
	pub fn build_reqwest_test_client(config: ClientConfig) -> ReqwestTestClient {
		PwnDocClient::new(config).expect("Failed to build reqwest-backed client for tests.")
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
