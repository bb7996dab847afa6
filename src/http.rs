//! Transport primitives for PwnDoc API exchanges.
//!
//! [`ApiTransport`] is the executor's only dependency on an HTTP stack. It performs exactly one
//! exchange per call and reports non-2xx statuses as ordinary [`ApiResponse`] values; only
//! failures to complete the exchange (DNS, connect, TLS, reading the body) surface as
//! [`TransportError`], which is the class the executor retries.

// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ApiTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing one API exchange.
///
/// Implementations must be `Send + Sync + 'static` so an executor can be shared across tasks
/// behind an `Arc`.
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and reads the full response body regardless of status.
	fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// HTTP verbs used by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `PATCH`.
	Patch,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Patch => "PATCH",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(value: Method) -> Self {
		match value {
			Method::Get => Self::GET,
			Method::Post => Self::POST,
			Method::Put => Self::PUT,
			Method::Patch => Self::PATCH,
			Method::Delete => Self::DELETE,
		}
	}
}

/// Fully resolved request handed to a transport.
#[derive(Clone)]
pub struct ApiRequest {
	/// HTTP verb.
	pub method: Method,
	/// Absolute URL (base URL joined with the endpoint path).
	pub url: Url,
	/// Header name/value pairs in send order.
	pub headers: Vec<(&'static str, String)>,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Connect + read timeout for this exchange.
	pub timeout: Duration,
	/// Skip certificate and hostname verification for this exchange only.
	pub accept_invalid_certs: bool,
}
impl ApiRequest {
	/// Returns the first value of header `name` (case-insensitive).
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let shown = if name.eq_ignore_ascii_case("authorization")
					|| name.eq_ignore_ascii_case("cookie")
				{
					"<redacted>"
				} else {
					value.as_str()
				};

				(*name, shown)
			})
			.collect::<Vec<_>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.field("timeout", &self.timeout)
			.field("accept_invalid_certs", &self.accept_invalid_certs)
			.finish()
	}
}

/// Response as observed by the transport, before classification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw `Set-Cookie` header values, in arrival order.
	pub set_cookies: Vec<String>,
	/// Full response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Builds a response with `status` and `body` and no cookies.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, set_cookies: Vec::new(), body: body.into() }
	}

	/// Appends a raw `Set-Cookie` value.
	pub fn with_set_cookie(mut self, cookie: impl Into<String>) -> Self {
		self.set_cookies.push(cookie.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Reqwest-backed [`ApiTransport`].
///
/// Two clients are kept: a strict one used by default and a permissive one that skips
/// certificate and hostname verification. A request reaches the permissive client only when it sets
/// [`ApiRequest::accept_invalid_certs`], which the executor derives from the explicit
/// `allow_insecure_tls` setting.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	strict: ReqwestClient,
	permissive: ReqwestClient,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds both clients with reqwest defaults.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let strict = ReqwestClient::builder().build()?;
		let permissive = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?;

		Ok(Self { strict, permissive })
	}

	/// Wraps caller-provided clients.
	pub fn with_clients(strict: ReqwestClient, permissive: ReqwestClient) -> Self {
		Self { strict, permissive }
	}

	fn client_for(&self, request: &ApiRequest) -> &ReqwestClient {
		if request.accept_invalid_certs { &self.permissive } else { &self.strict }
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.client_for(&request).clone();

		Box::pin(async move {
			let mut builder = client
				.request(request.method.into(), request.url.clone())
				.timeout(request.timeout);

			for (name, value) in &request.headers {
				builder = builder.header(*name, value);
			}
			if let Some(body) = request.body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let set_cookies = response
				.headers()
				.get_all(reqwest::header::SET_COOKIE)
				.iter()
				.filter_map(|value| value.to_str().ok())
				.map(str::to_owned)
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, set_cookies, body })
		})
	}
}
