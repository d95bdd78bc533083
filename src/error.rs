//! Session-level error types shared across the manager, transports, and stores.

// self
use crate::_prelude::*;

/// Session-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Remote API answered with a failure status or an unreadable body.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Access token could not be decoded.
	#[error("Access token is invalid.")]
	TokenInvalid(
		#[from]
		#[source]
		crate::auth::ClaimsError,
	),

	/// Auth service rejected the login request.
	#[error("Login rejected: {reason}.")]
	InvalidCredentials {
		/// Server- or client-supplied reason string.
		reason: String,
	},
	/// Access token expired.
	#[error("Access token expired at {expired_at}.")]
	TokenExpired {
		/// Expiry instant carried by the token.
		expired_at: OffsetDateTime,
	},
	/// Refresh failed; the session has been logged out.
	#[error("Session refresh failed.")]
	RefreshFailed {
		/// Failure that aborted the refresh.
		#[source]
		source: Box<Error>,
	},
	/// Profile lookup failed.
	#[error("Identity details could not be fetched.")]
	IdentityFetchFailed {
		/// Failure that aborted the lookup.
		#[source]
		source: Box<Error>,
	},
	/// Operation requires an authenticated session.
	#[error("No authenticated session.")]
	NotAuthenticated,
}
impl Error {
	/// Wraps `self` as the cause of a failed refresh.
	pub fn into_refresh_failure(self) -> Self {
		match self {
			Self::RefreshFailed { .. } => self,
			other => Self::RefreshFailed { source: Box::new(other) },
		}
	}

	/// Wraps `self` as the cause of a failed identity fetch.
	pub fn into_identity_failure(self) -> Self {
		match self {
			Self::IdentityFetchFailed { .. } => self,
			other => Self::IdentityFetchFailed { source: Box::new(other) },
		}
	}

	/// Returns `true` if the remote API answered with HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Api(ApiError::Status { status: 401, .. }))
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed or cannot carry relative paths.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL cannot act as a base for endpoint paths.
	#[error("Base URL `{url}` cannot be used as a base for endpoint paths.")]
	CannotBeABase {
		/// Offending URL.
		url: String,
	},
	/// Plain HTTP is only allowed for loopback hosts.
	#[error("Base URL `{url}` must use https unless it targets a loopback host.")]
	InsecureBaseUrl {
		/// Offending URL.
		url: String,
	},
	/// Endpoint path is absolute or otherwise unusable.
	#[error("The {endpoint} endpoint path `{path}` must be relative.")]
	InvalidEndpointPath {
		/// Endpoint label.
		endpoint: &'static str,
		/// Offending path.
		path: String,
	},
	/// Storage key is empty.
	#[error("Storage key cannot be empty.")]
	EmptyStorageKey,
	/// Refresh interval is zero or negative.
	#[error("Refresh interval must be positive.")]
	NonPositiveRefreshInterval,
	/// Configuration document could not be parsed.
	#[error("Configuration document is invalid.")]
	Document(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
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

/// Failures reported by the remote API itself.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Remote API answered with a non-success status.
	#[error("Remote API returned HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Server-supplied `detail`/`error` message, or a status summary.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Remote API answered with JSON that did not match the expected shape.
	#[error("Remote API returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint reply left the access or refresh token empty or missing.
	#[error("Token endpoint response did not include a usable credential pair.")]
	IncompletePair,
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
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
