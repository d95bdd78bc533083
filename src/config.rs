//! Session configuration: remote endpoints, storage key, refresh cadence, and failure policy.
//!
//! Values are assembled through [`SessionConfigBuilder`] (or deserialized and then checked
//! with [`SessionConfig::validate`]) so the manager never sees an absolute endpoint path, an
//! insecure non-loopback base URL, or a zero refresh interval.

/// Builder API for assembling session configuration.
pub mod builder;

pub use builder::*;

// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{_prelude::*, error::ConfigError};

/// What to do with a session whose profile lookup failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityFailurePolicy {
	#[default]
	/// Treat the failure as session-invalidating and log out.
	ForceLogout,
	/// Keep the session on the claims already decoded from the access token.
	KeepSession,
}

/// Endpoint paths resolved against [`SessionConfig::base_url`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionEndpoints {
	/// Credential exchange (`email` + `password` → pair).
	pub token: String,
	/// Refresh exchange (`refresh` → pair).
	pub refresh: String,
	/// Profile lookup for the bearer.
	pub user_info: String,
	/// Landlord property count used for first-run routing.
	pub property_count: String,
}
impl Default for SessionEndpoints {
	fn default() -> Self {
		Self {
			token: "auth/api/token/".into(),
			refresh: "auth/token/refresh/".into(),
			user_info: "auth/user-info/".into(),
			property_count: "properties/count/".into(),
		}
	}
}

/// Validated configuration consumed by [`SessionManager`](crate::session::SessionManager).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
	/// Base URL of the backend; always ends with `/`.
	pub base_url: Url,
	/// Endpoint paths relative to `base_url`.
	#[serde(default)]
	pub endpoints: SessionEndpoints,
	/// Durable key holding the persisted credential pair.
	#[serde(default = "default_storage_key")]
	pub storage_key: String,
	/// Period of the proactive refresh timer.
	#[serde(default = "default_refresh_interval", with = "duration_secs")]
	pub refresh_interval: Duration,
	/// Reaction to profile lookup failures.
	#[serde(default)]
	pub identity_failure: IdentityFailurePolicy,
}
impl SessionConfig {
	/// Default persisted storage key.
	pub const DEFAULT_STORAGE_KEY: &'static str = "authTokens";
	/// Default proactive refresh period.
	pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::minutes(4);

	/// Creates a new builder for the provided backend base URL.
	pub fn builder(base_url: Url) -> SessionConfigBuilder {
		SessionConfigBuilder::new(base_url)
	}

	/// Parses a JSON document and validates it.
	pub fn from_json(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);
		let config: Self = serde_path_to_error::deserialize(&mut de).map_err(ConfigError::from)?;

		config.validate()
	}

	/// Checks invariants and normalizes the base URL, returning the validated config.
	pub fn validate(mut self) -> Result<Self> {
		self.base_url = normalize_base(self.base_url)?;

		validate_path("token", &self.endpoints.token)?;
		validate_path("refresh", &self.endpoints.refresh)?;
		validate_path("user_info", &self.endpoints.user_info)?;
		validate_path("property_count", &self.endpoints.property_count)?;

		if self.storage_key.trim().is_empty() {
			return Err(ConfigError::EmptyStorageKey.into());
		}
		if !self.refresh_interval.is_positive() {
			return Err(ConfigError::NonPositiveRefreshInterval.into());
		}

		Ok(self)
	}

	/// Resolves a relative path against the base URL.
	pub fn resolve(&self, path: &str) -> Result<Url> {
		validate_path("resource", path)?;

		self.base_url.join(path).map_err(|source| ConfigError::InvalidBaseUrl { source }.into())
	}

	/// Absolute token endpoint.
	pub fn token_url(&self) -> Result<Url> {
		self.resolve(&self.endpoints.token)
	}

	/// Absolute refresh endpoint.
	pub fn refresh_url(&self) -> Result<Url> {
		self.resolve(&self.endpoints.refresh)
	}

	/// Absolute user-info endpoint.
	pub fn user_info_url(&self) -> Result<Url> {
		self.resolve(&self.endpoints.user_info)
	}

	/// Absolute property-count endpoint.
	pub fn property_count_url(&self) -> Result<Url> {
		self.resolve(&self.endpoints.property_count)
	}
}

fn default_storage_key() -> String {
	SessionConfig::DEFAULT_STORAGE_KEY.into()
}

fn default_refresh_interval() -> Duration {
	SessionConfig::DEFAULT_REFRESH_INTERVAL
}

fn normalize_base(mut url: Url) -> Result<Url, ConfigError> {
	if url.cannot_be_a_base() {
		return Err(ConfigError::CannotBeABase { url: url.to_string() });
	}

	match url.scheme() {
		"https" => {},
		"http" if is_loopback(&url) => {},
		_ => return Err(ConfigError::InsecureBaseUrl { url: url.to_string() }),
	}

	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	Ok(url)
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}

fn validate_path(endpoint: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.is_empty() || path.starts_with('/') || Url::parse(path).is_ok() {
		Err(ConfigError::InvalidEndpointPath { endpoint, path: path.to_owned() })
	} else {
		Ok(())
	}
}

mod duration_secs {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(value.whole_seconds())
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::seconds)
	}
}
