// self
use crate::{
	_prelude::*,
	config::{IdentityFailurePolicy, SessionConfig, SessionEndpoints},
};

/// Builder for [`SessionConfig`] values.
#[derive(Debug)]
pub struct SessionConfigBuilder {
	/// Backend base URL.
	pub base_url: Url,
	/// Endpoint paths relative to the base URL.
	pub endpoints: SessionEndpoints,
	/// Durable key for the persisted credential pair.
	pub storage_key: String,
	/// Proactive refresh period.
	pub refresh_interval: Duration,
	/// Reaction to profile lookup failures.
	pub identity_failure: IdentityFailurePolicy,
}
impl SessionConfigBuilder {
	/// Creates a new builder seeded with the provided base URL and default endpoints.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			endpoints: SessionEndpoints::default(),
			storage_key: SessionConfig::DEFAULT_STORAGE_KEY.into(),
			refresh_interval: SessionConfig::DEFAULT_REFRESH_INTERVAL,
			identity_failure: IdentityFailurePolicy::default(),
		}
	}

	/// Overrides the credential exchange path.
	pub fn token_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.token = path.into();

		self
	}

	/// Overrides the refresh exchange path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.refresh = path.into();

		self
	}

	/// Overrides the profile lookup path.
	pub fn user_info_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.user_info = path.into();

		self
	}

	/// Overrides the property count path.
	pub fn property_count_path(mut self, path: impl Into<String>) -> Self {
		self.endpoints.property_count = path.into();

		self
	}

	/// Overrides the durable storage key.
	pub fn storage_key(mut self, key: impl Into<String>) -> Self {
		self.storage_key = key.into();

		self
	}

	/// Overrides the proactive refresh period (defaults to 4 minutes).
	pub fn refresh_interval(mut self, interval: Duration) -> Self {
		self.refresh_interval = interval;

		self
	}

	/// Overrides the identity failure policy.
	pub fn identity_failure(mut self, policy: IdentityFailurePolicy) -> Self {
		self.identity_failure = policy;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig> {
		SessionConfig {
			base_url: self.base_url,
			endpoints: self.endpoints,
			storage_key: self.storage_key,
			refresh_interval: self.refresh_interval,
			identity_failure: self.identity_failure,
		}
		.validate()
	}
}
