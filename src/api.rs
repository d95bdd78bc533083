//! Typed calls against the remote auth service and the property endpoints the session
//! layer depends on.
//!
//! [`BackendApi`] borrows the manager's transport and configuration; it never touches
//! session state. Status classification lives here so every caller sees the same mapping:
//! token-endpoint 4xx becomes [`Error::InvalidCredentials`], everything else non-2xx becomes
//! [`Error::Api`].

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, EmailAddress, IssuedTokens, TokenSecret, UserProfile},
	config::SessionConfig,
	error::ApiError,
	http::{ApiRequest, HttpTransport},
};

/// Property summary (`GET properties/count/`) used to pick the landlord's first-run view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCount {
	/// Whether the landlord owns at least one property.
	pub has_properties: bool,
	/// Number of properties owned.
	#[serde(default)]
	pub property_count: u64,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
	email: &'a str,
	password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
	refresh: &'a str,
}

/// Borrowed view of the transport and endpoints used by session flows.
pub struct BackendApi<'a, T>
where
	T: ?Sized + HttpTransport,
{
	transport: &'a T,
	config: &'a SessionConfig,
}
impl<'a, T> BackendApi<'a, T>
where
	T: ?Sized + HttpTransport,
{
	/// Binds a transport to a validated configuration.
	pub fn new(transport: &'a T, config: &'a SessionConfig) -> Self {
		Self { transport, config }
	}

	/// Exchanges an email/password pair for a credential pair.
	pub async fn obtain_pair(&self, email: &EmailAddress, password: &str) -> Result<CredentialPair> {
		let request = ApiRequest::post(self.config.token_url()?)
			.json(&PasswordGrant { email: email.as_ref(), password })?;
		let response = self.transport.execute(request).await?;

		if (400..500).contains(&response.status()) {
			return Err(Error::InvalidCredentials { reason: response.error_message() });
		}

		let issued = response.into_success()?.json::<IssuedTokens>()?;

		Ok(issued.into_pair(None).ok_or(ApiError::IncompletePair)?)
	}

	/// Exchanges `refresh` for a new pair. Non-rotating responses keep `refresh`.
	pub async fn refresh_pair(&self, refresh: &TokenSecret) -> Result<CredentialPair> {
		let request = ApiRequest::post(self.config.refresh_url()?)
			.json(&RefreshGrant { refresh: refresh.expose() })?;
		let issued = self.transport.execute(request).await?.into_success()?.json::<IssuedTokens>()?;

		Ok(issued.into_pair(Some(refresh)).ok_or(ApiError::IncompletePair)?)
	}

	/// Builds the profile lookup request without credentials attached.
	pub fn user_info_request(&self) -> Result<ApiRequest> {
		Ok(ApiRequest::get(self.config.user_info_url()?))
	}

	/// Fetches the profile for `access` in a single attempt.
	pub async fn user_info(&self, access: &TokenSecret) -> Result<UserProfile> {
		let request = self.user_info_request()?.with_bearer(access);

		Ok(self.transport.execute(request).await?.into_success()?.json()?)
	}
}
impl<T> Debug for BackendApi<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BackendApi").field("base_url", &self.config.base_url.as_str()).finish()
	}
}
