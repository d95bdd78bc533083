//! Email/password login and post-login routing.

// self
use crate::{
	_prelude::*,
	api::PropertyCount,
	auth::{AccessClaims, Destination, EmailAddress, Identity},
	http::{ApiRequest, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{SessionManager, SessionPhase},
};

/// Result of a successful credential exchange.
#[derive(Clone, Debug, PartialEq)]
pub struct LoginOutcome {
	/// Identity after the profile merge; `None` if the profile step ended the session.
	pub identity: Option<Identity>,
	/// View the router should show next.
	pub destination: Destination,
}

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges `email`/`password` for a credential pair and starts a session.
	///
	/// The pair is decoded before anything is persisted. The profile lookup that follows is
	/// best-effort: under [`IdentityFailurePolicy::ForceLogout`] its failure ends the new
	/// session and the outcome points at [`Destination::Login`]. Landlords are routed through
	/// a property count to pick between the first-run and regular dashboard.
	///
	/// [`IdentityFailurePolicy::ForceLogout`]: crate::config::IdentityFailurePolicy::ForceLogout
	pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.login_inner(email, password)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn login_inner(&self, email: &str, password: &str) -> Result<LoginOutcome> {
		let email = EmailAddress::new(email.trim()).map_err(|e| Error::InvalidCredentials {
			reason: format!("email address is not usable ({e})"),
		})?;

		if password.is_empty() {
			return Err(Error::InvalidCredentials { reason: "password is empty".into() });
		}

		let pair = self.api().obtain_pair(&email, password).await?;
		let claims = AccessClaims::decode(pair.access.expose())?;

		claims.ensure_fresh_at(OffsetDateTime::now_utc())?;
		self.commit_session(pair, &claims, SessionPhase::Authenticated, true, None).await?;

		let identity = match self.fetch_identity_details().await {
			Ok(identity) => Some(identity),
			Err(_) => self.identity(),
		};
		let destination = match &identity {
			None => Destination::Login,
			Some(identity) if identity.roles.landlord =>
				Destination::after_login(identity.roles, self.has_properties().await),
			Some(identity) => Destination::after_login(identity.roles, None),
		};

		Ok(LoginOutcome { identity, destination })
	}

	/// `None` when the count could not be read.
	async fn has_properties(&self) -> Option<bool> {
		let request = ApiRequest::get(self.config.property_count_url().ok()?);
		let count = self.send_authorized(request).await.ok()?.json::<PropertyCount>().ok()?;

		Some(count.has_properties)
	}
}
