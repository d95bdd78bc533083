//! Profile lookups merged into the in-memory identity.

// self
use crate::{
	_prelude::*,
	auth::{Identity, SubjectId, TokenSecret, UserProfile},
	config::IdentityFailurePolicy,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{LogoutReason, SessionManager},
};

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fetches the remote profile through the authorization wrapper and merges it into the
	/// identity.
	///
	/// Returns [`Error::NotAuthenticated`] without side effects when there is no session,
	/// or when the session changed hands before the profile arrived (the profile is then
	/// discarded). Other failures are wrapped in [`Error::IdentityFetchFailed`] and, under
	/// [`IdentityFailurePolicy::ForceLogout`], end the session.
	pub async fn fetch_identity_details(&self) -> Result<Identity> {
		const KIND: FlowKind = FlowKind::IdentityFetch;

		let span = FlowSpan::new(KIND, "fetch_identity_details");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let subject = self.current_subject().ok_or(Error::NotAuthenticated)?;
				let fetched = self.request_profile().await;

				self.apply_profile(&subject, fetched).await
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Single-attempt lookup used right after a rotation.
	pub(super) async fn reload_profile(&self, access: &TokenSecret) -> Result<Identity> {
		let subject = self.current_subject().ok_or(Error::NotAuthenticated)?;
		let fetched = self.api().user_info(access).await;

		self.apply_profile(&subject, fetched).await
	}

	async fn request_profile(&self) -> Result<UserProfile> {
		let request = self.api().user_info_request()?;

		Ok(self.send_authorized(request).await?.json()?)
	}

	fn current_subject(&self) -> Option<SubjectId> {
		self.state.read().session.as_ref().map(|session| session.identity.subject.clone())
	}

	/// Generation of the live session if it still belongs to `subject`.
	fn generation_for(&self, subject: &SubjectId) -> Option<u64> {
		let state = self.state.read();

		state
			.session
			.as_ref()
			.filter(|session| &session.identity.subject == subject)
			.map(|_| state.generation)
	}

	async fn apply_profile(
		&self,
		subject: &SubjectId,
		fetched: Result<UserProfile>,
	) -> Result<Identity> {
		let profile = match fetched {
			Ok(profile) => profile,
			Err(e) => {
				if self.config.identity_failure == IdentityFailurePolicy::ForceLogout {
					if let Some(generation) = self.generation_for(subject) {
						self.force_logout(LogoutReason::IdentityFetchFailed, Some(generation)).await;
					}
				}

				return Err(e.into_identity_failure());
			},
		};
		let mut state = self.state.write();

		match state.session.as_mut() {
			Some(session) if &session.identity.subject == subject => {
				session.identity = session.identity.merge_profile(profile);

				Ok(session.identity.clone())
			},
			_ => Err(Error::NotAuthenticated),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{_preludet::*, auth::RoleFlags, http::Method, store::MemoryStore};

	#[tokio::test]
	async fn no_session_means_no_request_and_no_logout() {
		let transport = Arc::new(ScriptedTransport::default());
		let manager = SessionManager::new(
			transport.clone(),
			Arc::new(MemoryStore::default()),
			test_config(),
		);
		let err = manager
			.fetch_identity_details()
			.await
			.expect_err("Fetching without a session must fail.");

		assert!(matches!(err, Error::NotAuthenticated));
		assert!(transport.requests().is_empty());
		assert_eq!(manager.snapshot().last_logout, None);
	}

	#[tokio::test]
	async fn profile_fields_are_merged_into_identity() {
		let transport = Arc::new(ScriptedTransport::default());

		script_login(&transport, json!({ "user_id": 9, "email": "claims@example.com" }));

		let manager =
			SessionManager::new(transport.clone(), Arc::new(MemoryStore::default()), test_config());

		manager.login("owner@example.com", "pw").await.expect("Login should succeed.");
		transport.respond(
			Method::Get,
			"/auth/user-info/",
			200,
			json!({
				"email": "owner@example.com",
				"phone_number": "+15550199",
				"landlord": true,
				"tenant": false,
			}),
		);

		let identity =
			manager.fetch_identity_details().await.expect("Profile fetch should succeed.");

		assert_eq!(identity.email.as_deref(), Some("owner@example.com"));
		assert_eq!(identity.phone_number.as_deref(), Some("+15550199"));
		assert_eq!(manager.role_flags(), RoleFlags { landlord: true, tenant: false });
		assert_eq!(manager.identity(), Some(identity));
	}

	#[tokio::test]
	async fn failure_ends_session_under_default_policy() {
		let transport = Arc::new(ScriptedTransport::default());
		let store = MemoryStore::default();

		script_login(&transport, json!({ "user_id": 9, "landlord": true }));

		let manager =
			SessionManager::new(transport.clone(), Arc::new(store.clone()), test_config());

		manager.login("owner@example.com", "pw").await.expect("Login should succeed.");
		transport.fail(Method::Get, "/auth/user-info/");

		let err = manager.fetch_identity_details().await.expect_err("Lookup must fail.");

		assert!(matches!(err, Error::IdentityFetchFailed { .. }));
		assert_eq!(manager.snapshot().last_logout, Some(LogoutReason::IdentityFetchFailed));
		assert_eq!(manager.metrics.forced_logouts(), 1);
		assert!(store.entries().is_empty());
	}
}
