//! Refresh-token rotation with a singleflight guard and fail-closed logout.
//!
//! Every refresh (timer, restore, or a 401 seen by the authorization wrapper) goes through
//! [`SessionManager::refresh`] or its generation-aware twin. Callers record the session
//! generation they observed before queuing on the guard; if another caller rotated the pair
//! in the meantime the rotation is reused instead of spending the refresh token twice. A
//! caller acting for a specific user only reuses a rotation of that user's session. Any
//! failure of the exchange itself ends the session with [`LogoutReason::RefreshFailed`].

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, SubjectId, TokenSecret},
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{LogoutReason, SessionManager, SessionPhase},
};

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the refresh token for a new credential pair.
	///
	/// On success the pair is persisted, the identity is re-derived from the new claims,
	/// and the profile is reloaded once without an authorization retry. A failed exchange
	/// logs out and returns [`Error::RefreshFailed`]. Without a session this returns
	/// [`Error::NotAuthenticated`] and changes nothing.
	pub async fn refresh(&self) -> Result<()> {
		self.refresh_since(self.generation(), None).await
	}

	/// Refreshes unless the session has moved past `observed` already.
	///
	/// With `owner` set, a newer session belonging to another subject is not reused and
	/// [`Error::NotAuthenticated`] is returned instead.
	pub(super) async fn refresh_since(
		&self,
		observed: u64,
		owner: Option<&SubjectId>,
	) -> Result<()> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let (generation, subject, refresh) =
					self.refresh_secret().ok_or(Error::NotAuthenticated)?;

				if generation != observed && owner.is_some_and(|owner| owner != &subject) {
					return Err(Error::NotAuthenticated);
				}

				self.metrics.record_refresh_attempt();

				if generation != observed {
					self.metrics.record_refresh_success();

					return Ok(());
				}

				self.state.write().begin_refresh();

				let (installed, access) = match self.rotate(generation, &refresh).await {
					Ok(rotated) => rotated,
					Err(e) => {
						self.metrics.record_refresh_failure();
						self.force_logout(LogoutReason::RefreshFailed, Some(generation)).await;

						return Err(e.into_refresh_failure());
					},
				};

				self.metrics.record_refresh_success();

				match self.reload_profile(&access).await {
					Ok(_) => Ok(()),
					// Lookup failed but the policy kept the session.
					Err(_) if self.generation() == installed => Ok(()),
					Err(e) => Err(e),
				}
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn rotate(&self, generation: u64, refresh: &TokenSecret) -> Result<(u64, TokenSecret)> {
		let pair = self.api().refresh_pair(refresh).await?;
		let claims = AccessClaims::decode(pair.access.expose())?;

		claims.ensure_fresh_at(OffsetDateTime::now_utc())?;

		let access = pair.access.clone();
		let installed = self
			.commit_session(pair, &claims, SessionPhase::Authenticated, true, Some(generation))
			.await?;

		Ok((installed, access))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::CredentialPair,
		http::Method,
		store::{ClientStore, MemoryStore},
	};

	#[tokio::test]
	async fn concurrent_refreshes_share_one_exchange() {
		let transport = Arc::new(ScriptedTransport::default());

		script_login(&transport, json!({ "user_id": 4, "tenant": true }));
		script_refresh(&transport, json!({ "user_id": 4, "tenant": true }), Some("refresh-2"));

		let manager =
			SessionManager::new(transport.clone(), Arc::new(MemoryStore::default()), test_config());

		manager.login("tenant@example.com", "pw").await.expect("Login should succeed.");

		let (first, second) = tokio::join!(manager.refresh(), manager.refresh());

		first.expect("First refresh should succeed.");
		second.expect("Second refresh should reuse the rotation.");

		assert_eq!(transport.calls(Method::Post, "/auth/token/refresh/"), 1);
		assert_eq!(manager.metrics.refresh_attempts(), 2);
		assert_eq!(manager.metrics.refresh_successes(), 2);
	}

	#[tokio::test]
	async fn failed_exchange_logs_out_and_clears_store() {
		let transport = Arc::new(ScriptedTransport::default());
		let store = MemoryStore::default();

		script_login(&transport, json!({ "user_id": 4, "landlord": true }));
		transport.respond(
			Method::Post,
			"/auth/token/refresh/",
			401,
			json!({ "detail": "Token is blacklisted" }),
		);

		let manager =
			SessionManager::new(transport.clone(), Arc::new(store.clone()), test_config());

		manager.login("owner@example.com", "pw").await.expect("Login should succeed.");

		let err = manager.refresh().await.expect_err("Blacklisted refresh must fail.");
		let snapshot = manager.snapshot();

		assert!(matches!(err, Error::RefreshFailed { .. }));
		assert_eq!(snapshot.phase, SessionPhase::Unauthenticated);
		assert_eq!(snapshot.last_logout, Some(LogoutReason::RefreshFailed));
		assert!(store.entries().is_empty());
		assert_eq!(manager.metrics.refresh_failures(), 1);
	}

	#[tokio::test]
	async fn non_rotating_backend_keeps_refresh_token() {
		let transport = Arc::new(ScriptedTransport::default());
		let store = MemoryStore::default();

		script_login(&transport, json!({ "user_id": 4, "tenant": true }));
		script_refresh(&transport, json!({ "user_id": 4, "landlord": true }), None);

		let manager =
			SessionManager::new(transport.clone(), Arc::new(store.clone()), test_config());

		manager.login("tenant@example.com", "pw").await.expect("Login should succeed.");
		manager.refresh().await.expect("Refresh should succeed.");

		let persisted = store
			.get("authTokens")
			.await
			.expect("Store read should succeed.")
			.expect("Pair should still be persisted.");
		let pair = CredentialPair::from_json(&persisted).expect("Persisted pair should parse.");

		assert_eq!(pair.refresh.expose(), "refresh-1");
		assert!(manager.role_flags().landlord);
		assert_eq!(manager.snapshot().phase, SessionPhase::Authenticated);
	}

	#[tokio::test]
	async fn blank_rotated_refresh_token_keeps_the_previous_one() {
		let transport = Arc::new(ScriptedTransport::default());
		let store = MemoryStore::default();

		script_login(&transport, json!({ "user_id": 4, "tenant": true }));
		script_refresh(&transport, json!({ "user_id": 4, "tenant": true }), Some(""));

		let manager =
			SessionManager::new(transport.clone(), Arc::new(store.clone()), test_config());

		manager.login("tenant@example.com", "pw").await.expect("Login should succeed.");
		manager.refresh().await.expect("Refresh should succeed.");

		let persisted = store
			.get("authTokens")
			.await
			.expect("Store read should succeed.")
			.expect("Pair should still be persisted.");
		let pair = CredentialPair::from_json(&persisted).expect("Persisted pair should parse.");

		assert_eq!(pair.refresh.expose(), "refresh-1");
		assert!(pair.is_complete());
	}

	#[tokio::test]
	async fn refresh_without_session_changes_nothing() {
		let transport = Arc::new(ScriptedTransport::default());
		let manager = SessionManager::new(
			transport.clone(),
			Arc::new(MemoryStore::default()),
			test_config(),
		);

		assert!(matches!(manager.refresh().await, Err(Error::NotAuthenticated)));
		assert!(transport.requests().is_empty());
		assert_eq!(manager.snapshot().last_logout, None);
	}

	#[tokio::test]
	async fn stale_caller_never_reuses_another_users_session() {
		let transport = Arc::new(ScriptedTransport::default());

		script_login(&transport, json!({ "user_id": 4, "tenant": true }));

		let manager =
			SessionManager::new(transport.clone(), Arc::new(MemoryStore::default()), test_config());

		manager.login("tenant@example.com", "pw").await.expect("Login should succeed.");

		let (observed, tenant, _) = manager.bearer().expect("Tenant should hold a bearer.");

		manager.logout().await.expect("Logout should succeed.");
		script_login(&transport, json!({ "user_id": 9, "landlord": true }));
		manager.login("owner@example.com", "pw").await.expect("Second login should succeed.");

		let err = manager
			.refresh_since(observed, Some(&tenant))
			.await
			.expect_err("Another user's session must not be reused.");

		assert!(matches!(err, Error::NotAuthenticated));
		assert_eq!(transport.calls(Method::Post, "/auth/token/refresh/"), 0);
		assert!(manager.snapshot().is_authenticated);

		let (_, owner, _) = manager.bearer().expect("Owner should hold a bearer.");

		manager
			.refresh_since(observed, Some(&owner))
			.await
			.expect("The owner's own newer session should be reused.");

		assert_eq!(transport.calls(Method::Post, "/auth/token/refresh/"), 0);
	}
}
