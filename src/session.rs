//! Session manager: owns the credential pair, the identity derived from it, and every
//! transition between [`SessionPhase`]s.
//!
//! One [`SessionManager`] is built per client and shared behind an [`Arc`]. It is the only
//! writer of the persisted pair and of the in-memory session; everything else reads
//! [`SessionManager::snapshot`] or calls an operation.
//!
//! Flows live in submodules:
//! - `login` exchanges an email/password pair and picks a [`Destination`](crate::auth::Destination).
//! - `restore` rebuilds the session from the store at startup.
//! - `refresh` rotates the pair behind a singleflight guard; failures log out.
//! - `identity` merges the remote profile into the identity.
//! - `authorized` sends resource calls with a bearer header and one retry after a 401.
//! - `timer` (feature `timer`) drives the periodic refresh.

mod authorized;
mod identity;
mod login;
mod metrics;
mod refresh;
mod restore;
mod state;
#[cfg(feature = "timer")] mod timer;

pub use login::LoginOutcome;
pub use metrics::SessionMetrics;
pub use state::{LogoutReason, SessionPhase, SessionSnapshot};
#[cfg(feature = "timer")] pub use timer::RefreshTimer;

// self
use crate::{
	_prelude::*,
	api::BackendApi,
	auth::{AccessClaims, CredentialPair, Identity, RoleFlags, SubjectId, TokenSecret},
	config::SessionConfig,
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::state::{Session, SessionState},
	store::{ClientStore, StoreError},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Session manager specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestSessionManager = SessionManager<ReqwestTransport>;

/// Coordinates login, restore, refresh, logout, and authorized calls for one client.
pub struct SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for auth-service and resource calls.
	pub transport: Arc<T>,
	/// Durable store holding the persisted credential pair.
	pub store: Arc<dyn ClientStore>,
	/// Validated endpoint and timing configuration.
	pub config: SessionConfig,
	/// Shared counters for refreshes, retries, and forced logouts.
	pub metrics: Arc<SessionMetrics>,
	state: RwLock<SessionState>,
	refresh_guard: AsyncMutex<()>,
	commit_guard: AsyncMutex<()>,
}
impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates an unauthenticated manager; call [`SessionManager::restore`] to pick up a
	/// persisted pair.
	pub fn new(transport: Arc<T>, store: Arc<dyn ClientStore>, config: SessionConfig) -> Self {
		Self {
			transport,
			store,
			config,
			metrics: Default::default(),
			state: RwLock::new(SessionState::default()),
			refresh_guard: AsyncMutex::new(()),
			commit_guard: AsyncMutex::new(()),
		}
	}

	/// Replaces the metrics sink, e.g. to share counters across managers.
	pub fn with_metrics(mut self, metrics: Arc<SessionMetrics>) -> Self {
		self.metrics = metrics;

		self
	}

	/// Current state as seen by routers and views.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.state.read().snapshot()
	}

	/// Role flags of the current session, or both `false` when unauthenticated.
	pub fn role_flags(&self) -> RoleFlags {
		self.state.read().roles()
	}

	/// Current identity, if a session is authenticated.
	pub fn identity(&self) -> Option<Identity> {
		let state = self.state.read();

		state
			.session
			.as_ref()
			.filter(|_| state.phase.is_authenticated())
			.map(|session| session.identity.clone())
	}

	/// Clears the persisted pair and the in-memory session. Safe to call in any state.
	///
	/// The in-memory session is always dropped; a store failure is still reported.
	pub async fn logout(&self) -> Result<()> {
		const KIND: FlowKind = FlowKind::Logout;

		let span = FlowSpan::new(KIND, "logout");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.end_session(LogoutReason::UserInitiated, None)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result.map(|_| ())
	}

	fn api(&self) -> BackendApi<'_, T> {
		BackendApi::new(self.transport.as_ref(), &self.config)
	}

	/// Access token of the authenticated session, tagged with its generation and subject.
	fn bearer(&self) -> Option<(u64, SubjectId, TokenSecret)> {
		let state = self.state.read();

		state.session.as_ref().filter(|_| state.phase.is_authenticated()).map(|session| {
			(
				state.generation,
				session.identity.subject.clone(),
				session.credentials.access.clone(),
			)
		})
	}

	/// Refresh token of the current session in any phase, tagged like [`Self::bearer`].
	fn refresh_secret(&self) -> Option<(u64, SubjectId, TokenSecret)> {
		let state = self.state.read();

		state.session.as_ref().map(|session| {
			(
				state.generation,
				session.identity.subject.clone(),
				session.credentials.refresh.clone(),
			)
		})
	}

	fn generation(&self) -> u64 {
		self.state.read().generation
	}

	/// Persists (optionally) and installs `pair`.
	///
	/// With `expected` set, nothing is written unless that generation is still current.
	/// Profile fields already merged for the same subject carry over.
	async fn commit_session(
		&self,
		pair: CredentialPair,
		claims: &AccessClaims,
		phase: SessionPhase,
		persist: bool,
		expected: Option<u64>,
	) -> Result<u64> {
		let _commit = self.commit_guard.lock().await;

		if expected.is_some_and(|generation| generation != self.generation()) {
			return Err(Error::NotAuthenticated);
		}
		if persist {
			self.persist(&pair).await?;
		}

		let mut state = self.state.write();
		let identity = match &state.session {
			Some(previous) => previous.identity.rebase_on(claims),
			None => Identity::from_claims(claims),
		};

		Ok(state.install(Session { credentials: pair, identity }, phase))
	}

	async fn persist(&self, pair: &CredentialPair) -> Result<()> {
		let value = pair.to_json().map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize credential pair: {e}"),
		})?;

		self.store.set(&self.config.storage_key, value).await?;

		Ok(())
	}

	/// Drops the session and its persisted pair.
	///
	/// With `expected` set, does nothing (and returns `false`) once that generation is stale.
	async fn end_session(&self, reason: LogoutReason, expected: Option<u64>) -> Result<bool> {
		let _commit = self.commit_guard.lock().await;

		{
			let mut state = self.state.write();

			if expected.is_some_and(|generation| generation != state.generation) {
				return Ok(false);
			}

			state.clear(reason);
		}

		if reason.is_forced() {
			self.metrics.record_forced_logout();
			obs::record_forced_logout(reason);
		}

		self.store.remove(&self.config.storage_key).await?;

		Ok(true)
	}

	/// Forced logout; the triggering error matters more than a store failure here.
	async fn force_logout(&self, reason: LogoutReason, expected: Option<u64>) {
		if let Err(e) = self.end_session(reason, expected).await {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %e, "Failed to remove the persisted credential pair.");
			#[cfg(not(feature = "tracing"))]
			let _ = e;
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionManager<ReqwestTransport> {
	/// Builds a manager around a reqwest client that does not follow redirects.
	pub fn with_reqwest(store: Arc<dyn ClientStore>, config: SessionConfig) -> Result<Self> {
		Ok(Self::new(Arc::new(ReqwestTransport::without_redirects()?), store, config))
	}
}
impl<T> Debug for SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("config", &self.config)
			.field("snapshot", &self.snapshot())
			.finish_non_exhaustive()
	}
}
