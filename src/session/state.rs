//! Session phases, the in-memory session record, and the read-only snapshot handed to views.

// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, Identity, RoleFlags},
};

/// Lifecycle phase of the session manager.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
	/// No usable credential pair.
	#[default]
	Unauthenticated,
	/// Persisted pair is being decoded (and refreshed if expired) at startup.
	Restoring,
	/// Credential pair decoded and not known to be rejected.
	Authenticated,
	/// Refresh exchange in flight; the previous pair is still served.
	Refreshing,
}
impl SessionPhase {
	/// Returns a stable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionPhase::Unauthenticated => "unauthenticated",
			SessionPhase::Restoring => "restoring",
			SessionPhase::Authenticated => "authenticated",
			SessionPhase::Refreshing => "refreshing",
		}
	}

	/// Returns `true` for phases in which resource calls carry credentials.
	pub const fn is_authenticated(self) -> bool {
		matches!(self, SessionPhase::Authenticated | SessionPhase::Refreshing)
	}
}
impl Display for SessionPhase {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why the last session ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
	/// [`SessionManager::logout`](crate::session::SessionManager::logout) was called.
	UserInitiated,
	/// The refresh exchange failed.
	RefreshFailed,
	/// The profile lookup failed under [`IdentityFailurePolicy::ForceLogout`](crate::config::IdentityFailurePolicy::ForceLogout).
	IdentityFetchFailed,
	/// The persisted pair could not be decoded at startup.
	RestoreFailed,
}
impl LogoutReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LogoutReason::UserInitiated => "user_initiated",
			LogoutReason::RefreshFailed => "refresh_failed",
			LogoutReason::IdentityFetchFailed => "identity_fetch_failed",
			LogoutReason::RestoreFailed => "restore_failed",
		}
	}

	/// Returns `true` unless the user asked to log out.
	pub const fn is_forced(self) -> bool {
		!matches!(self, LogoutReason::UserInitiated)
	}
}
impl Display for LogoutReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Point-in-time view of the session for routers and views.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
	/// Current phase.
	pub phase: SessionPhase,
	/// Whether resource calls currently carry credentials.
	pub is_authenticated: bool,
	/// Landlord flag; `false` when unauthenticated.
	pub landlord: bool,
	/// Tenant flag; `false` when unauthenticated.
	pub tenant: bool,
	/// `true` only while startup restoration runs.
	pub loading: bool,
	/// Reason the previous session ended, cleared by the next login or restore.
	pub last_logout: Option<LogoutReason>,
}
impl SessionSnapshot {
	/// Role flags carried by the snapshot.
	pub fn roles(&self) -> RoleFlags {
		RoleFlags { landlord: self.landlord, tenant: self.tenant }
	}
}

#[derive(Clone, Debug)]
pub(crate) struct Session {
	pub(crate) credentials: CredentialPair,
	pub(crate) identity: Identity,
}

#[derive(Debug, Default)]
pub(crate) struct SessionState {
	pub(crate) phase: SessionPhase,
	pub(crate) session: Option<Session>,
	pub(crate) last_logout: Option<LogoutReason>,
	pub(crate) loading: bool,
	/// Bumped whenever a credential pair is installed or cleared.
	pub(crate) generation: u64,
}
impl SessionState {
	pub(crate) fn roles(&self) -> RoleFlags {
		match &self.session {
			Some(session) if self.phase.is_authenticated() => session.identity.roles,
			_ => RoleFlags::NONE,
		}
	}

	pub(crate) fn snapshot(&self) -> SessionSnapshot {
		let roles = self.roles();

		SessionSnapshot {
			phase: self.phase,
			is_authenticated: self.phase.is_authenticated(),
			landlord: roles.landlord,
			tenant: roles.tenant,
			loading: self.loading,
			last_logout: self.last_logout,
		}
	}

	pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
		if self.phase != phase {
			crate::obs::trace_transition(self.phase.as_str(), phase.as_str());

			self.phase = phase;
		}
	}

	pub(crate) fn install(&mut self, session: Session, phase: SessionPhase) -> u64 {
		self.session = Some(session);
		self.last_logout = None;
		self.generation += 1;
		self.set_phase(phase);

		self.generation
	}

	/// Drops the session; returns `false` if there was nothing to drop.
	pub(crate) fn clear(&mut self, reason: LogoutReason) -> bool {
		let had_session = self.session.take().is_some();

		self.generation += 1;
		self.last_logout = Some(reason);
		self.set_phase(SessionPhase::Unauthenticated);

		had_session
	}

	/// Marks an authenticated session as refreshing; restoration keeps its own phase.
	pub(crate) fn begin_refresh(&mut self) {
		if self.phase == SessionPhase::Authenticated {
			self.set_phase(SessionPhase::Refreshing);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn snapshot_hides_roles_outside_authenticated_phases() {
		let state = SessionState {
			phase: SessionPhase::Restoring,
			loading: true,
			..Default::default()
		};
		let snapshot = state.snapshot();

		assert!(!snapshot.is_authenticated);
		assert!(snapshot.loading);
		assert_eq!(snapshot.roles(), RoleFlags::NONE);
	}

	#[test]
	fn clear_records_reason_and_bumps_generation() {
		let mut state = SessionState::default();

		assert!(!state.clear(LogoutReason::RestoreFailed));
		assert_eq!(state.last_logout, Some(LogoutReason::RestoreFailed));
		assert_eq!(state.generation, 1);

		state.begin_refresh();

		assert_eq!(state.phase, SessionPhase::Unauthenticated);
	}

	#[test]
	fn labels_are_snake_case() {
		assert_eq!(
			serde_json::to_string(&LogoutReason::IdentityFetchFailed)
				.expect("Logout reason should serialize."),
			"\"identity_fetch_failed\""
		);
		assert_eq!(SessionPhase::Refreshing.to_string(), "refreshing");
		assert!(SessionPhase::Refreshing.is_authenticated());
	}
}
