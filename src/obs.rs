//! Optional observability helpers for session flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `rentdesk_session.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus `debug!` state transitions and `warn!`
//!   forced logouts.
//! - Enable `metrics` to increment the `rentdesk_session_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and
//!   `rentdesk_session_forced_logout_total` labeled by `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Session operations observed by the manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Email/password login.
	Login,
	/// Startup restoration from the persisted pair.
	Restore,
	/// Refresh-token exchange.
	Refresh,
	/// Extended profile lookup.
	IdentityFetch,
	/// Explicit or forced logout.
	Logout,
	/// Resource call through the authorization wrapper.
	AuthorizedCall,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Login => "login",
			FlowKind::Restore => "restore",
			FlowKind::Refresh => "refresh",
			FlowKind::IdentityFetch => "identity_fetch",
			FlowKind::Logout => "logout",
			FlowKind::AuthorizedCall => "authorized_call",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a session operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto [`FlowOutcome::Success`] or [`FlowOutcome::Failure`].
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
