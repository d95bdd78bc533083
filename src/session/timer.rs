//! Periodic refresh driven by the tokio runtime.

// std
use std::sync::Weak;
// crates.io
use tokio::{
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{_prelude::*, config::SessionConfig, http::HttpTransport, session::SessionManager};

/// Handle to the periodic refresh task; dropping it stops the task.
#[derive(Debug)]
pub struct RefreshTimer {
	handle: JoinHandle<()>,
}
impl RefreshTimer {
	/// Stops the task.
	pub fn cancel(self) {
		self.handle.abort();
	}

	/// Returns `true` once the task has stopped, e.g. because the manager was dropped.
	pub fn is_finished(&self) -> bool {
		self.handle.is_finished()
	}
}
impl Drop for RefreshTimer {
	fn drop(&mut self) {
		self.handle.abort();
	}
}

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts refreshing every [`SessionConfig::refresh_interval`](crate::config::SessionConfig::refresh_interval).
	///
	/// The first tick fires one interval from now. Ticks are skipped while the session is
	/// not authenticated, and refresh errors are left to the manager's forced-logout
	/// handling. The task holds a weak reference, so it ends on its own once the manager is
	/// dropped. A non-positive interval (possible after editing the public config) falls back
	/// to [`SessionConfig::DEFAULT_REFRESH_INTERVAL`].
	///
	/// # Panics
	///
	/// Panics when called outside a Tokio runtime.
	pub fn spawn_refresh_timer(self: &Arc<Self>) -> RefreshTimer {
		let period = Self::timer_period(self.config.refresh_interval);
		let manager = Arc::downgrade(self);
		let handle = tokio::spawn(Self::run_refresh_timer(manager, period));

		RefreshTimer { handle }
	}

	fn timer_period(interval: Duration) -> std::time::Duration {
		if interval.is_positive() {
			return interval.unsigned_abs();
		}

		#[cfg(feature = "tracing")]
		tracing::warn!(%interval, "Refresh interval is not positive; using the default.");

		SessionConfig::DEFAULT_REFRESH_INTERVAL.unsigned_abs()
	}

	async fn run_refresh_timer(manager: Weak<Self>, period: std::time::Duration) {
		let mut interval = time::interval_at(Instant::now() + period, period);

		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

		loop {
			interval.tick().await;

			let Some(manager) = manager.upgrade() else {
				break;
			};

			if !manager.snapshot().is_authenticated {
				continue;
			}
			if let Err(e) = manager.refresh().await {
				#[cfg(feature = "tracing")]
				tracing::debug!(error = %e, "Periodic refresh failed.");
				#[cfg(not(feature = "tracing"))]
				let _ = e;
			}
		}
	}
}
