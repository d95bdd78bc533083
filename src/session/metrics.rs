// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for session activity.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	refresh_attempts: AtomicU64,
	refresh_successes: AtomicU64,
	refresh_failures: AtomicU64,
	authorized_retries: AtomicU64,
	forced_logouts: AtomicU64,
}
impl SessionMetrics {
	/// Returns the total number of refresh attempts.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refreshes (including reuse of a concurrent rotation).
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refreshes.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns how many resource calls were retried after a 401.
	pub fn authorized_retries(&self) -> u64 {
		self.authorized_retries.load(Ordering::Relaxed)
	}

	/// Returns how many sessions ended without the user asking.
	pub fn forced_logouts(&self) -> u64 {
		self.forced_logouts.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_authorized_retry(&self) {
		self.authorized_retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_forced_logout(&self) {
		self.forced_logouts.fetch_add(1, Ordering::Relaxed);
	}
}
