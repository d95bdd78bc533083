//! Startup restoration from the persisted credential pair.

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, ClaimsError, CredentialPair, Identity},
	http::HttpTransport,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{LogoutReason, SessionManager, SessionPhase},
};

impl<T> SessionManager<T>
where
	T: ?Sized + HttpTransport,
{
	/// Rebuilds the session from the store.
	///
	/// Returns `Ok(None)` when nothing is persisted. A persisted pair that does not decode is
	/// removed and reported as [`Error::TokenInvalid`] after a
	/// [`LogoutReason::RestoreFailed`] logout. An expired access token is always refreshed
	/// before the call settles; a live one is followed by a profile lookup. While this runs
	/// the snapshot reports `loading`.
	pub async fn restore(&self) -> Result<Option<Identity>> {
		const KIND: FlowKind = FlowKind::Restore;

		if let Some(identity) = self.identity() {
			return Ok(Some(identity));
		}

		let span = FlowSpan::new(KIND, "restore");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		{
			let mut state = self.state.write();

			state.loading = true;
			state.set_phase(SessionPhase::Restoring);
		}

		let result = span.instrument(self.restore_inner()).await;

		{
			let mut state = self.state.write();

			state.loading = false;

			if state.phase == SessionPhase::Restoring {
				state.set_phase(SessionPhase::Unauthenticated);
			}
		}

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn restore_inner(&self) -> Result<Option<Identity>> {
		let Some(raw) = self.store.get(&self.config.storage_key).await? else {
			return Ok(None);
		};
		let (pair, claims) = match Self::decode_persisted(&raw) {
			Ok(decoded) => decoded,
			Err(e) => {
				self.force_logout(LogoutReason::RestoreFailed, None).await;

				return Err(e);
			},
		};
		let expired = claims.is_expired_at(OffsetDateTime::now_utc());
		let phase = if expired { SessionPhase::Restoring } else { SessionPhase::Authenticated };
		let generation = self.commit_session(pair, &claims, phase, false, None).await?;

		if expired {
			self.refresh_since(generation, None).await?;

			return Ok(self.identity());
		}

		match self.fetch_identity_details().await {
			Ok(identity) => Ok(Some(identity)),
			Err(e) => match self.identity() {
				Some(identity) => Ok(Some(identity)),
				None => Err(e),
			},
		}
	}

	fn decode_persisted(raw: &str) -> Result<(CredentialPair, AccessClaims)> {
		let pair = CredentialPair::from_json(raw).map_err(ClaimsError::from)?;
		let claims = AccessClaims::decode(pair.access.expose())?;

		Ok((pair, claims))
	}
}
