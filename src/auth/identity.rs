//! In-memory identity record built from access claims and merged with profile data.

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, RoleFlags, SubjectId},
};

/// Profile payload returned by the auth service's user-info endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
	/// Contact phone number.
	#[serde(default)]
	pub phone_number: Option<String>,
	/// Landlord flag as stored server-side.
	#[serde(default)]
	pub landlord: Option<bool>,
	/// Tenant flag as stored server-side.
	#[serde(default)]
	pub tenant: Option<bool>,
	/// Fields not modeled above.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}

/// Identity of the signed-in user; never persisted.
///
/// Built by [`Identity::from_claims`], then [`Identity::merge_profile`] lets profile fields
/// that are present override the claim-derived email and role flags. Subject, expiry, and
/// token metadata always come from the claims.
#[derive(Clone, Debug, PartialEq)]
pub struct Identity {
	/// Subject identifier.
	pub subject: SubjectId,
	/// Email from the profile, else from the claims.
	pub email: Option<String>,
	/// Access-token expiry.
	pub expires_at: OffsetDateTime,
	/// Access-token issue time.
	pub issued_at: Option<OffsetDateTime>,
	/// Access-token identifier.
	pub token_id: Option<String>,
	/// Effective role flags.
	pub roles: RoleFlags,
	/// Phone number from the profile.
	pub phone_number: Option<String>,
	/// Profile fields not modeled above.
	pub profile_extra: BTreeMap<String, serde_json::Value>,
	/// `true` once a profile has been merged.
	pub profile_loaded: bool,
}
impl Identity {
	/// Builds an identity from decoded claims alone.
	pub fn from_claims(claims: &AccessClaims) -> Self {
		Self {
			subject: claims.subject.clone(),
			email: claims.email.clone(),
			expires_at: claims.expires_at,
			issued_at: claims.issued_at,
			token_id: claims.token_id.clone(),
			roles: claims.roles,
			phone_number: None,
			profile_extra: BTreeMap::new(),
			profile_loaded: false,
		}
	}

	/// Returns a copy with `profile` applied on top.
	pub fn merge_profile(&self, profile: UserProfile) -> Self {
		let mut merged = self.clone();

		if let Some(email) = profile.email {
			merged.email = Some(email);
		}
		if let Some(phone_number) = profile.phone_number {
			merged.phone_number = Some(phone_number);
		}
		if let Some(landlord) = profile.landlord {
			merged.roles.landlord = landlord;
		}
		if let Some(tenant) = profile.tenant {
			merged.roles.tenant = tenant;
		}

		merged.profile_extra.extend(profile.extra);
		merged.profile_loaded = true;

		merged
	}

	/// Re-derives claim fields after a token rotation while keeping merged profile fields.
	///
	/// Role flags follow the new claims until the next profile merge.
	pub fn rebase_on(&self, claims: &AccessClaims) -> Self {
		let mut rebased = Self::from_claims(claims);

		if rebased.subject == self.subject {
			rebased.email = rebased.email.or_else(|| self.email.clone());
			rebased.phone_number = self.phone_number.clone();
			rebased.profile_extra = self.profile_extra.clone();
		}

		rebased
	}
}
