//! Access-token claim decoding.
//!
//! Only the payload segment is read. The signature is not verified, so the decoded claims are
//! suitable for UI gating and expiry checks but never as an authorization decision.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, RoleFlags, SubjectId},
};

/// Errors produced while decoding an access token.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Token has {segments} segments, expected 3.")]
	Malformed {
		/// Number of dot-separated segments found.
		segments: usize,
	},
	/// Payload segment is not valid base64url.
	#[error("Token payload is not valid base64url.")]
	Base64(#[from] base64::DecodeError),
	/// Payload is not the expected JSON object.
	#[error("Token payload is not a valid claims object.")]
	Json(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Neither `sub` nor `user_id` is present.
	#[error("Token payload carries no subject.")]
	MissingSubject,
	/// Subject claim failed validation.
	#[error("Token subject is invalid.")]
	InvalidSubject(#[from] IdentifierError),
	/// A timestamp claim cannot be represented.
	#[error("Token `{claim}` timestamp {value} is out of range.")]
	TimestampOutOfRange {
		/// Claim name.
		claim: &'static str,
		/// Raw unix timestamp.
		value: i64,
	},
}

/// Claims carried by an access token.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessClaims {
	/// Subject identifier (`sub`, falling back to `user_id`).
	pub subject: SubjectId,
	/// Email claim, if the issuer includes one.
	pub email: Option<String>,
	/// Expiry instant (`exp`).
	pub expires_at: OffsetDateTime,
	/// Issued-at instant (`iat`).
	pub issued_at: Option<OffsetDateTime>,
	/// Token identifier (`jti`).
	pub token_id: Option<String>,
	/// Issuer-specific token type (`token_type`).
	pub token_type: Option<String>,
	/// Landlord/tenant flags; missing flags decode as `false`.
	pub roles: RoleFlags,
	/// Every claim not modeled above.
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl AccessClaims {
	/// Decodes the payload of a `header.payload.signature` token.
	pub fn decode(token: &str) -> Result<Self, ClaimsError> {
		let segments = token.split('.').collect::<Vec<_>>();
		let [_, payload, _] = segments.as_slice() else {
			return Err(ClaimsError::Malformed { segments: segments.len() });
		};
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let raw: RawClaims = serde_path_to_error::deserialize(&mut de)?;

		raw.try_into()
	}

	/// Returns `true` if the token is expired at `instant`.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Fails with [`Error::TokenExpired`] when the token is expired at `instant`.
	pub fn ensure_fresh_at(&self, instant: OffsetDateTime) -> Result<()> {
		if self.is_expired_at(instant) {
			Err(Error::TokenExpired { expired_at: self.expires_at })
		} else {
			Ok(())
		}
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSubject {
	Text(String),
	Number(u64),
}
impl RawSubject {
	fn into_subject(self) -> Result<SubjectId, IdentifierError> {
		match self {
			Self::Text(value) => SubjectId::new(value),
			Self::Number(value) => SubjectId::new(value.to_string()),
		}
	}
}

#[derive(Deserialize)]
struct RawClaims {
	#[serde(default)]
	sub: Option<RawSubject>,
	#[serde(default)]
	user_id: Option<RawSubject>,
	#[serde(default)]
	email: Option<String>,
	exp: i64,
	#[serde(default)]
	iat: Option<i64>,
	#[serde(default)]
	jti: Option<String>,
	#[serde(default)]
	token_type: Option<String>,
	#[serde(default)]
	landlord: Option<bool>,
	#[serde(default)]
	tenant: Option<bool>,
	#[serde(flatten)]
	extra: BTreeMap<String, serde_json::Value>,
}
impl TryFrom<RawClaims> for AccessClaims {
	type Error = ClaimsError;

	fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
		let subject = raw.sub.or(raw.user_id).ok_or(ClaimsError::MissingSubject)?.into_subject()?;
		let expires_at = timestamp("exp", raw.exp)?;
		let issued_at = raw.iat.map(|value| timestamp("iat", value)).transpose()?;

		Ok(Self {
			subject,
			email: raw.email,
			expires_at,
			issued_at,
			token_id: raw.jti,
			token_type: raw.token_type,
			roles: RoleFlags {
				landlord: raw.landlord.unwrap_or(false),
				tenant: raw.tenant.unwrap_or(false),
			},
			extra: raw.extra,
		})
	}
}

fn timestamp(claim: &'static str, value: i64) -> Result<OffsetDateTime, ClaimsError> {
	OffsetDateTime::from_unix_timestamp(value)
		.map_err(|_| ClaimsError::TimestampOutOfRange { claim, value })
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;
	use crate::_preludet::mint_token;

	#[test]
	fn decodes_simplejwt_style_payload() {
		let token = mint_token(json!({
			"token_type": "access",
			"exp": 1_767_225_600,
			"iat": 1_767_225_300,
			"jti": "3f9c",
			"user_id": 17,
			"landlord": true,
			"tenant": false,
			"plan": "basic",
		}));
		let claims = AccessClaims::decode(&token).expect("Payload should decode.");

		assert_eq!(claims.subject.as_ref(), "17");
		assert_eq!(claims.expires_at, macros::datetime!(2026-01-01 00:00 UTC));
		assert_eq!(claims.issued_at, Some(macros::datetime!(2025-12-31 23:55 UTC)));
		assert_eq!(claims.token_type.as_deref(), Some("access"));
		assert_eq!(claims.roles, RoleFlags { landlord: true, tenant: false });
		assert_eq!(claims.extra.get("plan"), Some(&json!("basic")));
	}

	#[test]
	fn sub_wins_over_user_id_and_missing_flags_are_false() {
		let token = mint_token(json!({
			"sub": "user-9",
			"user_id": 9,
			"email": "tenant@example.com",
			"exp": 1_767_225_600,
			"landlord": null,
		}));
		let claims = AccessClaims::decode(&token).expect("Payload should decode.");

		assert_eq!(claims.subject.as_ref(), "user-9");
		assert_eq!(claims.email.as_deref(), Some("tenant@example.com"));
		assert_eq!(claims.roles, RoleFlags::default());
	}

	#[test]
	fn rejects_malformed_tokens() {
		assert!(matches!(
			AccessClaims::decode("only.two"),
			Err(ClaimsError::Malformed { segments: 2 })
		));
		assert!(matches!(AccessClaims::decode("a.!!!.c"), Err(ClaimsError::Base64(_))));

		let no_subject = mint_token(json!({ "exp": 1_767_225_600 }));

		assert!(matches!(AccessClaims::decode(&no_subject), Err(ClaimsError::MissingSubject)));

		let no_expiry = mint_token(json!({ "sub": "1" }));
		let err = AccessClaims::decode(&no_expiry).expect_err("Missing exp must be rejected.");

		assert!(matches!(err, ClaimsError::Json(_)));
	}

	#[test]
	fn expiry_checks_are_inclusive() {
		let token = mint_token(json!({ "sub": "1", "exp": 1_767_225_600 }));
		let claims = AccessClaims::decode(&token).expect("Payload should decode.");
		let at_expiry = macros::datetime!(2026-01-01 00:00 UTC);

		assert!(!claims.is_expired_at(at_expiry - Duration::seconds(1)));
		assert!(claims.is_expired_at(at_expiry));
		assert!(matches!(claims.ensure_fresh_at(at_expiry), Err(Error::TokenExpired { .. })));
	}
}
