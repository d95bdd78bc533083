//! Access/refresh credential pair as issued by the auth service and persisted by the manager.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access + refresh tokens persisted together under one storage key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
	/// Short-lived signed access token.
	pub access: TokenSecret,
	/// Long-lived opaque refresh token.
	pub refresh: TokenSecret,
}
impl CredentialPair {
	/// Builds a pair from raw token strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: TokenSecret::new(refresh) }
	}

	/// Returns `true` when neither token is empty.
	pub fn is_complete(&self) -> bool {
		!self.access.is_empty() && !self.refresh.is_empty()
	}

	/// Serializes the pair into its persisted JSON form.
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string(self)
	}

	/// Parses a persisted JSON value.
	pub fn from_json(raw: &str) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access", &"<redacted>")
			.field("refresh", &"<redacted>")
			.finish()
	}
}

/// Token endpoint payload; `refresh` is absent when the backend does not rotate it.
#[derive(Clone, Deserialize)]
pub struct IssuedTokens {
	/// Newly issued access token.
	pub access: TokenSecret,
	/// Newly issued refresh token, if rotated.
	#[serde(default)]
	pub refresh: Option<TokenSecret>,
}
impl IssuedTokens {
	/// Completes the pair, keeping `previous` when no refresh token was issued.
	///
	/// An empty `refresh` counts as not issued. Returns `None` unless both tokens of the
	/// resulting pair are non-empty.
	pub fn into_pair(self, previous: Option<&TokenSecret>) -> Option<CredentialPair> {
		let refresh =
			self.refresh.filter(|refresh| !refresh.is_empty()).or_else(|| previous.cloned())?;

		Some(CredentialPair { access: self.access, refresh }).filter(CredentialPair::is_complete)
	}
}
impl Debug for IssuedTokens {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IssuedTokens")
			.field("access", &"<redacted>")
			.field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn persisted_layout_is_flat_json() {
		let pair = CredentialPair::new("access-1", "refresh-1");
		let json = pair.to_json().expect("Credential pair should serialize.");

		assert_eq!(json, r#"{"access":"access-1","refresh":"refresh-1"}"#);
		assert_eq!(CredentialPair::from_json(&json).expect("Pair should parse back."), pair);
	}

	#[test]
	fn parse_errors_report_missing_field_path() {
		let err = CredentialPair::from_json(r#"{"access":"a"}"#)
			.expect_err("A pair without refresh token must be rejected.");

		assert!(err.to_string().contains("refresh"));
	}

	#[test]
	fn issued_tokens_keep_previous_refresh_when_not_rotated() {
		let issued: IssuedTokens = serde_json::from_str(r#"{"access":"access-2"}"#)
			.expect("Access-only payload should parse.");
		let previous = TokenSecret::new("refresh-1");
		let pair = issued.clone().into_pair(Some(&previous)).expect("Pair should be completed.");

		assert_eq!(pair.access.expose(), "access-2");
		assert_eq!(pair.refresh.expose(), "refresh-1");
		assert!(issued.into_pair(None).is_none());
	}

	#[test]
	fn empty_tokens_never_complete_a_pair() {
		let previous = TokenSecret::new("refresh-1");
		let blank_refresh: IssuedTokens = serde_json::from_str(r#"{"access":"a","refresh":""}"#)
			.expect("Blank refresh payload should parse.");

		assert!(blank_refresh.clone().into_pair(None).is_none());
		assert_eq!(
			blank_refresh.into_pair(Some(&previous)).map(|pair| pair.refresh),
			Some(previous.clone())
		);

		let blank_access: IssuedTokens = serde_json::from_str(r#"{"access":"","refresh":"r"}"#)
			.expect("Blank access payload should parse.");

		assert!(blank_access.into_pair(Some(&previous)).is_none());
		assert!(!CredentialPair::new("a", "").is_complete());
	}

	#[test]
	fn debug_redacts_both_tokens() {
		let rendered = format!("{:?}", CredentialPair::new("a-secret", "r-secret"));

		assert!(!rendered.contains("secret"));
	}
}
