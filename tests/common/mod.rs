//! Fixtures shared by the httpmock-backed integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::{Mock, prelude::*};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use rentdesk_session::{
	config::SessionConfig,
	session::ReqwestSessionManager,
	store::{ClientStore, MemoryStore},
};

pub const TOKEN_PATH: &str = "/auth/api/token/";
pub const REFRESH_PATH: &str = "/auth/token/refresh/";
pub const USER_INFO_PATH: &str = "/auth/user-info/";
pub const PROPERTY_COUNT_PATH: &str = "/properties/count/";

/// Unsigned JWT carrying `claims` as its payload.
pub fn mint_token(claims: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

	format!("{header}.{payload}.c2lnbmF0dXJl")
}

/// Access token for `user_id` expiring `ttl` from now; `jti` keeps successive tokens distinct.
pub fn access_token(
	user_id: u64,
	landlord: bool,
	tenant: bool,
	ttl: Duration,
	jti: &str,
) -> String {
	let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp();

	mint_token(json!({
		"user_id": user_id,
		"exp": exp,
		"jti": jti,
		"token_type": "access",
		"landlord": landlord,
		"tenant": tenant,
	}))
}

pub fn config_for(server: &MockServer) -> SessionConfig {
	SessionConfig::builder(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
		.build()
		.expect("Mock server configuration should validate.")
}

pub fn manager_with_store(
	server: &MockServer,
	store: Arc<dyn ClientStore>,
) -> ReqwestSessionManager {
	ReqwestSessionManager::with_reqwest(store, config_for(server))
		.expect("Reqwest-backed manager should build.")
}

pub fn manager_for(server: &MockServer) -> (ReqwestSessionManager, MemoryStore) {
	let store = MemoryStore::default();

	(manager_with_store(server, Arc::new(store.clone())), store)
}

/// Token endpoint accepting exactly `email`/`password`.
pub async fn mock_login<'a>(
	server: &'a MockServer,
	email: &str,
	password: &str,
	access: &str,
	refresh: &str,
) -> Mock<'a> {
	let request = json!({ "email": email, "password": password });
	let reply = json!({ "access": access, "refresh": refresh });

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).json_body(request);
			then.status(200).json_body(reply);
		})
		.await
}

/// Refresh endpoint exchanging `refresh` for `access`/`next_refresh`.
pub async fn mock_refresh<'a>(
	server: &'a MockServer,
	refresh: &str,
	access: &str,
	next_refresh: &str,
) -> Mock<'a> {
	let request = json!({ "refresh": refresh });
	let reply = json!({ "access": access, "refresh": next_refresh });

	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).json_body(request);
			then.status(200).json_body(reply);
		})
		.await
}

/// Profile endpoint answering `profile` to any bearer.
pub async fn mock_user_info(server: &MockServer, profile: Value) -> Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path(USER_INFO_PATH).header_exists("authorization");
			then.status(200).json_body(profile);
		})
		.await
}
