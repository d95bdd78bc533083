#![cfg(feature = "reqwest")]

mod common;

// std
use std::{env, fs, process, sync::Arc};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime};
// self
use common::*;
use rentdesk_session::{
	auth::{CredentialPair, RoleFlags},
	error::Error,
	session::{LogoutReason, SessionPhase},
	store::{ClientStore, FileStore, MemoryStore},
};

async fn seed(store: &dyn ClientStore, access: &str, refresh: &str) {
	let pair = CredentialPair::new(access, refresh).to_json().expect("Pair should serialize.");

	store.set("authTokens", pair).await.expect("Seeding the store should succeed.");
}

#[tokio::test]
async fn restore_round_trip_reproduces_role_flags() {
	let server = MockServer::start_async().await;
	let access = access_token(7, true, true, Duration::minutes(5), "rt-a");

	mock_login(&server, "both@example.com", "pw", &access, "refresh-a").await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(PROPERTY_COUNT_PATH);
			then.status(200).json_body(json!({ "has_properties": true }));
		})
		.await;

	let profile = mock_user_info(&server, json!({ "phone_number": "+1 555 0101" })).await;
	let (first, store) = manager_for(&server);

	first.login("both@example.com", "pw").await.expect("Login should succeed.");

	let second = manager_with_store(&server, Arc::new(store.clone()));
	let identity = second
		.restore()
		.await
		.expect("Restore should succeed.")
		.expect("Persisted pair should restore a session.");

	assert_eq!(identity.roles, first.role_flags());
	assert_eq!(second.role_flags(), RoleFlags { landlord: true, tenant: true });
	assert_eq!(identity.phone_number.as_deref(), Some("+1 555 0101"));
	assert_eq!(second.snapshot().phase, SessionPhase::Authenticated);
	profile.assert_calls_async(2).await;
}

#[tokio::test]
async fn expired_access_token_is_refreshed_during_restore() {
	let server = MockServer::start_async().await;
	let store = MemoryStore::default();
	let stale = access_token(9, false, true, Duration::seconds(-1), "stale");
	let fresh = access_token(9, false, true, Duration::minutes(5), "fresh");

	seed(&store, &stale, "refresh-old").await;

	let refresh = mock_refresh(&server, "refresh-old", &fresh, "refresh-new").await;

	mock_user_info(&server, json!({})).await;

	let manager = manager_with_store(&server, Arc::new(store.clone()));
	let identity = manager
		.restore()
		.await
		.expect("Restore should succeed.")
		.expect("Refreshed session should carry an identity.");

	refresh.assert_calls_async(1).await;

	assert!(identity.expires_at > OffsetDateTime::now_utc());
	assert!(identity.roles.tenant);
	assert!(!manager.snapshot().loading);

	let persisted = store
		.get("authTokens")
		.await
		.expect("Store read should succeed.")
		.expect("Rotated pair should be persisted.");
	let pair = CredentialPair::from_json(&persisted).expect("Persisted pair should parse.");

	assert_eq!(pair.access.expose(), fresh);
	assert_eq!(pair.refresh.expose(), "refresh-new");
}

#[tokio::test]
async fn just_expired_token_is_rejected_at_login_and_refreshed_on_restore() {
	let server = MockServer::start_async().await;
	let stale = access_token(10, true, false, Duration::seconds(-1), "stale");

	mock_login(&server, "owner@example.com", "pw", &stale, "refresh-old").await;

	let (manager, store) = manager_for(&server);
	let err = manager
		.login("owner@example.com", "pw")
		.await
		.expect_err("An already expired access token must fail the login.");

	assert!(matches!(err, Error::TokenExpired { .. }));
	assert!(store.entries().is_empty());

	seed(&store, &stale, "refresh-old").await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401).json_body(json!({ "detail": "Token is invalid or expired" }));
		})
		.await;
	let err = manager.restore().await.expect_err("Failed refresh must fail the restore.");

	refresh.assert_calls_async(1).await;

	assert!(matches!(err, Error::RefreshFailed { .. }));
	assert_eq!(manager.snapshot().phase, SessionPhase::Unauthenticated);
	assert_eq!(manager.snapshot().last_logout, Some(LogoutReason::RefreshFailed));
	assert!(store.entries().is_empty());
}

#[tokio::test]
async fn file_store_carries_session_across_reopen() -> color_eyre::Result<()> {
	let path = env::temp_dir().join(format!(
		"rentdesk_session_it_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let server = MockServer::start_async().await;
	let access = access_token(11, false, true, Duration::minutes(5), "file-a");

	mock_login(&server, "tenant@example.com", "pw", &access, "refresh-a").await;
	mock_user_info(&server, json!({})).await;

	let first_store = FileStore::open(&path)?;

	assert_eq!(first_store.path(), path.as_path());

	{
		let manager = manager_with_store(&server, Arc::new(first_store.clone()));

		manager.login("tenant@example.com", "pw").await?;
	}

	let reopened = manager_with_store(&server, Arc::new(FileStore::open(first_store.path())?));
	let identity = reopened.restore().await?.expect("File-backed pair should restore a session.");

	assert_eq!(identity.subject.to_string(), "11");
	assert!(reopened.snapshot().tenant);

	reopened.logout().await?;

	assert_eq!(FileStore::open(&path)?.get("authTokens").await?, None);

	fs::remove_file(&path)?;

	Ok(())
}
