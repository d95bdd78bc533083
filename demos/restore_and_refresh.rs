//! Restores a persisted session whose access token already expired, then lets the periodic
//! refresh timer rotate the pair once more.

// std
use std::sync::Arc;
// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use rentdesk_session::{
	auth::CredentialPair,
	config::SessionConfig,
	session::ReqwestSessionManager,
	store::{ClientStore, MemoryStore},
};

fn demo_token(user_id: u64, ttl: Duration) -> String {
	let exp = (OffsetDateTime::now_utc() + ttl).unix_timestamp();
	let claims: Value = json!({ "user_id": user_id, "exp": exp, "tenant": true });
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);

	format!("{header}.{}.c2lnbmF0dXJl", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let store = MemoryStore::default();
	let expired = CredentialPair::new(demo_token(7, Duration::seconds(-30)), "persisted-refresh");

	store.set(SessionConfig::DEFAULT_STORAGE_KEY, expired.to_json()?).await?;

	let refreshed = demo_token(7, Duration::minutes(5));
	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/token/refresh/");
			then.status(200).json_body(json!({ "access": refreshed, "refresh": "rotated-refresh" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/user-info/");
			then.status(200).json_body(json!({ "phone_number": "+1 555 0199" }));
		})
		.await;

	let config = SessionConfig::builder(Url::parse(&server.base_url())?)
		.refresh_interval(Duration::seconds(1))
		.build()?;
	let manager =
		Arc::new(ReqwestSessionManager::with_reqwest(Arc::new(store.clone()), config)?);
	let identity = manager.restore().await?;

	println!("Restored identity: {identity:?}.");

	let timer = manager.spawn_refresh_timer();

	tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
	timer.cancel();

	println!(
		"Refresh attempts: {}, successes: {}.",
		manager.metrics.refresh_attempts(),
		manager.metrics.refresh_successes()
	);

	refresh_mock.assert_calls_async(2).await;

	Ok(())
}
