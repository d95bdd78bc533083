//! Logs a landlord in against a mocked backend, calls a resource endpoint with the session's
//! bearer token, and logs out again.

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
use rentdesk_session::{config::SessionConfig, session::ReqwestSessionManager, store::MemoryStore};

fn demo_token(claims: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);

	format!("{header}.{}.c2lnbmF0dXJl", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let exp = (OffsetDateTime::now_utc() + Duration::minutes(5)).unix_timestamp();
	let access = demo_token(json!({ "user_id": 1, "exp": exp, "landlord": true }));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/api/token/");
			then.status(200).json_body(json!({ "access": access, "refresh": "demo-refresh" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/user-info/");
			then.status(200).json_body(json!({ "email": "owner@example.com" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/properties/count/");
			then.status(200).json_body(json!({ "has_properties": true, "property_count": 2 }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/properties/").header_exists("authorization");
			then.status(200).json_body(json!([{ "id": 1 }, { "id": 2 }]));
		})
		.await;

	let config = SessionConfig::builder(Url::parse(&server.base_url())?).build()?;
	let manager = ReqwestSessionManager::with_reqwest(Arc::new(MemoryStore::default()), config)?;
	let outcome = manager.login("owner@example.com", "correct horse").await?;

	println!("Routed to {}.", outcome.destination);

	let properties: Value = manager.get_json("properties/").await?;

	println!("Landlord owns {} properties.", properties.as_array().map_or(0, Vec::len));

	manager.logout().await?;

	println!("Session after logout: {:?}.", manager.snapshot());

	token_mock.assert_async().await;

	Ok(())
}
