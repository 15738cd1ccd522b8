//! Walks through a login, a throttled action, and a superseded listing request against a mock
//! backend using the default reqwest transport and the in-memory token store.

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use time::Duration;
// self
use eventum_client::{
	client::ReqwestEventumClient,
	config::ApiConfig,
	dispatch::RequestOptions,
	http::Method,
	rate_limit::RateLimitRule,
	session::BearerToken,
	store::{KeyValueStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let events_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/events").header("authorization", "Bearer demo-token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"[{"id":1,"title":"Jazz night"}]"#)
				.delay(StdDuration::from_millis(200));
		})
		.await;
	let comment_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/discussions/7/comments");
			then.status(201).header("content-type", "application/json").body(r#"{"id":99}"#);
		})
		.await;
	let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::default());
	let config = ApiConfig::builder(server.base_url()).timeout(StdDuration::from_secs(5)).build()?;
	let client = ReqwestEventumClient::new(config, store)?;

	client.login_with_token(&BearerToken::new("demo-token")).await?;

	// Two listings for the same key: only the newest one resolves.
	let stale = {
		let client = client.clone();

		tokio::spawn(async move { client.dispatcher.get("events").await })
	};

	tokio::time::sleep(StdDuration::from_millis(50)).await;

	let fresh = client.dispatcher.get("events").await?;

	match stale.await? {
		Err(e) if e.is_cancelled() => println!("stale listing superseded: {e}"),
		other => println!("unexpected stale outcome: {other:?}"),
	}

	println!("events: {fresh}");

	let rule = RateLimitRule::new(2, Duration::seconds(30));

	for attempt in 1..=3 {
		let options =
			RequestOptions::new(Method::Post).json(json!({ "body": format!("comment #{attempt}") }));

		match client.guarded("comment:demo:7", rule, "discussions/7/comments", options).await {
			Ok(body) => println!("comment {attempt} created: {body}"),
			Err(e) => println!("comment {attempt} rejected: {e}"),
		}
	}

	client.logout().await?;

	println!("listing hits at the backend: {}", events_mock.calls_async().await);

	comment_mock.assert_calls_async(2).await;

	Ok(())
}
