// std
use std::{sync::Arc, time::Duration};
// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use eventum_client::{
	config::ApiConfig,
	dispatch::{ReqwestDispatcher, RequestOptions},
	error::Error,
	http::{Method as HttpMethod, MultipartForm},
	store::{KeyValueStore, MemoryStore},
};

fn build_dispatcher(server: &MockServer, token: Option<&str>) -> ReqwestDispatcher {
	let config = ApiConfig::builder(server.base_url())
		.build()
		.expect("Mock server origin should produce a valid config.");
	let store: Arc<dyn KeyValueStore> = match token {
		Some(token) => Arc::new(MemoryStore::with_entry(config.token_key.clone(), token)),
		None => Arc::new(MemoryStore::default()),
	};

	ReqwestDispatcher::new(config, store).expect("Reqwest dispatcher should build.")
}

#[tokio::test]
async fn json_response_is_parsed_with_bearer_header() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, Some("tok-123"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/events")
				.header("authorization", "Bearer tok-123")
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"events":[{"id":1,"title":"Jazz night"}]}"#);
		})
		.await;
	let body = dispatcher.get("/api/events").await.expect("Authorized GET should succeed.");

	assert_eq!(body["events"][0]["title"], "Jazz night");
	assert_eq!(dispatcher.in_flight(), 0);

	mock.assert_async().await;
}

#[tokio::test]
async fn non_json_response_is_wrapped_as_text() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/health");
			then.status(200).header("content-type", "text/plain").body("pong");
		})
		.await;
	let body = dispatcher.get("health").await.expect("Plain-text GET should succeed.");

	assert_eq!(body, json!({ "text": "pong" }));

	mock.assert_async().await;
}

#[tokio::test]
async fn error_bodies_drive_the_failure_message() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let missing = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/events/999");
			then.status(404).header("content-type", "application/json").body(r#"{"error":"not found"}"#);
		})
		.await;
	let broken = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/events/500");
			then.status(500);
		})
		.await;
	let err = dispatcher.get("events/999").await.expect_err("404 should fail.");

	assert!(matches!(err, Error::Api { status: 404, .. }));
	assert_eq!(err.to_string(), "not found");

	let err = dispatcher.get("events/500").await.expect_err("500 should fail.");

	assert_eq!(err.to_string(), "Server error: 500");
	assert_eq!(dispatcher.in_flight(), 0);

	missing.assert_async().await;
	broken.assert_async().await;
}

#[tokio::test]
async fn json_bodies_are_sent_with_json_content_type() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, Some("tok-9"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/events/5/tickets")
				.header("content-type", "application/json")
				.json_body(json!({ "quantity": 2 }));
			then.status(201)
				.header("content-type", "application/json")
				.body(r#"{"ticket_id":"t-77"}"#);
		})
		.await;
	let body = dispatcher
		.post_json("events/5/tickets", &json!({ "quantity": 2 }))
		.await
		.expect("JSON POST should succeed.");

	assert_eq!(body["ticket_id"], "t-77");

	mock.assert_async().await;
}

#[tokio::test]
async fn multipart_uploads_reach_the_backend() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, Some("tok-1"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/events")
				.header("authorization", "Bearer tok-1")
				.body_includes("Jazz night");
			then.status(201).header("content-type", "application/json").body(r#"{"id":12}"#);
		})
		.await;
	let form = MultipartForm::new().text("title", "Jazz night").file(
		"cover",
		"cover.png",
		Some("image/png"),
		vec![0x89, 0x50, 0x4e, 0x47],
	);
	let body = dispatcher
		.request("events", RequestOptions::new(HttpMethod::Post).multipart(form))
		.await
		.expect("Multipart POST should succeed.");

	assert_eq!(body["id"], 12);

	mock.assert_async().await;
}

#[tokio::test]
async fn typed_responses_deserialize() {
	#[derive(Debug, Deserialize)]
	struct Profile {
		id: u64,
		name: String,
	}

	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, Some("tok-1"));
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/me");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id":3,"name":"Aruzhan"}"#);
		})
		.await;
	let profile: Profile = dispatcher
		.request_as("users/me", RequestOptions::get())
		.await
		.expect("Profile should deserialize.");

	assert_eq!(profile.id, 3);
	assert_eq!(profile.name, "Aruzhan");
}

#[tokio::test]
async fn newer_same_key_request_supersedes_older_one() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/events");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"page":1}"#)
				.delay(Duration::from_millis(300));
		})
		.await;
	let first_dispatcher = dispatcher.clone();
	let first = tokio::spawn(async move { first_dispatcher.get("events").await });

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(dispatcher.in_flight(), 1);

	let second = dispatcher.get("/api/events").await.expect("Newest request should complete.");
	let first = first.await.expect("First request task should not panic.");

	assert!(first.expect_err("Superseded request should be aborted.").is_cancelled());
	assert_eq!(second, json!({ "page": 1 }));
	assert_eq!(dispatcher.in_flight(), 0);
}

#[tokio::test]
async fn different_methods_do_not_supersede_each_other() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let _get = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/follows");
			then.status(200)
				.header("content-type", "application/json")
				.body("[]")
				.delay(Duration::from_millis(150));
		})
		.await;
	let _post = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/follows");
			then.status(201).header("content-type", "application/json").body(r#"{"ok":true}"#);
		})
		.await;
	let follow_body = json!({ "organizer_id": 4 });
	let (listed, followed) = tokio::join!(
		dispatcher.get("follows"),
		dispatcher.post_json("follows", &follow_body),
	);

	assert_eq!(listed.expect("GET should complete."), json!([]));
	assert_eq!(followed.expect("POST should complete."), json!({ "ok": true }));
}

#[tokio::test]
async fn cancel_all_aborts_outstanding_requests_and_is_idempotent() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/notifications");
			then.status(200)
				.header("content-type", "application/json")
				.body("[]")
				.delay(Duration::from_millis(500));
		})
		.await;
	let pending_dispatcher = dispatcher.clone();
	let pending = tokio::spawn(async move { pending_dispatcher.get("notifications").await });

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert_eq!(dispatcher.cancel_all(), 1);
	assert_eq!(dispatcher.cancel_all(), 0);
	assert_eq!(dispatcher.in_flight(), 0);

	let outcome = pending.await.expect("Pending request task should not panic.");

	assert!(outcome.expect_err("Cancelled request should fail.").is_cancelled());
	assert_eq!(dispatcher.in_flight(), 0);
}

#[tokio::test]
async fn cancel_targets_a_single_method_and_endpoint() {
	let server = MockServer::start_async().await;
	let dispatcher = build_dispatcher(&server, None);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/discussions");
			then.status(200)
				.header("content-type", "application/json")
				.body("[]")
				.delay(Duration::from_millis(500));
		})
		.await;
	let pending_dispatcher = dispatcher.clone();
	let pending = tokio::spawn(async move { pending_dispatcher.get("discussions").await });

	tokio::time::sleep(Duration::from_millis(50)).await;

	assert!(!dispatcher.cancel("discussions", HttpMethod::Post));
	assert!(dispatcher.cancel("/api/discussions", HttpMethod::Get));

	let outcome = pending.await.expect("Pending request task should not panic.");

	assert!(outcome.expect_err("Cancelled request should fail.").is_cancelled());
}
