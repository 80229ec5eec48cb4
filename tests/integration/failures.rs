use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use issues2csv::{ExportError, export};

use crate::common::{config_for, issue_json, read_rows};

const LISTING_PATH: &str = "/api/0/projects/acme/web/issues/";

#[tokio::test]
async fn listing_auth_failure_is_fatal() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token"})))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let outfile = dir.path().join("export.csv");
	let err = export::run(&config_for(&server), "acme", "web", &[], &outfile).await.unwrap_err();
	assert!(matches!(err, ExportError::Auth { .. }), "got: {err}");
}

#[tokio::test]
async fn rate_limited_listing_retries_then_succeeds() {
	let server = MockServer::start().await;

	// First attempt is throttled; the retry goes through.
	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json("1")])))
		.expect(1)
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let outfile = dir.path().join("export.csv");
	let written = export::run(&config_for(&server), "acme", "web", &[], &outfile).await.unwrap();
	assert_eq!(written, 1);
}

#[tokio::test]
async fn persistent_rate_limiting_is_fatal_after_three_attempts() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
		.expect(3)
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let outfile = dir.path().join("export.csv");
	let err = export::run(&config_for(&server), "acme", "web", &[], &outfile).await.unwrap_err();
	assert!(matches!(err, ExportError::RateLimited { attempts: 3 }), "got: {err}");
}

#[tokio::test]
async fn unwritable_output_path_is_fatal_before_any_request() {
	let server = MockServer::start().await;

	let dir = tempfile::tempdir().unwrap();
	let outfile = dir.path().join("no-such-dir").join("export.csv");
	let err = export::run(&config_for(&server), "acme", "web", &[], &outfile).await.unwrap_err();
	assert!(matches!(err, ExportError::Csv(_)), "got: {err}");
	server.verify().await; // no requests were made
}

#[tokio::test]
async fn fatal_listing_error_leaves_previously_written_rows_in_place() {
	let server = MockServer::start().await;

	let link = format!(r#"<{}{LISTING_PATH}?cursor=next>; rel="next"; results="true"; cursor="next""#, server.uri());
	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("Link", link.as_str())
				.set_body_json(json!([issue_json("1")])),
		)
		.up_to_n_times(1)
		.mount(&server)
		.await;
	// Second page blows up.
	Mock::given(method("GET"))
		.and(path(LISTING_PATH))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;

	let dir = tempfile::tempdir().unwrap();
	let outfile = dir.path().join("export.csv");
	let err = export::run(&config_for(&server), "acme", "web", &[], &outfile).await.unwrap_err();
	assert!(matches!(err, ExportError::Api { .. }), "got: {err}");

	let rows = read_rows(&outfile);
	assert_eq!(rows.len(), 2, "header plus the one row flushed before the failure");
	assert_eq!(rows[1][6], "https://example.invalid/acme/issues/1/");
}
