use std::path::Path;

use serde_json::{Value, json};
use url::Url;
use wiremock::MockServer;

use issues2csv::ApiConfig;

/// A listing-endpoint issue with predictable field values derived from `id`.
pub fn issue_json(id: &str) -> Value {
	json!({
		"id": id,
		"title": format!("ValueError: bad input {id}"),
		"culprit": "app.views in handler",
		"count": "7",
		"userCount": 3,
		"permalink": format!("https://example.invalid/acme/issues/{id}/"),
		"metadata": {"type": "ValueError", "value": format!("bad input {id}")}
	})
}

pub fn config_for(server: &MockServer) -> ApiConfig {
	ApiConfig {
		host: Url::parse(&server.uri()).expect("mock server uri is a valid url"),
		token: "test-token".to_string(),
		environment: None,
	}
}

/// Read the written CSV back, header row included.
pub fn read_rows(path: &Path) -> Vec<Vec<String>> {
	let mut reader = csv::ReaderBuilder::new().has_headers(false).from_path(path).expect("output file exists");
	reader
		.records()
		.map(|record| record.expect("valid csv row").iter().map(str::to_string).collect())
		.collect()
}
