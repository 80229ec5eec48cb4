use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{ExportError, Result};

/// How many times a single GET is attempted when the API keeps answering 429.
const RATE_LIMIT_ATTEMPTS: u32 = 3;

/// One issue as returned by the listing endpoint. Snapshot of server state at
/// fetch time; never mutated locally.
#[derive(Clone, Debug, Deserialize)]
pub struct Issue {
	pub id: String,
	pub title: String,
	#[serde(default)]
	pub culprit: String,
	/// The API serializes the event count as a string.
	pub count: String,
	#[serde(rename = "userCount")]
	pub user_count: u64,
	pub permalink: String,
	#[serde(default)]
	pub metadata: Metadata,
}

/// Shape varies by issue kind: exception issues carry `type`/`value`,
/// message issues carry `title`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Metadata {
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub value: Option<String>,
	pub title: Option<String>,
}

impl Issue {
	/// The error label: exception type, message title, or the issue title as a
	/// last resort.
	pub fn error_label(&self) -> &str {
		self.metadata.kind.as_deref().or(self.metadata.title.as_deref()).unwrap_or(&self.title)
	}

	pub fn details(&self) -> &str {
		self.metadata.value.as_deref().unwrap_or("")
	}
}

/// One page of the issues listing plus the cursor to the next page, if any.
#[derive(Debug)]
pub struct IssuePage {
	pub issues: Vec<Issue>,
	pub next_cursor: Option<String>,
}

pub struct Client {
	http: reqwest::Client,
	config: ApiConfig,
}

impl Client {
	pub fn new(config: ApiConfig) -> Result<Self> {
		let mut headers = HeaderMap::new();
		let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|_| ExportError::InvalidToken)?;
		auth.set_sensitive(true);
		headers.insert(header::AUTHORIZATION, auth);

		let http = reqwest::Client::builder().default_headers(headers).build()?;
		Ok(Self { http, config })
	}

	/// Fetch one page of the unresolved-issues listing. Pass an empty cursor
	/// for the first page; afterwards the cursor from the previous page.
	pub async fn issues_page(&self, organization: &str, project: &str, cursor: &str) -> Result<IssuePage> {
		let url = self.config.host.join(&format!("/api/0/projects/{organization}/{project}/issues/"))?;

		let mut params = vec![("cursor", cursor.to_string()), ("statsPeriod", String::new()), ("query", "is:unresolved".to_string())];
		if let Some(environment) = &self.config.environment {
			params.push(("environment", environment.clone()));
		}

		let response = self.get_with_retry(url, &params).await?;
		let next_cursor = response
			.headers()
			.get(header::LINK)
			.and_then(|v| v.to_str().ok())
			.and_then(next_cursor);
		let issues = response.json().await.map_err(ExportError::Decode)?;

		Ok(IssuePage { issues, next_cursor })
	}

	/// Fetch the latest event of an issue as raw JSON; the payload has no
	/// fixed schema.
	pub async fn latest_event(&self, issue_id: &str) -> Result<Value> {
		let url = self.config.host.join(&format!("/api/0/issues/{issue_id}/events/latest/"))?;
		let response = self.get_with_retry(url, &[]).await?;
		response.json().await.map_err(ExportError::Decode)
	}

	/// GET with bounded retry on 429. Any other non-success status is mapped
	/// to the matching [`ExportError`] variant immediately.
	async fn get_with_retry(&self, url: Url, params: &[(&str, String)]) -> Result<Response> {
		let mut attempt = 0;
		loop {
			attempt += 1;
			debug!(%url, attempt, "GET");
			let response = self.http.get(url.clone()).query(params).send().await?;
			let status = response.status();

			if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
				return Err(ExportError::Auth { status });
			}

			if status == StatusCode::TOO_MANY_REQUESTS {
				if attempt >= RATE_LIMIT_ATTEMPTS {
					return Err(ExportError::RateLimited { attempts: attempt });
				}
				// Honor the server's Retry-After when present; otherwise back off 1s, 2s, 4s.
				let delay = retry_after(&response).unwrap_or_else(|| Duration::from_secs(1 << (attempt - 1)));
				warn!(?delay, attempt, "rate limited, backing off");
				tokio::time::sleep(delay).await;
				continue;
			}

			if !status.is_success() {
				let body = response.text().await.unwrap_or_default();
				return Err(ExportError::Api { url: url.to_string(), status, body });
			}

			return Ok(response);
		}
	}
}

fn retry_after(response: &Response) -> Option<Duration> {
	let seconds = response.headers().get(header::RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
	Some(Duration::from_secs(seconds))
}

/// Extract the next-page cursor from a `Link` response header.
///
/// The service emits entries like
/// `<https://host/...>; rel="next"; results="true"; cursor="1573:0:0"`,
/// comma-separated. Another page exists only when the `next` entry reports
/// `results="true"`.
pub fn next_cursor(link_header: &str) -> Option<String> {
	for entry in link_header.split(',') {
		let mut rel = None;
		let mut results = None;
		let mut cursor = None;
		for param in entry.split(';').skip(1) {
			if let Some((key, value)) = param.trim().split_once('=') {
				let value = value.trim_matches('"');
				match key {
					"rel" => rel = Some(value),
					"results" => results = Some(value),
					"cursor" => cursor = Some(value),
					_ => {}
				}
			}
		}
		if rel == Some("next") && results == Some("true") {
			return cursor.map(str::to_string);
		}
	}
	None
}
