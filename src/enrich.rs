use serde_json::Value;
use tracing::warn;

use crate::client::{Client, Issue};
use crate::error::{ExportError, Result};

/// One extra CSV column pulled out of an issue's latest event.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Enrichment {
	pub csv_field: String,
	pub path: Vec<String>,
}

impl Enrichment {
	/// Parse a single `Column=dot.path` mapping.
	pub fn from_mapping(mapping: &str) -> Result<Self> {
		let (csv_field, path) = mapping.split_once('=').ok_or_else(|| ExportError::InvalidMapping { mapping: mapping.to_string() })?;
		let csv_field = csv_field.trim();
		let path: Vec<String> = path.trim().split('.').map(str::to_string).collect();
		if csv_field.is_empty() || path.iter().any(|segment| segment.is_empty()) {
			return Err(ExportError::InvalidMapping { mapping: mapping.to_string() });
		}

		Ok(Self {
			csv_field: csv_field.to_string(),
			path,
		})
	}

	/// Parse the CLI `--enrich` value: comma-separated mappings, order preserved.
	pub fn parse_list(mappings: &str) -> Result<Vec<Self>> {
		mappings.split(',').map(Self::from_mapping).collect()
	}
}

/// Walk a dotted path into a JSON value.
///
/// Total by construction: absent keys, out-of-range or non-numeric sequence
/// indexes, and scalars met before the path is exhausted all yield `None`.
/// The payload is never mutated.
pub fn resolve_path<'a>(value: &'a Value, path: &[String]) -> Option<&'a Value> {
	let mut current = value;
	for segment in path {
		current = match current {
			Value::Object(map) => map.get(segment)?,
			Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
			_ => return None,
		};
	}
	Some(current)
}

/// String form of a resolved value for a CSV cell. Null and collections
/// degrade to the missing sentinel (empty string).
pub fn cell_value(value: Option<&Value>) -> String {
	match value {
		Some(Value::String(s)) => s.clone(),
		Some(Value::Number(n)) => n.to_string(),
		Some(Value::Bool(b)) => b.to_string(),
		_ => String::new(),
	}
}

/// Resolve every enrichment against one issue's latest event.
///
/// At most one event fetch happens per issue, shared by all enrichments. A
/// failed fetch leaves every enrichment column empty and the export running;
/// the base row for the issue is still written by the caller.
pub async fn enrich_issue(client: &Client, issue: &Issue, enrichments: &[Enrichment]) -> Vec<String> {
	if enrichments.is_empty() {
		return Vec::new();
	}

	let event = match client.latest_event(&issue.id).await {
		Ok(event) => event,
		Err(e) => {
			warn!(issue = %issue.id, error = %e, "could not fetch latest event, leaving enrichment columns empty");
			return vec![String::new(); enrichments.len()];
		}
	};

	enrichments.iter().map(|enrichment| cell_value(resolve_path(&event, &enrichment.path))).collect()
}
