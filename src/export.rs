use std::path::Path;

use tracing::{debug, info};

use crate::client::{Client, Issue};
use crate::config::ApiConfig;
use crate::enrich::{self, Enrichment};
use crate::error::{ExportError, Result};

/// Fixed leading columns of every export. Enrichment columns follow, in the
/// order they were declared on the command line.
pub const FIXED_FIELDS: [&str; 7] = ["Error", "Location", "Details", "Events", "Users", "Notes", "Link"];

pub fn header(enrichments: &[Enrichment]) -> Vec<String> {
	FIXED_FIELDS
		.iter()
		.map(|field| field.to_string())
		.chain(enrichments.iter().map(|enrichment| enrichment.csv_field.clone()))
		.collect()
}

/// The CSV record for one issue. `enriched` must be aligned with the
/// enrichment declarations used for the header.
pub fn issue_record(issue: &Issue, enriched: &[String]) -> Vec<String> {
	let mut record = vec![
		issue.error_label().to_string(),
		issue.culprit.clone(),
		issue.details().to_string(),
		issue.count.clone(),
		issue.user_count.to_string(),
		String::new(), // Notes: a blank column for the analyst to fill in
		issue.permalink.clone(),
	];
	record.extend(enriched.iter().cloned());
	record
}

/// Run the whole export: page through the listing, enrich, write.
/// Returns the number of issues written.
///
/// Issues are processed strictly in listing order, one at a time. On a fatal
/// error the rows already flushed stay in the file; no partial row is ever
/// written.
pub async fn run(config: &ApiConfig, organization: &str, project: &str, enrichments: &[Enrichment], outfile: &Path) -> Result<usize> {
	let client = Client::new(config.clone())?;
	let mut writer = csv::Writer::from_path(outfile)?;
	writer.write_record(header(enrichments))?;

	let mut written = 0;
	let mut cursor = String::new();
	let mut page_count = 1;
	loop {
		println!("Fetching issues page {page_count}");
		let page = client.issues_page(organization, project, &cursor).await?;
		debug!(issues = page.issues.len(), next = ?page.next_cursor, "received listing page");

		for issue in &page.issues {
			let enriched = enrich::enrich_issue(&client, issue, enrichments).await;
			writer.write_record(issue_record(issue, &enriched))?;
			written += 1;
		}
		// Keep the file valid row-by-row in case the run is interrupted.
		writer.flush().map_err(|source| ExportError::Io { path: outfile.to_path_buf(), source })?;

		match page.next_cursor {
			Some(next) => {
				cursor = next;
				page_count += 1;
			}
			None => break,
		}
	}

	info!(written, pages = page_count, "export finished");
	Ok(written)
}
