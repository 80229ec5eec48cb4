use std::path::PathBuf;

/// Everything that can abort an export, grouped by stage so the CLI message
/// tells the user where things went wrong.
///
/// Enrichment fetches go through the same client and can hit any of the API
/// variants, but the enrichment call site downgrades them to a warning plus
/// empty cells instead of letting them surface.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
	#[error("authentication failed (HTTP {status}): check that the API token is valid and has project access")]
	Auth { status: reqwest::StatusCode },

	#[error("API request to {url} failed with HTTP {status}: {body}")]
	Api { url: String, status: reqwest::StatusCode, body: String },

	#[error("rate limited by the API: gave up after {attempts} attempts")]
	RateLimited { attempts: u32 },

	#[error("network error talking to the API")]
	Network(#[from] reqwest::Error),

	#[error("could not decode the API response as JSON")]
	Decode(#[source] reqwest::Error),

	#[error("API token contains characters that cannot be sent in a header")]
	InvalidToken,

	#[error("could not build request URL")]
	Url(#[from] url::ParseError),

	#[error("invalid enrichment mapping {mapping:?}: expected \"Column=dot.path\"")]
	InvalidMapping { mapping: String },

	#[error("failed to write {path}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write CSV output")]
	Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
