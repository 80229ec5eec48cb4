use url::Url;

/// Connection parameters for the issue tracker API.
///
/// Passed into [`crate::client::Client`] at construction; nothing reads these
/// from ambient state.
#[derive(Clone, Debug)]
pub struct ApiConfig {
	/// Base URL of the service, e.g. `https://sentry.io`.
	pub host: Url,
	/// Bearer token for the `Authorization` header.
	pub token: String,
	/// Restrict the listing to a single environment, if set.
	pub environment: Option<String>,
}
