pub mod client;
pub mod config;
pub mod enrich;
pub mod error;
pub mod export;

pub use client::{Client, Issue, IssuePage};
pub use config::ApiConfig;
pub use enrich::Enrichment;
pub use error::ExportError;
