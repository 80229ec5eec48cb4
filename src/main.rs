use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;
use url::Url;

use issues2csv::config::ApiConfig;
use issues2csv::enrich::Enrichment;
use issues2csv::export;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
	/// Increase the log verbosity (-v: info, -vv: debug)
	#[arg(short, long, action = clap::ArgAction::Count, global = true)]
	verbose: u8,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Export a project's unresolved issues to a CSV file
	Export(ExportArgs),
}

#[derive(Args)]
struct ExportArgs {
	/// The API token
	#[arg(long, value_name = "API_TOKEN")]
	token: String,

	/// Base URL of the service
	#[arg(long, default_value = "https://sentry.io")]
	host: Url,

	/// Only export issues seen in this environment
	#[arg(long, value_name = "NAME")]
	environment: Option<String>,

	/// Extra columns pulled from each issue's latest event: "Col=dot.path[,Col2=dot.path2]"
	#[arg(long, value_name = "MAPPINGS")]
	enrich: Option<String>,

	/// Output file (default: <ORG>-<PROJECT>-export.csv)
	#[arg(long, short, value_name = "FILE")]
	output: Option<PathBuf>,

	/// The organization slug
	organization: String,
	/// The project slug
	project: String,
}

fn main() -> Result<()> {
	color_eyre::install()?;
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match cli.command {
		Commands::Export(args) => run_export(args),
	}
}

fn init_tracing(verbosity: u8) {
	let default_directive = match verbosity {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run_export(args: ExportArgs) -> Result<()> {
	let enrichments = match args.enrich.as_deref() {
		Some(mappings) => Enrichment::parse_list(mappings).wrap_err("invalid --enrich value")?,
		None => Vec::new(),
	};
	let outfile = args
		.output
		.unwrap_or_else(|| PathBuf::from(format!("{}-{}-export.csv", args.organization, args.project)));
	let config = ApiConfig {
		host: args.host,
		token: args.token,
		environment: args.environment,
	};

	tokio::runtime::Runtime::new()?.block_on(async {
		let written = export::run(&config, &args.organization, &args.project, &enrichments, &outfile)
			.await
			.wrap_err_with(|| format!("failed to export {}/{}", args.organization, args.project))?;
		println!("Exported {written} issues to {}", outfile.display());
		Ok(())
	})
}
