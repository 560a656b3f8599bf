//! Reinhardt loadfixtures CLI
//!
//! Loads the fixtures of every model of a project in relation order.
//! This is the equivalent of Django's `manage.py loadfixtures` command.
//!
//! ## Usage
//!
//! ```bash
//! loadfixtures --manifest loadfixtures.toml
//! loadfixtures -a library --dry-run
//! loadfixtures -f library_book -e library_author --database replica
//! ```

mod output;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use reinhardt_loadfixtures::catalog::EntityCatalog;
use reinhardt_loadfixtures::command::{
	LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions,
};
use reinhardt_loadfixtures::error::LoadFixturesResult;
use reinhardt_loadfixtures::fixtures::{FixtureFormat, JsonStore};
use reinhardt_loadfixtures::settings::ProjectManifest;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "loadfixtures")]
#[command(about = "Load fixtures of every installed model in relation order", long_about = None)]
#[command(version)]
struct Cli {
	/// Only load the given fixture label (can be repeated)
	#[arg(short = 'f', long = "fixture", value_name = "LABEL")]
	fixtures: Vec<String>,

	/// Only load fixtures of the given app (can be repeated)
	#[arg(short = 'a', long = "app", value_name = "APP_LABEL")]
	apps: Vec<String>,

	/// Leave out a fixture, model or app label (can be repeated)
	#[arg(short = 'e', long = "exclude", value_name = "LABEL")]
	exclude: Vec<String>,

	/// Load every fixture into this database instead of the routed one
	#[arg(long, value_name = "DATABASE")]
	database: Option<String>,

	/// Ignore fields that no longer exist on the model
	#[arg(short = 'i', long = "ignorenonexistent")]
	ignore_nonexistent: bool,

	/// Format of every fixture file (json, yaml)
	#[arg(long, value_name = "FORMAT")]
	format: Option<FixtureFormat>,

	/// Only print what would be loaded
	#[arg(long)]
	dry_run: bool,

	/// Path to the project manifest
	#[arg(long, value_name = "PATH", default_value = "loadfixtures.toml")]
	manifest: PathBuf,

	/// Print the level graph before running
	#[arg(long)]
	show_graph: bool,

	/// Verbosity level (can be repeated)
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbosity: u8,
}

impl Cli {
	fn args(&self) -> LoadFixturesArgs {
		LoadFixturesArgs {
			fixtures: self.fixtures.clone(),
			app_labels: self.apps.clone(),
			exclude: self.exclude.clone(),
		}
	}

	fn options(&self, manifest: &ProjectManifest) -> LoadFixturesOptions {
		let mut options = LoadFixturesOptions::new()
			.with_fixture_dirs(manifest.settings.fixture_dirs.iter().cloned())
			.with_ignore_nonexistent(self.ignore_nonexistent)
			.with_dry_run(self.dry_run)
			.with_verbosity(self.verbosity);
		if let Some(database) = &self.database {
			options = options.with_database(database.clone());
		}
		if let Some(format) = self.format {
			options = options.with_format(format);
		}
		options
	}
}

/// Maps `-v` occurrences to a log filter.
fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

fn init_tracing(verbosity: u8) {
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.init();
}

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	init_tracing(cli.verbosity);

	if let Err(e) = run(cli).await {
		eprintln!("{} {}", "Error:".red().bold(), e);
		process::exit(1);
	}
}

/// Wires the manifest's catalog, router and JSON store into a command.
fn build_command(manifest: &ProjectManifest) -> LoadFixturesResult<LoadFixturesCommand> {
	let catalog: Arc<dyn EntityCatalog> = Arc::new(manifest.to_catalog()?);
	let router = Arc::new(manifest.settings.router());
	let store = Arc::new(JsonStore::new(
		manifest.settings.store_root.clone(),
		catalog.clone(),
	));
	Ok(LoadFixturesCommand::new(catalog, router, store))
}

async fn run(cli: Cli) -> LoadFixturesResult<()> {
	let manifest = ProjectManifest::from_file(&cli.manifest)?;
	let command = build_command(&manifest)?;
	tracing::debug!(command = command.name(), manifest = %cli.manifest.display(), "running");

	// The graph is shown even when loading fails below.
	let graph = command.plan(&cli.args())?;
	if cli.show_graph {
		output::print_graph(&graph);
	}
	let report = command.run(&graph, &cli.options(&manifest)).await?;
	output::print_report(&report, cli.verbosity);
	Ok(())
}
