//! loadfixtures command implementation.
//!
//! This command finds the fixture files of every installed model and loads
//! them level by level, so that related rows always exist first.

use std::path::PathBuf;
use std::sync::Arc;

use crate::catalog::EntityCatalog;
use crate::engine::{LoadEngine, RunOptions, RunReport};
use crate::error::LoadFixturesResult;
use crate::filter::FilterPolicy;
use crate::fixtures::FixtureFormat;
use crate::graph::{GraphBuilder, LevelGraph};
use crate::loader::{FixtureLoader, LoadOptions};
use crate::router::StoreRouter;

/// Arguments for the loadfixtures command.
#[derive(Debug, Clone, Default)]
pub struct LoadFixturesArgs {
	/// Only load these fixture labels.
	pub fixtures: Vec<String>,

	/// Only load models of these apps.
	pub app_labels: Vec<String>,

	/// Fixture, model or app labels to leave out.
	pub exclude: Vec<String>,
}

impl LoadFixturesArgs {
	fn policy(&self) -> FilterPolicy {
		FilterPolicy::new()
			.with_fixtures(self.fixtures.iter().cloned())
			.with_app_labels(self.app_labels.iter().cloned())
			.with_exclude(self.exclude.iter().cloned())
	}
}

/// Options for the loadfixtures command.
#[derive(Debug, Clone, Default)]
pub struct LoadFixturesOptions {
	/// Database alias to load every fixture into.
	pub database: Option<String>,

	/// Ignore fields that no longer exist on the model.
	pub ignore_nonexistent: bool,

	/// Format of every fixture file.
	pub format: Option<FixtureFormat>,

	/// Only print what would be loaded.
	pub dry_run: bool,

	/// Directories searched for every model.
	pub fixture_dirs: Vec<PathBuf>,

	/// Verbosity level. Above 1 every level is logged before loading.
	pub verbosity: u8,
}

impl LoadFixturesOptions {
	/// Creates new default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets database alias.
	pub fn with_database(mut self, db: impl Into<String>) -> Self {
		self.database = Some(db.into());
		self
	}

	/// Sets ignore nonexistent flag.
	pub fn with_ignore_nonexistent(mut self, ignore: bool) -> Self {
		self.ignore_nonexistent = ignore;
		self
	}

	/// Sets the fixture format.
	pub fn with_format(mut self, format: FixtureFormat) -> Self {
		self.format = Some(format);
		self
	}

	/// Sets dry run flag.
	pub fn with_dry_run(mut self, dry_run: bool) -> Self {
		self.dry_run = dry_run;
		self
	}

	/// Sets the fixture directories.
	pub fn with_fixture_dirs<I, P>(mut self, dirs: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		self.fixture_dirs = dirs.into_iter().map(Into::into).collect();
		self
	}

	/// Sets verbosity level.
	pub fn with_verbosity(mut self, level: u8) -> Self {
		self.verbosity = level;
		self
	}

	fn run_options(&self) -> RunOptions {
		RunOptions {
			database: self.database.clone(),
			dry_run: self.dry_run,
			load_options: LoadOptions {
				ignore_nonexistent: self.ignore_nonexistent,
				format: self.format,
			},
			fixture_dirs: self.fixture_dirs.clone(),
		}
	}
}

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
	/// The level graph the run walked.
	pub graph: LevelGraph,

	/// What the run did.
	pub report: RunReport,
}

/// The loadfixtures command.
///
/// # Example
///
/// ```ignore
/// let catalog: Arc<dyn EntityCatalog> = Arc::new(catalog);
/// let store = Arc::new(JsonStore::new(".loadfixtures", catalog.clone()));
/// let command = LoadFixturesCommand::new(catalog, Arc::new(DefaultRouter::default()), store);
///
/// let args = LoadFixturesArgs {
///     app_labels: vec!["library".to_string()],
///     ..Default::default()
/// };
/// let options = LoadFixturesOptions::new().with_fixture_dirs(["fixtures"]);
/// let outcome = command.execute(args, options).await?;
/// ```
#[derive(Clone)]
pub struct LoadFixturesCommand {
	catalog: Arc<dyn EntityCatalog>,
	router: Arc<dyn StoreRouter>,
	loader: Arc<dyn FixtureLoader>,
}

impl LoadFixturesCommand {
	/// Creates a new loadfixtures command.
	pub fn new(
		catalog: Arc<dyn EntityCatalog>,
		router: Arc<dyn StoreRouter>,
		loader: Arc<dyn FixtureLoader>,
	) -> Self {
		Self {
			catalog,
			router,
			loader,
		}
	}

	/// Returns the command name.
	pub fn name(&self) -> &str {
		"loadfixtures"
	}

	/// Returns the command description.
	pub fn description(&self) -> &str {
		"Loads the fixtures of every installed model in relation order"
	}

	/// Returns the command help text.
	pub fn help(&self) -> &str {
		r#"
Usage: loadfixtures [options]

Finds the fixtures of every installed model and loads them level by level.
Models without relations load first, models relating to them next.

Options:
  --fixture, -f LABEL      Only load the given fixture label(s)
  --app, -a LABEL          Only load fixtures of the given app(s)
  --exclude, -e LABEL      Leave out a fixture, model or app label
  --database DB            Load every fixture into this database
  --ignorenonexistent, -i  Ignore fields that no longer exist on the model
  --format FORMAT          Format of the fixture files (json, yaml)
  --dry-run                Only print what would be loaded
"#
	}

	/// Checks the arguments and builds the level graph of a run.
	///
	/// The filter is checked against the catalog before the graph is built,
	/// and requested fixtures are checked against the graph after. Nothing is
	/// loaded here.
	pub fn plan(&self, args: &LoadFixturesArgs) -> LoadFixturesResult<LevelGraph> {
		let policy = args.policy();
		policy.validate_before_build(self.catalog.as_ref())?;

		let graph = GraphBuilder::new(self.catalog.as_ref(), &policy).build()?;
		policy.validate_after_build(&graph)?;

		tracing::debug!(models = graph.len(), "built level graph");
		Ok(graph)
	}

	/// Loads, or previews, the fixtures of a planned graph.
	pub async fn run(
		&self,
		graph: &LevelGraph,
		options: &LoadFixturesOptions,
	) -> LoadFixturesResult<RunReport> {
		if options.verbosity > 1 {
			for (level, descriptors) in graph.levels() {
				let models: Vec<&str> = descriptors
					.iter()
					.map(|descriptor| descriptor.model_label.as_str())
					.collect();
				tracing::info!(level, ?models, "load level");
			}
		}

		let run_options = options.run_options();
		let resolver = run_options.resolver();
		let engine = LoadEngine::new(
			&resolver,
			self.router.as_ref(),
			self.loader.as_ref(),
			self.catalog.as_ref(),
		);
		engine.run(graph, &run_options).await
	}

	/// Executes the loadfixtures command: [`plan`](Self::plan), then
	/// [`run`](Self::run).
	pub async fn execute(
		&self,
		args: LoadFixturesArgs,
		options: LoadFixturesOptions,
	) -> LoadFixturesResult<CommandOutcome> {
		let graph = self.plan(&args)?;
		let report = self.run(&graph, &options).await?;
		Ok(CommandOutcome { graph, report })
	}
}
