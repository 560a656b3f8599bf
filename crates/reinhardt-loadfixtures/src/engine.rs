//! Level-ordered fixture loading.
//!
//! The engine walks a [`LevelGraph`] from level 0 upwards. Every level is
//! fully loaded before the next one starts, so a model's fixtures are
//! installed after the fixtures of every model it relates to.

use std::fmt;
use std::path::PathBuf;

use crate::catalog::EntityCatalog;
use crate::error::{LoadFixturesError, LoadFixturesResult};
use crate::graph::{LevelGraph, ModelDescriptor};
use crate::loader::{FixtureLoader, LoadOptions};
use crate::resolver::FixtureResolver;
use crate::router::StoreRouter;

/// Options of one loading run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
	/// Database every fixture is written to. Routed per model when unset.
	pub database: Option<String>,

	/// Print what would be loaded instead of loading it.
	pub dry_run: bool,

	/// Forwarded unchanged to the loader.
	pub load_options: LoadOptions,

	/// Globally configured fixture directories.
	pub fixture_dirs: Vec<PathBuf>,
}

impl RunOptions {
	/// Returns a resolver searching the configured fixture directories.
	pub fn resolver(&self) -> FixtureResolver {
		FixtureResolver::new(self.fixture_dirs.iter().cloned())
	}
}

/// What a dry run would have loaded for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DryRunEntry {
	/// App label of the model.
	pub app_label: String,
	/// `app.Model` label.
	pub model_label: String,
	/// Database the fixtures would be written to.
	pub database: String,
	/// Fixture files in load order.
	pub fixtures: Vec<PathBuf>,
}

impl fmt::Display for DryRunEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(f, "App: {}", self.app_label)?;
		writeln!(f, "Model: {}", self.model_label)?;
		writeln!(f, "Database: {}", self.database)?;
		writeln!(f, "Fixture(s):")?;
		for fixture in &self.fixtures {
			writeln!(f, "{}", fixture.display())?;
		}
		Ok(())
	}
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
	/// The graph had no model left after filtering.
	NothingToLoad,

	/// Fixtures were installed.
	Loaded {
		/// Number of fixture files loaded.
		fixtures_loaded: usize,
		/// Number of objects the loader reported.
		objects_loaded: usize,
	},

	/// Nothing was installed; one entry per model that has fixture files.
	DryRun(Vec<DryRunEntry>),
}

/// Drives the resolver, the router and the loader over a level graph.
pub struct LoadEngine<'a> {
	resolver: &'a FixtureResolver,
	router: &'a dyn StoreRouter,
	loader: &'a dyn FixtureLoader,
	catalog: &'a dyn EntityCatalog,
}

impl<'a> LoadEngine<'a> {
	/// Creates an engine.
	pub fn new(
		resolver: &'a FixtureResolver,
		router: &'a dyn StoreRouter,
		loader: &'a dyn FixtureLoader,
		catalog: &'a dyn EntityCatalog,
	) -> Self {
		Self {
			resolver,
			router,
			loader,
			catalog,
		}
	}

	/// Loads, or previews with `dry_run`, every model of the graph.
	///
	/// # Errors
	///
	/// The first loader failure aborts the run and is returned as
	/// [`LoadFixturesError::Load`]. Files loaded before it stay loaded.
	pub async fn run(
		&self,
		graph: &LevelGraph,
		options: &RunOptions,
	) -> LoadFixturesResult<RunReport> {
		if graph.is_empty() {
			return Ok(RunReport::NothingToLoad);
		}

		let mut previews = Vec::new();
		let mut fixtures_loaded = 0;
		let mut objects_loaded = 0;

		for (level, descriptors) in graph.levels() {
			tracing::debug!(level, models = descriptors.len(), "loading level");

			for descriptor in descriptors {
				let fixtures = self.fixtures_of(descriptor);
				if fixtures.is_empty() {
					tracing::trace!(model = %descriptor.model_label, "no fixtures found");
					continue;
				}

				let database = options
					.database
					.clone()
					.unwrap_or_else(|| self.router.db_for_write(&descriptor.model_label));

				if options.dry_run {
					previews.push(DryRunEntry {
						app_label: descriptor.app_label.clone(),
						model_label: descriptor.model_label.clone(),
						database,
						fixtures,
					});
					continue;
				}

				for path in fixtures {
					let count = self
						.loader
						.load(&path, &database, &options.load_options)
						.await
						.map_err(|source| LoadFixturesError::Load {
							path: path.clone(),
							source,
						})?;
					tracing::info!(
						fixture = %path.display(),
						database = %database,
						objects = count,
						"installed fixture"
					);
					fixtures_loaded += 1;
					objects_loaded += count;
				}
			}
		}

		if options.dry_run {
			Ok(RunReport::DryRun(previews))
		} else {
			Ok(RunReport::Loaded {
				fixtures_loaded,
				objects_loaded,
			})
		}
	}

	fn fixtures_of(&self, descriptor: &ModelDescriptor) -> Vec<PathBuf> {
		let app_path = self.catalog.app_path(&descriptor.app_label);
		self.resolver
			.resolve(descriptor, app_path)
			.into_iter()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::{FieldInfo, ModelCatalog, ModelInfo};
	use crate::error::{SeedingError, SeedingResult};
	use crate::filter::FilterPolicy;
	use crate::graph::GraphBuilder;
	use crate::router::{DefaultRouter, RoutingTable};
	use async_trait::async_trait;
	use rstest::rstest;
	use std::fs;
	use std::path::Path;
	use std::sync::Mutex;
	use tempfile::TempDir;

	/// Records every call; fails on files whose name contains `broken`.
	#[derive(Default)]
	struct RecordingLoader {
		calls: Mutex<Vec<(PathBuf, String)>>,
	}

	impl RecordingLoader {
		fn calls(&self) -> Vec<(PathBuf, String)> {
			self.calls.lock().unwrap().clone()
		}
	}

	#[async_trait]
	impl FixtureLoader for RecordingLoader {
		async fn load(
			&self,
			path: &Path,
			database: &str,
			_options: &LoadOptions,
		) -> SeedingResult<usize> {
			if path.to_string_lossy().contains("broken") {
				return Err(SeedingError::ParseError("broken fixture".to_string()));
			}
			self.calls
				.lock()
				.unwrap()
				.push((path.to_path_buf(), database.to_string()));
			Ok(3)
		}
	}

	fn library() -> ModelCatalog {
		let mut catalog = ModelCatalog::new();
		catalog.register_model(ModelInfo::new("library", "Author")).unwrap();
		catalog
			.register_model(
				ModelInfo::new("library", "Book").with_field(FieldInfo::foreign_key("author", "Author")),
			)
			.unwrap();
		catalog.register_model(ModelInfo::new("shop", "Order")).unwrap();
		catalog
	}

	fn touch(dir: &Path, name: &str) -> PathBuf {
		let path = dir.join(name);
		fs::write(&path, "[]").unwrap();
		path
	}

	fn options(dir: &Path) -> RunOptions {
		RunOptions {
			fixture_dirs: vec![dir.to_path_buf()],
			..RunOptions::default()
		}
	}

	#[rstest]
	fn test_dry_run_entry_display() {
		let entry = DryRunEntry {
			app_label: "library".to_string(),
			model_label: "library.Book".to_string(),
			database: "default".to_string(),
			fixtures: vec![PathBuf::from("/fixtures/library_book.json")],
		};
		assert_eq!(
			entry.to_string(),
			"App: library\nModel: library.Book\nDatabase: default\nFixture(s):\n/fixtures/library_book.json\n"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_empty_graph_reports_nothing_to_load() {
		let catalog = ModelCatalog::new();
		let graph = LevelGraph::default();
		let resolver = FixtureResolver::default();
		let router = DefaultRouter::default();
		let loader = RecordingLoader::default();

		let report = LoadEngine::new(&resolver, &router, &loader, &catalog)
			.run(&graph, &RunOptions::default())
			.await
			.unwrap();
		assert_eq!(report, RunReport::NothingToLoad);
	}

	#[rstest]
	#[tokio::test]
	async fn test_loads_in_level_order() {
		let dir = TempDir::new().unwrap();
		let book = touch(dir.path(), "library_book.json");
		let author_b = touch(dir.path(), "library_author.b.json");
		let author_a = touch(dir.path(), "library_author.a.json");

		let catalog = library();
		let policy = FilterPolicy::new();
		let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();
		let options = options(dir.path());
		let resolver = options.resolver();
		let router = DefaultRouter::default();
		let loader = RecordingLoader::default();

		let report = LoadEngine::new(&resolver, &router, &loader, &catalog)
			.run(&graph, &options)
			.await
			.unwrap();

		assert_eq!(
			report,
			RunReport::Loaded {
				fixtures_loaded: 3,
				objects_loaded: 9
			}
		);
		let paths: Vec<PathBuf> = loader.calls().into_iter().map(|(p, _)| p).collect();
		assert_eq!(paths, vec![author_a, author_b, book]);
	}

	#[rstest]
	#[tokio::test]
	async fn test_dry_run_never_calls_loader() {
		let dir = TempDir::new().unwrap();
		let author = touch(dir.path(), "library_author.json");

		let catalog = library();
		let policy = FilterPolicy::new();
		let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();
		let options = RunOptions {
			dry_run: true,
			..options(dir.path())
		};
		let resolver = options.resolver();
		let router = DefaultRouter::default();
		let loader = RecordingLoader::default();

		let report = LoadEngine::new(&resolver, &router, &loader, &catalog)
			.run(&graph, &options)
			.await
			.unwrap();

		assert!(loader.calls().is_empty());
		let RunReport::DryRun(entries) = report else {
			panic!("expected a dry run report");
		};
		assert_eq!(entries.len(), 1);
		assert_eq!(entries[0].model_label, "library.Author");
		assert_eq!(entries[0].database, "default");
		assert_eq!(entries[0].fixtures, vec![author.clone()]);
		assert_eq!(
			entries[0].to_string(),
			format!(
				"App: library\nModel: library.Author\nDatabase: default\nFixture(s):\n{}\n",
				author.display()
			)
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_failure_aborts_before_later_levels() {
		let dir = TempDir::new().unwrap();
		let broken = touch(dir.path(), "library_author.broken.json");
		touch(dir.path(), "library_book.json");

		let catalog = library();
		let policy = FilterPolicy::new();
		let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();
		let options = options(dir.path());
		let resolver = options.resolver();
		let router = DefaultRouter::default();
		let loader = RecordingLoader::default();

		let result = LoadEngine::new(&resolver, &router, &loader, &catalog)
			.run(&graph, &options)
			.await;

		match result {
			Err(LoadFixturesError::Load { path, .. }) => assert_eq!(path, broken),
			other => panic!("expected a load error, got {:?}", other),
		}
		assert!(
			loader
				.calls()
				.iter()
				.all(|(path, _)| !path.ends_with("library_book.json"))
		);
	}

	#[rstest]
	#[case(None, vec!["default", "orders"])]
	#[case(Some("replica"), vec!["replica", "replica"])]
	#[tokio::test]
	async fn test_database_override_and_routing(
		#[case] database: Option<&str>,
		#[case] expected: Vec<&str>,
	) {
		let dir = TempDir::new().unwrap();
		touch(dir.path(), "library_author.json");
		touch(dir.path(), "shop_order.json");

		let catalog = library();
		let policy = FilterPolicy::new();
		let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();
		let options = RunOptions {
			database: database.map(str::to_string),
			..options(dir.path())
		};
		let resolver = options.resolver();
		let router = RoutingTable::new("default").with_route("shop", "orders");
		let loader = RecordingLoader::default();

		LoadEngine::new(&resolver, &router, &loader, &catalog)
			.run(&graph, &options)
			.await
			.unwrap();

		let databases: Vec<String> = loader.calls().into_iter().map(|(_, db)| db).collect();
		assert_eq!(databases, expected);
	}
}
