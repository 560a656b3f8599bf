//! Dependency-ordered fixture loading for the Reinhardt framework.
//!
//! `loadfixtures` finds the fixture files of every installed model and loads
//! them in an order where related rows always exist first:
//!
//! - **Level graph**: models are grouped by their depth in the forward
//!   relation graph (one-to-one and many-to-one fields)
//! - **Join tables**: many-to-many fields without an explicit intermediate
//!   model get a join entry one level above both endpoints
//! - **Filtering**: restrict a run to fixtures or apps, or exclude fixture,
//!   model or app labels
//! - **Dry run**: print what would be loaded, and where, without loading
//!
//! # Features
//!
//! - `json` - JSON fixture format support (enabled by default)
//! - `yaml` - YAML fixture format support
//! - `full` - All features enabled
//!
//! # Quick Start
//!
//! Fixture files are named after the model's fixture label, i.e. the
//! lowercased model label with `.` replaced by `_`: the fixtures of
//! `library.Book` live in files such as `fixtures/library_book.json` or
//! `library/fixtures/library_book.initial.json`.
//!
//! ```ignore
//! use std::sync::Arc;
//! use reinhardt_loadfixtures::prelude::*;
//!
//! let manifest = ProjectManifest::from_file("loadfixtures.toml")?;
//! let catalog: Arc<dyn EntityCatalog> = Arc::new(manifest.to_catalog()?);
//! let store = Arc::new(JsonStore::new(&manifest.settings.store_root, catalog.clone()));
//! let command = LoadFixturesCommand::new(catalog, Arc::new(manifest.settings.router()), store);
//!
//! let options = LoadFixturesOptions::new()
//!     .with_fixture_dirs(manifest.settings.fixture_dirs.clone())
//!     .with_dry_run(true);
//! let outcome = command.execute(LoadFixturesArgs::default(), options).await?;
//! ```
//!
//! # Architecture
//!
//! - [`ModelCatalog`](catalog::ModelCatalog) - Installed apps and models
//! - [`GraphBuilder`](graph::GraphBuilder) - Builds the [`LevelGraph`](graph::LevelGraph)
//! - [`FilterPolicy`](filter::FilterPolicy) - Inclusion and exclusion rules
//! - [`FixtureResolver`](resolver::FixtureResolver) - Finds fixture files on disk
//! - [`StoreRouter`](router::StoreRouter) - Picks the database of a model
//! - [`FixtureLoader`](loader::FixtureLoader) - Installs one fixture file
//! - [`LoadEngine`](engine::LoadEngine) - Walks the graph level by level
//! - [`LoadFixturesCommand`](command::LoadFixturesCommand) - The management command

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod catalog;
pub mod command;
pub mod engine;
pub mod error;
pub mod filter;
pub mod fixtures;
pub mod graph;
pub mod loader;
pub mod prelude;
pub mod resolver;
pub mod router;
pub mod settings;

// Re-export commonly used types at crate root
pub use catalog::{EntityCatalog, FieldInfo, ModelCatalog, ModelInfo, RelationKind};
pub use command::{CommandOutcome, LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions};
pub use engine::{DryRunEntry, LoadEngine, RunOptions, RunReport};
pub use error::{LoadFixturesError, LoadFixturesResult, SeedingError, SeedingResult};
pub use graph::{GraphBuilder, LevelGraph, ModelDescriptor};
pub use loader::{FixtureLoader, LoadOptions};
