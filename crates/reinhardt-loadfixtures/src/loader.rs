//! The file-load primitive.
//!
//! The engine decides *which* files are loaded and *where*; a
//! [`FixtureLoader`] does the actual work of installing one file into one
//! database. [`JsonStore`](crate::fixtures::JsonStore) is the bundled
//! implementation.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SeedingResult;
use crate::fixtures::FixtureFormat;

/// Options forwarded unchanged to the loader for every file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
	/// Drop fields that the model does not declare instead of failing.
	pub ignore_nonexistent: bool,

	/// Parse every file as this format instead of guessing from its extension.
	pub format: Option<FixtureFormat>,
}

impl LoadOptions {
	/// Creates default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the ignore-nonexistent flag.
	pub fn with_ignore_nonexistent(mut self, ignore: bool) -> Self {
		self.ignore_nonexistent = ignore;
		self
	}

	/// Sets the format hint.
	pub fn with_format(mut self, format: FixtureFormat) -> Self {
		self.format = Some(format);
		self
	}
}

/// Installs a fixture file into a database.
///
/// # Example
///
/// ```ignore
/// struct CountingLoader;
///
/// #[async_trait]
/// impl FixtureLoader for CountingLoader {
///     async fn load(&self, path: &Path, database: &str, _options: &LoadOptions) -> SeedingResult<usize> {
///         println!("{} -> {}", path.display(), database);
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait FixtureLoader: Send + Sync {
	/// Loads one file and returns the number of objects installed.
	async fn load(
		&self,
		path: &Path,
		database: &str,
		options: &LoadOptions,
	) -> SeedingResult<usize>;
}
