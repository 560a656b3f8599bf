//! A loader that records its calls instead of installing anything.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use reinhardt_loadfixtures::error::{SeedingError, SeedingResult};
use reinhardt_loadfixtures::loader::{FixtureLoader, LoadOptions};

/// One recorded `load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCall {
	pub path: PathBuf,
	pub database: String,
	pub options: LoadOptions,
}

/// Records every call; fails on any file whose name contains `fail_on`.
#[derive(Default)]
pub struct RecordingLoader {
	calls: Mutex<Vec<LoadCall>>,
	fail_on: Option<String>,
}

impl RecordingLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing_on(marker: impl Into<String>) -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			fail_on: Some(marker.into()),
		}
	}

	pub fn calls(&self) -> Vec<LoadCall> {
		self.calls.lock().unwrap().clone()
	}
}

#[async_trait]
impl FixtureLoader for RecordingLoader {
	async fn load(
		&self,
		path: &Path,
		database: &str,
		options: &LoadOptions,
	) -> SeedingResult<usize> {
		if let Some(marker) = &self.fail_on
			&& path.to_string_lossy().contains(marker.as_str())
		{
			return Err(SeedingError::ParseError(format!(
				"refusing {}",
				path.display()
			)));
		}
		self.calls.lock().unwrap().push(LoadCall {
			path: path.to_path_buf(),
			database: database.to_string(),
			options: *options,
		});
		Ok(1)
	}
}
