//! Discovery of fixture files on disk.
//!
//! Fixture files are named after the model's fixture label followed by any
//! suffix, e.g. `library_book.json` or `library_book.dev.yaml`. The resolver
//! walks the configured fixture directories and the `fixtures` directory of
//! the model's app.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::graph::ModelDescriptor;

/// Finds the fixture files that belong to a model.
#[derive(Debug, Clone, Default)]
pub struct FixtureResolver {
	fixture_dirs: Vec<PathBuf>,
}

impl FixtureResolver {
	/// Creates a resolver searching the given directories for every model.
	pub fn new<I, P>(fixture_dirs: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		Self {
			fixture_dirs: fixture_dirs.into_iter().map(Into::into).collect(),
		}
	}

	/// Builds the pattern a fixture path must fully match.
	///
	/// The label is followed by a dot and a suffix without path separators,
	/// so `shop_order` never matches `shop_order_item.json`.
	pub fn pattern(fixture_label: &str) -> Regex {
		let pattern = format!(r"^.*/{}\.[^/]+$", regex::escape(fixture_label));
		// The label is escaped, so the pattern is always valid.
		Regex::new(&pattern).expect("Invalid fixture pattern")
	}

	/// Returns the directories searched for a model of the given app.
	pub fn search_dirs(&self, app_path: Option<&Path>) -> BTreeSet<PathBuf> {
		let mut dirs: BTreeSet<PathBuf> = self.fixture_dirs.iter().cloned().collect();
		if let Some(app_path) = app_path {
			dirs.insert(app_path.join("fixtures"));
		}
		dirs
	}

	/// Collects the fixture files of a model.
	///
	/// Missing or unreadable directories are skipped. An empty set means the
	/// model has nothing to load.
	pub fn resolve(
		&self,
		descriptor: &ModelDescriptor,
		app_path: Option<&Path>,
	) -> BTreeSet<PathBuf> {
		let pattern = Self::pattern(&descriptor.fixture_label);
		let mut files = BTreeSet::new();

		for dir in self.search_dirs(app_path) {
			for entry in walkdir::WalkDir::new(&dir)
				.follow_links(true)
				.into_iter()
				.filter_map(|e| e.ok())
			{
				if !entry.file_type().is_file() {
					continue;
				}
				let path = entry.path();
				let Some(match_path) = path.to_str() else {
					tracing::warn!(path = %path.display(), "Skipping fixture path that is not valid UTF-8");
					continue;
				};
				if pattern.is_match(match_path) {
					files.insert(path.to_path_buf());
				}
			}
		}

		tracing::trace!(
			model = %descriptor.model_label,
			count = files.len(),
			"resolved fixture files"
		);
		files
	}
}
