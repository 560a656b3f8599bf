//! Fixture format definitions.
//!
//! This module defines the data structures for Django-compatible fixture format.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SeedingError;

/// Django-compatible fixture record.
///
/// Each record represents a single model instance with its field values.
///
/// # Example
///
/// ```json
/// {
///   "model": "library.Book",
///   "pk": 1,
///   "fields": {
///     "title": "Dune",
///     "author": 1
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FixtureRecord {
	/// Model identifier in format "app.Model" (e.g., "library.Book").
	pub model: String,

	/// Primary key value. Optional for auto-increment fields.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pk: Option<Value>,

	/// Field values as a JSON object.
	pub fields: Value,
}

/// Supported fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum FixtureFormat {
	/// JSON format (default).
	#[default]
	Json,

	/// YAML format (requires `yaml` feature).
	Yaml,
}

impl FixtureFormat {
	/// Determines the fixture format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_loadfixtures::fixtures::FixtureFormat;
	/// assert_eq!(FixtureFormat::from_extension("json"), Some(FixtureFormat::Json));
	/// assert_eq!(FixtureFormat::from_extension("yml"), Some(FixtureFormat::Yaml));
	/// assert_eq!(FixtureFormat::from_extension("xml"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			_ => None,
		}
	}

	/// Determines the fixture format from the last extension of a path.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// Returns the default file extension for this format.
	pub fn extension(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
		}
	}
}

impl FromStr for FixtureFormat {
	type Err = SeedingError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_extension(s).ok_or_else(|| SeedingError::UnsupportedFormat(s.to_string()))
	}
}

impl fmt::Display for FixtureFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Json => write!(f, "JSON"),
			Self::Yaml => write!(f, "YAML"),
		}
	}
}

/// Parsed fixture data containing multiple records.
#[derive(Debug, Clone)]
pub struct FixtureData {
	/// Collection of fixture records.
	pub records: Vec<FixtureRecord>,

	/// Format the data was parsed from.
	pub format: FixtureFormat,

	/// Optional source file path.
	pub source: Option<String>,
}

impl FixtureData {
	/// Creates fixture data from a vector of records.
	pub fn from_records(records: Vec<FixtureRecord>, format: FixtureFormat) -> Self {
		Self {
			records,
			format,
			source: None,
		}
	}

	/// Returns the number of records.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns true if there are no records.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}
}

impl IntoIterator for FixtureData {
	type Item = FixtureRecord;
	type IntoIter = std::vec::IntoIter<FixtureRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.records.into_iter()
	}
}
