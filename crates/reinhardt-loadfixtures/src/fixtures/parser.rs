//! Fixture parsing functionality.
//!
//! This module handles parsing of fixture files in JSON and YAML formats.

use std::path::Path;

use super::{FixtureData, FixtureFormat, FixtureRecord};
use crate::error::{SeedingError, SeedingResult};

/// Parser for fixture files.
///
/// Supports both JSON and YAML formats (YAML requires the `yaml` feature).
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureParser;

impl FixtureParser {
	/// Creates a new fixture parser.
	pub fn new() -> Self {
		Self
	}

	/// Parses a fixture file.
	///
	/// `format` overrides detection from the file extension.
	///
	/// # Errors
	///
	/// Returns an error if:
	/// - No format is given and the extension is not recognized
	/// - The file cannot be read
	/// - The file content is invalid
	pub fn parse_file(
		&self,
		path: &Path,
		format: Option<FixtureFormat>,
	) -> SeedingResult<FixtureData> {
		let format = format
			.or_else(|| FixtureFormat::from_path(path))
			.ok_or_else(|| SeedingError::UnsupportedFormat(path.display().to_string()))?;

		let content = std::fs::read_to_string(path).map_err(|e| {
			if e.kind() == std::io::ErrorKind::NotFound {
				SeedingError::FileNotFound(path.display().to_string())
			} else {
				SeedingError::IoError(e)
			}
		})?;

		let mut data = self.parse_string(&content, format)?;
		data.source = Some(path.display().to_string());
		Ok(data)
	}

	/// Parses fixture data from a string.
	pub fn parse_string(&self, content: &str, format: FixtureFormat) -> SeedingResult<FixtureData> {
		let records = match format {
			FixtureFormat::Json => self.parse_json(content)?,
			FixtureFormat::Yaml => self.parse_yaml(content)?,
		};

		Ok(FixtureData::from_records(records, format))
	}

	fn parse_json(&self, content: &str) -> SeedingResult<Vec<FixtureRecord>> {
		let value: serde_json::Value = serde_json::from_str(content)?;

		match value {
			serde_json::Value::Array(arr) => {
				let mut records = Vec::with_capacity(arr.len());
				for (idx, item) in arr.into_iter().enumerate() {
					let record: FixtureRecord = serde_json::from_value(item).map_err(|e| {
						SeedingError::ParseError(format!("Invalid record at index {}: {}", idx, e))
					})?;
					self.validate_record(&record)?;
					records.push(record);
				}
				Ok(records)
			}
			serde_json::Value::Object(_) => {
				let record: FixtureRecord = serde_json::from_value(value)?;
				self.validate_record(&record)?;
				Ok(vec![record])
			}
			_ => Err(SeedingError::ParseError(
				"Expected array or object".to_string(),
			)),
		}
	}

	#[cfg(feature = "yaml")]
	fn parse_yaml(&self, content: &str) -> SeedingResult<Vec<FixtureRecord>> {
		let value: serde_yaml::Value = serde_yaml::from_str(content)?;

		match value {
			serde_yaml::Value::Sequence(seq) => {
				let mut records = Vec::with_capacity(seq.len());
				for (idx, item) in seq.into_iter().enumerate() {
					let record: FixtureRecord = serde_yaml::from_value(item).map_err(|e| {
						SeedingError::ParseError(format!("Invalid record at index {}: {}", idx, e))
					})?;
					self.validate_record(&record)?;
					records.push(record);
				}
				Ok(records)
			}
			serde_yaml::Value::Mapping(_) => {
				let record: FixtureRecord = serde_yaml::from_value(value)?;
				self.validate_record(&record)?;
				Ok(vec![record])
			}
			_ => Err(SeedingError::ParseError(
				"Expected sequence or mapping".to_string(),
			)),
		}
	}

	#[cfg(not(feature = "yaml"))]
	fn parse_yaml(&self, _content: &str) -> SeedingResult<Vec<FixtureRecord>> {
		Err(SeedingError::UnsupportedFormat(
			"YAML support requires the 'yaml' feature".to_string(),
		))
	}

	fn validate_record(&self, record: &FixtureRecord) -> SeedingResult<()> {
		if !record.model.contains('.') {
			return Err(SeedingError::ValidationError {
				field: "model".to_string(),
				message: format!(
					"Model identifier '{}' must be in 'app.Model' format",
					record.model
				),
			});
		}

		if !record.fields.is_object() {
			return Err(SeedingError::ValidationError {
				field: "fields".to_string(),
				message: "Fields must be a JSON object".to_string(),
			});
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[rstest]
	fn test_parse_json_array() {
		let parser = FixtureParser::new();
		let content = r#"[
            {"model": "library.Author", "pk": 1, "fields": {"name": "Herbert"}},
            {"model": "library.Author", "pk": 2, "fields": {"name": "Le Guin"}}
        ]"#;

		let data = parser.parse_string(content, FixtureFormat::Json).unwrap();
		assert_eq!(data.len(), 2);
		assert_eq!(data.records[0].model, "library.Author");
		assert_eq!(data.records[0].pk, Some(serde_json::json!(1)));
	}

	#[rstest]
	fn test_parse_json_single_object() {
		let parser = FixtureParser::new();
		let content = r#"{"model": "library.Author", "fields": {"name": "Herbert"}}"#;

		let data = parser.parse_string(content, FixtureFormat::Json).unwrap();
		assert_eq!(data.len(), 1);
		assert!(data.records[0].pk.is_none());
	}

	#[rstest]
	fn test_parse_invalid_model_format() {
		let parser = FixtureParser::new();
		let content = r#"[{"model": "Author", "fields": {}}]"#;

		let result = parser.parse_string(content, FixtureFormat::Json);
		assert!(matches!(
			result,
			Err(SeedingError::ValidationError { ref field, .. }) if field == "model"
		));
	}

	#[rstest]
	fn test_parse_invalid_fields_type() {
		let parser = FixtureParser::new();
		let content = r#"[{"model": "library.Author", "fields": "not an object"}]"#;

		assert!(parser.parse_string(content, FixtureFormat::Json).is_err());
	}

	#[rstest]
	fn test_parse_file_with_format_hint() {
		let parser = FixtureParser::new();
		let mut file = NamedTempFile::with_suffix(".data").unwrap();
		writeln!(file, r#"[{{"model": "library.Author", "fields": {{}}}}]"#).unwrap();

		assert!(matches!(
			parser.parse_file(file.path(), None),
			Err(SeedingError::UnsupportedFormat(_))
		));
		let data = parser
			.parse_file(file.path(), Some(FixtureFormat::Json))
			.unwrap();
		assert_eq!(data.len(), 1);
		assert!(data.source.is_some());
	}

	#[rstest]
	fn test_parse_file_not_found() {
		let parser = FixtureParser::new();
		let result = parser.parse_file(Path::new("/nonexistent/library_author.json"), None);
		assert!(matches!(result, Err(SeedingError::FileNotFound(_))));
	}

	#[cfg(feature = "yaml")]
	#[rstest]
	fn test_parse_yaml() {
		let parser = FixtureParser::new();
		let content = r#"
- model: library.Author
  pk: 1
  fields:
    name: Herbert
- model: library.Author
  pk: 2
  fields:
    name: Le Guin
"#;

		let data = parser.parse_string(content, FixtureFormat::Yaml).unwrap();
		assert_eq!(data.len(), 2);
	}
}
