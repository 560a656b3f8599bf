//! Error types for fixture loading.
//!
//! Errors are split by the phase that raises them: caller input is rejected
//! with [`ConfigurationError`] before anything is loaded, a malformed model
//! catalog surfaces as [`GraphError`], and the file-load primitive reports
//! [`SeedingError`], which the engine wraps into [`LoadFixturesError::Load`]
//! together with the offending path.

use std::path::PathBuf;

use thiserror::Error;

/// Invalid caller input, detected before any fixture is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
	/// A requested app label is not registered in the catalog.
	#[error("App '{0}' is either not installed or does not exist.")]
	UnknownApp(String),

	/// An app label is both requested and excluded.
	#[error("App '{0}' can't be in both apps to load and excluded apps.")]
	AppExcluded(String),

	/// A fixture label is both requested and excluded.
	#[error("Fixture '{0}' can't be in fixtures to load and in excluded fixtures.")]
	FixtureExcluded(String),

	/// A requested fixture belongs to an excluded model.
	#[error("Fixture '{fixture}'s model '{model}' is in excluded models.")]
	FixtureModelExcluded {
		/// Requested fixture label.
		fixture: String,
		/// Excluded model label.
		model: String,
	},

	/// A requested fixture belongs to an excluded app.
	#[error("Fixture '{fixture}'s app '{app}' is in excluded apps.")]
	FixtureAppExcluded {
		/// Requested fixture label.
		fixture: String,
		/// Excluded app label.
		app: String,
	},

	/// A requested fixture label matches no discovered model.
	#[error("Fixture '{0}' not found. Does not belong to any model.")]
	UnknownFixture(String),
}

/// The model catalog cannot be turned into a level graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
	/// A relation points at a model that is not registered.
	#[error("Field '{model}.{field}' relates to unregistered model '{target}'")]
	UnknownRelatedModel {
		/// Model label declaring the relation.
		model: String,
		/// Field name of the relation.
		field: String,
		/// Unresolved target label.
		target: String,
	},

	/// Forward relations form a cycle through distinct models.
	#[error("Circular dependency between models: {}", .0.join(" -> "))]
	CircularDependency(Vec<String>),

	/// Two descriptors resolve to the same fixture label.
	#[error("Model '{0}' shares its fixture label with another model")]
	DuplicateModel(String),
}

/// Errors raised by the file-load primitive.
#[derive(Debug, Error)]
pub enum SeedingError {
	/// Model was not found in the catalog.
	#[error("Model not found: {0}")]
	ModelNotFound(String),

	/// A record carries a field the model does not declare.
	#[error("Unknown field '{field}' on model '{model}'")]
	UnknownField {
		/// Model label of the record.
		model: String,
		/// Undeclared field name.
		field: String,
	},

	/// Error parsing fixture data.
	#[error("Parse error: {0}")]
	ParseError(String),

	/// Validation failed for a specific field.
	#[error("Validation error: {field}: {message}")]
	ValidationError {
		/// Field that failed validation.
		field: String,
		/// Validation error message.
		message: String,
	},

	/// I/O operation failed.
	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	JsonError(#[from] serde_json::Error),

	/// YAML serialization/deserialization error (when yaml feature is enabled).
	#[cfg(feature = "yaml")]
	#[error("YAML error: {0}")]
	YamlError(#[from] serde_yaml::Error),

	/// Fixture file not found.
	#[error("Fixture file not found: {0}")]
	FileNotFound(String),

	/// Unsupported file extension or format hint.
	#[error("Unsupported fixture format: {0}")]
	UnsupportedFormat(String),
}

/// The project manifest could not be read.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// Reading the manifest failed.
	#[error("Failed to read {}: {source}", .path.display())]
	Io {
		/// Manifest path.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},

	/// The manifest is not valid TOML for the expected schema.
	#[error("Invalid manifest: {0}")]
	Toml(#[from] toml::de::Error),

	/// The manifest parsed but describes an invalid project.
	#[error("Invalid manifest: {0}")]
	Invalid(String),
}

/// Top-level error returned by the `loadfixtures` command.
#[derive(Debug, Error)]
pub enum LoadFixturesError {
	/// Caller input was rejected.
	#[error(transparent)]
	Configuration(#[from] ConfigurationError),

	/// The catalog could not be ordered.
	#[error(transparent)]
	Graph(#[from] GraphError),

	/// The project manifest was unusable.
	#[error(transparent)]
	Settings(#[from] SettingsError),

	/// The file-load primitive rejected a fixture file.
	#[error("Problem installing fixture '{}': {source}", .path.display())]
	Load {
		/// Fixture file that failed.
		path: PathBuf,
		/// Error reported by the loader.
		#[source]
		source: SeedingError,
	},
}

/// Result type alias for file-load primitive operations.
pub type SeedingResult<T> = Result<T, SeedingError>;

/// Result type alias for `loadfixtures` operations.
pub type LoadFixturesResult<T> = Result<T, LoadFixturesError>;
