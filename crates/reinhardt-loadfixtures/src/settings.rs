//! Project manifest.
//!
//! A project is described by a TOML file listing its settings and its
//! installed apps with their models:
//!
//! ```toml
//! [settings]
//! fixture_dirs = ["fixtures"]
//! default_database = "default"
//! store_root = ".loadfixtures"
//!
//! [settings.routing]
//! analytics = "replica"
//!
//! [[apps]]
//! label = "library"
//! path = "library"
//!
//! [[apps.models]]
//! name = "Book"
//! fields = [
//!   { name = "title" },
//!   { name = "author", relation = "many_to_one", to = "Author" },
//! ]
//! ```
//!
//! Relative paths are resolved against the directory of the manifest.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::{AppConfig, FieldInfo, ModelCatalog, ModelInfo};
use crate::error::SettingsError;
use crate::router::{DEFAULT_DB_ALIAS, RoutingTable};

/// Settings of a loadfixtures project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadFixturesSettings {
	/// Directories searched for the fixtures of every model.
	pub fixture_dirs: Vec<PathBuf>,

	/// Database alias used when no route matches.
	pub default_database: String,

	/// Root directory of the JSON-lines store.
	pub store_root: PathBuf,

	/// App or model label -> database alias.
	pub routing: HashMap<String, String>,
}

impl Default for LoadFixturesSettings {
	fn default() -> Self {
		Self {
			fixture_dirs: Vec::new(),
			default_database: DEFAULT_DB_ALIAS.to_string(),
			store_root: PathBuf::from(".loadfixtures"),
			routing: HashMap::new(),
		}
	}
}

impl LoadFixturesSettings {
	/// Builds the router described by these settings.
	pub fn router(&self) -> RoutingTable {
		RoutingTable::new(self.default_database.clone()).with_routes(self.routing.clone())
	}
}

/// One installed app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
	/// App label.
	pub label: String,

	/// App directory; its `fixtures` subdirectory is searched too.
	#[serde(default)]
	pub path: Option<PathBuf>,

	/// Models of the app, in declaration order.
	#[serde(default)]
	pub models: Vec<ModelManifest>,
}

/// One model of an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
	/// Model name.
	pub name: String,

	/// Declared fields.
	#[serde(default)]
	pub fields: Vec<FieldInfo>,
}

/// A parsed project manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
	/// Project settings.
	#[serde(default)]
	pub settings: LoadFixturesSettings,

	/// Installed apps, in registration order.
	#[serde(default)]
	pub apps: Vec<AppManifest>,
}

impl ProjectManifest {
	/// Loads a manifest from a TOML file.
	///
	/// # Errors
	///
	/// Returns error if the file cannot be read or parsed.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;

		let mut manifest = Self::from_toml(&content)?;
		if let Some(base_dir) = path.parent() {
			manifest.resolve_paths(base_dir);
		}
		tracing::debug!(
			manifest = %path.display(),
			apps = manifest.apps.len(),
			"loaded project manifest"
		);
		Ok(manifest)
	}

	/// Parses a manifest from a TOML string. Paths are left as written.
	pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
		let manifest: Self = toml::from_str(content)?;
		manifest.validate()?;
		Ok(manifest)
	}

	/// Makes every relative path absolute against `base_dir`.
	pub fn resolve_paths(&mut self, base_dir: &Path) {
		let resolve = |path: &mut PathBuf| {
			if path.is_relative() {
				*path = base_dir.join(&*path);
			}
		};

		self.settings.fixture_dirs.iter_mut().for_each(resolve);
		resolve(&mut self.settings.store_root);
		for app in &mut self.apps {
			if let Some(path) = app.path.as_mut() {
				resolve(path);
			}
		}
	}

	/// Builds the model catalog of the project.
	///
	/// # Errors
	///
	/// Returns error when a model is declared twice.
	pub fn to_catalog(&self) -> Result<ModelCatalog, SettingsError> {
		let mut catalog = ModelCatalog::new();
		for app in &self.apps {
			let mut config = AppConfig::new(app.label.clone());
			if let Some(path) = &app.path {
				config = config.with_path(path.clone());
			}
			catalog.register_app(config);

			for model in &app.models {
				let info = model
					.fields
					.iter()
					.cloned()
					.fold(ModelInfo::new(app.label.clone(), model.name.clone()), ModelInfo::with_field);
				catalog
					.register_model(info)
					.map_err(|e| SettingsError::Invalid(e.to_string()))?;
			}
		}
		Ok(catalog)
	}

	fn validate(&self) -> Result<(), SettingsError> {
		if self.settings.default_database.is_empty() {
			return Err(SettingsError::Invalid(
				"default_database must not be empty".to_string(),
			));
		}
		for app in &self.apps {
			if app.label.is_empty() || app.label.contains('.') {
				return Err(SettingsError::Invalid(format!(
					"Invalid app label '{}'",
					app.label
				)));
			}
			for model in &app.models {
				for field in &model.fields {
					if field.relation.is_some() != field.to.is_some() {
						return Err(SettingsError::Invalid(format!(
							"Field '{}.{}.{}' needs both 'relation' and 'to'",
							app.label, model.name, field.name
						)));
					}
				}
			}
		}
		Ok(())
	}
}
