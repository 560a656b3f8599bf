//! Model catalog consumed by the graph builder.
//!
//! The catalog plays the role of Django's app registry for `loadfixtures`:
//! it enumerates installed apps and their models in registration order and
//! exposes each model's field definitions. Only the relation kinds listed in
//! [`RelationKind`] are treated as dependencies; every other field is data.
//!
//! # Example
//!
//! ```
//! use reinhardt_loadfixtures::catalog::{AppConfig, EntityCatalog, FieldInfo, ModelCatalog, ModelInfo};
//!
//! let mut catalog = ModelCatalog::new();
//! catalog.register_app(AppConfig::new("library"));
//! catalog
//!     .register_model(ModelInfo::new("library", "Author").with_field(FieldInfo::new("name")))
//!     .unwrap();
//! catalog
//!     .register_model(
//!         ModelInfo::new("library", "Book").with_field(FieldInfo::foreign_key("author", "Author")),
//!     )
//!     .unwrap();
//!
//! assert_eq!(catalog.models().len(), 2);
//! assert!(catalog.get_model("library.book").is_some());
//! ```

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// Closed set of forward relation kinds that induce a load dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
	/// One-to-one relation (`OneToOneField`).
	OneToOne,
	/// Many-to-one relation (`ForeignKey`).
	#[serde(alias = "foreign_key")]
	ManyToOne,
	/// Many-to-many relation backed by a join table.
	ManyToMany,
}

impl RelationKind {
	/// Returns true for relations whose target must be loaded first.
	pub fn is_forward_one_or_many(&self) -> bool {
		matches!(self, Self::OneToOne | Self::ManyToOne)
	}
}

/// A single declared field on a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
	/// Field name.
	pub name: String,

	/// Relation kind, `None` for plain data fields.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relation: Option<RelationKind>,

	/// Related model, either `app.Model`, a bare `Model` in the declaring
	/// app, or `self`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub to: Option<String>,

	/// Explicit intermediate model for a many-to-many relation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub through: Option<String>,
}

impl FieldInfo {
	/// Creates a plain, non-relational field.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			relation: None,
			to: None,
			through: None,
		}
	}

	/// Creates a relational field of the given kind.
	pub fn relation(name: impl Into<String>, kind: RelationKind, to: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			relation: Some(kind),
			to: Some(to.into()),
			through: None,
		}
	}

	/// Creates a one-to-one field.
	pub fn one_to_one(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::relation(name, RelationKind::OneToOne, to)
	}

	/// Creates a foreign key (many-to-one) field.
	pub fn foreign_key(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::relation(name, RelationKind::ManyToOne, to)
	}

	/// Creates a many-to-many field.
	pub fn many_to_many(name: impl Into<String>, to: impl Into<String>) -> Self {
		Self::relation(name, RelationKind::ManyToMany, to)
	}

	/// Sets the explicit intermediate model.
	pub fn with_through(mut self, through: impl Into<String>) -> Self {
		self.through = Some(through.into());
		self
	}

	/// Returns true for one-to-one and many-to-one relations.
	pub fn is_forward_one_or_many(&self) -> bool {
		self.relation
			.is_some_and(|kind| kind.is_forward_one_or_many())
	}

	/// Returns true for many-to-many relations.
	pub fn is_many_to_many(&self) -> bool {
		self.relation == Some(RelationKind::ManyToMany)
	}

	/// Returns the related model reference as declared.
	pub fn related_model(&self) -> Option<&str> {
		self.relation.and(self.to.as_deref())
	}

	/// Returns the explicit intermediate model of a many-to-many relation.
	pub fn explicit_through(&self) -> Option<&str> {
		if self.is_many_to_many() {
			self.through.as_deref()
		} else {
			None
		}
	}
}

/// Definition of one model: its app, its name and its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
	/// Application label (e.g., "auth", "library").
	pub app_label: String,

	/// Model name (e.g., "User", "Book").
	pub model_name: String,

	/// Declared fields in declaration order.
	#[serde(default)]
	pub fields: Vec<FieldInfo>,
}

impl ModelInfo {
	/// Creates a model without fields.
	pub fn new(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
		Self {
			app_label: app_label.into(),
			model_name: model_name.into(),
			fields: Vec::new(),
		}
	}

	/// Adds a field.
	pub fn with_field(mut self, field: FieldInfo) -> Self {
		self.fields.push(field);
		self
	}

	/// Returns the `app.Model` label.
	pub fn model_label(&self) -> String {
		format!("{}.{}", self.app_label, self.model_name)
	}

	/// Returns the filesystem-safe fixture label.
	pub fn fixture_label(&self) -> String {
		fixture_label_for(&self.model_label())
	}

	/// Qualifies a relation target against this model.
	///
	/// `self` resolves to this model, a bare model name to the same app.
	pub fn qualify(&self, target: &str) -> String {
		if target == "self" {
			self.model_label()
		} else if target.contains('.') {
			target.to_string()
		} else {
			format!("{}.{}", self.app_label, target)
		}
	}
}

/// Derives the fixture label from a model label.
///
/// # Example
///
/// ```
/// # use reinhardt_loadfixtures::catalog::fixture_label_for;
/// assert_eq!(fixture_label_for("shop.OrderItem"), "shop_orderitem");
/// ```
pub fn fixture_label_for(model_label: &str) -> String {
	model_label.to_lowercase().replace('.', "_")
}

/// An installed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
	/// Short app label.
	pub label: String,

	/// Filesystem path of the app; its `fixtures` subdirectory is searched.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<PathBuf>,
}

impl AppConfig {
	/// Creates an app without a known path.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			path: None,
		}
	}

	/// Sets the app path.
	pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
		self.path = Some(path.into());
		self
	}
}

/// Read-only view of the installed apps and their models.
pub trait EntityCatalog: Send + Sync {
	/// Returns every model in registration order.
	fn models(&self) -> &[ModelInfo];

	/// Returns the filesystem path of an app, if known.
	fn app_path(&self, app_label: &str) -> Option<&Path>;

	/// Returns true when the app is installed.
	fn has_app(&self, app_label: &str) -> bool;

	/// Looks up a model by `app.Model` label, ignoring case.
	fn get_model(&self, model_label: &str) -> Option<&ModelInfo> {
		let wanted = model_label.to_lowercase();
		self.models()
			.iter()
			.find(|model| model.model_label().to_lowercase() == wanted)
	}
}

/// In-memory catalog preserving registration order.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
	apps: Vec<AppConfig>,
	models: Vec<ModelInfo>,
	/// Lowercased model label -> index into `models`.
	index: HashMap<String, usize>,
	/// Fixture labels taken by registered models.
	fixture_labels: HashSet<String>,
}

impl ModelCatalog {
	/// Creates an empty catalog.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers an app, replacing a previous registration with the same label.
	pub fn register_app(&mut self, app: AppConfig) {
		match self.apps.iter_mut().find(|a| a.label == app.label) {
			Some(existing) => *existing = app,
			None => self.apps.push(app),
		}
	}

	/// Registers a model, implicitly installing its app.
	///
	/// # Errors
	///
	/// Returns [`GraphError::DuplicateModel`] if another model already maps to
	/// the same fixture label, e.g. `shop_order.Item` and `shop.Order_item`.
	pub fn register_model(&mut self, model: ModelInfo) -> Result<(), GraphError> {
		let fixture_label = model.fixture_label();
		if self.fixture_labels.contains(&fixture_label) {
			return Err(GraphError::DuplicateModel(model.model_label()));
		}
		if !self.has_app(&model.app_label) {
			self.apps.push(AppConfig::new(model.app_label.clone()));
		}
		self.fixture_labels.insert(fixture_label);
		self.index
			.insert(model.model_label().to_lowercase(), self.models.len());
		self.models.push(model);
		Ok(())
	}

	/// Returns the installed apps in registration order.
	pub fn apps(&self) -> &[AppConfig] {
		&self.apps
	}

	/// Returns the number of registered models.
	pub fn len(&self) -> usize {
		self.models.len()
	}

	/// Returns true if no models are registered.
	pub fn is_empty(&self) -> bool {
		self.models.is_empty()
	}
}

impl EntityCatalog for ModelCatalog {
	fn models(&self) -> &[ModelInfo] {
		&self.models
	}

	fn app_path(&self, app_label: &str) -> Option<&Path> {
		self.apps
			.iter()
			.find(|app| app.label == app_label)
			.and_then(|app| app.path.as_deref())
	}

	fn has_app(&self, app_label: &str) -> bool {
		self.apps.iter().any(|app| app.label == app_label)
	}

	fn get_model(&self, model_label: &str) -> Option<&ModelInfo> {
		self.index
			.get(&model_label.to_lowercase())
			.map(|&idx| &self.models[idx])
	}
}
