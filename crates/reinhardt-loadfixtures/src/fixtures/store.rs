//! A file-backed fixture store.
//!
//! [`JsonStore`] installs fixture records as JSON lines, one file per model
//! and database: `<root>/<database>/<app.Model>.jsonl`. Every record is
//! checked against the catalog before anything is written, so a file with
//! a bad record installs nothing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use super::{FixtureParser, FixtureRecord};
use crate::catalog::EntityCatalog;
use crate::error::{SeedingError, SeedingResult};
use crate::loader::{FixtureLoader, LoadOptions};

/// Fields a model accepts, resolved from the catalog.
struct Schema {
	model_label: String,
	fields: Vec<String>,
}

impl Schema {
	fn accepts(&self, field: &str) -> bool {
		self.fields.iter().any(|name| name == field)
	}
}

/// Loads fixture files into JSON-lines tables under a root directory.
pub struct JsonStore {
	root: PathBuf,
	catalog: Arc<dyn EntityCatalog>,
	parser: FixtureParser,
}

impl JsonStore {
	/// Creates a store writing below `root`.
	pub fn new(root: impl Into<PathBuf>, catalog: Arc<dyn EntityCatalog>) -> Self {
		Self {
			root: root.into(),
			catalog,
			parser: FixtureParser::new(),
		}
	}

	/// Returns the table file of a model in a database.
	pub fn table_path(&self, database: &str, model_label: &str) -> PathBuf {
		self.root
			.join(database)
			.join(format!("{}.jsonl", model_label))
	}

	/// Looks up the schema of a registered model or of an auto-created join.
	fn schema(&self, model_label: &str) -> Option<Schema> {
		if let Some(model) = self.catalog.get_model(model_label) {
			return Some(Schema {
				model_label: model.model_label(),
				fields: model.fields.iter().map(|f| f.name.clone()).collect(),
			});
		}
		self.join_schema(model_label)
	}

	/// Resolves `app.Owner_field` to the join table of a many-to-many field.
	///
	/// Join rows carry one column per endpoint, named after the lowercased
	/// model names, or `from_<model>` and `to_<model>` when both endpoints
	/// are the same model.
	fn join_schema(&self, model_label: &str) -> Option<Schema> {
		let (app_label, join_name) = model_label.split_once('.')?;
		let join_name = join_name.to_lowercase();

		for owner in self.catalog.models() {
			if !owner.app_label.eq_ignore_ascii_case(app_label) {
				continue;
			}
			for field in owner.fields.iter().filter(|f| f.is_many_to_many()) {
				if field.explicit_through().is_some() {
					continue;
				}
				let name = format!("{}_{}", owner.model_name, field.name).to_lowercase();
				if name != join_name {
					continue;
				}
				let target = owner.qualify(field.related_model()?);
				let owner_name = owner.model_name.to_lowercase();
				let target_name = target
					.rsplit('.')
					.next()
					.unwrap_or(&target)
					.to_lowercase();
				let fields = if owner_name == target_name {
					vec![format!("from_{}", owner_name), format!("to_{}", target_name)]
				} else {
					vec![owner_name, target_name]
				};
				return Some(Schema {
					model_label: format!("{}.{}_{}", owner.app_label, owner.model_name, field.name),
					fields,
				});
			}
		}
		None
	}

	/// Checks a record against its schema and strips or rejects unknown fields.
	fn prepare(
		&self,
		mut record: FixtureRecord,
		options: &LoadOptions,
	) -> SeedingResult<(String, FixtureRecord)> {
		let schema = self
			.schema(&record.model)
			.ok_or_else(|| SeedingError::ModelNotFound(record.model.clone()))?;

		if let Some(fields) = record.fields.as_object_mut() {
			let unknown: Vec<String> = fields
				.keys()
				.filter(|name| !schema.accepts(name))
				.cloned()
				.collect();
			for name in unknown {
				if !options.ignore_nonexistent {
					return Err(SeedingError::UnknownField {
						model: schema.model_label,
						field: name,
					});
				}
				tracing::debug!(model = %schema.model_label, field = %name, "ignoring nonexistent field");
				fields.remove(&name);
			}
		}

		record.model = schema.model_label.clone();
		Ok((schema.model_label, record))
	}
}

impl std::fmt::Debug for JsonStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("JsonStore")
			.field("root", &self.root)
			.field("models", &self.catalog.models().len())
			.finish()
	}
}

#[async_trait]
impl FixtureLoader for JsonStore {
	async fn load(
		&self,
		path: &Path,
		database: &str,
		options: &LoadOptions,
	) -> SeedingResult<usize> {
		let data = self.parser.parse_file(path, options.format)?;

		let mut tables: BTreeMap<String, Vec<FixtureRecord>> = BTreeMap::new();
		for record in data {
			let (model_label, record) = self.prepare(record, options)?;
			tables.entry(model_label).or_default().push(record);
		}

		let mut count = 0;
		for (model_label, records) in tables {
			let table = self.table_path(database, &model_label);
			if let Some(parent) = table.parent() {
				tokio::fs::create_dir_all(parent).await?;
			}

			let mut buffer = String::new();
			for record in &records {
				buffer.push_str(&serde_json::to_string(record)?);
				buffer.push('\n');
			}

			let mut file = tokio::fs::OpenOptions::new()
				.create(true)
				.append(true)
				.open(&table)
				.await?;
			file.write_all(buffer.as_bytes()).await?;
			file.flush().await?;

			tracing::debug!(
				model = %model_label,
				database = %database,
				records = records.len(),
				"installed records"
			);
			count += records.len();
		}

		Ok(count)
	}
}
