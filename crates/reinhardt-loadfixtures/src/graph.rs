//! Relation graph of models, grouped into load levels.
//!
//! A model's level is its depth in the forward-relation graph:
//!
//! - `0` when it has no one-to-one or many-to-one relation to another model
//! - `1 + max(level of each related model)` otherwise
//!
//! Self references never raise a level. Loaddata defers constraint checks
//! until a file is fully installed, so rows pointing at rows of the same
//! table load fine in a single pass.
//!
//! Many-to-many relations without an explicit intermediate model get a
//! synthesized join descriptor one level above both endpoints.
//!
//! # Example
//!
//! ```
//! use reinhardt_loadfixtures::catalog::{FieldInfo, ModelCatalog, ModelInfo};
//! use reinhardt_loadfixtures::filter::FilterPolicy;
//! use reinhardt_loadfixtures::graph::GraphBuilder;
//!
//! let mut catalog = ModelCatalog::new();
//! catalog.register_model(ModelInfo::new("library", "Author")).unwrap();
//! catalog
//!     .register_model(
//!         ModelInfo::new("library", "Book").with_field(FieldInfo::foreign_key("author", "Author")),
//!     )
//!     .unwrap();
//!
//! let policy = FilterPolicy::new();
//! let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();
//! assert_eq!(graph.level_of("library_author"), Some(0));
//! assert_eq!(graph.level_of("library_book"), Some(1));
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::catalog::{EntityCatalog, FieldInfo, ModelInfo, fixture_label_for};
use crate::error::GraphError;
use crate::filter::FilterPolicy;

/// What a descriptor stands for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
	/// A model registered in the catalog.
	Model,
	/// A synthesized many-to-many join table.
	Join {
		/// Model label of the model declaring the relation.
		owner: String,
		/// Name of the many-to-many field.
		field: String,
		/// Model label of the related model.
		target: String,
	},
}

/// One loadable model of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelDescriptor {
	/// Filesystem-safe label fixture files are named after.
	pub fixture_label: String,
	/// `app.Model` label.
	pub model_label: String,
	/// Model name.
	pub model_name: String,
	/// App label.
	pub app_label: String,
	/// Registered model or synthesized join.
	pub kind: DescriptorKind,
}

impl ModelDescriptor {
	/// Creates the descriptor of a registered model.
	pub fn model(app_label: impl Into<String>, model_name: impl Into<String>) -> Self {
		let app_label = app_label.into();
		let model_name = model_name.into();
		let model_label = format!("{}.{}", app_label, model_name);
		Self {
			fixture_label: fixture_label_for(&model_label),
			model_label,
			model_name,
			app_label,
			kind: DescriptorKind::Model,
		}
	}

	/// Creates the join descriptor of a many-to-many field.
	///
	/// The join lives in the owner's app and is named `{Owner}_{field}`,
	/// matching the auto-created through model of Django.
	pub fn join(owner: &ModelInfo, field: &FieldInfo, target_label: impl Into<String>) -> Self {
		let model_name = format!("{}_{}", owner.model_name, field.name);
		let model_label = format!("{}.{}", owner.app_label, model_name);
		Self {
			fixture_label: fixture_label_for(&model_label),
			model_label,
			model_name,
			app_label: owner.app_label.clone(),
			kind: DescriptorKind::Join {
				owner: owner.model_label(),
				field: field.name.clone(),
				target: target_label.into(),
			},
		}
	}

	/// Returns true for synthesized join descriptors.
	pub fn is_join(&self) -> bool {
		matches!(self.kind, DescriptorKind::Join { .. })
	}
}

impl From<&ModelInfo> for ModelDescriptor {
	fn from(info: &ModelInfo) -> Self {
		Self::model(info.app_label.clone(), info.model_name.clone())
	}
}

impl fmt::Display for ModelDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({})", self.model_label, self.fixture_label)
	}
}

/// Descriptors grouped by level, plus the level of every discovered model.
#[derive(Debug, Clone, Default)]
pub struct LevelGraph {
	levels: BTreeMap<usize, Vec<ModelDescriptor>>,
	/// Fixture label -> level, including models the filter left out.
	lookup: HashMap<String, usize>,
}

impl LevelGraph {
	/// Returns the highest occupied level, `None` when nothing is to be loaded.
	pub fn max_level(&self) -> Option<usize> {
		self.levels.keys().next_back().copied()
	}

	/// Returns the descriptors recorded at a level.
	pub fn get(&self, level: usize) -> &[ModelDescriptor] {
		self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Iterates occupied levels in ascending order.
	pub fn levels(&self) -> impl Iterator<Item = (usize, &[ModelDescriptor])> {
		self.levels
			.iter()
			.map(|(level, descriptors)| (*level, descriptors.as_slice()))
	}

	/// Iterates all recorded descriptors in load order.
	pub fn iter(&self) -> impl Iterator<Item = &ModelDescriptor> {
		self.levels.values().flatten()
	}

	/// Returns the level computed for a fixture label.
	///
	/// Filtered-out models still have a level.
	pub fn level_of(&self, fixture_label: &str) -> Option<usize> {
		self.lookup.get(fixture_label).copied()
	}

	/// Returns true when a descriptor with this fixture label was recorded.
	pub fn contains(&self, fixture_label: &str) -> bool {
		self.iter()
			.any(|descriptor| descriptor.fixture_label == fixture_label)
	}

	/// Returns the number of recorded descriptors.
	pub fn len(&self) -> usize {
		self.levels.values().map(Vec::len).sum()
	}

	/// Returns true when no descriptor survived filtering.
	pub fn is_empty(&self) -> bool {
		self.levels.is_empty()
	}

	/// Fails when the fixture label is already taken.
	fn record(
		&mut self,
		level: usize,
		descriptor: ModelDescriptor,
		policy: &FilterPolicy,
	) -> Result<(), GraphError> {
		if self.lookup.contains_key(&descriptor.fixture_label) {
			return Err(GraphError::DuplicateModel(descriptor.model_label));
		}
		self.lookup
			.insert(descriptor.fixture_label.clone(), level);
		if policy.should_include(&descriptor) {
			self.levels.entry(level).or_default().push(descriptor);
		} else {
			tracing::trace!(model = %descriptor.model_label, "filtered out of the graph");
		}
		Ok(())
	}
}

impl fmt::Display for LevelGraph {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (level, descriptors) in self.levels() {
			writeln!(f, "Level : {}", level)?;
			for descriptor in descriptors {
				writeln!(f, "  {}", descriptor)?;
			}
		}
		Ok(())
	}
}

/// Traversal state of a model during level computation.
#[derive(Debug, Clone, Copy)]
enum Mark {
	Unvisited,
	InProgress,
	Done(usize),
}

/// A many-to-many relation that needs a join descriptor.
struct PendingJoin<'c> {
	owner: usize,
	field: &'c FieldInfo,
	target: usize,
}

/// Builds a [`LevelGraph`] from a catalog.
pub struct GraphBuilder<'a> {
	catalog: &'a dyn EntityCatalog,
	policy: &'a FilterPolicy,
}

impl<'a> GraphBuilder<'a> {
	/// Creates a builder over a catalog and the run's filter policy.
	pub fn new(catalog: &'a dyn EntityCatalog, policy: &'a FilterPolicy) -> Self {
		Self { catalog, policy }
	}

	/// Builds the level graph.
	///
	/// # Errors
	///
	/// - [`GraphError::UnknownRelatedModel`] if a relation or `through` names an
	///   unregistered model
	/// - [`GraphError::CircularDependency`] if distinct models depend on each
	///   other in a loop
	/// - [`GraphError::DuplicateModel`] if two models or joins share a fixture
	///   label
	pub fn build(&self) -> Result<LevelGraph, GraphError> {
		let models = self.catalog.models();
		let (dependencies, joins) = self.classify(models)?;
		let levels = compute_levels(models, &dependencies)?;

		let mut graph = LevelGraph::default();
		for (model, &level) in models.iter().zip(&levels) {
			tracing::debug!(model = %model.model_label(), level, "assigned load level");
			graph.record(level, ModelDescriptor::from(model), self.policy)?;
		}

		for join in joins {
			let owner = &models[join.owner];
			let target = &models[join.target];
			let level = 1 + levels[join.owner].max(levels[join.target]);
			let descriptor = ModelDescriptor::join(owner, join.field, target.model_label());
			tracing::debug!(
				model = %descriptor.model_label,
				level,
				"synthesized many-to-many join"
			);
			graph.record(level, descriptor, self.policy)?;
		}

		Ok(graph)
	}

	/// Splits every model's relations into level dependencies and pending joins.
	fn classify<'c>(
		&self,
		models: &'c [ModelInfo],
	) -> Result<(Vec<Vec<usize>>, Vec<PendingJoin<'c>>), GraphError> {
		let index: HashMap<String, usize> = models
			.iter()
			.enumerate()
			.map(|(idx, model)| (model.model_label().to_lowercase(), idx))
			.collect();
		let resolve = |model: &ModelInfo, field: &FieldInfo, target: &str| {
			let label = model.qualify(target);
			index
				.get(&label.to_lowercase())
				.copied()
				.ok_or_else(|| GraphError::UnknownRelatedModel {
					model: model.model_label(),
					field: field.name.clone(),
					target: label,
				})
		};

		let mut dependencies = Vec::with_capacity(models.len());
		let mut joins = Vec::new();
		for (idx, model) in models.iter().enumerate() {
			let mut related = Vec::new();
			for field in &model.fields {
				let Some(target) = field.related_model() else {
					continue;
				};
				let target = resolve(model, field, target)?;
				if field.is_forward_one_or_many() {
					if target != idx && !related.contains(&target) {
						related.push(target);
					}
				} else if field.is_many_to_many() {
					match field.explicit_through() {
						// Explicit through models are ordinary catalog models.
						Some(through) => {
							resolve(model, field, through)?;
						}
						None => joins.push(PendingJoin {
							owner: idx,
							field,
							target,
						}),
					}
				}
			}
			dependencies.push(related);
		}

		Ok((dependencies, joins))
	}
}

/// Computes every model's level with an explicit stack.
///
/// Each entry of `dependencies` lists the indexes of the distinct models a
/// model points at, self references already removed.
fn compute_levels(
	models: &[ModelInfo],
	dependencies: &[Vec<usize>],
) -> Result<Vec<usize>, GraphError> {
	let mut marks = vec![Mark::Unvisited; models.len()];

	for root in 0..models.len() {
		if !matches!(marks[root], Mark::Unvisited) {
			continue;
		}
		marks[root] = Mark::InProgress;
		// (model, index of the next dependency to visit)
		let mut stack = vec![(root, 0usize)];

		while let Some(frame) = stack.last_mut() {
			let node = frame.0;
			if let Some(&dep) = dependencies[node].get(frame.1) {
				frame.1 += 1;
				match marks[dep] {
					Mark::Done(_) => {}
					Mark::Unvisited => {
						marks[dep] = Mark::InProgress;
						stack.push((dep, 0));
					}
					Mark::InProgress => {
						let start = stack
							.iter()
							.position(|&(n, _)| n == dep)
							.unwrap_or_default();
						let mut chain: Vec<String> = stack[start..]
							.iter()
							.map(|&(n, _)| models[n].model_label())
							.collect();
						chain.push(models[dep].model_label());
						return Err(GraphError::CircularDependency(chain));
					}
				}
			} else {
				let level = dependencies[node]
					.iter()
					.filter_map(|&dep| match marks[dep] {
						Mark::Done(level) => Some(level + 1),
						_ => None,
					})
					.max()
					.unwrap_or(0);
				marks[node] = Mark::Done(level);
				stack.pop();
			}
		}
	}

	Ok(marks
		.into_iter()
		.map(|mark| match mark {
			Mark::Done(level) => level,
			Mark::Unvisited | Mark::InProgress => 0,
		})
		.collect())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::ModelCatalog;
	use rstest::rstest;

	fn build(catalog: &ModelCatalog) -> LevelGraph {
		GraphBuilder::new(catalog, &FilterPolicy::new())
			.build()
			.unwrap()
	}

	fn catalog_of(models: Vec<ModelInfo>) -> ModelCatalog {
		let mut catalog = ModelCatalog::new();
		for model in models {
			catalog.register_model(model).unwrap();
		}
		catalog
	}

	#[rstest]
	fn test_empty_catalog_yields_empty_graph() {
		let graph = build(&ModelCatalog::new());
		assert!(graph.is_empty());
		assert_eq!(graph.max_level(), None);
		assert_eq!(graph.len(), 0);
	}

	#[rstest]
	fn test_model_without_relations_is_level_zero() {
		let catalog = catalog_of(vec![
			ModelInfo::new("blog", "Tag").with_field(FieldInfo::new("name")),
		]);
		let graph = build(&catalog);
		assert_eq!(graph.level_of("blog_tag"), Some(0));
		assert_eq!(graph.get(0).len(), 1);
	}

	#[rstest]
	fn test_self_reference_does_not_raise_level() {
		let catalog = catalog_of(vec![
			ModelInfo::new("org", "Employee").with_field(FieldInfo::foreign_key("manager", "self")),
		]);
		let graph = build(&catalog);
		assert_eq!(graph.level_of("org_employee"), Some(0));
	}

	#[rstest]
	fn test_level_is_one_above_deepest_dependency() {
		let catalog = catalog_of(vec![
			ModelInfo::new("shop", "OrderItem")
				.with_field(FieldInfo::foreign_key("order", "Order"))
				.with_field(FieldInfo::foreign_key("product", "Product")),
			ModelInfo::new("shop", "Order").with_field(FieldInfo::foreign_key("customer", "Customer")),
			ModelInfo::new("shop", "Customer").with_field(FieldInfo::one_to_one("user", "auth.User")),
			ModelInfo::new("shop", "Product"),
			ModelInfo::new("auth", "User"),
		]);
		let graph = build(&catalog);

		assert_eq!(graph.level_of("auth_user"), Some(0));
		assert_eq!(graph.level_of("shop_product"), Some(0));
		assert_eq!(graph.level_of("shop_customer"), Some(1));
		assert_eq!(graph.level_of("shop_order"), Some(2));
		assert_eq!(graph.level_of("shop_orderitem"), Some(3));
		assert_eq!(graph.max_level(), Some(3));
	}

	#[rstest]
	fn test_bucket_order_follows_catalog_order() {
		let catalog = catalog_of(vec![
			ModelInfo::new("blog", "Tag"),
			ModelInfo::new("auth", "User"),
			ModelInfo::new("blog", "Category"),
		]);
		let graph = build(&catalog);
		let labels: Vec<_> = graph
			.get(0)
			.iter()
			.map(|d| d.model_label.as_str())
			.collect();
		assert_eq!(labels, vec!["blog.Tag", "auth.User", "blog.Category"]);
	}

	#[rstest]
	fn test_many_to_many_synthesizes_join() {
		let catalog = catalog_of(vec![
			ModelInfo::new("library", "Author"),
			ModelInfo::new("library", "Book")
				.with_field(FieldInfo::foreign_key("author", "Author"))
				.with_field(FieldInfo::many_to_many("co_authors", "Author")),
		]);
		let graph = build(&catalog);

		assert_eq!(graph.level_of("library_book"), Some(1));
		assert_eq!(graph.level_of("library_book_co_authors"), Some(2));
		let join = &graph.get(2)[0];
		assert!(join.is_join());
		assert_eq!(join.model_label, "library.Book_co_authors");
		assert_eq!(
			join.kind,
			DescriptorKind::Join {
				owner: "library.Book".to_string(),
				field: "co_authors".to_string(),
				target: "library.Author".to_string(),
			}
		);
	}

	#[rstest]
	fn test_join_level_uses_deeper_endpoint() {
		let catalog = catalog_of(vec![
			ModelInfo::new("blog", "Tag"),
			ModelInfo::new("auth", "User"),
			ModelInfo::new("blog", "Post")
				.with_field(FieldInfo::foreign_key("author", "auth.User"))
				.with_field(FieldInfo::many_to_many("tags", "Tag")),
			ModelInfo::new("blog", "Comment")
				.with_field(FieldInfo::foreign_key("post", "Post"))
				.with_field(FieldInfo::many_to_many("mentions", "Post")),
		]);
		let graph = build(&catalog);

		assert_eq!(graph.level_of("blog_post_tags"), Some(2));
		assert_eq!(graph.level_of("blog_comment"), Some(2));
		assert_eq!(graph.level_of("blog_comment_mentions"), Some(3));
	}

	#[rstest]
	fn test_explicit_through_suppresses_synthesis() {
		let catalog = catalog_of(vec![
			ModelInfo::new("library", "Author"),
			ModelInfo::new("library", "Book").with_field(
				FieldInfo::many_to_many("authors", "Author").with_through("library.Authorship"),
			),
			ModelInfo::new("library", "Authorship")
				.with_field(FieldInfo::foreign_key("book", "Book"))
				.with_field(FieldInfo::foreign_key("author", "Author")),
		]);
		let graph = build(&catalog);

		assert_eq!(graph.level_of("library_book_authors"), None);
		assert_eq!(graph.level_of("library_book"), Some(0));
		assert_eq!(graph.level_of("library_authorship"), Some(1));
		assert_eq!(graph.len(), 3);
	}

	#[rstest]
	fn test_unknown_related_model() {
		let catalog = catalog_of(vec![
			ModelInfo::new("shop", "Order").with_field(FieldInfo::foreign_key("customer", "Customer")),
		]);
		let result = GraphBuilder::new(&catalog, &FilterPolicy::new()).build();
		assert_eq!(
			result.unwrap_err(),
			GraphError::UnknownRelatedModel {
				model: "shop.Order".to_string(),
				field: "customer".to_string(),
				target: "shop.Customer".to_string(),
			}
		);
	}

	#[rstest]
	fn test_unknown_through_model() {
		let catalog = catalog_of(vec![
			ModelInfo::new("library", "Author"),
			ModelInfo::new("library", "Book").with_field(
				FieldInfo::many_to_many("authors", "Author").with_through("Authorship"),
			),
		]);
		let result = GraphBuilder::new(&catalog, &FilterPolicy::new()).build();
		assert!(matches!(
			result,
			Err(GraphError::UnknownRelatedModel { target, .. }) if target == "library.Authorship"
		));
	}

	#[rstest]
	fn test_cycle_between_models_is_reported() {
		let catalog = catalog_of(vec![
			ModelInfo::new("shop", "Order").with_field(FieldInfo::foreign_key("invoice", "Invoice")),
			ModelInfo::new("shop", "Invoice").with_field(FieldInfo::one_to_one("order", "Order")),
		]);
		let result = GraphBuilder::new(&catalog, &FilterPolicy::new()).build();
		assert_eq!(
			result.unwrap_err(),
			GraphError::CircularDependency(vec![
				"shop.Order".to_string(),
				"shop.Invoice".to_string(),
				"shop.Order".to_string(),
			])
		);
	}

	#[rstest]
	fn test_join_colliding_with_model() {
		let catalog = catalog_of(vec![
			ModelInfo::new("blog", "Tag"),
			ModelInfo::new("blog", "Post").with_field(FieldInfo::many_to_many("tags", "Tag")),
			ModelInfo::new("blog", "Post_tags"),
		]);
		let result = GraphBuilder::new(&catalog, &FilterPolicy::new()).build();
		assert_eq!(
			result.unwrap_err(),
			GraphError::DuplicateModel("blog.Post_tags".to_string())
		);
	}

	/// Catalog without registration checks.
	struct RawCatalog(Vec<ModelInfo>);

	impl EntityCatalog for RawCatalog {
		fn models(&self) -> &[ModelInfo] {
			&self.0
		}

		fn app_path(&self, _app_label: &str) -> Option<&std::path::Path> {
			None
		}

		fn has_app(&self, app_label: &str) -> bool {
			self.0.iter().any(|model| model.app_label == app_label)
		}
	}

	#[rstest]
	fn test_models_sharing_fixture_label() {
		let catalog = RawCatalog(vec![
			ModelInfo::new("shop_order", "Item"),
			ModelInfo::new("shop", "Order_item").with_field(FieldInfo::foreign_key("base", "Base")),
			ModelInfo::new("shop", "Base"),
		]);
		let result = GraphBuilder::new(&catalog, &FilterPolicy::new()).build();
		assert_eq!(
			result.unwrap_err(),
			GraphError::DuplicateModel("shop.Order_item".to_string())
		);
	}

	#[rstest]
	fn test_long_chain_does_not_overflow() {
		const DEPTH: usize = 10_000;
		// Deepest model first, so a single traversal walks the whole chain.
		let models = (0..DEPTH)
			.rev()
			.map(|idx| {
				let model = ModelInfo::new("chain", format!("M{}", idx));
				if idx == 0 {
					model
				} else {
					model.with_field(FieldInfo::foreign_key("prev", format!("M{}", idx - 1)))
				}
			})
			.collect();
		let graph = build(&catalog_of(models));

		assert_eq!(graph.level_of("chain_m0"), Some(0));
		assert_eq!(graph.level_of(&format!("chain_m{}", DEPTH - 1)), Some(DEPTH - 1));
		assert_eq!(graph.max_level(), Some(DEPTH - 1));
	}

	#[rstest]
	fn test_excluded_model_keeps_lookup_entry() {
		let catalog = catalog_of(vec![
			ModelInfo::new("auth", "User"),
			ModelInfo::new("blog", "Post").with_field(FieldInfo::foreign_key("author", "auth.User")),
		]);
		let policy = FilterPolicy::new().with_exclude(["auth"]);
		let graph = GraphBuilder::new(&catalog, &policy).build().unwrap();

		assert!(!graph.contains("auth_user"));
		assert_eq!(graph.level_of("auth_user"), Some(0));
		assert_eq!(graph.level_of("blog_post"), Some(1));
		assert_eq!(graph.get(0).len(), 0);
		assert_eq!(graph.max_level(), Some(1));
	}

	#[rstest]
	fn test_display_lists_levels() {
		let catalog = catalog_of(vec![
			ModelInfo::new("auth", "User"),
			ModelInfo::new("blog", "Post").with_field(FieldInfo::foreign_key("author", "auth.User")),
		]);
		let rendered = build(&catalog).to_string();
		assert_eq!(
			rendered,
			"Level : 0\n  auth.User (auth_user)\nLevel : 1\n  blog.Post (blog_post)\n"
		);
	}
}
