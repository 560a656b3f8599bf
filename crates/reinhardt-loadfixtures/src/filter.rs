//! Inclusion and exclusion of models.
//!
//! A [`FilterPolicy`] is built from the `--fixture`, `--app` and `--exclude`
//! arguments of a single run. Exclusion always wins; explicit inclusions, when
//! present, restrict the run to the selected apps and fixture labels.

use std::collections::BTreeSet;

use crate::catalog::EntityCatalog;
use crate::error::ConfigurationError;
use crate::graph::{LevelGraph, ModelDescriptor};

/// Caller-supplied selection of models for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPolicy {
	fixtures: BTreeSet<String>,
	app_labels: BTreeSet<String>,
	exclude: BTreeSet<String>,
}

impl FilterPolicy {
	/// Creates a policy that includes everything.
	pub fn new() -> Self {
		Self::default()
	}

	/// Restricts the run to the given fixture labels (plus any selected apps).
	pub fn with_fixtures<I, S>(mut self, fixtures: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.fixtures.extend(fixtures.into_iter().map(Into::into));
		self
	}

	/// Restricts the run to the given apps (plus any selected fixtures).
	pub fn with_app_labels<I, S>(mut self, app_labels: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.app_labels
			.extend(app_labels.into_iter().map(Into::into));
		self
	}

	/// Excludes fixture labels, model labels or app labels.
	pub fn with_exclude<I, S>(mut self, exclude: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclude.extend(exclude.into_iter().map(Into::into));
		self
	}

	/// Requested fixture labels.
	pub fn fixtures(&self) -> &BTreeSet<String> {
		&self.fixtures
	}

	/// Requested app labels.
	pub fn app_labels(&self) -> &BTreeSet<String> {
		&self.app_labels
	}

	/// Excluded identifiers.
	pub fn exclude(&self) -> &BTreeSet<String> {
		&self.exclude
	}

	/// Returns true when the caller selected apps or fixtures explicitly.
	pub fn has_inclusions(&self) -> bool {
		!self.fixtures.is_empty() || !self.app_labels.is_empty()
	}

	/// Returns true when the descriptor's fixture, model or app is excluded.
	pub fn is_excluded(&self, descriptor: &ModelDescriptor) -> bool {
		self.exclude.contains(&descriptor.fixture_label)
			|| self.exclude.contains(&descriptor.model_label)
			|| self.exclude.contains(&descriptor.app_label)
	}

	/// Decides whether a descriptor takes part in the run.
	pub fn should_include(&self, descriptor: &ModelDescriptor) -> bool {
		if self.is_excluded(descriptor) {
			return false;
		}
		if self.has_inclusions() {
			return self.app_labels.contains(&descriptor.app_label)
				|| self.fixtures.contains(&descriptor.fixture_label);
		}
		true
	}

	/// Checks the selection against the catalog before the graph is built.
	///
	/// # Errors
	///
	/// Fails when a requested app is unknown or excluded, or when a requested
	/// fixture is excluded directly or through its model or app.
	pub fn validate_before_build(
		&self,
		catalog: &dyn EntityCatalog,
	) -> Result<(), ConfigurationError> {
		for app in &self.app_labels {
			if !catalog.has_app(app) {
				return Err(ConfigurationError::UnknownApp(app.clone()));
			}
			if self.exclude.contains(app) {
				return Err(ConfigurationError::AppExcluded(app.clone()));
			}
		}

		for fixture in &self.fixtures {
			if self.exclude.contains(fixture) {
				return Err(ConfigurationError::FixtureExcluded(fixture.clone()));
			}
		}

		for descriptor in candidates(catalog) {
			if !self.fixtures.contains(&descriptor.fixture_label) {
				continue;
			}
			if self.exclude.contains(&descriptor.model_label) {
				return Err(ConfigurationError::FixtureModelExcluded {
					fixture: descriptor.fixture_label,
					model: descriptor.model_label,
				});
			}
			if self.exclude.contains(&descriptor.app_label) {
				return Err(ConfigurationError::FixtureAppExcluded {
					fixture: descriptor.fixture_label,
					app: descriptor.app_label,
				});
			}
		}

		Ok(())
	}

	/// Checks that every requested fixture label was discovered.
	///
	/// # Errors
	///
	/// Returns [`ConfigurationError::UnknownFixture`] for the first requested
	/// label missing from the graph's lookup table.
	pub fn validate_after_build(&self, graph: &LevelGraph) -> Result<(), ConfigurationError> {
		match self
			.fixtures
			.iter()
			.find(|fixture| graph.level_of(fixture).is_none())
		{
			Some(missing) => Err(ConfigurationError::UnknownFixture(missing.clone())),
			None => Ok(()),
		}
	}
}

/// Every descriptor a graph of this catalog can hold: its models plus the
/// joins of many-to-many fields without an explicit `through`.
fn candidates(catalog: &dyn EntityCatalog) -> impl Iterator<Item = ModelDescriptor> + '_ {
	catalog.models().iter().flat_map(|model| {
		let joins = model
			.fields
			.iter()
			.filter(|field| field.is_many_to_many() && field.explicit_through().is_none())
			.filter_map(move |field| {
				let target = model.qualify(field.related_model()?);
				Some(ModelDescriptor::join(model, field, target))
			});
		std::iter::once(ModelDescriptor::from(model)).chain(joins)
	})
}
