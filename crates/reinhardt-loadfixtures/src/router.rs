//! Database routing for fixture loads.
//!
//! A run without `--database` asks the router which database each model is
//! written to, in the spirit of Django's `router.db_for_write`.

use std::collections::HashMap;

/// The database alias used when nothing else is configured.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Picks the database a model's fixtures are written to.
pub trait StoreRouter: Send + Sync {
	/// Returns the database alias for writes of the given `app.Model` label.
	fn db_for_write(&self, model_label: &str) -> String;
}

/// Routes every model to a single database.
#[derive(Debug, Clone)]
pub struct DefaultRouter {
	alias: String,
}

impl DefaultRouter {
	/// Creates a router that always answers `alias`.
	pub fn new(alias: impl Into<String>) -> Self {
		Self {
			alias: alias.into(),
		}
	}
}

impl Default for DefaultRouter {
	fn default() -> Self {
		Self::new(DEFAULT_DB_ALIAS)
	}
}

impl StoreRouter for DefaultRouter {
	fn db_for_write(&self, _model_label: &str) -> String {
		self.alias.clone()
	}
}

/// Routes by model label first, then by app label, then to a default.
///
/// # Example
///
/// ```
/// use reinhardt_loadfixtures::router::{RoutingTable, StoreRouter};
///
/// let router = RoutingTable::new("default")
///     .with_route("analytics", "replica")
///     .with_route("auth.User", "users");
///
/// assert_eq!(router.db_for_write("analytics.Event"), "replica");
/// assert_eq!(router.db_for_write("auth.User"), "users");
/// assert_eq!(router.db_for_write("auth.Group"), "default");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
	default_alias: String,
	routes: HashMap<String, String>,
}

impl RoutingTable {
	/// Creates a table with only a default alias.
	pub fn new(default_alias: impl Into<String>) -> Self {
		Self {
			default_alias: default_alias.into(),
			routes: HashMap::new(),
		}
	}

	/// Adds a route for an app label or an `app.Model` label.
	pub fn with_route(mut self, label: impl Into<String>, alias: impl Into<String>) -> Self {
		self.routes.insert(label.into(), alias.into());
		self
	}

	/// Adds every route of a map.
	pub fn with_routes(mut self, routes: HashMap<String, String>) -> Self {
		self.routes.extend(routes);
		self
	}
}

impl StoreRouter for RoutingTable {
	fn db_for_write(&self, model_label: &str) -> String {
		let app_label = model_label.split('.').next().unwrap_or(model_label);
		self.routes
			.get(model_label)
			.or_else(|| self.routes.get(app_label))
			.unwrap_or(&self.default_alias)
			.clone()
	}
}
