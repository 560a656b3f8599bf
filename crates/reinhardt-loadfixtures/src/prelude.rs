//! Convenience re-exports for common usage.
//!
//! ```ignore
//! use reinhardt_loadfixtures::prelude::*;
//! ```

// Error types
pub use crate::error::{
	ConfigurationError, GraphError, LoadFixturesError, LoadFixturesResult, SeedingError,
	SeedingResult, SettingsError,
};

// Catalog and graph
pub use crate::catalog::{
	AppConfig, EntityCatalog, FieldInfo, ModelCatalog, ModelInfo, RelationKind,
};
pub use crate::filter::FilterPolicy;
pub use crate::graph::{DescriptorKind, GraphBuilder, LevelGraph, ModelDescriptor};

// Loading
pub use crate::engine::{DryRunEntry, LoadEngine, RunOptions, RunReport};
pub use crate::fixtures::{FixtureFormat, FixtureParser, FixtureRecord, JsonStore};
pub use crate::loader::{FixtureLoader, LoadOptions};
pub use crate::resolver::FixtureResolver;
pub use crate::router::{DefaultRouter, RoutingTable, StoreRouter};

// Command and settings
pub use crate::command::{
	CommandOutcome, LoadFixturesArgs, LoadFixturesCommand, LoadFixturesOptions,
};
pub use crate::settings::{LoadFixturesSettings, ProjectManifest};
