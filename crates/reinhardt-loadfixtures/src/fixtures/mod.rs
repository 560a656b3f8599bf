//! Fixture file handling.
//!
//! - [`format`]: Django-compatible fixture records and file formats
//! - [`parser`]: JSON and YAML fixture parsing
//! - [`store`]: the bundled JSON-lines store

pub mod format;
pub mod parser;
pub mod store;

pub use format::{FixtureData, FixtureFormat, FixtureRecord};
pub use parser::FixtureParser;
pub use store::JsonStore;
