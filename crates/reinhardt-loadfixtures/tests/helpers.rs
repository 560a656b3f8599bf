//! Test helpers for reinhardt-loadfixtures tests.
//!
//! This module provides sample catalogs, a recording loader and on-disk
//! fixture helpers shared by the integration tests.

#![allow(dead_code)]

#[path = "helpers/catalogs.rs"]
pub mod catalogs;
#[path = "helpers/loader.rs"]
pub mod loader;

use std::fs;
use std::path::{Path, PathBuf};

/// Writes a fixture file, creating parent directories.
pub fn write_fixture(dir: &Path, relative: &str, content: &str) -> PathBuf {
	let path = dir.join(relative);
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(&path, content).unwrap();
	path
}
