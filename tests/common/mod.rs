//! Common fixtures for registry integration tests.

// Not every helper is used by every test file.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use gmpm::models::ModuleMetadata;
use gmpm::version::constraints::RelationshipDescriptor;
use gmpm::version::ModuleVersion;

/// Bare metadata record.
pub fn module(identifier: &str, version: &str) -> ModuleMetadata {
    ModuleMetadata::new(identifier, ModuleVersion::parse(version))
}

/// Record bounded to a game-version interval.
pub fn module_for_game(identifier: &str, version: &str, min: &str, max: &str) -> ModuleMetadata {
    let mut m = module(identifier, version);
    m.min_game_version = Some(min.parse().unwrap());
    m.max_game_version = Some(max.parse().unwrap());
    m
}

/// Record providing the given virtual packages.
pub fn providing(identifier: &str, version: &str, provides: &[&str]) -> ModuleMetadata {
    let mut m = module(identifier, version);
    m.provides = provides.iter().map(ToString::to_string).collect();
    m
}

/// Record with unversioned `depends` clauses.
pub fn depending(identifier: &str, version: &str, depends: &[&str]) -> ModuleMetadata {
    let mut m = module(identifier, version);
    m.depends = depends.iter().map(|d| RelationshipDescriptor::new(*d)).collect();
    m
}

/// A throwaway game root.
pub fn game_root() -> TempDir {
    TempDir::new().expect("failed to create temporary game root")
}

/// Create `relative` (and its parents) under the game root, returning the
/// absolute path.
pub fn touch(root: &Path, relative: &str) -> PathBuf {
    let absolute = root.join(relative);
    if let Some(parent) = absolute.parent() {
        fs::create_dir_all(parent).expect("failed to create parent directories");
    }
    fs::write(&absolute, b"fixture").expect("failed to create fixture file");
    absolute
}
