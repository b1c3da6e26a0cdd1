//! Record of a module actually present on the local game.
//!
//! The metadata is a snapshot: it describes the module *as installed*, and
//! later catalog updates never touch it. The file list is the set of
//! relative keys this installation owns; the registry's ownership map is
//! derived from these lists and kept consistent by
//! [`Registry`](crate::registry::Registry).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::Result;
use crate::models::ModuleMetadata;
use crate::utils::paths;
use crate::version::ModuleVersion;

/// One installed module: metadata snapshot, owned files, install reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledModule {
    module: ModuleMetadata,
    files: BTreeSet<String>,
    auto_installed: bool,
}

impl InstalledModule {
    /// Record an installation. `files` are internal relative keys.
    #[must_use]
    pub fn new(module: ModuleMetadata, files: BTreeSet<String>, auto_installed: bool) -> Self {
        Self {
            module,
            files,
            auto_installed,
        }
    }

    /// The metadata snapshot taken at install time.
    #[must_use]
    pub fn module(&self) -> &ModuleMetadata {
        &self.module
    }

    /// The installed module's identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.module.identifier
    }

    /// The installed version.
    #[must_use]
    pub fn version(&self) -> &ModuleVersion {
        &self.module.version
    }

    /// Relative keys this installation owns, in lexicographic order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Whether this module was pulled in to satisfy a dependency rather than
    /// requested by the user.
    #[must_use]
    pub fn auto_installed(&self) -> bool {
        self.auto_installed
    }

    /// Flip the install reason; used when the user adopts an auto-installed
    /// dependency as explicitly wanted.
    pub fn set_auto_installed(&mut self, auto_installed: bool) {
        self.auto_installed = auto_installed;
    }

    /// Rewrite any stored absolute or backslashed path relative to
    /// `game_root`. Runs once, during the pre-v1 schema upgrade.
    pub fn renormalize(&mut self, game_root: &Path) -> Result<()> {
        let mut files = BTreeSet::new();
        for file in &self.files {
            files.insert(paths::renormalize_key(file, game_root)?);
        }
        self.files = files;
        Ok(())
    }

    pub(crate) fn rename(&mut self, identifier: &str) {
        self.module.identifier = identifier.to_string();
    }
}
