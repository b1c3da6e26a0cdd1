//! The file-ownership map: which installed module owns which file.
//!
//! Every non-directory relative key maps to exactly one module identifier.
//! Directory keys (trailing `/`) are shared infrastructure (many modules
//! create `GameData/Shared/`), so directories are freely re-claimed and
//! only released when still attributed to the releasing module.
//!
//! Collision detection runs as a pre-flight pass over the *entire* incoming
//! file list before a single claim is made, so an install either owns all
//! its files or none of them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::installed::InstalledModule;
use crate::utils::paths;

/// relative path → owning module identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileOwnership {
    claims: BTreeMap<String, String>,
}

impl FileOwnership {
    /// Empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The module owning `path`, if any.
    #[must_use]
    pub fn owner(&self, path: &str) -> Option<&str> {
        self.claims.get(path).map(String::as_str)
    }

    /// Whether `path` is claimed by anyone.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.claims.contains_key(path)
    }

    /// All claims in lexicographic path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.claims.iter().map(|(p, id)| (p.as_str(), id.as_str()))
    }

    /// Number of claims.
    #[must_use]
    pub fn len(&self) -> usize {
        self.claims.len()
    }

    /// Whether no claims exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Pre-flight check: one message per non-directory file in `files`
    /// already owned by a module other than `identifier`.
    #[must_use]
    pub fn find_collisions<'a>(
        &self,
        identifier: &str,
        files: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        files
            .into_iter()
            .filter(|path| !paths::is_directory_key(path))
            .filter_map(|path| match self.owner(path) {
                Some(owner) if owner != identifier => Some(format!(
                    "{identifier} wishes to install {path}, but {owner} already owns it"
                )),
                _ => None,
            })
            .collect()
    }

    /// Claim every path for `identifier`, overwriting directory claims.
    ///
    /// Callers must have run [`find_collisions`](Self::find_collisions)
    /// first; claiming over a foreign file claim would corrupt invariant
    /// bookkeeping.
    pub fn claim_all<'a>(&mut self, identifier: &str, files: impl IntoIterator<Item = &'a str>) {
        for path in files {
            self.claims.insert(path.to_string(), identifier.to_string());
        }
    }

    /// Release every claim of `identifier` over `files`. Directory keys
    /// re-claimed by a later module stay with that module.
    pub fn release_all<'a>(&mut self, identifier: &str, files: impl IntoIterator<Item = &'a str>) {
        for path in files {
            if self.owner(path) == Some(identifier) {
                self.claims.remove(path);
            }
        }
    }

    /// Rewrite the owner of every claim held by `from`. Used by the schema
    /// upgrade that renames an installed module.
    pub fn rename_owner(&mut self, from: &str, to: &str) {
        for owner in self.claims.values_mut() {
            if owner == from {
                *owner = to.to_string();
            }
        }
    }

    /// Re-derive the map from installed file lists; used when loading a blob
    /// that predates the ownership map.
    pub fn rebuild<'a>(&mut self, installed: impl IntoIterator<Item = &'a InstalledModule>) {
        self.claims.clear();
        for module in installed {
            self.claim_all(module.identifier(), module.files());
        }
    }
}
