//! Inverted index from virtual-package names to their providers.
//!
//! Derived entirely from the available catalog and rebuilt from it on
//! deserialization, so it is never persisted. The index is *stale-safe*:
//! removing a single version from an [`AvailableModule`] does not shrink it,
//! because consumers re-verify that the version they actually picked still
//! lists the virtual name. That keeps removal O(1) and the index an
//! over-approximation, never an under-approximation.

use std::collections::{BTreeMap, BTreeSet};

use super::available::AvailableModule;

/// virtual-name → identifiers of available modules with a version providing
/// it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvidesIndex {
    index: BTreeMap<String, BTreeSet<String>>,
}

impl ProvidesIndex {
    /// Empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one module's versions into the index.
    pub fn reindex(&mut self, available: &AvailableModule) {
        for module in available.all() {
            for virtual_name in &module.provides {
                self.index
                    .entry(virtual_name.clone())
                    .or_default()
                    .insert(available.identifier().to_string());
            }
        }
    }

    /// Throw the index away and re-derive it from the full catalog.
    pub fn rebuild<'a>(&mut self, catalog: impl IntoIterator<Item = &'a AvailableModule>) {
        self.index.clear();
        for available in catalog {
            self.reindex(available);
        }
    }

    /// Identifiers indexed under `virtual_name`. May include stale entries;
    /// callers re-verify against the version they select.
    pub fn providers_of(&self, virtual_name: &str) -> impl Iterator<Item = &str> {
        self.index.get(virtual_name).into_iter().flatten().map(String::as_str)
    }

    /// Whether anything is indexed under `virtual_name`.
    #[must_use]
    pub fn has_provider(&self, virtual_name: &str) -> bool {
        self.index.get(virtual_name).is_some_and(|set| !set.is_empty())
    }
}
