//! Memoized compatible/incompatible partition of the available catalog.
//!
//! Partitioning thousands of module versions against a game-version
//! criteria is too expensive to redo per query, so the result is cached
//! keyed by the criteria that produced it. Replacement is all-or-nothing:
//! any catalog mutation drops the sorter, and a query with different
//! criteria rebuilds it from scratch.

use std::collections::BTreeSet;

use tracing::debug;

use super::available::AvailableModule;
use crate::version::game::GameVersionCriteria;

/// One criteria's partition of the catalog.
#[derive(Debug, Clone)]
pub struct CompatibilitySorter {
    criteria: GameVersionCriteria,
    compatible: BTreeSet<String>,
    incompatible: BTreeSet<String>,
}

impl CompatibilitySorter {
    /// Partition `catalog` under `criteria`: an identifier is compatible
    /// when at least one of its versions fits.
    #[must_use]
    pub fn build<'a>(
        criteria: GameVersionCriteria,
        catalog: impl IntoIterator<Item = &'a AvailableModule>,
    ) -> Self {
        let mut compatible = BTreeSet::new();
        let mut incompatible = BTreeSet::new();
        for available in catalog {
            if available.latest(Some(&criteria), None, &[]).is_some() {
                compatible.insert(available.identifier().to_string());
            } else {
                incompatible.insert(available.identifier().to_string());
            }
        }
        debug!(
            compatible = compatible.len(),
            incompatible = incompatible.len(),
            "partitioned catalog"
        );
        Self {
            criteria,
            compatible,
            incompatible,
        }
    }

    /// Can this partition answer queries for `criteria`?
    #[must_use]
    pub fn matches(&self, criteria: &GameVersionCriteria) -> bool {
        self.criteria == *criteria
    }

    /// The criteria this partition was built for.
    #[must_use]
    pub fn criteria(&self) -> &GameVersionCriteria {
        &self.criteria
    }

    /// Identifiers with at least one compatible version.
    pub fn compatible(&self) -> impl Iterator<Item = &str> {
        self.compatible.iter().map(String::as_str)
    }

    /// Identifiers with no compatible version at all.
    pub fn incompatible(&self) -> impl Iterator<Item = &str> {
        self.incompatible.iter().map(String::as_str)
    }
}
