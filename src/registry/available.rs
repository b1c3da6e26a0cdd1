//! All known versions of a single module.
//!
//! Repositories publish one [`ModuleMetadata`] record per version; the
//! registry groups them per identifier in an [`AvailableModule`] so "latest
//! version of X that fits" is one ordered-map walk. Version order is the
//! compatibility order of [`ModuleVersion`]; two textually different but
//! equal versions (`1.2` vs `1.2.0`) occupy one slot and the last-added
//! record wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::ModuleMetadata;
use crate::version::constraints::RelationshipDescriptor;
use crate::version::game::{GameVersion, GameVersionCriteria};
use crate::version::ModuleVersion;

/// The bag of every known version of one module identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableModule {
    identifier: String,
    module_versions: BTreeMap<ModuleVersion, ModuleMetadata>,
}

impl AvailableModule {
    /// Empty bag for `identifier`.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            module_versions: BTreeMap::new(),
        }
    }

    /// The identifier every record in this bag shares.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Insert a record keyed by its version, silently replacing an equal
    /// version: newer repository metadata wins.
    pub fn add(&mut self, module: ModuleMetadata) {
        if module.identifier != self.identifier {
            warn!(
                expected = %self.identifier,
                got = %module.identifier,
                "refusing record with mismatched identifier"
            );
            return;
        }
        self.module_versions.insert(module.version.clone(), module);
    }

    /// Erase the record at `version`; no-op when absent.
    pub fn remove(&mut self, version: &ModuleVersion) {
        self.module_versions.remove(version);
    }

    /// Whether no versions remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.module_versions.is_empty()
    }

    /// Number of known versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.module_versions.len()
    }

    /// Record at exactly `version`.
    #[must_use]
    pub fn get(&self, version: &ModuleVersion) -> Option<&ModuleMetadata> {
        self.module_versions.get(version)
    }

    /// All records, newest first.
    pub fn all(&self) -> impl Iterator<Item = &ModuleMetadata> {
        self.module_versions.values().rev()
    }

    /// The newest record passing every given filter.
    ///
    /// Filters, all optional or empty by default:
    /// - `criteria`: the record's game interval must intersect it;
    /// - `constraint`: the record's version must satisfy it;
    /// - `context`: already-installed plus hypothetically-incoming modules;
    ///   the record must not conflict with any of them, in either direction.
    #[must_use]
    pub fn latest(
        &self,
        criteria: Option<&GameVersionCriteria>,
        constraint: Option<&RelationshipDescriptor>,
        context: &[&ModuleMetadata],
    ) -> Option<&ModuleMetadata> {
        self.module_versions.values().rev().find(|candidate| {
            if let Some(criteria) = criteria {
                if !candidate.compatible_with(criteria) {
                    return false;
                }
            }
            if let Some(constraint) = constraint {
                if !constraint.satisfied_by(&candidate.version) {
                    return false;
                }
            }
            context
                .iter()
                .all(|other| !candidate.conflicts_with(other) && !other.conflicts_with(candidate))
        })
    }

    /// The highest game version any record claims to support, `Any`
    /// absorbing. `None` when the bag is empty.
    #[must_use]
    pub fn latest_compatible_game_version(&self) -> Option<GameVersion> {
        self.module_versions
            .values()
            .map(ModuleMetadata::max_game_bound)
            .reduce(GameVersion::max_bound)
    }
}
