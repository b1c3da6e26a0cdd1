//! Shared data models for the registry
//!
//! These are the records that cross the crate boundary: the immutable
//! metadata a repository publishes for one module version
//! ([`ModuleMetadata`]), the archive digests attached to a download
//! ([`DownloadHash`]), and the repository descriptor itself
//! ([`Repository`]). All of them are plain serde values; behavior lives in
//! the registry components that index them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::version::constraints::RelationshipDescriptor;
use crate::version::game::{GameVersion, GameVersionCriteria};
use crate::version::ModuleVersion;

/// Immutable metadata for one version of one module, as published by a
/// repository.
///
/// The registry never mutates these; an install snapshots the record as it
/// was at install time, and catalog updates replace whole records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMetadata {
    /// Short unique name, e.g. `better-antennas`.
    pub identifier: String,

    /// This record's version.
    pub version: ModuleVersion,

    /// Virtual packages this module provides.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub provides: BTreeSet<String>,

    /// Lowest game version this module works on. `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_game_version: Option<GameVersion>,

    /// Highest game version this module works on. `None` means unbounded; a
    /// truncated value like `1.8` covers the whole `1.8.x` series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_game_version: Option<GameVersion>,

    /// Hard requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends: Vec<RelationshipDescriptor>,

    /// Modules this one cannot coexist with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<RelationshipDescriptor>,

    /// Soft requirements, installed by default.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommends: Vec<RelationshipDescriptor>,

    /// Soft requirements, opt-in.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggests: Vec<RelationshipDescriptor>,

    /// Where the archive comes from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<String>,

    /// Digests of the downloaded archive, when the repository publishes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_hash: Option<DownloadHash>,
}

impl ModuleMetadata {
    /// Minimal record: identifier and version, everything else empty.
    #[must_use]
    pub fn new(identifier: impl Into<String>, version: ModuleVersion) -> Self {
        Self {
            identifier: identifier.into(),
            version,
            provides: BTreeSet::new(),
            min_game_version: None,
            max_game_version: None,
            depends: Vec::new(),
            conflicts: Vec::new(),
            recommends: Vec::new(),
            suggests: Vec::new(),
            download: None,
            download_hash: None,
        }
    }

    /// Does this version's game interval intersect the targeted versions?
    #[must_use]
    pub fn compatible_with(&self, criteria: &GameVersionCriteria) -> bool {
        criteria.accepts(self.min_game_version.as_ref(), self.max_game_version.as_ref())
    }

    /// Does this module declare a conflict that `other` triggers?
    #[must_use]
    pub fn conflicts_with(&self, other: &ModuleMetadata) -> bool {
        self.conflicts.iter().any(|clause| {
            (clause.matches_identifier(&other.identifier)
                || other.provides.iter().any(|p| clause.matches_identifier(p)))
                && clause.satisfied_by(&other.version)
        })
    }

    /// The upper game bound, with absent treated as unbounded.
    #[must_use]
    pub fn max_game_bound(&self) -> GameVersion {
        self.max_game_version.clone().unwrap_or(GameVersion::Any)
    }
}

/// Archive digests published alongside a download URL, lowercase hex.
///
/// The registry indexes these for lookup-by-hash; it never verifies them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadHash {
    /// SHA-1 digest, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,

    /// SHA-256 digest, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// A metadata repository the registry pulls its catalog from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Repository name, unique within the registry (`default` for the stock
    /// one).
    pub name: String,

    /// Archive URL the fetcher downloads metadata from.
    pub uri: String,

    /// Resolution priority; lower wins. Defaults to 0.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub priority: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
