//! Relationship constraints between modules.
//!
//! Every `depends`/`conflicts`/`recommends`/`suggests` clause in module
//! metadata is a [`RelationshipDescriptor`]: a target name (plus optional
//! alternative names) and a version window. The satisfaction predicate here
//! is the single source of truth used by catalog queries, conflict
//! screening, and the sanity checker.

use serde::{Deserialize, Serialize};

use super::ModuleVersion;

/// A version constraint attached to a relationship clause.
///
/// `version` is an exact pin and wins over the `min`/`max` window when set.
/// An empty descriptor (no pin, no window) is satisfied by *any* version,
/// which is how unversioned dependencies on virtual packages and
/// auto-detected binaries resolve.
///
/// # Examples
///
/// ```
/// use gmpm::version::ModuleVersion;
/// use gmpm::version::constraints::RelationshipDescriptor;
///
/// let dep = RelationshipDescriptor::new("engine-core").with_min(ModuleVersion::parse("1.2"));
/// assert!(dep.satisfied_by(&ModuleVersion::parse("1.3")));
/// assert!(!dep.satisfied_by(&ModuleVersion::parse("1.1")));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDescriptor {
    /// The module or virtual-package name this clause targets.
    pub identifier: String,

    /// Exact version pin. Takes precedence over the window below.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ModuleVersion>,

    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_version: Option<ModuleVersion>,

    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_version: Option<ModuleVersion>,

    /// Alternative identifiers that satisfy this clause equally well.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<String>,
}

impl RelationshipDescriptor {
    /// Unversioned relationship on `identifier`.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: None,
            min_version: None,
            max_version: None,
            any_of: Vec::new(),
        }
    }

    /// Pin to exactly `version`.
    #[must_use]
    pub fn with_exact(mut self, version: ModuleVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Require at least `version`.
    #[must_use]
    pub fn with_min(mut self, version: ModuleVersion) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Require at most `version`.
    #[must_use]
    pub fn with_max(mut self, version: ModuleVersion) -> Self {
        self.max_version = Some(version);
        self
    }

    /// Accept `identifier` as an alternative target.
    #[must_use]
    pub fn or_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.any_of.push(identifier.into());
        self
    }

    /// Every name this clause can be satisfied through.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.identifier.as_str()).chain(self.any_of.iter().map(String::as_str))
    }

    /// Does `identifier` name this clause's target (directly or via
    /// `any_of`)?
    #[must_use]
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.names().any(|name| name == identifier)
    }

    /// Does `candidate` fall in this clause's version window?
    ///
    /// An exact pin is plain equality, so an unmanaged version satisfies only
    /// a pin of itself. The `min`/`max` window orders release versions only:
    /// unmanaged and virtual placeholders never satisfy a bounded window, but
    /// satisfy the empty one.
    #[must_use]
    pub fn satisfied_by(&self, candidate: &ModuleVersion) -> bool {
        if let Some(exact) = &self.version {
            return candidate == exact;
        }
        if self.min_version.is_none() && self.max_version.is_none() {
            return true;
        }
        let Some(release) = candidate.as_release() else {
            return false;
        };
        if let Some(min) = &self.min_version {
            match min.as_release() {
                Some(lo) if release >= lo => {}
                _ => return false,
            }
        }
        if let Some(max) = &self.max_version {
            match max.as_release() {
                Some(hi) if release <= hi => {}
                _ => return false,
            }
        }
        true
    }
}
