//! Version primitives for mods and the game they target.
//!
//! Mod versions in the wild are loose: `1.2`, `v0.4.1`, `2.0.0-beta.3`,
//! sometimes a bare string on an auto-detected binary. This module models
//! that reality with two types:
//!
//! - [`ReleaseVersion`] - a dotted sequence of numeric components with an
//!   optional pre-release tag, totally ordered by the classical precedence
//!   rules (components left-to-right, missing trailing components are zero,
//!   a pre-release sorts below the same version without one).
//! - [`ModuleVersion`] - the sum type the registry actually stores:
//!   [`Semantic`](ModuleVersion::Semantic) for catalog entries,
//!   [`Unmanaged`](ModuleVersion::Unmanaged) for loose binaries and DLC
//!   detected on disk, and [`Provides`](ModuleVersion::Provides) as a
//!   placeholder standing in for a virtual package in query results.
//!
//! Cross-variant comparison is meaningful only as equality. `ModuleVersion`
//! still implements a *total* `Ord` so it can key ordered maps; the
//! cross-variant order (`Unmanaged < Semantic < Provides`) is a storage
//! detail and carries no compatibility meaning. Constraint logic lives in
//! [`constraints`] and only ever orders `Semantic` versions.
//!
//! Game-side types ([`GameVersion`](game::GameVersion),
//! [`GameVersionCriteria`](game::GameVersionCriteria)) are in [`game`].

pub mod constraints;
pub mod game;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Prerelease;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error raised when a string is not a valid release version.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid version '{input}'")]
pub struct VersionParseError {
    /// The string that failed to parse
    pub input: String,
}

static RELEASE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+(?:\.\d+)*)(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$").unwrap()
});

/// A released version: numeric components plus an optional pre-release tag.
///
/// Parsing accepts an optional leading `v` (`v1.2` and `1.2` are the same
/// version); display always emits the canonical unprefixed form. Trailing
/// zero components do not affect ordering or equality: `1.2 == 1.2.0`.
///
/// # Examples
///
/// ```
/// use gmpm::version::ReleaseVersion;
///
/// let stable: ReleaseVersion = "1.2".parse().unwrap();
/// let beta: ReleaseVersion = "1.2.0-beta.1".parse().unwrap();
/// assert!(beta < stable);
/// assert_eq!(stable, "v1.2.0".parse().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ReleaseVersion {
    components: Vec<u64>,
    pre: Option<Prerelease>,
}

impl ReleaseVersion {
    /// Build a version from explicit numeric components, no pre-release tag.
    #[must_use]
    pub fn new(components: Vec<u64>) -> Self {
        Self {
            components,
            pre: None,
        }
    }

    /// The numeric components as parsed (no zero padding applied).
    #[must_use]
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// The pre-release tag, if any.
    #[must_use]
    pub fn pre_release(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    /// Numeric component at `index`, treating missing trailing components as
    /// zero.
    fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }
}

impl PartialEq for ReleaseVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReleaseVersion {}

impl PartialOrd for ReleaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ReleaseVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.components.len().max(other.components.len());
        for i in 0..width {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        // Equal numerics: a tagged version precedes the untagged one, and
        // semver precedence settles tag-vs-tag.
        match (&self.pre, &other.pre) {
            (None, None) => Ordering::Equal,
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dotted =
            self.components.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
        match &self.pre {
            Some(pre) => write!(f, "{dotted}-{pre}"),
            None => write!(f, "{dotted}"),
        }
    }
}

impl FromStr for ReleaseVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = RELEASE_RE.captures(s.trim()).ok_or_else(|| VersionParseError {
            input: s.to_string(),
        })?;
        let components = caps[1]
            .split('.')
            .map(|c| {
                c.parse::<u64>().map_err(|_| VersionParseError {
                    input: s.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let pre = match caps.get(2) {
            Some(tag) => Some(Prerelease::new(tag.as_str()).map_err(|_| VersionParseError {
                input: s.to_string(),
            })?),
            None => None,
        };
        Ok(Self {
            components,
            pre,
        })
    }
}

impl Serialize for ReleaseVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReleaseVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The version attached to a module the registry knows about.
///
/// Catalog entries always carry [`Semantic`](Self::Semantic) versions. The
/// other two variants exist for the overlays the registry reports to the
/// solver: auto-detected artifacts whose version is at best an opaque string,
/// and virtual packages that are "versioned" only by whoever provides them.
#[derive(Debug, Clone)]
pub enum ModuleVersion {
    /// A real, ordered release version from module metadata.
    Semantic(ReleaseVersion),
    /// An auto-detected artifact: version string if one could be read from
    /// the artifact, otherwise `None`. Comparable only by equality.
    Unmanaged(Option<String>),
    /// Placeholder for a virtual package: who provides it and the provider's
    /// version rendered as a string. Never persisted.
    Provides {
        /// Identifier of the providing module
        provider: String,
        /// The provider's version, display form
        version: String,
    },
}

impl ModuleVersion {
    /// Parse a version string. Infallible: anything that is not a release
    /// version becomes [`Unmanaged`](Self::Unmanaged), with the empty string
    /// mapping to an absent version.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Self::Unmanaged(None);
        }
        match trimmed.parse::<ReleaseVersion>() {
            Ok(release) => Self::Semantic(release),
            Err(_) => Self::Unmanaged(Some(trimmed.to_string())),
        }
    }

    /// The release version, when this is a [`Semantic`](Self::Semantic)
    /// version.
    #[must_use]
    pub fn as_release(&self) -> Option<&ReleaseVersion> {
        match self {
            Self::Semantic(release) => Some(release),
            _ => None,
        }
    }

    /// Whether this is a real release version (as opposed to an unmanaged or
    /// virtual placeholder).
    #[must_use]
    pub fn is_semantic(&self) -> bool {
        matches!(self, Self::Semantic(_))
    }

    fn variant_rank(&self) -> u8 {
        match self {
            Self::Unmanaged(_) => 0,
            Self::Semantic(_) => 1,
            Self::Provides {
                ..
            } => 2,
        }
    }
}

impl PartialEq for ModuleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ModuleVersion {}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleVersion {
    /// Total order so versions can key ordered maps. Within `Semantic` this
    /// is the compatibility order; across variants it is storage order only.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Semantic(a), Self::Semantic(b)) => a.cmp(b),
            (Self::Unmanaged(a), Self::Unmanaged(b)) => a.cmp(b),
            (
                Self::Provides {
                    provider: ap,
                    version: av,
                },
                Self::Provides {
                    provider: bp,
                    version: bv,
                },
            ) => ap.cmp(bp).then_with(|| av.cmp(bv)),
            (a, b) => a.variant_rank().cmp(&b.variant_rank()),
        }
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Semantic(release) => write!(f, "{release}"),
            Self::Unmanaged(Some(raw)) => write!(f, "{raw}"),
            Self::Unmanaged(None) => write!(f, "autodetected"),
            Self::Provides {
                version, ..
            } => write!(f, "{version}"),
        }
    }
}

impl FromStr for ModuleVersion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<ReleaseVersion> for ModuleVersion {
    fn from(release: ReleaseVersion) -> Self {
        Self::Semantic(release)
    }
}

impl Serialize for ModuleVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Persisted state only ever contains Semantic and Unmanaged values;
        // Provides placeholders live in query results.
        match self {
            Self::Unmanaged(None) => serializer.serialize_str(""),
            other => serializer.collect_str(other),
        }
    }
}

impl<'de> Deserialize<'de> for ModuleVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(s: &str) -> ReleaseVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_release_parse() {
        let v = release("1.10.2");
        assert_eq!(v.components(), &[1, 10, 2]);
        assert_eq!(v.pre_release(), None);

        let v = release("v0.4");
        assert_eq!(v.components(), &[0, 4]);

        let v = release("2.0.0-beta.3");
        assert_eq!(v.pre_release(), Some("beta.3"));

        assert!("".parse::<ReleaseVersion>().is_err());
        assert!("1.2.x".parse::<ReleaseVersion>().is_err());
        assert!("not-a-version".parse::<ReleaseVersion>().is_err());
    }

    #[test]
    fn test_release_ordering() {
        assert!(release("1.2") < release("1.10"));
        assert!(release("1.2.1") > release("1.2"));
        assert_eq!(release("1.2"), release("1.2.0"));

        // Pre-release sorts below the plain version
        assert!(release("1.0.0-alpha") < release("1.0.0"));
        assert!(release("1.0.0-alpha") < release("1.0.0-beta"));
        assert!(release("1.0.0-beta.2") < release("1.0.0-beta.11"));
    }

    #[test]
    fn test_release_display_round_trip() {
        for raw in ["1.2", "0.25.4", "2.0.0-rc.1"] {
            assert_eq!(release(raw).to_string(), raw);
        }
        // v prefix is normalized away
        assert_eq!(release("v1.2").to_string(), "1.2");
    }

    #[test]
    fn test_module_version_parse_total() {
        assert!(matches!(ModuleVersion::parse("1.2.3"), ModuleVersion::Semantic(_)));
        assert!(matches!(
            ModuleVersion::parse("nightly-2024"),
            ModuleVersion::Unmanaged(Some(_))
        ));
        assert!(matches!(ModuleVersion::parse(""), ModuleVersion::Unmanaged(None)));
    }

    #[test]
    fn test_module_version_equality_only_across_variants() {
        let semantic = ModuleVersion::parse("1.0");
        let unmanaged = ModuleVersion::Unmanaged(Some("1.0-custom-build".to_string()));
        assert_ne!(semantic, unmanaged);
        assert_eq!(unmanaged, ModuleVersion::Unmanaged(Some("1.0-custom-build".to_string())));
    }

    #[test]
    fn test_module_version_storage_order_is_total() {
        let mut versions = vec![
            ModuleVersion::Provides {
                provider: "core".to_string(),
                version: "1.0".to_string(),
            },
            ModuleVersion::parse("2.0"),
            ModuleVersion::Unmanaged(None),
            ModuleVersion::parse("1.0"),
        ];
        versions.sort();
        assert!(matches!(versions[0], ModuleVersion::Unmanaged(None)));
        assert_eq!(versions[1], ModuleVersion::parse("1.0"));
        assert_eq!(versions[2], ModuleVersion::parse("2.0"));
        assert!(matches!(versions[3], ModuleVersion::Provides { .. }));
    }

    #[test]
    fn test_serde_string_codec() {
        let v = ModuleVersion::parse("1.4.1-beta");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1.4.1-beta\"");
        let back: ModuleVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);

        let unmanaged = ModuleVersion::Unmanaged(None);
        let json = serde_json::to_string(&unmanaged).unwrap();
        assert_eq!(json, "\"\"");
        let back: ModuleVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(back, unmanaged);
    }
}
