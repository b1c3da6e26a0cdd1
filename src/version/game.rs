//! Game versions and the compatibility criteria the user targets.
//!
//! The game publishes plain numeric versions (`1.8`, `1.12.5`). Mod metadata
//! bounds a compatibility interval with them, and the user may run several
//! game installations at once, so queries carry a *set* of acceptable
//! versions, a [`GameVersionCriteria`].
//!
//! Bound semantics follow how mod authors actually write metadata: a bound of
//! `1.8` means the whole `1.8.x` series when used as a maximum, so the
//! candidate is truncated to the bound's arity before the upper comparison,
//! while a minimum bound zero-pads (`1.8` ≤ `1.8.1`). [`GameVersion::Any`]
//! absorbs everything: as a bound it is unbounded, as a criteria member it
//! accepts every module.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::VersionParseError;

/// A version of the game itself, or the distinguished "all versions" value.
///
/// Ordering between `Any` and a concrete release is not meaningful for
/// compatibility; the total `Ord` (with `Any` last) exists so criteria can
/// live in ordered sets. Compatibility questions go through
/// [`GameVersion::within_bounds`].
#[derive(Debug, Clone)]
pub enum GameVersion {
    /// Matches every game version.
    Any,
    /// A concrete release, e.g. `1.12.2`. May be truncated (`1.8`).
    Release(Vec<u64>),
}

impl GameVersion {
    /// Parse a dotted release, e.g. `1.12.2`.
    ///
    /// Unlike [`FromStr`], this never produces [`GameVersion::Any`].
    pub fn release(s: &str) -> Result<Self, VersionParseError> {
        let components = s
            .trim()
            .split('.')
            .map(|c| {
                c.parse::<u64>().map_err(|_| VersionParseError {
                    input: s.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if components.is_empty() {
            return Err(VersionParseError {
                input: s.to_string(),
            });
        }
        Ok(Self::Release(components))
    }

    /// Whether this is the wildcard value.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    fn component(components: &[u64], index: usize) -> u64 {
        components.get(index).copied().unwrap_or(0)
    }

    /// Zero-padded comparison of two concrete releases.
    fn cmp_padded(a: &[u64], b: &[u64]) -> Ordering {
        let width = a.len().max(b.len());
        for i in 0..width {
            match Self::component(a, i).cmp(&Self::component(b, i)) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// Does this version fall inside the `[min, max]` interval a module
    /// declares?
    ///
    /// `None` and [`GameVersion::Any`] bounds are unbounded. The maximum is
    /// compared at the bound's own arity, so `max = 1.8` admits `1.8.1`.
    #[must_use]
    pub fn within_bounds(&self, min: Option<&GameVersion>, max: Option<&GameVersion>) -> bool {
        let candidate = match self {
            Self::Any => return true,
            Self::Release(components) => components,
        };
        if let Some(GameVersion::Release(lo)) = min {
            if Self::cmp_padded(candidate, lo) == Ordering::Less {
                return false;
            }
        }
        if let Some(GameVersion::Release(hi)) = max {
            let truncated: Vec<u64> =
                candidate.iter().copied().take(hi.len().max(1)).collect();
            if Self::cmp_padded(&truncated, hi) == Ordering::Greater {
                return false;
            }
        }
        true
    }

    /// The larger of two upper bounds, `Any` absorbing.
    #[must_use]
    pub fn max_bound(self, other: GameVersion) -> GameVersion {
        match (&self, &other) {
            (Self::Any, _) | (_, Self::Any) => Self::Any,
            (Self::Release(a), Self::Release(b)) => {
                if Self::cmp_padded(a, b) == Ordering::Less {
                    other
                } else {
                    self
                }
            }
        }
    }
}

impl PartialEq for GameVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GameVersion {}

impl PartialOrd for GameVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Any, Self::Any) => Ordering::Equal,
            (Self::Any, Self::Release(_)) => Ordering::Greater,
            (Self::Release(_), Self::Any) => Ordering::Less,
            (Self::Release(a), Self::Release(b)) => Self::cmp_padded(a, b),
        }
    }
}

impl fmt::Display for GameVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Release(components) => {
                let dotted =
                    components.iter().map(ToString::to_string).collect::<Vec<_>>().join(".");
                write!(f, "{dotted}")
            }
        }
    }
}

impl FromStr for GameVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("any") {
            Ok(Self::Any)
        } else {
            Self::release(s)
        }
    }
}

impl Serialize for GameVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The set of game versions the user currently targets.
///
/// A module is compatible with the criteria when its `[min, max]` interval
/// contains at least one member. Criteria equality decides whether the
/// memoized compatibility partition can be reused, so this derives `Eq`.
///
/// # Examples
///
/// ```
/// use gmpm::version::game::{GameVersion, GameVersionCriteria};
///
/// let criteria = GameVersionCriteria::from(GameVersion::release("1.8").unwrap());
/// let min = Some(GameVersion::release("1.6").unwrap());
/// let max = Some(GameVersion::release("1.9").unwrap());
/// assert!(criteria.accepts(min.as_ref(), max.as_ref()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameVersionCriteria(BTreeSet<GameVersion>);

impl GameVersionCriteria {
    /// Criteria over an explicit set of versions.
    #[must_use]
    pub fn new(versions: impl IntoIterator<Item = GameVersion>) -> Self {
        Self(versions.into_iter().collect())
    }

    /// Criteria accepting every game version.
    #[must_use]
    pub fn any() -> Self {
        Self::from(GameVersion::Any)
    }

    /// The versions in this criteria set.
    pub fn versions(&self) -> impl Iterator<Item = &GameVersion> {
        self.0.iter()
    }

    /// Does at least one targeted version fall inside `[min, max]`?
    #[must_use]
    pub fn accepts(&self, min: Option<&GameVersion>, max: Option<&GameVersion>) -> bool {
        self.0.iter().any(|v| v.within_bounds(min, max))
    }
}

impl From<GameVersion> for GameVersionCriteria {
    fn from(version: GameVersion) -> Self {
        Self(BTreeSet::from([version]))
    }
}
