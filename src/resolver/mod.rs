//! Dependency sanity checking and reverse-dependency analysis.
//!
//! The *sanity predicate* asks: given a hypothetical installed set plus the
//! auto-detected universe (loose binaries and DLC), whose `depends` clauses
//! can no longer be satisfied? The *reverse-dependency closure* iterates
//! that predicate: start from a removal set, see what breaks, treat the
//! broken modules as also removed, and repeat until nothing new breaks.
//!
//! The closure is exposed as a lazy iterator because consumers frequently
//! stop early: "would removing X break anything?" is answered by the
//! second yielded element. Termination is structural: the removal set
//! strictly grows while the loop continues and is bounded by the installed
//! set.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use tracing::trace;

use crate::registry::installed::InstalledModule;
use crate::version::constraints::RelationshipDescriptor;
use crate::version::ModuleVersion;

/// One unsatisfiable `depends` clause of one installed module.
#[derive(Debug, Clone)]
pub struct SanityIssue<'a> {
    /// The module whose dependency is broken
    pub module: &'a InstalledModule,
    /// The clause that nothing satisfies
    pub depends: &'a RelationshipDescriptor,
}

impl fmt::Display for SanityIssue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} requires {}, which is not installed",
            self.module.identifier(),
            self.module.version(),
            self.depends.identifier
        )
    }
}

/// Can `descriptor` be satisfied by anything in the universe?
///
/// A member satisfies the clause when its identifier matches (directly or
/// via `any_of`) and its version fits, or when it *provides* one of the
/// clause's names. Virtual provisions carry placeholder versions, so they
/// satisfy unversioned clauses only. Loose binaries count as unversioned
/// artifacts under their derived short name.
fn satisfiable(
    descriptor: &RelationshipDescriptor,
    installed: &[&InstalledModule],
    dlls: &BTreeMap<String, String>,
    dlc: &BTreeMap<String, ModuleVersion>,
) -> bool {
    let by_module = installed.iter().any(|member| {
        let metadata = member.module();
        if descriptor.matches_identifier(&metadata.identifier)
            && descriptor.satisfied_by(&metadata.version)
        {
            return true;
        }
        descriptor.names().any(|name| metadata.provides.contains(name))
            && descriptor.satisfied_by(&ModuleVersion::Provides {
                provider: metadata.identifier.clone(),
                version: metadata.version.to_string(),
            })
    });
    if by_module {
        return true;
    }
    if dlls.keys().any(|short_name| {
        descriptor.matches_identifier(short_name)
            && descriptor.satisfied_by(&ModuleVersion::Unmanaged(None))
    }) {
        return true;
    }
    dlc.iter().any(|(identifier, version)| {
        descriptor.matches_identifier(identifier) && descriptor.satisfied_by(version)
    })
}

/// The subset of `installed` whose `depends` cannot all be met by
/// `installed ∪ dlls ∪ dlc`.
pub fn unsatisfied_depends<'a>(
    installed: &[&'a InstalledModule],
    dlls: &BTreeMap<String, String>,
    dlc: &BTreeMap<String, ModuleVersion>,
) -> Vec<SanityIssue<'a>> {
    let mut issues = Vec::new();
    for member in installed.iter().copied() {
        for depends in &member.module().depends {
            if !satisfiable(depends, installed, dlls, dlc) {
                trace!(module = member.identifier(), depends = %depends.identifier, "unsatisfied");
                issues.push(SanityIssue {
                    module: member,
                    depends,
                });
            }
        }
    }
    issues
}

/// Lazy transitive closure over broken-dependency sets.
///
/// Yields every requested identifier first, then each wave of modules whose
/// dependencies the accumulated removals break, until a wave comes back
/// empty. Created via [`reverse_dependencies`].
pub struct ReverseDependencies<'a> {
    installed: Vec<&'a InstalledModule>,
    dlls: &'a BTreeMap<String, String>,
    dlc: &'a BTreeMap<String, ModuleVersion>,
    removing: BTreeSet<String>,
    pending: VecDeque<String>,
    saturated: bool,
}

/// Identifiers that would end up broken if `removing` were uninstalled from
/// `installed`, the removals themselves included.
pub fn reverse_dependencies<'a>(
    installed: &[&'a InstalledModule],
    dlls: &'a BTreeMap<String, String>,
    dlc: &'a BTreeMap<String, ModuleVersion>,
    removing: impl IntoIterator<Item = String>,
) -> ReverseDependencies<'a> {
    let removing: BTreeSet<String> = removing.into_iter().collect();
    ReverseDependencies {
        installed: installed.to_vec(),
        dlls,
        dlc,
        pending: removing.iter().cloned().collect(),
        removing,
        saturated: false,
    }
}

impl Iterator for ReverseDependencies<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(identifier) = self.pending.pop_front() {
                return Some(identifier);
            }
            if self.saturated {
                return None;
            }

            let hypothetical: Vec<&InstalledModule> = self
                .installed
                .iter()
                .copied()
                .filter(|member| !self.removing.contains(member.identifier()))
                .collect();
            let broken: BTreeSet<String> =
                unsatisfied_depends(&hypothetical, self.dlls, self.dlc)
                    .into_iter()
                    .map(|issue| issue.module.identifier().to_string())
                    .collect();
            let wave: Vec<String> =
                broken.into_iter().filter(|id| !self.removing.contains(id)).collect();
            if wave.is_empty() {
                self.saturated = true;
            } else {
                self.removing.extend(wave.iter().cloned());
                self.pending.extend(wave);
            }
        }
    }
}

/// Auto-installed modules whose removal breaks nothing but other
/// auto-installed modules.
pub fn removable_auto_installed<'a>(
    installed: &[&'a InstalledModule],
    dlls: &BTreeMap<String, String>,
    dlc: &BTreeMap<String, ModuleVersion>,
) -> Vec<&'a InstalledModule> {
    let auto_ids: BTreeSet<&str> = installed
        .iter()
        .filter(|member| member.auto_installed())
        .map(|member| member.identifier())
        .collect();
    installed
        .iter()
        .copied()
        .filter(|member| member.auto_installed())
        .filter(|member| {
            reverse_dependencies(
                installed,
                dlls,
                dlc,
                [member.identifier().to_string()],
            )
            .all(|id| auto_ids.contains(id.as_str()))
        })
        .collect()
}
