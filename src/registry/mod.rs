//! The mod registry: the authoritative in-memory database.
//!
//! [`Registry`] tracks three worlds at once:
//!
//! - modules *available* from repositories: every known version of every
//!   mod, grouped per identifier in [`AvailableModule`](available::AvailableModule);
//! - modules *installed* on the local game: metadata snapshots plus the
//!   files they own ([`InstalledModule`](installed::InstalledModule),
//!   [`FileOwnership`](ownership::FileOwnership));
//! - *auto-detected* artifacts: loose plugin binaries and first-party DLC
//!   found on disk outside any install.
//!
//! Two derived structures hang off the aggregate: the
//! [`ProvidesIndex`](provides::ProvidesIndex) (stale-safe, rebuilt on bulk
//! changes) and the [`CompatibilitySorter`](sorter::CompatibilitySorter)
//! (dropped on any catalog change). Mutating operations enlist the registry
//! in the ambient [`Transaction`](crate::transaction::Transaction) before
//! touching anything, snapshotting the whole state on first touch.
//!
//! # Why every method takes `&mut self`
//!
//! A resolved transaction is *settled* (its commit or rollback applied)
//! at the registry's next public call, because the transaction guard cannot
//! hold a mutable borrow of the registry. Settlement can rewrite the entire
//! state, so even queries take `&mut self`. Queries remain logically pure:
//! apart from settlement they only populate the sorter cache.

pub mod available;
pub mod installed;
pub mod ownership;
pub mod provides;
pub mod serialize;
pub mod sorter;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{RegistryError, Result};
use crate::models::{ModuleMetadata, Repository};
use crate::resolver;
use crate::transaction::{self, TransactionHandle, TransactionStatus};
use crate::utils::{hash, paths};
use crate::version::constraints::RelationshipDescriptor;
use crate::version::game::{GameVersion, GameVersionCriteria};
use crate::version::ModuleVersion;

use available::AvailableModule;
use installed::InstalledModule;
use ownership::FileOwnership;
use provides::ProvidesIndex;
use sorter::CompatibilitySorter;

/// Derives a loose binary's short name from its relative path.
///
/// Only binaries under `GameData/` are indexable. The short name is the
/// file-name prefix up to the first dot: `Deep/Nested/SmokeScreen.dll`
/// indexes as `SmokeScreen`.
static DLL_SHORT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^GameData/(.*/)?([^.]+).*\.dll$").unwrap());

/// The mutable state of the registry: exactly what persists, plus the
/// transient DLC map. This is also the unit of transactional snapshots:
/// a deep clone of this struct captures everything rollback must restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct RegistryState {
    /// Persisted schema version; see [`serialize`]. Blobs that predate the
    /// field count as version 0.
    #[serde(default)]
    pub(crate) registry_version: u32,

    /// Repository catalog, lexicographically ordered on output.
    #[serde(rename = "sorted_repositories", default)]
    pub(crate) repositories: BTreeMap<String, Repository>,

    /// identifier → all known versions.
    #[serde(default)]
    pub(crate) available_modules: BTreeMap<String, AvailableModule>,

    /// identifier → installed record.
    #[serde(default)]
    pub(crate) installed_modules: BTreeMap<String, InstalledModule>,

    /// short name → relative path of loose binaries.
    #[serde(default)]
    pub(crate) installed_dlls: BTreeMap<String, String>,

    /// relative path → owning identifier. Rebuilt on load when absent.
    #[serde(default)]
    pub(crate) installed_files: FileOwnership,

    /// Detected DLC; re-detected every scan, never persisted.
    #[serde(skip)]
    pub(crate) installed_dlc: BTreeMap<String, ModuleVersion>,

    /// identifier → repository download count.
    #[serde(default)]
    pub(crate) download_counts: BTreeMap<String, u64>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            registry_version: serialize::REGISTRY_VERSION,
            repositories: BTreeMap::new(),
            available_modules: BTreeMap::new(),
            installed_modules: BTreeMap::new(),
            installed_dlls: BTreeMap::new(),
            installed_files: FileOwnership::new(),
            installed_dlc: BTreeMap::new(),
            download_counts: BTreeMap::new(),
        }
    }
}

#[derive(Debug)]
struct Enlistment {
    tx: TransactionHandle,
    snapshot: RegistryState,
}

/// The registry aggregate. See the [module docs](self) for the model.
#[derive(Debug)]
pub struct Registry {
    state: RegistryState,
    providers: ProvidesIndex,
    sorter: Option<CompatibilitySorter>,
    enlistment: Option<Enlistment>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Registry {
    /// A registry with nothing available, installed, or detected.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_state(RegistryState::default())
    }

    pub(crate) fn from_state(state: RegistryState) -> Self {
        let mut providers = ProvidesIndex::new();
        providers.rebuild(state.available_modules.values());
        Self {
            state,
            providers,
            sorter: None,
            enlistment: None,
        }
    }

    // ---- transactional plumbing -------------------------------------------

    /// Apply the outcome of a resolved transaction, if one is pending.
    fn settle(&mut self) {
        if let Some(enlistment) = self.enlistment.take() {
            match enlistment.tx.status() {
                TransactionStatus::Active => self.enlistment = Some(enlistment),
                TransactionStatus::Committed => {
                    debug!(tx = enlistment.tx.id(), "dropping snapshot after commit");
                }
                TransactionStatus::RolledBack => {
                    debug!(tx = enlistment.tx.id(), "restoring snapshot after rollback");
                    self.restore(enlistment.snapshot);
                }
            }
        }
    }

    fn restore(&mut self, snapshot: RegistryState) {
        self.state = snapshot;
        self.providers.rebuild(self.state.available_modules.values());
        self.sorter = None;
    }

    /// Join the ambient transaction, snapshotting on first touch.
    fn enlist(&mut self) -> Result<()> {
        self.settle();
        let Some(current) = transaction::current() else {
            return Ok(());
        };
        match &self.enlistment {
            Some(enlistment) if enlistment.tx.same_transaction(&current) => Ok(()),
            Some(_) => Err(RegistryError::NestedTransaction),
            None => {
                debug!(tx = current.id(), "enlisting registry; snapshotting state");
                self.enlistment = Some(Enlistment {
                    snapshot: self.state.clone(),
                    tx: current,
                });
                Ok(())
            }
        }
    }

    // ---- available catalog ------------------------------------------------

    /// Replace the entire available catalog with `modules`.
    ///
    /// The providers index is rebuilt from scratch and the compatibility
    /// partition dropped.
    pub fn set_all_available(
        &mut self,
        modules: impl IntoIterator<Item = ModuleMetadata>,
    ) -> Result<()> {
        self.enlist()?;
        self.state.available_modules.clear();
        for module in modules {
            self.state
                .available_modules
                .entry(module.identifier.clone())
                .or_insert_with(|| AvailableModule::new(module.identifier.clone()))
                .add(module);
        }
        self.providers.rebuild(self.state.available_modules.values());
        self.sorter = None;
        debug!(identifiers = self.state.available_modules.len(), "replaced available catalog");
        Ok(())
    }

    /// Upsert one record into the catalog.
    pub fn add_available(&mut self, module: ModuleMetadata) -> Result<()> {
        self.enlist()?;
        let entry = self
            .state
            .available_modules
            .entry(module.identifier.clone())
            .or_insert_with(|| AvailableModule::new(module.identifier.clone()));
        entry.add(module);
        self.providers.reindex(entry);
        self.sorter = None;
        Ok(())
    }

    /// Remove a single version; no-op when absent.
    ///
    /// The providers index is deliberately not pruned (stale entries are
    /// re-verified by [`latest_available_with_provides`](Self::latest_available_with_provides)).
    pub fn remove_available(&mut self, identifier: &str, version: &ModuleVersion) -> Result<()> {
        self.enlist()?;
        if let Some(available) = self.state.available_modules.get_mut(identifier) {
            available.remove(version);
            if available.is_empty() {
                self.state.available_modules.remove(identifier);
            }
            self.sorter = None;
        }
        Ok(())
    }

    /// All identifiers with at least one available version.
    pub fn available_identifiers(&mut self) -> impl Iterator<Item = &str> {
        self.settle();
        self.state.available_modules.keys().map(String::as_str)
    }

    /// Every known version of `identifier`, newest first.
    pub fn available_by_identifier(
        &mut self,
        identifier: &str,
    ) -> Result<impl Iterator<Item = &ModuleMetadata>> {
        self.settle();
        let available = self
            .state
            .available_modules
            .get(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;
        Ok(available.all())
    }

    /// The newest version of `identifier` that fits `criteria` and
    /// `constraint`.
    ///
    /// `Err(NotFound)` when the identifier is absent from the catalog
    /// entirely; `Ok(None)` when it exists but nothing satisfies the
    /// filters.
    pub fn latest_available(
        &mut self,
        identifier: &str,
        criteria: Option<&GameVersionCriteria>,
        constraint: Option<&RelationshipDescriptor>,
    ) -> Result<Option<&ModuleMetadata>> {
        self.settle();
        let available = self
            .state
            .available_modules
            .get(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;
        Ok(available.latest(criteria, constraint, &[]))
    }

    /// Everything currently providing the virtual package `virtual_id`.
    ///
    /// For each candidate provider the newest fitting version is chosen,
    /// then re-verified to actually list `virtual_id`, since the providers
    /// index is an over-approximation. Conflict screening considers both the
    /// installed set and `also_installing`. Empty when nothing provides.
    pub fn latest_available_with_provides(
        &mut self,
        virtual_id: &str,
        criteria: Option<&GameVersionCriteria>,
        constraint: Option<&RelationshipDescriptor>,
        also_installing: &[ModuleMetadata],
    ) -> Vec<&ModuleMetadata> {
        self.settle();
        let context: Vec<&ModuleMetadata> = self
            .state
            .installed_modules
            .values()
            .map(InstalledModule::module)
            .chain(also_installing.iter())
            .collect();
        let mut found = Vec::new();
        for provider in self.providers.providers_of(virtual_id) {
            let Some(available) = self.state.available_modules.get(provider) else {
                continue;
            };
            if let Some(module) = available.latest(criteria, constraint, &context) {
                if module.provides.contains(virtual_id) {
                    found.push(module);
                }
            }
        }
        found
    }

    /// The highest game version any version of `identifier` supports.
    pub fn latest_compatible_game_version(
        &mut self,
        identifier: &str,
    ) -> Result<Option<GameVersion>> {
        self.settle();
        let available = self
            .state
            .available_modules
            .get(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;
        Ok(available.latest_compatible_game_version())
    }

    // ---- compatibility partition ------------------------------------------

    fn ensure_sorter(&mut self, criteria: &GameVersionCriteria) {
        let current = self.sorter.as_ref().is_some_and(|s| s.matches(criteria));
        if !current {
            self.sorter = Some(CompatibilitySorter::build(
                criteria.clone(),
                self.state.available_modules.values(),
            ));
        }
    }

    /// The newest compatible version of every module compatible with
    /// `criteria`.
    pub fn compatible_modules(&mut self, criteria: &GameVersionCriteria) -> Vec<&ModuleMetadata> {
        self.settle();
        self.ensure_sorter(criteria);
        let Some(sorter) = &self.sorter else {
            return Vec::new();
        };
        sorter
            .compatible()
            .filter_map(|id| self.state.available_modules.get(id))
            .filter_map(|available| available.latest(Some(criteria), None, &[]))
            .collect()
    }

    /// The newest version of every module with no version compatible with
    /// `criteria`.
    pub fn incompatible_modules(&mut self, criteria: &GameVersionCriteria) -> Vec<&ModuleMetadata> {
        self.settle();
        self.ensure_sorter(criteria);
        let Some(sorter) = &self.sorter else {
            return Vec::new();
        };
        sorter
            .incompatible()
            .filter_map(|id| self.state.available_modules.get(id))
            .filter_map(|available| available.latest(None, None, &[]))
            .collect()
    }

    // ---- installation ------------------------------------------------------

    /// Record that `module` was installed with `absolute_files` under
    /// `game_root`.
    ///
    /// Paths are converted to relative keys at this boundary; entries that
    /// are directories on disk become shared directory keys. If any
    /// non-directory file is already owned by a *different* module the whole
    /// operation fails with [`RegistryError::Inconsistent`] listing every
    /// collision, and no state changes. Re-registering an identifier
    /// replaces its previous record and releases claims the new file list no
    /// longer covers.
    pub fn register_install(
        &mut self,
        module: ModuleMetadata,
        absolute_files: &[std::path::PathBuf],
        game_root: &Path,
        auto_installed: bool,
    ) -> Result<()> {
        self.enlist()?;

        let mut files = BTreeSet::new();
        for path in absolute_files {
            let mut key = paths::to_relative(path, game_root)?;
            if !paths::is_directory_key(&key) && paths::to_absolute(&key, game_root).is_dir() {
                key.push('/');
            }
            files.insert(key);
        }

        let conflicts = self
            .state
            .installed_files
            .find_collisions(&module.identifier, files.iter().map(String::as_str));
        if !conflicts.is_empty() {
            return Err(RegistryError::Inconsistent {
                conflicts,
            });
        }

        let identifier = module.identifier.clone();
        if let Some(previous) = self.state.installed_modules.remove(&identifier) {
            debug!(module = %identifier, "replacing existing install record");
            self.state.installed_files.release_all(&identifier, previous.files());
        }
        self.state
            .installed_files
            .claim_all(&identifier, files.iter().map(String::as_str));
        self.state
            .installed_modules
            .insert(identifier.clone(), InstalledModule::new(module, files, auto_installed));
        debug!(module = %identifier, auto_installed, "registered install");
        Ok(())
    }

    /// Forget an installed module, releasing its file claims.
    ///
    /// Fails with [`RegistryError::Inconsistent`] if any of its regular
    /// files still exist on disk; the installer must delete first,
    /// deregister second.
    pub fn deregister_install(
        &mut self,
        identifier: &str,
        game_root: &Path,
    ) -> Result<InstalledModule> {
        self.enlist()?;
        let module = self
            .state
            .installed_modules
            .get(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;

        let leftovers: Vec<String> = module
            .files()
            .filter(|key| !paths::is_directory_key(key))
            .filter(|key| paths::to_absolute(key, game_root).exists())
            .map(|key| format!("{key} is still on disk but {identifier} is being deregistered"))
            .collect();
        if !leftovers.is_empty() {
            return Err(RegistryError::Inconsistent {
                conflicts: leftovers,
            });
        }

        let module = self
            .state
            .installed_modules
            .remove(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;
        self.state.installed_files.release_all(identifier, module.files());
        debug!(module = %identifier, "deregistered install");
        Ok(module)
    }

    /// Installed record for `identifier`, if any.
    pub fn installed_module(&mut self, identifier: &str) -> Option<&InstalledModule> {
        self.settle();
        self.state.installed_modules.get(identifier)
    }

    /// All installed records, in identifier order.
    pub fn installed_modules(&mut self) -> impl Iterator<Item = &InstalledModule> {
        self.settle();
        self.state.installed_modules.values()
    }

    /// Adopt or disown an installed module as auto-installed.
    pub fn set_auto_installed(&mut self, identifier: &str, auto_installed: bool) -> Result<()> {
        self.enlist()?;
        let module = self
            .state
            .installed_modules
            .get_mut(identifier)
            .ok_or_else(|| RegistryError::not_found(identifier))?;
        module.set_auto_installed(auto_installed);
        Ok(())
    }

    // ---- auto-detected artifacts ------------------------------------------

    /// Index a loose plugin binary found on disk.
    ///
    /// Paths already owned by an installed module are skipped: the module
    /// accounts for them. Paths whose name cannot be derived (outside
    /// `GameData/`, not a `.dll`) are ignored.
    pub fn register_dll(&mut self, game_root: &Path, absolute_path: &Path) -> Result<()> {
        self.enlist()?;
        let key = paths::to_relative(absolute_path, game_root)?;
        if self.state.installed_files.contains(&key) {
            debug!(path = %key, "binary already owned by an installed module; skipping");
            return Ok(());
        }
        let Some(short_name) =
            DLL_SHORT_NAME_RE.captures(&key).and_then(|caps| caps.get(2))
        else {
            debug!(path = %key, "path is not an indexable plugin binary");
            return Ok(());
        };
        self.state.installed_dlls.insert(short_name.as_str().to_string(), key.clone());
        debug!(path = %key, "registered loose binary");
        Ok(())
    }

    /// Forget every detected loose binary (precedes a re-scan).
    pub fn clear_dlls(&mut self) -> Result<()> {
        self.enlist()?;
        self.state.installed_dlls.clear();
        Ok(())
    }

    /// short name → relative path of every detected loose binary.
    pub fn installed_dlls(&mut self) -> impl Iterator<Item = (&str, &str)> {
        self.settle();
        self.state.installed_dlls.iter().map(|(name, path)| (name.as_str(), path.as_str()))
    }

    /// Record a detected piece of first-party DLC.
    pub fn register_dlc(&mut self, identifier: &str, version: ModuleVersion) -> Result<()> {
        self.enlist()?;
        self.state.installed_dlc.insert(identifier.to_string(), version);
        Ok(())
    }

    /// Forget every detected DLC (precedes a re-scan).
    pub fn clear_dlc(&mut self) -> Result<()> {
        self.enlist()?;
        self.state.installed_dlc.clear();
        Ok(())
    }

    // ---- installed overlay -------------------------------------------------

    /// Everything "installed" in the widest sense: loose binaries, virtual
    /// provisions (when `with_provides`), real installs, and DLC, with
    /// later layers overwriting earlier ones per key.
    pub fn installed(&mut self, with_provides: bool) -> BTreeMap<String, ModuleVersion> {
        self.settle();
        let mut overlay: BTreeMap<String, ModuleVersion> = BTreeMap::new();
        for short_name in self.state.installed_dlls.keys() {
            overlay.insert(short_name.clone(), ModuleVersion::Unmanaged(None));
        }
        if with_provides {
            for module in self.state.installed_modules.values() {
                for provided in &module.module().provides {
                    overlay.insert(
                        provided.clone(),
                        ModuleVersion::Provides {
                            provider: module.identifier().to_string(),
                            version: module.version().to_string(),
                        },
                    );
                }
            }
        }
        for (identifier, module) in &self.state.installed_modules {
            overlay.insert(identifier.clone(), module.version().clone());
        }
        for (identifier, version) in &self.state.installed_dlc {
            overlay.insert(identifier.clone(), version.clone());
        }
        overlay
    }

    /// The version `identifier` is present as, if at all.
    ///
    /// Precedence: DLC, then a real install, then a loose binary, then
    /// (when `with_provides`) a virtual provision.
    pub fn installed_version(
        &mut self,
        identifier: &str,
        with_provides: bool,
    ) -> Option<ModuleVersion> {
        self.settle();
        if let Some(version) = self.state.installed_dlc.get(identifier) {
            return Some(version.clone());
        }
        if let Some(module) = self.state.installed_modules.get(identifier) {
            return Some(module.version().clone());
        }
        if self.state.installed_dlls.contains_key(identifier) {
            return Some(ModuleVersion::Unmanaged(None));
        }
        if with_provides {
            for module in self.state.installed_modules.values() {
                if module.module().provides.contains(identifier) {
                    return Some(ModuleVersion::Provides {
                        provider: module.identifier().to_string(),
                        version: module.version().to_string(),
                    });
                }
            }
        }
        None
    }

    /// Is a strictly newer, criteria-compatible version of an installed
    /// module available?
    ///
    /// Only release versions order; an unmanaged version on either side
    /// never counts as an update.
    pub fn has_update(&mut self, identifier: &str, criteria: &GameVersionCriteria) -> bool {
        self.settle();
        let Some(installed) = self.state.installed_modules.get(identifier) else {
            return false;
        };
        let Some(available) = self.state.available_modules.get(identifier) else {
            return false;
        };
        match available.latest(Some(criteria), None, &[]) {
            Some(candidate) => {
                match (candidate.version.as_release(), installed.version().as_release()) {
                    (Some(latest), Some(current)) => latest > current,
                    _ => false,
                }
            }
            None => false,
        }
    }

    // ---- file ownership ----------------------------------------------------

    /// The installed module owning the file at `relative_path`.
    ///
    /// Fails with [`RegistryError::PathError`] when given an absolute path;
    /// ownership keys are relative by construction.
    pub fn file_owner(&mut self, relative_path: &str) -> Result<Option<&str>> {
        self.settle();
        let key = paths::ensure_relative(relative_path)?;
        Ok(self.state.installed_files.owner(key))
    }

    // ---- sanity & reverse dependencies ------------------------------------

    fn installed_refs(&self) -> Vec<&InstalledModule> {
        self.state.installed_modules.values().collect()
    }

    /// Do all installed modules have their dependencies satisfied?
    pub fn check_sanity(&mut self) -> bool {
        self.get_sanity_errors().is_empty()
    }

    /// Human-readable description of every broken dependency.
    pub fn get_sanity_errors(&mut self) -> Vec<String> {
        self.settle();
        let installed = self.installed_refs();
        resolver::unsatisfied_depends(
            &installed,
            &self.state.installed_dlls,
            &self.state.installed_dlc,
        )
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    /// Identifiers broken by hypothetically removing `removing`, the
    /// removals themselves included. Lazy; see [`resolver::reverse_dependencies`].
    pub fn find_reverse_dependencies(
        &mut self,
        removing: impl IntoIterator<Item = String>,
    ) -> impl Iterator<Item = String> + '_ {
        self.settle();
        let removing: Vec<String> = removing.into_iter().collect();
        resolver::reverse_dependencies(
            &self.installed_refs(),
            &self.state.installed_dlls,
            &self.state.installed_dlc,
            removing,
        )
    }

    /// Auto-installed modules safe to remove: their closure implicates only
    /// other auto-installed modules.
    pub fn find_removable_auto_installed(&mut self) -> Vec<&InstalledModule> {
        self.settle();
        let installed = self.installed_refs();
        resolver::removable_auto_installed(
            &installed,
            &self.state.installed_dlls,
            &self.state.installed_dlc,
        )
    }

    // ---- repositories & download counts ------------------------------------

    /// The repository catalog, lexicographic by name.
    pub fn repositories(&mut self) -> impl Iterator<Item = &Repository> {
        self.settle();
        self.state.repositories.values()
    }

    /// Replace the repository catalog. Does not touch the module catalog;
    /// re-fetching is the repository layer's job.
    pub fn set_all_repositories(
        &mut self,
        repositories: impl IntoIterator<Item = Repository>,
    ) -> Result<()> {
        self.enlist()?;
        self.state.repositories =
            repositories.into_iter().map(|repo| (repo.name.clone(), repo)).collect();
        Ok(())
    }

    /// Merge in download counts: given entries overwrite, absent ones are
    /// preserved. Clear first via [`clear_download_counts`](Self::clear_download_counts)
    /// for replacement semantics.
    pub fn set_download_counts(
        &mut self,
        counts: impl IntoIterator<Item = (String, u64)>,
    ) -> Result<()> {
        self.enlist()?;
        for (identifier, count) in counts {
            self.state.download_counts.insert(identifier, count);
        }
        Ok(())
    }

    /// Forget all download counts.
    pub fn clear_download_counts(&mut self) -> Result<()> {
        self.enlist()?;
        self.state.download_counts.clear();
        Ok(())
    }

    /// Download count for `identifier`, when a repository reported one.
    pub fn download_count(&mut self, identifier: &str) -> Option<u64> {
        self.settle();
        self.state.download_counts.get(identifier).copied()
    }

    // ---- hash indexes -------------------------------------------------------

    /// sha1 → every available record downloaded with that digest.
    pub fn sha1_index(&mut self) -> BTreeMap<String, Vec<&ModuleMetadata>> {
        self.settle();
        let mut index: BTreeMap<String, Vec<&ModuleMetadata>> = BTreeMap::new();
        for available in self.state.available_modules.values() {
            for module in available.all() {
                if let Some(sha1) = module.download_hash.as_ref().and_then(|h| h.sha1.as_ref()) {
                    index.entry(sha1.clone()).or_default().push(module);
                }
            }
        }
        index
    }

    /// URL hash (cache key) → every available record downloaded from that
    /// URL. See [`hash::url_hash`].
    pub fn download_hash_index(&mut self) -> BTreeMap<String, Vec<&ModuleMetadata>> {
        self.settle();
        let mut index: BTreeMap<String, Vec<&ModuleMetadata>> = BTreeMap::new();
        for available in self.state.available_modules.values() {
            for module in available.all() {
                if let Some(url) = &module.download {
                    index.entry(hash::url_hash(url)).or_default().push(module);
                }
            }
        }
        index
    }
}
