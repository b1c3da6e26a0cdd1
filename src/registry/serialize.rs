//! Persisted blob round-trip and schema migrations.
//!
//! The registry persists as a single JSON object (see the field list on
//! [`RegistryState`](super::RegistryState)); derived caches are rebuilt on
//! load and never written. Old blobs are upgraded in place by a chain of
//! idempotent steps, so loading a current blob is a no-op upgrade and
//! loading an ancient one walks every step exactly once. Downgrading
//! (loading a blob written by a newer schema) is refused.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::ownership::FileOwnership;
use super::{Registry, RegistryState};
use crate::core::RegistryError;
use crate::utils::paths;

/// Current persisted schema version.
pub const REGISTRY_VERSION: u32 = 3;

/// Name of the stock repository every installation starts with.
pub const DEFAULT_REPOSITORY: &str = "default";

/// Archive URL the stock repository moved away from.
const LEGACY_DEFAULT_REPOSITORY_URL: &str =
    "https://archive.gmpm.example/repository/archive-legacy.zip";

/// Where the stock repository lives today.
const CURRENT_DEFAULT_REPOSITORY_URL: &str =
    "https://archive.gmpm.example/repository/archive.tar.gz";

impl Registry {
    /// Rehydrate a registry from its JSON blob, upgrading the schema as
    /// needed.
    ///
    /// `game_root` is only consulted by the pre-v1 path-renormalization
    /// step; loading an old blob without it fails with
    /// [`RegistryError::Internal`].
    pub fn from_json(blob: &str, game_root: Option<&Path>) -> Result<Self> {
        let mut state: RegistryState = serde_json::from_str(blob).context(
            "Invalid registry blob.\n\n\
             The registry file may be corrupted. You can:\n\
             - Restore it from a backup\n\
             - Delete it and re-scan; installed-module records will be lost",
        )?;
        if state.registry_version > REGISTRY_VERSION {
            return Err(RegistryError::internal(format!(
                "registry schema version {} is newer than supported version {}; \
                 this registry was written by a newer release",
                state.registry_version, REGISTRY_VERSION
            ))
            .into());
        }
        upgrade(&mut state, game_root)?;
        Ok(Self::from_state(state))
    }

    /// Serialize the current state as the persisted JSON blob.
    pub fn to_json(&mut self) -> Result<String> {
        self.settle();
        serde_json::to_string_pretty(&self.state).context("Cannot serialize registry state")
    }

    /// Load a registry blob from disk; a missing file yields an empty
    /// registry.
    pub fn load(path: &Path, game_root: Option<&Path>) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::empty());
        }
        let blob = fs::read_to_string(path)
            .with_context(|| format!("Cannot read registry file: {}", path.display()))?;
        Self::from_json(&blob, game_root)
            .with_context(|| format!("Cannot load registry file: {}", path.display()))
    }

    /// Write the blob to disk via a temporary file and rename, so a crash
    /// mid-write never leaves a truncated registry behind.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let blob = self.to_json()?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, blob)
            .with_context(|| format!("Cannot write registry file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Cannot replace registry file: {}", path.display()))?;
        Ok(())
    }
}

/// Walk the blob forward to the current schema. Every step is idempotent.
fn upgrade(
    state: &mut RegistryState,
    game_root: Option<&Path>,
) -> std::result::Result<(), RegistryError> {
    // Blobs that predate the ownership map carry only per-module file lists.
    if state.installed_files.is_empty() && !state.installed_modules.is_empty() {
        debug!("rebuilding file-ownership map from installed file lists");
        let mut rebuilt = FileOwnership::new();
        rebuilt.rebuild(state.installed_modules.values());
        state.installed_files = rebuilt;
    }

    if state.registry_version == 0 {
        let game_root = game_root.ok_or_else(|| {
            RegistryError::internal(
                "pre-v1 registry blob requires a game root to renormalize its paths",
            )
        })?;
        debug!(game_root = %game_root.display(), "renormalizing pre-v1 paths");
        let mut renormalized = FileOwnership::new();
        for (key, owner) in state.installed_files.iter() {
            let key = paths::renormalize_key(key, game_root)?;
            renormalized.claim_all(owner, [key.as_str()]);
        }
        state.installed_files = renormalized;
        for module in state.installed_modules.values_mut() {
            module.renormalize(game_root)?;
        }
    }

    if state.registry_version < 2 {
        if let Some(mut module) = state.installed_modules.remove("001ControlLock") {
            debug!("renaming installed module 001ControlLock to ControlLock");
            module.rename("ControlLock");
            state.installed_modules.insert("ControlLock".to_string(), module);
            state.installed_files.rename_owner("001ControlLock", "ControlLock");
        }
    }

    if let Some(default) = state.repositories.get_mut(DEFAULT_REPOSITORY) {
        if default.uri == LEGACY_DEFAULT_REPOSITORY_URL {
            debug!("rewriting legacy default repository URL");
            default.uri = CURRENT_DEFAULT_REPOSITORY_URL.to_string();
        }
    }

    state.registry_version = REGISTRY_VERSION;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModuleMetadata, Repository};
    use crate::version::ModuleVersion;

    #[test]
    fn test_round_trip_preserves_state() {
        let mut registry = Registry::empty();
        let mut m = ModuleMetadata::new("mod-a", ModuleVersion::parse("1.0"));
        m.provides.insert("virt".to_string());
        registry.add_available(m).unwrap();
        registry.set_download_counts([("mod-a".to_string(), 42)]).unwrap();

        let blob = registry.to_json().unwrap();
        let mut reloaded = Registry::from_json(&blob, None).unwrap();
        assert_eq!(reloaded.to_json().unwrap(), blob);
        // Derived caches come back too
        assert_eq!(reloaded.latest_available_with_provides("virt", None, None, &[]).len(), 1);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let blob = format!("{{\"registry_version\": {}}}", REGISTRY_VERSION + 1);
        let err = Registry::from_json(&blob, None).unwrap_err();
        let registry_err = err.downcast_ref::<RegistryError>().unwrap();
        assert!(matches!(registry_err, RegistryError::Internal { .. }));
    }

    #[test]
    fn test_upgrade_is_idempotent() {
        let blob = serde_json::json!({
            "registry_version": 1,
            "installed_modules": {
                "001ControlLock": {
                    "module": { "identifier": "001ControlLock", "version": "1.0" },
                    "files": ["GameData/CL/lock.cfg"],
                    "auto_installed": false,
                },
            },
        })
        .to_string();
        let mut once = Registry::from_json(&blob, None).unwrap();
        let upgraded = once.to_json().unwrap();
        let mut twice = Registry::from_json(&upgraded, None).unwrap();
        assert_eq!(twice.to_json().unwrap(), upgraded);
    }

    #[test]
    fn test_pre_v1_blob_requires_game_root() {
        let blob = serde_json::json!({ "registry_version": 0 }).to_string();
        let err = Registry::from_json(&blob, None).unwrap_err();
        let registry_err = err.downcast_ref::<RegistryError>().unwrap();
        assert!(matches!(registry_err, RegistryError::Internal { .. }));
    }

    #[test]
    fn test_legacy_default_repository_url_is_rewritten() {
        let mut registry = Registry::empty();
        registry
            .set_all_repositories([Repository {
                name: DEFAULT_REPOSITORY.to_string(),
                uri: LEGACY_DEFAULT_REPOSITORY_URL.to_string(),
                priority: 0,
            }])
            .unwrap();
        let blob = registry.to_json().unwrap();

        let mut reloaded = Registry::from_json(&blob, None).unwrap();
        let uris: Vec<String> =
            reloaded.repositories().map(|repo| repo.uri.clone()).collect();
        assert_eq!(uris, [CURRENT_DEFAULT_REPOSITORY_URL]);
    }
}
