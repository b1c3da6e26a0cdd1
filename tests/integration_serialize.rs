//! Blob round-trips and schema upgrades.

mod common;

use common::{game_root, module, providing, touch};
use gmpm::models::{DownloadHash, Repository};
use gmpm::registry::Registry;
use serde_json::{json, Value};

#[test]
fn round_trip_is_identity() {
    let root = game_root();
    let mut registry = Registry::empty();

    registry
        .set_all_repositories([Repository {
            name: "default".to_string(),
            uri: "https://archive.gmpm.example/repository/archive.tar.gz".to_string(),
            priority: 0,
        }])
        .unwrap();
    let mut rich = providing("mod-a", "1.2", &["virt"]);
    rich.download = Some("https://example.com/mod-a.zip".to_string());
    rich.download_hash = Some(DownloadHash {
        sha1: Some("aabbccdd".to_string()),
        sha256: None,
    });
    registry.add_available(rich).unwrap();
    registry.add_available(module("mod-a", "1.3")).unwrap();

    let file = touch(root.path(), "GameData/A/a.cfg");
    registry.register_install(module("mod-a", "1.2"), &[file], root.path(), false).unwrap();
    let dll = touch(root.path(), "GameData/Loose.dll");
    registry.register_dll(root.path(), &dll).unwrap();
    registry.set_download_counts([("mod-a".to_string(), 7)]).unwrap();

    let blob = registry.to_json().unwrap();
    let mut reloaded = Registry::from_json(&blob, Some(root.path())).unwrap();
    assert_eq!(reloaded.to_json().unwrap(), blob);

    // Derived state is rebuilt, not persisted
    assert_eq!(reloaded.latest_available_with_provides("virt", None, None, &[]).len(), 1);
    assert_eq!(reloaded.file_owner("GameData/A/a.cfg").unwrap(), Some("mod-a"));
}

#[test]
fn schema_zero_blob_is_upgraded_in_full() {
    let root = game_root();
    let absolute = root
        .path()
        .join("GameData/CL/lock.cfg")
        .to_string_lossy()
        .into_owned();

    let mut blob = json!({
        "registry_version": 0,
        "sorted_repositories": {
            "default": {
                "name": "default",
                "uri": "https://archive.gmpm.example/repository/archive-legacy.zip",
            },
        },
        "installed_modules": {
            "001ControlLock": {
                "module": { "identifier": "001ControlLock", "version": "1.0" },
                "files": [absolute.clone()],
                "auto_installed": false,
            },
        },
        "installed_files": {},
    });
    blob["installed_files"][absolute.as_str()] = json!("001ControlLock");
    let blob = blob.to_string();

    let mut registry = Registry::from_json(&blob, Some(root.path())).unwrap();

    // Paths are relative, the module is renamed, the schema is current
    assert_eq!(registry.file_owner("GameData/CL/lock.cfg").unwrap(), Some("ControlLock"));
    let installed = registry.installed_module("ControlLock").unwrap();
    assert_eq!(installed.module().identifier, "ControlLock");
    assert_eq!(installed.files().collect::<Vec<_>>(), ["GameData/CL/lock.cfg"]);
    assert!(registry.installed_module("001ControlLock").is_none());

    let upgraded: Value = serde_json::from_str(&registry.to_json().unwrap()).unwrap();
    assert_eq!(upgraded["registry_version"], 3);
    assert_eq!(
        upgraded["sorted_repositories"]["default"]["uri"],
        "https://archive.gmpm.example/repository/archive.tar.gz"
    );
}

#[test]
fn upgrade_is_idempotent() {
    let root = game_root();
    let absolute = root
        .path()
        .join("GameData/CL/lock.cfg")
        .to_string_lossy()
        .into_owned();
    let blob = json!({
        "registry_version": 0,
        "installed_modules": {
            "001ControlLock": {
                "module": { "identifier": "001ControlLock", "version": "1.0" },
                "files": [absolute],
                "auto_installed": false,
            },
        },
    })
    .to_string();

    let mut once = Registry::from_json(&blob, Some(root.path())).unwrap();
    let upgraded = once.to_json().unwrap();
    let mut twice = Registry::from_json(&upgraded, Some(root.path())).unwrap();
    assert_eq!(twice.to_json().unwrap(), upgraded);
}

#[test]
fn missing_ownership_map_is_rebuilt_from_file_lists() {
    let blob = json!({
        "registry_version": 3,
        "installed_modules": {
            "mod-a": {
                "module": { "identifier": "mod-a", "version": "1.0" },
                "files": ["GameData/A/a.cfg"],
                "auto_installed": false,
            },
        },
    })
    .to_string();

    let mut registry = Registry::from_json(&blob, None).unwrap();
    assert_eq!(registry.file_owner("GameData/A/a.cfg").unwrap(), Some("mod-a"));
}

#[test]
fn save_and_load_through_disk() {
    let dir = game_root();
    let path = dir.path().join("registry.json");

    let mut registry = Registry::empty();
    registry.add_available(module("mod-a", "1.0")).unwrap();
    registry.save(&path).unwrap();

    let mut reloaded = Registry::load(&path, None).unwrap();
    assert!(reloaded.latest_available("mod-a", None, None).unwrap().is_some());

    // Loading a missing file yields an empty registry
    let mut fresh = Registry::load(&dir.path().join("absent.json"), None).unwrap();
    assert!(fresh.latest_available("mod-a", None, None).is_err());
}
