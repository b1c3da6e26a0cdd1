//! End-to-end registry behavior: ownership collisions, provides resolution,
//! game-version filtering, and reverse dependencies.

mod common;

use std::collections::BTreeSet;

use common::{depending, game_root, module, module_for_game, providing, touch};
use gmpm::core::RegistryError;
use gmpm::registry::Registry;
use gmpm::version::game::{GameVersion, GameVersionCriteria};

fn criteria(game: &str) -> GameVersionCriteria {
    GameVersionCriteria::from(game.parse::<GameVersion>().unwrap())
}

#[test]
fn ownership_collision_fails_and_leaves_registry_untouched() {
    let root = game_root();
    let mut registry = Registry::empty();
    registry.add_available(module("mod-A", "1.0")).unwrap();
    registry.add_available(module("mod-B", "1.0")).unwrap();

    let shared = touch(root.path(), "GameData/A/a.cfg");
    registry
        .register_install(module("mod-A", "1.0"), &[shared.clone()], root.path(), false)
        .unwrap();

    let err = registry
        .register_install(module("mod-B", "1.0"), &[shared], root.path(), false)
        .unwrap_err();
    let RegistryError::Inconsistent {
        conflicts,
    } = &err
    else {
        panic!("expected Inconsistent, got {err:?}");
    };
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].contains("mod-B"));
    assert!(conflicts[0].contains("GameData/A/a.cfg"));
    assert!(conflicts[0].contains("mod-A"));

    // No partial state: mod-B is not installed, mod-A still owns the file
    assert!(registry.installed_module("mod-B").is_none());
    assert_eq!(registry.file_owner("GameData/A/a.cfg").unwrap(), Some("mod-A"));
}

#[test]
fn install_then_deregister_restores_prior_state() {
    let root = game_root();
    let mut registry = Registry::empty();
    let before = registry.to_json().unwrap();

    let file = touch(root.path(), "GameData/M/m.cfg");
    registry
        .register_install(module("mod-M", "1.0"), &[file.clone()], root.path(), true)
        .unwrap();
    assert_eq!(registry.file_owner("GameData/M/m.cfg").unwrap(), Some("mod-M"));
    assert!(registry.installed_module("mod-M").unwrap().auto_installed());

    // Deregistering while the file is still on disk is refused
    let err = registry.deregister_install("mod-M", root.path()).unwrap_err();
    assert!(matches!(err, RegistryError::Inconsistent { .. }));

    std::fs::remove_file(&file).unwrap();
    registry.deregister_install("mod-M", root.path()).unwrap();

    assert!(registry.installed_module("mod-M").is_none());
    assert_eq!(registry.file_owner("GameData/M/m.cfg").unwrap(), None);
    assert_eq!(registry.to_json().unwrap(), before);
}

#[test]
fn provides_resolution_returns_each_providers_latest() {
    let mut registry = Registry::empty();
    registry.add_available(providing("mod-X", "1.0", &["virt"])).unwrap();
    registry.add_available(providing("mod-Y", "1.0", &["virt"])).unwrap();
    registry.add_available(providing("mod-Y", "2.0", &["virt"])).unwrap();

    let found = registry.latest_available_with_provides("virt", Some(&criteria("1.8")), None, &[]);
    let mut summary: Vec<(String, String)> = found
        .iter()
        .map(|m| (m.identifier.clone(), m.version.to_string()))
        .collect();
    summary.sort();
    assert_eq!(
        summary,
        [
            ("mod-X".to_string(), "1.0".to_string()),
            ("mod-Y".to_string(), "2.0".to_string()),
        ]
    );
}

#[test]
fn game_version_filter_selects_per_criteria() {
    let mut registry = Registry::empty();
    registry.add_available(module_for_game("mod-K", "1.0", "1.8", "1.8")).unwrap();
    registry.add_available(module_for_game("mod-K", "2.0", "1.10", "1.12")).unwrap();

    let v1 = registry.latest_available("mod-K", Some(&criteria("1.8")), None).unwrap();
    assert_eq!(v1.unwrap().version.to_string(), "1.0");

    let v2 = registry.latest_available("mod-K", Some(&criteria("1.11")), None).unwrap();
    assert_eq!(v2.unwrap().version.to_string(), "2.0");

    // Known identifier, nothing compatible: None rather than an error
    let none = registry.latest_available("mod-K", Some(&criteria("1.9")), None).unwrap();
    assert!(none.is_none());

    // Unknown identifier: an error
    let err = registry.latest_available("mod-Z", Some(&criteria("1.8")), None).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { .. }));
}

#[test]
fn compatibility_partition_covers_the_catalog() {
    let mut registry = Registry::empty();
    registry.add_available(module_for_game("old", "1.0", "1.6", "1.8")).unwrap();
    registry.add_available(module_for_game("new", "1.0", "1.10", "1.12")).unwrap();
    registry.add_available(module("timeless", "1.0")).unwrap();

    let compatible: BTreeSet<String> = registry
        .compatible_modules(&criteria("1.8"))
        .iter()
        .map(|m| m.identifier.clone())
        .collect();
    let incompatible: BTreeSet<String> = registry
        .incompatible_modules(&criteria("1.8"))
        .iter()
        .map(|m| m.identifier.clone())
        .collect();

    assert_eq!(compatible, ["old".to_string(), "timeless".to_string()].into());
    assert_eq!(incompatible, ["new".to_string()].into());
}

#[test]
fn reverse_dependencies_follow_virtual_packages() {
    let root = game_root();
    let mut registry = Registry::empty();
    registry
        .register_install(providing("core", "1.0", &["iface"]), &[], root.path(), false)
        .unwrap();
    registry
        .register_install(depending("plug", "1.0", &["iface"]), &[], root.path(), false)
        .unwrap();

    let broken: BTreeSet<String> =
        registry.find_reverse_dependencies(["core".to_string()]).collect();
    assert_eq!(broken, ["core".to_string(), "plug".to_string()].into());

    // The closure is consumable lazily
    let first = registry.find_reverse_dependencies(["core".to_string()]).next();
    assert_eq!(first.as_deref(), Some("core"));
}

#[test]
fn sanity_errors_name_module_and_missing_dependency() {
    let root = game_root();
    let mut registry = Registry::empty();
    registry
        .register_install(depending("plug", "1.0", &["core"]), &[], root.path(), false)
        .unwrap();

    assert!(!registry.check_sanity());
    let errors = registry.get_sanity_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("plug"));
    assert!(errors[0].contains("core"));

    // A loose binary under the right name restores sanity
    let dll = touch(root.path(), "GameData/core.dll");
    registry.register_dll(root.path(), &dll).unwrap();
    assert!(registry.check_sanity());
}

#[test]
fn removable_auto_installed_spares_manually_needed_modules() {
    let root = game_root();
    let mut registry = Registry::empty();
    registry.register_install(module("helper", "1.0"), &[], root.path(), true).unwrap();
    registry.register_install(module("orphan", "1.0"), &[], root.path(), true).unwrap();
    registry
        .register_install(depending("wanted", "1.0", &["helper"]), &[], root.path(), false)
        .unwrap();

    let removable: BTreeSet<&str> = registry
        .find_removable_auto_installed()
        .iter()
        .map(|m| m.identifier())
        .collect();
    assert_eq!(removable, ["orphan"].into());
}

#[test]
fn directories_are_shared_between_installs() {
    let root = game_root();
    let mut registry = Registry::empty();
    std::fs::create_dir_all(root.path().join("GameData/Shared")).unwrap();

    let a_file = touch(root.path(), "GameData/Shared/a.cfg");
    let b_file = touch(root.path(), "GameData/Shared/b.cfg");
    let shared_dir = root.path().join("GameData/Shared");

    registry
        .register_install(module("mod-A", "1.0"), &[shared_dir.clone(), a_file], root.path(), false)
        .unwrap();
    registry
        .register_install(module("mod-B", "1.0"), &[shared_dir, b_file], root.path(), false)
        .unwrap();

    assert_eq!(registry.file_owner("GameData/Shared/a.cfg").unwrap(), Some("mod-A"));
    assert_eq!(registry.file_owner("GameData/Shared/b.cfg").unwrap(), Some("mod-B"));
    assert_eq!(registry.file_owner("GameData/Shared/").unwrap(), Some("mod-B"));
}
