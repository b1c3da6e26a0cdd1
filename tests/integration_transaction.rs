//! Transactional behavior: rollback restores state, commit keeps it, and
//! nested enlistment is refused.

mod common;

use common::{game_root, module, touch};
use gmpm::core::RegistryError;
use gmpm::registry::Registry;
use gmpm::transaction::Transaction;

#[test]
fn rollback_discards_added_module() {
    let mut registry = Registry::empty();

    let tx = Transaction::begin();
    registry.add_available(module("new-mod", "1.0")).unwrap();
    // Within the transaction the write is visible
    assert!(registry.latest_available("new-mod", None, None).unwrap().is_some());
    tx.rollback();

    match registry.available_by_identifier("new-mod") {
        Err(RegistryError::NotFound {
            identifier,
        }) => assert_eq!(identifier, "new-mod"),
        _ => panic!("expected NotFound after rollback"),
    };
}

#[test]
fn rollback_restores_entire_mutation_sequence() {
    let root = game_root();
    let mut registry = Registry::empty();
    registry.add_available(module("existing", "1.0")).unwrap();
    let before = registry.to_json().unwrap();

    let tx = Transaction::begin();
    registry.add_available(module("added", "1.0")).unwrap();
    let file = touch(root.path(), "GameData/T/t.cfg");
    registry.register_install(module("installed", "1.0"), &[file], root.path(), false).unwrap();
    let dll = touch(root.path(), "GameData/Loose.dll");
    registry.register_dll(root.path(), &dll).unwrap();
    registry.set_download_counts([("existing".to_string(), 99)]).unwrap();
    tx.rollback();

    assert_eq!(registry.to_json().unwrap(), before);
    assert!(registry.installed_module("installed").is_none());
    assert_eq!(registry.download_count("existing"), None);
}

#[test]
fn commit_keeps_changes() {
    let mut registry = Registry::empty();

    let tx = Transaction::begin();
    registry.add_available(module("kept", "1.0")).unwrap();
    tx.commit();

    assert!(registry.latest_available("kept", None, None).unwrap().is_some());
}

#[test]
fn dropping_the_guard_rolls_back() {
    let mut registry = Registry::empty();
    {
        let _tx = Transaction::begin();
        registry.add_available(module("ephemeral", "1.0")).unwrap();
    }
    assert!(registry.latest_available("ephemeral", None, None).is_err());
}

#[test]
fn nested_enlistment_is_refused() {
    let mut registry = Registry::empty();

    let outer = Transaction::begin();
    registry.add_available(module("first", "1.0")).unwrap();

    let inner = Transaction::begin();
    let err = registry.add_available(module("second", "1.0")).unwrap_err();
    assert!(matches!(err, RegistryError::NestedTransaction));
    inner.commit();

    // Back under the outer transaction the registry cooperates again
    registry.add_available(module("third", "1.0")).unwrap();
    outer.rollback();

    assert!(registry.latest_available("first", None, None).is_err());
    assert!(registry.latest_available("third", None, None).is_err());
}

#[test]
fn mutations_outside_any_transaction_are_immediate() {
    let mut registry = Registry::empty();
    registry.add_available(module("plain", "1.0")).unwrap();
    assert!(registry.latest_available("plain", None, None).unwrap().is_some());
}

#[test]
fn sequential_transactions_reuse_the_registry() {
    let mut registry = Registry::empty();

    let tx = Transaction::begin();
    registry.add_available(module("a", "1.0")).unwrap();
    tx.commit();

    let tx = Transaction::begin();
    registry.add_available(module("b", "1.0")).unwrap();
    tx.rollback();

    assert!(registry.latest_available("a", None, None).unwrap().is_some());
    assert!(registry.latest_available("b", None, None).is_err());
}
