//! Binding registry tests

use std::sync::Arc;
use std::thread;

use crate::core::{
    registry::{Binding, BindingId, BindingRegistry, RegistryError},
    types::{KeyCombination, ModMask, Modifier, NativeCombo},
    value::{Handler, Value},
};

/// Helper to create test bindings
fn test_binding(id: u64, key: &str) -> Binding {
    Binding::new(
        BindingId(id),
        KeyCombination::from_parts(&[Modifier::Control], key),
        NativeCombo {
            mask: ModMask::CONTROL,
            keycode: 28,
        },
        Handler::new(|_| Ok(())),
        vec![Value::from("x"), Value::from(1)],
    )
}

#[test]
fn test_empty_registry() {
    let registry = BindingRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.combinations().is_empty());
}

#[test]
fn test_insert_and_find() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();

    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");
    let found = registry.find(&combo).unwrap();
    assert_eq!(found.id, BindingId(1));
    assert_eq!(&found.extra_args[..], &[Value::from("x"), Value::from(1)]);
}

#[test]
fn test_duplicate_insert_keeps_first() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();

    let err = registry.insert(test_binding(2, "t")).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateKey(_)));

    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");
    assert_eq!(registry.find(&combo).unwrap().id, BindingId(1));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_insert_with_skips_make_on_duplicate() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();

    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");
    let mut called = false;
    let result: Result<(), RegistryError> = registry.insert_with(combo, || {
        called = true;
        Ok(test_binding(2, "t"))
    });

    assert!(result.is_err());
    assert!(!called, "make must not run for a taken combination");
}

#[test]
fn test_insert_with_failure_leaves_registry_unchanged() {
    #[derive(Debug)]
    enum Refused {
        Registry,
        Grab,
    }
    impl From<RegistryError> for Refused {
        fn from(_: RegistryError) -> Self {
            Refused::Registry
        }
    }

    let registry = BindingRegistry::new();
    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");
    let result = registry.insert_with(combo.clone(), || Err::<Binding, _>(Refused::Grab));

    assert!(matches!(result, Err(Refused::Grab)));
    assert!(registry.find(&combo).is_none());
}

#[test]
fn test_remove() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();

    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");
    let removed = registry.remove(&combo).unwrap();
    assert_eq!(removed.id, BindingId(1));
    assert!(registry.find(&combo).is_none());

    // Same combination may be inserted again
    registry.insert(test_binding(2, "t")).unwrap();
}

#[test]
fn test_remove_missing_is_not_found() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();

    let combo = KeyCombination::from_parts(&[Modifier::Control], "q");
    assert_eq!(registry.remove(&combo).unwrap_err(), RegistryError::NotFound(combo));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_is_current_tracks_identity() {
    let registry = BindingRegistry::new();
    let combo = KeyCombination::from_parts(&[Modifier::Control], "t");

    registry.insert(test_binding(1, "t")).unwrap();
    assert!(registry.is_current(&combo, BindingId(1)));

    registry.remove(&combo).unwrap();
    registry.insert(test_binding(2, "t")).unwrap();
    assert!(!registry.is_current(&combo, BindingId(1)));
    assert!(registry.is_current(&combo, BindingId(2)));
}

#[test]
fn test_call_args_prepends_combination() {
    let binding = test_binding(1, "t");
    assert_eq!(
        binding.call_args(),
        vec![Value::from("<Control>t"), Value::from("x"), Value::from(1)]
    );
}

#[test]
fn test_drain_with_visits_every_binding() {
    let registry = BindingRegistry::new();
    registry.insert(test_binding(1, "t")).unwrap();
    registry.insert(test_binding(2, "q")).unwrap();

    let mut visited = Vec::new();
    let drained = registry.drain_with(|b| visited.push(b.id));

    assert_eq!(drained.len(), 2);
    assert_eq!(visited.len(), 2);
    assert!(registry.is_empty());
}

#[test]
fn test_concurrent_insert_remove() {
    let registry = Arc::new(BindingRegistry::new());
    let keys = ["a", "b", "c", "d", "e", "f", "g", "h"];

    let handles: Vec<_> = keys
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let registry = Arc::clone(&registry);
            let key = key.to_string();
            thread::spawn(move || {
                for round in 0..100 {
                    let id = (i * 1000 + round) as u64;
                    registry.insert(test_binding(id, &key)).unwrap();
                    let combo = KeyCombination::from_parts(&[Modifier::Control], &key);
                    assert_eq!(registry.find(&combo).unwrap().id, BindingId(id));
                    registry.remove(&combo).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(registry.is_empty());
}
