//! Binding registry
//!
//! Key-indexed map of active bindings, one per `KeyCombination`. Every
//! operation takes the single registry lock for its whole duration, so
//! concurrent insert/remove/find from the caller thread and the dispatch
//! thread never observe a half-updated map.
//!
//! # Performance
//! - Insert / remove / find: O(1) average case
//! - The dispatch path holds the lock only long enough to clone a `Binding`
//!   (two `Arc` bumps and a short string)

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::types::{KeyCombination, NativeCombo};
use crate::core::value::{Handler, Value};

/// Registry operation failures
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("key combination '{0}' is already bound")]
    DuplicateKey(KeyCombination),

    #[error("key combination '{0}' is not bound")]
    NotFound(KeyCombination),
}

/// Unique identity of one bind call
///
/// Unbind followed by bind of the same combination yields a new id, which
/// lets dispatch tell a re-bound combination from the one it looked up.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BindingId(pub u64);

/// An active binding
///
/// Never mutated in place; re-binding is unbind-then-bind.
#[derive(Clone, Debug)]
pub struct Binding {
    pub id: BindingId,
    pub combination: KeyCombination,
    pub grab: NativeCombo,
    pub handler: Handler,
    pub extra_args: Arc<[Value]>,
}

impl Binding {
    pub fn new(
        id: BindingId,
        combination: KeyCombination,
        grab: NativeCombo,
        handler: Handler,
        extra_args: Vec<Value>,
    ) -> Self {
        Self {
            id,
            combination,
            grab,
            handler,
            extra_args: extra_args.into(),
        }
    }

    /// Handler arguments: the triggering combination, then the extra args in order.
    pub fn call_args(&self) -> Vec<Value> {
        let mut args = Vec::with_capacity(self.extra_args.len() + 1);
        args.push(Value::Str(self.combination.to_string()));
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

/// Mutex-guarded `KeyCombination → Binding` map
#[derive(Debug, Default)]
pub struct BindingRegistry {
    entries: Mutex<HashMap<KeyCombination, Binding>>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a binding, failing if its combination is already present.
    pub fn insert(&self, binding: Binding) -> Result<(), RegistryError> {
        let combination = binding.combination.clone();
        self.insert_with(combination, || Ok::<_, RegistryError>(binding))
    }

    /// Inserts the binding produced by `make`, under the lock
    ///
    /// The duplicate check runs first, so `make` (typically: issue the native
    /// grab) is only attempted for a free combination and nobody can observe
    /// the map between the grab succeeding and the entry appearing.
    pub fn insert_with<F, E>(&self, combination: KeyCombination, make: F) -> Result<(), E>
    where
        F: FnOnce() -> Result<Binding, E>,
        E: From<RegistryError>,
    {
        let mut entries = self.entries.lock();
        if entries.contains_key(&combination) {
            return Err(RegistryError::DuplicateKey(combination).into());
        }

        let binding = make()?;
        entries.insert(combination, binding);
        Ok(())
    }

    /// Removes and returns a binding.
    pub fn remove(&self, combination: &KeyCombination) -> Result<Binding, RegistryError> {
        self.remove_with(combination, |_| {})
    }

    /// Removes a binding and runs `on_remove` (typically: ungrab) under the lock.
    pub fn remove_with<F>(&self, combination: &KeyCombination, on_remove: F) -> Result<Binding, RegistryError>
    where
        F: FnOnce(&Binding),
    {
        let mut entries = self.entries.lock();
        let binding = entries
            .remove(combination)
            .ok_or_else(|| RegistryError::NotFound(combination.clone()))?;
        on_remove(&binding);
        Ok(binding)
    }

    /// Copies out the binding for a combination, if any.
    pub fn find(&self, combination: &KeyCombination) -> Option<Binding> {
        self.entries.lock().get(combination).cloned()
    }

    /// True while the binding with `id` is still the one registered for `combination`.
    pub fn is_current(&self, combination: &KeyCombination, id: BindingId) -> bool {
        self.entries
            .lock()
            .get(combination)
            .is_some_and(|binding| binding.id == id)
    }

    /// Removes every binding, running `on_remove` for each under the lock.
    pub fn drain_with<F>(&self, mut on_remove: F) -> Vec<Binding>
    where
        F: FnMut(&Binding),
    {
        let mut entries = self.entries.lock();
        let drained: Vec<Binding> = entries.drain().map(|(_, binding)| binding).collect();
        for binding in &drained {
            on_remove(binding);
        }
        drained
    }

    /// Bound combinations, sorted.
    pub fn combinations(&self) -> Vec<KeyCombination> {
        let mut combos: Vec<_> = self.entries.lock().keys().cloned().collect();
        combos.sort();
        combos
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
