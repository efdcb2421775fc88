//! Concurrent key map
//!
//! `KeyStore` wraps a sharded concurrent map from key to published value
//! chain. Readers (snapshot and transaction gets, range materialization)
//! use it without the database mutex; only the commit path mutates it, and
//! every mutation is a compare-and-swap against the chain the committer
//! loaded.
//!
//! Chains are compared by identity (`Arc::ptr_eq`): a chain is immutable
//! once published, so pointer equality is exactly "nobody replaced this
//! chain since I loaded it".

use dashmap::DashMap;
use std::sync::Arc;

use crate::multi_value::MultiValue;

/// Sharded map from key to published value chain
#[derive(Debug, Default)]
pub struct KeyStore {
    map: DashMap<String, Arc<MultiValue>>,
}

impl KeyStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the published chain for `key`
    pub fn load(&self, key: &str) -> Option<Arc<MultiValue>> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Load the chain for `key`, publishing `default()` if absent
    pub fn load_or_store<F>(&self, key: &str, default: F) -> Arc<MultiValue>
    where
        F: FnOnce() -> Arc<MultiValue>,
    {
        Arc::clone(
            self.map
                .entry(key.to_string())
                .or_insert_with(default)
                .value(),
        )
    }

    /// Publish `chain` for `key` unconditionally
    ///
    /// Used by restore, which owns the whole database exclusively.
    pub fn store(&self, key: String, chain: Arc<MultiValue>) {
        self.map.insert(key, chain);
    }

    /// Replace the chain for `key` if the published chain is `current`
    ///
    /// Returns false when the key is absent or holds a different chain.
    pub fn compare_and_swap(
        &self,
        key: &str,
        current: &Arc<MultiValue>,
        next: Arc<MultiValue>,
    ) -> bool {
        match self.map.get_mut(key) {
            Some(mut entry) if Arc::ptr_eq(entry.value(), current) => {
                *entry.value_mut() = next;
                true
            }
            _ => false,
        }
    }

    /// Remove `key` if the published chain is `current`
    pub fn compare_and_delete(&self, key: &str, current: &Arc<MultiValue>) -> bool {
        self.map
            .remove_if(key, |_, chain| Arc::ptr_eq(chain, current))
            .is_some()
    }

    /// Collect every key for which `skip` returns false
    pub fn keys<F>(&self, skip: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let mut keys = Vec::with_capacity(self.map.len());
        for entry in self.map.iter() {
            if !skip(entry.key()) {
                keys.push(entry.key().clone());
            }
        }
        keys
    }

    /// Visit every entry; return false from `visit` to stop early
    ///
    /// The visit callback must not touch the store, it runs while a shard
    /// is held.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &Arc<MultiValue>) -> bool,
    {
        for entry in self.map.iter() {
            if !visit(entry.key(), entry.value()) {
                break;
            }
        }
    }

    /// Number of keys currently present
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no key is present
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
