//! Derived-view memoization.
//!
//! A [`CacheKey`] is a blake3 digest over everything a derived view depends
//! on: the dataset generation, the per-model scope counts, the view kind, the
//! full options and the full scope. All of these serialize through ordered
//! containers (`BTreeMap`, `BTreeSet`, `Vec`), so the JSON fed to the hasher
//! is canonical and equal inputs always produce equal keys.
//!
//! [`ViewCache`] is a plain key -> value memo with no eviction; stale entries
//! simply stop being looked up. The owner clears it when a new dataset is
//! loaded.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::scope::{Scope, ScopeCounts};

/// Digest identifying one derived view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(blake3::Hash);

impl CacheKey {
    pub fn compute<O: Serialize>(
        generation: u64,
        counts: &ScopeCounts,
        view: &str,
        options: &O,
        scope: &Scope,
    ) -> Result<CacheKey, serde_json::Error> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&generation.to_le_bytes());
        hasher.update(&serde_json::to_vec(counts)?);
        // Length-prefix the view name so it cannot run into the options.
        hasher.update(&(view.len() as u64).to_le_bytes());
        hasher.update(view.as_bytes());
        hasher.update(&serde_json::to_vec(options)?);
        hasher.update(&serde_json::to_vec(scope)?);
        Ok(CacheKey(hasher.finalize()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

/// Memo of computed views.
#[derive(Debug)]
pub struct ViewCache<V> {
    entries: HashMap<CacheKey, Arc<V>>,
}

impl<V> Default for ViewCache<V> {
    fn default() -> Self {
        ViewCache {
            entries: HashMap::new(),
        }
    }
}

impl<V> ViewCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&mut self, key: CacheKey, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some(hit) = self.entries.get(&key) {
            tracing::debug!(key = %key, "view cache hit");
            return Arc::clone(hit);
        }
        tracing::debug!(key = %key, "view cache miss");
        let value = Arc::new(compute());
        self.entries.insert(key, Arc::clone(&value));
        value
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::ScopeDimension;

    fn key(generation: u64, view: &str, options: &str, scope: &Scope) -> CacheKey {
        CacheKey::compute(generation, &ScopeCounts::default(), view, &options, scope).unwrap()
    }

    #[test]
    fn equal_inputs_give_equal_keys() {
        let mut a = Scope::new();
        a.insert(ScopeDimension::Code, "c2");
        a.insert(ScopeDimension::Code, "c1");
        let mut b = Scope::new();
        b.insert(ScopeDimension::Code, "c1");
        b.insert(ScopeDimension::Code, "c2");
        assert_eq!(key(1, "table", "post", &a), key(1, "table", "post", &b));
    }

    #[test]
    fn any_input_change_changes_the_key() {
        let empty = Scope::new();
        let mut scoped = Scope::new();
        scoped.insert(ScopeDimension::User, "u1");
        let mut other = Scope::new();
        other.insert(ScopeDimension::User, "u2");

        let base = key(1, "table", "post", &empty);
        assert_ne!(base, key(2, "table", "post", &empty));
        assert_ne!(base, key(1, "network", "post", &empty));
        assert_ne!(base, key(1, "table", "code", &empty));
        // Same shape of scope, different content.
        assert_ne!(key(1, "table", "post", &scoped), key(1, "table", "post", &other));
    }

    #[test]
    fn memo_computes_once_per_key() {
        let mut cache: ViewCache<usize> = ViewCache::new();
        let k = key(1, "table", "post", &Scope::new());
        let mut calls = 0;
        let first = cache.get_or_insert_with(k, || {
            calls += 1;
            7
        });
        let second = cache.get_or_insert_with(k, || {
            calls += 1;
            8
        });
        assert_eq!((*first, *second, calls), (7, 7, 1));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(&k).is_none());
    }
}
