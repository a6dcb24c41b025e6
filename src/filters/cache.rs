//! Descriptor pool.
//!
//! Descriptors are built once per key and handed out as shared handles for
//! the rest of the process. Nothing is evicted automatically; the configured
//! bound is only a tripwire that logs when the pool grows past what the
//! catalog is expected to need. A caller may release a descriptor it no
//! longer needs, unless some screen holds a lock on that key.

use crate::catalog::model::SharedMetadata;
use crate::filters::descriptor::{DescriptorHandle, FilterDescriptor};
use crate::filters::registry::FilterRegistry;
use std::collections::HashMap;
use std::rc::Rc;

/// When pooled descriptors are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Keep every descriptor until it is explicitly released.
    #[default]
    Never,
}

#[derive(Debug)]
pub struct DescriptorCache {
    entries: HashMap<String, DescriptorHandle>,
    locks: HashMap<String, usize>,
    policy: EvictionPolicy,
    max_entries: usize,
    over_bound: bool,
}

impl DescriptorCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            locks: HashMap::new(),
            policy: EvictionPolicy::Never,
            max_entries,
            over_bound: false,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<DescriptorHandle> {
        self.entries.get(key).cloned()
    }

    /// Take a lock on `key`. Locks nest; returns the new count.
    pub fn lock(&mut self, key: &str) -> usize {
        let count = self.locks.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop one lock on `key`. Returns the remaining count.
    pub fn unlock(&mut self, key: &str) -> usize {
        let Some(count) = self.locks.get_mut(key) else {
            tracing::debug!("Unlock of '{}' without a lock", key);
            return 0;
        };
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            self.locks.remove(key);
        }
        remaining
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.contains_key(key)
    }

    /// Drop the pooled descriptor for `key` unless it is locked.
    ///
    /// Handles already given out stay valid; the next lookup builds a fresh
    /// descriptor. Returns whether an entry was removed.
    pub fn release(&mut self, key: &str) -> bool {
        if self.is_locked(key) {
            tracing::debug!("Descriptor '{}' is locked; not released", key);
            return false;
        }
        let removed = self.entries.remove(key).is_some();
        if removed {
            tracing::trace!("Released descriptor '{}' ({} left)", key, self.entries.len());
        }
        removed
    }

    /// Look up the pooled descriptor for `key`, creating it on first use.
    ///
    /// Keys the registry cannot resolve get a neutral pass-through
    /// descriptor, so there is always something to render.
    pub fn resolve(
        &mut self,
        key: &str,
        registry: &FilterRegistry,
        metadata: &SharedMetadata,
    ) -> DescriptorHandle {
        if let Some(existing) = self.entries.get(key) {
            return Rc::clone(existing);
        }

        let recipe = match registry.recipe(key) {
            Some(recipe) => recipe,
            None => {
                tracing::warn!("No filter definition for '{}'; using pass-through", key);
                registry.pass_through(key)
            }
        };
        let descriptor = Rc::new(FilterDescriptor::new(recipe, metadata));
        self.entries.insert(key.to_string(), Rc::clone(&descriptor));
        tracing::trace!("Pooled descriptor '{}' ({} total)", key, self.entries.len());

        if self.entries.len() > self.max_entries && !self.over_bound {
            self.over_bound = true;
            tracing::warn!(
                "Descriptor pool holds {} entries, above the expected bound of {}; entries are never evicted",
                self.entries.len(),
                self.max_entries
            );
        }
        descriptor
    }
}
