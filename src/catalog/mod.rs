//! Filter catalog.
//!
//! The catalog owns the categories, their filter membership, per-filter
//! metadata (hidden, favorite, rating, slow) and the shared selection. It
//! hands out pooled descriptors by key and tracks which of them screens
//! have locked against release.
//!
//! All methods take `&self` so one catalog can be shared by every screen via
//! `Rc`. Mutations are written through to the persisted store immediately; a
//! store failure is logged and the session continues on the in-memory state.
//!
//! Favorites are tracked twice and kept in step: the `favorite` flag in each
//! filter's metadata, and membership of the [`FAVORITES_CATEGORY`] category.

pub mod baseline;
pub mod model;
pub mod selection;
pub mod store;

pub use baseline::CatalogBaseline;
pub use model::{Category, FilterMetadata, Rating, SharedMetadata, FAVORITES_CATEGORY};
pub use selection::{CatalogEvent, CatalogState, SelectionContext};
pub use store::{JsonFileStore, MemoryStore, PersistedStore, StoreSnapshot};

use crate::config::EngineConfig;
use crate::error::{FilterError, Result};
use crate::filters::cache::DescriptorCache;
use crate::filters::descriptor::DescriptorHandle;
use crate::filters::registry::FilterRegistry;
use crate::pipeline::id::ObserverId;
use crossbeam_channel::Receiver;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

pub struct FilterCatalog {
    baseline: CatalogBaseline,
    registry: FilterRegistry,
    categories: RefCell<Vec<Category>>,
    metadata: SharedMetadata,
    cache: RefCell<DescriptorCache>,
    store: RefCell<Box<dyn PersistedStore>>,
    selection: Rc<SelectionContext>,
}

impl FilterCatalog {
    /// Build a catalog from a baseline, reading saved state from `store`.
    ///
    /// The baseline's groups are added to `registry`. When the store is
    /// empty it is seeded with the baseline; when it cannot be read the
    /// baseline is used for this session.
    pub fn new(
        baseline: CatalogBaseline,
        mut registry: FilterRegistry,
        store: Box<dyn PersistedStore>,
        config: &EngineConfig,
    ) -> Self {
        baseline.register_groups(&mut registry);

        let catalog = Self {
            categories: RefCell::new(baseline.categories()),
            metadata: Rc::new(RefCell::new(baseline.metadata())),
            cache: RefCell::new(DescriptorCache::new(config.max_cached_descriptors)),
            store: RefCell::new(store),
            selection: Rc::new(SelectionContext::new()),
            baseline,
            registry,
        };

        let loaded = catalog.store.borrow_mut().load();
        match loaded {
            Ok(Some(snapshot)) => catalog.apply_snapshot(snapshot),
            Ok(None) => {
                tracing::info!("No saved catalog; seeding store with defaults");
                let snapshot = catalog.snapshot();
                catalog.persist("seed", |store| store.replace_all(&snapshot));
            }
            Err(e) => {
                tracing::warn!("Persistence fault loading catalog, using defaults: {}", e);
            }
        }

        let initial = config
            .initial_category
            .clone()
            .filter(|c| catalog.has_category(c))
            .or_else(|| catalog.categories.borrow().first().map(|c| c.key.clone()));
        if let Some(category) = initial {
            catalog.set_current_category(&category);
        }

        tracing::info!(
            "Catalog ready: {} categories, {} filters",
            catalog.categories.borrow().len(),
            catalog.metadata.borrow().len()
        );
        catalog
    }

    /// Catalog over the embedded baseline and built-in filters.
    pub fn with_defaults(store: Box<dyn PersistedStore>, config: &EngineConfig) -> Result<Self> {
        Ok(Self::new(
            CatalogBaseline::embedded()?,
            FilterRegistry::with_builtins(),
            store,
            config,
        ))
    }

    /// Catalog over the embedded baseline, persisted to the configured JSON store.
    pub fn open(config: &EngineConfig) -> Result<Self> {
        let store: Box<dyn PersistedStore> = match config.resolved_store_path() {
            Some(path) => Box::new(JsonFileStore::new(path)),
            None => {
                tracing::warn!("No data directory available; catalog changes will not be saved");
                Box::new(MemoryStore::new())
            }
        };
        Self::with_defaults(store, config)
    }

    // ==================== Categories ====================

    pub fn categories(&self) -> Vec<Category> {
        self.categories.borrow().clone()
    }

    pub fn category_keys(&self) -> Vec<String> {
        self.categories.borrow().iter().map(|c| c.key.clone()).collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.borrow().iter().any(|c| c.key == category)
    }

    pub fn category_title(&self, category: &str) -> Option<String> {
        let title = self
            .categories
            .borrow()
            .iter()
            .find(|c| c.key == category)
            .map(|c| c.title.clone());
        if title.is_none() {
            tracing::warn!("Unknown category '{}'", category);
        }
        title
    }

    /// All filters in `category`, hidden ones included.
    pub fn filters_in(&self, category: &str) -> Vec<String> {
        self.try_filters_in(category).unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Vec::new()
        })
    }

    /// Like [`filters_in`](Self::filters_in), but an unknown category is an
    /// error.
    pub fn try_filters_in(&self, category: &str) -> Result<Vec<String>> {
        self.categories
            .borrow()
            .iter()
            .find(|c| c.key == category)
            .map(|c| c.filters.clone())
            .ok_or_else(|| FilterError::lookup_miss("category", category))
    }

    /// Filters in `category` that are not hidden, in membership order.
    pub fn shown_filters_in(&self, category: &str) -> Vec<String> {
        let metadata = self.metadata.borrow();
        self.filters_in(category)
            .into_iter()
            .filter(|key| !metadata.get(key).map(|m| m.hidden).unwrap_or(false))
            .collect()
    }

    /// Add `key` to `category`. Adding to the favorites category marks it
    /// favorite.
    pub fn add_to_category(&self, category: &str, key: &str) -> bool {
        if category == FAVORITES_CATEGORY {
            return self.add_favorite(key);
        }
        if !self.check_filter(key) {
            return false;
        }
        self.edit_membership(category, |c| c.insert(key))
    }

    /// Remove `key` from `category`. Removing from the favorites category
    /// clears the favorite flag.
    pub fn remove_from_category(&self, category: &str, key: &str) -> bool {
        if category == FAVORITES_CATEGORY {
            return self.remove_favorite(key);
        }
        if !self.check_filter(key) {
            return false;
        }
        self.edit_membership(category, |c| c.remove(key))
    }

    fn edit_membership<F>(&self, category: &str, edit: F) -> bool
    where
        F: FnOnce(&mut Category) -> bool,
    {
        let filters = {
            let mut categories = self.categories.borrow_mut();
            let Some(c) = categories.iter_mut().find(|c| c.key == category) else {
                tracing::warn!("Unknown category '{}'", category);
                return false;
            };
            if !edit(c) {
                return true;
            }
            c.filters.clone()
        };
        self.persist("membership", |store| store.put_membership(category, &filters));
        self.selection.emit(CatalogEvent::MembershipChanged {
            category: category.to_string(),
        });
        true
    }

    // ==================== Filters & Metadata ====================

    /// Whether `key` is a filter of this catalog.
    pub fn is_known_filter(&self, key: &str) -> bool {
        self.metadata.borrow().contains_key(key)
    }

    pub fn filter_keys(&self) -> Vec<String> {
        self.metadata.borrow().keys().cloned().collect()
    }

    pub fn metadata(&self, key: &str) -> Option<FilterMetadata> {
        self.try_metadata(key)
            .map_err(|e| tracing::warn!("{}", e))
            .ok()
    }

    pub fn try_metadata(&self, key: &str) -> Result<FilterMetadata> {
        self.metadata
            .borrow()
            .get(key)
            .copied()
            .ok_or_else(|| FilterError::lookup_miss("filter", key))
    }

    /// Pooled descriptor for `key`; the same instance on every call until
    /// it is released.
    pub fn descriptor_for(&self, key: &str) -> Option<DescriptorHandle> {
        self.try_descriptor_for(key)
            .map_err(|e| tracing::warn!("{}", e))
            .ok()
    }

    /// Like [`descriptor_for`](Self::descriptor_for), but a key the catalog
    /// does not declare is a [`FilterError::LookupMiss`].
    pub fn try_descriptor_for(&self, key: &str) -> Result<DescriptorHandle> {
        if !self.is_known_filter(key) {
            return Err(FilterError::lookup_miss("filter", key));
        }
        Ok(self
            .cache
            .borrow_mut()
            .resolve(key, &self.registry, &self.metadata))
    }

    /// Lock `key`'s descriptor against release. Locks nest and last for the
    /// session only.
    pub fn lock_filter(&self, key: &str) -> bool {
        if !self.check_filter(key) {
            return false;
        }
        let count = self.cache.borrow_mut().lock(key);
        tracing::debug!("Locked '{}' ({} holder(s))", key, count);
        true
    }

    /// Drop one lock taken with [`lock_filter`](Self::lock_filter).
    pub fn unlock_filter(&self, key: &str) -> bool {
        if !self.check_filter(key) {
            return false;
        }
        let count = self.cache.borrow_mut().unlock(key);
        tracing::debug!("Unlocked '{}' ({} holder(s) left)", key, count);
        true
    }

    pub fn is_locked(&self, key: &str) -> bool {
        self.cache.borrow().is_locked(key)
    }

    /// Drop the pooled descriptor for `key` so its nodes can be freed.
    ///
    /// Locked descriptors are kept. Handles already given out stay valid;
    /// the next [`descriptor_for`](Self::descriptor_for) builds a fresh one
    /// with default parameters. Returns whether a descriptor was released.
    pub fn release_descriptor(&self, key: &str) -> bool {
        self.cache.borrow_mut().release(key)
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.metadata(key).map(|m| m.hidden).unwrap_or(false)
    }

    pub fn is_favorite(&self, key: &str) -> bool {
        self.metadata(key).map(|m| m.favorite).unwrap_or(false)
    }

    pub fn rating(&self, key: &str) -> Rating {
        self.metadata(key).map(|m| m.rating).unwrap_or_default()
    }

    pub fn is_slow(&self, key: &str) -> bool {
        self.metadata(key).map(|m| m.slow).unwrap_or(false)
    }

    pub fn set_hidden(&self, key: &str, hidden: bool) -> bool {
        self.edit_metadata(key, |m| m.hidden = hidden)
    }

    /// Mark `key` as expensive to render.
    pub fn set_slow(&self, key: &str, slow: bool) -> bool {
        self.edit_metadata(key, |m| m.slow = slow)
    }

    /// Set the rating, clamped to `0..=3`.
    pub fn set_rating(&self, key: &str, rating: i64) -> bool {
        let rating = Rating::new(rating);
        self.edit_metadata(key, |m| m.rating = rating)
    }

    pub fn add_favorite(&self, key: &str) -> bool {
        self.set_favorite(key, true)
    }

    pub fn remove_favorite(&self, key: &str) -> bool {
        self.set_favorite(key, false)
    }

    fn set_favorite(&self, key: &str, favorite: bool) -> bool {
        if !self.edit_metadata(key, |m| m.favorite = favorite) {
            return false;
        }
        self.edit_membership(FAVORITES_CATEGORY, |c| {
            if favorite {
                c.insert(key)
            } else {
                c.remove(key)
            }
        });
        true
    }

    fn edit_metadata<F>(&self, key: &str, edit: F) -> bool
    where
        F: FnOnce(&mut FilterMetadata),
    {
        let updated = {
            let mut metadata = self.metadata.borrow_mut();
            let Some(entry) = metadata.get_mut(key) else {
                tracing::warn!("Unknown filter '{}'", key);
                return false;
            };
            let before = *entry;
            edit(entry);
            if *entry == before {
                return true;
            }
            *entry
        };
        self.persist("metadata", |store| store.put_metadata(key, &updated));
        self.selection.emit(CatalogEvent::MetadataChanged {
            key: key.to_string(),
            metadata: updated,
        });
        true
    }

    fn check_filter(&self, key: &str) -> bool {
        let known = self.is_known_filter(key);
        if !known {
            tracing::warn!("Unknown filter '{}'", key);
        }
        known
    }

    // ==================== Selection ====================

    /// Shared selection handle for screens that observe it directly.
    pub fn selection(&self) -> Rc<SelectionContext> {
        Rc::clone(&self.selection)
    }

    pub fn current_category(&self) -> Option<String> {
        self.selection.current_category()
    }

    pub fn current_filter_key(&self) -> Option<String> {
        self.selection.current_filter()
    }

    /// Descriptor of the current filter.
    pub fn current_descriptor(&self) -> Option<DescriptorHandle> {
        self.current_filter_key().and_then(|k| self.descriptor_for(&k))
    }

    /// Select `category` and its first shown filter (or no filter when it
    /// has none). Unknown categories are ignored.
    pub fn set_current_category(&self, category: &str) -> bool {
        if !self.has_category(category) {
            tracing::warn!("Unknown category '{}'", category);
            return false;
        }
        if self.selection.set_current_category(Some(category.to_string())) {
            let first = self.shown_filters_in(category).into_iter().next();
            self.selection.set_current_filter(first);
        }
        true
    }

    pub fn set_current_filter_key(&self, key: &str) -> bool {
        if !self.check_filter(key) {
            return false;
        }
        self.selection.set_current_filter(Some(key.to_string()));
        true
    }

    /// The shown filter after the current one in the current category,
    /// wrapping at the end.
    pub fn next_filter_key(&self) -> Option<String> {
        self.step_filter(1)
    }

    /// The shown filter before the current one in the current category,
    /// wrapping at the start.
    pub fn previous_filter_key(&self) -> Option<String> {
        self.step_filter(-1)
    }

    fn step_filter(&self, step: isize) -> Option<String> {
        let category = self.current_category()?;
        let shown = self.shown_filters_in(&category);
        if shown.is_empty() {
            return None;
        }
        let current = self.current_filter_key();
        let index = match current.and_then(|k| shown.iter().position(|s| *s == k)) {
            Some(i) => (i as isize + step).rem_euclid(shown.len() as isize) as usize,
            None => 0,
        };
        shown.get(index).cloned()
    }

    pub fn observe<F>(&self, callback: F) -> ObserverId
    where
        F: Fn(&CatalogEvent) + 'static,
    {
        self.selection.observe(callback)
    }

    pub fn unobserve(&self, id: ObserverId) -> bool {
        self.selection.unobserve(id)
    }

    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.selection.subscribe()
    }

    // ==================== Defaults & Persistence ====================

    /// Reset membership and all metadata to the baseline, dropping
    /// categories the baseline does not declare.
    pub fn restore_defaults(&self) {
        *self.categories.borrow_mut() = self.baseline.categories();
        {
            let mut metadata = self.metadata.borrow_mut();
            metadata.clear();
            metadata.extend(self.baseline.metadata());
        }
        let snapshot = self.snapshot();
        self.persist("restore defaults", |store| store.replace_all(&snapshot));
        tracing::info!("Catalog restored to defaults");
        self.selection.emit(CatalogEvent::DefaultsRestored);

        let category = self
            .current_category()
            .filter(|c| self.has_category(c))
            .or_else(|| self.categories.borrow().first().map(|c| c.key.clone()));
        match category {
            Some(category) => {
                self.selection.set_current_category(Some(category.clone()));
                let shown = self.shown_filters_in(&category);
                let keep = self.current_filter_key().filter(|k| shown.contains(k));
                self.selection
                    .set_current_filter(keep.or_else(|| shown.into_iter().next()));
            }
            None => {
                self.selection.set_current_category(None);
                self.selection.set_current_filter(None);
            }
        }
    }

    /// Current membership and metadata as a store snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            membership: self
                .categories
                .borrow()
                .iter()
                .map(|c| (c.key.clone(), c.filters.clone()))
                .collect(),
            metadata: self.metadata.borrow().clone(),
            ..StoreSnapshot::default()
        }
    }

    fn apply_snapshot(&self, snapshot: StoreSnapshot) {
        {
            let mut metadata = self.metadata.borrow_mut();
            for (key, saved) in snapshot.metadata {
                metadata.insert(key, saved);
            }
        }

        {
            let mut categories = self.categories.borrow_mut();
            let mut metadata = self.metadata.borrow_mut();
            for (key, filters) in snapshot.membership {
                for filter in &filters {
                    metadata.entry(filter.clone()).or_default();
                }
                match categories.iter_mut().find(|c| c.key == key) {
                    Some(c) => c.filters = filters,
                    None => {
                        tracing::debug!("Saved catalog has extra category '{}'", key);
                        let mut c = Category::new(&key, &key, false);
                        c.filters = filters;
                        categories.push(c);
                    }
                }
            }

            // Reconcile the favorite flag with favorites membership.
            if let Some(favorites) = categories.iter_mut().find(|c| c.is_favorites()) {
                let members: Vec<String> = favorites.filters.clone();
                for (key, m) in metadata.iter_mut() {
                    if m.favorite {
                        favorites.insert(key);
                    } else if members.contains(key) {
                        m.favorite = true;
                    }
                }
            }
        }
        tracing::info!("Applied saved catalog state");
    }

    fn persist<F>(&self, what: &str, write: F)
    where
        F: FnOnce(&mut dyn PersistedStore) -> Result<()>,
    {
        let result = write(self.store.borrow_mut().as_mut());
        if let Err(e) = result {
            tracing::warn!(
                "Persistence fault writing {}; continuing in memory: {}",
                what,
                e
            );
        }
    }

    // ==================== Introspection ====================

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    pub fn baseline(&self) -> &CatalogBaseline {
        &self.baseline
    }

    pub fn cached_descriptor_count(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Baseline membership, keyed by category.
    pub fn baseline_membership(&self) -> BTreeMap<String, Vec<String>> {
        self.baseline
            .categories()
            .into_iter()
            .map(|c| (c.key, c.filters))
            .collect()
    }
}

impl std::fmt::Debug for FilterCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCatalog")
            .field("categories", &self.categories.borrow().len())
            .field("filters", &self.metadata.borrow().len())
            .field("selection", &self.selection.state())
            .finish()
    }
}
