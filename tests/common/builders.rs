//! Test data builders for creating test objects

use photofx::catalog::baseline::{Assignment, CategoryEntry, FilterEntry, GroupEntry};
use photofx::{CatalogBaseline, EngineConfig, FilterCatalog, FilterRegistry, MemoryStore, PersistedStore, Rating};

/// Builder for catalog baselines
#[derive(Default)]
pub struct BaselineBuilder {
    baseline: CatalogBaseline,
}

impl BaselineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, key: &str, title: &str) -> Self {
        self.baseline.categories.push(CategoryEntry {
            key: key.to_string(),
            title: title.to_string(),
        });
        self
    }

    pub fn filter(self, key: &str) -> Self {
        self.filter_with(key, false, false, 0)
    }

    pub fn filter_with(mut self, key: &str, hide: bool, favorite: bool, rating: i64) -> Self {
        self.baseline.filters.push(FilterEntry {
            key: key.to_string(),
            hide,
            favorite,
            rating: Rating::new(rating),
            slow: false,
        });
        self
    }

    pub fn slow_filter(mut self, key: &str) -> Self {
        self.baseline.filters.push(FilterEntry {
            key: key.to_string(),
            hide: false,
            favorite: false,
            rating: Rating::default(),
            slow: true,
        });
        self
    }

    pub fn group(mut self, key: &str, steps: &[&str]) -> Self {
        self.baseline.groups.push(GroupEntry {
            key: key.to_string(),
            title: key.to_string(),
            steps: steps.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn assign(mut self, category: &str, filters: &[&str]) -> Self {
        self.baseline.assign.push(Assignment {
            category: category.to_string(),
            filters: filters.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn build(self) -> CatalogBaseline {
        self.baseline
    }
}

/// Baseline with `portrait` and `landscape` categories.
pub fn scenario_baseline() -> CatalogBaseline {
    BaselineBuilder::new()
        .category("portrait", "Portrait")
        .category("landscape", "Landscape")
        .filter("warmGlow")
        .filter("sepia")
        .filter_with("noir", false, false, 1)
        .filter("vintage")
        .filter("sunset")
        .filter("normalBlend")
        .filter("duotoneBlend")
        .group("sunset", &["warmth", "saturation"])
        .assign("portrait", &["warmGlow", "sepia", "noir", "vintage"])
        .assign("landscape", &["sunset", "normalBlend", "duotoneBlend"])
        .build()
}

/// Builder for catalogs
pub struct CatalogBuilder {
    baseline: CatalogBaseline,
    registry: FilterRegistry,
    store: Box<dyn PersistedStore>,
    config: EngineConfig,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self {
            baseline: scenario_baseline(),
            registry: FilterRegistry::with_builtins(),
            store: Box::new(MemoryStore::new()),
            config: EngineConfig::default(),
        }
    }

    pub fn baseline(mut self, baseline: CatalogBaseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn registry(mut self, registry: FilterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn store(mut self, store: impl PersistedStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> FilterCatalog {
        FilterCatalog::new(self.baseline, self.registry, self.store, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_builder() {
        let baseline = BaselineBuilder::new()
            .category("a", "A")
            .filter_with("x", true, false, 2)
            .assign("a", &["x"])
            .build();

        assert_eq!(baseline.categories.len(), 1);
        assert!(baseline.filters[0].hide);
        assert_eq!(baseline.filters[0].rating.value(), 2);
        assert_eq!(baseline.assign[0].filters, vec!["x"]);
    }
}
