//! The shipped default catalog.
//!
//! A baseline lists categories, the known filters with their initial
//! metadata, group filters built from other filters, and the assignment of
//! filters to categories. The default baseline is embedded in the binary;
//! `restore_defaults` on the catalog returns to it.

use crate::catalog::model::{Category, FilterMetadata, Rating, FAVORITES_CATEGORY};
use crate::error::{Result, ResultExt};
use crate::filters::registry::FilterRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const DEFAULT_CATALOG: &str = include_str!("../../assets/default_catalog.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub key: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub key: String,
    #[serde(default)]
    pub hide: bool,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub slow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub key: String,
    pub title: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub category: String,
    pub filters: Vec<String>,
}

/// Default catalog contents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogBaseline {
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
    #[serde(default)]
    pub filters: Vec<FilterEntry>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default)]
    pub assign: Vec<Assignment>,
}

impl CatalogBaseline {
    /// The baseline compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::parse(DEFAULT_CATALOG).context("Embedded default catalog")
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read baseline {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse baseline {}", path.display()))
    }

    /// Declared filter keys, first declaration wins.
    pub fn filter_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.filters
            .iter()
            .filter(|f| seen.insert(f.key.as_str()))
            .map(|f| f.key.clone())
            .collect()
    }

    /// Categories with their baseline membership.
    ///
    /// Assignments naming undeclared categories or filters are skipped. A
    /// favorites category is appended when the baseline does not declare one,
    /// and favorite-flagged filters are members of it.
    pub fn categories(&self) -> Vec<Category> {
        let known: HashSet<&str> = self.filters.iter().map(|f| f.key.as_str()).collect();
        let mut categories: Vec<Category> = Vec::new();
        for entry in &self.categories {
            if categories.iter().any(|c| c.key == entry.key) {
                tracing::warn!("Baseline declares category '{}' twice", entry.key);
                continue;
            }
            categories.push(Category::new(&entry.key, &entry.title, true));
        }
        if !categories.iter().any(Category::is_favorites) {
            categories.push(Category::new(FAVORITES_CATEGORY, "Favorites", true));
        }

        for assignment in &self.assign {
            let Some(category) = categories.iter_mut().find(|c| c.key == assignment.category) else {
                tracing::warn!(
                    "Baseline assigns filters to unknown category '{}'",
                    assignment.category
                );
                continue;
            };
            for key in &assignment.filters {
                if known.contains(key.as_str()) {
                    category.insert(key);
                } else {
                    tracing::warn!(
                        "Baseline assigns unknown filter '{}' to '{}'",
                        key,
                        assignment.category
                    );
                }
            }
        }

        if let Some(favorites) = categories.iter_mut().find(|c| c.is_favorites()) {
            for entry in self.filters.iter().filter(|f| f.favorite) {
                favorites.insert(&entry.key);
            }
        }
        categories
    }

    /// Initial metadata for every declared filter.
    pub fn metadata(&self) -> BTreeMap<String, FilterMetadata> {
        let favorites: HashSet<String> = self
            .categories()
            .into_iter()
            .find(Category::is_favorites)
            .map(|c| c.filters.into_iter().collect())
            .unwrap_or_default();

        let mut metadata = BTreeMap::new();
        for entry in &self.filters {
            if metadata.contains_key(&entry.key) {
                tracing::warn!("Baseline declares filter '{}' twice", entry.key);
                continue;
            }
            metadata.insert(
                entry.key.clone(),
                FilterMetadata {
                    hidden: entry.hide,
                    favorite: favorites.contains(&entry.key),
                    rating: entry.rating,
                    slow: entry.slow,
                },
            );
        }
        metadata
    }

    /// Register the baseline's group filters.
    pub fn register_groups(&self, registry: &mut FilterRegistry) {
        for group in &self.groups {
            registry.register_group(&group.key, &group.title, group.steps.clone());
        }
    }
}
