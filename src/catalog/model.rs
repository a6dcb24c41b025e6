//! Catalog data model.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Key of the category mirroring the favorite flag.
pub const FAVORITES_CATEGORY: &str = "favorites";

/// Per-filter metadata shared between the catalog and its descriptors.
pub type SharedMetadata = Rc<RefCell<BTreeMap<String, FilterMetadata>>>;

/// A user rating in `0..=3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: u8 = 3;

    /// Clamp `value` into range. Out-of-range input is logged.
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(0, Self::MAX as i64);
        if clamped != value {
            tracing::warn!("Rating {} out of range, clamped to {}", value, clamped);
        }
        Rating(clamped as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<i64> for Rating {
    fn from(value: i64) -> Self {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-set state of one filter, keyed by filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterMetadata {
    pub hidden: bool,
    pub favorite: bool,
    pub rating: Rating,
    /// Expensive to render; parameter panels apply changes on release
    /// rather than while dragging.
    pub slow: bool,
}

/// A named, ordered list of filter keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub title: String,
    pub filters: Vec<String>,
    /// Whether the category ships with the default catalog.
    pub baseline: bool,
}

impl Category {
    pub fn new(key: &str, title: &str, baseline: bool) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            filters: Vec::new(),
            baseline,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.filters.iter().any(|k| k == key)
    }

    /// Append `key` if absent. Returns whether it was added.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.contains(key) {
            false
        } else {
            self.filters.push(key.to_string());
            true
        }
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|k| k != key);
        self.filters.len() != before
    }

    pub fn is_favorites(&self) -> bool {
        self.key == FAVORITES_CATEGORY
    }
}
