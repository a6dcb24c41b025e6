//! Durable storage for category membership and filter metadata.
//!
//! The catalog reads its store once at construction and writes through on
//! every mutation. Writes are whole records (one category's membership, one
//! filter's metadata) or a full snapshot replacement.

use crate::catalog::model::FilterMetadata;
use crate::error::{FilterError, Result, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Persisted image of the catalog.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Version for future migration support
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    /// When the snapshot was last written
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
    /// Category key to ordered filter keys
    #[serde(default)]
    pub membership: BTreeMap<String, Vec<String>>,
    /// Filter key to metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, FilterMetadata>,
}

fn default_snapshot_version() -> u32 {
    1
}

/// Backing store for the catalog.
pub trait PersistedStore {
    /// Read the stored snapshot. `Ok(None)` means nothing has been stored yet.
    fn load(&mut self) -> Result<Option<StoreSnapshot>>;

    /// Write one category's membership.
    fn put_membership(&mut self, category: &str, filters: &[String]) -> Result<()>;

    /// Write one filter's metadata.
    fn put_metadata(&mut self, key: &str, metadata: &FilterMetadata) -> Result<()>;

    /// Replace everything with `snapshot`.
    fn replace_all(&mut self, snapshot: &StoreSnapshot) -> Result<()>;
}

/// Store that lives for the session only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Option<StoreSnapshot>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `snapshot`.
    pub fn with_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            writes: 0,
        }
    }

    pub fn snapshot(&self) -> Option<&StoreSnapshot> {
        self.snapshot.as_ref()
    }

    /// Number of write calls received.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn snapshot_mut(&mut self) -> &mut StoreSnapshot {
        self.writes += 1;
        self.snapshot.get_or_insert_with(StoreSnapshot::default)
    }
}

impl PersistedStore for MemoryStore {
    fn load(&mut self) -> Result<Option<StoreSnapshot>> {
        Ok(self.snapshot.clone())
    }

    fn put_membership(&mut self, category: &str, filters: &[String]) -> Result<()> {
        self.snapshot_mut()
            .membership
            .insert(category.to_string(), filters.to_vec());
        Ok(())
    }

    fn put_metadata(&mut self, key: &str, metadata: &FilterMetadata) -> Result<()> {
        self.snapshot_mut()
            .metadata
            .insert(key.to_string(), *metadata);
        Ok(())
    }

    fn replace_all(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        *self.snapshot_mut() = snapshot.clone();
        Ok(())
    }
}

/// Store backed by a JSON file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous file intact.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    snapshot: StoreSnapshot,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            snapshot: StoreSnapshot::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot out. Any failure is a [`FilterError::PersistenceFault`].
    fn flush(&mut self) -> Result<()> {
        self.write_file()
            .map_err(|e| FilterError::PersistenceFault(e.to_string()))
    }

    fn write_file(&mut self) -> Result<()> {
        self.snapshot.saved_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(&self.snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        tracing::trace!("Saved catalog store to {:?}", self.path);
        Ok(())
    }
}

impl PersistedStore for JsonFileStore {
    fn load(&mut self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)
            .map_err(|e| FilterError::PersistenceFault(format!("{}: {}", self.path.display(), e)))?;
        self.snapshot = snapshot.clone();
        tracing::info!("Loaded catalog store from {:?}", self.path);
        Ok(Some(snapshot))
    }

    fn put_membership(&mut self, category: &str, filters: &[String]) -> Result<()> {
        self.snapshot
            .membership
            .insert(category.to_string(), filters.to_vec());
        self.flush()
    }

    fn put_metadata(&mut self, key: &str, metadata: &FilterMetadata) -> Result<()> {
        self.snapshot.metadata.insert(key.to_string(), *metadata);
        self.flush()
    }

    fn replace_all(&mut self, snapshot: &StoreSnapshot) -> Result<()> {
        self.snapshot = snapshot.clone();
        self.flush()
    }
}
