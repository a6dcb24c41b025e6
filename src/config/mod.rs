//! Configuration module for photofx
//!
//! This module handles engine configuration:
//! - Engine settings (`photofx.toml`) such as the blend adjunct opacity and the
//!   descriptor cache bound
//! - The location of the persisted catalog store
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.photofx.photofx/`
//! - **macOS**: `~/Library/Application Support/dev.photofx.photofx/`
//! - **Windows**: `%APPDATA%\dev.photofx.photofx\`
//!
//! # Files
//!
//! - `photofx.toml` - Engine settings
//! - `catalog.json` - Persisted category membership and per-filter metadata
//!
//! # Example
//!
//! ```ignore
//! use photofx::config::EngineConfig;
//!
//! let config = EngineConfig::load_or_default();
//! let store_path = config.resolved_store_path();
//! ```

use crate::error::{FilterError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.photofx.photofx";

/// Engine settings filename
pub const CONFIG_FILE: &str = "photofx.toml";

/// Persisted catalog filename
pub const STORE_FILE: &str = "catalog.json";

/// Default opacity applied to the side input of blend filters
pub const DEFAULT_ADJUNCT_OPACITY: f32 = 0.8;

/// Default soft bound on the number of cached descriptors
pub const DEFAULT_MAX_CACHED_DESCRIPTORS: usize = 256;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        FilterError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            FilterError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the engine config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Engine Config ====================

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version for future migration support
    #[serde(default = "default_config_version")]
    pub version: u32,

    /// Opacity of the adjunct node feeding a blend filter's side input
    #[serde(default = "default_adjunct_opacity")]
    pub adjunct_opacity: f32,

    /// Soft bound on the descriptor cache. The cache never evicts; exceeding
    /// this only logs a warning.
    #[serde(default = "default_max_cached_descriptors")]
    pub max_cached_descriptors: usize,

    /// Override for the persisted catalog location
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Category selected when the catalog is constructed
    #[serde(default)]
    pub initial_category: Option<String>,
}

fn default_config_version() -> u32 {
    1
}

fn default_adjunct_opacity() -> f32 {
    DEFAULT_ADJUNCT_OPACITY
}

fn default_max_cached_descriptors() -> usize {
    DEFAULT_MAX_CACHED_DESCRIPTORS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            version: 1,
            adjunct_opacity: DEFAULT_ADJUNCT_OPACITY,
            max_cached_descriptors: DEFAULT_MAX_CACHED_DESCRIPTORS,
            store_path: None,
            initial_category: None,
        }
    }
}

impl EngineConfig {
    /// Load the engine config from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            FilterError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load the engine config from an explicit path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            FilterError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        Self::parse(&content)
            .map_err(|e| e.with_context(format!("Failed to parse config {:?}", path)))
    }

    /// Parse a TOML document. Out-of-range values are clamped.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| FilterError::Config(e.to_string()))?;
        Ok(config.sanitized())
    }

    /// Load the engine config, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load engine config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save the engine config to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save the engine config to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FilterError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| FilterError::Config(format!("Failed to write config: {}", e)))
    }

    /// Where the persisted catalog lives: the override if set, otherwise the
    /// app data directory.
    pub fn resolved_store_path(&self) -> Option<PathBuf> {
        self.store_path
            .clone()
            .or_else(|| app_data_dir().map(|p| p.join(STORE_FILE)))
    }

    fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.adjunct_opacity) || self.adjunct_opacity.is_nan() {
            tracing::warn!(
                "adjunct_opacity {} outside [0, 1], clamping",
                self.adjunct_opacity
            );
            self.adjunct_opacity = if self.adjunct_opacity.is_nan() {
                DEFAULT_ADJUNCT_OPACITY
            } else {
                self.adjunct_opacity.clamp(0.0, 1.0)
            };
        }
        if self.max_cached_descriptors == 0 {
            self.max_cached_descriptors = DEFAULT_MAX_CACHED_DESCRIPTORS;
        }
        self
    }
}

// ==================== Tests ====================
