//! Error handling for the photofx engine
//!
//! This module defines the crate error type and a Result alias. Most engine
//! entry points recover from these errors themselves (log and fall back), so
//! callers usually see them only as the `Err` arm of a wire or a store call.

use thiserror::Error;

/// Main error type for photofx operations
#[derive(Error, Debug)]
pub enum FilterError {
    /// Unknown filter, category or parameter key
    #[error("Lookup miss: {kind} '{key}' not found")]
    LookupMiss { kind: &'static str, key: String },

    /// A descriptor that cannot be wired (no node variant, or a blend without its side input)
    #[error("Degenerate descriptor '{key}': {reason}")]
    DegenerateDescriptor { key: String, reason: String },

    /// The primary source has nothing to push
    #[error("Source has no frame loaded")]
    MissingFrame,

    /// Persisted store read/write failure
    #[error("Persistence fault: {0}")]
    PersistenceFault(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Image decode/encode errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<FilterError>,
    },
}

impl FilterError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        FilterError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn lookup_miss(kind: &'static str, key: impl Into<String>) -> Self {
        FilterError::LookupMiss {
            kind,
            key: key.into(),
        }
    }

    pub fn degenerate(key: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::DegenerateDescriptor {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error (or the error it wraps) is a lookup miss
    pub fn is_lookup_miss(&self) -> bool {
        match self {
            FilterError::LookupMiss { .. } => true,
            FilterError::WithContext { source, .. } => source.is_lookup_miss(),
            _ => false,
        }
    }

    /// Whether this error (or the error it wraps) is a degenerate descriptor
    pub fn is_degenerate(&self) -> bool {
        match self {
            FilterError::DegenerateDescriptor { .. } => true,
            FilterError::WithContext { source, .. } => source.is_degenerate(),
            _ => false,
        }
    }
}

/// Result type alias for photofx operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| FilterError::Io(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| FilterError::Io(e).with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FilterError::lookup_miss("filter", "nope");
        assert_eq!(err.to_string(), "Lookup miss: filter 'nope' not found");
    }

    #[test]
    fn test_error_with_context() {
        let err = FilterError::degenerate("noir", "empty group");
        let with_ctx = err.with_context("Failed to wire");
        assert!(with_ctx.to_string().contains("Failed to wire"));
        assert!(with_ctx.is_degenerate());
        assert!(!with_ctx.is_lookup_miss());
    }

    #[test]
    fn test_io_context() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "gone",
        ));
        let err = res.context("Reading store").unwrap_err();
        assert!(err.to_string().starts_with("Reading store"));
    }
}
