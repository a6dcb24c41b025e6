//! # photofx: filter pipeline composition and catalog engine
//!
//! The engine behind a photo filter gallery. It models every selectable
//! effect as a descriptor, wires image sources through the descriptor's nodes
//! into a render sink, and keeps the catalog of categories, filter membership
//! and user metadata that every screen shares.
//!
//! ## Architecture
//!
//! - **Filters**: parameter schemas, leaf operations, the registry of known
//!   filters, and pooled descriptors
//! - **Pipeline**: push-based render graph of sources, nodes and sinks, plus
//!   the wirer that rebuilds the graph on every filter change
//! - **Catalog**: categories, metadata, the shared selection, and the
//!   write-through persisted store
//!
//! Everything runs on one thread; the engine types are `!Send`. Catalog
//! events can be forwarded to other threads through
//! [`FilterCatalog::subscribe`].
//!
//! ## Configuration
//!
//! Engine settings and the saved catalog live in the platform data directory
//! under `dev.photofx.photofx`:
//!
//! - **Linux**: `~/.local/share/dev.photofx.photofx/`
//! - **macOS**: `~/Library/Application Support/dev.photofx.photofx/`
//! - **Windows**: `%APPDATA%\dev.photofx.photofx\`
//!
//! ## Example
//!
//! ```ignore
//! use photofx::{EngineConfig, FilterCatalog, FrameSink, PictureSource, PipelineWirer};
//!
//! let config = EngineConfig::load_or_default();
//! let catalog = FilterCatalog::open(&config)?;
//! let mut wirer = PipelineWirer::new(config.adjunct_opacity);
//!
//! let mut photo = PictureSource::open("photo.jpg".as_ref())?;
//! let (frames, sink) = FrameSink::shared();
//!
//! if let Some(descriptor) = catalog.current_descriptor() {
//!     wirer.wire(&descriptor, &mut photo, None, &sink)?;
//! }
//! frames.borrow().save("out.png".as_ref())?;
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod filters;
pub mod pipeline;

// Re-export commonly used types
pub use catalog::{
    CatalogBaseline, CatalogEvent, Category, FilterCatalog, FilterMetadata, JsonFileStore,
    MemoryStore, PersistedStore, Rating, SelectionContext, StoreSnapshot,
};
pub use config::EngineConfig;
pub use error::{FilterError, Result};
pub use filters::{
    DescriptorHandle, FilterArity, FilterDescriptor, FilterRegistry, FilterVariant, ParamValue,
};
pub use pipeline::{
    Frame, FrameSink, ImageSource, PictureSource, PipelineConnection, PipelineWirer, RenderSink,
    SinkHandle,
};
