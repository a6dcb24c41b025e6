//! Image sources feeding the render graph.

use crate::error::{FilterError, Result, ResultExt};
use crate::pipeline::frame::Frame;
use crate::pipeline::node::deliver;
use crate::pipeline::port::Target;
use std::path::Path;

/// Produces frames into the render graph.
pub trait ImageSource {
    /// Replace the source's frame.
    fn load_static(&mut self, frame: Frame);

    fn has_frame(&self) -> bool;

    /// Add a downstream edge.
    fn add_target(&mut self, target: Target);

    /// Drop all downstream edges.
    fn disconnect_all(&mut self);

    /// Push the current frame to every target and return once evaluation has
    /// finished. Returns the number of frames that reached a render sink.
    fn process_synchronously(&mut self) -> usize;
}

/// A still image source.
#[derive(Debug, Default)]
pub struct PictureSource {
    frame: Option<Frame>,
    targets: Vec<Target>,
}

impl PictureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frame(frame: Frame) -> Self {
        Self {
            frame: Some(frame),
            targets: Vec::new(),
        }
    }

    /// Decode an image file.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(FilterError::from)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_frame(image.to_rgba8()))
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }
}

impl ImageSource for PictureSource {
    fn load_static(&mut self, frame: Frame) {
        self.frame = Some(frame);
    }

    fn has_frame(&self) -> bool {
        self.frame.is_some()
    }

    fn add_target(&mut self, target: Target) {
        self.targets.push(target);
    }

    fn disconnect_all(&mut self) {
        self.targets.clear();
    }

    fn process_synchronously(&mut self) -> usize {
        match &self.frame {
            Some(frame) => deliver(&self.targets, frame),
            None => {
                tracing::warn!("Picture source has no frame to process");
                0
            }
        }
    }
}
