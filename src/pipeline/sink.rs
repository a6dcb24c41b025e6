//! Render targets.

use crate::error::{Result, ResultExt};
use crate::pipeline::frame::Frame;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Consumes frames at the end of a render graph.
pub trait RenderSink {
    /// Accept one frame.
    fn render(&mut self, frame: &Frame);

    /// Request a redraw of the last frame.
    fn invalidate(&mut self) {}
}

/// Shared handle to a render sink.
pub type SinkHandle = Rc<RefCell<dyn RenderSink>>;

/// A sink that keeps the last frame it was given.
#[derive(Debug, Default)]
pub struct FrameSink {
    last: Option<Frame>,
    frames_received: usize,
    invalidations: usize,
}

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink together with the type-erased handle the wirer takes.
    pub fn shared() -> (Rc<RefCell<FrameSink>>, SinkHandle) {
        let sink = Rc::new(RefCell::new(Self::new()));
        let handle: SinkHandle = sink.clone();
        (sink, handle)
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn frames_received(&self) -> usize {
        self.frames_received
    }

    pub fn invalidations(&self) -> usize {
        self.invalidations
    }

    /// Encode the last frame to `path`. The format follows the extension.
    pub fn save(&self, path: &Path) -> Result<bool> {
        match &self.last {
            Some(frame) => {
                frame
                    .save(path)
                    .map_err(crate::error::FilterError::from)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl RenderSink for FrameSink {
    fn render(&mut self, frame: &Frame) {
        self.last = Some(frame.clone());
        self.frames_received += 1;
    }

    fn invalidate(&mut self) {
        self.invalidations += 1;
    }
}
