//! Pipeline wiring.
//!
//! The wirer connects image sources through a descriptor's node(s) into a
//! render sink and drives one synchronous render pass:
//!
//! ```text
//! Transform:  primary ──► [inlet] ──► [filter] ──► sink
//!
//! Blend:      primary ──► [inlet] ──────► [filter] ──► sink
//!             secondary ──► [opacity] ──┘ (side input)
//! ```
//!
//! The inlet and opacity nodes are created for each wire and owned by the
//! wirer. Tearing them down cuts every source edge of the previous wire, so
//! a source that is not passed to the next call pushes into a dead end.
//! On the blend path the secondary source is processed before the primary,
//! because the blend node only evaluates once its side input is cached. In
//! a group the side input enters the first member that blends.

use crate::error::{FilterError, Result};
use crate::filters::descriptor::{DescriptorHandle, FilterArity};
use crate::filters::ops::{AnyOp, BuiltinOp, OpacityOp};
use crate::filters::param::ParamValue;
use crate::pipeline::node::{FilterNode, NodeHandle};
use crate::pipeline::port::{Port, Target};
use crate::pipeline::sink::SinkHandle;
use crate::pipeline::source::ImageSource;
use std::rc::Rc;

/// Record of one successful wire.
#[derive(Debug, Clone)]
pub struct PipelineConnection {
    pub descriptor: DescriptorHandle,
    pub arity: FilterArity,
    /// Whether the opacity adjunct sits on the side input.
    pub uses_adjunct: bool,
    /// Frames that reached the sink during the render pass.
    pub frames_delivered: usize,
}

impl PipelineConnection {
    pub fn key(&self) -> &str {
        self.descriptor.key()
    }
}

/// Nodes the wirer inserts between the sources and a descriptor.
#[derive(Debug)]
struct SourceEdges {
    inlet: NodeHandle,
    adjunct: Option<NodeHandle>,
}

impl SourceEdges {
    fn new() -> Self {
        Self {
            inlet: FilterNode::handle(AnyOp::Builtin(BuiltinOp::PassThrough)),
            adjunct: None,
        }
    }

    fn disconnect_all(&self) {
        self.inlet.borrow_mut().disconnect_all();
        if let Some(adjunct) = &self.adjunct {
            adjunct.borrow_mut().disconnect_all();
        }
    }
}

pub struct PipelineWirer {
    adjunct_opacity: f32,
    edges: Option<SourceEdges>,
    active: Option<PipelineConnection>,
}

impl PipelineWirer {
    /// Create a wirer whose blend side input is scaled to `adjunct_opacity`.
    pub fn new(adjunct_opacity: f32) -> Self {
        Self {
            adjunct_opacity: adjunct_opacity.clamp(0.0, 1.0),
            edges: None,
            active: None,
        }
    }

    pub fn adjunct_opacity(&self) -> f32 {
        self.adjunct_opacity
    }

    /// Change the side input opacity, including on the live blend graph.
    pub fn set_adjunct_opacity(&mut self, opacity: f32) {
        self.adjunct_opacity = opacity.clamp(0.0, 1.0);
        if let Some(adjunct) = self.edges.as_ref().and_then(|e| e.adjunct.as_ref()) {
            adjunct
                .borrow_mut()
                .set_parameter("opacity", &ParamValue::Float(self.adjunct_opacity));
        }
    }

    /// The connection made by the last successful wire, until torn down.
    pub fn active(&self) -> Option<&PipelineConnection> {
        self.active.as_ref()
    }

    /// Wire `descriptor` between the sources and `sink` and render once.
    ///
    /// On error nothing is connected and the sink keeps its previous frame.
    pub fn wire(
        &mut self,
        descriptor: &DescriptorHandle,
        primary: &mut dyn ImageSource,
        mut secondary: Option<&mut dyn ImageSource>,
        sink: &SinkHandle,
    ) -> Result<PipelineConnection> {
        self.teardown();

        primary.disconnect_all();
        if let Some(source) = secondary.as_deref_mut() {
            source.disconnect_all();
        }
        if let Some(variant) = descriptor.variant() {
            variant.disconnect_all();
        }

        let (connection, edges) = self
            .connect(descriptor, primary, secondary, sink)
            .map_err(|e| {
                tracing::warn!("Wiring '{}' aborted: {}", descriptor.key(), e);
                e
            })?;

        sink.borrow_mut().invalidate();
        descriptor.mark_active();
        if connection.frames_delivered > 1 {
            tracing::warn!(
                "Filter '{}' delivered {} frames to the sink",
                descriptor.key(),
                connection.frames_delivered
            );
        }
        tracing::debug!(
            "Wired '{}' ({}), {} frame(s) delivered",
            descriptor.key(),
            connection.arity,
            connection.frames_delivered
        );
        self.edges = Some(edges);
        self.active = Some(connection.clone());
        Ok(connection)
    }

    fn connect(
        &self,
        descriptor: &DescriptorHandle,
        primary: &mut dyn ImageSource,
        secondary: Option<&mut dyn ImageSource>,
        sink: &SinkHandle,
    ) -> Result<(PipelineConnection, SourceEdges)> {
        if !primary.has_frame() {
            return Err(FilterError::MissingFrame);
        }
        let variant = descriptor
            .variant()
            .ok_or_else(|| FilterError::degenerate(descriptor.key(), "no node to wire"))?;
        let entry = variant.entry();
        let exit = variant.exit();
        let mut edges = SourceEdges::new();

        let (uses_adjunct, frames_delivered) = match descriptor.arity() {
            FilterArity::Transform => {
                primary.add_target(Target::node(&edges.inlet, Port::Primary));
                edges
                    .inlet
                    .borrow_mut()
                    .add_target(Target::node(entry, Port::Primary));
                exit.borrow_mut().add_target(Target::sink(sink));

                let delivered = primary.process_synchronously();
                if delivered == 0 {
                    primary.disconnect_all();
                }
                (false, delivered)
            }
            FilterArity::Blend => {
                let secondary = secondary.ok_or_else(|| {
                    FilterError::degenerate(descriptor.key(), "blend filter has no secondary source")
                })?;
                if !secondary.has_frame() {
                    return Err(FilterError::MissingFrame);
                }
                let side_entry = variant.side_entry().ok_or_else(|| {
                    FilterError::degenerate(descriptor.key(), "no member takes a side input")
                })?;
                let adjunct = FilterNode::handle(AnyOp::Builtin(BuiltinOp::Opacity(
                    OpacityOp::new(self.adjunct_opacity),
                )));
                secondary.add_target(Target::node(&adjunct, Port::Primary));
                adjunct
                    .borrow_mut()
                    .add_target(Target::node(side_entry, Port::Secondary));
                primary.add_target(Target::node(&edges.inlet, Port::Primary));
                edges
                    .inlet
                    .borrow_mut()
                    .add_target(Target::node(entry, Port::Primary));
                exit.borrow_mut().add_target(Target::sink(sink));
                edges.adjunct = Some(adjunct);

                let side = secondary.process_synchronously();
                let delivered = side + primary.process_synchronously();
                if delivered == 0 {
                    primary.disconnect_all();
                    secondary.disconnect_all();
                }
                (true, delivered)
            }
        };

        if frames_delivered == 0 {
            edges.disconnect_all();
            variant.disconnect_all();
            return Err(FilterError::degenerate(
                descriptor.key(),
                "no frame reached the sink",
            ));
        }

        let connection = PipelineConnection {
            descriptor: Rc::clone(descriptor),
            arity: descriptor.arity(),
            uses_adjunct,
            frames_delivered,
        };
        Ok((connection, edges))
    }

    /// Detach the graph of the last successful wire.
    ///
    /// Source edges end at the wirer's own nodes and are cut here; the
    /// sources themselves are owned by the caller and are detached on the
    /// next wire.
    pub fn teardown(&mut self) {
        if let Some(edges) = self.edges.take() {
            edges.disconnect_all();
        }
        if let Some(previous) = self.active.take() {
            if let Some(variant) = previous.descriptor.variant() {
                variant.disconnect_all();
            }
            previous.descriptor.mark_detached();
            tracing::trace!("Tore down '{}'", previous.key());
        }
    }
}

impl Default for PipelineWirer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ADJUNCT_OPACITY)
    }
}
