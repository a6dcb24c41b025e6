//! Render graph nodes.
//!
//! A [`FilterNode`] wraps one leaf operation, caches the latest frame on each
//! input port, and forwards its output to an ordered list of [`Target`]s.
//! Evaluation is push-based and synchronous: pushing a frame into a node's
//! primary port evaluates it and recursively pushes downstream before
//! returning.
//!
//! A [`NodeGroup`] chains several nodes into one opaque unit: the primary
//! input enters the first member, the output leaves the last. A side input
//! goes to whichever member blends.

use crate::filters::descriptor::FilterArity;
use crate::filters::ops::AnyOp;
use crate::filters::param::ParamValue;
use crate::pipeline::frame::Frame;
use crate::pipeline::id::NodeId;
use crate::pipeline::port::{Port, Target};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared handle to a graph node.
pub type NodeHandle = Rc<RefCell<FilterNode>>;

pub struct FilterNode {
    id: NodeId,
    op: AnyOp,
    inputs: [Option<Frame>; 2],
    targets: Vec<Target>,
    evaluating: bool,
}

impl FilterNode {
    pub fn new(op: AnyOp) -> Self {
        Self {
            id: NodeId::next(),
            op,
            inputs: [None, None],
            targets: Vec::new(),
            evaluating: false,
        }
    }

    /// Create a node and wrap it in a shared handle.
    pub fn handle(op: AnyOp) -> NodeHandle {
        Rc::new(RefCell::new(Self::new(op)))
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.op.name()
    }

    pub fn arity(&self) -> FilterArity {
        self.op.arity()
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        self.op.set_parameter(name, value);
    }

    /// Add a downstream edge. Duplicate edges are ignored.
    pub fn add_target(&mut self, target: Target) {
        let duplicate = self.targets.iter().any(|t| match (&target, t) {
            (Target::Node { node: a, port: pa }, Target::Node { node: b, port: pb }) => {
                Rc::ptr_eq(a, b) && pa == pb
            }
            (Target::Sink(a), Target::Sink(b)) => Rc::ptr_eq(a, b),
            _ => false,
        });
        if !duplicate {
            self.targets.push(target);
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Drop all downstream edges.
    pub fn clear_targets(&mut self) {
        self.targets.clear();
    }

    /// Drop cached input frames.
    pub fn clear_inputs(&mut self) {
        self.inputs = [None, None];
    }

    /// Drop all downstream edges and cached inputs.
    pub fn disconnect_all(&mut self) {
        self.clear_targets();
        self.clear_inputs();
    }

    pub fn has_input(&self, port: Port) -> bool {
        self.inputs[port.index()].is_some()
    }

    /// Store `frame` on `port` and, for the primary port, evaluate.
    ///
    /// Returns the output frame and the targets to deliver it to.
    fn accept(&mut self, port: Port, frame: Frame) -> Option<(Frame, Vec<Target>)> {
        self.inputs[port.index()] = Some(frame);
        if port == Port::Secondary {
            return None;
        }
        let primary = self.inputs[Port::Primary.index()].as_ref()?;
        let secondary = self.inputs[Port::Secondary.index()].as_ref();
        if self.op.arity() == FilterArity::Blend && secondary.is_none() {
            tracing::warn!(
                "{} {} received a primary frame before its side input; holding",
                self.op.name(),
                self.id
            );
            return None;
        }
        let output = self.op.apply(primary, secondary)?;
        Some((output, self.targets.clone()))
    }
}

impl std::fmt::Debug for FilterNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterNode")
            .field("id", &self.id)
            .field("op", &self.op.name())
            .field("targets", &self.targets.len())
            .finish()
    }
}

/// Push `frame` into `node` on `port`.
///
/// Returns the number of frames that reached a render sink as a result.
pub fn push_frame(node: &NodeHandle, port: Port, frame: Frame) -> usize {
    let produced = match node.try_borrow_mut() {
        Ok(mut n) if !n.evaluating => {
            let produced = n.accept(port, frame);
            n.evaluating = produced.is_some();
            produced
        }
        _ => {
            tracing::warn!("Node is already evaluating; cycle in render graph, dropping frame");
            return 0;
        }
    };
    match produced {
        Some((output, targets)) => {
            let delivered = deliver(&targets, &output);
            node.borrow_mut().evaluating = false;
            delivered
        }
        None => 0,
    }
}

/// Deliver `frame` to every target in order.
///
/// Returns the number of frames that reached a render sink.
pub fn deliver(targets: &[Target], frame: &Frame) -> usize {
    let mut delivered = 0;
    for target in targets {
        match target {
            Target::Node { node, port } => delivered += push_frame(node, *port, frame.clone()),
            Target::Sink(sink) => match sink.try_borrow_mut() {
                Ok(mut s) => {
                    s.render(frame);
                    delivered += 1;
                }
                Err(_) => tracing::warn!("Render sink is busy; dropping frame"),
            },
        }
    }
    delivered
}

/// An ordered chain of nodes treated as one opaque node.
#[derive(Debug, Clone)]
pub struct NodeGroup {
    nodes: Vec<NodeHandle>,
}

impl NodeGroup {
    /// Chain `nodes` primary-to-primary in order.
    ///
    /// Returns `None` for an empty list.
    pub fn new(nodes: Vec<NodeHandle>) -> Option<Self> {
        if nodes.is_empty() {
            return None;
        }
        for pair in nodes.windows(2) {
            pair[0]
                .borrow_mut()
                .add_target(Target::node(&pair[1], Port::Primary));
        }
        Some(Self { nodes })
    }

    /// Member that receives the primary input.
    pub fn entry(&self) -> &NodeHandle {
        &self.nodes[0]
    }

    /// Member whose output leaves the group.
    pub fn exit(&self) -> &NodeHandle {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop the group's external edges and all cached inputs. Internal
    /// chain edges are kept.
    pub fn disconnect_all(&self) {
        for node in &self.nodes {
            node.borrow_mut().clear_inputs();
        }
        self.exit().borrow_mut().clear_targets();
    }
}
