//! Input ports and downstream targets for the render graph.
//!
//! Every filter node has two input ports. Transform nodes only evaluate on the
//! primary port; blend nodes also hold the latest frame pushed to the side
//! port and combine it with the next primary frame.

use crate::pipeline::node::NodeHandle;
use crate::pipeline::sink::SinkHandle;
use std::fmt;
use std::rc::Rc;

/// Which input of a node a frame arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Port {
    /// The image being filtered. A push here triggers evaluation.
    Primary,
    /// The blend side input. A push here is stored until the next primary push.
    Secondary,
}

impl Port {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Port::Primary => 0,
            Port::Secondary => 1,
        }
    }
}

/// A downstream edge: either another node's input port or a render sink.
#[derive(Clone)]
pub enum Target {
    Node { node: NodeHandle, port: Port },
    Sink(SinkHandle),
}

impl Target {
    pub fn node(node: &NodeHandle, port: Port) -> Self {
        Target::Node {
            node: Rc::clone(node),
            port,
        }
    }

    pub fn sink(sink: &SinkHandle) -> Self {
        Target::Sink(Rc::clone(sink))
    }

    /// Whether this edge points at the given node.
    pub fn is_node(&self, other: &NodeHandle) -> bool {
        matches!(self, Target::Node { node, .. } if Rc::ptr_eq(node, other))
    }

    /// Whether this edge points at the given sink.
    pub fn is_sink(&self, other: &SinkHandle) -> bool {
        match self {
            Target::Sink(sink) => Rc::ptr_eq(sink, other),
            Target::Node { .. } => false,
        }
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node { node, port } => match node.try_borrow() {
                Ok(n) => write!(f, "Target::Node({} {:?}, {:?})", n.name(), n.id(), port),
                Err(_) => write!(f, "Target::Node(<busy>, {:?})", port),
            },
            Target::Sink(_) => write!(f, "Target::Sink"),
        }
    }
}
