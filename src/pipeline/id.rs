//! Identity types for render graph nodes and selection observers.
//!
//! Node ids are only used for logging and debugging output; node identity in
//! the graph is the `Rc` allocation itself.

use std::cell::Cell;
use std::fmt;

thread_local! {
    static NEXT_NODE_ID: Cell<u32> = const { Cell::new(0) };
}

/// Process-unique (per thread) node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Allocate the next id on this thread.
    pub fn next() -> Self {
        NEXT_NODE_ID.with(|next| {
            let id = next.get();
            next.set(id.wrapping_add(1));
            NodeId(id)
        })
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "NodeId(INVALID)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Handle returned when registering a selection observer.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u32);

impl fmt::Debug for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObserverId({})", self.0)
    }
}
