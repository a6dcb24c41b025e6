//! Push-based render graph.
//!
//! Frames flow from image sources through filter nodes into render sinks.
//! Everything runs on the calling thread: a source's synchronous process call
//! returns once every downstream node has evaluated and the sink holds the
//! new frame.
//!
//! # Architecture
//!
//! ```text
//! [ImageSource] ──► [Inlet] ──► [FilterNode] ──► [FilterNode] ──► [RenderSink]
//!                                     ▲
//! [ImageSource] ──► [Opacity] ────────┘ (side input)
//! ```
//!
//! # Design
//!
//! - **Shared handles** — nodes are `Rc<RefCell<FilterNode>>`; edges hold handles.
//! - **Enum dispatch** — nodes wrap `AnyOp`, matching built-in ops directly.
//! - **No dangling edges** — `PipelineWirer` tears down before it connects,
//!   and sources only ever point at its per-wire inlet and opacity nodes.

pub mod frame;
pub mod id;
pub mod node;
pub mod port;
pub mod sink;
pub mod source;
pub mod wirer;

pub use frame::Frame;
pub use id::{NodeId, ObserverId};
pub use node::{push_frame, FilterNode, NodeGroup, NodeHandle};
pub use port::{Port, Target};
pub use sink::{FrameSink, RenderSink, SinkHandle};
pub use source::{ImageSource, PictureSource};
pub use wirer::{PipelineConnection, PipelineWirer};
