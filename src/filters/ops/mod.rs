//! Leaf image operations.
//!
//! Two-layer design, the same as the render graph nodes:
//! - **`OpPlugin` trait** for operations registered at runtime.
//! - **`BuiltinOp` enum** for the built-in operations, dispatched by match.
//!
//! `AnyOp` wraps either so a graph node can hold both uniformly.

mod blend;
mod color;
mod spatial;

pub use blend::{BlendMode, BlendOp, OpacityOp};
pub use color::{ColorAdjust, ColorOp};
pub use spatial::{PixellateOp, VignetteOp};

use crate::filters::descriptor::FilterArity;
use crate::filters::param::ParamValue;
use crate::pipeline::frame::Frame;

/// Trait for user-registered operations.
pub trait OpPlugin {
    /// Human-readable name of this operation.
    fn name(&self) -> &str;

    /// Number of image inputs the operation consumes.
    fn arity(&self) -> FilterArity;

    /// Produce an output frame.
    ///
    /// `secondary` is only `Some` for blend operations that have received a
    /// side input. Returning `None` withholds output for this push.
    fn apply(&mut self, primary: &Frame, secondary: Option<&Frame>) -> Option<Frame>;

    /// Called when a parameter value changes. Unknown names are ignored.
    fn set_parameter(&mut self, _name: &str, _value: &ParamValue) {}
}

/// Enum dispatch for built-in operations.
#[derive(Debug, Clone)]
pub enum BuiltinOp {
    /// Forwards the primary frame unchanged.
    PassThrough,
    Color(ColorOp),
    Pixellate(PixellateOp),
    Vignette(VignetteOp),
    Opacity(OpacityOp),
    Blend(BlendOp),
}

impl BuiltinOp {
    pub fn name(&self) -> &str {
        match self {
            BuiltinOp::PassThrough => "PassThrough",
            BuiltinOp::Color(op) => op.name(),
            BuiltinOp::Pixellate(op) => op.name(),
            BuiltinOp::Vignette(op) => op.name(),
            BuiltinOp::Opacity(op) => op.name(),
            BuiltinOp::Blend(op) => op.name(),
        }
    }

    pub fn arity(&self) -> FilterArity {
        match self {
            BuiltinOp::Blend(_) => FilterArity::Blend,
            _ => FilterArity::Transform,
        }
    }

    pub fn apply(&mut self, primary: &Frame, secondary: Option<&Frame>) -> Option<Frame> {
        match self {
            BuiltinOp::PassThrough => Some(primary.clone()),
            BuiltinOp::Color(op) => Some(op.apply(primary)),
            BuiltinOp::Pixellate(op) => Some(op.apply(primary)),
            BuiltinOp::Vignette(op) => Some(op.apply(primary)),
            BuiltinOp::Opacity(op) => Some(op.apply(primary)),
            BuiltinOp::Blend(op) => secondary.map(|overlay| op.apply(primary, overlay)),
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        match self {
            BuiltinOp::PassThrough => {}
            BuiltinOp::Color(op) => op.set_parameter(name, value),
            BuiltinOp::Pixellate(op) => op.set_parameter(name, value),
            BuiltinOp::Vignette(op) => op.set_parameter(name, value),
            BuiltinOp::Opacity(op) => op.set_parameter(name, value),
            BuiltinOp::Blend(op) => op.set_parameter(name, value),
        }
    }
}

/// Wrapper that holds either a built-in op (enum dispatch) or a plugin (trait object).
pub enum AnyOp {
    Builtin(BuiltinOp),
    Plugin(Box<dyn OpPlugin>),
}

impl AnyOp {
    pub fn name(&self) -> &str {
        match self {
            AnyOp::Builtin(op) => op.name(),
            AnyOp::Plugin(op) => op.name(),
        }
    }

    pub fn arity(&self) -> FilterArity {
        match self {
            AnyOp::Builtin(op) => op.arity(),
            AnyOp::Plugin(op) => op.arity(),
        }
    }

    pub fn apply(&mut self, primary: &Frame, secondary: Option<&Frame>) -> Option<Frame> {
        match self {
            AnyOp::Builtin(op) => op.apply(primary, secondary),
            AnyOp::Plugin(op) => op.apply(primary, secondary),
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) {
        match self {
            AnyOp::Builtin(op) => op.set_parameter(name, value),
            AnyOp::Plugin(op) => op.set_parameter(name, value),
        }
    }
}

impl From<BuiltinOp> for AnyOp {
    fn from(op: BuiltinOp) -> Self {
        AnyOp::Builtin(op)
    }
}

impl std::fmt::Debug for AnyOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnyOp::Builtin(op) => f.debug_tuple("Builtin").field(&op.name()).finish(),
            AnyOp::Plugin(op) => f.debug_tuple("Plugin").field(&op.name()).finish(),
        }
    }
}
