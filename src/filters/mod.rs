//! Filter definitions, descriptors and the leaf operations behind them.

pub mod cache;
pub mod descriptor;
pub mod ops;
pub mod param;
pub mod registry;

pub use cache::{DescriptorCache, EvictionPolicy};
pub use descriptor::{
    DescriptorHandle, DescriptorState, FilterArity, FilterDescriptor, FilterVariant, ParameterRow,
};
pub use ops::{AnyOp, BuiltinOp, OpPlugin};
pub use param::{ParamKind, ParamSpec, ParamValue, ParameterSchema};
pub use registry::{FilterDefinition, FilterRecipe, FilterRegistry, GroupDefinition, OpDefinition};
