//! Filter descriptors.
//!
//! A descriptor is one selectable effect: key, title, parameter schema and
//! live values, plus the graph node(s) implementing it. Nodes are built on
//! first access and kept for the process lifetime.
//!
//! The structural shape ([`FilterVariant`]) and input cardinality
//! ([`FilterArity`]) are tagged enums. They are matched exhaustively in two
//! places only: the pipeline wirer and [`FilterDescriptor::parameter_rows`].

use crate::catalog::model::{FilterMetadata, Rating, SharedMetadata};
use crate::filters::param::{ParamKind, ParamValue, ParameterSchema};
use crate::filters::registry::{FilterRecipe, OpDefinition};
use crate::pipeline::node::{FilterNode, NodeGroup, NodeHandle};
use std::cell::{Cell, OnceCell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Shared handle to a pooled descriptor.
pub type DescriptorHandle = Rc<FilterDescriptor>;

/// Number of image inputs a filter consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterArity {
    /// One source in, one frame out.
    Transform,
    /// A primary source plus a side input composited onto it.
    Blend,
}

impl fmt::Display for FilterArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterArity::Transform => write!(f, "transform"),
            FilterArity::Blend => write!(f, "blend"),
        }
    }
}

/// The node(s) behind a descriptor.
#[derive(Debug, Clone)]
pub enum FilterVariant {
    Single(NodeHandle),
    Group(NodeGroup),
}

impl FilterVariant {
    /// Node receiving external input.
    pub fn entry(&self) -> &NodeHandle {
        match self {
            FilterVariant::Single(node) => node,
            FilterVariant::Group(group) => group.entry(),
        }
    }

    /// Node whose output leaves the filter.
    pub fn exit(&self) -> &NodeHandle {
        match self {
            FilterVariant::Single(node) => node,
            FilterVariant::Group(group) => group.exit(),
        }
    }

    /// Node whose secondary port takes a blend's side input: the first
    /// member that blends, or `None` when nothing does.
    pub fn side_entry(&self) -> Option<&NodeHandle> {
        self.nodes()
            .iter()
            .find(|node| node.borrow().arity() == FilterArity::Blend)
    }

    pub fn nodes(&self) -> &[NodeHandle] {
        match self {
            FilterVariant::Single(node) => std::slice::from_ref(node),
            FilterVariant::Group(group) => group.nodes(),
        }
    }

    /// Drop external edges and cached inputs.
    pub fn disconnect_all(&self) {
        match self {
            FilterVariant::Single(node) => node.borrow_mut().disconnect_all(),
            FilterVariant::Group(group) => group.disconnect_all(),
        }
    }
}

/// Lifecycle of a descriptor's nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorState {
    Unbuilt,
    Built,
    /// Currently wired between a source and a sink.
    Active,
    /// Disconnected by the wirer; becomes active again on the next wire.
    Detached,
}

/// One row of a parameter panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRow {
    pub name: String,
    pub kind: ParamKind,
    pub value: ParamValue,
    /// Name of the operation the parameter belongs to.
    pub node: String,
}

pub struct FilterDescriptor {
    key: String,
    title: String,
    arity: FilterArity,
    schema: ParameterSchema,
    recipe: FilterRecipe,
    variant: OnceCell<Option<FilterVariant>>,
    state: Cell<DescriptorState>,
    values: RefCell<Vec<ParamValue>>,
    committed: RefCell<Vec<ParamValue>>,
    metadata: Weak<RefCell<BTreeMap<String, FilterMetadata>>>,
}

impl FilterDescriptor {
    /// Descriptor whose metadata reads through to `metadata`.
    pub fn new(recipe: FilterRecipe, metadata: &SharedMetadata) -> Self {
        Self::with_metadata(recipe, Rc::downgrade(metadata))
    }

    /// Descriptor without catalog metadata; reads report defaults.
    pub fn detached(recipe: FilterRecipe) -> Self {
        Self::with_metadata(recipe, Weak::new())
    }

    fn with_metadata(
        recipe: FilterRecipe,
        metadata: Weak<RefCell<BTreeMap<String, FilterMetadata>>>,
    ) -> Self {
        let schema = recipe.schema();
        let defaults = schema.defaults();
        Self {
            key: recipe.key().to_string(),
            title: recipe.title().to_string(),
            arity: recipe.arity(),
            schema,
            recipe,
            variant: OnceCell::new(),
            state: Cell::new(DescriptorState::Unbuilt),
            values: RefCell::new(defaults.clone()),
            committed: RefCell::new(defaults),
            metadata,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn arity(&self) -> FilterArity {
        self.arity
    }

    pub fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    pub fn state(&self) -> DescriptorState {
        self.state.get()
    }

    pub fn is_built(&self) -> bool {
        self.variant.get().is_some()
    }

    /// The node(s) behind this descriptor, built on first call.
    ///
    /// `None` means the descriptor is degenerate (a group none of whose
    /// steps could be resolved, or with more than one blend member) and
    /// cannot be wired.
    pub fn variant(&self) -> Option<&FilterVariant> {
        self.variant.get_or_init(|| self.build()).as_ref()
    }

    fn build(&self) -> Option<FilterVariant> {
        if self.recipe.blend_members() > 1 {
            tracing::warn!(
                "Filter '{}' has {} blend members but only one side input",
                self.key,
                self.recipe.blend_members()
            );
            return None;
        }
        let variant = match &self.recipe {
            FilterRecipe::Single(def) => Some(FilterVariant::Single(build_node(def))),
            FilterRecipe::Group { members, .. } => {
                NodeGroup::new(members.iter().map(build_node).collect()).map(FilterVariant::Group)
            }
        };
        match &variant {
            Some(v) => {
                tracing::debug!("Built filter '{}' ({} node(s))", self.key, v.nodes().len());
                self.state.set(DescriptorState::Built);
                let values = self.values.borrow();
                for (spec, value) in self.schema.iter().zip(values.iter()) {
                    apply_to_nodes(v, &spec.name, value);
                }
            }
            None => tracing::warn!("Filter '{}' has no buildable nodes", self.key),
        }
        variant
    }

    pub(crate) fn mark_active(&self) {
        self.state.set(DescriptorState::Active);
    }

    pub(crate) fn mark_detached(&self) {
        if self.state.get() == DescriptorState::Active {
            self.state.set(DescriptorState::Detached);
        }
    }

    pub fn get_parameter(&self, name: &str) -> Option<ParamValue> {
        match self.schema.index_of(name) {
            Some(i) => self.values.borrow().get(i).copied(),
            None => {
                tracing::warn!("Filter '{}' has no parameter '{}'", self.key, name);
                None
            }
        }
    }

    /// Set a parameter, clamping to its declared range.
    ///
    /// Returns the value actually stored, or `None` when the name is unknown
    /// or the value's type does not fit.
    pub fn set_parameter(&self, name: &str, value: ParamValue) -> Option<ParamValue> {
        let Some(i) = self.schema.index_of(name) else {
            tracing::warn!("Filter '{}' has no parameter '{}'", self.key, name);
            return None;
        };
        let spec = self.schema.iter().nth(i)?;
        let Some(coerced) = spec.coerce(&value) else {
            tracing::warn!(
                "Filter '{}' parameter '{}' expects {}, got {:?}",
                self.key,
                name,
                spec.kind,
                value
            );
            return None;
        };
        if coerced != value {
            tracing::debug!("Clamped '{}.{}' from {} to {}", self.key, name, value, coerced);
        }
        self.values.borrow_mut()[i] = coerced;
        if let Some(Some(variant)) = self.variant.get() {
            apply_to_nodes(variant, name, &coerced);
        }
        Some(coerced)
    }

    /// Restore schema defaults.
    pub fn reset(&self) {
        self.replace_values(self.schema.defaults());
    }

    /// Snapshot the current values for a later [`restore_parameters`](Self::restore_parameters).
    pub fn commit_parameters(&self) {
        *self.committed.borrow_mut() = self.values.borrow().clone();
    }

    /// Return to the last committed snapshot.
    pub fn restore_parameters(&self) {
        let committed = self.committed.borrow().clone();
        self.replace_values(committed);
    }

    fn replace_values(&self, values: Vec<ParamValue>) {
        if let Some(Some(variant)) = self.variant.get() {
            for (spec, value) in self.schema.iter().zip(values.iter()) {
                apply_to_nodes(variant, &spec.name, value);
            }
        }
        *self.values.borrow_mut() = values;
    }

    /// Rows for a parameter panel, one per schema entry.
    pub fn parameter_rows(&self) -> Vec<ParameterRow> {
        let values = self.values.borrow();
        self.schema
            .iter()
            .zip(values.iter())
            .map(|(spec, value)| {
                let node = match self.variant() {
                    Some(FilterVariant::Single(node)) => node.borrow().name().to_string(),
                    Some(FilterVariant::Group(group)) => self
                        .owning_member(&spec.name)
                        .and_then(|i| group.nodes().get(i))
                        .map(|n| n.borrow().name().to_string())
                        .unwrap_or_default(),
                    None => String::new(),
                };
                ParameterRow {
                    name: spec.name.clone(),
                    kind: spec.kind,
                    value: *value,
                    node,
                }
            })
            .collect()
    }

    /// Member reported as owning `name`. When several members declare the
    /// same name the first one is reported, although the value reaches all.
    fn owning_member(&self, name: &str) -> Option<usize> {
        match &self.recipe {
            FilterRecipe::Single(_) => Some(0),
            FilterRecipe::Group { members, .. } => {
                members.iter().position(|m| m.schema.find(name).is_some())
            }
        }
    }

    fn metadata(&self) -> FilterMetadata {
        self.metadata
            .upgrade()
            .and_then(|map| map.borrow().get(&self.key).copied())
            .unwrap_or_default()
    }

    pub fn is_hidden(&self) -> bool {
        self.metadata().hidden
    }

    pub fn is_favorite(&self) -> bool {
        self.metadata().favorite
    }

    pub fn rating(&self) -> Rating {
        self.metadata().rating
    }

    pub fn is_slow(&self) -> bool {
        self.metadata().slow
    }
}

impl fmt::Debug for FilterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDescriptor")
            .field("key", &self.key)
            .field("arity", &self.arity)
            .field("state", &self.state.get())
            .finish()
    }
}

fn build_node(def: &OpDefinition) -> NodeHandle {
    FilterNode::handle(def.build())
}

/// Forward a parameter to every node; nodes ignore names they do not own.
fn apply_to_nodes(variant: &FilterVariant, name: &str, value: &ParamValue) {
    for node in variant.nodes() {
        node.borrow_mut().set_parameter(name, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::registry::FilterRegistry;

    fn descriptor(key: &str) -> FilterDescriptor {
        let registry = FilterRegistry::with_builtins();
        FilterDescriptor::detached(registry.recipe(key).unwrap())
    }

    #[test]
    fn test_lazy_build() {
        let d = descriptor("brightness");
        assert_eq!(d.state(), DescriptorState::Unbuilt);
        assert!(!d.is_built());
        assert!(matches!(d.variant(), Some(FilterVariant::Single(_))));
        assert_eq!(d.state(), DescriptorState::Built);
        // Same nodes on every access
        let a = Rc::clone(d.variant().unwrap().entry());
        assert!(Rc::ptr_eq(&a, d.variant().unwrap().entry()));
    }

    #[test]
    fn test_set_parameter_clamps() {
        let d = descriptor("brightness");
        assert_eq!(
            d.set_parameter("brightness", ParamValue::Float(5.0)),
            Some(ParamValue::Float(1.0))
        );
        assert_eq!(d.get_parameter("brightness"), Some(ParamValue::Float(1.0)));
        assert_eq!(d.set_parameter("nope", ParamValue::Float(0.1)), None);
        assert_eq!(d.get_parameter("nope"), None);
        assert_eq!(d.set_parameter("brightness", ParamValue::Bool(true)), None);
        assert_eq!(d.get_parameter("brightness"), Some(ParamValue::Float(1.0)));
    }

    #[test]
    fn test_commit_restore_reset() {
        let d = descriptor("contrast");
        d.set_parameter("contrast", ParamValue::Float(2.0));
        d.commit_parameters();
        d.set_parameter("contrast", ParamValue::Float(3.0));
        d.restore_parameters();
        assert_eq!(d.get_parameter("contrast"), Some(ParamValue::Float(2.0)));
        d.reset();
        assert_eq!(d.get_parameter("contrast"), Some(ParamValue::Float(1.0)));
    }

    #[test]
    fn test_group_rows_name_owning_node() {
        let d = descriptor("warmGlow");
        let rows = d.parameter_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "warmth");
        assert_eq!(rows[0].node, "Warmth");
        assert_eq!(rows[1].name, "brightness");
        assert_eq!(rows[1].node, "Brightness");
    }

    #[test]
    fn test_degenerate_group() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register_group("empty", "Empty", vec!["missing".into()]);
        let d = FilterDescriptor::detached(registry.recipe("empty").unwrap());
        assert!(d.variant().is_none());
        assert_eq!(d.state(), DescriptorState::Unbuilt);
    }

    #[test]
    fn test_group_with_two_blends_is_degenerate() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register_group(
            "doubleBlend",
            "Double Blend",
            vec!["multiplyBlend".into(), "screenBlend".into()],
        );
        let d = FilterDescriptor::detached(registry.recipe("doubleBlend").unwrap());
        assert_eq!(d.arity(), FilterArity::Blend);
        assert!(d.variant().is_none());
    }

    #[test]
    fn test_side_entry_is_first_blend_member() {
        let mut registry = FilterRegistry::with_builtins();
        registry.register_group(
            "tintMix",
            "Tint Mix",
            vec!["contrast".into(), "multiplyBlend".into()],
        );
        let d = FilterDescriptor::detached(registry.recipe("tintMix").unwrap());
        let variant = d.variant().unwrap();
        let side = variant.side_entry().unwrap();
        assert!(Rc::ptr_eq(side, &variant.nodes()[1]));
        assert!(!Rc::ptr_eq(side, variant.entry()));

        assert!(descriptor("sepia").variant().unwrap().side_entry().is_none());
    }

    #[test]
    fn test_detached_metadata_defaults() {
        let d = descriptor("sepia");
        assert!(!d.is_hidden());
        assert!(!d.is_favorite());
        assert_eq!(d.rating(), Rating::default());
    }

    #[test]
    fn test_metadata_reads_through() {
        let registry = FilterRegistry::with_builtins();
        let shared: SharedMetadata = Rc::new(RefCell::new(BTreeMap::new()));
        let d = FilterDescriptor::new(registry.recipe("sepia").unwrap(), &shared);
        shared.borrow_mut().insert(
            "sepia".into(),
            FilterMetadata {
                hidden: true,
                favorite: true,
                rating: Rating::new(2),
                slow: true,
            },
        );
        assert!(d.is_hidden());
        assert!(d.is_favorite());
        assert_eq!(d.rating().value(), 2);
        assert!(d.is_slow());
    }

    #[test]
    fn test_mark_detached_only_from_active() {
        let d = descriptor("grayscale");
        d.variant();
        d.mark_detached();
        assert_eq!(d.state(), DescriptorState::Built);
        d.mark_active();
        d.mark_detached();
        assert_eq!(d.state(), DescriptorState::Detached);
    }
}
