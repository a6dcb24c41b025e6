//! Table of known filter definitions.
//!
//! Every selectable filter key maps either to a single operation (a factory
//! producing a fresh [`AnyOp`] plus its parameter schema) or to a group, an
//! ordered list of single-operation keys chained into one opaque unit.
//! Descriptors are built from the [`FilterRecipe`] the registry hands out.

use crate::filters::descriptor::FilterArity;
use crate::filters::ops::{
    AnyOp, BlendMode, BlendOp, BuiltinOp, ColorAdjust, ColorOp, OpPlugin, OpacityOp, PixellateOp,
    VignetteOp,
};
use crate::filters::param::{ParamSpec, ParameterSchema};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Key of the neutral pass-through operation.
pub const PASS_THROUGH_KEY: &str = "passThrough";

/// Key of the opacity operation used as the blend side-input adjunct.
pub const OPACITY_KEY: &str = "opacityAdjustment";

/// Builds a fresh operation instance.
pub type OpFactory = Rc<dyn Fn() -> AnyOp>;

/// A single leaf operation definition.
#[derive(Clone)]
pub struct OpDefinition {
    pub key: String,
    pub title: String,
    pub arity: FilterArity,
    pub schema: ParameterSchema,
    factory: OpFactory,
}

impl OpDefinition {
    pub fn new(
        key: &str,
        title: &str,
        arity: FilterArity,
        schema: ParameterSchema,
        factory: OpFactory,
    ) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            arity,
            schema,
            factory,
        }
    }

    /// Instantiate the operation.
    pub fn build(&self) -> AnyOp {
        (self.factory)()
    }
}

impl fmt::Debug for OpDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpDefinition")
            .field("key", &self.key)
            .field("arity", &self.arity)
            .field("params", &self.schema.len())
            .finish()
    }
}

/// A group definition: member keys in chain order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupDefinition {
    pub key: String,
    pub title: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum FilterDefinition {
    Single(OpDefinition),
    Group(GroupDefinition),
}

/// Everything a descriptor needs to build its nodes, with group members
/// already resolved to their operation definitions.
#[derive(Debug, Clone)]
pub enum FilterRecipe {
    Single(OpDefinition),
    Group {
        key: String,
        title: String,
        members: Vec<OpDefinition>,
    },
}

impl FilterRecipe {
    pub fn key(&self) -> &str {
        match self {
            FilterRecipe::Single(def) => &def.key,
            FilterRecipe::Group { key, .. } => key,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            FilterRecipe::Single(def) => &def.title,
            FilterRecipe::Group { title, .. } => title,
        }
    }

    /// Input cardinality. A group is a blend when any member is; the side
    /// input then enters that member.
    pub fn arity(&self) -> FilterArity {
        match self {
            FilterRecipe::Single(def) => def.arity,
            FilterRecipe::Group { members, .. } => {
                if members.iter().any(|m| m.arity == FilterArity::Blend) {
                    FilterArity::Blend
                } else {
                    FilterArity::Transform
                }
            }
        }
    }

    /// Number of members consuming a side input.
    pub fn blend_members(&self) -> usize {
        match self {
            FilterRecipe::Single(def) => usize::from(def.arity == FilterArity::Blend),
            FilterRecipe::Group { members, .. } => members
                .iter()
                .filter(|m| m.arity == FilterArity::Blend)
                .count(),
        }
    }

    /// Parameter schema. For a group this is the union of member schemas in
    /// member order. A name declared by several members appears once, with
    /// the first declaration's range; setting it reaches every member.
    pub fn schema(&self) -> ParameterSchema {
        match self {
            FilterRecipe::Single(def) => def.schema.clone(),
            FilterRecipe::Group { members, .. } => {
                let mut schema = ParameterSchema::default();
                for spec in members.iter().flat_map(|m| m.schema.iter()) {
                    schema.push(spec.clone());
                }
                schema
            }
        }
    }
}

/// Registry of filter definitions keyed by filter key.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    entries: BTreeMap<String, FilterDefinition>,
}

impl FilterRegistry {
    /// Empty registry. Only the pass-through operation is present.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_builtin(
            PASS_THROUGH_KEY,
            "Pass Through",
            ParameterSchema::default(),
            || BuiltinOp::PassThrough,
        );
        registry
    }

    /// Registry with all built-in operations and groups.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_color_ops();
        registry.register_effect_ops();
        registry.register_blend_ops();
        registry.register_builtin_groups();
        registry
    }

    /// Register a single operation built from a factory.
    pub fn register_op<F>(
        &mut self,
        key: &str,
        title: &str,
        arity: FilterArity,
        schema: ParameterSchema,
        factory: F,
    ) where
        F: Fn() -> AnyOp + 'static,
    {
        if self.entries.contains_key(key) {
            tracing::debug!("Replacing filter definition '{}'", key);
        }
        let def = OpDefinition::new(key, title, arity, schema, Rc::new(factory));
        self.entries
            .insert(key.to_string(), FilterDefinition::Single(def));
    }

    /// Register a plugin operation. Its arity is read from one instance made by `factory`.
    pub fn register_plugin<P, F>(&mut self, key: &str, title: &str, schema: ParameterSchema, factory: F)
    where
        P: OpPlugin + 'static,
        F: Fn() -> P + 'static,
    {
        let arity = factory().arity();
        self.register_op(key, title, arity, schema, move || {
            AnyOp::Plugin(Box::new(factory()))
        });
    }

    /// Register a group of existing single-operation keys.
    ///
    /// Steps naming unknown keys or other groups are dropped when the group is
    /// resolved, not here, so groups may be declared before their members.
    pub fn register_group(&mut self, key: &str, title: &str, steps: Vec<String>) {
        if self.entries.contains_key(key) {
            tracing::debug!("Replacing filter definition '{}'", key);
        }
        self.entries.insert(
            key.to_string(),
            FilterDefinition::Group(GroupDefinition {
                key: key.to_string(),
                title: title.to_string(),
                steps,
            }),
        );
    }

    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve `key` into a buildable recipe.
    pub fn recipe(&self, key: &str) -> Option<FilterRecipe> {
        match self.entries.get(key)? {
            FilterDefinition::Single(def) => Some(FilterRecipe::Single(def.clone())),
            FilterDefinition::Group(group) => {
                let members = group
                    .steps
                    .iter()
                    .filter_map(|step| match self.entries.get(step) {
                        Some(FilterDefinition::Single(def)) => Some(def.clone()),
                        Some(FilterDefinition::Group(_)) => {
                            tracing::warn!(
                                "Group '{}' step '{}' is itself a group; skipping",
                                group.key,
                                step
                            );
                            None
                        }
                        None => {
                            tracing::warn!("Group '{}' step '{}' is unknown; skipping", group.key, step);
                            None
                        }
                    })
                    .collect();
                Some(FilterRecipe::Group {
                    key: group.key.clone(),
                    title: group.title.clone(),
                    members,
                })
            }
        }
    }

    /// Recipe for a neutral pass-through filter presented under `key`.
    pub fn pass_through(&self, key: &str) -> FilterRecipe {
        FilterRecipe::Single(OpDefinition::new(
            key,
            key,
            FilterArity::Transform,
            ParameterSchema::default(),
            Rc::new(|| AnyOp::Builtin(BuiltinOp::PassThrough)),
        ))
    }

    /// Definition of the blend side-input opacity adjunct.
    pub fn opacity_definition(&self) -> Option<OpDefinition> {
        match self.entries.get(OPACITY_KEY)? {
            FilterDefinition::Single(def) => Some(def.clone()),
            FilterDefinition::Group(_) => None,
        }
    }

    fn register_builtin<F>(&mut self, key: &str, title: &str, schema: ParameterSchema, make: F)
    where
        F: Fn() -> BuiltinOp + 'static,
    {
        let arity = make().arity();
        self.register_op(key, title, arity, schema, move || AnyOp::Builtin(make()));
    }

    fn register_color<F>(&mut self, key: &str, title: &str, schema: Vec<ParamSpec>, make: F)
    where
        F: Fn() -> ColorAdjust + 'static,
    {
        self.register_builtin(key, title, ParameterSchema::new(schema), move || {
            BuiltinOp::Color(ColorOp::new(make()))
        });
    }

    fn register_color_ops(&mut self) {
        self.register_color(
            "brightness",
            "Brightness",
            vec![ParamSpec::float("brightness", -1.0, 1.0, 0.0)],
            || ColorAdjust::Brightness { brightness: 0.0 },
        );
        self.register_color(
            "contrast",
            "Contrast",
            vec![ParamSpec::float("contrast", 0.0, 4.0, 1.0)],
            || ColorAdjust::Contrast { contrast: 1.0 },
        );
        self.register_color(
            "saturation",
            "Saturation",
            vec![ParamSpec::float("saturation", 0.0, 2.0, 1.0)],
            || ColorAdjust::Saturation { saturation: 1.0 },
        );
        self.register_color(
            "exposure",
            "Exposure",
            vec![ParamSpec::float("exposure", -4.0, 4.0, 0.0)],
            || ColorAdjust::Exposure { exposure: 0.0 },
        );
        self.register_color(
            "gamma",
            "Gamma",
            vec![ParamSpec::float("gamma", 0.0, 3.0, 1.0)],
            || ColorAdjust::Gamma { gamma: 1.0 },
        );
        self.register_color("grayscale", "Grayscale", vec![], || ColorAdjust::Grayscale);
        self.register_color(
            "sepia",
            "Sepia",
            vec![ParamSpec::float("intensity", 0.0, 1.0, 1.0)],
            || ColorAdjust::Sepia { intensity: 1.0 },
        );
        self.register_color("colorInversion", "Invert", vec![], || ColorAdjust::Invert);
        self.register_color(
            "warmth",
            "Warmth",
            vec![ParamSpec::float("warmth", -1.0, 1.0, 0.5)],
            || ColorAdjust::Warmth { warmth: 0.5 },
        );
        self.register_color(
            "hue",
            "Hue",
            vec![ParamSpec::float("hue", 0.0, 360.0, 90.0)],
            || ColorAdjust::Hue { hue: 90.0 },
        );
        self.register_color(
            "posterize",
            "Posterize",
            vec![ParamSpec::int("levels", 1, 256, 10)],
            || ColorAdjust::Posterize { levels: 10 },
        );
        self.register_color(
            "solarize",
            "Solarize",
            vec![ParamSpec::float("threshold", 0.0, 1.0, 0.5)],
            || ColorAdjust::Solarize { threshold: 0.5 },
        );
        self.register_color(
            "luminanceThreshold",
            "Threshold",
            vec![ParamSpec::float("threshold", 0.0, 1.0, 0.5)],
            || ColorAdjust::LuminanceThreshold { threshold: 0.5 },
        );
        self.register_color(
            "monochrome",
            "Monochrome",
            vec![
                ParamSpec::float("intensity", 0.0, 1.0, 1.0),
                ParamSpec::color("color", [0.6, 0.45, 0.3]),
            ],
            || ColorAdjust::Monochrome {
                intensity: 1.0,
                color: [0.6, 0.45, 0.3],
            },
        );
        self.register_color(
            "rgb",
            "RGB",
            vec![
                ParamSpec::float("red", 0.0, 2.0, 1.0),
                ParamSpec::float("green", 0.0, 2.0, 1.0),
                ParamSpec::float("blue", 0.0, 2.0, 1.0),
            ],
            || ColorAdjust::Rgb {
                red: 1.0,
                green: 1.0,
                blue: 1.0,
            },
        );
    }

    fn register_effect_ops(&mut self) {
        self.register_builtin(
            "pixellate",
            "Pixellate",
            ParameterSchema::new(vec![ParamSpec::int("pixelSize", 1, 64, 8)]),
            || BuiltinOp::Pixellate(PixellateOp::new(8)),
        );
        self.register_builtin(
            "vignette",
            "Vignette",
            ParameterSchema::new(vec![
                ParamSpec::float("start", 0.0, 1.0, 0.3),
                ParamSpec::float("end", 0.0, 1.0, 0.75),
            ]),
            || BuiltinOp::Vignette(VignetteOp::new(0.3, 0.75)),
        );
        self.register_builtin(
            OPACITY_KEY,
            "Opacity",
            ParameterSchema::new(vec![ParamSpec::float("opacity", 0.0, 1.0, 1.0)]),
            || BuiltinOp::Opacity(OpacityOp::new(1.0)),
        );
    }

    fn register_blend_ops(&mut self) {
        let modes = [
            ("normalBlend", "Normal Blend", BlendMode::Normal),
            ("addBlend", "Add Blend", BlendMode::Add),
            ("multiplyBlend", "Multiply Blend", BlendMode::Multiply),
            ("screenBlend", "Screen Blend", BlendMode::Screen),
            ("overlayBlend", "Overlay Blend", BlendMode::Overlay),
            ("differenceBlend", "Difference Blend", BlendMode::Difference),
            ("darkenBlend", "Darken Blend", BlendMode::Darken),
            ("lightenBlend", "Lighten Blend", BlendMode::Lighten),
            ("subtractBlend", "Subtract Blend", BlendMode::Subtract),
            ("dissolveBlend", "Dissolve Blend", BlendMode::Dissolve),
            ("alphaBlend", "Alpha Blend", BlendMode::Alpha),
        ];
        for (key, title, mode) in modes {
            let schema = match mode {
                BlendMode::Dissolve | BlendMode::Alpha => {
                    ParameterSchema::new(vec![ParamSpec::float("mix", 0.0, 1.0, 0.5)])
                }
                _ => ParameterSchema::default(),
            };
            self.register_builtin(key, title, schema, move || {
                BuiltinOp::Blend(BlendOp::new(mode))
            });
        }
    }

    fn register_builtin_groups(&mut self) {
        let groups: [(&str, &str, &[&str]); 5] = [
            ("warmGlow", "Warm Glow", &["warmth", "brightness"]),
            ("noir", "Noir", &["grayscale", "contrast"]),
            ("vintage", "Vintage", &["sepia", "vignette"]),
            ("popArt", "Pop Art", &["posterize", "saturation"]),
            ("duotoneBlend", "Duotone Blend", &["multiplyBlend", "contrast"]),
        ];
        for (key, title, steps) in groups {
            self.register_group(key, title, steps.iter().map(|s| s.to_string()).collect());
        }
    }
}
