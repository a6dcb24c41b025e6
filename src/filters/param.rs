//! Filter parameter schema and values.
//!
//! A schema is an ordered list of [`ParamSpec`]s. Values handed to a
//! descriptor are coerced against the spec: numeric values outside the
//! declared range are clamped to the nearest bound, ints and floats convert
//! into each other, anything else is rejected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A live parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    /// Normalized RGB.
    Color([f32; 3]),
}

impl ParamValue {
    pub fn as_float(&self) -> Option<f32> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f32; 3]> {
        match self {
            ParamValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// Parse a value from command-line text: `true`/`false`, an integer, a
    /// float, or three comma-separated floats for a colour.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        match text {
            "true" => return Some(ParamValue::Bool(true)),
            "false" => return Some(ParamValue::Bool(false)),
            _ => {}
        }
        if text.contains(',') {
            let parts: Vec<f32> = text
                .split(',')
                .map(|p| p.trim().parse::<f32>())
                .collect::<std::result::Result<_, _>>()
                .ok()?;
            return match parts.as_slice() {
                [r, g, b] => Some(ParamValue::Color([*r, *g, *b])),
                _ => None,
            };
        }
        if let Ok(v) = text.parse::<i32>() {
            return Some(ParamValue::Int(v));
        }
        text.parse::<f32>().ok().map(ParamValue::Float)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{:.3}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Color([r, g, b]) => write!(f, "({:.2}, {:.2}, {:.2})", r, g, b),
        }
    }
}

/// Declared type and range of a parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Float { min: f32, max: f32 },
    Int { min: i32, max: i32 },
    Bool,
    Color,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKind::Float { min, max } => write!(f, "float [{}, {}]", min, max),
            ParamKind::Int { min, max } => write!(f, "int [{}, {}]", min, max),
            ParamKind::Bool => write!(f, "bool"),
            ParamKind::Color => write!(f, "color"),
        }
    }
}

/// One entry of a parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamSpec {
    pub fn float(name: &str, min: f32, max: f32, default: f32) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Float { min, max },
            default: ParamValue::Float(default.clamp(min, max)),
        }
    }

    pub fn int(name: &str, min: i32, max: i32, default: i32) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Int { min, max },
            default: ParamValue::Int(default.clamp(min, max)),
        }
    }

    pub fn boolean(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Bool,
            default: ParamValue::Bool(default),
        }
    }

    pub fn color(name: &str, default: [f32; 3]) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Color,
            default: ParamValue::Color(default.map(|c| c.clamp(0.0, 1.0))),
        }
    }

    /// Coerce `value` to this parameter's type, clamping to range.
    ///
    /// Returns `None` when the value's type cannot be converted.
    pub fn coerce(&self, value: &ParamValue) -> Option<ParamValue> {
        match (self.kind, *value) {
            (ParamKind::Float { min, max }, ParamValue::Float(v)) => {
                if v.is_nan() {
                    Some(self.default)
                } else {
                    Some(ParamValue::Float(v.clamp(min, max)))
                }
            }
            (ParamKind::Float { min, max }, ParamValue::Int(v)) => {
                Some(ParamValue::Float((v as f32).clamp(min, max)))
            }
            (ParamKind::Int { min, max }, ParamValue::Int(v)) => {
                Some(ParamValue::Int(v.clamp(min, max)))
            }
            (ParamKind::Int { min, max }, ParamValue::Float(v)) => {
                if v.is_nan() {
                    Some(self.default)
                } else {
                    let clamped = v.round().clamp(min as f32, max as f32);
                    Some(ParamValue::Int(clamped as i32))
                }
            }
            (ParamKind::Bool, ParamValue::Bool(v)) => Some(ParamValue::Bool(v)),
            (ParamKind::Color, ParamValue::Color(c)) => Some(ParamValue::Color(
                c.map(|v| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }),
            )),
            _ => None,
        }
    }
}

/// Ordered parameter schema of a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSchema {
    specs: Vec<ParamSpec>,
}

impl ParameterSchema {
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        let mut schema = Self::default();
        for spec in specs {
            schema.push(spec);
        }
        schema
    }

    /// Append a spec. A spec whose name is already declared is ignored, so
    /// merging member schemas of a group keeps the first declaration.
    pub fn push(&mut self, spec: ParamSpec) {
        if self.find(&spec.name).is_none() {
            self.specs.push(spec);
        }
    }

    pub fn find(&self, name: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn defaults(&self) -> Vec<ParamValue> {
        self.specs.iter().map(|s| s.default).collect()
    }
}
