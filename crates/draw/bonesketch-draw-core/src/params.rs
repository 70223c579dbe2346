//! Typed access to an instruction's parameters.
//!
//! Numeric parameters are compiled once into [`Param`]s: strings become parsed
//! expressions, numbers stay literals. Colours, text, font family, image path
//! and joint style are taken verbatim and never evaluated.

use std::collections::BTreeSet;

use bonesketch_api_core::ConstantNamespace;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::color::Color;
use crate::error::DrawError;
use crate::expr::{ExprError, Expression};

#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Absent,
    Literal(f64),
    Expr(Expression),
}

impl Param {
    pub fn compile(name: &str, value: Option<&JsonValue>) -> Result<Self, DrawError> {
        match value {
            None | Some(JsonValue::Null) => Ok(Param::Absent),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(Param::Literal)
                .ok_or_else(|| DrawError::param(name, "number out of range")),
            Some(JsonValue::Bool(b)) => Ok(Param::Literal(if *b { 1.0 } else { 0.0 })),
            Some(JsonValue::String(src)) => Ok(Param::Expr(Expression::parse(src)?)),
            Some(other) => Err(DrawError::param(
                name,
                format!("expected a number or an expression, got {other}"),
            )),
        }
    }

    /// Resolved value, `None` when absent or when the expression yields `None`.
    pub fn resolve(&self, ns: &ConstantNamespace) -> Result<Option<f64>, ExprError> {
        match self {
            Param::Absent => Ok(None),
            Param::Literal(n) => Ok(Some(*n)),
            Param::Expr(expr) => expr.eval_number(ns),
        }
    }

    pub fn resolve_or(&self, ns: &ConstantNamespace, default: f64) -> Result<f64, ExprError> {
        Ok(self.resolve(ns)?.unwrap_or(default))
    }

    /// Integer pixel count, truncated toward zero like `int()`.
    pub fn pixels_or(&self, ns: &ConstantNamespace, default: i64) -> Result<i64, ExprError> {
        Ok(self
            .resolve(ns)?
            .map_or(default, |v| if v.is_finite() { v.trunc() as i64 } else { default }))
    }
}

/// A coordinate pair that only resolves when both halves do.
#[derive(Debug, Clone, PartialEq)]
pub struct PointParam {
    pub x: Param,
    pub y: Param,
}

impl PointParam {
    pub fn resolve(&self, ns: &ConstantNamespace) -> Result<Option<(f64, f64)>, ExprError> {
        let x = self.x.resolve(ns)?;
        let y = self.y.resolve(ns)?;
        Ok(x.zip(y))
    }
}

/// Read-only view over the parameter map of one instruction.
pub struct Params<'a> {
    map: &'a JsonMap<String, JsonValue>,
}

impl<'a> Params<'a> {
    pub fn new(map: &'a JsonMap<String, JsonValue>) -> Self {
        Params { map }
    }

    pub fn raw(&self, key: &str) -> Option<&'a JsonValue> {
        self.map.get(key)
    }

    pub fn number(&self, key: &str) -> Result<Param, DrawError> {
        Param::compile(key, self.map.get(key))
    }

    pub fn point(&self, x: &str, y: &str) -> Result<PointParam, DrawError> {
        Ok(PointParam {
            x: self.number(x)?,
            y: self.number(y)?,
        })
    }

    pub fn color(&self, key: &str, default: Color) -> Result<Color, DrawError> {
        Ok(self.optional_color(key)?.unwrap_or(default))
    }

    /// `None` when the key is absent or `null`.
    pub fn optional_color(&self, key: &str) -> Result<Option<Color>, DrawError> {
        match self.map.get(key) {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => Ok(Some(Color::from_json(value)?)),
        }
    }

    /// Like [`optional_color`](Self::optional_color), but an absent key yields
    /// `default` while an explicit `null` disables the colour.
    pub fn color_or_disabled(&self, key: &str, default: Color) -> Result<Option<Color>, DrawError> {
        match self.map.get(key) {
            None => Ok(Some(default)),
            Some(JsonValue::Null) => Ok(None),
            Some(value) => Ok(Some(Color::from_json(value)?)),
        }
    }

    pub fn text(&self, key: &str, default: &str) -> String {
        self.optional_text(key).unwrap_or_else(|| default.to_string())
    }

    pub fn optional_text(&self, key: &str) -> Option<String> {
        match self.map.get(key)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// `x1,y1`, `x2,y2`, ... in index order. Gaps in the numbering are
    /// skipped; a pair missing one half never resolves.
    pub fn points(&self) -> Result<Vec<PointParam>, DrawError> {
        let indices: BTreeSet<u64> = self.map.keys().filter_map(|k| point_index(k)).collect();
        indices
            .into_iter()
            .map(|i| self.point(&format!("x{i}"), &format!("y{i}")))
            .collect()
    }
}

/// `n` for keys spelled exactly `x<n>` or `y<n>` with `n >= 1`.
fn point_index(key: &str) -> Option<u64> {
    let digits = key.strip_prefix('x').or_else(|| key.strip_prefix('y'))?;
    let n: u64 = digits.parse().ok()?;
    (n >= 1 && n.to_string() == digits).then_some(n)
}

/// Resolve a point list, keeping pairs where both coordinates are numbers.
pub fn resolve_points(
    points: &[PointParam],
    ns: &ConstantNamespace,
) -> Result<Vec<(f64, f64)>, ExprError> {
    let mut out = Vec::with_capacity(points.len());
    for p in points {
        if let Some(xy) = p.resolve(ns)? {
            out.push(xy);
        }
    }
    Ok(out)
}
