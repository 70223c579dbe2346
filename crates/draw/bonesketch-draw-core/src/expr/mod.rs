//! Expression language for instruction parameters.
//!
//! A small, side-effect free subset of Python expression syntax evaluated
//! against a [`ConstantNamespace`]:
//!
//! ```text
//! BONES_HEAD_SCREEN_COORDS_0 + 10
//! (BONES_HAND_L_SCREEN_COORDS_1 + BONES_HAND_R_SCREEN_COORDS_1) / 2
//! 5 if SHAPE_KEYS_SMILE > 0.5 else 2
//! hypot(A_X - B_X, A_Y - B_Y)
//! ```
//!
//! Values are [`Scalar`]s. Numbers are `f64`; booleans take part in arithmetic
//! as 0 and 1.

mod builtins;
mod eval;
mod parse;

use std::fmt;

use bonesketch_api_core::{ConstantNamespace, Scalar, ScalarKind};
use thiserror::Error;

pub use builtins::FUNCTIONS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("syntax error at offset {offset} in `{expr}`: {message}")]
    Syntax {
        expr: String,
        offset: usize,
        message: String,
    },
    #[error("name '{0}' is not defined")]
    UnknownName(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: &'static str,
        got: usize,
    },
    #[error("unsupported operand type(s) for {op}: {left} and {right}")]
    Operands {
        op: &'static str,
        left: ScalarKind,
        right: ScalarKind,
    },
    #[error("bad operand type for {op}: {kind}")]
    Operand { op: &'static str, kind: ScalarKind },
    #[error("division by zero")]
    DivisionByZero,
    #[error("math domain error in {0}")]
    Domain(&'static str),
    #[error("cannot convert {0} to a number")]
    Conversion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Scalar),
    Name(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// `a < b <= c`: every adjacent pair must hold.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call(String, Vec<Expr>),
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let ast = parse::parse_expression(source)?;
        Ok(Expression {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn eval(&self, ns: &ConstantNamespace) -> Result<Scalar, ExprError> {
        eval::evaluate(&self.ast, ns)
    }

    /// Evaluate and require a numeric result. `None` stays `None`.
    pub fn eval_number(&self, ns: &ConstantNamespace) -> Result<Option<f64>, ExprError> {
        match self.eval(ns)? {
            Scalar::None => Ok(None),
            Scalar::Text(text) => Err(ExprError::Conversion(format!("'{text}'"))),
            other => Ok(other.as_number()),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate `source` in one step.
pub fn evaluate(source: &str, ns: &ConstantNamespace) -> Result<Scalar, ExprError> {
    Expression::parse(source)?.eval(ns)
}
