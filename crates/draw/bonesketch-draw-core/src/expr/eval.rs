use std::cmp::Ordering;

use bonesketch_api_core::{ConstantNamespace, Scalar, ScalarKind};

use super::builtins;
use super::{BinaryOp, CmpOp, Expr, ExprError, UnaryOp};

pub(super) fn evaluate(expr: &Expr, ns: &ConstantNamespace) -> Result<Scalar, ExprError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Name(name) => lookup(name, ns),
        Expr::Unary(op, operand) => unary(*op, evaluate(operand, ns)?),
        Expr::Binary(op, lhs, rhs) => binary(*op, evaluate(lhs, ns)?, evaluate(rhs, ns)?),
        Expr::Compare(first, rest) => {
            let mut left = evaluate(first, ns)?;
            for (op, operand) in rest {
                let right = evaluate(operand, ns)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Scalar::Bool(false));
                }
                left = right;
            }
            Ok(Scalar::Bool(true))
        }
        Expr::And(lhs, rhs) => {
            let left = evaluate(lhs, ns)?;
            if left.truthy() {
                evaluate(rhs, ns)
            } else {
                Ok(left)
            }
        }
        Expr::Or(lhs, rhs) => {
            let left = evaluate(lhs, ns)?;
            if left.truthy() {
                Ok(left)
            } else {
                evaluate(rhs, ns)
            }
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if evaluate(cond, ns)?.truthy() {
                evaluate(then, ns)
            } else {
                evaluate(otherwise, ns)
            }
        }
        Expr::Call(name, args) => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ns))
                .collect::<Result<Vec<_>, _>>()?;
            builtins::call(name, &values)
        }
    }
}

fn lookup(name: &str, ns: &ConstantNamespace) -> Result<Scalar, ExprError> {
    if let Some(value) = ns.get(name) {
        return Ok(value.clone());
    }
    builtins::constant(name)
        .map(Scalar::Number)
        .ok_or_else(|| ExprError::UnknownName(name.to_string()))
}

fn unary(op: UnaryOp, value: Scalar) -> Result<Scalar, ExprError> {
    match op {
        UnaryOp::Not => Ok(Scalar::Bool(!value.truthy())),
        UnaryOp::Neg | UnaryOp::Pos => {
            let n = value.as_number().ok_or(ExprError::Operand {
                op: if op == UnaryOp::Neg { "unary -" } else { "unary +" },
                kind: value.kind(),
            })?;
            Ok(Scalar::Number(if op == UnaryOp::Neg { -n } else { n }))
        }
    }
}

fn binary(op: BinaryOp, lhs: Scalar, rhs: Scalar) -> Result<Scalar, ExprError> {
    if let (BinaryOp::Add, Scalar::Text(a), Scalar::Text(b)) = (op, &lhs, &rhs) {
        return Ok(Scalar::Text(format!("{a}{b}")));
    }
    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Err(ExprError::Operands {
            op: op.symbol(),
            left: lhs.kind(),
            right: rhs.kind(),
        });
    };
    let out = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ExprError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => python_mod(a, b)?,
        BinaryOp::Pow => power(a, b)?,
    };
    Ok(Scalar::Number(out))
}

/// Remainder with the sign of the divisor.
fn python_mod(a: f64, b: f64) -> Result<f64, ExprError> {
    if b == 0.0 {
        return Err(ExprError::DivisionByZero);
    }
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

pub(super) fn power(a: f64, b: f64) -> Result<f64, ExprError> {
    if a == 0.0 && b < 0.0 {
        return Err(ExprError::DivisionByZero);
    }
    if a < 0.0 && b.fract() != 0.0 {
        return Err(ExprError::Domain("**"));
    }
    Ok(a.powf(b))
}

fn compare(op: CmpOp, lhs: &Scalar, rhs: &Scalar) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => return Ok(equal(lhs, rhs)),
        CmpOp::Ne => return Ok(!equal(lhs, rhs)),
        _ => {}
    }
    let ordering = match (lhs, rhs) {
        (Scalar::Text(a), Scalar::Text(b)) => Some(a.cmp(b)),
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(ExprError::Operands {
                    op: op.symbol(),
                    left: lhs.kind(),
                    right: rhs.kind(),
                })
            }
        },
    };
    // NaN compares false both ways
    let Some(ordering) = ordering else {
        return Ok(false);
    };
    Ok(match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
    })
}

fn equal(lhs: &Scalar, rhs: &Scalar) -> bool {
    match (lhs, rhs) {
        (Scalar::None, Scalar::None) => true,
        (Scalar::Text(a), Scalar::Text(b)) => a == b,
        _ if lhs.kind() == ScalarKind::Text || rhs.kind() == ScalarKind::Text => false,
        _ => match (lhs.as_number(), rhs.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::{evaluate as eval_str, ExprError};
    use bonesketch_api_core::{ConstantNamespace, Scalar};
    use serde_json::json;

    fn ns() -> ConstantNamespace {
        ConstantNamespace::flatten(&json!({
            "bones": {"head": {"screen_coords": [100, 50]}},
            "camera": {"resolution_x": 640, "resolution_y": 480},
            "label": "hero",
            "missing": null
        }))
    }

    fn num(src: &str) -> f64 {
        match eval_str(src, &ns()) {
            Ok(Scalar::Number(n)) => n,
            other => panic!("{src}: expected number, got {other:?}"),
        }
    }

    #[test]
    fn identifiers_resolve_against_the_namespace() {
        assert_eq!(num("BONES_HEAD_SCREEN_COORDS_0 + 10"), 110.0);
        assert_eq!(num("CAMERA_RESOLUTION_X / 2"), 320.0);
    }

    #[test]
    fn python_division_semantics() {
        assert_eq!(num("7 // 2"), 3.0);
        assert_eq!(num("-7 // 2"), -4.0);
        assert_eq!(num("-7 % 3"), 2.0);
        assert_eq!(num("7 % -3"), -2.0);
        assert_eq!(num("2 ** -1"), 0.5);
        assert_eq!(num("-2 ** 2"), -4.0);
    }

    #[test]
    fn division_by_zero_is_an_error() {
        for src in ["1 / 0", "1 // 0", "1 % 0", "0 ** -1"] {
            assert_eq!(eval_str(src, &ns()), Err(ExprError::DivisionByZero), "{src}");
        }
    }

    #[test]
    fn boolean_operators_return_operands() {
        assert_eq!(eval_str("MISSING or 5", &ns()), Ok(Scalar::Number(5.0)));
        assert_eq!(eval_str("0 and 5", &ns()), Ok(Scalar::Number(0.0)));
        assert_eq!(eval_str("not MISSING", &ns()), Ok(Scalar::Bool(true)));
        // short circuit skips the failing branch
        assert_eq!(eval_str("1 or 1 / 0", &ns()), Ok(Scalar::Number(1.0)));
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(eval_str("0 < 5 <= 5", &ns()), Ok(Scalar::Bool(true)));
        assert_eq!(eval_str("0 < 5 < 5", &ns()), Ok(Scalar::Bool(false)));
        assert_eq!(eval_str("LABEL == 'hero'", &ns()), Ok(Scalar::Bool(true)));
        assert_eq!(eval_str("LABEL == 1", &ns()), Ok(Scalar::Bool(false)));
        assert_eq!(eval_str("True == 1", &ns()), Ok(Scalar::Bool(true)));
        assert!(matches!(
            eval_str("LABEL < 1", &ns()),
            Err(ExprError::Operands { .. })
        ));
    }

    #[test]
    fn conditional_picks_a_branch() {
        assert_eq!(num("10 if CAMERA_RESOLUTION_X > 100 else 20"), 10.0);
        assert_eq!(num("10 if MISSING else 20"), 20.0);
    }

    #[test]
    fn text_concatenates_but_does_not_mix_with_numbers() {
        assert_eq!(
            eval_str("LABEL + '!'", &ns()),
            Ok(Scalar::Text("hero!".into()))
        );
        assert!(matches!(
            eval_str("LABEL + 1", &ns()),
            Err(ExprError::Operands { op: "+", .. })
        ));
        assert!(matches!(
            eval_str("MISSING + 1", &ns()),
            Err(ExprError::Operands { .. })
        ));
    }

    #[test]
    fn unknown_names_are_errors() {
        assert_eq!(
            eval_str("NOT_THERE + 1", &ns()),
            Err(ExprError::UnknownName("NOT_THERE".into()))
        );
    }

    #[test]
    fn namespace_shadows_builtin_constants() {
        let mut ns = ns();
        assert!((num("pi") - std::f64::consts::PI).abs() < 1e-12);
        ns.insert("pi", 3.0);
        assert_eq!(eval_str("pi", &ns), Ok(Scalar::Number(3.0)));
    }
}
