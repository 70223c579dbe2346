use bonesketch_api_core::Scalar;

use super::eval::power;
use super::ExprError;

/// Names callable from expressions.
pub const FUNCTIONS: &[&str] = &[
    "abs", "min", "max", "round", "int", "float", "sqrt", "sin", "cos", "tan", "asin", "acos",
    "atan", "atan2", "hypot", "radians", "degrees", "floor", "ceil", "pow",
];

pub(super) fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "tau" => Some(std::f64::consts::TAU),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

fn arity(name: &str, args: &[Scalar], min: usize, max: usize, expected: &'static str) -> Result<(), ExprError> {
    if args.len() < min || args.len() > max {
        return Err(ExprError::Arity {
            function: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn number(op: &'static str, value: &Scalar) -> Result<f64, ExprError> {
    value.as_number().ok_or(ExprError::Operand {
        op,
        kind: value.kind(),
    })
}

fn unary_math(
    name: &'static str,
    args: &[Scalar],
    f: impl Fn(f64) -> f64,
) -> Result<Scalar, ExprError> {
    arity(name, args, 1, 1, "1")?;
    Ok(Scalar::Number(f(number(name, &args[0])?)))
}

fn checked(name: &'static str, args: &[Scalar], valid: impl Fn(f64) -> bool, f: impl Fn(f64) -> f64) -> Result<Scalar, ExprError> {
    arity(name, args, 1, 1, "1")?;
    let x = number(name, &args[0])?;
    if !valid(x) {
        return Err(ExprError::Domain(name));
    }
    Ok(Scalar::Number(f(x)))
}

fn extremum(name: &'static str, args: &[Scalar], pick_right: impl Fn(f64, f64) -> bool) -> Result<Scalar, ExprError> {
    if args.is_empty() {
        return Err(ExprError::Arity {
            function: name.to_string(),
            expected: "at least 1",
            got: 0,
        });
    }
    let mut best = number(name, &args[0])?;
    for arg in &args[1..] {
        let x = number(name, arg)?;
        if pick_right(best, x) {
            best = x;
        }
    }
    Ok(Scalar::Number(best))
}

fn to_int(value: &Scalar) -> Result<f64, ExprError> {
    match value {
        Scalar::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(|n| n as f64)
            .map_err(|_| ExprError::Conversion(format!("'{text}'"))),
        other => {
            let x = number("int", other)?;
            if !x.is_finite() {
                return Err(ExprError::Conversion(x.to_string()));
            }
            Ok(x.trunc())
        }
    }
}

fn to_float(value: &Scalar) -> Result<f64, ExprError> {
    match value {
        Scalar::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ExprError::Conversion(format!("'{text}'"))),
        other => number("float", other),
    }
}

pub(super) fn call(name: &str, args: &[Scalar]) -> Result<Scalar, ExprError> {
    match name {
        "abs" => unary_math("abs", args, f64::abs),
        "min" => extremum("min", args, |best, x| x < best),
        "max" => extremum("max", args, |best, x| x > best),
        "round" => {
            arity(name, args, 1, 2, "1 or 2")?;
            let x = number("round", &args[0])?;
            let digits = match args.get(1) {
                Some(Scalar::None) | None => 0,
                Some(d) => number("round", d)? as i32,
            };
            let scale = 10f64.powi(digits);
            Ok(Scalar::Number((x * scale).round_ties_even() / scale))
        }
        "int" => {
            arity(name, args, 1, 1, "1")?;
            to_int(&args[0]).map(Scalar::Number)
        }
        "float" => {
            arity(name, args, 1, 1, "1")?;
            to_float(&args[0]).map(Scalar::Number)
        }
        "sqrt" => checked("sqrt", args, |x| x >= 0.0, f64::sqrt),
        "sin" => unary_math("sin", args, f64::sin),
        "cos" => unary_math("cos", args, f64::cos),
        "tan" => unary_math("tan", args, f64::tan),
        "asin" => checked("asin", args, |x| (-1.0..=1.0).contains(&x), f64::asin),
        "acos" => checked("acos", args, |x| (-1.0..=1.0).contains(&x), f64::acos),
        "atan" => unary_math("atan", args, f64::atan),
        "atan2" => {
            arity(name, args, 2, 2, "2")?;
            let y = number("atan2", &args[0])?;
            let x = number("atan2", &args[1])?;
            Ok(Scalar::Number(y.atan2(x)))
        }
        "hypot" => {
            let mut sum = 0.0;
            for arg in args {
                let x = number("hypot", arg)?;
                sum += x * x;
            }
            Ok(Scalar::Number(sum.sqrt()))
        }
        "radians" => unary_math("radians", args, f64::to_radians),
        "degrees" => unary_math("degrees", args, f64::to_degrees),
        "floor" => unary_math("floor", args, f64::floor),
        "ceil" => unary_math("ceil", args, f64::ceil),
        "pow" => {
            arity(name, args, 2, 2, "2")?;
            let a = number("pow", &args[0])?;
            let b = number("pow", &args[1])?;
            power(a, b).map(Scalar::Number)
        }
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(x: f64) -> Scalar {
        Scalar::Number(x)
    }

    #[test]
    fn round_is_bankers_rounding() {
        assert_eq!(call("round", &[n(2.5)]), Ok(n(2.0)));
        assert_eq!(call("round", &[n(3.5)]), Ok(n(4.0)));
        assert_eq!(call("round", &[n(1.2345), n(2.0)]), Ok(n(1.23)));
    }

    #[test]
    fn int_truncates_and_parses_text() {
        assert_eq!(call("int", &[n(-2.7)]), Ok(n(-2.0)));
        assert_eq!(call("int", &[Scalar::Text(" 12 ".into())]), Ok(n(12.0)));
        assert!(matches!(
            call("int", &[Scalar::Text("1.5".into())]),
            Err(ExprError::Conversion(_))
        ));
        assert_eq!(call("float", &[Scalar::Text("1.5".into())]), Ok(n(1.5)));
    }

    #[test]
    fn min_max_take_any_count() {
        assert_eq!(call("min", &[n(3.0), n(-1.0), n(2.0)]), Ok(n(-1.0)));
        assert_eq!(call("max", &[n(3.0), Scalar::Bool(true)]), Ok(n(3.0)));
        assert!(matches!(call("max", &[]), Err(ExprError::Arity { .. })));
    }

    #[test]
    fn domain_errors_are_reported() {
        assert_eq!(call("sqrt", &[n(-1.0)]), Err(ExprError::Domain("sqrt")));
        assert_eq!(call("acos", &[n(2.0)]), Err(ExprError::Domain("acos")));
    }

    #[test]
    fn geometry_helpers() {
        assert_eq!(call("hypot", &[n(3.0), n(4.0)]), Ok(n(5.0)));
        assert_eq!(call("degrees", &[n(std::f64::consts::PI)]), Ok(n(180.0)));
        assert_eq!(call("atan2", &[n(0.0), n(1.0)]), Ok(n(0.0)));
    }

    #[test]
    fn arity_and_unknown_functions() {
        assert!(matches!(call("sin", &[n(1.0), n(2.0)]), Err(ExprError::Arity { got: 2, .. })));
        assert_eq!(
            call("exec", &[]),
            Err(ExprError::UnknownFunction("exec".into()))
        );
    }
}
