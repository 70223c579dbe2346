//! nom grammar, lowest precedence first:
//!
//! ```text
//! expr       := or_test [ "if" or_test "else" expr ]
//! or_test    := and_test ( "or" and_test )*
//! and_test   := not_test ( "and" not_test )*
//! not_test   := "not" not_test | comparison
//! comparison := arith ( ("<" | "<=" | ">" | ">=" | "==" | "!=") arith )*
//! arith      := term ( ("+" | "-") term )*
//! term       := factor ( ("*" | "/" | "//" | "%") factor )*
//! factor     := ("+" | "-") factor | power
//! power      := atom [ "**" factor ]
//! atom       := "(" expr ")" | number | string | True | False | None
//!             | name "(" args ")" | name
//! ```

use std::cell::Cell;

use bonesketch_api_core::Scalar;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_res, not, opt, recognize, value, verify},
    error::{Error as NomError, ErrorKind},
    multi::{fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{BinaryOp, CmpOp, Expr, ExprError, UnaryOp};

type Res<'a, T> = IResult<&'a str, T>;

const KEYWORDS: &[&str] = &["and", "or", "not", "if", "else", "True", "False", "None"];

/// Bound on nested `expr`/`not_test`/`factor` entries. A parenthesised
/// group costs three.
pub(super) const MAX_DEPTH: usize = 96;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

pub(super) fn parse_expression(source: &str) -> Result<Expr, ExprError> {
    DEPTH.with(|d| d.set(0));
    match all_consuming(ws(expr))(source) {
        Ok((_, ast)) => Ok(ast),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(ExprError::Syntax {
            expr: source.to_string(),
            offset: source.len() - e.input.len(),
            message: "expression is nested too deeply".to_string(),
        }),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(source, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(syntax_error(source, "")),
    }
}

/// Runs `inner` one level deeper, failing without backtracking past
/// `MAX_DEPTH`.
fn nested<'a, O>(input: &'a str, inner: fn(&'a str) -> Res<'a, O>) -> Res<'a, O> {
    let depth = DEPTH.with(|d| {
        let depth = d.get() + 1;
        d.set(depth);
        depth
    });
    let out = if depth > MAX_DEPTH {
        Err(nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge)))
    } else {
        inner(input)
    };
    DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    out
}

fn syntax_error(source: &str, rest: &str) -> ExprError {
    let offset = source.len() - rest.len();
    let message = match rest.trim_start().chars().next() {
        None => "unexpected end of expression".to_string(),
        Some(c) => format!("unexpected '{c}'"),
    };
    ExprError::Syntax {
        expr: source.to_string(),
        offset,
        message,
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    ws(terminated(tag(kw), not(satisfy(is_ident_char))))
}

fn identifier(input: &str) -> Res<&str> {
    verify(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
            take_while(is_ident_char),
        )),
        |name: &str| !KEYWORDS.contains(&name),
    )(input)
}

// Written out rather than nom's `double`, which also accepts `inf` and `nan`.
fn number(input: &str) -> Res<f64> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    map_res(recognize(pair(mantissa, opt(exponent))), |text: &str| {
        text.parse::<f64>()
    })(input)
}

fn string_literal(input: &str) -> Res<String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        str::to_string,
    )(input)
}

fn call(input: &str) -> Res<Expr> {
    map(
        pair(
            identifier,
            delimited(
                ws(char('(')),
                terminated(separated_list0(ws(char(',')), expr), opt(ws(char(',')))),
                ws(char(')')),
            ),
        ),
        |(name, args)| Expr::Call(name.to_string(), args),
    )(input)
}

fn atom(input: &str) -> Res<Expr> {
    ws(alt((
        delimited(char('('), expr, char(')')),
        map(number, |n| Expr::Literal(Scalar::Number(n))),
        map(string_literal, |s| Expr::Literal(Scalar::Text(s))),
        value(Expr::Literal(Scalar::Bool(true)), keyword("True")),
        value(Expr::Literal(Scalar::Bool(false)), keyword("False")),
        value(Expr::Literal(Scalar::None), keyword("None")),
        call,
        map(identifier, |name| Expr::Name(name.to_string())),
    )))(input)
}

fn power(input: &str) -> Res<Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), factor))(input)?;
    let out = match exponent {
        Some(exp) => Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exp)),
        None => base,
    };
    Ok((input, out))
}

fn factor(input: &str) -> Res<Expr> {
    nested(input, signed)
}

fn signed(input: &str) -> Res<Expr> {
    alt((
        map(pair(ws(one_of("+-")), factor), |(sign, operand)| {
            let op = if sign == '-' { UnaryOp::Neg } else { UnaryOp::Pos };
            Expr::Unary(op, Box::new(operand))
        }),
        power,
    ))(input)
}

fn term(input: &str) -> Res<Expr> {
    let (input, first) = factor(input)?;
    let op = alt((
        value(BinaryOp::FloorDiv, tag("//")),
        value(BinaryOp::Div, char('/')),
        value(BinaryOp::Mul, terminated(char('*'), not(char('*')))),
        value(BinaryOp::Mod, char('%')),
    ));
    fold_many0(
        pair(ws(op), factor),
        move || first.clone(),
        |lhs, (op, rhs)| Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn arith(input: &str) -> Res<Expr> {
    let (input, first) = term(input)?;
    let op = alt((value(BinaryOp::Add, char('+')), value(BinaryOp::Sub, char('-'))));
    fold_many0(
        pair(ws(op), term),
        move || first.clone(),
        |lhs, (op, rhs)| Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn cmp_op(input: &str) -> Res<CmpOp> {
    alt((
        value(CmpOp::Le, tag("<=")),
        value(CmpOp::Ge, tag(">=")),
        value(CmpOp::Eq, tag("==")),
        value(CmpOp::Ne, tag("!=")),
        value(CmpOp::Lt, char('<')),
        value(CmpOp::Gt, char('>')),
    ))(input)
}

fn comparison(input: &str) -> Res<Expr> {
    let (input, first) = arith(input)?;
    let (input, rest) = many0(pair(ws(cmp_op), arith))(input)?;
    let out = if rest.is_empty() {
        first
    } else {
        Expr::Compare(Box::new(first), rest)
    };
    Ok((input, out))
}

fn not_test(input: &str) -> Res<Expr> {
    nested(input, negated)
}

fn negated(input: &str) -> Res<Expr> {
    alt((
        map(preceded(keyword("not"), not_test), |e| {
            Expr::Unary(UnaryOp::Not, Box::new(e))
        }),
        comparison,
    ))(input)
}

fn and_test(input: &str) -> Res<Expr> {
    let (input, first) = not_test(input)?;
    fold_many0(
        preceded(keyword("and"), not_test),
        move || first.clone(),
        |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn or_test(input: &str) -> Res<Expr> {
    let (input, first) = and_test(input)?;
    fold_many0(
        preceded(keyword("or"), and_test),
        move || first.clone(),
        |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)),
    )(input)
}

fn expr(input: &str) -> Res<Expr> {
    nested(input, conditional)
}

fn conditional(input: &str) -> Res<Expr> {
    let (input, body) = or_test(input)?;
    let (input, tail) = opt(pair(
        preceded(keyword("if"), or_test),
        preceded(keyword("else"), expr),
    ))(input)?;
    let out = match tail {
        Some((cond, otherwise)) => Expr::Conditional {
            cond: Box::new(cond),
            then: Box::new(body),
            otherwise: Box::new(otherwise),
        },
        None => body,
    };
    Ok((input, out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::Literal(Scalar::Number(n))
    }

    fn name(n: &str) -> Expr {
        Expr::Name(n.to_string())
    }

    fn bin(op: BinaryOp, l: Expr, r: Expr) -> Expr {
        Expr::Binary(op, Box::new(l), Box::new(r))
    }

    #[test]
    fn numbers_in_every_spelling() {
        assert_eq!(parse_expression("42").unwrap(), num(42.0));
        assert_eq!(parse_expression("2.5").unwrap(), num(2.5));
        assert_eq!(parse_expression(".5").unwrap(), num(0.5));
        assert_eq!(parse_expression("1e3").unwrap(), num(1000.0));
        assert_eq!(parse_expression("3.").unwrap(), num(3.0));
    }

    #[test]
    fn inf_and_nan_are_names_not_numbers() {
        assert_eq!(parse_expression("inf").unwrap(), name("inf"));
        assert_eq!(parse_expression("nan").unwrap(), name("nan"));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(
            parse_expression("A + B * 2").unwrap(),
            bin(BinaryOp::Add, name("A"), bin(BinaryOp::Mul, name("B"), num(2.0)))
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        assert_eq!(
            parse_expression("10 - 3 - 2").unwrap(),
            bin(BinaryOp::Sub, bin(BinaryOp::Sub, num(10.0), num(3.0)), num(2.0))
        );
    }

    #[test]
    fn power_is_right_associative_and_beats_unary_minus() {
        assert_eq!(
            parse_expression("2 ** 3 ** 2").unwrap(),
            bin(BinaryOp::Pow, num(2.0), bin(BinaryOp::Pow, num(3.0), num(2.0)))
        );
        assert_eq!(
            parse_expression("-2 ** 2").unwrap(),
            Expr::Unary(UnaryOp::Neg, Box::new(bin(BinaryOp::Pow, num(2.0), num(2.0))))
        );
    }

    #[test]
    fn floor_division_and_power_are_not_split() {
        assert_eq!(
            parse_expression("7 // 2").unwrap(),
            bin(BinaryOp::FloorDiv, num(7.0), num(2.0))
        );
        assert_eq!(
            parse_expression("7 * 2").unwrap(),
            bin(BinaryOp::Mul, num(7.0), num(2.0))
        );
    }

    #[test]
    fn calls_accept_trailing_commas() {
        assert_eq!(
            parse_expression("max(A, 3,)").unwrap(),
            Expr::Call("max".into(), vec![name("A"), num(3.0)])
        );
        assert_eq!(parse_expression("f()").unwrap(), Expr::Call("f".into(), vec![]));
    }

    #[test]
    fn chained_comparison_and_conditional() {
        let ast = parse_expression("1 if 0 < X <= 10 else 2").unwrap();
        match ast {
            Expr::Conditional { cond, .. } => match *cond {
                Expr::Compare(_, rest) => assert_eq!(rest.len(), 2),
                other => panic!("expected comparison, got {other:?}"),
            },
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn keywords_need_a_word_boundary() {
        assert_eq!(parse_expression("NONE_X").unwrap(), name("NONE_X"));
        assert_eq!(parse_expression("None_x").unwrap(), name("None_x"));
        assert_eq!(parse_expression("None").unwrap(), Expr::Literal(Scalar::None));
        assert_eq!(
            parse_expression("not X").unwrap(),
            Expr::Unary(UnaryOp::Not, Box::new(name("X")))
        );
        assert_eq!(parse_expression("notX").unwrap(), name("notX"));
    }

    #[test]
    fn strings_with_either_quote() {
        assert_eq!(
            parse_expression("'red'").unwrap(),
            Expr::Literal(Scalar::Text("red".into()))
        );
        assert_eq!(
            parse_expression("\"it's\"").unwrap(),
            Expr::Literal(Scalar::Text("it's".into()))
        );
    }

    #[test]
    fn syntax_errors_report_offset() {
        match parse_expression("1 + ") {
            Err(ExprError::Syntax { offset, message, .. }) => {
                assert_eq!(offset, 2);
                assert_eq!(message, "unexpected '+'");
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
        assert!(matches!(parse_expression(""), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse_expression("A B"), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse_expression("__import__('os')"), Ok(Expr::Call(..))));
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let deep = format!("{}1{}", "(".repeat(2000), ")".repeat(2000));
        match parse_expression(&deep) {
            Err(ExprError::Syntax { message, .. }) => {
                assert_eq!(message, "expression is nested too deeply")
            }
            other => panic!("expected syntax error, got {other:?}"),
        }
        let signs = format!("{}1", "-".repeat(500));
        assert!(matches!(parse_expression(&signs), Err(ExprError::Syntax { .. })));
        let nots = format!("{}X", "not ".repeat(500));
        assert!(matches!(parse_expression(&nots), Err(ExprError::Syntax { .. })));
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let nested = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse_expression(&nested).unwrap(), num(1.0));
        // the depth counter is released after a failed parse
        assert!(parse_expression(&"(".repeat(200)).is_err());
        assert_eq!(parse_expression("(((2)))").unwrap(), num(2.0));
    }
}
