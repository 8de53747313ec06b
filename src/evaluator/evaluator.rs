use std::convert;
use std::fmt;
use std::result;

use log::debug;

use super::env::Env;
use super::prelude::{self, Builtin};
use crate::number::{Error as NumberError, Number};
use crate::reader::{self, BinaryOp, BracketError, Delimiter, Expr, Stmt};

/// POWER_LIMIT bounds the magnitude of both operands of `^`.
pub const POWER_LIMIT: i64 = 200;

/// FACTORIAL_LIMIT is the largest operand `!` accepts.
pub const FACTORIAL_LIMIT: i64 = 50;

pub type Result<T> = result::Result<T, Error>;

/// Error is every way an evaluation can fail. The first error aborts the evaluation.
#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum Error {
    #[error("unrecognized character {1:?} at byte {0}")]
    UnrecognizedCharacter(usize, char),
    #[error("unbalanced brackets: {0:?} at byte {1}")]
    UnbalancedBrackets(Delimiter, usize),
    #[error("empty brackets at byte {0}")]
    EmptyBrackets(usize),
    #[error("{operation} overflow: operand exceeds {limit}")]
    Overflow { operation: &'static str, limit: i64 },
    #[error("name {0:?} is not defined")]
    UndefinedName(String),
    #[error("{0:?} is a reserved keyword")]
    KeywordTaken(String),
    #[error(transparent)]
    Arithmetic(#[from] NumberError),
    #[error("syntax error: unexpected {token} on line {line}")]
    UnexpectedToken { token: String, line: usize },
    #[error("syntax error: unexpected end of input on line {line}")]
    UnexpectedEnd { line: usize },
    #[error("expression on line {line} nests deeper than {limit}")]
    TooDeep { line: usize, limit: usize },
    #[error("internal reader error")]
    Internal,
}

impl convert::From<BracketError> for Error {
    fn from(bracket_error: BracketError) -> Self {
        match bracket_error {
            BracketError::Unbalanced(delimiter, index) => Error::UnbalancedBrackets(delimiter, index),
            BracketError::Empty(index) => Error::EmptyBrackets(index),
        }
    }
}

impl convert::From<reader::Error> for Error {
    fn from(reader_error: reader::Error) -> Self {
        match reader_error {
            reader::Error::UnrecognizedCharacter(index, ch) => {
                Error::UnrecognizedCharacter(index, ch)
            }
            reader::Error::UnexpectedToken { token, line } => {
                Error::UnexpectedToken { token, line }
            }
            reader::Error::UnexpectedEnd { line } => Error::UnexpectedEnd { line },
            reader::Error::TooDeep { line, limit } => Error::TooDeep { line, limit },
            reader::Error::Internal => Error::Internal,
        }
    }
}

/// Output is one entry of the result sequence: the value of a bare expression,
/// or the binding made by an assignment.
#[derive(Debug, PartialEq, Clone)]
pub enum Output {
    Value(Number),
    Assignment(String, Number),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Output::Value(value) => write!(f, "{}", value),
            Output::Assignment(name, value) => write!(f, "{} = {}", name, value),
        }
    }
}

pub fn eval_stmt(stmt: &Stmt, env: &mut Env) -> Result<Output> {
    let output = match stmt {
        Stmt::Assign(name, expr) => {
            let value = eval_expr(expr, env)?;
            if prelude::is_reserved(name) {
                return Err(Error::KeywordTaken(name.clone()));
            }
            env.bind(name, value.clone());
            Output::Assignment(name.clone(), value)
        }
        Stmt::Expr(expr) => Output::Value(eval_expr(expr, env)?),
    };
    debug!("{} => {}", stmt, output);
    Ok(output)
}

pub fn eval_expr(expr: &Expr, env: &Env) -> Result<Number> {
    use self::Expr::*;

    match expr {
        Number(n) => Ok(n.clone()),
        Name(name) => eval_name(name, env),
        Call(name, arg) => {
            let arg = eval_expr(arg, env)?;
            let builtin = Builtin::lookup(name).ok_or_else(|| Error::UndefinedName(name.clone()))?;
            builtin.apply(&arg)
        }
        Neg(operand) => Ok(eval_expr(operand, env)?.neg()),
        Factorial(operand) => factorial(&eval_expr(operand, env)?),
        Binary(op, left, right) => {
            let left = eval_expr(left, env)?;
            let right = eval_expr(right, env)?;
            eval_binary(*op, &left, &right)
        }
    }
}

fn eval_name(name: &str, env: &Env) -> Result<Number> {
    prelude::constant(name)
        .or_else(|| env.lookup(name).cloned())
        .ok_or_else(|| Error::UndefinedName(name.to_string()))
}

fn eval_binary(op: BinaryOp, left: &Number, right: &Number) -> Result<Number> {
    let value = match op {
        BinaryOp::Add => left.add(right)?,
        BinaryOp::Sub => left.sub(right)?,
        BinaryOp::Mul => left.mul(right)?,
        BinaryOp::Div => left.div(right)?,
        BinaryOp::Rem => left.rem(right)?,
        BinaryOp::Pow => power(left, right)?,
    };
    Ok(value)
}

fn power(base: &Number, exponent: &Number) -> Result<Number> {
    if base.magnitude_exceeds(POWER_LIMIT)? || exponent.magnitude_exceeds(POWER_LIMIT)? {
        return Err(Error::Overflow {
            operation: "power",
            limit: POWER_LIMIT,
        });
    }
    Ok(base.pow(exponent)?)
}

/// factorial evaluates `Γ(x + 1)` in double precision.
fn factorial(operand: &Number) -> Result<Number> {
    if operand.exceeds(FACTORIAL_LIMIT)? {
        return Err(Error::Overflow {
            operation: "factorial",
            limit: FACTORIAL_LIMIT,
        });
    }

    let x = operand.to_f64() + 1.0;
    // the poles of Γ
    if x == f64::NEG_INFINITY || (x <= 0.0 && x.fract() == 0.0) {
        return Err(Error::Arithmetic(NumberError::Domain));
    }
    Ok(Number::from_f64(libm::tgamma(x)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_eval(input: &str) -> Result<Vec<String>> {
        let mut env = Env::new();
        reader::statements(input)
            .map(|stmt| eval_stmt(&stmt?, &mut env).map(|output| output.to_string()))
            .collect()
    }

    macro_rules! eval_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, expected): (&str, Vec<&str>) = $value;
                    let result = run_eval(input).unwrap();
                    assert_eq!(expected, result);
                }
            )*
        }
    }

    eval_tests! {
        can_eval_numbers: ("42", vec!["42"]),
        can_eval_precedence: ("2+3*4", vec!["14"]),
        can_eval_groups: ("(2+3)*4", vec!["20"]),
        can_eval_negated_powers: ("-3^2", vec!["9"]),
        can_eval_negated_result: ("-(3^2)", vec!["-9"]),
        can_eval_left_associative_powers: ("2^3^2", vec!["64"]),
        can_eval_factorial: ("5!", vec!["120"]),
        can_eval_factorial_in_exponent: ("2^3!", vec!["64"]),
        can_eval_factorial_of_zero: ("0! + 1!", vec!["2"]),
        can_eval_division: ("7/2", vec!["3.5"]),
        can_eval_remainder: ("-7 % 3", vec!["-1"]),
        can_eval_decimals_exactly: ("0.1 + 0.2", vec!["0.3"]),
        can_eval_constants: ("inf; -inf; nan", vec!["Infinity", "-Infinity", "NaN"]),
        can_eval_calls: ("sqrt(9) + abs(-1)", vec!["4"]),
        can_eval_nested_calls: ("fib(fib(5))", vec!["5"]),
        can_eval_assignments: ("x = 5\nx+1", vec!["x = 5", "6"]),
        can_reassign: ("x = 1; x = x + 1; x", vec!["x = 1", "x = 2", "2"]),
        can_eval_assignment_of_expression: ("y = 2^10", vec!["y = 1024"]),
        can_eval_nan_arithmetic: ("nan * 0", vec!["NaN"]),
    }

    #[test]
    fn guards_power() {
        let overflow = Err(Error::Overflow {
            operation: "power",
            limit: POWER_LIMIT,
        });
        assert_eq!(run_eval("201^2"), overflow);
        assert_eq!(run_eval("2^201"), overflow);
        assert_eq!(run_eval("(-201)^2"), overflow);
        assert_eq!(run_eval("inf^1"), overflow);
        assert!(run_eval("200^2").is_ok());
        assert!(run_eval("nan^2").is_err());
    }

    #[test]
    fn guards_factorial() {
        assert_eq!(
            run_eval("51!"),
            Err(Error::Overflow {
                operation: "factorial",
                limit: FACTORIAL_LIMIT,
            })
        );
        assert!(run_eval("50!").is_ok());
        assert_eq!(
            run_eval("(-1)!"),
            Err(Error::Arithmetic(NumberError::Domain))
        );
    }

    #[test]
    fn resolves_names() {
        assert_eq!(run_eval("y+1"), Err(Error::UndefinedName("y".into())));
        assert_eq!(run_eval("log(1)"), Err(Error::UndefinedName("log".into())));
        assert_eq!(run_eval("x = 1; x(2)"), Err(Error::UndefinedName("x".into())));
        assert_eq!(run_eval("sin"), Err(Error::UndefinedName("sin".into())));
        // the argument is evaluated before the name is resolved
        assert_eq!(
            run_eval("log(1/0)"),
            Err(Error::Arithmetic(NumberError::DivisionByZero))
        );
    }

    #[test]
    fn rejects_reserved_assignments() {
        assert_eq!(run_eval("pi = 1"), Err(Error::KeywordTaken("pi".into())));
        assert_eq!(run_eval("fib = 1"), Err(Error::KeywordTaken("fib".into())));
        // the right-hand side is evaluated first
        assert_eq!(
            run_eval("e = 1/0"),
            Err(Error::Arithmetic(NumberError::DivisionByZero))
        );
    }

    #[test]
    fn reserved_assignment_leaves_env_untouched() {
        let mut env = Env::new();
        let stmt = Stmt::Assign("tau".into(), Expr::Number(Number::from(1)));
        assert!(eval_stmt(&stmt, &mut env).is_err());
        assert!(env.is_empty());
    }

    #[test]
    fn propagates_arithmetic_faults() {
        assert_eq!(
            run_eval("1/0"),
            Err(Error::Arithmetic(NumberError::DivisionByZero))
        );
        assert_eq!(
            run_eval("0/0"),
            Err(Error::Arithmetic(NumberError::DivisionUndefined))
        );
        assert!(run_eval("inf - inf").is_err());
    }

    #[test]
    fn can_display_outputs() {
        assert_eq!(Output::Value(Number::from(3)).to_string(), "3");
        assert_eq!(
            Output::Assignment("x".into(), Number::from(-3)).to_string(),
            "x = -3"
        );
    }
}
