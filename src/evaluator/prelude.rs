use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::f64::consts;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lazy_static::lazy_static;
use log::trace;

use super::evaluator::{Error, Result};
use crate::number::{Error as NumberError, Number};

/// FIBONACCI_LIMIT is the largest argument `fib` accepts.
pub const FIBONACCI_LIMIT: i64 = 400;

const FIBONACCI_MEMO_CAPACITY: usize = 5;

lazy_static! {
    static ref CONSTANTS: HashMap<&'static str, Number> = {
        let mut map = HashMap::new();

        map.insert("pi", Number::from_f64(consts::PI));
        map.insert("e", Number::from_f64(consts::E));
        map.insert("tau", Number::from_f64(consts::TAU));
        map.insert("inf", Number::infinity(false));
        map.insert("nan", Number::NaN);

        map
    };

    /// FIBONACCI_MEMO is shared by every evaluation in the process.
    static ref FIBONACCI_MEMO: Mutex<Memo> = Mutex::new(Memo::new(FIBONACCI_MEMO_CAPACITY));
}

type HostFn = fn(&Number) -> Result<Number>;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Builtin {
    Round,
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Fib,
}

static PRELUDE_FUNCTIONS: &[(&str, Builtin)] = &[
    ("round", Builtin::Round),
    ("sin", Builtin::Sin),
    ("cos", Builtin::Cos),
    ("tan", Builtin::Tan),
    ("sqrt", Builtin::Sqrt),
    ("abs", Builtin::Abs),
    ("fib", Builtin::Fib),
];

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        PRELUDE_FUNCTIONS
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, builtin)| *builtin)
    }

    pub fn name(self) -> &'static str {
        PRELUDE_FUNCTIONS
            .iter()
            .find(|(_, builtin)| *builtin == self)
            .map_or("?", |(k, _)| *k)
    }

    fn host_fn(self) -> HostFn {
        use self::Builtin::*;

        match self {
            Round => round,
            Sin => sin,
            Cos => cos,
            Tan => tan,
            Sqrt => sqrt,
            Abs => abs,
            Fib => fib,
        }
    }

    pub fn apply(self, arg: &Number) -> Result<Number> {
        trace!("applying {} to {}", self.name(), arg);
        (self.host_fn())(arg)
    }
}

pub fn constant(name: &str) -> Option<Number> {
    CONSTANTS.get(name).cloned()
}

/// is_reserved reports whether `name` belongs to the constant or function table.
pub fn is_reserved(name: &str) -> bool {
    CONSTANTS.contains_key(name) || Builtin::lookup(name).is_some()
}

fn domain_error() -> Error {
    Error::from(NumberError::Domain)
}

fn round(arg: &Number) -> Result<Number> {
    Ok(arg.round_half_even()?)
}

fn abs(arg: &Number) -> Result<Number> {
    Ok(arg.abs())
}

// the trigonometric functions reject infinities; NaN passes through
fn trig(arg: &Number, f: fn(f64) -> f64) -> Result<Number> {
    let x = arg.to_f64();
    if x.is_infinite() {
        return Err(domain_error());
    }
    Ok(Number::from_f64(f(x)))
}

fn sin(arg: &Number) -> Result<Number> {
    trig(arg, libm::sin)
}

fn cos(arg: &Number) -> Result<Number> {
    trig(arg, libm::cos)
}

fn tan(arg: &Number) -> Result<Number> {
    trig(arg, libm::tan)
}

fn sqrt(arg: &Number) -> Result<Number> {
    let x = arg.to_f64();
    if x < 0.0 {
        return Err(domain_error());
    }
    Ok(Number::from_f64(libm::sqrt(x)))
}

fn fib(arg: &Number) -> Result<Number> {
    if arg.exceeds(FIBONACCI_LIMIT)? {
        return Err(Error::Overflow {
            operation: "fib",
            limit: FIBONACCI_LIMIT,
        });
    }
    fibonacci(arg)
}

fn fibonacci(n: &Number) -> Result<Number> {
    if n.compare(&Number::from(1))? != Ordering::Greater {
        return Ok(n.clone());
    }

    let cached = memo().get(n);
    if let Some(value) = cached {
        trace!("fib({}) memo hit", n);
        return Ok(value);
    }

    let a = fibonacci(&n.sub(&Number::from(1))?)?;
    let b = fibonacci(&n.sub(&Number::from(2))?)?;
    let value = a.add(&b)?;

    memo().insert(n.clone(), value.clone());
    Ok(value)
}

fn memo() -> MutexGuard<'static, Memo> {
    FIBONACCI_MEMO
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Memo is a small least-recently-used map.
#[derive(Debug)]
struct Memo {
    capacity: usize,
    entries: VecDeque<(Number, Number)>,
}

impl Memo {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn position(&self, key: &Number) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    fn get(&mut self, key: &Number) -> Option<Number> {
        let index = self.position(key)?;
        let entry = self.entries.remove(index)?;
        let value = entry.1.clone();
        self.entries.push_back(entry);
        Some(value)
    }

    fn insert(&mut self, key: Number, value: Number) {
        if let Some(index) = self.position(&key) {
            self.entries.remove(index);
        } else if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(input: &str) -> Number {
        input.parse().unwrap()
    }

    fn apply(name: &str, arg: &str) -> Result<String> {
        let builtin = Builtin::lookup(name).unwrap();
        builtin.apply(&num(arg)).map(|n| n.to_string())
    }

    #[test]
    fn can_resolve_names() {
        assert_eq!(Builtin::lookup("sqrt"), Some(Builtin::Sqrt));
        assert_eq!(Builtin::lookup("log"), None);
        assert_eq!(Builtin::Fib.name(), "fib");
        assert!(is_reserved("pi"));
        assert!(is_reserved("round"));
        assert!(!is_reserved("x"));
    }

    #[test]
    fn has_constants() {
        assert_eq!(
            constant("pi").unwrap().to_string(),
            "3.141592653589793115997963468544185161590576171875"
        );
        assert_eq!(
            constant("tau").unwrap().to_string(),
            "6.28318530717958623199592693708837032318115234375"
        );
        assert_eq!(constant("inf"), Some(Number::infinity(false)));
        assert!(constant("nan").unwrap().is_nan());
        assert_eq!(constant("sin"), None);
    }

    #[test]
    fn can_apply_float_functions() {
        assert_eq!(apply("sqrt", "16"), Ok("4".into()));
        assert_eq!(apply("sin", "0"), Ok("0".into()));
        assert_eq!(apply("cos", "0"), Ok("1".into()));
        assert_eq!(
            apply("sin", "1"),
            Ok("0.8414709848078965048756572286947630345821380615234375".into())
        );
        assert_eq!(apply("sqrt", "-1"), Err(domain_error()));
        assert_eq!(
            Builtin::Tan.apply(&Number::infinity(false)),
            Err(domain_error())
        );
    }

    #[test]
    fn can_round_and_abs() {
        assert_eq!(apply("round", "2.5"), Ok("2".into()));
        assert_eq!(apply("round", "2.567"), Ok("3".into()));
        assert_eq!(apply("abs", "-3.50"), Ok("3.50".into()));
        assert!(Builtin::Round.apply(&Number::NaN).is_err());
    }

    #[test]
    fn can_compute_fibonacci() {
        assert_eq!(apply("fib", "0"), Ok("0".into()));
        assert_eq!(apply("fib", "1"), Ok("1".into()));
        assert_eq!(apply("fib", "10"), Ok("55".into()));
        assert_eq!(apply("fib", "90"), Ok("2880067194370816120".into()));
        assert_eq!(apply("fib", "-4"), Ok("-4".into()));
    }

    #[test]
    fn fibonacci_is_guarded() {
        assert!(apply("fib", "400").is_ok());
        assert_eq!(
            apply("fib", "401"),
            Err(Error::Overflow {
                operation: "fib",
                limit: FIBONACCI_LIMIT
            })
        );
        assert!(Builtin::Fib.apply(&Number::NaN).is_err());
    }

    #[test]
    fn memo_evicts_least_recently_used() {
        let mut memo = Memo::new(2);
        memo.insert(Number::from(1), Number::from(10));
        memo.insert(Number::from(2), Number::from(20));
        assert_eq!(memo.get(&Number::from(1)), Some(Number::from(10)));

        memo.insert(Number::from(3), Number::from(30));
        assert_eq!(memo.get(&Number::from(2)), None);
        assert_eq!(memo.get(&Number::from(1)), Some(Number::from(10)));
        assert_eq!(memo.get(&Number::from(3)), Some(Number::from(30)));
    }
}
