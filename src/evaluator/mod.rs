mod env;
mod evaluator;
pub mod prelude;

use log::debug;

use crate::reader;

pub use self::env::Env;
pub use self::evaluator::{eval_expr, eval_stmt, Error, Output, Result, FACTORIAL_LIMIT, POWER_LIMIT};
pub use self::prelude::{Builtin, FIBONACCI_LIMIT};

/// eval evaluates every statement of `input` in order against a fresh set of
/// variables. Each statement is evaluated before the next one is parsed.
pub fn eval(input: &str) -> Result<Vec<Output>> {
    reader::validate(input)?;

    let mut env = Env::new();
    let mut results = vec![];
    for stmt in reader::statements(input) {
        results.push(eval_stmt(&stmt?, &mut env)?);
        if !env.is_empty() {
            debug!("{}", env);
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_eval_input() {
        let results = eval("a = 2; b = a * 3\nb - a").unwrap();
        let rendered = results.iter().map(|r| r.to_string()).collect::<Vec<_>>();
        assert_eq!(rendered, vec!["a = 2", "b = 6", "4"]);
    }

    #[test]
    fn checks_brackets_before_lexing() {
        assert_eq!(eval("$ + ()"), Err(Error::EmptyBrackets(4)));
    }

    #[test]
    fn evaluates_statements_in_order() {
        // the first statement fails before the second is lexed
        assert_eq!(eval("y\n$"), Err(Error::UndefinedName("y".into())));
    }
}
