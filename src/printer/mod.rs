use std::io;

use itertools::Itertools;

use crate::evaluator::{Error, Output};
use crate::number::Error as NumberError;

pub fn print_to(mut out: impl io::Write, outputs: &[Output]) -> io::Result<()> {
    write!(&mut out, "{}", outputs.iter().format("\n"))
}

pub fn println_to(mut out: impl io::Write, outputs: &[Output]) -> io::Result<()> {
    if outputs.is_empty() {
        return Ok(());
    }
    print_to(&mut out, outputs)?;
    writeln!(&mut out)
}

/// describe maps an error to the message shown to the user.
pub fn describe(error: &Error) -> String {
    match error {
        Error::UnrecognizedCharacter(_, ch) => format!("I don't know what {:?} means.", ch),
        Error::UnbalancedBrackets(..) => "Your brackets don't match up.".into(),
        Error::EmptyBrackets(_) => "There is nothing between those brackets.".into(),
        Error::Overflow { operation, limit } => format!(
            "That number is too big: {} only accepts operands up to {}.",
            operation, limit
        ),
        Error::UndefinedName(name) => format!("{} is not defined.", name),
        Error::KeywordTaken(name) => format!("{} is a reserved name and can't be assigned.", name),
        Error::Arithmetic(NumberError::DivisionByZero) => "You can't divide by zero.".into(),
        Error::Arithmetic(e) => format!("Math error: {}.", e),
        Error::UnexpectedToken { token, line } => {
            format!("Syntax error on line {}: didn't expect {}.", line, token)
        }
        Error::UnexpectedEnd { .. } => "The expression ended too early.".into(),
        Error::TooDeep { limit, .. } => {
            format!("That expression nests more than {} levels deep.", limit)
        }
        Error::Internal => "Something went wrong while reading that.".into(),
    }
}

pub fn print_error_to(mut out: impl io::Write, error: &Error) -> io::Result<()> {
    writeln!(&mut out, "{}", describe(error))
}
