pub mod evaluator;
pub mod number;
pub mod printer;
pub mod reader;
pub mod repl;

pub use crate::evaluator::{eval, Error, Output};
pub use crate::number::Number;
