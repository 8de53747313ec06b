use std::result;

use super::lexer::Delimiter;

pub type Result<T> = result::Result<T, Error>;

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum Error {
    /// Unbalanced carries the delimiter that failed to match and the byte where the imbalance was detected.
    #[error("unbalanced {0:?} at byte {1}")]
    Unbalanced(Delimiter, usize),
    /// Empty points to the opening parenthesis of a `()` pair.
    #[error("empty brackets at byte {0}")]
    Empty(usize),
}

const EMPTY_GROUP: &str = "()";

/// validate rejects input whose brackets do not nest, then input holding a literal `()`.
///
/// Both checks run over the raw text before any lexing: `( )` passes here.
pub fn validate(input: &str) -> Result<()> {
    check_balance(input)?;

    match input.find(EMPTY_GROUP) {
        Some(index) => Err(Error::Empty(index)),
        None => Ok(()),
    }
}

fn check_balance(input: &str) -> Result<()> {
    let mut open = Vec::new();

    for (index, ch) in input.char_indices() {
        if let Some(delimiter) = Delimiter::from_open(ch) {
            open.push((delimiter, index));
        } else if let Some(delimiter) = Delimiter::from_close(ch) {
            match open.pop() {
                Some((opener, _)) if opener == delimiter => {}
                _ => return Err(Error::Unbalanced(delimiter, index)),
            }
        }
    }

    match open.pop() {
        Some((delimiter, index)) => Err(Error::Unbalanced(delimiter, index)),
        None => Ok(()),
    }
}
