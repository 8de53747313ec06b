mod brackets;
mod lexer;
mod parser;

use self::lexer::Lexer;

pub use self::brackets::{validate, Error as BracketError};
pub use self::lexer::{lex, Delimiter, Error as LexerError, Operator, Token};
pub use self::parser::{BinaryOp, Error, Expr, Parser, Result, Stmt, MAX_DEPTH};

/// statements lazily reads `input` one statement at a time. Brackets are not
/// checked here; callers run `validate` first.
pub fn statements(input: &str) -> Parser<'_> {
    Parser::new(Lexer::new(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::Number;

    #[test]
    fn can_read_statements() {
        let input = "x = 2\n-x";
        let stmts = statements(input).collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(
            stmts,
            vec![
                Stmt::Assign("x".into(), Expr::Number(Number::from(2))),
                Stmt::Expr(Expr::Neg(Box::new(Expr::Name("x".into())))),
            ]
        )
    }

    #[test]
    fn leaves_brackets_to_validate() {
        let mut stmts = statements("(2");
        assert_eq!(stmts.next(), Some(Err(Error::UnexpectedEnd { line: 1 })));
        assert_eq!(validate("(2"), Err(BracketError::Unbalanced(Delimiter::Paren, 0)));
    }
}
