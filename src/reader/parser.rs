use std::collections::HashMap;
use std::convert;
use std::fmt;
use std::iter;
use std::result;

use lazy_static::lazy_static;

use super::lexer::{
    Delimiter, Error as LexerError, Lexer, Operator, Result as LexerResult, Token,
};
use crate::number::Number;

pub type Result<T> = result::Result<T, Error>;

const LOWEST_BINDING_POWER: u8 = 0;

/// NEGATION_BINDING_POWER places prefix `-` above every entry of `BINDING_POWER`,
/// so `-3^2` reads as `(-3)^2`.
const NEGATION_BINDING_POWER: u8 = 5;

/// MAX_DEPTH bounds both how deeply the parser may recurse into one statement
/// and the height of the expression tree it builds.
pub const MAX_DEPTH: usize = 256;

// an expression paired with the height of its tree
type Node = (Expr, usize);

lazy_static! {
    /// BINDING_POWER ranks the operators that may follow an operand.
    static ref BINDING_POWER: HashMap<Operator, u8> = {
        let mut map = HashMap::new();

        map.insert(Operator::Plus, 1);
        map.insert(Operator::Minus, 1);
        map.insert(Operator::Star, 2);
        map.insert(Operator::Slash, 2);
        map.insert(Operator::Percent, 2);
        map.insert(Operator::Caret, 3);
        map.insert(Operator::Bang, 4);

        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

impl BinaryOp {
    fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Plus => Some(BinaryOp::Add),
            Operator::Minus => Some(BinaryOp::Sub),
            Operator::Star => Some(BinaryOp::Mul),
            Operator::Slash => Some(BinaryOp::Div),
            Operator::Percent => Some(BinaryOp::Rem),
            Operator::Caret => Some(BinaryOp::Pow),
            Operator::Bang => None,
        }
    }

    pub fn symbol(self) -> char {
        use self::BinaryOp::*;

        match self {
            Add => '+',
            Sub => '-',
            Mul => '*',
            Div => '/',
            Rem => '%',
            Pow => '^',
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Number(Number),
    Name(String),
    Call(String, Box<Expr>),
    Neg(Box<Expr>),
    Factorial(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Expr::*;

        match self {
            Number(n) => write!(f, "{}", n),
            Name(name) => write!(f, "{}", name),
            Call(name, arg) => write!(f, "{}({})", name, arg),
            Neg(operand) => write!(f, "(-{})", operand),
            Factorial(operand) => write!(f, "({}!)", operand),
            Binary(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Assign(String, Expr),
    Expr(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Assign(name, expr) => write!(f, "{} = {}", name, expr),
            Stmt::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum Error {
    #[error("unrecognized character {1:?} at byte {0}")]
    UnrecognizedCharacter(usize, char),
    #[error("unexpected {token} on line {line}")]
    UnexpectedToken { token: String, line: usize },
    #[error("unexpected end of input on line {line}")]
    UnexpectedEnd { line: usize },
    #[error("expression on line {line} nests deeper than {limit}")]
    TooDeep { line: usize, limit: usize },
    #[error("internal reader error")]
    Internal,
}

impl convert::From<LexerError> for Error {
    fn from(lexer_error: LexerError) -> Self {
        match lexer_error {
            LexerError::UnrecognizedCharacter(index, ch) => Error::UnrecognizedCharacter(index, ch),
            LexerError::Internal => Error::Internal,
        }
    }
}

/// Parser reads one statement at a time from the token stream so that each can
/// be evaluated before the rest of the input is looked at.
pub struct Parser<'input> {
    lexer: Lexer<'input>,
    // one token of lookahead, tagged with the line it was lexed on
    peeked: Option<(usize, LexerResult<Token<'input>>)>,
    line: usize,
    // current recursion depth of parse_expr
    depth: usize,
    failed: bool,
}

impl<'input> Parser<'input> {
    pub fn new(lexer: Lexer<'input>) -> Self {
        let line = lexer.line();
        Self {
            lexer,
            peeked: None,
            line,
            depth: 0,
            failed: false,
        }
    }

    fn fill(&mut self) {
        if self.peeked.is_none() {
            let line = self.lexer.line();
            self.peeked = self.lexer.next().map(|item| (line, item));
        }
    }

    fn peeked_line(&self) -> usize {
        match &self.peeked {
            Some((line, _)) => *line,
            None => self.lexer.line(),
        }
    }

    /// peek surfaces a lexer error as soon as it is the next item.
    fn peek(&mut self) -> Result<Option<&Token<'input>>> {
        self.fill();
        let failed = match &self.peeked {
            Some((_, Err(_))) => true,
            _ => false,
        };
        if failed {
            return match self.peeked.take() {
                Some((_, Err(e))) => Err(e.into()),
                _ => Err(Error::Internal),
            };
        }
        Ok(match &self.peeked {
            Some((_, Ok(token))) => Some(token),
            _ => None,
        })
    }

    fn next_token(&mut self) -> Option<LexerResult<Token<'input>>> {
        self.fill();
        let (line, item) = self.peeked.take()?;
        self.line = line;
        Some(item)
    }

    fn advance(&mut self) -> Result<Token<'input>> {
        match self.next_token() {
            Some(result) => Ok(result?),
            None => Err(Error::UnexpectedEnd {
                line: self.lexer.line(),
            }),
        }
    }

    fn unexpected(token: &Token, line: usize) -> Error {
        Error::UnexpectedToken {
            token: token.to_string(),
            line,
        }
    }

    pub fn parse_statement(&mut self) -> Result<Stmt> {
        let stmt = match self.advance()? {
            Token::Name(name) => {
                let is_assignment = match self.peek()? {
                    Some(Token::Equals) => true,
                    _ => false,
                };
                if is_assignment {
                    self.advance()?;
                    let (expr, _) = self.parse_expr(LOWEST_BINDING_POWER)?;
                    Stmt::Assign(name.into(), expr)
                } else {
                    let head = self.parse_name(name)?;
                    Stmt::Expr(self.parse_infix(head, LOWEST_BINDING_POWER)?.0)
                }
            }
            token => {
                let head = self.parse_prefix(token)?;
                Stmt::Expr(self.parse_infix(head, LOWEST_BINDING_POWER)?.0)
            }
        };

        let trailing = self.peek()?.cloned();
        match trailing {
            None | Some(Token::Newline) => Ok(stmt),
            Some(token) => Err(Parser::unexpected(&token, self.peeked_line())),
        }
    }

    fn too_deep(&self) -> Error {
        Error::TooDeep {
            line: self.line,
            limit: MAX_DEPTH,
        }
    }

    /// nest is the height of a node over a subtree of `height`.
    fn nest(&self, height: usize) -> Result<usize> {
        if height >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok(height + 1)
    }

    fn parse_expr(&mut self, min_power: u8) -> Result<Node> {
        if self.depth >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.depth += 1;
        let result = self.parse_operand(min_power);
        self.depth -= 1;
        result
    }

    fn parse_operand(&mut self, min_power: u8) -> Result<Node> {
        let token = self.advance()?;
        let head = self.parse_prefix(token)?;
        self.parse_infix(head, min_power)
    }

    fn parse_prefix(&mut self, token: Token<'input>) -> Result<Node> {
        match token {
            Token::Op(Operator::Minus) => {
                let (operand, height) = self.parse_expr(NEGATION_BINDING_POWER)?;
                Ok((Expr::Neg(Box::new(operand)), self.nest(height)?))
            }
            Token::Number(n) => Ok((Expr::Number(n), 1)),
            Token::Name(name) => self.parse_name(name),
            Token::Open(Delimiter::Paren) => {
                let inner = self.parse_expr(LOWEST_BINDING_POWER)?;
                self.expect_close()?;
                Ok(inner)
            }
            token => Err(Parser::unexpected(&token, self.line)),
        }
    }

    /// parse_name reads a bare name or, when a `(` follows, a function call.
    fn parse_name(&mut self, name: &str) -> Result<Node> {
        let is_call = match self.peek()? {
            Some(Token::Open(Delimiter::Paren)) => true,
            _ => false,
        };
        if !is_call {
            return Ok((Expr::Name(name.into()), 1));
        }

        self.advance()?;
        let (arg, height) = self.parse_expr(LOWEST_BINDING_POWER)?;
        self.expect_close()?;
        Ok((Expr::Call(name.into(), Box::new(arg)), self.nest(height)?))
    }

    fn expect_close(&mut self) -> Result<()> {
        match self.advance()? {
            Token::Close(Delimiter::Paren) => Ok(()),
            token => Err(Parser::unexpected(&token, self.line)),
        }
    }

    /// parse_infix folds binary and postfix operators onto `head` while they bind
    /// at least as tightly as `min_power`. Binary operands parse one level higher,
    /// which makes every binary operator left-associative.
    fn parse_infix(&mut self, head: Node, min_power: u8) -> Result<Node> {
        let (mut lhs, mut height) = head;

        loop {
            let op = match self.peek()? {
                Some(Token::Op(op)) => *op,
                _ => break,
            };
            let power = match BINDING_POWER.get(&op) {
                Some(&power) => power,
                None => break,
            };
            if power < min_power {
                break;
            }
            self.advance()?;

            lhs = match BinaryOp::from_operator(op) {
                Some(binary_op) => {
                    let (rhs, rhs_height) = self.parse_expr(power + 1)?;
                    height = self.nest(height.max(rhs_height))?;
                    Expr::Binary(binary_op, Box::new(lhs), Box::new(rhs))
                }
                None => {
                    height = self.nest(height)?;
                    Expr::Factorial(Box::new(lhs))
                }
            };
        }

        Ok((lhs, height))
    }
}

impl<'input> iter::Iterator for Parser<'input> {
    type Item = Result<Stmt>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.peek() {
                Ok(Some(Token::Newline)) => {
                    self.next_token();
                }
                Ok(Some(_)) => break,
                Ok(None) => return None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        let result = self.parse_statement();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_parse(input: &str) -> Result<Vec<Stmt>> {
        Parser::new(Lexer::new(input)).collect()
    }

    fn num(n: i64) -> Expr {
        Expr::Number(Number::from(n))
    }

    fn name(name: &str) -> Expr {
        Expr::Name(name.into())
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary(op, Box::new(left), Box::new(right))
    }

    fn neg(operand: Expr) -> Expr {
        Expr::Neg(Box::new(operand))
    }

    fn factorial(operand: Expr) -> Expr {
        Expr::Factorial(Box::new(operand))
    }

    fn call(name: &str, arg: Expr) -> Expr {
        Expr::Call(name.into(), Box::new(arg))
    }

    macro_rules! parse_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (input, expected): (&str, Vec<Stmt>) = $value;
                    let result = run_parse(input).unwrap();
                    assert_eq!(expected, result);
                }
            )*
        }
    }

    parse_tests! {
        can_parse_empty_input: ("", vec![]),
        can_parse_only_separators: ("\n;\n", vec![]),
        can_parse_numbers: ("3", vec![Stmt::Expr(num(3))]),
        can_parse_names: ("x", vec![Stmt::Expr(name("x"))]),
        can_parse_precedence: ("2+3*4", vec![
            Stmt::Expr(binary(BinaryOp::Add, num(2), binary(BinaryOp::Mul, num(3), num(4))))
        ]),
        can_parse_left_associativity: ("8-3-2", vec![
            Stmt::Expr(binary(BinaryOp::Sub, binary(BinaryOp::Sub, num(8), num(3)), num(2)))
        ]),
        can_parse_left_associative_powers: ("2^3^2", vec![
            Stmt::Expr(binary(BinaryOp::Pow, binary(BinaryOp::Pow, num(2), num(3)), num(2)))
        ]),
        negation_binds_tighter_than_power: ("-3^2", vec![
            Stmt::Expr(binary(BinaryOp::Pow, neg(num(3)), num(2)))
        ]),
        negation_binds_tighter_than_factorial: ("-3!", vec![
            Stmt::Expr(factorial(neg(num(3))))
        ]),
        factorial_binds_tighter_than_power: ("2^3!", vec![
            Stmt::Expr(binary(BinaryOp::Pow, num(2), factorial(num(3))))
        ]),
        can_parse_negative_exponents: ("2^-3^2", vec![
            Stmt::Expr(binary(BinaryOp::Pow, binary(BinaryOp::Pow, num(2), neg(num(3))), num(2)))
        ]),
        can_parse_factorial_of_negated_operand: ("2*-3!", vec![
            Stmt::Expr(binary(BinaryOp::Mul, num(2), factorial(neg(num(3)))))
        ]),
        can_parse_double_negation: ("--3", vec![Stmt::Expr(neg(neg(num(3))))]),
        can_parse_repeated_factorial: ("3!!", vec![Stmt::Expr(factorial(factorial(num(3))))]),
        can_parse_groups: ("(2+3)*4", vec![
            Stmt::Expr(binary(BinaryOp::Mul, binary(BinaryOp::Add, num(2), num(3)), num(4)))
        ]),
        can_parse_calls: ("sin(x) + 1", vec![
            Stmt::Expr(binary(BinaryOp::Add, call("sin", name("x")), num(1)))
        ]),
        can_parse_negated_call: ("-abs(2)", vec![Stmt::Expr(neg(call("abs", num(2))))]),
        can_parse_assignment: ("x = 2 * 3", vec![
            Stmt::Assign("x".into(), binary(BinaryOp::Mul, num(2), num(3)))
        ]),
        can_parse_statements: ("x = 5\nx+1;;x", vec![
            Stmt::Assign("x".into(), num(5)),
            Stmt::Expr(binary(BinaryOp::Add, name("x"), num(1))),
            Stmt::Expr(name("x")),
        ]),
        can_parse_name_led_expression: ("x % 2", vec![
            Stmt::Expr(binary(BinaryOp::Rem, name("x"), num(2)))
        ]),
    }

    #[test]
    fn can_display_statements() {
        let stmts = run_parse("y = -2^3! + 1").unwrap();
        assert_eq!(stmts[0].to_string(), "y = (((-2) ^ (3!)) + 1)");
    }

    #[test]
    fn rejects_unexpected_tokens() {
        assert_eq!(
            run_parse("( )"),
            Err(Error::UnexpectedToken {
                token: ")".into(),
                line: 1
            })
        );
        assert_eq!(
            run_parse("2 3"),
            Err(Error::UnexpectedToken {
                token: "3".into(),
                line: 1
            })
        );
        assert_eq!(
            run_parse("1\n\n= 2"),
            Err(Error::UnexpectedToken {
                token: "=".into(),
                line: 3
            })
        );
    }

    #[test]
    fn rejects_truncated_input() {
        assert_eq!(run_parse("2 +"), Err(Error::UnexpectedEnd { line: 1 }));
        assert_eq!(run_parse("sin(2"), Err(Error::UnexpectedEnd { line: 1 }));
    }

    #[test]
    fn bounds_nesting() {
        let too_deep = Err(Error::TooDeep {
            line: 1,
            limit: MAX_DEPTH,
        });

        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(run_parse(&parens), too_deep);
        assert_eq!(run_parse(&format!("{}1", "-".repeat(100_000))), too_deep);
        assert_eq!(run_parse(&format!("1{}", "!".repeat(100_000))), too_deep);
        assert_eq!(run_parse(&format!("1{}", "+1".repeat(100_000))), too_deep);
        assert_eq!(run_parse(&format!("{}1{}", "abs(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH))), too_deep);

        let shallow = format!("{}1{}", "(".repeat(MAX_DEPTH - 1), ")".repeat(MAX_DEPTH - 1));
        assert_eq!(run_parse(&shallow), Ok(vec![Stmt::Expr(num(1))]));
        assert!(run_parse(&format!("{}1", "-".repeat(MAX_DEPTH - 1))).is_ok());
    }

    #[test]
    fn surfaces_lexer_errors() {
        assert_eq!(run_parse("2 + #"), Err(Error::UnrecognizedCharacter(4, '#')));
    }

    #[test]
    fn stops_after_first_error() {
        let mut parser = Parser::new(Lexer::new("1\n2 3\n4"));
        assert_eq!(parser.next(), Some(Ok(Stmt::Expr(num(1)))));
        assert!(parser.next().unwrap().is_err());
        assert_eq!(parser.next(), None);
    }

    #[test]
    fn reads_statements_lazily() {
        let mut parser = Parser::new(Lexer::new("1\n$"));
        assert_eq!(parser.next(), Some(Ok(Stmt::Expr(num(1)))));
        assert_eq!(parser.next(), Some(Err(Error::UnrecognizedCharacter(2, '$'))));
    }
}
