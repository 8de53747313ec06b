use std::collections::HashMap;
use std::fmt;
use std::iter;
use std::result;
use std::str;

use lazy_static::lazy_static;
use log::trace;

use crate::number::Number;

const OPEN_PAREN: char = '(';
const CLOSE_PAREN: char = ')';
const OPEN_BRACKET: char = '[';
const CLOSE_BRACKET: char = ']';
const OPEN_BRACE: char = '{';
const CLOSE_BRACE: char = '}';
const EQUALS_CHAR: char = '=';
const DECIMAL_POINT: char = '.';
const NEWLINE_CHAR: char = '\n';
const SEPARATOR_CHAR: char = ';';

lazy_static! {
    /// OPERATORS maps each operator character to the operator it denotes.
    static ref OPERATORS: HashMap<char, Operator> = {
        let mut map = HashMap::new();

        map.insert('+', Operator::Plus);
        map.insert('-', Operator::Minus);
        map.insert('*', Operator::Star);
        map.insert('/', Operator::Slash);
        map.insert('%', Operator::Percent);
        map.insert('^', Operator::Caret);
        map.insert('!', Operator::Bang);

        map
    };
}

/// Result binds the std::result::Result::Err type to this module's error type.
pub type Result<T> = result::Result<T, Error>;

/// lex eagerly collects every token of `input`, stopping at the first error.
pub fn lex(input: &str) -> Result<Vec<Token<'_>>> {
    Lexer::new(input).tokens()
}

/// Error is raised when the next character cannot start any token.
#[derive(thiserror::Error, Debug, PartialEq, Clone)]
pub enum Error {
    /// UnrecognizedCharacter carries the byte offset and the character itself.
    #[error("unrecognized character {1:?} at byte {0}")]
    UnrecognizedCharacter(usize, char),
    // a token whose first character was already matched failed to lex
    #[error("internal lexer error")]
    Internal,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Bang,
}

impl Operator {
    pub fn symbol(self) -> char {
        use self::Operator::*;

        match self {
            Plus => '+',
            Minus => '-',
            Star => '*',
            Slash => '/',
            Percent => '%',
            Caret => '^',
            Bang => '!',
        }
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Delimiter {
    Paren,   // ()
    Bracket, // []
    Brace,   // {}
}

impl Delimiter {
    pub fn open_char(self) -> char {
        use self::Delimiter::*;

        match self {
            Paren => OPEN_PAREN,
            Bracket => OPEN_BRACKET,
            Brace => OPEN_BRACE,
        }
    }

    pub fn close_char(self) -> char {
        use self::Delimiter::*;

        match self {
            Paren => CLOSE_PAREN,
            Bracket => CLOSE_BRACKET,
            Brace => CLOSE_BRACE,
        }
    }

    pub fn from_open(ch: char) -> Option<Self> {
        match ch {
            OPEN_PAREN => Some(Delimiter::Paren),
            OPEN_BRACKET => Some(Delimiter::Bracket),
            OPEN_BRACE => Some(Delimiter::Brace),
            _ => None,
        }
    }

    pub fn from_close(ch: char) -> Option<Self> {
        match ch {
            CLOSE_PAREN => Some(Delimiter::Paren),
            CLOSE_BRACKET => Some(Delimiter::Bracket),
            CLOSE_BRACE => Some(Delimiter::Brace),
            _ => None,
        }
    }
}

/// Token is one lexeme of an expression. Names borrow from the input.
#[derive(Debug, PartialEq, Clone)]
pub enum Token<'input> {
    Open(Delimiter),
    Close(Delimiter),
    Number(Number),
    Name(&'input str),
    Op(Operator),
    Equals,
    Newline,
}

impl<'input> fmt::Display for Token<'input> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Token::*;

        match self {
            Open(delimiter) => write!(f, "{}", delimiter.open_char()),
            Close(delimiter) => write!(f, "{}", delimiter.close_char()),
            Number(n) => write!(f, "{}", n),
            Name(name) => write!(f, "{}", name),
            Op(op) => write!(f, "{}", op.symbol()),
            Equals => write!(f, "{}", EQUALS_CHAR),
            Newline => write!(f, "newline"),
        }
    }
}

/// Lexer yields tokens on demand, so nothing past a failing statement is read.
#[derive(Debug)]
pub struct Lexer<'input> {
    input: &'input str,
    iter: iter::Peekable<str::CharIndices<'input>>,
    line: usize,
}

impl<'input> Lexer<'input> {
    pub fn new(input: &'input str) -> Self {
        Self {
            input,
            iter: input.char_indices().peekable(),
            line: 1,
        }
    }

    /// line is the statement counter; it starts at 1 and advances once per newline character consumed.
    pub fn line(&self) -> usize {
        self.line
    }

    fn tokens(self) -> Result<Vec<Token<'input>>> {
        self.collect::<result::Result<Vec<_>, _>>()
    }

    /// advance_if consumes the longest run of chars matching `predicate` and returns
    /// the byte offsets of its first and last char, or None for an empty run.
    fn advance_if<P>(&mut self, predicate: P) -> Option<(usize, usize)>
    where
        P: Fn(char) -> bool,
    {
        let start = match self.peek() {
            Some(&(index, ch)) if predicate(ch) => {
                self.consume();
                index
            }
            _ => return None,
        };
        let mut end = start;

        while let Some(&(index, ch)) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.consume();
            end = index;
        }

        Some((start, end))
    }

    fn consume(&mut self) -> Option<(usize, char)> {
        self.iter.next()
    }

    fn peek(&mut self) -> Option<&(usize, char)> {
        self.iter.peek()
    }

    /// take_while is `advance_if` returning the matched slice of the input.
    fn take_while<P>(&mut self, predicate: P) -> Option<&'input str>
    where
        P: Fn(char) -> bool,
    {
        self.advance_if(predicate)
            .map(|(start, finish)| &self.input[start..=finish])
    }

    fn consume_delimiter<T>(&mut self, token: T, delimiter: Delimiter) -> Result<Token<'input>>
    where
        T: Fn(Delimiter) -> Token<'input>,
    {
        self.consume();
        Ok(token(delimiter))
    }

    fn is_digit(ch: char) -> bool {
        ch.is_ascii_digit()
    }

    /// has_fraction checks for a decimal point directly followed by a digit.
    fn has_fraction(&mut self) -> bool {
        match self.peek() {
            Some(&(index, DECIMAL_POINT)) => self.input[index + DECIMAL_POINT.len_utf8()..]
                .chars()
                .next()
                .map_or(false, Lexer::is_digit),
            _ => false,
        }
    }

    fn consume_number(&mut self) -> Result<Token<'input>> {
        let (start, mut end) = self.advance_if(Lexer::is_digit).ok_or(Error::Internal)?;

        if self.has_fraction() {
            self.consume();
            let (_, fraction_end) = self.advance_if(Lexer::is_digit).ok_or(Error::Internal)?;
            end = fraction_end;
        }

        self.input[start..=end]
            .parse()
            .map(Token::Number)
            .map_err(|_| Error::Internal)
    }

    fn is_name_start(ch: char) -> bool {
        ch.is_ascii_alphabetic() || ch == '_'
    }

    fn is_name(ch: char) -> bool {
        ch.is_ascii_alphanumeric() || ch == '_'
    }

    fn consume_name(&mut self) -> Result<Token<'input>> {
        self.take_while(Lexer::is_name)
            .map(Token::Name)
            .ok_or(Error::Internal)
    }

    fn is_separator(ch: char) -> bool {
        ch == NEWLINE_CHAR || ch == SEPARATOR_CHAR
    }

    // a run of separators is one statement boundary
    fn consume_newline(&mut self) -> Result<Token<'input>> {
        let run = self.take_while(Lexer::is_separator).ok_or(Error::Internal)?;
        self.line += run.matches(NEWLINE_CHAR).count();
        Ok(Token::Newline)
    }

    fn consume_operator(&mut self, op: Operator) -> Result<Token<'input>> {
        self.consume();
        Ok(Token::Op(op))
    }

    fn consume_equals(&mut self) -> Result<Token<'input>> {
        self.consume().map(|_| Token::Equals).ok_or(Error::Internal)
    }

    fn is_whitespace(ch: char) -> bool {
        ch == ' ' || ch == '\t'
    }
}

impl<'a> iter::Iterator for Lexer<'a> {
    type Item = Result<Token<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance_if(Lexer::is_whitespace);

        let next_token = match self.peek() {
            None => return None,
            Some(&(_, OPEN_PAREN)) => self.consume_delimiter(Token::Open, Delimiter::Paren),
            Some(&(_, CLOSE_PAREN)) => self.consume_delimiter(Token::Close, Delimiter::Paren),
            Some(&(_, EQUALS_CHAR)) => self.consume_equals(),
            Some(&(_, ch)) if Lexer::is_separator(ch) => self.consume_newline(),
            Some(&(_, ch)) if Lexer::is_digit(ch) => self.consume_number(),
            Some(&(_, ch)) if Lexer::is_name_start(ch) => self.consume_name(),
            Some(&(index, ch)) => match OPERATORS.get(&ch) {
                Some(&op) => self.consume_operator(op),
                None => {
                    // skip it so the next call resumes after the bad char
                    self.consume();
                    Err(Error::UnrecognizedCharacter(index, ch))
                }
            },
        };

        if let Ok(token) = &next_token {
            trace!("line {}: lexed {}", self.line, token);
        }
        Some(next_token)
    }
}
