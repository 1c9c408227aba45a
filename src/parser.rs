use lazy_static::lazy_static;
use regex::Regex;

use crate::datum::{cons, quote, Datum};
use crate::error::{ParserError, ParserErrorKind};
use crate::lexer::{Lexer, Token, TokenWrapper};

lazy_static! {
    static ref INT_PATTERN: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    static ref DEC_PATTERN: Regex =
        Regex::new(r"^[+-]?(\d+\.\d*|\.\d+|\d+)([eE][+-]?\d+)?$").unwrap();
}

fn unexpected_token(tok: &TokenWrapper, expected: String) -> ParserError {
    ParserError {
        line: tok.line,
        column: tok.column,
        kind: ParserErrorKind::UnexpectedToken(format!("{:?}", tok.token), expected),
    }
}

fn invalid_token(tok: &TokenWrapper) -> ParserError {
    ParserError {
        line: tok.line,
        column: tok.column,
        kind: ParserErrorKind::InvalidToken(format!("{:?}", tok.token)),
    }
}

fn eof_error(tok: &TokenWrapper) -> ParserError {
    ParserError {
        line: tok.line,
        column: tok.column,
        kind: ParserErrorKind::UnexpectedEOF,
    }
}

/// Integers that do not fit a fixnum are read as flonums
fn parse_numeric(rep: &str) -> Option<Datum> {
    if INT_PATTERN.is_match(rep) {
        match rep.parse::<i64>() {
            Ok(n) => Some(Datum::Int(n)),
            Err(_) => rep.parse::<f64>().ok().map(Datum::Float),
        }
    } else if DEC_PATTERN.is_match(rep) {
        rep.parse::<f64>().ok().map(Datum::Float)
    } else {
        None
    }
}

/// Parser parses character stream into a Datum
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    token_buf: Option<TokenWrapper>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            lexer: Lexer::new(source),
            token_buf: None,
        }
    }

    /// Whether only whitespace and comments remain
    pub fn is_eof(&mut self) -> Result<bool, ParserError> {
        let tok = self.peek()?;
        Ok(tok.token == Token::EOF)
    }

    /// Parses one datum; running out of input is `UnexpectedEOF`
    pub fn parse_datum(&mut self) -> Result<Datum, ParserError> {
        let tok = self.lex()?;

        match tok.token {
            Token::OpenParen => self.parse_list(),
            Token::Quote => self.parse_datum().map(quote),
            Token::Identifier(ref name) => Ok(Datum::sym(name)),
            Token::True => Ok(Datum::Bool(true)),
            Token::False => Ok(Datum::Bool(false)),
            Token::String(ref s) => Ok(Datum::string(s)),
            Token::Numeric(ref rep) => parse_numeric(rep).ok_or_else(|| invalid_token(&tok)),
            Token::EOF => Err(eof_error(&tok)),
            Token::CloseParen | Token::Dot => Err(unexpected_token(&tok, "datum".to_string())),
        }
    }

    /// Parses every datum up to the end of input
    pub fn parse_all(&mut self) -> Result<Vec<Datum>, ParserError> {
        let mut res = Vec::new();
        while !self.is_eof()? {
            res.push(self.parse_datum()?);
        }
        Ok(res)
    }

    fn peek(&mut self) -> Result<&TokenWrapper, ParserError> {
        let tok = self.lex()?;
        Ok(&*self.token_buf.insert(tok))
    }

    fn lex(&mut self) -> Result<TokenWrapper, ParserError> {
        match self.token_buf.take() {
            Some(tok) => Ok(tok),
            None => self.lexer.lex_token(),
        }
    }

    fn consume_if(&mut self, tok: &Token) -> Result<bool, ParserError> {
        if self.peek()?.token == *tok {
            self.token_buf = None;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, tok: &Token) -> Result<(), ParserError> {
        let t = self.lex()?;
        if t.token == *tok {
            Ok(())
        } else if t.token == Token::EOF {
            Err(eof_error(&t))
        } else {
            Err(unexpected_token(&t, format!("{:?}", tok)))
        }
    }

    fn parse_list(&mut self) -> Result<Datum, ParserError> {
        let mut items = Vec::new();
        let mut tail = Datum::Nil;
        loop {
            if self.consume_if(&Token::CloseParen)? {
                break;
            }
            if !items.is_empty() && self.consume_if(&Token::Dot)? {
                tail = self.parse_datum()?;
                self.expect(&Token::CloseParen)?;
                break;
            }
            items.push(self.parse_datum()?);
        }

        for d in items.into_iter().rev() {
            tail = cons(d, tail);
        }
        Ok(tail)
    }
}

/// Reads exactly one datum from `source`
pub fn read_line(source: &str) -> Result<Datum, ParserError> {
    let mut parser = Parser::new(source);
    let datum = parser.parse_datum()?;
    let rest = parser.lex()?;
    if rest.token == Token::EOF {
        Ok(datum)
    } else {
        Err(unexpected_token(&rest, "end of input".to_string()))
    }
}
