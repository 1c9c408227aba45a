use std::fmt;
use std::str::Chars;

use crate::error::{ParserError, ParserErrorKind};

include!(concat!(env!("OUT_DIR"), "/hash_literals.rs"));

/// Token types
#[derive(PartialEq, Clone)]
pub enum Token {
    /// `(`
    OpenParen,
    /// `)`
    CloseParen,
    /// `.`
    Dot,
    /// `'`
    Quote,
    Identifier(String),
    /// `#t`
    True,
    /// `#f`
    False,
    String(String),
    Numeric(String),
    /// End of character stream
    EOF,
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::OpenParen => write!(f, "OpenParen"),
            Token::CloseParen => write!(f, "CloseParen"),
            Token::Dot => write!(f, "Dot"),
            Token::Quote => write!(f, "Quote"),
            Token::Identifier(name) => write!(f, "Identifier({})", name),
            Token::True => write!(f, "#t"),
            Token::False => write!(f, "#f"),
            Token::Numeric(rep) => write!(f, "{}", rep),
            Token::String(rep) => write!(f, "{:?}", rep),
            Token::EOF => write!(f, "EOF"),
        }
    }
}

/// TokenWrapper provides positional information to each token
#[derive(Debug)]
pub struct TokenWrapper {
    pub line: usize,
    pub column: usize,
    pub token: Token,
}

fn wrap(line: usize, column: usize, t: Token) -> TokenWrapper {
    TokenWrapper {
        line,
        column,
        token: t,
    }
}

fn is_whitespace(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\x0b' | '\x0c' | '\r' | ' ')
}

fn is_initial(c: char) -> bool {
    matches!(c,
        'a'..='z' | 'A'..='Z' | '!' | '$' | '%' | '&' | '*' | '/' | ':' | '<' | '=' | '>' | '?' | '^' | '_' | '~')
}

fn is_subsequent(c: char) -> bool {
    is_initial(c) || matches!(c, '0'..='9' | '+' | '-' | '.' | '@')
}

fn is_delim(c: char) -> bool {
    match c {
        '(' | ')' | '"' | ';' | '\'' => true,
        _ => c.is_whitespace(),
    }
}

/// Lexer transforms character stream into a token stream
pub struct Lexer<'a> {
    line: usize,
    column: usize,
    stream: Chars<'a>,
    lookahead_buf: Option<char>,
}

macro_rules! try_consume {
    ($this:ident) => {
        match $this.consume() {
            Some(c) => c,
            None => return Err($this.make_error(ParserErrorKind::UnexpectedEOF)),
        }
    };
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            line: 1,
            column: 1,
            stream: source.chars(),
            lookahead_buf: None,
        }
    }

    /// return next token
    pub fn lex_token(&mut self) -> Result<TokenWrapper, ParserError> {
        self.consume_whitespace();

        let line = self.line;
        let col = self.column;
        let c = match self.consume() {
            Some(c) => c,
            None => return Ok(wrap(line, col, Token::EOF)),
        };

        let end_of_token = self.is_end_of_token();

        if is_initial(c) {
            Ok(wrap(line, col, Token::Identifier(self.lex_ident(c))))
        } else if c == '+' || c == '-' {
            if end_of_token || self.lookahead() == Some('>') {
                Ok(wrap(line, col, Token::Identifier(self.lex_ident(c))))
            } else {
                Ok(wrap(line, col, Token::Numeric(self.lex_numeric(c))))
            }
        } else if c == '.' {
            match self.lookahead() {
                _ if end_of_token => Ok(wrap(line, col, Token::Dot)),
                Some('.') => Ok(wrap(line, col, Token::Identifier(self.lex_ident(c)))),
                _ => Ok(wrap(line, col, Token::Numeric(self.lex_numeric(c)))),
            }
        } else if c == '(' {
            Ok(wrap(line, col, Token::OpenParen))
        } else if c == ')' {
            Ok(wrap(line, col, Token::CloseParen))
        } else if c == '\'' {
            Ok(wrap(line, col, Token::Quote))
        } else if c == '#' {
            let name = self.read_while(|c| !is_delim(c));
            match HASH_LITERALS.get(name.as_str()) {
                Some(true) => Ok(wrap(line, col, Token::True)),
                Some(false) => Ok(wrap(line, col, Token::False)),
                None => Err(ParserError {
                    line,
                    column: col,
                    kind: ParserErrorKind::InvalidToken(format!("#{}", name)),
                }),
            }
        } else if c == '"' {
            self.lex_string().map(|s| wrap(line, col, Token::String(s)))
        } else if c.is_ascii_digit() {
            Ok(wrap(line, col, Token::Numeric(self.lex_numeric(c))))
        } else {
            Err(ParserError {
                line,
                column: col,
                kind: ParserErrorKind::InvalidCharacter(c),
            })
        }
    }

    fn is_end_of_token(&mut self) -> bool {
        match self.lookahead() {
            Some(c) => is_whitespace(c) || is_delim(c),
            None => true,
        }
    }

    fn lex_ident(&mut self, initial: char) -> String {
        let mut s = initial.to_string();
        s.push_str(&self.read_while(is_subsequent));
        s
    }

    fn lex_string(&mut self) -> Result<String, ParserError> {
        let mut s = String::new();
        loop {
            match try_consume!(self) {
                '"' => return Ok(s),
                '\\' => match try_consume!(self) {
                    't' => s.push('\t'),
                    'n' => s.push('\n'),
                    'r' => s.push('\r'),
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    c => return Err(self.make_error(ParserErrorKind::InvalidToken(format!("\\{}", c)))),
                },
                c => s.push(c),
            }
        }
    }

    fn lex_numeric(&mut self, init: char) -> String {
        let mut s = init.to_string();
        s.push_str(&self.read_while(|c| !is_delim(c)));
        s
    }

    fn make_error(&self, kind: ParserErrorKind) -> ParserError {
        ParserError {
            line: self.line,
            column: self.column,
            kind,
        }
    }

    fn lookahead(&mut self) -> Option<char> {
        if self.lookahead_buf.is_none() {
            self.lookahead_buf = self.stream.next();
        }
        self.lookahead_buf
    }

    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn read_while<F>(&mut self, f: F) -> String
    where
        F: Fn(char) -> bool,
    {
        let mut s = String::new();
        while let Some(c) = self.lookahead() {
            if !f(c) {
                break;
            }
            self.consume();
            s.push(c);
        }
        s
    }

    fn consume(&mut self) -> Option<char> {
        let c = match self.lookahead_buf.take() {
            Some(c) => Some(c),
            None => self.stream.next(),
        };

        if let Some(ch) = c {
            self.advance(ch);
        }

        c
    }

    fn consume_whitespace(&mut self) {
        loop {
            self.read_while(is_whitespace);
            match self.lookahead() {
                Some(';') => {
                    self.read_while(|c| c != '\n');
                }
                _ => return,
            }
        }
    }
}
