use std::io;

use thiserror::Error;

#[derive(Debug, PartialEq, Clone)]
pub enum ParserErrorKind {
    UnexpectedEOF,
    UnexpectedToken(String, String),
    InvalidCharacter(char),
    InvalidToken(String),
}

#[derive(Debug, PartialEq, Clone, Error)]
#[error("{line}:{column}: {}", describe(&self.kind))]
pub struct ParserError {
    pub line: usize,
    pub column: usize,
    pub kind: ParserErrorKind,
}

fn describe(kind: &ParserErrorKind) -> String {
    match kind {
        ParserErrorKind::UnexpectedEOF => "unexpected end of input".to_string(),
        ParserErrorKind::UnexpectedToken(found, expected) => {
            format!("unexpected token {}, expected {}", found, expected)
        }
        ParserErrorKind::InvalidCharacter(c) => format!("invalid character {:?}", c),
        ParserErrorKind::InvalidToken(tok) => format!("invalid token {}", tok),
    }
}

/// Coarse classification of an evaluation failure. The message in
/// `EvalError::desc` is what gets reported to the user.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum EvalErrorKind {
    UnboundVariable,
    MalformedList,
    NotCallable,
    NumArgs,
    BadSyntax,
    BadFormals,
    InvalidType,
    DivideByZero,
    Overflow,
    RecursionDepth,
    UserError,
    Syntax,
    Io,
}

/// The single error type raised while evaluating
#[derive(Debug, PartialEq, Clone, Error)]
#[error("{desc}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub desc: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, desc: impl Into<String>) -> EvalError {
        EvalError {
            kind,
            desc: desc.into(),
        }
    }
}

impl From<ParserError> for EvalError {
    fn from(err: ParserError) -> EvalError {
        EvalError::new(EvalErrorKind::Syntax, err.to_string())
    }
}

impl From<io::Error> for EvalError {
    fn from(err: io::Error) -> EvalError {
        EvalError::new(EvalErrorKind::Io, err.to_string())
    }
}
