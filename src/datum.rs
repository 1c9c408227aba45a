use std::fmt;
use std::iter::FromIterator;
use std::mem;
use std::rc::Rc;

use crate::env::Env;
use crate::error::{EvalError, EvalErrorKind};
use crate::procedure::Procedure;

/// Datum is the primary data type of Scheme
///
/// Source expressions and runtime values share this representation. `Proc`
/// and `Env` hold runtime data not representable in datum syntax, so they can
/// still flow through argument lists.
#[derive(Clone)]
pub enum Datum {
    /// Boolean
    Bool(bool),
    /// Fixnum
    Int(i64),
    /// Flonum
    Float(f64),
    /// Symbol
    Sym(Rc<str>),
    /// String
    Str(Rc<str>),
    /// `()`
    Nil,
    /// Result of a form that has no useful value, e.g. `(if #f #f)`
    Okay,
    /// An absent expression. Evaluating it is an error.
    Undefined,
    /// Pair
    Pair(Rc<Cons>),
    /// Procedure value
    Proc(Procedure),
    /// Environment handed to primitives which ask for it
    Env(Env),
}

/// Type representation of Datum
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DatumType {
    Sym,
    Bool,
    Num,
    String,
    Pair,
    Null,
    Callable,
    Environment,
    Okay,
    Undefined,
}

impl DatumType {
    /// Get the type of datum
    pub fn get_type(datum: &Datum) -> DatumType {
        match datum {
            Datum::Bool(_) => DatumType::Bool,
            Datum::Int(_) | Datum::Float(_) => DatumType::Num,
            Datum::Sym(_) => DatumType::Sym,
            Datum::Str(_) => DatumType::String,
            Datum::Nil => DatumType::Null,
            Datum::Okay => DatumType::Okay,
            Datum::Undefined => DatumType::Undefined,
            Datum::Pair(_) => DatumType::Pair,
            Datum::Proc(_) => DatumType::Callable,
            Datum::Env(_) => DatumType::Environment,
        }
    }
}

impl PartialEq for Datum {
    fn eq(&self, rhs: &Datum) -> bool {
        let (mut l, mut r) = (self, rhs);
        loop {
            match (l, r) {
                (Datum::Pair(lp), Datum::Pair(rp)) => {
                    if Rc::ptr_eq(lp, rp) {
                        return true;
                    }
                    if lp.0 != rp.0 {
                        return false;
                    }
                    l = &lp.1;
                    r = &rp.1;
                }
                (Datum::Bool(l), Datum::Bool(r)) => return l == r,
                (Datum::Int(l), Datum::Int(r)) => return l == r,
                (Datum::Float(l), Datum::Float(r)) => return l == r,
                (Datum::Sym(l), Datum::Sym(r)) => return l == r,
                (Datum::Str(l), Datum::Str(r)) => return l == r,
                (Datum::Nil, Datum::Nil) => return true,
                (Datum::Okay, Datum::Okay) => return true,
                (Datum::Undefined, Datum::Undefined) => return true,
                (Datum::Proc(l), Datum::Proc(r)) => return l == r,
                (Datum::Env(l), Datum::Env(r)) => return l.ptr_eq(r),
                _ => return false,
            }
        }
    }
}

/// The car and cdr of a pair
pub struct Cons(pub Datum, pub Datum);

// Unlink the cdr chain iteratively; a long list would otherwise recurse once
// per element when freed.
impl Drop for Cons {
    fn drop(&mut self) {
        let mut tail = mem::replace(&mut self.1, Datum::Nil);
        while let Datum::Pair(pair) = tail {
            match Rc::try_unwrap(pair) {
                Ok(mut cell) => tail = mem::replace(&mut cell.1, Datum::Nil),
                Err(_) => break,
            }
        }
    }
}

impl Datum {
    /// Symbol datum
    pub fn sym(name: &str) -> Datum {
        Datum::Sym(Rc::from(name))
    }

    /// String datum
    pub fn string(s: &str) -> Datum {
        Datum::Str(Rc::from(s))
    }

    pub fn as_sym(&self) -> Option<&Rc<str>> {
        match self {
            Datum::Sym(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<&Cons> {
        match self {
            Datum::Pair(pair) => Some(pair),
            _ => None,
        }
    }

    /// Only `#f` counts as false
    pub fn is_false(&self) -> bool {
        matches!(self, Datum::Bool(false))
    }

    pub fn is_true(&self) -> bool {
        !self.is_false()
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Datum::Pair(_))
    }

    /// Whether the datum is a finite chain of pairs ending in `()`
    pub fn is_list(&self) -> bool {
        let mut ptr = self;
        loop {
            match ptr {
                Datum::Nil => return true,
                Datum::Pair(pair) => ptr = &pair.1,
                _ => return false,
            }
        }
    }

    /// Iterate the values if it's a proper list
    pub fn iter(&self) -> DatumIter {
        DatumIter { ptr: self.clone() }
    }

    /// Collects a proper list into a vector
    pub fn to_vec(&self) -> Result<Vec<Datum>, EvalError> {
        self.iter().collect::<Result<Vec<_>, _>>().map_err(|_| {
            EvalError::new(
                EvalErrorKind::MalformedList,
                format!("malformed list: {}", self),
            )
        })
    }

    /// Number of elements in a proper list
    pub fn len(&self) -> Result<usize, EvalError> {
        self.to_vec().map(|v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Datum::Nil)
    }
}

/// If the datum is a proper list, iterate the values in the list.
/// Yields `Err` with the offending tail when it meets a non-null cdr
pub struct DatumIter {
    ptr: Datum,
}

impl Iterator for DatumIter {
    type Item = Result<Datum, Datum>;

    fn next(&mut self) -> Option<Result<Datum, Datum>> {
        let (val, next) = match &self.ptr {
            Datum::Nil => return None,
            Datum::Pair(pair) => (pair.0.clone(), pair.1.clone()),
            other => {
                let tail = other.clone();
                self.ptr = Datum::Nil;
                return Some(Err(tail));
            }
        };

        self.ptr = next;

        Some(Ok(val))
    }
}

impl FromIterator<Datum> for Datum {
    fn from_iter<I: IntoIterator<Item = Datum>>(iterator: I) -> Datum {
        let list: Vec<Datum> = iterator.into_iter().collect();
        let mut res = Datum::Nil;
        for d in list.into_iter().rev() {
            res = cons(d, res);
        }
        res
    }
}

/// `cons` the values into a pair
pub fn cons(head: Datum, tail: Datum) -> Datum {
    Datum::Pair(Rc::new(Cons(head, tail)))
}

/// Returns the expression `(quote value)`
pub fn quote(value: Datum) -> Datum {
    cons(Datum::sym("quote"), cons(value, Datum::Nil))
}

fn write_cons(mut tail: &Datum, f: &mut fmt::Formatter) -> fmt::Result {
    while let Datum::Pair(pair) = tail {
        write!(f, " {}", pair.0)?;
        tail = &pair.1;
    }
    match tail {
        Datum::Nil => write!(f, ")"),
        _ => write!(f, " . {})", tail),
    }
}

fn write_string(s: &str, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            _ => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Datum::Bool(true) => write!(f, "#t"),
            Datum::Bool(false) => write!(f, "#f"),
            Datum::Int(n) => write!(f, "{}", n),
            Datum::Float(n) => write!(f, "{:?}", n),
            Datum::Sym(s) => write!(f, "{}", s),
            Datum::Str(s) => write_string(s, f),
            Datum::Nil => write!(f, "()"),
            Datum::Okay => write!(f, "okay"),
            Datum::Undefined => write!(f, "#<undefined>"),
            Datum::Pair(pair) => {
                if let (Datum::Sym(s), Datum::Pair(tail)) = (&pair.0, &pair.1) {
                    if &**s == "quote" && tail.1.is_empty() {
                        return write!(f, "'{}", tail.0);
                    }
                }
                write!(f, "({}", pair.0)?;
                write_cons(&pair.1, f)
            }
            Datum::Proc(p) => write!(f, "{}", p),
            Datum::Env(e) => write!(f, "{}", e),
        }
    }
}

impl fmt::Debug for Datum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
