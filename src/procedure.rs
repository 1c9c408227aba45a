use std::fmt;
use std::rc::Rc;

use crate::datum::Datum;
use crate::env::Env;
use crate::error::EvalError;

/// Host function backing a primitive procedure
pub type PrimFn = fn(&[Datum]) -> Result<Datum, EvalError>;

/// Number of arguments a primitive accepts, not counting the environment
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exact(n: usize) -> Arity {
        Arity { min: n, max: Some(n) }
    }

    pub const fn at_least(n: usize) -> Arity {
        Arity { min: n, max: None }
    }

    pub const fn range(min: usize, max: usize) -> Arity {
        Arity { min, max: Some(max) }
    }

    pub fn accepts(&self, n: usize) -> bool {
        n >= self.min && self.max.map_or(true, |max| n <= max)
    }
}

pub struct PrimitiveProcedure {
    pub name: &'static str,
    pub func: PrimFn,
    /// Append the calling environment to the arguments
    pub use_env: bool,
    pub arity: Arity,
}

/// A procedure defined by a lambda expression or the complex define form.
/// Its body is evaluated in a child of the frame it was created in.
pub struct LambdaProcedure {
    pub formals: Datum,
    pub body: Datum,
    pub env: Env,
}

/// A procedure defined by a mu expression. Its body is evaluated in a child
/// of the caller's frame.
pub struct MuProcedure {
    pub formals: Datum,
    pub body: Datum,
}

#[derive(Clone)]
pub enum Procedure {
    Primitive(Rc<PrimitiveProcedure>),
    Lambda(Rc<LambdaProcedure>),
    Mu(Rc<MuProcedure>),
}

impl Procedure {
    pub fn primitive(name: &'static str, func: PrimFn, use_env: bool, arity: Arity) -> Procedure {
        Procedure::Primitive(Rc::new(PrimitiveProcedure {
            name,
            func,
            use_env,
            arity,
        }))
    }

    pub fn lambda(formals: Datum, body: Datum, env: Env) -> Procedure {
        Procedure::Lambda(Rc::new(LambdaProcedure { formals, body, env }))
    }

    pub fn mu(formals: Datum, body: Datum) -> Procedure {
        Procedure::Mu(Rc::new(MuProcedure { formals, body }))
    }
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Procedure) -> bool {
        match (self, other) {
            (Procedure::Primitive(l), Procedure::Primitive(r)) => Rc::ptr_eq(l, r),
            (Procedure::Lambda(l), Procedure::Lambda(r)) => Rc::ptr_eq(l, r),
            (Procedure::Mu(l), Procedure::Mu(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for PrimitiveProcedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#[{}]", self.name)
    }
}

impl fmt::Display for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Procedure::Primitive(p) => write!(f, "{}", p),
            Procedure::Lambda(l) => write!(f, "(lambda {} {})", l.formals, l.body),
            Procedure::Mu(m) => write!(f, "(mu {} {})", m.formals, m.body),
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
