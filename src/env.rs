use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::datum::Datum;
use crate::error::{EvalError, EvalErrorKind};

/// One level of the environment chain
pub struct Frame {
    bindings: HashMap<Rc<str>, Datum>,
    parent: Option<Env>,
}

/// Shared handle on a frame. Child frames and closures keep their parent
/// alive through it.
#[derive(Clone)]
pub struct Env(Rc<RefCell<Frame>>);

impl Env {
    /// An empty frame with no parent
    pub fn new_root() -> Env {
        Env::with_parent(None)
    }

    fn with_parent(parent: Option<Env>) -> Env {
        Env(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent,
        })))
    }

    pub fn parent(&self) -> Option<Env> {
        self.0.borrow().parent.clone()
    }

    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Return the value bound to `symbol`, searching the parent chain
    pub fn lookup(&self, symbol: &str) -> Result<Datum, EvalError> {
        let mut env = self.clone();
        loop {
            let parent = {
                let frame = env.0.borrow();
                if let Some(val) = frame.bindings.get(symbol) {
                    return Ok(val.clone());
                }
                frame.parent.clone()
            };
            match parent {
                Some(p) => env = p,
                None => {
                    return Err(EvalError::new(
                        EvalErrorKind::UnboundVariable,
                        format!("unknown identifier: {}", symbol),
                    ))
                }
            }
        }
    }

    /// Binds `symbol` in this frame only
    pub fn define(&self, symbol: Rc<str>, val: Datum) {
        self.0.borrow_mut().bindings.insert(symbol, val);
    }

    /// Whether `symbol` is bound in this frame, ignoring parents
    #[cfg(test)]
    pub(crate) fn has_local(&self, symbol: &str) -> bool {
        self.0.borrow().bindings.contains_key(symbol)
    }

    /// The root of the parent chain
    pub fn global_frame(&self) -> Env {
        let mut env = self.clone();
        while let Some(p) = env.parent() {
            env = p;
        }
        env
    }

    /// Returns a new frame whose parent is `self`, binding each symbol of
    /// `formals` to the value at the same position in `vals`
    pub fn make_call_frame(&self, formals: &Datum, vals: &Datum) -> Result<Env, EvalError> {
        let names = formals.to_vec()?;
        let values = vals.to_vec()?;
        if names.len() != values.len() {
            return Err(EvalError::new(
                EvalErrorKind::NumArgs,
                "formals and vals must be the same length",
            ));
        }

        let frame = Env::with_parent(Some(self.clone()));
        for (name, val) in names.into_iter().zip(values) {
            match name {
                Datum::Sym(s) => frame.define(s, val),
                other => {
                    return Err(EvalError::new(
                        EvalErrorKind::BadFormals,
                        format!("Not a symbol: {}", other),
                    ))
                }
            }
        }
        Ok(frame)
    }
}

// Unlink long parent chains iteratively; chains built by dynamic-scope
// tail calls can be deeper than the host stack.
impl Drop for Frame {
    fn drop(&mut self) {
        let mut parent = self.parent.take();
        while let Some(env) = parent {
            match Rc::try_unwrap(env.0) {
                Ok(cell) => {
                    let mut frame = cell.into_inner();
                    parent = frame.parent.take();
                }
                Err(_) => break,
            }
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let frame = self.0.borrow();
        match frame.parent {
            None => write!(f, "<Global Frame>"),
            Some(ref parent) => {
                let mut bindings: Vec<String> = frame
                    .bindings
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                bindings.sort();
                write!(f, "<{{{}}} -> {}>", bindings.join(", "), parent)
            }
        }
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
