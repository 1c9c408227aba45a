//! Structural checks on special forms and parameter lists

use std::collections::HashSet;
use std::rc::Rc;

use crate::datum::Datum;
use crate::error::{EvalError, EvalErrorKind};

/// Check that `expr` is a proper list whose length is at least `min` and no
/// more than `max`, returning its elements
pub fn check_form(expr: &Datum, min: usize, max: Option<usize>) -> Result<Vec<Datum>, EvalError> {
    let vals = expr.to_vec().map_err(|_| {
        EvalError::new(
            EvalErrorKind::BadSyntax,
            format!("badly formed expression: {}", expr),
        )
    })?;

    if vals.len() < min {
        Err(EvalError::new(EvalErrorKind::BadSyntax, "too few operands in form"))
    } else if max.map_or(false, |max| vals.len() > max) {
        Err(EvalError::new(EvalErrorKind::BadSyntax, "too many operands in form"))
    } else {
        Ok(vals)
    }
}

/// Check that `formals` is a list of distinct symbols
pub fn check_formals(formals: &Datum) -> Result<Vec<Rc<str>>, EvalError> {
    let items = formals.to_vec().map_err(|_| {
        EvalError::new(
            EvalErrorKind::BadFormals,
            format!("badly formed parameter list: {}", formals),
        )
    })?;

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(items.len());
    for item in items {
        let name = match item {
            Datum::Sym(s) => s,
            other => {
                return Err(EvalError::new(
                    EvalErrorKind::BadFormals,
                    format!("Not a symbol: {}", other),
                ))
            }
        };
        if !seen.insert(name.clone()) {
            return Err(EvalError::new(
                EvalErrorKind::BadFormals,
                format!("Symbol in formals more than once: {}", name),
            ));
        }
        names.push(name);
    }
    Ok(names)
}
