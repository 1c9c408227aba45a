//! Special forms
//!
//! Each handler receives its unevaluated operand list and the current
//! environment. Handlers either finish with a value or hand back the
//! expression in tail position together with the frame it must be evaluated
//! in; the evaluator decides whether to recurse or loop on it.

use crate::check::{check_form, check_formals};
use crate::datum::{cons, Datum};
use crate::env::Env;
use crate::error::{EvalError, EvalErrorKind};
use crate::eval::evaluate;
use crate::procedure::Procedure;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpecialForm {
    And,
    Or,
    If,
    Cond,
    Begin,
    Lambda,
    Mu,
    Define,
    Quote,
    Let,
}

include!(concat!(env!("OUT_DIR"), "/special_forms.rs"));

impl SpecialForm {
    /// The special form named by `keyword`, if any
    pub fn lookup(keyword: &str) -> Option<SpecialForm> {
        SPECIAL_FORMS.get(keyword).copied()
    }
}

/// What a special form leaves for the evaluator
pub enum Outcome {
    Value(Datum),
    Tail(Datum, Env),
}

pub fn dispatch(form: SpecialForm, operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    trace!("special form {:?}: {}", form, operands);
    match form {
        SpecialForm::And => do_and_form(operands, env),
        SpecialForm::Or => do_or_form(operands, env),
        SpecialForm::If => do_if_form(operands, env),
        SpecialForm::Cond => do_cond_form(operands, env),
        SpecialForm::Begin => do_begin_form(operands, env),
        SpecialForm::Lambda => do_lambda_form(operands, env).map(Outcome::Value),
        SpecialForm::Mu => do_mu_form(operands).map(Outcome::Value),
        SpecialForm::Define => do_define_form(operands, env).map(Outcome::Value),
        SpecialForm::Quote => do_quote_form(operands).map(Outcome::Value),
        SpecialForm::Let => do_let_form(operands, env),
    }
}

fn bad_syntax(desc: String) -> EvalError {
    EvalError::new(EvalErrorKind::BadSyntax, desc)
}

/// Returns the formals and the body of a `lambda` or `mu` form. A body of
/// several expressions is wrapped in `begin`.
fn procedure_parts(operands: &Datum) -> Result<(Datum, Datum), EvalError> {
    let vals = check_form(operands, 2, None)?;
    let formals = vals[0].clone();
    check_formals(&formals)?;

    let body = if vals.len() == 2 {
        vals[1].clone()
    } else {
        match operands.as_pair() {
            Some(pair) => cons(Datum::sym("begin"), pair.1.clone()),
            None => return Err(bad_syntax(format!("badly formed expression: {}", operands))),
        }
    };
    Ok((formals, body))
}

fn do_lambda_form(operands: &Datum, env: &Env) -> Result<Datum, EvalError> {
    let (formals, body) = procedure_parts(operands)?;
    Ok(Datum::Proc(Procedure::lambda(formals, body, env.clone())))
}

fn do_mu_form(operands: &Datum) -> Result<Datum, EvalError> {
    let (formals, body) = procedure_parts(operands)?;
    Ok(Datum::Proc(Procedure::mu(formals, body)))
}

fn do_define_form(operands: &Datum, env: &Env) -> Result<Datum, EvalError> {
    let vals = check_form(operands, 2, None)?;
    match &vals[0] {
        Datum::Sym(name) => {
            check_form(operands, 2, Some(2))?;
            let value = evaluate(&vals[1], env)?;
            env.define(name.clone(), value);
            Ok(vals[0].clone())
        }
        Datum::Pair(target) => {
            let name = match &target.0 {
                Datum::Sym(name) => name.clone(),
                other => return Err(bad_syntax(format!("Function name not a symbol: {}", other))),
            };
            // (define (name . formals) body ...) => (lambda formals body ...)
            let body = match operands.as_pair() {
                Some(pair) => pair.1.clone(),
                None => Datum::Nil,
            };
            let lambda = do_lambda_form(&cons(target.1.clone(), body), env)?;
            env.define(name, lambda);
            Ok(target.0.clone())
        }
        _ => Err(bad_syntax("bad argument to define".to_string())),
    }
}

fn do_quote_form(operands: &Datum) -> Result<Datum, EvalError> {
    let vals = check_form(operands, 1, Some(1))?;
    Ok(vals[0].clone())
}

fn do_let_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let vals = check_form(operands, 2, None)?;
    let bindings = vals[0]
        .to_vec()
        .map_err(|_| bad_syntax("bad bindings list in let form".to_string()))?;

    let mut names = Vec::with_capacity(bindings.len());
    let mut exprs = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let pair = match binding.to_vec() {
            Ok(pair) if pair.len() == 2 => pair,
            _ => {
                return Err(bad_syntax(format!(
                    "List {} does not have two elements",
                    binding
                )))
            }
        };
        if pair[0].as_sym().is_none() {
            return Err(bad_syntax(format!("{} is not a symbol", pair[0])));
        }
        names.push(pair[0].clone());
        exprs.push(pair[1].clone());
    }
    let names: Datum = names.into_iter().collect();
    check_formals(&names)?;

    // binding values see the outer frame only
    let values = exprs
        .iter()
        .map(|expr| evaluate(expr, env))
        .collect::<Result<Datum, EvalError>>()?;
    let frame = env.make_call_frame(&names, &values)?;

    let (last, init) = match vals[1..].split_last() {
        Some(split) => split,
        None => return Err(bad_syntax("too few operands in form".to_string())),
    };
    for expr in init {
        evaluate(expr, &frame)?;
    }
    Ok(Outcome::Tail(last.clone(), frame))
}

fn do_if_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let vals = check_form(operands, 2, Some(3))?;
    if evaluate(&vals[0], env)?.is_false() {
        match vals.get(2) {
            Some(alternative) => Ok(Outcome::Tail(alternative.clone(), env.clone())),
            None => Ok(Outcome::Value(Datum::Okay)),
        }
    } else {
        Ok(Outcome::Tail(vals[1].clone(), env.clone()))
    }
}

fn do_and_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let vals = check_form(operands, 0, None)?;
    let (last, init) = match vals.split_last() {
        Some(split) => split,
        None => return Ok(Outcome::Value(Datum::Bool(true))),
    };
    for expr in init {
        if evaluate(expr, env)?.is_false() {
            return Ok(Outcome::Value(Datum::Bool(false)));
        }
    }
    Ok(Outcome::Tail(last.clone(), env.clone()))
}

fn do_or_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let vals = check_form(operands, 0, None)?;
    let (last, init) = match vals.split_last() {
        Some(split) => split,
        None => return Ok(Outcome::Value(Datum::Bool(false))),
    };
    for expr in init {
        let outcome = evaluate(expr, env)?;
        if outcome.is_true() {
            // already evaluated; must not go through the evaluator again
            return Ok(Outcome::Value(outcome));
        }
    }
    Ok(Outcome::Tail(last.clone(), env.clone()))
}

fn do_cond_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let clauses = check_form(operands, 0, None)?;
    let num_clauses = clauses.len();
    for (i, clause) in clauses.iter().enumerate() {
        check_form(clause, 1, None)?;
        let (test_expr, body) = match clause.as_pair() {
            Some(pair) => (&pair.0, &pair.1),
            None => return Err(bad_syntax(format!("badly formed expression: {}", clause))),
        };

        let test = if test_expr.as_sym().map_or(false, |s| &**s == "else") {
            if i < num_clauses - 1 {
                return Err(bad_syntax("else must be last".to_string()));
            }
            if body.is_empty() {
                return Err(bad_syntax("badly formed else clause".to_string()));
            }
            Datum::Bool(true)
        } else {
            evaluate(test_expr, env)?
        };

        if test.is_true() {
            if body.is_empty() {
                return Ok(Outcome::Value(test));
            }
            return do_begin_form(body, env);
        }
    }
    Ok(Outcome::Value(Datum::Okay))
}

fn do_begin_form(operands: &Datum, env: &Env) -> Result<Outcome, EvalError> {
    let vals = check_form(operands, 1, None)?;
    let (last, init) = match vals.split_last() {
        Some(split) => split,
        None => return Err(bad_syntax("too few operands in form".to_string())),
    };
    for expr in init {
        evaluate(expr, env)?;
    }
    Ok(Outcome::Tail(last.clone(), env.clone()))
}
