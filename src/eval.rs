//! The evaluate/apply recurrence
//!
//! Two evaluators share the same rules. `eval_recursive` calls itself for
//! every sub-expression, including expressions in tail position.
//! `eval_tail_safe` loops on the (expression, environment) pair whenever a
//! special form or a closure call leaves an expression in tail position, so
//! tail-recursive Scheme loops run in bounded host stack.
//!
//! Every non-tail evaluation counts against `Config::max_depth`; running past
//! it is reported as an ordinary `EvalError`. The host stack is extended on
//! demand, so the limit is reached before the stack of the calling thread runs
//! out.

use std::cell::Cell;

use crate::config::Config;
use crate::datum::Datum;
use crate::env::Env;
use crate::error::{EvalError, EvalErrorKind};
use crate::procedure::{PrimitiveProcedure, Procedure};
use crate::syntax::{dispatch, Outcome, SpecialForm};

thread_local! {
    static DEPTH: Cell<usize> = Cell::new(0);
}

/// Host stack that must remain before entering another evaluation
const RED_ZONE: usize = 128 * 1024;
/// Size of each stack segment allocated when the red zone is reached
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

struct DepthGuard;

impl DepthGuard {
    fn enter() -> Result<DepthGuard, EvalError> {
        let max_depth = Config::current().max_depth;
        DEPTH.with(|depth| {
            if depth.get() >= max_depth {
                warn!("evaluation depth limit {} reached", max_depth);
                Err(EvalError::new(
                    EvalErrorKind::RecursionDepth,
                    "maximum recursion depth exceeded",
                ))
            } else {
                depth.set(depth.get() + 1);
                Ok(DepthGuard)
            }
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get() - 1));
    }
}

/// One step of evaluation, before anything is applied
enum Step {
    Value(Datum),
    Form(SpecialForm, Datum),
    Combination(Datum, Datum),
}

fn analyze(expr: &Datum, env: &Env) -> Result<Step, EvalError> {
    match expr {
        Datum::Undefined => Err(EvalError::new(
            EvalErrorKind::BadSyntax,
            "Cannot evaluate an undefined expression.",
        )),
        Datum::Sym(s) => env.lookup(s).map(Step::Value),
        Datum::Pair(pair) => {
            if !expr.is_list() {
                return Err(EvalError::new(
                    EvalErrorKind::MalformedList,
                    format!("malformed list: {}", expr),
                ));
            }
            let (first, rest) = (&pair.0, &pair.1);
            if let Some(form) = first.as_sym().and_then(|s| SpecialForm::lookup(s)) {
                return Ok(Step::Form(form, rest.clone()));
            }
            Ok(Step::Combination(first.clone(), rest.clone()))
        }
        _ => Ok(Step::Value(expr.clone())),
    }
}

/// Evaluates each operand left to right into a new list
fn eval_operands(operands: &Datum, env: &Env) -> Result<Datum, EvalError> {
    operands
        .to_vec()?
        .iter()
        .map(|operand| evaluate(operand, env))
        .collect::<Result<Vec<_>, _>>()
        .map(|args| args.into_iter().collect())
}

/// Evaluate `expr` in `env` with the evaluator selected by the current
/// thread's `Config`
pub fn evaluate(expr: &Datum, env: &Env) -> Result<Datum, EvalError> {
    if Config::current().tail_calls {
        eval_tail_safe(expr, env)
    } else {
        eval_recursive(expr, env)
    }
}

/// Evaluate `expr`, recursing for tail positions too
pub fn eval_recursive(expr: &Datum, env: &Env) -> Result<Datum, EvalError> {
    let _guard = DepthGuard::enter()?;
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || recursive_step(expr, env))
}

fn recursive_step(expr: &Datum, env: &Env) -> Result<Datum, EvalError> {
    trace!("eval: {}", expr);

    match analyze(expr, env)? {
        Step::Value(v) => Ok(v),
        Step::Form(form, operands) => match dispatch(form, &operands, env)? {
            Outcome::Value(v) => Ok(v),
            Outcome::Tail(expr, frame) => eval_recursive(&expr, &frame),
        },
        Step::Combination(operator, operands) => {
            let procedure = eval_recursive(&operator, env)?;
            let args = eval_operands(&operands, env)?;
            apply(&procedure, &args, env)
        }
    }
}

/// Evaluate `expr`, looping on tail positions
pub fn eval_tail_safe(expr: &Datum, env: &Env) -> Result<Datum, EvalError> {
    let _guard = DepthGuard::enter()?;
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || tail_safe_loop(expr, env))
}

fn tail_safe_loop(expr: &Datum, env: &Env) -> Result<Datum, EvalError> {
    let mut expr = expr.clone();
    let mut env = env.clone();

    loop {
        trace!("eval: {}", expr);
        match analyze(&expr, &env)? {
            Step::Value(v) => return Ok(v),
            Step::Form(form, operands) => match dispatch(form, &operands, &env)? {
                Outcome::Value(v) => return Ok(v),
                Outcome::Tail(next, frame) => {
                    expr = next;
                    env = frame;
                }
            },
            Step::Combination(operator, operands) => {
                let procedure = evaluate(&operator, &env)?;
                let args = eval_operands(&operands, &env)?;
                match procedure {
                    Datum::Proc(Procedure::Lambda(ref lambda)) => {
                        debug!("tail call {} with {}", procedure, args);
                        env = lambda.env.make_call_frame(&lambda.formals, &args)?;
                        expr = lambda.body.clone();
                    }
                    Datum::Proc(Procedure::Mu(ref mu)) => {
                        debug!("tail call {} with {}", procedure, args);
                        env = env.make_call_frame(&mu.formals, &args)?;
                        expr = mu.body.clone();
                    }
                    _ => return apply(&procedure, &args, &env),
                }
            }
        }
    }
}

/// Apply `procedure` to the evaluated argument list `args`. `env` is the
/// caller's environment.
pub fn apply(procedure: &Datum, args: &Datum, env: &Env) -> Result<Datum, EvalError> {
    debug!("apply {} to {}", procedure, args);
    match procedure {
        Datum::Proc(Procedure::Primitive(prim)) => apply_primitive(prim, args, env),
        Datum::Proc(Procedure::Lambda(lambda)) => {
            let frame = lambda.env.make_call_frame(&lambda.formals, args)?;
            evaluate(&lambda.body, &frame)
        }
        Datum::Proc(Procedure::Mu(mu)) => {
            let frame = env.make_call_frame(&mu.formals, args)?;
            evaluate(&mu.body, &frame)
        }
        _ => Err(EvalError::new(
            EvalErrorKind::NotCallable,
            format!("Cannot call {}", procedure),
        )),
    }
}

/// Apply a primitive to a Scheme list of arguments
pub fn apply_primitive(
    procedure: &PrimitiveProcedure,
    args: &Datum,
    env: &Env,
) -> Result<Datum, EvalError> {
    let mut args = args.to_vec()?;
    if !procedure.arity.accepts(args.len()) {
        return Err(EvalError::new(
            EvalErrorKind::NotCallable,
            format!("Cannot call {} with {} arguments", procedure, args.len()),
        ));
    }
    if procedure.use_env {
        args.push(Datum::Env(env.clone()));
    }
    (procedure.func)(&args)
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::{apply, eval_recursive, eval_tail_safe, evaluate};
    use crate::config::Config;
    use crate::datum::{cons, Datum};
    use crate::env::Env;
    use crate::error::{EvalError, EvalErrorKind};
    use crate::procedure::{Arity, Procedure};

    fn add(args: &[Datum]) -> Result<Datum, EvalError> {
        let mut sum = 0;
        for arg in args {
            match arg {
                Datum::Int(n) => sum += n,
                _ => return Err(EvalError::new(EvalErrorKind::InvalidType, "not a number")),
            }
        }
        Ok(Datum::Int(sum))
    }

    fn env_is_last(args: &[Datum]) -> Result<Datum, EvalError> {
        Ok(Datum::Bool(matches!(args.last(), Some(Datum::Env(_)))))
    }

    fn test_env() -> Env {
        let env = Env::new_root();
        env.define(
            Rc::from("+"),
            Datum::Proc(Procedure::primitive("+", add, false, Arity::at_least(0))),
        );
        env
    }

    #[test]
    fn test_self_evaluating() {
        let env = Env::new_root();
        for atom in vec![num!(3), Datum::Float(1.5), Datum::string("s"), Datum::Bool(false), Datum::Okay] {
            assert_eq!(Ok(atom.clone()), eval_recursive(&atom, &env));
            assert_eq!(Ok(atom.clone()), eval_tail_safe(&atom, &env));
        }
    }

    #[test]
    fn test_undefined_expression() {
        let err = evaluate(&Datum::Undefined, &Env::new_root()).unwrap_err();
        assert_eq!("Cannot evaluate an undefined expression.", err.desc);
    }

    #[test]
    fn test_malformed_list() {
        let expr = cons(sym!("+"), num!(1));
        let err = evaluate(&expr, &test_env()).unwrap_err();
        assert_eq!(EvalErrorKind::MalformedList, err.kind);
    }

    #[test]
    fn test_combination() {
        let env = test_env();
        let expr = list!(sym!("+"), num!(1), list!(sym!("+"), num!(2), num!(3)));
        assert_eq!(Ok(num!(6)), eval_recursive(&expr, &env));
        assert_eq!(Ok(num!(6)), eval_tail_safe(&expr, &env));
    }

    #[test]
    fn test_apply_not_callable() {
        let err = apply(&num!(1), &list!(), &Env::new_root()).unwrap_err();
        assert_eq!(EvalErrorKind::NotCallable, err.kind);
        assert_eq!("Cannot call 1", err.desc);
    }

    #[test]
    fn test_apply_primitive_env_flag() {
        let env = Env::new_root();
        let with_env = Datum::Proc(Procedure::primitive("f", env_is_last, true, Arity::exact(1)));
        let without_env = Datum::Proc(Procedure::primitive("g", env_is_last, false, Arity::exact(1)));
        assert_eq!(Ok(Datum::Bool(true)), apply(&with_env, &list!(num!(1)), &env));
        assert_eq!(Ok(Datum::Bool(false)), apply(&without_env, &list!(num!(1)), &env));
    }

    #[test]
    fn test_apply_primitive_arity() {
        let env = Env::new_root();
        let f = Datum::Proc(Procedure::primitive("f", env_is_last, true, Arity::exact(1)));
        let err = apply(&f, &list!(), &env).unwrap_err();
        assert_eq!(EvalErrorKind::NotCallable, err.kind);
        assert_eq!("Cannot call #[f] with 0 arguments", err.desc);
    }

    #[test]
    fn test_mu_uses_caller_env() {
        let env = test_env();
        let mu = Datum::Proc(Procedure::mu(list!(), sym!("y")));
        let caller = env.make_call_frame(&list!(sym!("y")), &list!(num!(7))).unwrap();
        assert_eq!(Ok(num!(7)), apply(&mu, &list!(), &caller));
        assert!(apply(&mu, &list!(), &env).is_err());
    }

    #[test]
    fn test_depth_limit() {
        Config {
            tail_calls: false,
            max_depth: 3,
        }
        .install();
        let env = test_env();
        let nested = list!(sym!("+"), list!(sym!("+"), list!(sym!("+"), num!(1))));
        let err = evaluate(&nested, &env).unwrap_err();
        assert_eq!(EvalErrorKind::RecursionDepth, err.kind);

        // the counter unwinds with the error
        assert_eq!(Ok(num!(1)), evaluate(&list!(sym!("+"), num!(1)), &env));
        Config::default().install();
    }
}
