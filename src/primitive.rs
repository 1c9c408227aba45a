use std::io::{self, Write};

use crate::datum::{cons, Datum, DatumType};
use crate::eqv::DatumEqv;
use crate::error::{EvalError, EvalErrorKind};
use crate::eval;
use crate::procedure::{Arity, PrimFn};

fn invalid_type(name: &str, expected: DatumType, datum: &Datum) -> EvalError {
    EvalError::new(
        EvalErrorKind::InvalidType,
        format!(
            "{}: expected {:?}, but received {:?} {}",
            name,
            expected,
            DatumType::get_type(datum),
            datum
        ),
    )
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn unwrap(name: &str, datum: &Datum) -> Result<Number, EvalError> {
        match datum {
            Datum::Int(n) => Ok(Number::Int(*n)),
            Datum::Float(n) => Ok(Number::Float(*n)),
            _ => Err(invalid_type(name, DatumType::Num, datum)),
        }
    }

    fn wrap(self) -> Datum {
        match self {
            Number::Int(n) => Datum::Int(n),
            Number::Float(n) => Datum::Float(n),
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn is_zero(self) -> bool {
        self.to_f64() == 0.0
    }
}

fn overflow(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::Overflow, format!("{}: integer overflow", name))
}

fn divide_by_zero(name: &str) -> EvalError {
    EvalError::new(EvalErrorKind::DivideByZero, format!("{}: division by zero", name))
}

/// Folds two numbers, staying exact while both are integers
fn arith(
    name: &str,
    l: Number,
    r: Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Number, EvalError> {
    match (l, r) {
        (Number::Int(a), Number::Int(b)) => int_op(a, b).map(Number::Int).ok_or_else(|| overflow(name)),
        _ => Ok(Number::Float(float_op(l.to_f64(), r.to_f64()))),
    }
}

fn numbers(name: &str, args: &[Datum]) -> Result<Vec<Number>, EvalError> {
    args.iter().map(|arg| Number::unwrap(name, arg)).collect()
}

/// `(+ n0 n1 ...)`
fn add(args: &[Datum]) -> Result<Datum, EvalError> {
    let mut sum = Number::Int(0);
    for a in numbers("+", args)? {
        sum = arith("+", sum, a, i64::checked_add, |a, b| a + b)?;
    }
    Ok(sum.wrap())
}

/// `(* n0 n1 ...)`
fn mul(args: &[Datum]) -> Result<Datum, EvalError> {
    let mut product = Number::Int(1);
    for a in numbers("*", args)? {
        product = arith("*", product, a, i64::checked_mul, |a, b| a * b)?;
    }
    Ok(product.wrap())
}

/// `(- n0 n1 ...)`
fn sub(args: &[Datum]) -> Result<Datum, EvalError> {
    let nums = numbers("-", args)?;
    if nums.len() == 1 {
        return arith("-", Number::Int(0), nums[0], i64::checked_sub, |a, b| a - b).map(Number::wrap);
    }

    let mut sum = nums[0];
    for &a in &nums[1..] {
        sum = arith("-", sum, a, i64::checked_sub, |a, b| a - b)?;
    }
    Ok(sum.wrap())
}

/// `(/ n0 n1 ...)`, exact only when every quotient is
fn div(args: &[Datum]) -> Result<Datum, EvalError> {
    let nums = numbers("/", args)?;
    let (mut product, rest) = if nums.len() == 1 {
        (Number::Int(1), &nums[..])
    } else {
        (nums[0], &nums[1..])
    };

    for &a in rest {
        if a.is_zero() {
            return Err(divide_by_zero("/"));
        }
        product = match (product, a) {
            (Number::Int(x), Number::Int(y)) if x.checked_rem(y) == Some(0) => {
                Number::Int(x.checked_div(y).ok_or_else(|| overflow("/"))?)
            }
            _ => Number::Float(product.to_f64() / a.to_f64()),
        };
    }
    Ok(product.wrap())
}

fn integers(name: &str, args: &[Datum]) -> Result<(i64, i64), EvalError> {
    match (&args[0], &args[1]) {
        (Datum::Int(a), Datum::Int(b)) => {
            if *b == 0 {
                Err(divide_by_zero(name))
            } else {
                Ok((*a, *b))
            }
        }
        (Datum::Int(_), other) | (other, _) => Err(invalid_type(name, DatumType::Num, other)),
    }
}

fn quotient(args: &[Datum]) -> Result<Datum, EvalError> {
    let (a, b) = integers("quotient", args)?;
    a.checked_div(b).map(Datum::Int).ok_or_else(|| overflow("quotient"))
}

fn remainder(args: &[Datum]) -> Result<Datum, EvalError> {
    let (a, b) = integers("remainder", args)?;
    a.checked_rem(b).map(Datum::Int).ok_or_else(|| overflow("remainder"))
}

fn modulo(args: &[Datum]) -> Result<Datum, EvalError> {
    let (a, b) = integers("modulo", args)?;
    let r = a.checked_rem(b).ok_or_else(|| overflow("modulo"))?;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(Datum::Int(r + b))
    } else {
        Ok(Datum::Int(r))
    }
}

fn abs(args: &[Datum]) -> Result<Datum, EvalError> {
    match Number::unwrap("abs", &args[0])? {
        Number::Int(n) => n.checked_abs().map(Datum::Int).ok_or_else(|| overflow("abs")),
        Number::Float(n) => Ok(Datum::Float(n.abs())),
    }
}

fn compare(name: &str, args: &[Datum], cmp: fn(f64, f64) -> bool) -> Result<Datum, EvalError> {
    let nums = numbers(name, args)?;
    let holds = nums.windows(2).all(|w| match (w[0], w[1]) {
        (Number::Int(a), Number::Int(b)) => int_cmp(a, b, cmp),
        (a, b) => cmp(a.to_f64(), b.to_f64()),
    });
    Ok(Datum::Bool(holds))
}

// f64 loses precision for large fixnums; compare the ordering instead
fn int_cmp(a: i64, b: i64, cmp: fn(f64, f64) -> bool) -> bool {
    let ord = a.cmp(&b) as i64 as f64;
    cmp(ord, 0.0)
}

fn num_eq(args: &[Datum]) -> Result<Datum, EvalError> {
    compare("=", args, |a, b| a == b)
}

fn lt(args: &[Datum]) -> Result<Datum, EvalError> {
    compare("<", args, |a, b| a < b)
}

fn gt(args: &[Datum]) -> Result<Datum, EvalError> {
    compare(">", args, |a, b| a > b)
}

fn le(args: &[Datum]) -> Result<Datum, EvalError> {
    compare("<=", args, |a, b| a <= b)
}

fn ge(args: &[Datum]) -> Result<Datum, EvalError> {
    compare(">=", args, |a, b| a >= b)
}

fn is_zero(args: &[Datum]) -> Result<Datum, EvalError> {
    Number::unwrap("zero?", &args[0]).map(|n| Datum::Bool(n.is_zero()))
}

fn parity(name: &str, datum: &Datum) -> Result<i64, EvalError> {
    match datum {
        Datum::Int(n) => Ok(n.rem_euclid(2)),
        _ => Err(invalid_type(name, DatumType::Num, datum)),
    }
}

fn is_even(args: &[Datum]) -> Result<Datum, EvalError> {
    parity("even?", &args[0]).map(|p| Datum::Bool(p == 0))
}

fn is_odd(args: &[Datum]) -> Result<Datum, EvalError> {
    parity("odd?", &args[0]).map(|p| Datum::Bool(p == 1))
}

fn is_number(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(DatumType::get_type(&args[0]) == DatumType::Num))
}

fn is_integer(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(match args[0] {
        Datum::Int(_) => true,
        Datum::Float(n) => n.fract() == 0.0,
        _ => false,
    }))
}

fn is_symbol(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(DatumType::get_type(&args[0]) == DatumType::Sym))
}

fn is_string(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(DatumType::get_type(&args[0]) == DatumType::String))
}

fn is_boolean(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(DatumType::get_type(&args[0]) == DatumType::Bool))
}

fn is_null(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0].is_empty()))
}

fn is_pair(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0].is_pair()))
}

fn is_list(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0].is_list()))
}

fn is_procedure(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(DatumType::get_type(&args[0]) == DatumType::Callable))
}

fn not(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0].is_false()))
}

fn eqv(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0].eqv(&args[1])))
}

fn equal(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(Datum::Bool(args[0] == args[1]))
}

fn prim_cons(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(cons(args[0].clone(), args[1].clone()))
}

fn car(args: &[Datum]) -> Result<Datum, EvalError> {
    match args[0].as_pair() {
        Some(pair) => Ok(pair.0.clone()),
        None => Err(invalid_type("car", DatumType::Pair, &args[0])),
    }
}

fn cdr(args: &[Datum]) -> Result<Datum, EvalError> {
    match args[0].as_pair() {
        Some(pair) => Ok(pair.1.clone()),
        None => Err(invalid_type("cdr", DatumType::Pair, &args[0])),
    }
}

fn list(args: &[Datum]) -> Result<Datum, EvalError> {
    Ok(args.iter().cloned().collect())
}

fn length(args: &[Datum]) -> Result<Datum, EvalError> {
    args[0].len().map(|n| Datum::Int(n as i64))
}

fn append(args: &[Datum]) -> Result<Datum, EvalError> {
    let (last, init) = match args.split_last() {
        Some(split) => split,
        None => return Ok(Datum::Nil),
    };

    let mut items = Vec::new();
    for arg in init {
        items.extend(arg.to_vec()?);
    }
    let mut res = last.clone();
    for d in items.into_iter().rev() {
        res = cons(d, res);
    }
    Ok(res)
}

fn flush() -> Result<Datum, EvalError> {
    io::stdout().flush()?;
    Ok(Datum::Okay)
}

fn display(args: &[Datum]) -> Result<Datum, EvalError> {
    match &args[0] {
        Datum::Str(s) => print!("{}", s),
        other => print!("{}", other),
    }
    flush()
}

fn newline(_: &[Datum]) -> Result<Datum, EvalError> {
    println!();
    flush()
}

fn prim_print(args: &[Datum]) -> Result<Datum, EvalError> {
    println!("{}", args[0]);
    flush()
}

fn error(args: &[Datum]) -> Result<Datum, EvalError> {
    let msg: Vec<String> = args
        .iter()
        .map(|arg| match arg {
            Datum::Str(s) => s.to_string(),
            other => other.to_string(),
        })
        .collect();
    Err(EvalError::new(EvalErrorKind::UserError, msg.join(" ")))
}

fn environment(name: &str, datum: &Datum) -> Result<crate::env::Env, EvalError> {
    match datum {
        Datum::Env(env) => Ok(env.clone()),
        other => Err(invalid_type(name, DatumType::Environment, other)),
    }
}

/// `(eval expr)`, evaluated in the caller's environment
fn prim_eval(args: &[Datum]) -> Result<Datum, EvalError> {
    let env = environment("eval", &args[1])?;
    eval::evaluate(&args[0], &env)
}

/// `(apply proc args)`
fn prim_apply(args: &[Datum]) -> Result<Datum, EvalError> {
    let env = environment("apply", &args[2])?;
    eval::apply(&args[0], &args[1], &env)
}

/// Lists all primitive functions with their name and arity
pub fn libprimitive() -> Vec<(&'static str, PrimFn, Arity)> {
    vec![
        ("+", add, Arity::at_least(0)),
        ("-", sub, Arity::at_least(1)),
        ("*", mul, Arity::at_least(0)),
        ("/", div, Arity::at_least(1)),
        ("quotient", quotient, Arity::exact(2)),
        ("remainder", remainder, Arity::exact(2)),
        ("modulo", modulo, Arity::exact(2)),
        ("abs", abs, Arity::exact(1)),
        ("=", num_eq, Arity::at_least(1)),
        ("<", lt, Arity::at_least(1)),
        (">", gt, Arity::at_least(1)),
        ("<=", le, Arity::at_least(1)),
        (">=", ge, Arity::at_least(1)),
        ("zero?", is_zero, Arity::exact(1)),
        ("even?", is_even, Arity::exact(1)),
        ("odd?", is_odd, Arity::exact(1)),
        ("number?", is_number, Arity::exact(1)),
        ("integer?", is_integer, Arity::exact(1)),
        ("symbol?", is_symbol, Arity::exact(1)),
        ("string?", is_string, Arity::exact(1)),
        ("boolean?", is_boolean, Arity::exact(1)),
        ("null?", is_null, Arity::exact(1)),
        ("pair?", is_pair, Arity::exact(1)),
        ("list?", is_list, Arity::exact(1)),
        ("procedure?", is_procedure, Arity::exact(1)),
        ("not", not, Arity::exact(1)),
        ("eq?", eqv, Arity::exact(2)),
        ("eqv?", eqv, Arity::exact(2)),
        ("equal?", equal, Arity::exact(2)),
        ("cons", prim_cons, Arity::exact(2)),
        ("car", car, Arity::exact(1)),
        ("cdr", cdr, Arity::exact(1)),
        ("list", list, Arity::at_least(0)),
        ("length", length, Arity::exact(1)),
        ("append", append, Arity::at_least(0)),
        ("display", display, Arity::exact(1)),
        ("newline", newline, Arity::exact(0)),
        ("print", prim_print, Arity::exact(1)),
        ("error", error, Arity::at_least(0)),
    ]
}

/// Primitives which receive the calling environment as their last argument
pub fn libprimitive_env() -> Vec<(&'static str, PrimFn, Arity)> {
    vec![
        ("eval", prim_eval, Arity::exact(1)),
        ("apply", prim_apply, Arity::exact(2)),
    ]
}
