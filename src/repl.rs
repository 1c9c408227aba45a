use std::fs;
use std::io::{self, Write};
use std::rc::Rc;

use crate::datum::{Datum, DatumType};
use crate::env::Env;
use crate::error::{EvalError, EvalErrorKind, ParserError};
use crate::eval::evaluate;
use crate::parser::Parser;
use crate::procedure::{Arity, Procedure};

/// Reads each datum of `source` in order and evaluates it in `env`.
///
/// Values other than `okay` are written to `out` unless `quiet` is set.
/// Evaluation errors are reported as `Error: <message>` and do not stop the
/// loop. A reader error is reported the same way and reading resumes on the
/// line after it.
pub fn read_eval_print<W: Write>(source: &str, env: &Env, quiet: bool, out: &mut W) -> io::Result<()> {
    let mut rest = source;
    while let Some(err) = eval_until_error(rest, env, quiet, out)? {
        writeln!(out, "Error: {}", err)?;
        let skip: usize = rest.split_inclusive('\n').take(err.line).map(str::len).sum();
        rest = &rest[skip..];
    }
    Ok(())
}

fn eval_until_error<W: Write>(
    source: &str,
    env: &Env,
    quiet: bool,
    out: &mut W,
) -> io::Result<Option<ParserError>> {
    let mut parser = Parser::new(source);
    loop {
        match parser.is_eof() {
            Ok(true) => return Ok(None),
            Ok(false) => (),
            Err(e) => return Ok(Some(e)),
        }
        let expr = match parser.parse_datum() {
            Ok(expr) => expr,
            Err(e) => return Ok(Some(e)),
        };
        match evaluate(&expr, env) {
            Ok(Datum::Okay) => (),
            Ok(value) => {
                if !quiet {
                    writeln!(out, "{}", value)?;
                }
            }
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
    }
}

fn read_source(path: &str) -> Result<String, EvalError> {
    let io_error = |path: &str, err: io::Error| EvalError::new(EvalErrorKind::Io, format!("{}: {}", path, err));
    match fs::read_to_string(path) {
        Ok(source) => Ok(source),
        Err(err) if path.ends_with(".scm") => Err(io_error(path, err)),
        Err(_) => {
            let path = format!("{}.scm", path);
            fs::read_to_string(&path).map_err(|err| io_error(&path, err))
        }
    }
}

/// Loads `path`, or `path.scm` if `path` does not exist, into the global
/// frame of `env`
pub fn load_file(path: &str, env: &Env, quiet: bool) -> Result<(), EvalError> {
    let source = read_source(path)?;
    debug!("loading {}", path);
    read_eval_print(&source, &env.global_frame(), quiet, &mut io::stdout())?;
    Ok(())
}

/// `(load file [quiet])`
fn load(args: &[Datum]) -> Result<Datum, EvalError> {
    let (name, quiet, env) = match args {
        [name, env] => (name, true, env),
        [name, quiet, env] => (name, quiet.is_true(), env),
        _ => {
            return Err(EvalError::new(
                EvalErrorKind::NumArgs,
                format!("wrong number of arguments to load: {}", args.len().saturating_sub(1)),
            ))
        }
    };
    let env = match env {
        Datum::Env(env) => env,
        other => {
            return Err(EvalError::new(
                EvalErrorKind::InvalidType,
                format!("load: expected Environment, but received {:?} {}", DatumType::get_type(other), other),
            ))
        }
    };
    match name {
        Datum::Str(path) | Datum::Sym(path) => load_file(path, env, quiet)?,
        other => {
            return Err(EvalError::new(
                EvalErrorKind::InvalidType,
                format!("load: expected Symbol, but received {:?} {}", DatumType::get_type(other), other),
            ))
        }
    }
    Ok(Datum::Okay)
}

/// Installs the `load` primitive into `env`
pub fn install_loader(env: &Env) {
    env.define(
        Rc::from("load"),
        Datum::Proc(Procedure::primitive("load", load, true, Arity::range(1, 2))),
    );
}
