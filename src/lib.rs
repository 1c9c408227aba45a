//! muscheme is a small Scheme interpreter built around an evaluate/apply
//! recurrence over `Rc`-linked environment frames. It supports lexically
//! scoped `lambda` and dynamically scoped `mu` procedures, and can run
//! tail-recursive loops in bounded stack.

#[macro_use]
extern crate log;

/// Builds a proper list from datum expressions
#[macro_export]
macro_rules! list {
    ($($x:expr),*) => {{
        let v: Vec<$crate::datum::Datum> = vec![$($x),*];
        v.into_iter().collect::<$crate::datum::Datum>()
    }};
}

#[macro_export]
macro_rules! sym {
    ($e:expr) => {
        $crate::datum::Datum::sym($e)
    };
}

#[macro_export]
macro_rules! num {
    ($e:expr) => {
        $crate::datum::Datum::Int($e)
    };
}

/// Error values returned from parser or evaluator
pub mod error;
/// Basic datum types
pub mod datum;
/// Environment frames
pub mod env;
pub mod procedure;
/// Operand and formal parameter validation
pub mod check;
pub mod config;
/// Special forms
pub mod syntax;
/// The evaluate/apply recurrence
pub mod eval;
pub mod eqv;
/// Primitive functions
pub mod primitive;
/// Global frame construction
pub mod base;
pub mod lexer;
pub mod parser;
/// Loader and read-eval-print loop
pub mod repl;

pub use base::create_global_frame;
pub use config::Config;
pub use datum::Datum;
pub use env::Env;
pub use error::EvalError;
pub use eval::{apply, evaluate};
