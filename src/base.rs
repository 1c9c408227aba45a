use std::rc::Rc;

use crate::datum::Datum;
use crate::env::Env;
use crate::primitive::{libprimitive, libprimitive_env};
use crate::procedure::Procedure;

/// A fresh global frame with the primitive procedures installed
pub fn create_global_frame() -> Env {
    let env = Env::new_root();
    for (name, func, arity) in libprimitive() {
        env.define(Rc::from(name), Datum::Proc(Procedure::primitive(name, func, false, arity)));
    }
    for (name, func, arity) in libprimitive_env() {
        env.define(Rc::from(name), Datum::Proc(Procedure::primitive(name, func, true, arity)));
    }
    env
}
