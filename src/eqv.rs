use std::rc::Rc;

use crate::datum::Datum;

/// Scheme `eqv?`: value equality for atoms, identity for pairs, strings,
/// procedures and environments
pub trait DatumEqv {
    fn eqv(&self, other: &Self) -> bool;
}

impl DatumEqv for Datum {
    fn eqv(&self, other: &Datum) -> bool {
        match (self, other) {
            (Datum::Bool(l), Datum::Bool(r)) => l == r,
            (Datum::Int(l), Datum::Int(r)) => l == r,
            (Datum::Float(l), Datum::Float(r)) => l == r,
            (Datum::Sym(l), Datum::Sym(r)) => l == r,
            (Datum::Str(l), Datum::Str(r)) => l.eqv(r),
            (Datum::Nil, Datum::Nil) => true,
            (Datum::Okay, Datum::Okay) => true,
            (Datum::Pair(l), Datum::Pair(r)) => l.eqv(r),
            (Datum::Proc(l), Datum::Proc(r)) => l == r,
            (Datum::Env(l), Datum::Env(r)) => l.ptr_eq(r),
            _ => false,
        }
    }
}

impl<T: ?Sized> DatumEqv for Rc<T> {
    fn eqv(&self, other: &Rc<T>) -> bool {
        Rc::ptr_eq(self, other)
    }
}
