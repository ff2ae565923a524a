//! The standard protocols and typed entry points for calling them from Rust.
//!
//! Every dispatcher takes its subject last, so `get(key, coll)` dispatches on
//! `coll` and `foldl(f, initial, coll)` on `coll`.

use im::Vector;
use once_cell::sync::Lazy;

use crate::error::Error;
use crate::protocols::Protocol;
use crate::runtime::value::{Func, Value};

// ─── Protocols ────────────────────────────────────────────────────────────────

pub static ISHOW: Lazy<Protocol> = Lazy::new(|| Protocol::new("IShow", &[("show", &["x"])]));

pub static ICLONE: Lazy<Protocol> = Lazy::new(|| Protocol::new("IClone", &[
    ("clone",         &["x"]),
    ("shallow_clone", &["x"]),
]));

pub static ICOUNT: Lazy<Protocol> = Lazy::new(|| Protocol::new("ICount", &[("count", &["xs"])]));

pub static ISEQ: Lazy<Protocol> = Lazy::new(|| Protocol::new("ISeq", &[
    ("first", &["xs"]),
    ("rest",  &["xs"]),
]));

pub static ICOLLECTION: Lazy<Protocol> = Lazy::new(|| Protocol::new("ICollection", &[("conj", &["x", "xs"])]));

pub static IITERATOR: Lazy<Protocol> = Lazy::new(|| Protocol::new("IIterator", &[("iterator", &["x"])]));

pub static IKEYED: Lazy<Protocol> = Lazy::new(|| Protocol::new("IKeyed", &[("keys", &["xs"])]));

pub static IASSOCIATIVE: Lazy<Protocol> = Lazy::new(|| Protocol::new("IAssociative", &[
    ("assoc",  &["key", "val", "xs"]),
    ("dissoc", &["key", "xs"]),
]));

pub static ILOOKUP: Lazy<Protocol> = Lazy::new(|| Protocol::new("ILookup", &[("get", &["key", "xs"])]));

pub static IMONOID: Lazy<Protocol> = Lazy::new(|| Protocol::new("IMonoid", &[
    ("empty",  &["xs"]),
    ("append", &["x", "xs"]),
]));

pub static IFOLD: Lazy<Protocol> = Lazy::new(|| Protocol::new("IFold", &[
    ("foldl", &["f", "initial", "xs"]),
    ("foldr", &["f", "initial", "xs"]),
]));

pub static IFUNCTOR: Lazy<Protocol> = Lazy::new(|| Protocol::new("IFunctor", &[("map", &["f", "coll"])]));

pub static ICATA: Lazy<Protocol> = Lazy::new(|| Protocol::new("ICata", &[("cata", &["f", "g", "coll"])]));

pub static IBIFUNCTOR: Lazy<Protocol> = Lazy::new(|| Protocol::new("IBifunctor", &[("bimap", &["f", "g", "coll"])]));

/// `ap(values, fns)`: the subject holds the functions.
pub static IAPPLY: Lazy<Protocol> = Lazy::new(|| Protocol::new("IApply", &[("ap", &["ma", "mb"])]));

pub static IMONADIC: Lazy<Protocol> = Lazy::new(|| Protocol::new("IMonadic", &[
    ("of",      &["x", "m"]),
    ("flatten", &["m"]),
]));

// ─── Typed entry points ───────────────────────────────────────────────────────

/// Render a value through `IShow`.
pub fn show(x: &Value) -> Result<String, Error> {
    match ISHOW.call("show", &[x.clone()])? {
        Value::Str(s) => Ok(s),
        other => Err(Error::invalid_argument("show", format!(
            "implementation for {} returned {} instead of a string",
            x.type_name(), other.type_name()
        ))),
    }
}

pub fn clone(x: &Value) -> Result<Value, Error> {
    ICLONE.call("clone", &[x.clone()])
}

pub fn shallow_clone(x: &Value) -> Result<Value, Error> {
    ICLONE.call("shallow_clone", &[x.clone()])
}

pub fn count(xs: &Value) -> Result<usize, Error> {
    match ICOUNT.call("count", &[xs.clone()])? {
        Value::Number(n) if n >= 0.0 => Ok(n as usize),
        other => Err(Error::invalid_argument("count", format!("expected a count, got {}", other.type_name()))),
    }
}

pub fn first(xs: &Value) -> Result<Value, Error> {
    ISEQ.call("first", &[xs.clone()])
}

pub fn rest(xs: &Value) -> Result<Value, Error> {
    ISEQ.call("rest", &[xs.clone()])
}

pub fn conj(x: Value, xs: &Value) -> Result<Value, Error> {
    ICOLLECTION.call("conj", &[x, xs.clone()])
}

/// The values `x` yields, in iteration order.
pub fn iterator(x: &Value) -> Result<Vector<Value>, Error> {
    match IITERATOR.call("iterator", &[x.clone()])? {
        Value::List(xs) => Ok(xs),
        other => Err(Error::invalid_argument("iterator", format!(
            "implementation for {} returned {} instead of an array",
            x.type_name(), other.type_name()
        ))),
    }
}

pub fn keys(xs: &Value) -> Result<Value, Error> {
    IKEYED.call("keys", &[xs.clone()])
}

pub fn assoc(key: Value, val: Value, xs: &Value) -> Result<Value, Error> {
    IASSOCIATIVE.call("assoc", &[key, val, xs.clone()])
}

pub fn dissoc(key: Value, xs: &Value) -> Result<Value, Error> {
    IASSOCIATIVE.call("dissoc", &[key, xs.clone()])
}

/// Lookup by key. Always a `Maybe`.
pub fn get(key: Value, xs: &Value) -> Result<Value, Error> {
    ILOOKUP.call("get", &[key, xs.clone()])
}

pub fn empty(xs: &Value) -> Result<Value, Error> {
    IMONOID.call("empty", &[xs.clone()])
}

pub fn append(x: Value, xs: &Value) -> Result<Value, Error> {
    IMONOID.call("append", &[x, xs.clone()])
}

/// Left fold. `f` is called as `f(value, acc)`.
pub fn foldl(f: &Func, initial: Value, xs: &Value) -> Result<Value, Error> {
    IFOLD.call("foldl", &[Value::Func(f.clone()), initial, xs.clone()])
}

/// Right fold. `f` is called as `f(value, acc)`.
pub fn foldr(f: &Func, initial: Value, xs: &Value) -> Result<Value, Error> {
    IFOLD.call("foldr", &[Value::Func(f.clone()), initial, xs.clone()])
}

pub fn map(f: &Func, coll: &Value) -> Result<Value, Error> {
    IFUNCTOR.call("map", &[Value::Func(f.clone()), coll.clone()])
}

pub fn cata(f: &Func, g: &Func, coll: &Value) -> Result<Value, Error> {
    ICATA.call("cata", &[Value::Func(f.clone()), Value::Func(g.clone()), coll.clone()])
}

/// `f` transforms the success side, `g` the failure side.
pub fn bimap(f: &Func, g: &Func, coll: &Value) -> Result<Value, Error> {
    IBIFUNCTOR.call("bimap", &[Value::Func(f.clone()), Value::Func(g.clone()), coll.clone()])
}

/// Apply the functions held by `fns` to the values held by `values`.
pub fn ap(values: &Value, fns: &Value) -> Result<Value, Error> {
    IAPPLY.call("ap", &[values.clone(), fns.clone()])
}

/// Wrap `x` in the same container type as `m`.
pub fn of(x: Value, m: &Value) -> Result<Value, Error> {
    IMONADIC.call("of", &[x, m.clone()])
}

pub fn flatten(m: &Value) -> Result<Value, Error> {
    IMONADIC.call("flatten", &[m.clone()])
}
