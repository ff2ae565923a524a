//! `Maybe` and `Result`: the two built-in unions, with their collection and
//! functor bindings.
//!
//!   Maybe  = Some(value) | None()
//!   Result = Ok(value)   | Err(error)
//!
//! Both are ordinary `UnionType`s, so `case_of`, `is` and multimethods treat
//! them like any user-declared union.

use once_cell::sync::Lazy;

use crate::error::Error;
use crate::protocols::{self, core as p};
use crate::protocols::core::{IAPPLY, IBIFUNCTOR, ICATA, ICLONE, IFOLD, IFUNCTOR, IMONADIC, IMONOID};
use crate::runtime::value::{Func, Value, nth};
use crate::types::descriptor::TypeDescriptor;
use crate::types::union::{UnionType, UnionValue};

pub static MAYBE: Lazy<UnionType> = Lazy::new(|| {
    let ty = UnionType::new("Maybe", [
        ("Some", vec![TypeDescriptor::Any]),
        ("None", vec![]),
    ]);
    register_maybe(&ty);
    ty
});

pub static RESULT: Lazy<UnionType> = Lazy::new(|| {
    let ty = UnionType::new("Result", [
        ("Ok",  vec![TypeDescriptor::Any]),
        ("Err", vec![TypeDescriptor::Any]),
    ]);
    register_result(&ty);
    ty
});

// ─── Constructors ─────────────────────────────────────────────────────────────

pub struct Maybe;

impl Maybe {
    pub fn some(value: Value) -> Value {
        Value::Union(MAYBE.instance("Some", vec![value]))
    }

    pub fn none() -> Value {
        Value::Union(MAYBE.instance("None", vec![]))
    }

    pub fn union() -> &'static UnionType {
        &MAYBE
    }

    /// Descriptor for a `Maybe` whose value, if any, satisfies `ty`.
    pub fn of(ty: TypeDescriptor) -> TypeDescriptor {
        MAYBE.of(vec![ty])
    }

    /// The wrapped value of a `Some`, or `fallback` for `None`.
    pub fn get_or(fallback: Value, m: &Value) -> Result<Value, Error> {
        if !MAYBE.contains(m) {
            return Err(Error::type_mismatch("Maybe::get_or", "a Maybe", m.type_name()));
        }
        Ok(m.as_union()
            .filter(|u| u.is_case("Some"))
            .map(|u| nth(u.values(), 0))
            .unwrap_or(fallback))
    }
}

pub struct ResultType;

impl ResultType {
    pub fn ok(value: Value) -> Value {
        Value::Union(RESULT.instance("Ok", vec![value]))
    }

    pub fn err(error: Value) -> Value {
        Value::Union(RESULT.instance("Err", vec![error]))
    }

    pub fn union() -> &'static UnionType {
        &RESULT
    }
}

/// Wrap a possibly-absent value: `Nil` becomes `None`, a `Maybe` is returned
/// as-is, anything else becomes `Some`.
pub fn maybe(x: Value) -> Value {
    if MAYBE.contains(&x) {
        x
    } else if x.is_nil() {
        Maybe::none()
    } else {
        Maybe::some(x)
    }
}

/// `Err(err)` when `ok` is `Nil`, otherwise `Ok(ok)`.
pub fn result(ok: Value, err: Value) -> Value {
    if ok.is_nil() { ResultType::err(err) } else { ResultType::ok(ok) }
}

// ─── Bindings ─────────────────────────────────────────────────────────────────

fn m(name: &'static str, arity: usize, f: impl Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static) -> Func {
    Func::new(name, arity, f)
}

fn subject(args: &[Value]) -> Value {
    nth(args, args.len().saturating_sub(1))
}

fn instance_of(ty: &UnionType, v: &Value, method: &str) -> Result<UnionValue, Error> {
    match v {
        Value::Union(u) if u.union_type().type_key() == ty.type_key() => Ok(u.clone()),
        other => Err(Error::type_mismatch(method, format!("a {}", ty.name()), other.type_name())),
    }
}

fn func_arg(args: &[Value], i: usize, method: &str) -> Result<Func, Error> {
    match args.get(i) {
        Some(Value::Func(f)) => Ok(f.clone()),
        other => Err(Error::type_mismatch(
            method, "a Function",
            other.map(Value::type_name).unwrap_or_else(|| "nothing".into()),
        )),
    }
}

fn inner(u: &UnionValue) -> Value {
    nth(u.values(), 0)
}

fn register_maybe(ty: &UnionType) {
    let key = ty.type_key();
    let some = |ty: &UnionType, v: Value| Value::Union(ty.instance("Some", vec![v]));
    let none = |ty: &UnionType| Value::Union(ty.instance("None", vec![]));

    let t = ty.clone();
    protocols::install(&key, &ICLONE, vec![
        m("clone", 1, move |args| {
            let u = instance_of(&t, &subject(args), "clone")?;
            if u.is_case("Some") {
                Ok(some(&t, p::clone(&inner(&u))?))
            } else {
                Ok(Value::Union(u))
            }
        }),
        m("shallow_clone", 1, |args| Ok(nth(args, 0))),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IMONOID, vec![
        m("empty", 1, move |_| Ok(none(&t1))),
        // Two `Some`s combine their values; a `None` on either side yields the other.
        m("append", 2, move |args| {
            let xs = instance_of(&t2, &subject(args), "append")?;
            let x = instance_of(&t2, &nth(args, 0), "append")?;
            match (x.is_case("Some"), xs.is_case("Some")) {
                (true, true) => Ok(some(&t2, p::append(inner(&x), &inner(&xs))?)),
                (true, false) => Ok(Value::Union(x)),
                (false, _) => Ok(Value::Union(xs)),
            }
        }),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IFOLD, vec![
        m("foldl", 3, move |args| fold_some(&t1, "Some", args, "foldl")),
        m("foldr", 3, move |args| fold_some(&t2, "Some", args, "foldr")),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IFUNCTOR, vec![
        m("map", 2, move |args| {
            let f = func_arg(args, 0, "map")?;
            let u = instance_of(&t, &subject(args), "map")?;
            if u.is_case("Some") {
                Ok(maybe(f.call(&[inner(&u)])?))
            } else {
                Ok(Value::Union(u))
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &ICATA, vec![
        m("cata", 3, move |args| {
            let f = func_arg(args, 0, "cata")?;
            let g = func_arg(args, 1, "cata")?;
            let u = instance_of(&t, &subject(args), "cata")?;
            if u.is_case("Some") {
                f.call(u.values())
            } else {
                g.call(&[])
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IBIFUNCTOR, vec![
        m("bimap", 3, move |args| {
            let f = func_arg(args, 0, "bimap")?;
            let u = instance_of(&t, &subject(args), "bimap")?;
            if u.is_case("Some") {
                Ok(some(&t, f.call(&[inner(&u)])?))
            } else {
                Ok(Value::Union(u))
            }
        }),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IMONADIC, vec![
        m("of", 2, move |args| Ok(some(&t1, nth(args, 0)))),
        m("flatten", 1, move |args| {
            let u = instance_of(&t2, &subject(args), "flatten")?;
            if u.is_case("Some") {
                Ok(maybe(inner(&u)))
            } else {
                Ok(Value::Union(u))
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IAPPLY, vec![
        m("ap", 2, move |args| {
            let fns = instance_of(&t, &subject(args), "ap")?;
            if fns.is_case("Some") {
                let f = func_arg(fns.values(), 0, "ap")?;
                p::map(&f, &nth(args, 0))
            } else {
                Ok(Value::Union(fns))
            }
        }),
    ]);
}

fn register_result(ty: &UnionType) {
    let key = ty.type_key();
    let wrap = |ty: &UnionType, case: &str, v: Value| Value::Union(ty.instance(case, vec![v]));

    let t = ty.clone();
    protocols::install(&key, &ICLONE, vec![
        m("clone", 1, move |args| {
            let u = instance_of(&t, &subject(args), "clone")?;
            Ok(wrap(&t, u.case(), p::clone(&inner(&u))?))
        }),
        m("shallow_clone", 1, |args| Ok(nth(args, 0))),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IMONOID, vec![
        m("empty", 1, move |args| {
            let u = instance_of(&t1, &subject(args), "empty")?;
            Ok(wrap(&t1, u.case(), p::empty(&inner(&u))?))
        }),
        // Oks combine their values, Errs combine their errors, and an Err
        // beats an Ok.
        m("append", 2, move |args| {
            let xs = instance_of(&t2, &subject(args), "append")?;
            let x = instance_of(&t2, &nth(args, 0), "append")?;
            match (x.is_case("Ok"), xs.is_case("Ok")) {
                (true, true)   => Ok(wrap(&t2, "Ok", p::append(inner(&x), &inner(&xs))?)),
                (false, false) => Ok(wrap(&t2, "Err", p::append(inner(&x), &inner(&xs))?)),
                (false, true)  => Ok(Value::Union(x)),
                (true, false)  => Ok(Value::Union(xs)),
            }
        }),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IFOLD, vec![
        m("foldl", 3, move |args| fold_some(&t1, "Ok", args, "foldl")),
        m("foldr", 3, move |args| fold_some(&t2, "Ok", args, "foldr")),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IFUNCTOR, vec![
        m("map", 2, move |args| {
            let f = func_arg(args, 0, "map")?;
            let u = instance_of(&t, &subject(args), "map")?;
            if u.is_case("Ok") {
                Ok(wrap(&t, "Ok", f.call(&[inner(&u)])?))
            } else {
                Ok(Value::Union(u))
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &ICATA, vec![
        m("cata", 3, move |args| {
            let f = func_arg(args, 0, "cata")?;
            let g = func_arg(args, 1, "cata")?;
            let u = instance_of(&t, &subject(args), "cata")?;
            if u.is_case("Ok") {
                f.call(u.values())
            } else {
                g.call(u.values())
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IBIFUNCTOR, vec![
        m("bimap", 3, move |args| {
            let f = func_arg(args, 0, "bimap")?;
            let g = func_arg(args, 1, "bimap")?;
            let u = instance_of(&t, &subject(args), "bimap")?;
            if u.is_case("Ok") {
                Ok(wrap(&t, "Ok", f.call(&[inner(&u)])?))
            } else {
                Ok(wrap(&t, "Err", g.call(&[inner(&u)])?))
            }
        }),
    ]);

    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&key, &IMONADIC, vec![
        m("of", 2, move |args| Ok(wrap(&t1, "Ok", nth(args, 0)))),
        m("flatten", 1, move |args| {
            let u = instance_of(&t2, &subject(args), "flatten")?;
            let x = inner(&u);
            if u.is_case("Ok") && t2.contains(&x) {
                Ok(x)
            } else {
                Ok(Value::Union(u))
            }
        }),
    ]);

    let t = ty.clone();
    protocols::install(&key, &IAPPLY, vec![
        m("ap", 2, move |args| {
            let fns = instance_of(&t, &subject(args), "ap")?;
            if fns.is_case("Ok") {
                let f = func_arg(fns.values(), 0, "ap")?;
                p::map(&f, &nth(args, 0))
            } else {
                Ok(Value::Union(fns))
            }
        }),
    ]);
}

/// Fold over the single value held by the `present` case. Any other case
/// folds to `initial`.
fn fold_some(ty: &UnionType, present: &str, args: &[Value], method: &str) -> Result<Value, Error> {
    let f = func_arg(args, 0, method)?;
    let initial = nth(args, 1);
    let u = instance_of(ty, &subject(args), method)?;
    if u.is_case(present) {
        f.call(&[inner(&u), initial])
    } else {
        Ok(initial)
    }
}
