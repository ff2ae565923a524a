//! Generic collection utilities built on the standard protocols.
//!
//! Nothing here knows about concrete types: each function works for any value
//! whose type implements the protocols it dispatches through.

use crate::error::Error;
use crate::protocols::core::{self as p, IKEYED, ILOOKUP};
use crate::protocols::implements_protocol;
use crate::runtime::curry::curry;
use crate::runtime::value::{Func, Value, nth};
use crate::types::adt::{Maybe, maybe};

/// `Nil` and `false` are falsy; everything else is truthy.
pub fn truthy(v: &Value) -> bool {
    !matches!(v, Value::Nil | Value::Bool(false))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

/// The value under `key`, or `fallback` when absent.
pub fn get_or_else(key: Value, fallback: Value, xs: &Value) -> Result<Value, Error> {
    Maybe::get_or(fallback, &p::get(key, xs)?)
}

/// Follow `path` through nested collections. `Some` of the innermost value,
/// or `None` as soon as a key is missing. An empty path yields `Some(xs)`.
pub fn get_in(path: &[Value], xs: &Value) -> Result<Value, Error> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(maybe(xs.clone()));
    };
    let found = p::get(key.clone(), xs)?;
    if rest.is_empty() {
        return Ok(found);
    }
    match found.as_union().filter(|u| u.is_case("Some")) {
        Some(u) => get_in(rest, &nth(u.values(), 0)),
        None => Ok(Maybe::none()),
    }
}

/// `assoc` along a path. Missing intermediate levels are created empty, of the
/// same collection type as their parent.
pub fn assoc_in(path: &[Value], val: Value, xs: &Value) -> Result<Value, Error> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(val);
    };
    if rest.is_empty() {
        return p::assoc(key.clone(), val, xs);
    }
    let child = match get_or_else(key.clone(), Value::Nil, xs)? {
        Value::Nil => p::empty(xs)?,
        found => found,
    };
    p::assoc(key.clone(), assoc_in(rest, val, &child)?, xs)
}

/// `dissoc` along a path. Missing intermediate levels leave `xs` unchanged.
pub fn dissoc_in(path: &[Value], xs: &Value) -> Result<Value, Error> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(xs.clone());
    };
    if rest.is_empty() {
        return p::dissoc(key.clone(), xs);
    }
    match get_or_else(key.clone(), Value::Nil, xs)? {
        Value::Nil => Ok(xs.clone()),
        child => p::assoc(key.clone(), dissoc_in(rest, &child)?, xs),
    }
}

/// The innermost value along `path`, or `fallback` when the path breaks.
pub fn get_in_or_else(path: &[Value], fallback: Value, xs: &Value) -> Result<Value, Error> {
    Maybe::get_or(fallback, &get_in(path, xs)?)
}

/// Apply a nested set of `changes` to `xs`. A mapping recurses into the value
/// under its key, a function replaces that value with `f(current)`, and
/// anything else replaces it outright.
///
///   evolve({ counters: { b: inc } }, { counters: { a: 0, b: 0 } })
///     => { counters: { a: 0, b: 1 } }
pub fn evolve(changes: &Value, xs: &Value) -> Result<Value, Error> {
    key_list(changes)?.into_iter().try_fold(xs.clone(), |acc, k| {
        let change = get_or_else(k.clone(), Value::Nil, changes)?;
        let next = match &change {
            Value::Map(_) => evolve(&change, &get_or_else(k.clone(), p::empty(&acc)?, &acc)?)?,
            Value::Func(f) => f.call(&[get_or_else(k.clone(), Value::Nil, &acc)?])?,
            _ => change.clone(),
        };
        p::assoc(k, next, &acc)
    })
}

// ─── Folds ────────────────────────────────────────────────────────────────────

/// Keys of `xs` as a plain vector.
fn key_list(xs: &Value) -> Result<Vec<Value>, Error> {
    match p::keys(xs)? {
        Value::List(ks) => Ok(ks.into_iter().collect()),
        other => Err(Error::type_mismatch("keys", "an Array of keys", other.type_name())),
    }
}

/// Fold over key/value pairs in key order. `f` is called as `f(key, value, acc)`.
pub fn foldl_kv(f: &Func, initial: Value, xs: &Value) -> Result<Value, Error> {
    key_list(xs)?.into_iter().try_fold(initial, |acc, k| {
        let v = get_or_else(k.clone(), Value::Nil, xs)?;
        f.call(&[k, v, acc])
    })
}

/// Right-to-left counterpart of [`foldl_kv`].
pub fn foldr_kv(f: &Func, initial: Value, xs: &Value) -> Result<Value, Error> {
    key_list(xs)?.into_iter().rev().try_fold(initial, |acc, k| {
        let v = get_or_else(k.clone(), Value::Nil, xs)?;
        f.call(&[k, v, acc])
    })
}

/// True when `f(value)` is truthy for some value. `f` is not called again
/// once a match is found.
pub fn any(f: &Func, xs: &Value) -> Result<bool, Error> {
    let f = f.clone();
    let step = Func::new("any", 2, move |args| {
        let hit = truthy(&nth(args, 1)) || truthy(&f.call(&[nth(args, 0)])?);
        Ok(Value::Bool(hit))
    });
    Ok(truthy(&p::foldl(&step, Value::Bool(false), xs)?))
}

/// True when `f(value)` is truthy for every value. Vacuously true when empty.
pub fn every(f: &Func, xs: &Value) -> Result<bool, Error> {
    let f = f.clone();
    let step = Func::new("every", 2, move |args| {
        let kept = truthy(&nth(args, 1)) && truthy(&f.call(&[nth(args, 0)])?);
        Ok(Value::Bool(kept))
    });
    Ok(truthy(&p::foldl(&step, Value::Bool(true), xs)?))
}

// ─── Filtering ────────────────────────────────────────────────────────────────

fn keep_kv(f: &Func, keep: bool, xs: &Value) -> Result<Value, Error> {
    let keyed = matches!(xs, Value::Map(_));
    key_list(xs)?.into_iter().try_fold(p::empty(xs)?, |acc, k| {
        let v = get_or_else(k.clone(), Value::Nil, xs)?;
        if truthy(&f.call(&[k.clone(), v.clone()])?) != keep {
            return Ok(acc);
        }
        let entry = if keyed { Value::list([k, v]) } else { v };
        p::conj(entry, &acc)
    })
}

/// Keep the entries for which `f(key, value)` is truthy. The result has the
/// type of `xs`.
pub fn filter_kv(f: &Func, xs: &Value) -> Result<Value, Error> {
    keep_kv(f, true, xs)
}

/// Drop the entries for which `f(key, value)` is truthy.
pub fn remove_kv(f: &Func, xs: &Value) -> Result<Value, Error> {
    keep_kv(f, false, xs)
}

fn on_value(f: &Func) -> Func {
    let f = f.clone();
    Func::new(f.name().to_string(), 2, move |args| f.call(&[nth(args, 1)]))
}

/// Keep the values for which `f(value)` is truthy.
pub fn filter(f: &Func, xs: &Value) -> Result<Value, Error> {
    filter_kv(&on_value(f), xs)
}

/// Drop the values for which `f(value)` is truthy.
pub fn remove(f: &Func, xs: &Value) -> Result<Value, Error> {
    remove_kv(&on_value(f), xs)
}

// ─── Reshaping ────────────────────────────────────────────────────────────────

/// The first `n` values `xs` iterates over, as a list.
pub fn take(n: usize, xs: &Value) -> Result<Value, Error> {
    Ok(Value::List(p::iterator(xs)?.into_iter().take(n).collect()))
}

/// Pour every value of `from` into `to` with `conj`.
pub fn into(to: Value, from: &Value) -> Result<Value, Error> {
    let conj = Func::new("conj", 2, |args| p::conj(nth(args, 0), &nth(args, 1)));
    p::foldl(&conj, to, from)
}

/// Every value of `xs`, in fold order, as a list.
pub fn vals(xs: &Value) -> Result<Value, Error> {
    let push = Func::new("push", 2, |args| match nth(args, 1) {
        Value::List(mut acc) => {
            acc.push_back(nth(args, 0));
            Ok(Value::List(acc))
        }
        other => Err(Error::type_mismatch("vals", "an Array accumulator", other.type_name())),
    });
    p::foldl(&push, Value::list([]), xs)
}

/// `[key, value]` pairs of `xs`, in key order.
pub fn kvp(xs: &Value) -> Result<Value, Error> {
    let pairs = key_list(xs)?.into_iter()
        .map(|k| Ok(Value::list([k.clone(), get_or_else(k, Value::Nil, xs)?])))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(Value::from(pairs))
}

/// Group the values at each position across `xss`. Stops at the shortest.
///
///   zip(&[["x", "y"], [1, 2]]) => [["x", 1], ["y", 2]]
pub fn zip(xss: &[Value]) -> Result<Value, Error> {
    let shortest = xss.iter().map(p::count).collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .min()
        .unwrap_or(0);
    let rows = (0..shortest)
        .map(|i| {
            let row = xss.iter()
                .map(|xs| get_or_else(Value::from(i), Value::Nil, xs))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(Value::from(row))
        })
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(Value::from(rows))
}

// ─── Functions ────────────────────────────────────────────────────────────────

/// `map` followed by `flatten`.
pub fn and_then(f: &Func, m: &Value) -> Result<Value, Error> {
    p::flatten(&p::map(f, m)?)
}

/// Left-to-right composition: `pipe([f, g])(x) == g(f(x))`. The first function
/// receives every argument. An empty list gives a one-argument identity.
pub fn pipe(fns: Vec<Func>) -> Func {
    let arity = fns.first().map(Func::arity).unwrap_or(1);
    Func::new("pipe", arity, move |args| {
        let Some((head, tail)) = fns.split_first() else {
            return Ok(args.first().cloned().unwrap_or(Value::Nil));
        };
        tail.iter().try_fold(head.call(args)?, |acc, f| f.call(&[acc]))
    })
}

/// Right-to-left composition: `comp([f, g])(x) == f(g(x))`.
pub fn comp(mut fns: Vec<Func>) -> Func {
    fns.reverse();
    pipe(fns)
}

/// Apply a two-argument function inside two applicatives of the same type.
///
///   lift_a2(&add, &Maybe::some(1), &Maybe::some(2)) => Maybe.Some(3)
pub fn lift_a2(f: &Func, a: &Value, b: &Value) -> Result<Value, Error> {
    let partials = p::map(&curry(f.clone()), a)?;
    p::ap(b, &partials)
}

// ─── Equality ─────────────────────────────────────────────────────────────────

/// Plain value equality: structural for data, identity for functions and tasks.
pub fn equal(a: &Value, b: &Value) -> bool {
    a == b
}

fn is_keyed(a: &Value, b: &Value) -> bool {
    a.type_key() == b.type_key() && implements_protocol(&ILOOKUP, a) && implements_protocol(&IKEYED, b)
}

/// Same key count and every key of `b` present in `a`. A key holding `Nil`
/// counts as present, so it is never confused with a missing one.
fn same_keys(a: &Value, b: &Value) -> Result<Option<Vec<Value>>, Error> {
    let (a_keys, b_keys) = (key_list(a)?, key_list(b)?);
    if a_keys.len() != b_keys.len() || !b_keys.iter().all(|k| a_keys.contains(k)) {
        return Ok(None);
    }
    Ok(Some(b_keys))
}

/// One level of key-by-key comparison, then plain equality for the values.
pub fn shallow_equal(a: &Value, b: &Value) -> Result<bool, Error> {
    if a.is_nil() || b.is_nil() {
        return Ok(a.is_nil() && b.is_nil());
    }
    if !is_keyed(a, b) {
        return Ok(equal(a, b));
    }
    let Some(keys) = same_keys(a, b)? else { return Ok(false) };
    for k in keys {
        if !equal(&get_or_else(k.clone(), Value::Nil, a)?, &get_or_else(k, Value::Nil, b)?) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Key-by-key comparison, recursing through every keyed collection.
///
///   deep_equal({ a: [1, 2] }, { a: [1, 2] }) => true
///   deep_equal("1", 1)                       => false
pub fn deep_equal(a: &Value, b: &Value) -> Result<bool, Error> {
    if a.is_nil() || b.is_nil() {
        return Ok(a.is_nil() && b.is_nil());
    }
    if matches!(a, Value::Str(_)) || matches!(b, Value::Str(_)) || !is_keyed(a, b) {
        return Ok(equal(a, b));
    }
    let Some(keys) = same_keys(a, b)? else { return Ok(false) };
    for k in keys {
        if !deep_equal(&get_or_else(k.clone(), Value::Nil, a)?, &get_or_else(k, Value::Nil, b)?)? {
            return Ok(false);
        }
    }
    Ok(true)
}
