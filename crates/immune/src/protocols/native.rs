//! Protocol implementations for the built-in value types.
//!
//! Installed into the process-wide registry when it is first touched.
//! Every implementation receives its subject as the last argument.

use im::{OrdMap, Vector};

use crate::error::Error;
use crate::protocols::ProtocolRegistry;
use crate::protocols::core as p;
use crate::runtime::value::{Func, TypeKey, Value, nth};
use crate::task::{Task, failure_value};
use crate::types::adt::maybe;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn m(name: &'static str, arity: usize, f: impl Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static) -> Func {
    Func::new(name, arity, f)
}

fn subject(args: &[Value]) -> Value {
    nth(args, args.len().saturating_sub(1))
}

fn got(v: Option<&Value>) -> String {
    v.map(Value::type_name).unwrap_or_else(|| "nothing".into())
}

fn list_subject(args: &[Value], method: &str) -> Result<Vector<Value>, Error> {
    match args.last() {
        Some(Value::List(xs)) => Ok(xs.clone()),
        other => Err(Error::type_mismatch(method, "an Array", got(other))),
    }
}

fn str_subject(args: &[Value], method: &str) -> Result<String, Error> {
    match args.last() {
        Some(Value::Str(s)) => Ok(s.clone()),
        other => Err(Error::type_mismatch(method, "a String", got(other))),
    }
}

fn map_subject(args: &[Value], method: &str) -> Result<OrdMap<String, Value>, Error> {
    match args.last() {
        Some(Value::Map(entries)) => Ok(entries.clone()),
        other => Err(Error::type_mismatch(method, "an Object", got(other))),
    }
}

fn task_subject(args: &[Value], method: &str) -> Result<Task, Error> {
    match args.last() {
        Some(Value::Task(t)) => Ok(t.clone()),
        other => Err(Error::type_mismatch(method, "a Task", got(other))),
    }
}

fn func_arg(args: &[Value], i: usize, method: &str) -> Result<Func, Error> {
    match args.get(i) {
        Some(Value::Func(f)) => Ok(f.clone()),
        other => Err(Error::type_mismatch(method, "a Function", got(other))),
    }
}

/// Non-negative integral numbers address list and string positions.
fn index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        _ => None,
    }
}

/// Mapping keys are strings; numbers are accepted and rendered.
fn map_key(key: &Value, method: &str) -> Result<String, Error> {
    match key {
        Value::Str(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(Error::invalid_argument(method, format!(
            "object keys must be strings or numbers, got {}", other.type_name()
        ))),
    }
}

/// String concatenation operand: strings as-is, anything else rendered.
fn text(v: &Value) -> Result<String, Error> {
    match v {
        Value::Str(s) => Ok(s.clone()),
        other => p::show(other),
    }
}

fn chars(s: &str) -> impl DoubleEndedIterator<Item = Value> + '_ {
    s.chars().map(|c| Value::Str(c.to_string()))
}

fn fold(f: &Func, initial: Value, items: impl Iterator<Item = Value>) -> Result<Value, Error> {
    items.into_iter().try_fold(initial, |acc, v| f.call(&[v, acc]))
}

fn show_all<'a>(items: impl Iterator<Item = &'a Value>) -> Result<Vec<String>, Error> {
    items.map(p::show).collect()
}

fn identity(name: &'static str) -> Func {
    m(name, 1, |args| Ok(subject(args)))
}

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn register_nil(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Nil, vec![
        m("show", 1, |_| Ok(Value::from("Nil"))),
        identity("clone"),
        identity("shallow_clone"),
    ]);
}

pub fn register_bool(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Bool, vec![
        m("show", 1, |args| Ok(Value::Str(subject(args).as_bool().unwrap_or_default().to_string()))),
        identity("clone"),
        identity("shallow_clone"),
    ]);
}

pub fn register_number(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Number, vec![
        m("show", 1, |args| Ok(Value::Str(subject(args).as_number().unwrap_or_default().to_string()))),
        identity("clone"),
        identity("shallow_clone"),
    ]);
}

pub fn register_function(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Function, vec![
        m("show", 1, |args| Ok(Value::Str(match subject(args) {
            Value::Func(f) => format!("[Function {}]", f.name()),
            _ => "[Function]".into(),
        }))),
        identity("clone"),
        identity("shallow_clone"),
    ]);
    r.extend(&TypeKey::Placeholder, vec![
        m("show", 1, |_| Ok(Value::from("__"))),
    ]);
}

// ─── Lists ────────────────────────────────────────────────────────────────────

pub fn register_list(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Array, vec![
        m("show", 1, |args| {
            let xs = list_subject(args, "show")?;
            if xs.is_empty() {
                return Ok(Value::from("[]"));
            }
            Ok(Value::Str(format!("[ {} ]", show_all(xs.iter())?.join(", "))))
        }),
        m("clone", 1, |args| {
            let xs = list_subject(args, "clone")?;
            Ok(Value::List(xs.iter().map(p::clone).collect::<Result<_, _>>()?))
        }),
        identity("shallow_clone"),
        m("count", 1, |args| Ok(Value::from(list_subject(args, "count")?.len()))),
        m("get", 2, |args| {
            let xs = list_subject(args, "get")?;
            let found = index(&nth(args, 0)).and_then(|i| xs.get(i)).cloned();
            Ok(maybe(found.unwrap_or(Value::Nil)))
        }),
        m("first", 1, |args| {
            let xs = list_subject(args, "first")?;
            Ok(maybe(xs.front().cloned().unwrap_or(Value::Nil)))
        }),
        m("rest", 1, |args| {
            let xs = list_subject(args, "rest")?;
            Ok(Value::List(xs.into_iter().skip(1).collect()))
        }),
        m("conj", 2, |args| {
            let mut xs = list_subject(args, "conj")?;
            xs.push_back(nth(args, 0));
            Ok(Value::List(xs))
        }),
        m("iterator", 1, |args| Ok(Value::List(list_subject(args, "iterator")?))),
        m("keys", 1, |args| {
            let xs = list_subject(args, "keys")?;
            Ok(Value::list((0..xs.len()).map(Value::from)))
        }),
        m("assoc", 3, |args| {
            let mut xs = list_subject(args, "assoc")?;
            if let Some(i) = index(&nth(args, 0)).filter(|i| *i < xs.len()) {
                xs.set(i, nth(args, 1));
            }
            Ok(Value::List(xs))
        }),
        m("dissoc", 2, |args| {
            let mut xs = list_subject(args, "dissoc")?;
            if let Some(i) = index(&nth(args, 0)).filter(|i| *i < xs.len()) {
                xs.remove(i);
            }
            Ok(Value::List(xs))
        }),
        m("empty", 1, |_| Ok(Value::List(Vector::new()))),
        m("append", 2, |args| {
            let mut xs = list_subject(args, "append")?;
            match nth(args, 0) {
                Value::List(ys) => xs.append(ys),
                x => xs.push_back(x),
            }
            Ok(Value::List(xs))
        }),
        m("foldl", 3, |args| {
            let f = func_arg(args, 0, "foldl")?;
            let xs = list_subject(args, "foldl")?;
            fold(&f, nth(args, 1), xs.into_iter())
        }),
        m("foldr", 3, |args| {
            let f = func_arg(args, 0, "foldr")?;
            let xs = list_subject(args, "foldr")?;
            fold(&f, nth(args, 1), xs.into_iter().rev())
        }),
        m("map", 2, |args| {
            let f = func_arg(args, 0, "map")?;
            let xs = list_subject(args, "map")?;
            Ok(Value::List(xs.into_iter().map(|x| f.call(&[x])).collect::<Result<_, _>>()?))
        }),
        m("of", 2, |args| Ok(Value::list([nth(args, 0)]))),
        m("flatten", 1, |args| {
            let xs = list_subject(args, "flatten")?;
            let mut flat = Vector::new();
            for x in xs {
                match x {
                    Value::List(inner) => flat.append(inner),
                    other => flat.push_back(other),
                }
            }
            Ok(Value::List(flat))
        }),
        // Every function in the subject applied to every value of the first argument.
        m("ap", 2, |args| {
            let values = nth(args, 0);
            let fns = list_subject(args, "ap")?;
            let mut out = Vector::new();
            for f in fns {
                let f = f.as_func().cloned()
                    .ok_or_else(|| Error::type_mismatch("ap", "an Array of functions", f.type_name()))?;
                match p::map(&f, &values)? {
                    Value::List(ys) => out.append(ys),
                    other => out.push_back(other),
                }
            }
            Ok(Value::List(out))
        }),
    ]);
}

// ─── Strings ──────────────────────────────────────────────────────────────────

pub fn register_string(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::String, vec![
        m("show", 1, |args| Ok(Value::Str(format!("\"{}\"", str_subject(args, "show")?)))),
        identity("clone"),
        identity("shallow_clone"),
        m("count", 1, |args| Ok(Value::from(str_subject(args, "count")?.chars().count()))),
        m("get", 2, |args| {
            let s = str_subject(args, "get")?;
            let found = index(&nth(args, 0)).and_then(|i| chars(&s).nth(i));
            Ok(maybe(found.unwrap_or(Value::Nil)))
        }),
        m("first", 1, |args| {
            let s = str_subject(args, "first")?;
            Ok(maybe(chars(&s).next().unwrap_or(Value::Nil)))
        }),
        m("rest", 1, |args| Ok(Value::Str(str_subject(args, "rest")?.chars().skip(1).collect()))),
        m("conj", 2, |args| {
            let s = str_subject(args, "conj")?;
            Ok(Value::Str(s + &text(&nth(args, 0))?))
        }),
        m("iterator", 1, |args| Ok(Value::list(chars(&str_subject(args, "iterator")?)))),
        m("keys", 1, |args| {
            let n = str_subject(args, "keys")?.chars().count();
            Ok(Value::list((0..n).map(Value::from)))
        }),
        m("assoc", 3, |args| {
            let s = str_subject(args, "assoc")?;
            let at = index(&nth(args, 0));
            let replacement = text(&nth(args, 1))?;
            let mut out = String::new();
            for (i, c) in s.chars().enumerate() {
                if Some(i) == at { out.push_str(&replacement) } else { out.push(c) }
            }
            Ok(Value::Str(out))
        }),
        m("dissoc", 2, |args| {
            let s = str_subject(args, "dissoc")?;
            let at = index(&nth(args, 0));
            Ok(Value::Str(s.chars().enumerate().filter(|(i, _)| Some(*i) != at).map(|(_, c)| c).collect()))
        }),
        m("empty", 1, |_| Ok(Value::from(""))),
        m("append", 2, |args| {
            let s = str_subject(args, "append")?;
            Ok(Value::Str(s + &text(&nth(args, 0))?))
        }),
        m("foldl", 3, |args| {
            let f = func_arg(args, 0, "foldl")?;
            let s = str_subject(args, "foldl")?;
            fold(&f, nth(args, 1), chars(&s))
        }),
        m("foldr", 3, |args| {
            let f = func_arg(args, 0, "foldr")?;
            let s = str_subject(args, "foldr")?;
            fold(&f, nth(args, 1), chars(&s).rev())
        }),
        m("map", 2, |args| {
            let f = func_arg(args, 0, "map")?;
            let s = str_subject(args, "map")?;
            let mut out = String::new();
            for c in chars(&s) {
                out.push_str(&text(&f.call(&[c])?)?);
            }
            Ok(Value::Str(out))
        }),
        m("of", 2, |args| Ok(Value::Str(text(&nth(args, 0))?))),
        identity("flatten"),
    ]);
}

// ─── Mappings ─────────────────────────────────────────────────────────────────

pub fn register_map(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Object, vec![
        m("show", 1, |args| {
            let entries = map_subject(args, "show")?;
            if entries.is_empty() {
                return Ok(Value::from("{}"));
            }
            let parts = entries.iter()
                .map(|(k, v)| Ok(format!("{k}: {}", p::show(v)?)))
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(Value::Str(format!("{{ {} }}", parts.join(", "))))
        }),
        m("clone", 1, |args| {
            let entries = map_subject(args, "clone")?;
            let cloned = entries.into_iter()
                .map(|(k, v)| Ok((k, p::clone(&v)?)))
                .collect::<Result<OrdMap<_, _>, Error>>()?;
            Ok(Value::Map(cloned))
        }),
        identity("shallow_clone"),
        m("count", 1, |args| Ok(Value::from(map_subject(args, "count")?.len()))),
        m("keys", 1, |args| {
            let entries = map_subject(args, "keys")?;
            Ok(Value::list(entries.keys().map(|k| Value::Str(k.clone()))))
        }),
        m("get", 2, |args| {
            let entries = map_subject(args, "get")?;
            let found = map_key(&nth(args, 0), "get").ok().and_then(|k| entries.get(&k).cloned());
            Ok(maybe(found.unwrap_or(Value::Nil)))
        }),
        m("assoc", 3, |args| {
            let entries = map_subject(args, "assoc")?;
            let key = map_key(&nth(args, 0), "assoc")?;
            Ok(Value::Map(entries.update(key, nth(args, 1))))
        }),
        m("dissoc", 2, |args| {
            let entries = map_subject(args, "dissoc")?;
            let key = map_key(&nth(args, 0), "dissoc")?;
            Ok(Value::Map(entries.without(&key)))
        }),
        m("first", 1, |args| {
            let entries = map_subject(args, "first")?;
            Ok(maybe(entries.get_min().map(|(_, v)| v.clone()).unwrap_or(Value::Nil)))
        }),
        m("rest", 1, |args| {
            let entries = map_subject(args, "rest")?;
            Ok(Value::Map(match entries.get_min() {
                Some((k, _)) => entries.without(k),
                None => entries.clone(),
            }))
        }),
        m("conj", 2, |args| merge(nth(args, 0), map_subject(args, "conj")?, "conj")),
        m("empty", 1, |_| Ok(Value::Map(OrdMap::new()))),
        m("append", 2, |args| merge(nth(args, 0), map_subject(args, "append")?, "append")),
        m("foldl", 3, |args| {
            let f = func_arg(args, 0, "foldl")?;
            let entries = map_subject(args, "foldl")?;
            fold(&f, nth(args, 1), entries.values().cloned())
        }),
        m("foldr", 3, |args| {
            let f = func_arg(args, 0, "foldr")?;
            let entries = map_subject(args, "foldr")?;
            fold(&f, nth(args, 1), entries.values().cloned().collect::<Vec<_>>().into_iter().rev())
        }),
        m("map", 2, |args| {
            let f = func_arg(args, 0, "map")?;
            let entries = map_subject(args, "map")?;
            let mapped = entries.into_iter()
                .map(|(k, v)| Ok((k, f.call(&[v])?)))
                .collect::<Result<OrdMap<_, _>, Error>>()?;
            Ok(Value::Map(mapped))
        }),
    ]);
}

/// Add a `[key, value]` pair, or every entry of another mapping, to `entries`.
fn merge(x: Value, entries: OrdMap<String, Value>, method: &str) -> Result<Value, Error> {
    match x {
        Value::List(pair) if pair.len() == 2 => {
            let key = map_key(&pair[0], method)?;
            Ok(Value::Map(entries.update(key, pair[1].clone())))
        }
        Value::Map(other) => Ok(Value::Map(other.union(entries))),
        other => Err(Error::type_mismatch(method, "a [key, value] pair or an Object", other.type_name())),
    }
}

// ─── Tasks ────────────────────────────────────────────────────────────────────

fn call_in_task(f: &Func, args: &[Value]) -> Task {
    match f.call(args) {
        Ok(v) => Task::of(v),
        Err(err) => Task::fail(failure_value(&err)),
    }
}

pub fn register_task(r: &mut ProtocolRegistry) {
    r.extend(&TypeKey::Task, vec![
        m("show", 1, |_| Ok(Value::from("Task {}"))),
        m("clone", 1, |args| Ok(Value::Task(task_subject(args, "clone")?.try_map(|v| p::clone(&v))))),
        identity("shallow_clone"),
        m("foldl", 3, |args| fold_task(args, "foldl")),
        m("foldr", 3, |args| fold_task(args, "foldr")),
        m("map", 2, |args| {
            let f = func_arg(args, 0, "map")?;
            Ok(Value::Task(task_subject(args, "map")?.try_map(move |v| f.call(&[v]))))
        }),
        m("bimap", 3, |args| {
            let f = func_arg(args, 0, "bimap")?;
            let g = func_arg(args, 1, "bimap")?;
            let t = task_subject(args, "bimap")?;
            Ok(Value::Task(t.chain(move |outcome| match outcome {
                Ok(v) => call_in_task(&f, &[v]),
                Err(e) => match g.call(&[e]) {
                    Ok(mapped) => Task::fail(mapped),
                    Err(err) => Task::fail(failure_value(&err)),
                },
            })))
        }),
        m("of", 2, |args| Ok(Value::Task(Task::of(nth(args, 0))))),
        m("flatten", 1, |args| Ok(Value::Task(task_subject(args, "flatten")?.flatten()))),
        // The subject task yields a function applied to the first task's value.
        m("ap", 2, |args| {
            let values = match nth(args, 0) {
                Value::Task(t) => t,
                other => return Err(Error::type_mismatch("ap", "a Task", other.type_name())),
            };
            let fns = task_subject(args, "ap")?;
            Ok(Value::Task(fns.try_and_then(move |f| {
                let f = f.as_func().cloned()
                    .ok_or_else(|| Error::type_mismatch("ap", "a Task of a function", f.type_name()))?;
                Ok(values.try_map(move |v| f.call(&[v])))
            })))
        }),
    ]);
}

/// A task holds at most one value, so both folds coincide. Failure folds to `initial`.
fn fold_task(args: &[Value], method: &str) -> Result<Value, Error> {
    let f = func_arg(args, 0, method)?;
    let initial = nth(args, 1);
    let t = task_subject(args, method)?;
    Ok(Value::Task(t.chain(move |outcome| match outcome {
        Ok(v) => call_in_task(&f, &[v, initial.clone()]),
        Err(_) => Task::of(initial.clone()),
    })))
}
