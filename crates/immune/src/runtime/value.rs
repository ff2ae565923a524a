use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use im::{OrdMap, Vector};

use crate::error::Error;
use crate::task::Task;
use crate::types::record::Record;
use crate::types::union::UnionValue;

// ─── Callables ────────────────────────────────────────────────────────────────

/// Signature of every native callable. Arguments are positional; a missing
/// argument reads as `Nil`.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync;

/// A named callable with a declared arity. The arity plays the role of a
/// parameter count: currying and protocol registration read it.
#[derive(Clone)]
pub struct Func {
    name:  Arc<str>,
    arity: usize,
    call:  Arc<NativeFn>,
}

impl Func {
    pub fn new(
        name: impl Into<Arc<str>>,
        arity: usize,
        f: impl Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        Self { name: name.into(), arity, call: Arc::new(f) }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn arity(&self) -> usize { self.arity }

    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        (self.call)(args)
    }

    /// Identity comparison: two `Func`s are the same if they share an implementation.
    pub fn ptr_eq(&self, other: &Func) -> bool {
        Arc::ptr_eq(&self.call, &other.call)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}/{}>", self.name, self.arity)
    }
}

// ─── Value ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vector<Value>),
    /// Plain string-keyed mapping. Keys iterate in sorted order.
    Map(OrdMap<String, Value>),
    Func(Func),
    Record(Record),
    Union(UnionValue),
    Task(Task),
    /// Marks an argument slot to be filled by a later call of a curried function.
    Placeholder,
}

/// The placeholder value for partial application.
pub const __: Value = Value::Placeholder;

// ─── Kind tags ────────────────────────────────────────────────────────────────

/// Distinguishes plain data from record and union instances. Type queries
/// consult this before falling back to constructor identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Plain,
    Record,
    Union,
}

/// Nominal type of a value: the key protocol implementations are registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Nil,
    Bool,
    Number,
    String,
    Array,
    Object,
    Function,
    Task,
    Placeholder,
    /// Fallback for any iterable subject without its own implementation.
    Iterator,
    Record(u64),
    Union(u64),
}

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Fresh identity for a record or union type.
pub(crate) fn next_type_id() -> u64 {
    NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Record(_) => Kind::Record,
            Value::Union(_)  => Kind::Union,
            _                => Kind::Plain,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Nil         => TypeKey::Nil,
            Value::Bool(_)     => TypeKey::Bool,
            Value::Number(_)   => TypeKey::Number,
            Value::Str(_)      => TypeKey::String,
            Value::List(_)     => TypeKey::Array,
            Value::Map(_)      => TypeKey::Object,
            Value::Func(_)     => TypeKey::Function,
            Value::Task(_)     => TypeKey::Task,
            Value::Placeholder => TypeKey::Placeholder,
            Value::Record(r)   => r.record_type().type_key(),
            Value::Union(u)    => u.union_type().type_key(),
        }
    }

    /// Human-readable nominal type name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Value::Nil         => "Nil".into(),
            Value::Bool(_)     => "Boolean".into(),
            Value::Number(_)   => "Number".into(),
            Value::Str(_)      => "String".into(),
            Value::List(_)     => "Array".into(),
            Value::Map(_)      => "Object".into(),
            Value::Func(_)     => "Function".into(),
            Value::Task(_)     => "Task".into(),
            Value::Placeholder => "Placeholder".into(),
            Value::Record(r)   => r.type_name().to_string(),
            Value::Union(u)    => u.type_name().to_string(),
        }
    }

    pub fn is_nil(&self) -> bool { matches!(self, Value::Nil) }

    pub fn is_placeholder(&self) -> bool { matches!(self, Value::Placeholder) }

    pub fn is_callable(&self) -> bool { matches!(self, Value::Func(_)) }

    /// Lists and strings expose generic iteration.
    pub fn is_iterable(&self) -> bool { matches!(self, Value::List(_) | Value::Str(_)) }

    pub fn as_number(&self) -> Option<f64> {
        match self { Value::Number(n) => Some(*n), _ => None }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self { Value::Bool(b) => Some(*b), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Value::Str(s) => Some(s), _ => None }
    }

    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self { Value::List(xs) => Some(xs), _ => None }
    }

    pub fn as_map(&self) -> Option<&OrdMap<String, Value>> {
        match self { Value::Map(m) => Some(m), _ => None }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self { Value::Func(f) => Some(f), _ => None }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self { Value::Record(r) => Some(r), _ => None }
    }

    pub fn as_union(&self) -> Option<&UnionValue> {
        match self { Value::Union(u) => Some(u), _ => None }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self { Value::Task(t) => Some(t), _ => None }
    }

    /// Call this value as a function.
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        match self {
            Value::Func(f) => f.call(args),
            other => Err(Error::invalid_argument("call", format!("{} is not callable", other.type_name()))),
        }
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Positional argument `i`, or `Nil` when the caller supplied fewer.
pub fn nth(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Nil)
}

// ─── Equality ─────────────────────────────────────────────────────────────────

/// Structural equality for data, identity for callables and tasks.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil)                 => true,
            (Value::Placeholder, Value::Placeholder) => true,
            (Value::Bool(a), Value::Bool(b))         => a == b,
            (Value::Number(a), Value::Number(b))     => a == b,
            (Value::Str(a), Value::Str(b))           => a == b,
            (Value::List(a), Value::List(b))         => a == b,
            (Value::Map(a), Value::Map(b))           => a == b,
            (Value::Func(a), Value::Func(b))         => a.ptr_eq(b),
            (Value::Record(a), Value::Record(b))     => a == b,
            (Value::Union(a), Value::Union(b))       => a == b,
            (Value::Task(a), Value::Task(b))         => a.ptr_eq(b),
            _ => false,
        }
    }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// Renders through the `show` protocol, so user types print the way they registered.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match crate::protocols::core::show(self) {
            Ok(s)  => f.write_str(&s),
            Err(_) => write!(f, "<{}>", self.type_name()),
        }
    }
}

// ─── Conversions ──────────────────────────────────────────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Value::Number(n) }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self { Value::Number(n as f64) }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self { Value::Number(n as f64) }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_string()) }
}

impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}

impl From<Vec<Value>> for Value {
    fn from(xs: Vec<Value>) -> Self { Value::List(xs.into_iter().collect()) }
}

impl From<Func> for Value {
    fn from(f: Func) -> Self { Value::Func(f) }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self { Value::Record(r) }
}

impl From<UnionValue> for Value {
    fn from(u: UnionValue) -> Self { Value::Union(u) }
}

impl From<Task> for Value {
    fn from(t: Task) -> Self { Value::Task(t) }
}
