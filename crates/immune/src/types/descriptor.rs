//! Type descriptors and the `is` predicate.
//!
//! A descriptor is anything that can stand in for a type when validating a
//! value: primitive sentinels, record and union types, structural shapes,
//! single-element array shapes, `OneOf` sets and `Any`.

use crate::runtime::value::{Kind, Value};
use crate::types::record::RecordType;

// ─── Descriptors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// Matches every value.
    Any,
    /// The null-type sentinel.
    Nil,
    Bool,
    Number,
    String,
    /// Any list.
    Array,
    /// Any plain mapping.
    Object,
    Function,
    Task,
    /// Matches a value equal to the one given.
    Literal(Value),
    /// Matches if any member matches. An empty set matches nothing.
    OneOf(Vec<TypeDescriptor>),
    Record(RecordType),
    Union(UnionPattern),
    /// Every element of a list must match.
    ArrayOf(Box<TypeDescriptor>),
    /// Every listed key must exist on a mapping and match. Extra keys are ignored.
    Shape(Vec<(String, TypeDescriptor)>),
}

/// Union descriptor. Each part left as `None` is unrestricted.
#[derive(Debug, Clone, Default)]
pub struct UnionPattern {
    pub name:   Option<String>,
    pub case:   Option<String>,
    pub fields: Option<Vec<TypeDescriptor>>,
}

pub fn one_of(types: impl IntoIterator<Item = TypeDescriptor>) -> TypeDescriptor {
    TypeDescriptor::OneOf(types.into_iter().collect())
}

pub fn array_of(ty: TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor::ArrayOf(Box::new(ty))
}

pub fn shape<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeDescriptor)>) -> TypeDescriptor {
    TypeDescriptor::Shape(fields.into_iter().map(|(k, t)| (k.into(), t)).collect())
}

/// Matches an instance of any union type.
pub fn any_union() -> TypeDescriptor {
    TypeDescriptor::Union(UnionPattern::default())
}

// ─── Predicate ────────────────────────────────────────────────────────────────

/// Does `v` conform to `ty`? Rules are tried in order and the first that
/// applies decides.
pub fn is(ty: &TypeDescriptor, v: &Value) -> bool {
    use TypeDescriptor as T;

    if v.is_nil() && matches!(ty, T::Nil) {
        return true;
    }

    match ty {
        T::Any => return true,
        T::Literal(x) if x == v => return true,
        T::Function if v.is_callable() => return true,
        T::OneOf(types) => return types.iter().any(|t| is(t, v)),
        T::Record(rt) => {
            if let Value::Record(r) = v {
                if r.type_name() == rt.name() {
                    return true;
                }
            }
        }
        _ => {}
    }

    if let (T::Union(p), Value::Union(u)) = (ty, v) {
        let case_ok = p.case.as_deref().is_none_or(|c| c == u.case());
        let name_ok = p.name.as_deref().is_none_or(|n| n == u.type_name());
        if case_ok && name_ok {
            return match &p.fields {
                Some(fields) => fields.iter().enumerate().all(|(i, t)| {
                    is(t, u.values().get(i).unwrap_or(&Value::Nil))
                }),
                None => true,
            };
        }
    }

    match (ty, v) {
        (T::ArrayOf(elem), Value::List(xs)) => return xs.iter().all(|x| is(elem, x)),
        (T::Shape(fields), Value::Map(m)) => {
            return fields.iter().all(|(k, t)| m.get(k).is_some_and(|x| is(t, x)));
        }
        _ => {}
    }

    // Constructor identity. Tagged values never match this way.
    v.kind() == Kind::Plain && matches!(
        (ty, v),
        (T::Bool,     Value::Bool(_))
        | (T::Number, Value::Number(_))
        | (T::String, Value::Str(_))
        | (T::Array,  Value::List(_))
        | (T::Object, Value::Map(_))
        | (T::Task,   Value::Task(_))
    )
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// Render a descriptor for error messages.
pub fn show_type(ty: &TypeDescriptor) -> String {
    use TypeDescriptor as T;
    match ty {
        T::Any      => "Any".into(),
        T::Nil      => "Null".into(),
        T::Bool     => "Boolean".into(),
        T::Number   => "Number".into(),
        T::String   => "String".into(),
        T::Array    => "Array".into(),
        T::Object   => "Object".into(),
        T::Function => "Function".into(),
        T::Task     => "Task".into(),
        T::Literal(v) => v.to_string(),
        T::OneOf(types) => format!("OneOf({})", join_types(types)),
        T::Record(rt) => rt.name().to_string(),
        T::Union(p) => {
            let base = match (&p.name, &p.case) {
                (Some(n), Some(c)) => format!("{n}.{c}"),
                (Some(n), None)    => n.clone(),
                (None, Some(c))    => format!("Union.{c}"),
                (None, None)       => "Union".into(),
            };
            match &p.fields {
                Some(fields) => format!("{base}({})", join_types(fields)),
                None => base,
            }
        }
        T::ArrayOf(elem) => format!("[ {} ]", show_type(elem)),
        T::Shape(fields) => {
            let inner = fields.iter()
                .map(|(k, t)| format!("{k}: {}", show_type(t)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{ {inner} }}")
        }
    }
}

fn join_types(types: &[TypeDescriptor]) -> String {
    types.iter().map(show_type).collect::<Vec<_>>().join(", ")
}
