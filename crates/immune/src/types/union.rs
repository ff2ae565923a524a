//! Union types: named, closed sets of cases with per-case field lists,
//! plus exhaustive matching over their instances.
//!
//!   let shape = UnionType::new("Shape", [
//!       ("Circle", vec![TypeDescriptor::Number]),
//!       ("Rect",   vec![TypeDescriptor::Number, TypeDescriptor::Number]),
//!   ]);
//!   let c = shape.construct("Circle", vec![2.0.into()])?;

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Violation};
use crate::protocols::{self, core::ISHOW};
use crate::runtime::curry::curry_n;
use crate::runtime::value::{Func, TypeKey, Value, next_type_id};
use crate::types::descriptor::{TypeDescriptor, UnionPattern, is, show_type};

/// Handler key that matches any case.
pub const WILDCARD: &str = "_";

// ─── Type ─────────────────────────────────────────────────────────────────────

struct UnionTypeInner {
    id:    u64,
    name:  String,
    cases: Vec<(String, Vec<TypeDescriptor>)>,
}

#[derive(Clone)]
pub struct UnionType(Arc<UnionTypeInner>);

impl UnionType {
    /// Declare a union type and register its `show` implementation.
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        cases: impl IntoIterator<Item = (K, Vec<TypeDescriptor>)>,
    ) -> Self {
        let ty = Self(Arc::new(UnionTypeInner {
            id:    next_type_id(),
            name:  name.into(),
            cases: cases.into_iter().map(|(k, fields)| (k.into(), fields)).collect(),
        }));
        register_protocols(&ty);
        ty
    }

    pub fn name(&self) -> &str { &self.0.name }

    pub fn type_key(&self) -> TypeKey { TypeKey::Union(self.0.id) }

    pub fn case_names(&self) -> impl Iterator<Item = &str> {
        self.0.cases.iter().map(|(k, _)| k.as_str())
    }

    pub fn case_fields(&self, case: &str) -> Option<&[TypeDescriptor]> {
        self.0.cases.iter().find(|(k, _)| k == case).map(|(_, f)| f.as_slice())
    }

    pub fn has_case(&self, case: &str) -> bool {
        self.case_fields(case).is_some()
    }

    /// Is `v` an instance of this union (any case)?
    pub fn contains(&self, v: &Value) -> bool {
        matches!(v, Value::Union(u) if u.union_type().0.id == self.0.id)
    }

    /// Matches any instance of this union.
    pub fn descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::Union(UnionPattern { name: Some(self.0.name.clone()), ..UnionPattern::default() })
    }

    /// Matches only instances of `case`.
    pub fn case_descriptor(&self, case: &str) -> TypeDescriptor {
        TypeDescriptor::Union(UnionPattern {
            name: Some(self.0.name.clone()),
            case: Some(case.to_string()),
            fields: None,
        })
    }

    /// Matches any case whose field values satisfy `fields` positionally,
    /// e.g. `maybe_type.of(vec![book.descriptor()])`.
    pub fn of(&self, fields: Vec<TypeDescriptor>) -> TypeDescriptor {
        TypeDescriptor::Union(UnionPattern {
            name: Some(self.0.name.clone()),
            case: None,
            fields: Some(fields),
        })
    }

    /// Validate `values` against `case`'s fields and build an instance.
    pub fn construct(&self, case: &str, values: Vec<Value>) -> Result<UnionValue, Error> {
        let fields = self.case_fields(case).ok_or_else(|| Error::UnknownCase {
            type_name: self.0.name.clone(),
            case: case.to_string(),
        })?;

        let violations: Vec<Violation> = fields.iter()
            .enumerate()
            .filter_map(|(i, ty)| {
                let v = values.get(i).unwrap_or(&Value::Nil);
                (!is(ty, v)).then(|| Violation::new(i.to_string(), show_type(ty), v.to_string()))
            })
            .collect();

        if !violations.is_empty() {
            let declared = fields.iter().map(show_type).collect::<Vec<_>>().join(", ");
            return Err(Error::Construction {
                constructor: format!("{}.{}({})", self.0.name, case, declared),
                violations,
            });
        }

        let mut values = values;
        values.resize(fields.len(), Value::Nil);
        Ok(self.instance(case, values))
    }

    /// Case factory as a `Func` curried to the case's field count.
    pub fn case(&self, case: &str) -> Result<Func, Error> {
        let arity = self.case_fields(case)
            .ok_or_else(|| Error::UnknownCase { type_name: self.0.name.clone(), case: case.to_string() })?
            .len();
        let ty = self.clone();
        let name = format!("{}.{}", self.0.name, case);
        let case = case.to_string();
        Ok(curry_n(arity, Func::new(name, arity, move |args| {
            ty.construct(&case, args.to_vec()).map(Value::Union)
        })))
    }

    /// Build an instance without validation. Callers guarantee `case` exists
    /// and `values` conform.
    pub(crate) fn instance(&self, case: &str, values: Vec<Value>) -> UnionValue {
        let index = self.0.cases.iter().position(|(k, _)| k == case).unwrap_or(0);
        UnionValue(Arc::new(UnionData { ty: self.clone(), case: index, values }))
    }
}

impl fmt::Debug for UnionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnionType({})", self.0.name)
    }
}

// ─── Instance ─────────────────────────────────────────────────────────────────

struct UnionData {
    ty:     UnionType,
    case:   usize,
    values: Vec<Value>,
}

#[derive(Clone)]
pub struct UnionValue(Arc<UnionData>);

impl UnionValue {
    pub fn type_name(&self) -> &str { self.0.ty.name() }

    pub fn union_type(&self) -> &UnionType { &self.0.ty }

    pub fn case(&self) -> &str { &self.0.ty.0.cases[self.0.case].0 }

    pub fn is_case(&self, case: &str) -> bool { self.case() == case }

    pub fn values(&self) -> &[Value] { &self.0.values }

    /// The closed set of case names of this value's type.
    pub fn cases(&self) -> impl Iterator<Item = &str> { self.0.ty.case_names() }

    /// Same type and same case as `other`, regardless of field values.
    pub fn same_case(&self, other: &UnionValue) -> bool {
        self.0.ty.0.id == other.0.ty.0.id && self.0.case == other.0.case
    }
}

impl PartialEq for UnionValue {
    fn eq(&self, other: &Self) -> bool {
        self.same_case(other) && self.0.values == other.0.values
    }
}

impl fmt::Debug for UnionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut t = f.debug_tuple(&format!("{}.{}", self.type_name(), self.case()));
        for v in self.values() {
            t.field(v);
        }
        t.finish()
    }
}

// ─── Matching ─────────────────────────────────────────────────────────────────

fn expect_union<'v>(operation: &str, v: &'v Value) -> Result<&'v UnionValue, Error> {
    v.as_union().ok_or_else(|| Error::type_mismatch(operation, "a union type", v.to_string()))
}

/// Handlers must cover the whole case set of the type, whichever case `u` holds.
fn check_exhaustive(u: &UnionValue, handled: &[&str], has_wildcard: bool) -> Result<(), Error> {
    if has_wildcard {
        return Ok(());
    }
    let missing: Vec<String> = u.cases()
        .filter(|case| !handled.contains(case))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::NonExhaustiveMatch { type_name: u.type_name().to_string(), missing })
    }
}

/// Dispatch on the case of a union value. `handlers` maps case name (or
/// `"_"`) to a function receiving the case's field values positionally.
pub fn case_of(handlers: &[(&str, Func)], v: &Value) -> Result<Value, Error> {
    let u = expect_union("case_of", v)?;
    let wildcard = handlers.iter().find(|(k, _)| *k == WILDCARD).map(|(_, f)| f);
    let handled: Vec<&str> = handlers.iter().map(|(k, _)| *k).collect();
    check_exhaustive(u, &handled, wildcard.is_some())?;

    let handler = handlers.iter()
        .find(|(k, _)| *k == u.case())
        .map(|(_, f)| f)
        .or(wildcard);
    match handler {
        Some(f) => f.call(u.values()),
        None => Err(Error::NonExhaustiveMatch {
            type_name: u.type_name().to_string(),
            missing:   vec![u.case().to_string()],
        }),
    }
}

type Arm<'a, R> = Box<dyn FnOnce(&[Value]) -> R + 'a>;

/// Closure-based counterpart of [`case_of`] for Rust callers.
///
///   let area = Cases::new()
///       .on("Circle", |v| ...)
///       .on("Rect", |v| ...)
///       .run(&shape_value)?;
pub struct Cases<'a, R> {
    arms:     Vec<(String, Arm<'a, R>)>,
    wildcard: Option<Arm<'a, R>>,
}

impl<'a, R> Cases<'a, R> {
    pub fn new() -> Self {
        Self { arms: Vec::new(), wildcard: None }
    }

    pub fn on(mut self, case: impl Into<String>, f: impl FnOnce(&[Value]) -> R + 'a) -> Self {
        self.arms.push((case.into(), Box::new(f)));
        self
    }

    pub fn otherwise(mut self, f: impl FnOnce(&[Value]) -> R + 'a) -> Self {
        self.wildcard = Some(Box::new(f));
        self
    }

    pub fn run(mut self, v: &Value) -> Result<R, Error> {
        let u = expect_union("case_of", v)?;
        let handled: Vec<&str> = self.arms.iter().map(|(k, _)| k.as_str()).collect();
        check_exhaustive(u, &handled, self.wildcard.is_some())?;

        if let Some(pos) = self.arms.iter().position(|(k, _)| k == u.case()) {
            let (_, arm) = self.arms.swap_remove(pos);
            return Ok(arm(u.values()));
        }
        match self.wildcard {
            Some(arm) => Ok(arm(u.values())),
            None => Err(Error::NonExhaustiveMatch {
                type_name: u.type_name().to_string(),
                missing:   vec![u.case().to_string()],
            }),
        }
    }
}

impl<R> Default for Cases<'_, R> {
    fn default() -> Self { Self::new() }
}

// ─── Protocols ────────────────────────────────────────────────────────────────

fn register_protocols(ty: &UnionType) {
    protocols::install(&ty.type_key(), &ISHOW, vec![
        Func::new("show", 1, |args| {
            let u = expect_union("show", args.last().unwrap_or(&Value::Nil))?;
            let parts = u.values().iter()
                .map(protocols::core::show)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(format!("{}.{}({})", u.type_name(), u.case(), parts.join(", "))))
        }),
    ]);
}
