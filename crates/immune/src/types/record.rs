//! Record types: named, field-validated product types.
//!
//!   let book = RecordType::new("Book", [("title", TypeDescriptor::String)]);
//!   let b = book.construct(vec!["Bodies That Matter".into()])?;
//!
//! Construction is all-or-nothing. Every mismatched field is reported.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Violation};
use crate::protocols::{self, core::{ICLONE, ICOUNT, IKEYED, ILOOKUP, ISEQ, ISHOW}};
use crate::runtime::curry::curry_n;
use crate::runtime::value::{Func, TypeKey, Value, next_type_id, nth};
use crate::types::adt::maybe;
use crate::types::descriptor::{TypeDescriptor, is, show_type};

// ─── Type ─────────────────────────────────────────────────────────────────────

struct RecordTypeInner {
    id:     u64,
    name:   String,
    fields: Vec<(String, TypeDescriptor)>,
}

#[derive(Clone)]
pub struct RecordType(Arc<RecordTypeInner>);

impl RecordType {
    /// Declare a record type and register its standard protocol implementations.
    pub fn new<K: Into<String>>(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, TypeDescriptor)>,
    ) -> Self {
        let ty = Self(Arc::new(RecordTypeInner {
            id:     next_type_id(),
            name:   name.into(),
            fields: fields.into_iter().map(|(k, t)| (k.into(), t)).collect(),
        }));
        register_protocols(&ty);
        ty
    }

    pub fn name(&self) -> &str { &self.0.name }

    pub fn fields(&self) -> &[(String, TypeDescriptor)] { &self.0.fields }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn type_key(&self) -> TypeKey { TypeKey::Record(self.0.id) }

    pub fn descriptor(&self) -> TypeDescriptor { TypeDescriptor::Record(self.clone()) }

    /// Validate `values` positionally against the declared fields.
    pub fn construct(&self, values: Vec<Value>) -> Result<Record, Error> {
        let violations: Vec<Violation> = self.0.fields.iter()
            .enumerate()
            .filter_map(|(i, (name, ty))| {
                let v = values.get(i).unwrap_or(&Value::Nil);
                (!is(ty, v)).then(|| Violation::new(name.clone(), show_type(ty), v.to_string()))
            })
            .collect();

        if !violations.is_empty() {
            let spec = TypeDescriptor::Shape(self.0.fields.clone());
            return Err(Error::Construction {
                constructor: format!("{}({})", self.name(), show_type(&spec)),
                violations,
            });
        }

        let mut values = values;
        values.resize(self.0.fields.len(), Value::Nil);
        Ok(Record(Arc::new(RecordData { ty: self.clone(), values })))
    }

    /// Build an instance without validation. Callers guarantee `values` conform.
    pub(crate) fn instance(&self, values: Vec<Value>) -> Record {
        Record(Arc::new(RecordData { ty: self.clone(), values }))
    }

    /// The constructor as a `Func` curried to the field count.
    pub fn constructor(&self) -> Func {
        let ty = self.clone();
        let arity = self.0.fields.len();
        curry_n(arity, Func::new(self.name().to_string(), arity, move |args| {
            ty.construct(args.to_vec()).map(Value::Record)
        }))
    }
}

impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordType({})", self.name())
    }
}

// ─── Instance ─────────────────────────────────────────────────────────────────

struct RecordData {
    ty:     RecordType,
    values: Vec<Value>,
}

#[derive(Clone)]
pub struct Record(Arc<RecordData>);

impl Record {
    pub fn type_name(&self) -> &str { self.0.ty.name() }

    pub fn record_type(&self) -> &RecordType { &self.0.ty }

    pub fn values(&self) -> &[Value] { &self.0.values }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.ty.field_names()
            .position(|k| k == field)
            .and_then(|i| self.0.values.get(i))
    }

    pub fn field_count(&self) -> usize { self.0.values.len() }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.0.ty.0.id == other.0.ty.0.id && self.0.values == other.0.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.type_name());
        for (name, value) in self.0.ty.field_names().zip(&self.0.values) {
            s.field(name, value);
        }
        s.finish()
    }
}

// ─── Protocols ────────────────────────────────────────────────────────────────

fn subject(args: &[Value], method: &str) -> Result<Record, Error> {
    match args.last() {
        Some(Value::Record(r)) => Ok(r.clone()),
        other => Err(Error::invalid_argument(method, format!(
            "expected a record, got {}",
            other.map(Value::type_name).unwrap_or_else(|| "nothing".into())
        ))),
    }
}

fn register_protocols(ty: &RecordType) {
    let key = ty.type_key();

    protocols::install(&key, &ISHOW, vec![
        Func::new("show", 1, |args| {
            let r = subject(args, "show")?;
            let parts = r.values().iter()
                .map(protocols::core::show)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Str(format!("{}({})", r.type_name(), parts.join(", "))))
        }),
    ]);

    protocols::install(&key, &ICLONE, vec![
        Func::new("clone", 1, |args| Ok(nth(args, 0))),
        Func::new("shallow_clone", 1, |args| Ok(nth(args, 0))),
    ]);

    protocols::install(&key, &ICOUNT, vec![
        Func::new("count", 1, |args| Ok(Value::from(subject(args, "count")?.field_count()))),
    ]);

    protocols::install(&key, &ILOOKUP, vec![
        Func::new("get", 2, |args| {
            let r = subject(args, "get")?;
            let found = nth(args, 0).as_str().and_then(|k| r.get(k)).cloned();
            Ok(maybe(found.unwrap_or(Value::Nil)))
        }),
    ]);

    protocols::install(&key, &ISEQ, vec![
        Func::new("first", 1, |args| {
            let r = subject(args, "first")?;
            Ok(maybe(r.values().first().cloned().unwrap_or(Value::Nil)))
        }),
        // Field names after the first, mirroring `keys`.
        Func::new("rest", 1, |args| {
            let r = subject(args, "rest")?;
            Ok(Value::list(r.record_type().field_names().skip(1).map(Value::from)))
        }),
    ]);

    protocols::install(&key, &IKEYED, vec![
        Func::new("keys", 1, |args| {
            let r = subject(args, "keys")?;
            Ok(Value::list(r.record_type().field_names().map(Value::from)))
        }),
    ]);
}
