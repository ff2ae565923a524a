//! Protocol registry: maps (type key, method name) to an implementation.
//!
//! Consumed by:
//!   • Protocol dispatchers: resolve the implementation for the last argument
//!   • `implements_protocol`: capability queries
//!   • Record and union constructors: register their standard methods
//!
//! Adding a protocol method for a type = one `extend_type` / `extend_protocol` call.
//! Later registrations for the same (type, method) replace earlier ones.

pub mod core;
pub mod native;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use crate::error::Error;
use crate::runtime::curry::{curry, curry_n};
use crate::runtime::value::{Func, TypeKey, Value};

// ─── Protocol ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub name:   String,
    /// Parameter names. The last one is the dispatch subject.
    pub params: Vec<String>,
}

impl MethodSpec {
    pub fn arity(&self) -> usize { self.params.len() }
}

#[derive(Debug)]
struct ProtocolInner {
    name:    String,
    methods: Vec<MethodSpec>,
}

/// A named set of method signatures that types implement independently.
#[derive(Debug, Clone)]
pub struct Protocol(Arc<ProtocolInner>);

impl Protocol {
    ///   let ilookup = Protocol::new("ILookup", &[("get", &["key", "coll"])]);
    pub fn new(name: impl Into<String>, methods: &[(&str, &[&str])]) -> Self {
        Self(Arc::new(ProtocolInner {
            name: name.into(),
            methods: methods.iter()
                .map(|(m, params)| MethodSpec {
                    name:   m.to_string(),
                    params: params.iter().map(|p| p.to_string()).collect(),
                })
                .collect(),
        }))
    }

    pub fn name(&self) -> &str { &self.0.name }

    pub fn methods(&self) -> &[MethodSpec] { &self.0.methods }

    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.0.methods.iter().find(|m| m.name == name)
    }

    pub fn declares(&self, method: &str) -> bool { self.method(method).is_some() }

    /// Dispatch `method` on the type of the last argument.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, Error> {
        let spec = self.method(method).ok_or_else(|| Error::invalid_argument(
            method,
            format!("protocol '{}' declares no method '{method}'", self.name()),
        ))?;

        let subject = args.last().unwrap_or(&Value::Nil);
        let implementation = read(|r| r.resolve(subject, method)).ok_or_else(|| {
            Error::MissingImplementation {
                protocol:  self.name().to_string(),
                method:    method.to_string(),
                params:    spec.params.clone(),
                type_name: subject.type_name(),
            }
        })?;

        implementation.call(args)
    }

    /// The dispatcher for `method` as a `Func` curried to the declared arity.
    pub fn dispatcher(&self, method: &str) -> Option<Func> {
        let arity = self.method(method)?.arity();
        let protocol = self.clone();
        let name = method.to_string();
        Some(curry_n(arity, Func::new(method.to_string(), arity, move |args| {
            protocol.call(&name, args)
        })))
    }
}

// ─── Registry ─────────────────────────────────────────────────────────────────

pub struct ProtocolRegistry {
    impls: HashMap<TypeKey, HashMap<String, Func>>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        Self { impls: HashMap::new() }
    }

    /// Insert `f` as-is. Replaces any earlier implementation of `method` for `key`.
    pub fn register(&mut self, key: TypeKey, method: &str, f: Func) {
        self.impls.entry(key).or_default().insert(method.to_string(), f);
    }

    /// Insert `f` curried to its own arity.
    pub fn extend(&mut self, key: &TypeKey, impls: Vec<Func>) {
        for f in impls {
            let method = f.name().to_string();
            self.register(key.clone(), &method, curry(f));
        }
    }

    pub fn lookup(&self, key: &TypeKey, method: &str) -> Option<Func> {
        self.impls.get(key)?.get(method).cloned()
    }

    /// Implementation for `subject`'s own type, falling back to the
    /// `Iterator` implementations for iterable subjects.
    pub fn resolve(&self, subject: &Value, method: &str) -> Option<Func> {
        self.lookup(&subject.type_key(), method).or_else(|| {
            if subject.is_iterable() {
                self.lookup(&TypeKey::Iterator, method)
            } else {
                None
            }
        })
    }

    pub fn implements(&self, protocol: &Protocol, key: &TypeKey) -> bool {
        let Some(methods) = self.impls.get(key) else { return false };
        protocol.methods().iter().all(|m| methods.contains_key(&m.name))
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        let mut r = Self::new();
        native::register_nil(&mut r);
        native::register_bool(&mut r);
        native::register_number(&mut r);
        native::register_function(&mut r);
        native::register_list(&mut r);
        native::register_string(&mut r);
        native::register_map(&mut r);
        native::register_task(&mut r);
        r
    }
}

// ─── Process-wide table ───────────────────────────────────────────────────────

static REGISTRY: Lazy<RwLock<ProtocolRegistry>> = Lazy::new(|| RwLock::new(ProtocolRegistry::default()));

/// Run `f` against the shared registry. Implementations are cloned out
/// before being called, so no lock is held while user code runs.
pub(crate) fn read<R>(f: impl FnOnce(&ProtocolRegistry) -> R) -> R {
    let guard = REGISTRY.read().unwrap_or_else(PoisonError::into_inner);
    f(&guard)
}

pub(crate) fn write<R>(f: impl FnOnce(&mut ProtocolRegistry) -> R) -> R {
    let mut guard = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Built-in registration. Method names are fixed at compile time.
pub(crate) fn install(key: &TypeKey, protocol: &Protocol, impls: Vec<Func>) {
    debug_assert!(impls.iter().all(|f| protocol.declares(f.name())));
    write(|r| r.extend(key, impls));
}

fn check_declared(protocol: &Protocol, impls: &[Func]) -> Result<(), Error> {
    match impls.iter().find(|f| !protocol.declares(f.name())) {
        Some(f) => Err(Error::invalid_argument(
            "extend",
            format!("protocol '{}' declares no method '{}'", protocol.name(), f.name()),
        )),
        None => Ok(()),
    }
}

// ─── Public API ───────────────────────────────────────────────────────────────

/// Extend one protocol to several types. Each `Func`'s name is the method it implements.
pub fn extend_protocol(protocol: &Protocol, types: Vec<(TypeKey, Vec<Func>)>) -> Result<(), Error> {
    for (_, impls) in &types {
        check_declared(protocol, impls)?;
    }
    write(|r| {
        for (key, impls) in types {
            for f in impls {
                let method = f.name().to_string();
                r.register(key.clone(), &method, f);
            }
        }
    });
    Ok(())
}

/// Extend one type to several protocols. Implementations are curried to
/// their own arity before registration.
pub fn extend_type(key: TypeKey, protocols: Vec<(&Protocol, Vec<Func>)>) -> Result<(), Error> {
    for (protocol, impls) in &protocols {
        check_declared(protocol, impls)?;
    }
    write(|r| {
        for (_, impls) in protocols {
            r.extend(&key, impls);
        }
    });
    Ok(())
}

/// True iff every method the protocol declares is registered for `v`'s type.
pub fn implements_protocol(protocol: &Protocol, v: &Value) -> bool {
    let key = v.type_key();
    read(|r| r.implements(protocol, &key))
}

#[cfg(test)]
mod tests;
