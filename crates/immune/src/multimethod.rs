//! Multimethods: dispatch on a value computed from the arguments.
//!
//!   let area = defmulti(dispatch_on_shape);
//!   area.defmethod(circle_case, circle_area)
//!       .defmethod(__, fallback);
//!
//! Handlers are tried in registration order and the first match wins.
//! A union dispatch key matches a union matcher of the same type and case,
//! and its handler receives the key's field values. Any other key is compared
//! with `deep_equal`, and its handler receives the original arguments.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::collections::deep_equal;
use crate::error::Error;
use crate::protocols::core::show;
use crate::runtime::curry::curry_n;
use crate::runtime::value::{Func, Value};

#[derive(Default)]
struct Methods {
    pairs:    Vec<(Value, Func)>,
    wildcard: Option<Func>,
}

struct MultiMethodInner {
    dispatch: Func,
    methods:  RwLock<Methods>,
}

#[derive(Clone)]
pub struct MultiMethod(Arc<MultiMethodInner>);

impl MultiMethod {
    pub fn new(dispatch: Func) -> Self {
        Self(Arc::new(MultiMethodInner { dispatch, methods: RwLock::new(Methods::default()) }))
    }

    /// Append a `(matcher, handler)` pair. A `Placeholder` matcher installs the
    /// wildcard handler instead, replacing any earlier one.
    pub fn defmethod(&self, matcher: Value, handler: Func) -> Self {
        let mut methods = self.0.methods.write().unwrap_or_else(PoisonError::into_inner);
        if matcher.is_placeholder() {
            methods.wildcard = Some(handler);
        } else {
            methods.pairs.push((matcher, handler));
        }
        self.clone()
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        let key = self.0.dispatch.call(args)?;

        // Snapshot so that no lock is held while matchers and handlers run.
        let (pairs, wildcard) = {
            let methods = self.0.methods.read().unwrap_or_else(PoisonError::into_inner);
            (methods.pairs.clone(), methods.wildcard.clone())
        };

        for (matcher, handler) in &pairs {
            match (&key, matcher) {
                (Value::Union(k), Value::Union(m)) => {
                    if k.same_case(m) {
                        return handler.call(k.values());
                    }
                }
                (Value::Union(_), _) => {}
                _ => {
                    if deep_equal(&key, matcher)? {
                        return handler.call(args);
                    }
                }
            }
        }

        match wildcard {
            Some(handler) => handler.call(args),
            None => Err(Error::NoMatchingHandler { args: show(&Value::list(args.iter().cloned()))? }),
        }
    }

    /// This multimethod as a `Func` curried to the dispatch function's arity.
    pub fn to_func(&self) -> Func {
        let this = self.clone();
        let arity = self.0.dispatch.arity();
        curry_n(arity, Func::new(self.0.dispatch.name().to_string(), arity, move |args| this.call(args)))
    }
}

impl fmt::Debug for MultiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods = self.0.methods.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("MultiMethod")
            .field("dispatch", &self.0.dispatch)
            .field("methods", &methods.pairs.len())
            .field("wildcard", &methods.wildcard.is_some())
            .finish()
    }
}

pub fn defmulti(dispatch: Func) -> MultiMethod {
    MultiMethod::new(dispatch)
}

pub fn defmethod(matcher: Value, handler: Func, multimethod: &MultiMethod) -> MultiMethod {
    multimethod.defmethod(matcher, handler)
}
