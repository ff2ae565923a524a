//! Partial application for dynamic `Func`s.
//!
//!   let times = curry(Func::new("times", 2, |a| ...));
//!   times.call(&[2.into()])?            // => partial, waiting for one more
//!   times.call(&[__, 4.into()])?        // => partial, first slot left open
//!
//! Placeholders (`__`) mark slots to fill later and never count toward arity.

use std::collections::VecDeque;

use crate::error::Error;
use crate::runtime::value::{Func, Value};

/// Curry `f` to its declared arity.
pub fn curry(f: Func) -> Func {
    let arity = f.arity();
    curry_n(arity, f)
}

/// Curry `f` to an explicit arity. Arity below 2 returns `f` untouched.
pub fn curry_n(arity: usize, f: Func) -> Func {
    if arity < 2 {
        return f;
    }
    let name = f.name().to_string();
    Func::new(name, arity, move |args| apply(&f, arity, args.to_vec()))
}

fn apply(f: &Func, arity: usize, mut args: Vec<Value>) -> Result<Value, Error> {
    args.truncate(arity);
    let real = args.iter().filter(|a| !a.is_placeholder()).count();
    if real >= arity {
        return f.call(&args);
    }

    let f = f.clone();
    Ok(Value::Func(Func::new(f.name().to_string(), arity - real, move |more| {
        let mut more: VecDeque<Value> = more.iter().cloned().collect();
        let mut filled: Vec<Value> = args.iter()
            .map(|a| if a.is_placeholder() { more.pop_front().unwrap_or(Value::Nil) } else { a.clone() })
            .collect();
        filled.extend(more);
        apply(&f, arity, filled)
    })))
}
