//! `Sum` and `Product`: number records whose `IMonoid` combines by addition
//! and by multiplication.
//!
//!   p::append(Sum::of(2.0), &Sum::of(3.0))?        // => Sum(5)
//!   p::empty(&Product::of(4.0))?                   // => Product(1)

use once_cell::sync::Lazy;

use crate::error::Error;
use crate::protocols::{self, core::IMONOID};
use crate::runtime::value::{Func, Value, nth};
use crate::types::descriptor::TypeDescriptor;
use crate::types::record::RecordType;

static SUM: Lazy<RecordType> = Lazy::new(|| numeric_monoid("Sum", 0.0, |a, b| a + b));

static PRODUCT: Lazy<RecordType> = Lazy::new(|| numeric_monoid("Product", 1.0, |a, b| a * b));

pub struct Sum;

impl Sum {
    pub fn of(n: f64) -> Value {
        Value::Record(SUM.instance(vec![Value::Number(n)]))
    }

    pub fn record_type() -> &'static RecordType {
        &SUM
    }
}

pub struct Product;

impl Product {
    pub fn of(n: f64) -> Value {
        Value::Record(PRODUCT.instance(vec![Value::Number(n)]))
    }

    pub fn record_type() -> &'static RecordType {
        &PRODUCT
    }
}

fn numeric_monoid(name: &str, identity: f64, combine: fn(f64, f64) -> f64) -> RecordType {
    let ty = RecordType::new(name, [("val", TypeDescriptor::Number)]);
    let (t1, t2) = (ty.clone(), ty.clone());
    protocols::install(&ty.type_key(), &IMONOID, vec![
        Func::new("empty", 1, move |_| Ok(Value::Record(t1.instance(vec![Value::Number(identity)])))),
        Func::new("append", 2, move |args| {
            let x = number_in(&t2, &nth(args, 0))?;
            let xs = number_in(&t2, &nth(args, 1))?;
            Ok(Value::Record(t2.instance(vec![Value::Number(combine(xs, x))])))
        }),
    ]);
    ty
}

fn number_in(ty: &RecordType, v: &Value) -> Result<f64, Error> {
    match v {
        Value::Record(r) if r.record_type().type_key() == ty.type_key() => {
            Ok(r.values().first().and_then(Value::as_number).unwrap_or_default())
        }
        other => Err(Error::type_mismatch("append", format!("a {}", ty.name()), other.type_name())),
    }
}
