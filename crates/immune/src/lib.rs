pub mod error;
pub mod runtime;
pub mod types;
pub mod protocols;
pub mod multimethod;
pub mod collections;
pub mod task;

pub use error::{Error, Violation};
pub use runtime::curry::{curry, curry_n};
pub use runtime::value::{Func, Kind, TypeKey, Value, __};
pub use types::adt::{Maybe, ResultType, maybe, result};
pub use types::descriptor::{TypeDescriptor, UnionPattern, any_union, array_of, is, one_of, shape, show_type};
pub use types::monoid::{Product, Sum};
pub use types::record::{Record, RecordType};
pub use types::union::{Cases, UnionType, UnionValue, WILDCARD, case_of};
pub use protocols::{MethodSpec, Protocol, extend_protocol, extend_type, implements_protocol};
pub use multimethod::{MultiMethod, defmethod, defmulti};
pub use task::{Outcome, Resolver, Task};
