use super::*;
use crate::protocols::core::{self as p, ICOUNT, ILOOKUP};
use crate::types::adt::Maybe;
use crate::types::descriptor::TypeDescriptor;
use crate::types::record::RecordType;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn greeter() -> Protocol {
    Protocol::new("IGreet", &[("greet", &["greeting", "who"])])
}

fn greet_with(tag: &'static str) -> Func {
    Func::new("greet", 2, move |args| {
        let greeting = args[0].as_str().unwrap_or_default().to_string();
        Ok(Value::Str(format!("{greeting} from {tag}")))
    })
}

fn person() -> RecordType {
    RecordType::new("Person", [("name", TypeDescriptor::String)])
}

fn person_value(name: &str) -> Value {
    Value::Record(person().construct(vec![name.into()]).unwrap())
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

#[test]
fn dispatches_on_the_last_argument() {
    let proto = greeter();
    let people = person();
    extend_protocol(&proto, vec![
        (people.type_key(), vec![greet_with("record")]),
        (TypeKey::Number, vec![greet_with("number")]),
    ]).unwrap();

    let someone = Value::Record(people.construct(vec!["Ada".into()]).unwrap());
    let out = proto.call("greet", &["hi".into(), someone]).unwrap();
    assert_eq!(out, Value::from("hi from record"));

    // The first argument being a record does not matter.
    let out = proto.call("greet", &["hey".into(), Value::from(7)]).unwrap();
    assert_eq!(out, Value::from("hey from number"));
}

#[test]
fn missing_implementation_names_method_params_and_type() {
    let proto = greeter();
    let err = proto.call("greet", &["hi".into(), Value::Bool(true)]).unwrap_err();
    assert_eq!(err, Error::MissingImplementation {
        protocol:  "IGreet".into(),
        method:    "greet".into(),
        params:    vec!["greeting".into(), "who".into()],
        type_name: "Boolean".into(),
    });
    assert!(err.to_string().contains("greet(greeting, who)"));
}

#[test]
fn last_registration_wins() {
    let proto = greeter();
    let people = person();
    extend_protocol(&proto, vec![(people.type_key(), vec![greet_with("first")])]).unwrap();
    extend_protocol(&proto, vec![(people.type_key(), vec![greet_with("second")])]).unwrap();

    let someone = Value::Record(people.construct(vec!["Ada".into()]).unwrap());
    let out = proto.call("greet", &["hi".into(), someone]).unwrap();
    assert_eq!(out, Value::from("hi from second"));
}

#[test]
fn dispatcher_is_curried_to_declared_arity() {
    let proto = greeter();
    let people = person();
    extend_type(people.type_key(), vec![(&proto, vec![greet_with("curried")])]).unwrap();

    let greet = proto.dispatcher("greet").unwrap();
    let partial = greet.call(&["yo".into()]).unwrap();
    let someone = Value::Record(people.construct(vec!["Ada".into()]).unwrap());
    assert_eq!(partial.call(&[someone]).unwrap(), Value::from("yo from curried"));
}

#[test]
fn undeclared_method_is_rejected() {
    let proto = greeter();
    let stray = Func::new("wave", 1, |_| Ok(Value::Nil));
    let err = extend_type(TypeKey::Number, vec![(&proto, vec![stray])]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
}

#[test]
fn iterable_subjects_fall_back_to_iterator_implementations() {
    let proto = Protocol::new("ISize", &[("size", &["xs"])]);
    extend_protocol(&proto, vec![(TypeKey::Iterator, vec![
        Func::new("size", 1, |args| Ok(Value::from(p::count(&args[0])?))),
    ])]).unwrap();

    assert_eq!(proto.call("size", &[Value::list([1.into(), 2.into()])]).unwrap(), Value::from(2));
    assert_eq!(proto.call("size", &["abc".into()]).unwrap(), Value::from(3));
    assert!(proto.call("size", &[Value::from(1)]).is_err());
}

// ─── Capability ───────────────────────────────────────────────────────────────

#[test]
fn implements_protocol_requires_every_method() {
    let proto = Protocol::new("IPair", &[("left", &["x"]), ("right", &["x"])]);
    let people = person();
    let someone = Value::Record(people.construct(vec!["Ada".into()]).unwrap());

    extend_type(people.type_key(), vec![(&proto, vec![Func::new("left", 1, |_| Ok(Value::Nil))])]).unwrap();
    assert!(!implements_protocol(&proto, &someone));

    extend_type(people.type_key(), vec![(&proto, vec![Func::new("right", 1, |_| Ok(Value::Nil))])]).unwrap();
    assert!(implements_protocol(&proto, &someone));
}

#[test]
fn implements_protocol_ignores_iterator_fallback() {
    let proto = Protocol::new("IWalk", &[("walk", &["xs"])]);
    extend_protocol(&proto, vec![(TypeKey::Iterator, vec![Func::new("walk", 1, |_| Ok(Value::Nil))])]).unwrap();
    assert!(!implements_protocol(&proto, &Value::list([])));
}

#[test]
fn records_and_natives_carry_standard_protocols() {
    assert!(implements_protocol(&ILOOKUP, &person_value("Ada")));
    assert!(implements_protocol(&ICOUNT, &Value::list([])));
    assert!(implements_protocol(&ILOOKUP, &Value::map::<&str>([])));
    assert!(!implements_protocol(&ICOUNT, &Value::from(1)));
}

// ─── Standard bindings ────────────────────────────────────────────────────────

#[test]
fn record_lookup_yields_maybe() {
    let someone = person_value("Ada");
    assert_eq!(p::get("name".into(), &someone).unwrap(), Maybe::some("Ada".into()));
    assert_eq!(p::get("age".into(), &someone).unwrap(), Maybe::none());
}

#[test]
fn record_seq_yields_first_value_then_remaining_field_names() {
    let point = RecordType::new("Pt", [("x", TypeDescriptor::Number), ("y", TypeDescriptor::Number)]);
    let pt = Value::Record(point.construct(vec![1.into(), 2.into()]).unwrap());
    assert_eq!(p::first(&pt).unwrap(), Maybe::some(1.into()));
    assert_eq!(p::rest(&pt).unwrap(), Value::list(["y".into()]));
}

#[test]
fn show_renders_nested_values() {
    let v = Value::map([("xs", Value::list([1.into(), "a".into()])), ("ok", true.into())]);
    assert_eq!(p::show(&v).unwrap(), r#"{ ok: true, xs: [ 1, "a" ] }"#);
    assert_eq!(p::show(&person_value("Ada")).unwrap(), r#"Person("Ada")"#);
    assert_eq!(p::show(&Maybe::none()).unwrap(), "Maybe.None()");
}

#[test]
fn list_bindings() {
    let xs = Value::list([1.into(), 2.into(), 3.into()]);
    assert_eq!(p::count(&xs).unwrap(), 3);
    assert_eq!(p::first(&xs).unwrap(), Maybe::some(1.into()));
    assert_eq!(p::rest(&xs).unwrap(), Value::list([2.into(), 3.into()]));
    assert_eq!(p::assoc(1.into(), "b".into(), &xs).unwrap(), Value::list([1.into(), "b".into(), 3.into()]));
    assert_eq!(p::dissoc(0.into(), &xs).unwrap(), Value::list([2.into(), 3.into()]));
    assert_eq!(p::conj(4.into(), &xs).unwrap(), Value::list([1.into(), 2.into(), 3.into(), 4.into()]));
    assert_eq!(p::get(9.into(), &xs).unwrap(), Maybe::none());
}

#[test]
fn map_bindings_coerce_number_keys() {
    let m = Value::map([("a", Value::from(1))]);
    let m = p::assoc(2.into(), "two".into(), &m).unwrap();
    assert_eq!(p::get("2".into(), &m).unwrap(), Maybe::some("two".into()));
    assert_eq!(p::dissoc("a".into(), &m).unwrap(), Value::map([("2", Value::from("two"))]));
    assert!(p::assoc(Value::Bool(true), 1.into(), &m).is_err());
}

#[test]
fn string_bindings_work_on_characters() {
    let s = Value::from("héllo");
    assert_eq!(p::count(&s).unwrap(), 5);
    assert_eq!(p::get(1.into(), &s).unwrap(), Maybe::some("é".into()));
    assert_eq!(p::rest(&s).unwrap(), Value::from("éllo"));
    assert_eq!(p::append("!".into(), &s).unwrap(), Value::from("héllo!"));
}

#[test]
fn folds_pass_value_then_accumulator() {
    let concat = Func::new("concat", 2, |args| {
        Ok(Value::Str(format!("{}{}", args[1].as_str().unwrap_or_default(), args[0].as_str().unwrap_or_default())))
    });
    let xs = Value::list(["a".into(), "b".into(), "c".into()]);
    assert_eq!(p::foldl(&concat, "".into(), &xs).unwrap(), Value::from("abc"));
    assert_eq!(p::foldr(&concat, "".into(), &xs).unwrap(), Value::from("cba"));
}
