//! Runtime behaviour tests.
//!
//! Exercises the public surface end to end: declare types, extend protocols,
//! dispatch through them, and combine the results with the generic utilities.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use immune::collections::{
    and_then, any, assoc_in, comp, deep_equal, dissoc_in, every, evolve, filter, filter_kv, foldl_kv,
    foldr_kv, get_in, get_in_or_else, get_or_else, into, kvp, lift_a2, pipe, remove, remove_kv,
    shallow_equal, take, vals, zip,
};
use immune::protocols::core::{self as p, ICOUNT, ISHOW};
use immune::{
    Error, Func, Maybe, Protocol, RecordType, ResultType, TypeDescriptor as T, TypeKey, UnionType, Value,
    __, case_of, curry, defmethod, defmulti, extend_type, implements_protocol, is,
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn num(v: &Value) -> f64 {
    v.as_number().unwrap_or_else(|| panic!("expected Number, got {v:?}"))
}

fn list(items: &[i32]) -> Value {
    Value::list(items.iter().map(|&i| Value::from(i)))
}

fn add() -> Func {
    Func::new("add", 2, |args| Ok(Value::from(num(&args[0]) + num(&args[1]))))
}

fn inc() -> Func {
    Func::new("inc", 1, |args| Ok(Value::from(num(&args[0]) + 1.0)))
}

fn double() -> Func {
    Func::new("double", 1, |args| Ok(Value::from(num(&args[0]) * 2.0)))
}

fn is_even() -> Func {
    Func::new("is_even", 1, |args| Ok(Value::Bool(num(&args[0]) % 2.0 == 0.0)))
}

fn ok<T: std::fmt::Debug>(r: Result<T, Error>) -> T {
    r.unwrap_or_else(|e| panic!("unexpected error: {e}"))
}

// ─── Records ──────────────────────────────────────────────────────────────────

#[test]
fn record_fields_are_looked_up_as_maybe() {
    let book = RecordType::new("Book", [("title", T::String)]);
    let b = Value::Record(ok(book.construct(vec!["Bodies That Matter".into()])));

    assert_eq!(ok(p::get("title".into(), &b)), Maybe::some("Bodies That Matter".into()));
    assert_eq!(ok(p::count(&b)), 1);
    assert_eq!(ok(p::keys(&b)), Value::list(["title".into()]));
    assert_eq!(b.to_string(), r#"Book("Bodies That Matter")"#);
}

#[test]
fn wrong_field_type_names_the_field() {
    let book = RecordType::new("Book", [("title", T::String)]);
    let err = book.construct(vec![1.into()]).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Book"), "{message}");
    assert!(message.contains("Field: title - expected value of type String but got: 1"), "{message}");
}

#[test]
fn nested_record_fields_accept_maybe_lists() {
    let book = RecordType::new("Book", [("title", T::String)]);
    let philosopher = RecordType::new("Philosopher", [
        ("name",  T::String),
        ("books", immune::array_of(Maybe::of(book.descriptor()))),
    ]);
    let b = Value::Record(ok(book.construct(vec!["Gender Trouble".into()])));
    let shelf = Value::list([Maybe::some(b)]);
    assert!(philosopher.construct(vec!["Judith".into(), shelf]).is_ok());
    assert!(philosopher.construct(vec!["Judith".into(), Value::list([Maybe::some(1.into())])]).is_err());
}

// ─── Unions ───────────────────────────────────────────────────────────────────

#[test]
fn case_of_over_user_unions() {
    let light = UnionType::new("Light", [("Red", vec![]), ("Green", vec![]), ("Blinking", vec![T::Number])]);
    let blinking = ok(ok(light.case("Blinking")).call(&[3.into()]));
    assert!(is(&light.descriptor(), &blinking));

    let describe = |v: &Value| case_of(&[
        ("Red",      Func::new("red", 0, |_| Ok("stop".into()))),
        ("Green",    Func::new("green", 0, |_| Ok("go".into()))),
        ("Blinking", Func::new("blinking", 1, |a| Ok(Value::Str(format!("every {}s", num(&a[0])))))),
    ], v);
    assert_eq!(ok(describe(&blinking)), Value::from("every 3s"));

    let red = Value::Union(ok(light.construct("Red", vec![])));
    let partial = case_of(&[("Red", Func::new("red", 0, |_| Ok(Value::Nil)))], &red);
    match partial {
        Err(Error::NonExhaustiveMatch { missing, .. }) => assert_eq!(missing, ["Green", "Blinking"]),
        other => panic!("expected NonExhaustiveMatch, got {other:?}"),
    }
}

#[test]
fn maybe_and_result_bindings() {
    assert_eq!(ok(p::map(&inc(), &Maybe::some(1.into()))), Maybe::some(2.into()));
    assert_eq!(ok(p::map(&inc(), &Maybe::none())), Maybe::none());
    assert_eq!(ok(p::map(&inc(), &ResultType::err("e".into()))), ResultType::err("e".into()));

    let twice = ok(p::bimap(&inc(), &double(), &ResultType::err(4.into())));
    assert_eq!(twice, ResultType::err(8.into()));

    let folded = ok(p::foldl(&add(), 10.into(), &Maybe::some(5.into())));
    assert_eq!(folded, Value::from(15));

    let shown = ok(p::cata(&inc(), &Func::new("zero", 0, |_| Ok(0.into())), &Maybe::none()));
    assert_eq!(shown, Value::from(0));

    assert_eq!(ok(p::append(Maybe::some("b".into()), &Maybe::some("a".into()))), Maybe::some("ab".into()));
    assert_eq!(ok(p::flatten(&Maybe::some(Maybe::some(1.into())))), Maybe::some(1.into()));
    assert_eq!(ok(p::of(1.into(), &ResultType::err(0.into()))), ResultType::ok(1.into()));
}

// ─── Currying ─────────────────────────────────────────────────────────────────

#[test]
fn curried_calls_agree() {
    let add3 = curry(Func::new("add3", 3, |a| Ok(Value::from(num(&a[0]) + num(&a[1]) + num(&a[2])))));
    let all = ok(add3.call(&[1.into(), 2.into(), 3.into()]));
    let stepwise = ok(ok(ok(add3.call(&[1.into()])).call(&[2.into()])).call(&[3.into()]));
    let holes = ok(ok(add3.call(&[__, 2.into(), __])).call(&[1.into(), 3.into()]));
    assert_eq!(all, Value::from(6));
    assert_eq!(stepwise, all);
    assert_eq!(holes, all);
}

// ─── Protocols ────────────────────────────────────────────────────────────────

#[test]
fn user_types_join_standard_protocols() {
    let counter = RecordType::new("Counter", [("n", T::Number)]);
    let c = Value::Record(ok(counter.construct(vec![7.into()])));

    extend_type(counter.type_key(), vec![
        (&*ISHOW, vec![Func::new("show", 1, |a| {
            let n = a[0].as_record().and_then(|r| r.get("n")).map(num).unwrap_or_default();
            Ok(Value::Str(format!("#{n}")))
        })]),
    ]).unwrap();

    assert_eq!(c.to_string(), "#7");
    assert!(implements_protocol(&ICOUNT, &c));
}

#[test]
fn protocol_dispatcher_uses_the_last_argument() {
    let describe = Protocol::new("IDescribe", &[("describe", &["prefix", "x"])]);
    extend_type(TypeKey::Number, vec![(&describe, vec![Func::new("describe", 2, |a| {
        Ok(Value::Str(format!("{} number", a[0].as_str().unwrap_or_default())))
    })])]).unwrap();

    let call = describe.dispatcher("describe").unwrap();
    assert_eq!(ok(call.call(&["a".into(), 1.into()])), Value::from("a number"));
    assert!(matches!(call.call(&[1.into(), "a".into()]), Err(Error::MissingImplementation { .. })));
}

// ─── Multimethods ─────────────────────────────────────────────────────────────

#[test]
fn multimethod_dispatches_on_union_cases() {
    let shape = UnionType::new("Shape", [("Circle", vec![T::Number]), ("Square", vec![T::Number])]);
    let circle = ok(ok(shape.case("Circle")).call(&[2.into()]));
    let square = ok(ok(shape.case("Square")).call(&[3.into()]));

    let identity = Func::new("shape", 1, |a| Ok(a[0].clone()));
    let area = defmulti(identity)
        .defmethod(ok(ok(shape.case("Circle")).call(&[0.into()])), Func::new("circle", 1, |a| {
            Ok(Value::from(3.0 * num(&a[0]) * num(&a[0])))
        }))
        .defmethod(ok(ok(shape.case("Square")).call(&[0.into()])), Func::new("square", 1, |a| {
            Ok(Value::from(num(&a[0]) * num(&a[0])))
        }));

    assert_eq!(ok(area.call(&[circle])), Value::from(12));
    assert_eq!(ok(area.to_func().call(&[square])), Value::from(9));
}

#[test]
fn multimethod_matches_structurally_and_falls_back() {
    let route = defmulti(Func::new("route", 2, |a| Ok(Value::list([a[0].clone(), a[1].clone()]))));
    let route = defmethod(Value::list(["GET".into(), "/".into()]), Func::new("home", 2, |_| Ok("home".into())), &route);
    let route = defmethod(Value::list(["GET".into(), "/".into()]), Func::new("shadowed", 2, |_| Ok("shadowed".into())), &route);
    let route = defmethod(__, Func::new("missing", 2, |a| Ok(Value::Str(format!("404 {}", a[1].as_str().unwrap_or_default())))), &route);

    assert_eq!(ok(route.call(&["GET".into(), "/".into()])), Value::from("home"));
    assert_eq!(ok(route.call(&["GET".into(), "/x".into()])), Value::from("404 /x"));
}

#[test]
fn multimethod_without_match_or_wildcard_fails() {
    let mm = defmulti(Func::new("key", 1, |a| Ok(a[0].clone())))
        .defmethod("a".into(), Func::new("a", 1, |_| Ok(Value::Nil)));
    let err = mm.call(&["b".into()]).unwrap_err();
    assert_eq!(err.to_string(), r#"couldn't find a matching handler for argument(s): [ "b" ]"#);
}

// ─── Equality ─────────────────────────────────────────────────────────────────

#[test]
fn deep_equal_recurses_through_keyed_collections() {
    let a = Value::map([("a", list(&[1, 2]))]);
    let b = Value::map([("a", list(&[1, 2]))]);
    assert!(ok(deep_equal(&a, &b)));
    assert!(!ok(deep_equal(&"1".into(), &1.into())));
    assert!(!ok(deep_equal(&list(&[1, 2]), &list(&[1, 2, 3]))));
    assert!(!ok(deep_equal(&Value::map([("a", list(&[1]))]), &b)));

    let point = RecordType::new("Point", [("x", T::Number), ("y", T::Number)]);
    let p1 = Value::Record(ok(point.construct(vec![1.into(), 2.into()])));
    let p2 = Value::Record(ok(point.construct(vec![1.into(), 2.into()])));
    assert!(ok(deep_equal(&p1, &p2)));
    assert!(ok(shallow_equal(&list(&[1, 2]), &list(&[1, 2]))));
}

#[test]
fn equality_tells_missing_keys_from_nil_values() {
    let a = Value::map([("a", Value::Nil)]);
    let b = Value::map([("b", Value::Nil)]);
    assert!(!ok(deep_equal(&a, &b)));
    assert!(!ok(shallow_equal(&a, &b)));
    assert!(ok(deep_equal(&a, &Value::map([("a", Value::Nil)]))));
    assert!(ok(shallow_equal(&a, &Value::map([("a", Value::Nil)]))));
}

// ─── Collection utilities ─────────────────────────────────────────────────────

#[test]
fn paths_read_and_write_nested_collections() {
    let doc = Value::map([("x", Value::map([("y", Value::from("z"))]))]);
    assert_eq!(ok(get_in(&["x".into(), "y".into()], &doc)), Maybe::some("z".into()));
    assert_eq!(ok(get_in(&["x".into(), "q".into(), "r".into()], &doc)), Maybe::none());

    let grid = Value::list([Value::list([list(&[1, 2]), list(&[3, 4])])]);
    assert_eq!(ok(get_in(&[0.into(), 1.into(), 0.into()], &grid)), Maybe::some(3.into()));

    let written = ok(assoc_in(&["a".into(), "b".into()], 1.into(), &Value::map::<&str>([])));
    assert_eq!(written, Value::map([("a", Value::map([("b", Value::from(1))]))]));

    let removed = ok(dissoc_in(&["x".into(), "y".into()], &doc));
    assert_eq!(removed, Value::map([("x", Value::map::<&str>([]))]));

    assert_eq!(ok(get_or_else("nope".into(), 0.into(), &doc)), Value::from(0));
}

#[test]
fn path_lookup_with_fallback() {
    let doc = Value::map([("x", Value::map([("y", Value::from("z"))]))]);
    assert_eq!(ok(get_in_or_else(&["x".into(), "y".into()], "none".into(), &doc)), Value::from("z"));
    assert_eq!(ok(get_in_or_else(&["x".into(), "q".into()], "none".into(), &doc)), Value::from("none"));
}

#[test]
fn evolve_applies_nested_changes() {
    let state = Value::map([("counters", Value::map([
        ("a", Value::from(0)),
        ("b", Value::from(0)),
        ("c", Value::from(0)),
    ]))]);
    let changes = Value::map([("counters", Value::map([
        ("a", Value::from(4)),
        ("b", Value::Func(inc())),
    ]))]);
    assert_eq!(ok(evolve(&changes, &state)), Value::map([("counters", Value::map([
        ("a", Value::from(4)),
        ("b", Value::from(1)),
        ("c", Value::from(0)),
    ]))]));

    let fresh = ok(evolve(&Value::map([("n", Value::map([("m", Value::from(1))]))]), &Value::map::<&str>([])));
    assert_eq!(fresh, Value::map([("n", Value::map([("m", Value::from(1))]))]));
}

#[test]
fn filtering_keeps_the_collection_type() {
    assert_eq!(ok(filter(&is_even(), &list(&[1, 2, 3, 4]))), list(&[2, 4]));
    assert_eq!(ok(remove(&is_even(), &list(&[1, 2, 3, 4]))), list(&[1, 3]));

    let scores = Value::map([("ann", Value::from(2)), ("bob", Value::from(3))]);
    assert_eq!(ok(filter(&is_even(), &scores)), Value::map([("ann", Value::from(2))]));

    let key_is_bob = Func::new("key_is_bob", 2, |a| Ok(Value::Bool(a[0] == Value::from("bob"))));
    assert_eq!(ok(filter_kv(&key_is_bob, &scores)), Value::map([("bob", Value::from(3))]));
    assert_eq!(ok(remove_kv(&key_is_bob, &scores)), Value::map([("ann", Value::from(2))]));
}

#[test]
fn any_stops_at_the_first_match() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let counted_even = Func::new("counted_even", 1, move |a| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Value::Bool(num(&a[0]) % 2.0 == 0.0))
    });
    assert!(ok(any(&counted_even, &list(&[1, 2, 3, 4]))));
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    assert!(!ok(any(&is_even(), &list(&[1, 3]))));
    assert!(ok(every(&is_even(), &list(&[2, 4]))));
    assert!(!ok(every(&is_even(), &list(&[2, 3]))));
    assert!(ok(every(&is_even(), &list(&[]))));
    assert!(ok(any(&is_even(), &Maybe::some(2.into()))));
}

#[test]
fn folding_and_reshaping() {
    let scores = Value::map([("ann", Value::from(2)), ("bob", Value::from(3))]);
    let collect_keys = Func::new("collect_keys", 3, |a| p::conj(a[0].clone(), &a[2]));
    assert_eq!(ok(foldl_kv(&collect_keys, Value::list([]), &scores)), Value::list(["ann".into(), "bob".into()]));
    assert_eq!(ok(foldr_kv(&collect_keys, Value::list([]), &scores)), Value::list(["bob".into(), "ann".into()]));

    assert_eq!(ok(vals(&scores)), list(&[2, 3]));
    assert_eq!(ok(kvp(&scores)), Value::list([
        Value::list(["ann".into(), 2.into()]),
        Value::list(["bob".into(), 3.into()]),
    ]));
    assert_eq!(ok(take(2, &list(&[5, 6, 7]))), list(&[5, 6]));
    assert_eq!(ok(take(9, &list(&[5]))), list(&[5]));
    assert_eq!(ok(take(2, &"héllo".into())), Value::list(["h".into(), "é".into()]));
    assert_eq!(Value::List(ok(p::iterator(&"ab".into()))), Value::list(["a".into(), "b".into()]));
    assert_eq!(ok(into(list(&[1]), &list(&[2, 3]))), list(&[1, 2, 3]));
    assert_eq!(
        ok(zip(&[Value::list(["x".into(), "y".into()]), list(&[1, 2, 3])])),
        Value::list([Value::list(["x".into(), 1.into()]), Value::list(["y".into(), 2.into()])]),
    );
}

#[test]
fn function_composition() {
    let piped = pipe(vec![inc(), double()]);
    let composed = comp(vec![inc(), double()]);
    assert_eq!(ok(piped.call(&[3.into()])), Value::from(8));
    assert_eq!(ok(composed.call(&[3.into()])), Value::from(7));

    let identity = pipe(vec![]);
    assert_eq!(identity.arity(), 1);
    assert_eq!(ok(identity.call(&[5.into()])), Value::from(5));

    assert_eq!(ok(lift_a2(&add(), &Maybe::some(1.into()), &Maybe::some(2.into()))), Maybe::some(3.into()));
    assert_eq!(ok(lift_a2(&add(), &Maybe::none(), &Maybe::some(2.into()))), Maybe::none());
    assert_eq!(ok(lift_a2(&add(), &list(&[1, 2]), &list(&[10]))), list(&[11, 12]));

    let halve_if_even = Func::new("halve", 1, |a| {
        let n = num(&a[0]);
        Ok(if n % 2.0 == 0.0 { Maybe::some((n / 2.0).into()) } else { Maybe::none() })
    });
    assert_eq!(ok(and_then(&halve_if_even, &Maybe::some(8.into()))), Maybe::some(4.into()));
    assert_eq!(ok(and_then(&halve_if_even, &Maybe::some(3.into()))), Maybe::none());
}
