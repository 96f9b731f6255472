use eigen_core::{Arity, Visibility};

use eigen_runtime::dispatch::DispatchOptions;
use eigen_runtime::universe::Universe;
use eigen_runtime::value::Value;
use eigen_runtime::{Error, Result};

fn returning(text: &'static str) -> impl Fn(&mut Universe, Value, Vec<Value>) -> Result<Value> {
    move |_, _, _| Ok(Value::new_string(text))
}

fn first(args: Vec<Value>) -> Value {
    args.into_iter().next().unwrap()
}

#[test]
fn missing_methods_reach_the_handler() {
    let mut universe = Universe::new();
    let class = universe.define_class("Ghost", None).unwrap();
    let ghost = universe.instantiate(class).unwrap();

    match universe.dispatch(ghost.clone(), "foo", vec![Value::Integer(1)]) {
        Err(err @ Error::MethodNotFound { .. }) => {
            assert!(err.is_recoverable());
            if let Error::MethodNotFound {
                name,
                argument_count,
                receiver,
            } = err
            {
                assert_eq!(name, "foo");
                assert_eq!(argument_count, 1);
                assert_eq!(receiver, "#<Ghost>");
            }
        }
        other => panic!("expected a missing method, got {:?}", other),
    }

    universe
        .define_missing_handler(class, |universe, _, name, _| {
            Ok(Value::new_string(format!("caught:{}", universe.lookup_symbol(name))))
        })
        .unwrap();
    assert_eq!(
        universe.dispatch(ghost, "foo", vec![]).unwrap(),
        Value::new_string("caught:foo")
    );
}

#[test]
fn handlers_are_found_along_the_ancestors() {
    let mut universe = Universe::new();
    let catcher = universe.define_module("Catcher").unwrap();
    universe
        .define_missing_handler(catcher, |universe, _, name, args| {
            Ok(Value::new_string(format!(
                "module:{}/{}",
                universe.lookup_symbol(name),
                args.len()
            )))
        })
        .unwrap();
    let base = universe.define_class("Base", None).unwrap();
    universe
        .define_missing_handler(base, |_, _, _, _| Ok(Value::new_string("base")))
        .unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    universe.include(child, catcher).unwrap();

    let child_instance = universe.instantiate(child).unwrap();
    let base_instance = universe.instantiate(base).unwrap();
    assert_eq!(
        universe
            .dispatch(child_instance, "nope", vec![Value::Nil, Value::Nil])
            .unwrap(),
        Value::new_string("module:nope/2")
    );
    assert_eq!(
        universe.dispatch(base_instance, "nope", vec![]).unwrap(),
        Value::new_string("base")
    );
}

#[test]
fn handlers_can_send_unknown_messages_again() {
    let mut universe = Universe::new();
    let class = universe.define_class("Proxy", None).unwrap();
    universe
        .define_missing_handler(class, |universe, receiver, name, _| {
            let name = universe.lookup_symbol(name).to_string();
            match name.strip_prefix("forward_") {
                Some(rest) => universe.dispatch(receiver, rest, vec![]),
                None => Ok(Value::new_string(format!("caught:{}", name))),
            }
        })
        .unwrap();
    let proxy = universe.instantiate(class).unwrap();

    assert_eq!(
        universe.dispatch(proxy, "forward_bar", vec![]).unwrap(),
        Value::new_string("caught:bar")
    );
    assert!(universe.frames.is_empty());
}

#[test]
fn super_from_a_handler_reaches_the_next_handler() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    universe
        .define_missing_handler(base, |universe, _, name, args| {
            Ok(Value::new_string(format!(
                "base:{}/{}",
                universe.lookup_symbol(name),
                args.len()
            )))
        })
        .unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    universe
        .define_missing_handler(child, |universe, _, name, args| {
            if universe.lookup_symbol(name).starts_with("defer_") {
                universe.super_dispatch(args)
            } else {
                Ok(Value::new_string("child"))
            }
        })
        .unwrap();
    let instance = universe.instantiate(child).unwrap();

    assert_eq!(
        universe.dispatch(instance.clone(), "other", vec![]).unwrap(),
        Value::new_string("child")
    );
    assert_eq!(
        universe
            .dispatch(instance.clone(), "defer_other", vec![Value::Nil])
            .unwrap(),
        Value::new_string("base:defer_other/1")
    );
    assert!(universe.frames.is_empty());

    let lone = universe.define_class("Lone", None).unwrap();
    universe
        .define_missing_handler(lone, |universe, _, _, args| universe.super_dispatch(args))
        .unwrap();
    let lone = universe.instantiate(lone).unwrap();
    assert!(matches!(
        universe.dispatch(lone, "anything", vec![]),
        Err(Error::MethodNotFound { .. })
    ));
    assert!(universe.frames.is_empty());
}

#[test]
fn private_methods_need_an_implicit_receiver() {
    let mut universe = Universe::new();
    let class = universe.define_class("Vault", None).unwrap();
    universe
        .define_instance_method(class, "secret", Arity::Exact(0), Visibility::Private, returning("42"))
        .unwrap();
    universe
        .define_method(class, "reveal", Arity::Exact(0), |universe, this, _| {
            universe.dispatch(this, "secret", vec![])
        })
        .unwrap();
    universe
        .define_method(class, "peek", Arity::Exact(1), |universe, _, args| {
            universe.dispatch(first(args), "secret", vec![])
        })
        .unwrap();

    let vault = universe.instantiate(class).unwrap();
    let other = universe.instantiate(class).unwrap();

    match universe.dispatch(vault.clone(), "secret", vec![]) {
        Err(Error::Visibility { name, visibility, .. }) => {
            assert_eq!(name, "secret");
            assert_eq!(visibility, Visibility::Private);
        }
        other => panic!("expected a visibility error, got {:?}", other),
    }
    assert_eq!(
        universe.dispatch(vault.clone(), "reveal", vec![]).unwrap(),
        Value::new_string("42")
    );
    assert!(matches!(
        universe.dispatch(vault.clone(), "peek", vec![other.clone()]),
        Err(Error::Visibility { .. })
    ));
    assert_eq!(
        universe.send(vault.clone(), "secret", vec![]).unwrap(),
        Value::new_string("42")
    );
    assert!(matches!(
        universe.public_send(vault.clone(), "secret", vec![]),
        Err(Error::Visibility { .. })
    ));
    let signature = universe.intern_symbol("secret");
    assert_eq!(
        universe
            .dispatch_with(vault.clone(), signature, vec![], DispatchOptions::from_caller(vault.clone()))
            .unwrap(),
        Value::new_string("42")
    );

    assert!(!universe.responds_to(&vault, "secret", false).unwrap());
    assert!(universe.responds_to(&vault, "secret", true).unwrap());
    assert!(universe.responds_to_any(&vault, "secret").unwrap());
}

#[test]
fn visibility_errors_bypass_the_handler() {
    let mut universe = Universe::new();
    let class = universe.define_class("Guarded", None).unwrap();
    universe
        .define_instance_method(class, "hidden", Arity::Exact(0), Visibility::Private, returning("x"))
        .unwrap();
    universe
        .define_missing_handler(class, |_, _, _, _| Ok(Value::new_string("handled")))
        .unwrap();
    let guarded = universe.instantiate(class).unwrap();

    assert!(matches!(
        universe.dispatch(guarded, "hidden", vec![]),
        Err(Error::Visibility { .. })
    ));
}

#[test]
fn protected_methods_are_shared_among_kin() {
    let mut universe = Universe::new();
    let account = universe.define_class("Account", None).unwrap();
    let savings = universe.define_class("Savings", Some(account)).unwrap();
    let stranger_class = universe.define_class("Stranger", None).unwrap();
    universe
        .define_instance_method(
            account,
            "balance",
            Arity::Exact(0),
            Visibility::Protected,
            |_, _, _| Ok(Value::Integer(100)),
        )
        .unwrap();
    universe
        .define_method(account, "compare", Arity::Exact(1), |universe, _, args| {
            universe.dispatch(first(args), "balance", vec![])
        })
        .unwrap();
    universe
        .define_method(stranger_class, "snoop", Arity::Exact(1), |universe, _, args| {
            universe.dispatch(first(args), "balance", vec![])
        })
        .unwrap();

    let mine = universe.instantiate(account).unwrap();
    let theirs = universe.instantiate(savings).unwrap();
    let stranger = universe.instantiate(stranger_class).unwrap();

    assert_eq!(
        universe.dispatch(theirs.clone(), "compare", vec![mine.clone()]).unwrap(),
        Value::Integer(100)
    );
    assert_eq!(
        universe.dispatch(mine.clone(), "compare", vec![theirs.clone()]).unwrap(),
        Value::Integer(100)
    );
    assert!(matches!(
        universe.dispatch(stranger, "snoop", vec![mine.clone()]),
        Err(Error::Visibility { .. })
    ));
    assert!(matches!(
        universe.dispatch(mine, "balance", vec![]),
        Err(Error::Visibility { .. })
    ));
}

#[test]
fn arity_is_checked_before_invocation() {
    let mut universe = Universe::new();
    let class = universe.define_class("Strict", None).unwrap();
    universe
        .define_method(class, "pair", Arity::Exact(2), |_, _, _| panic!("must not run"))
        .unwrap();
    universe
        .define_method(class, "some", Arity::Between(1, 2), |_, _, args| {
            Ok(Value::Integer(args.len() as i64))
        })
        .unwrap();
    let strict = universe.instantiate(class).unwrap();

    match universe.dispatch(strict.clone(), "pair", vec![Value::Nil]) {
        Err(Error::Argument { name, expected, given }) => {
            assert_eq!(name, "pair");
            assert_eq!(expected, Arity::Exact(2));
            assert_eq!(given, 1);
        }
        other => panic!("expected an argument error, got {:?}", other),
    }
    assert_eq!(
        universe.dispatch(strict.clone(), "some", vec![Value::Nil, Value::Nil]).unwrap(),
        Value::Integer(2)
    );
    assert!(matches!(
        universe.dispatch(strict, "some", vec![]),
        Err(Error::Argument { .. })
    ));
}

#[test]
fn methods_run_with_their_receiver_as_self() {
    let mut universe = Universe::new();
    let class = universe.define_class("Itself", None).unwrap();
    universe
        .define_method(class, "me", Arity::Exact(0), |universe, _, _| {
            Ok(universe.current_self().unwrap())
        })
        .unwrap();
    let itself = universe.instantiate(class).unwrap();

    assert_eq!(universe.dispatch(itself.clone(), "me", vec![]).unwrap(), itself);
    assert!(universe.current_frame().is_none());
}

#[test]
fn super_walks_up_the_ancestors() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let politeness = universe.define_module("Politeness").unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    universe.include(child, politeness).unwrap();

    universe
        .define_method(base, "greet", Arity::Exact(0), returning("base"))
        .unwrap();
    universe
        .define_method(politeness, "greet", Arity::Exact(0), |universe, _, _| {
            let above = universe.super_dispatch(vec![])?;
            Ok(Value::new_string(format!("{}+polite", above.as_str().unwrap())))
        })
        .unwrap();
    universe
        .define_method(child, "greet", Arity::Exact(0), |universe, _, _| {
            let above = universe.super_dispatch(vec![])?;
            Ok(Value::new_string(format!("{}+child", above.as_str().unwrap())))
        })
        .unwrap();

    let instance = universe.instantiate(child).unwrap();
    assert_eq!(
        universe.dispatch(instance.clone(), "greet", vec![]).unwrap(),
        Value::new_string("base+polite+child")
    );

    // A singleton method can call up into the class.
    universe
        .define_singleton_method(&instance, "greet", Arity::Exact(0), |universe, _, _| {
            let above = universe.super_dispatch(vec![])?;
            Ok(Value::new_string(format!("{}+single", above.as_str().unwrap())))
        })
        .unwrap();
    assert_eq!(
        universe.dispatch(instance, "greet", vec![]).unwrap(),
        Value::new_string("base+polite+child+single")
    );
}

#[test]
fn super_without_a_definition_above() {
    let mut universe = Universe::new();
    assert!(matches!(universe.super_dispatch(vec![]), Err(Error::Name(_))));

    let class = universe.define_class("Lonely", None).unwrap();
    universe
        .define_method(class, "alone", Arity::Exact(0), |universe, _, _| {
            universe.super_dispatch(vec![])
        })
        .unwrap();
    let lonely = universe.instantiate(class).unwrap();
    assert!(matches!(
        universe.dispatch(lonely.clone(), "alone", vec![]),
        Err(Error::MethodNotFound { .. })
    ));

    universe
        .define_missing_handler(class, |universe, _, name, _| {
            Ok(Value::new_string(format!("caught:{}", universe.lookup_symbol(name))))
        })
        .unwrap();
    assert_eq!(
        universe.dispatch(lonely, "alone", vec![]).unwrap(),
        Value::new_string("caught:alone")
    );
}

#[test]
fn undefined_methods_stop_the_search() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    let grandchild = universe.define_class("GrandChild", Some(child)).unwrap();
    universe
        .define_method(base, "hello", Arity::Exact(0), returning("hello"))
        .unwrap();

    universe.undef_method(child, "hello").unwrap();
    let instance = universe.instantiate(grandchild).unwrap();
    assert!(!universe.responds_to(&instance, "hello", true).unwrap());
    assert!(matches!(
        universe.dispatch(instance.clone(), "hello", vec![]),
        Err(Error::MethodNotFound { .. })
    ));
    assert!(matches!(universe.undef_method(child, "hello"), Err(Error::Name(_))));

    universe
        .define_method(grandchild, "hello", Arity::Exact(0), returning("again"))
        .unwrap();
    assert_eq!(
        universe.dispatch(instance, "hello", vec![]).unwrap(),
        Value::new_string("again")
    );
}

#[test]
fn removing_a_method_exposes_the_inherited_one() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    universe
        .define_method(base, "who", Arity::Exact(0), returning("base"))
        .unwrap();
    universe
        .define_method(child, "who", Arity::Exact(0), returning("child"))
        .unwrap();
    let instance = universe.instantiate(child).unwrap();

    assert_eq!(
        universe.dispatch(instance.clone(), "who", vec![]).unwrap(),
        Value::new_string("child")
    );
    universe.remove_method(child, "who").unwrap();
    assert_eq!(
        universe.dispatch(instance, "who", vec![]).unwrap(),
        Value::new_string("base")
    );
    assert!(matches!(universe.remove_method(child, "who"), Err(Error::Name(_))));
}

#[test]
fn immediates_dispatch_through_their_core_class() {
    let mut universe = Universe::new();
    let integer_class = universe.core.integer_class;
    universe
        .define_method(integer_class, "double", Arity::Exact(0), |_, this, _| match this {
            Value::Integer(value) => Ok(Value::Integer(value * 2)),
            _ => unreachable!(),
        })
        .unwrap();

    assert_eq!(
        universe.dispatch(Value::Integer(21), "double", vec![]).unwrap(),
        Value::Integer(42)
    );
    assert_eq!(
        universe.dispatch(Value::Nil, "class", vec![]).unwrap(),
        Value::Object(universe.core.nil_class)
    );
    assert!(matches!(
        universe.dispatch(Value::new_string("text"), "double", vec![]),
        Err(Error::MethodNotFound { .. })
    ));
}
