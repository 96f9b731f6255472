use eigen_core::{Arity, Interner, Visibility};

#[test]
fn interning_is_stable() {
    let mut interner = Interner::with_capacity(8);

    let greet = interner.intern("greet");
    let call = interner.intern("call");

    assert_ne!(greet, call);
    assert_eq!(interner.intern("greet"), greet);
    assert_eq!(interner.lookup(greet), "greet");
    assert_eq!(interner.lookup(call), "call");
    assert_eq!(interner.len(), 2);
    assert_eq!((greet.id(), call.id()), (0, 1));
}

#[test]
fn get_does_not_intern() {
    let mut interner = Interner::default();

    assert_eq!(interner.get("missing"), None);
    assert!(interner.is_empty());

    let id = interner.intern("present");
    assert_eq!(interner.get("present"), Some(id));
}

#[test]
fn arity_acceptance() {
    assert!(Arity::Exact(0).accepts(0));
    assert!(!Arity::Exact(0).accepts(1));
    assert!(Arity::AtLeast(1).accepts(5));
    assert!(!Arity::AtLeast(1).accepts(0));
    assert!(Arity::Between(1, 2).accepts(2));
    assert!(!Arity::Between(1, 2).accepts(3));

    assert_eq!(Arity::Between(1, 3).required(), 1);
    assert_eq!(Arity::Exact(2).as_signed(), 2);
    assert_eq!(Arity::AtLeast(1).as_signed(), -2);
    assert_eq!(Arity::Between(0, 1).as_signed(), -1);
}

#[test]
fn visibility_keywords() {
    assert_eq!(Visibility::from_keyword("private"), Some(Visibility::Private));
    assert_eq!(Visibility::from_keyword("protected"), Some(Visibility::Protected));
    assert_eq!(Visibility::from_keyword("public"), Some(Visibility::Public));
    assert_eq!(Visibility::from_keyword("secret"), None);
    assert_eq!(Visibility::default().to_string(), "public");
}
