use eigen_core::Arity;

use eigen_runtime::ancestors::Resolution;
use eigen_runtime::heap::ObjectRef;
use eigen_runtime::universe::Universe;
use eigen_runtime::value::Value;
use eigen_runtime::{Error, Result};

fn returning(text: &'static str) -> impl Fn(&mut Universe, Value, Vec<Value>) -> Result<Value> {
    move |_, _, _| Ok(Value::new_string(text))
}

fn names(universe: &Universe, chain: Vec<ObjectRef>) -> Vec<String> {
    chain
        .into_iter()
        .map(|holder| universe.display_name(holder))
        .collect()
}

fn call(universe: &mut Universe, receiver: &Value, name: &str) -> Value {
    universe
        .dispatch(receiver.clone(), name, vec![])
        .unwrap_or_else(|err| panic!("'{}' failed: {}", name, err))
}

#[test]
fn core_hierarchy() {
    let universe = Universe::new();
    let class_class = universe.class_class();
    let module_class = universe.module_class();
    let object_class = universe.object_class();

    assert_eq!(universe.class_of(&Value::Object(class_class)).unwrap(), class_class);
    assert_eq!(universe.superclass(class_class).unwrap(), Some(module_class));
    assert_eq!(universe.superclass(module_class).unwrap(), Some(object_class));
    assert_eq!(universe.superclass(object_class).unwrap(), None);
    assert_eq!(
        names(&universe, universe.ancestors(class_class).unwrap()),
        vec!["Class", "Module", "Object", "Kernel"]
    );
    assert_eq!(
        names(&universe, universe.ancestors(universe.core.integer_class).unwrap()),
        vec!["Integer", "Object", "Kernel"]
    );

    for name in ["Object", "Module", "Class", "Kernel", "NilClass", "Method"].iter() {
        assert!(universe.lookup_constant(name).is_some(), "missing constant {}", name);
    }
}

#[test]
fn superclass_methods_are_inherited() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    let method = universe
        .define_method(base, "hello", Arity::Exact(0), returning("from base"))
        .unwrap();

    let instance = universe.instantiate(child).unwrap();
    let signature = universe.intern_symbol("hello");
    match universe.resolve(&instance, signature).unwrap() {
        Resolution::Found(found) => {
            assert!(std::rc::Rc::ptr_eq(&found, &method));
            assert_eq!(found.holder(), base);
        }
        Resolution::NotFound => panic!("'hello' should resolve"),
    }
    assert_eq!(call(&mut universe, &instance, "hello"), Value::new_string("from base"));
}

#[test]
fn own_definitions_shadow_included_modules() {
    let mut universe = Universe::new();
    let greeting = universe.define_module("Greeting").unwrap();
    universe
        .define_method(greeting, "greet", Arity::Exact(0), returning("hi"))
        .unwrap();

    // Module scenario: the module answers until the class overrides it.
    let greeter = universe.define_class("Greeter", None).unwrap();
    universe.include(greeter, greeting).unwrap();
    let instance = universe.instantiate(greeter).unwrap();
    assert_eq!(call(&mut universe, &instance, "greet"), Value::new_string("hi"));
    universe
        .define_method(greeter, "greet", Arity::Exact(0), returning("bye"))
        .unwrap();
    assert_eq!(call(&mut universe, &instance, "greet"), Value::new_string("bye"));

    // The class wins even when the module is included after the definition.
    let late = universe.define_class("Late", None).unwrap();
    universe
        .define_method(late, "greet", Arity::Exact(0), returning("own"))
        .unwrap();
    universe.include(late, greeting).unwrap();
    let instance = universe.instantiate(late).unwrap();
    assert_eq!(call(&mut universe, &instance, "greet"), Value::new_string("own"));
}

#[test]
fn latest_included_module_wins() {
    let mut universe = Universe::new();
    let first = universe.define_module("First").unwrap();
    let second = universe.define_module("Second").unwrap();
    let inner = universe.define_module("Inner").unwrap();
    universe
        .define_method(first, "which", Arity::Exact(0), returning("first"))
        .unwrap();
    universe
        .define_method(second, "which", Arity::Exact(0), returning("second"))
        .unwrap();
    universe.include(second, inner).unwrap();

    let class = universe.define_class("Mixed", None).unwrap();
    universe.include(class, first).unwrap();
    universe.include(class, second).unwrap();

    assert_eq!(
        names(&universe, universe.ancestors(class).unwrap()),
        vec!["Mixed", "Second", "Inner", "First", "Object", "Kernel"]
    );
    let instance = universe.instantiate(class).unwrap();
    assert_eq!(call(&mut universe, &instance, "which"), Value::new_string("second"));
}

#[test]
fn reinclusion_keeps_the_original_position() {
    let mut universe = Universe::new();
    let first = universe.define_module("First").unwrap();
    let second = universe.define_module("Second").unwrap();
    let class = universe.define_class("Mixed", None).unwrap();
    universe.include(class, first).unwrap();
    universe.include(class, second).unwrap();
    universe.include(class, first).unwrap();

    assert_eq!(universe.class(class).unwrap().includes, vec![first, second]);
    assert_eq!(
        names(&universe, universe.ancestors(class).unwrap()),
        vec!["Mixed", "Second", "First", "Object", "Kernel"]
    );
}

#[test]
fn shared_modules_are_searched_at_their_most_specific_position() {
    let mut universe = Universe::new();
    let shared = universe.define_module("Shared").unwrap();
    let base = universe.define_class("Base", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    universe.include(base, shared).unwrap();
    universe.include(child, shared).unwrap();

    assert_eq!(
        names(&universe, universe.ancestors(child).unwrap()),
        vec!["Child", "Shared", "Base", "Object", "Kernel"]
    );
}

#[test]
fn inclusion_cycles_are_rejected() {
    let mut universe = Universe::new();
    let outer = universe.define_module("Outer").unwrap();
    let inner = universe.define_module("Inner").unwrap();
    universe.include(outer, inner).unwrap();

    assert!(matches!(
        universe.include(inner, outer),
        Err(Error::CyclicHierarchy { .. })
    ));
    assert!(matches!(
        universe.include(outer, outer),
        Err(Error::CyclicHierarchy { .. })
    ));
    assert!(universe.class(inner).unwrap().includes.is_empty());
    assert_eq!(universe.class(outer).unwrap().includes, vec![inner]);

    let class = universe.define_class("Plain", None).unwrap();
    let other = universe.define_class("Other", None).unwrap();
    assert!(matches!(universe.include(class, other), Err(Error::Type(_))));
}

#[test]
fn cyclic_superclass_leaves_the_graph_unchanged() {
    let mut universe = Universe::new();
    let a = universe.define_class("A", None).unwrap();
    let b = universe.define_class("B", Some(a)).unwrap();
    let c = universe.define_class("C", Some(b)).unwrap();

    let before = universe.ancestors(c).unwrap();
    match universe.set_superclass(a, c) {
        Err(Error::CyclicHierarchy { .. }) => {}
        other => panic!("expected a cyclic hierarchy error, got {:?}", other),
    }
    assert!(matches!(
        universe.set_superclass(a, a),
        Err(Error::CyclicHierarchy { .. })
    ));
    assert_eq!(universe.superclass(a).unwrap(), Some(universe.object_class()));
    assert_eq!(universe.ancestors(c).unwrap(), before);

    let module = universe.define_module("M").unwrap();
    assert!(matches!(universe.set_superclass(module, a), Err(Error::Type(_))));
    assert!(matches!(universe.set_superclass(a, module), Err(Error::Type(_))));

    let d = universe.define_class("D", None).unwrap();
    universe.set_superclass(d, c).unwrap();
    assert_eq!(
        names(&universe, universe.ancestors(d).unwrap()),
        vec!["D", "C", "B", "A", "Object", "Kernel"]
    );
}

#[test]
fn reopening_a_class_replaces_methods() {
    let mut universe = Universe::new();
    let class = universe.define_class("Reopened", None).unwrap();
    universe
        .define_method(class, "call", Arity::Exact(0), returning("A"))
        .unwrap();
    let instance = universe.instantiate(class).unwrap();
    assert_eq!(call(&mut universe, &instance, "call"), Value::new_string("A"));

    let reopened = universe.define_class("Reopened", None).unwrap();
    assert_eq!(reopened, class);
    assert_eq!(universe.reopen(class).unwrap(), class);
    universe
        .define_method(reopened, "call", Arity::Exact(0), returning("B"))
        .unwrap();
    assert_eq!(call(&mut universe, &instance, "call"), Value::new_string("B"));
}

#[test]
fn reopening_with_another_superclass_fails() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let other = universe.define_class("Other", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();

    assert_eq!(universe.define_class("Child", Some(base)).unwrap(), child);
    assert_eq!(universe.define_class("Child", None).unwrap(), child);
    match universe.define_class("Child", Some(other)) {
        Err(Error::Type(message)) => assert!(message.contains("superclass mismatch")),
        other => panic!("expected a superclass mismatch, got {:?}", other),
    }

    let module = universe.define_module("Mod").unwrap();
    assert_eq!(universe.define_module("Mod").unwrap(), module);
    assert!(matches!(universe.define_class("Mod", None), Err(Error::Type(_))));
    assert!(matches!(universe.define_module("Base"), Err(Error::Type(_))));
}

#[test]
fn anonymous_classes_are_named_on_first_assignment() {
    let mut universe = Universe::new();
    let class = universe.new_class(None).unwrap();
    let module = universe.new_module().unwrap();
    assert!(universe.display_name(class).starts_with("#<Class:0x"));
    assert!(universe.display_name(module).starts_with("#<Module:0x"));

    universe.assign_constant("Named", Value::Object(class)).unwrap();
    universe.assign_constant("Alias", Value::Object(class)).unwrap();
    assert_eq!(universe.display_name(class), "Named");
    assert_eq!(universe.lookup_constant("Alias"), Some(Value::Object(class)));
    let names = universe.constant_names();
    assert_eq!(&names[names.len() - 2..], ["Named", "Alias"]);

    universe.set_name(class, "Renamed").unwrap();
    assert_eq!(universe.display_name(class), "Renamed");
    assert_eq!(universe.superclass(class).unwrap(), Some(universe.object_class()));
}

#[test]
fn only_classes_are_instantiable() {
    let mut universe = Universe::new();
    let module = universe.define_module("Mod").unwrap();
    let class = universe.define_class("Thing", None).unwrap();
    let thing = universe.instantiate(class).unwrap();
    let eigenclass = universe.eigenclass_of(&thing).unwrap();

    assert!(matches!(universe.instantiate(module), Err(Error::Type(_))));
    assert!(matches!(universe.instantiate(eigenclass), Err(Error::Type(_))));
    assert!(matches!(
        universe.instantiate(universe.core.integer_class),
        Err(Error::Type(_))
    ));
    assert!(matches!(universe.new_class(Some(module)), Err(Error::Type(_))));
    assert!(matches!(
        universe.new_class(Some(universe.class_class())),
        Err(Error::Type(_))
    ));

    assert!(matches!(
        universe.instantiate(universe.class_class()),
        Err(Error::Type(_))
    ));
    assert!(matches!(
        universe.instantiate(universe.module_class()),
        Err(Error::Type(_))
    ));
    let custom = universe.new_class(Some(universe.module_class())).unwrap();
    assert!(matches!(universe.instantiate(custom), Err(Error::Type(_))));
    for &core in &[universe.class_class(), universe.module_class()] {
        assert!(matches!(
            universe.dispatch(Value::Object(core), "allocate", vec![]),
            Err(Error::Type(_))
        ));
    }
}

#[test]
fn instance_state_is_shared_by_identity() {
    let mut universe = Universe::new();
    let class = universe.define_class("Thing", None).unwrap();
    let thing = universe.instantiate(class).unwrap();
    let same = thing.clone();

    assert_eq!(universe.instance_variable_get(&thing, "@count").unwrap(), Value::Nil);
    universe
        .instance_variable_set(&thing, "@count", Value::Integer(1))
        .unwrap();
    universe
        .instance_variable_set(&same, "@label", Value::new_string("one"))
        .unwrap();

    assert_eq!(universe.instance_variable_get(&same, "@count").unwrap(), Value::Integer(1));
    assert_eq!(universe.instance_variables(&thing).unwrap(), vec!["@count", "@label"]);
    assert!(matches!(
        universe.instance_variable_set(&thing, "count", Value::Nil),
        Err(Error::Name(_))
    ));
    assert!(matches!(
        universe.instance_variable_set(&Value::Integer(1), "@count", Value::Nil),
        Err(Error::Type(_))
    ));
}

#[test]
fn destroyed_entities_are_never_aliased() {
    let mut universe = Universe::new();
    let class = universe.define_class("Thing", None).unwrap();
    let old = universe.instantiate(class).unwrap();
    universe.destroy(&old).unwrap();

    let new = universe.instantiate(class).unwrap();
    assert_ne!(old, new);
    assert!(matches!(
        universe.instance_variable_get(&old, "@any"),
        Err(Error::UseAfterFree(_))
    ));
    assert!(matches!(universe.destroy(&old), Err(Error::UseAfterFree(_))));
    assert_eq!(universe.class_of(&new).unwrap(), class);
}

#[test]
fn destroyed_classes_break_lookups() {
    let mut universe = Universe::new();
    let base = universe.define_class("Base", None).unwrap();
    let child = universe.define_class("Child", Some(base)).unwrap();
    let instance = universe.instantiate(child).unwrap();

    universe.destroy(&Value::Object(base)).unwrap();
    assert!(matches!(
        universe.dispatch(instance, "class", vec![]),
        Err(Error::UseAfterFree(_))
    ));
    assert!(matches!(
        universe.destroy(&Value::Object(universe.object_class())),
        Err(Error::Type(_))
    ));
}
