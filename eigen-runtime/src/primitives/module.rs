use std::rc::Rc;

use eigen_core::{Arity, Visibility};

use crate::error::{Error, Result};
use crate::expect_args;
use crate::graph::is_attribute_name;
use crate::heap::ObjectRef;
use crate::primitives::{class_arg, method_arg, name_arg, symbol, symbols, PrimitiveTable};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: PrimitiveTable = &[
    ("name", self::name, Arity::Exact(0), Visibility::Public),
    ("to_s", self::to_s, Arity::Exact(0), Visibility::Public),
    ("ancestors", self::ancestors, Arity::Exact(0), Visibility::Public),
    ("include", self::include, Arity::AtLeast(1), Visibility::Public),
    ("include?", self::includes, Arity::Exact(1), Visibility::Public),
    ("instance_methods", self::instance_methods, Arity::Between(0, 1), Visibility::Public),
    (
        "private_instance_methods",
        self::private_instance_methods,
        Arity::Between(0, 1),
        Visibility::Public,
    ),
    ("instance_method", self::instance_method, Arity::Exact(1), Visibility::Public),
    ("method_defined?", self::method_defined, Arity::Exact(1), Visibility::Public),
    ("alias_method", self::alias_method, Arity::Exact(2), Visibility::Public),
    ("remove_method", self::remove_method, Arity::Exact(1), Visibility::Public),
    ("undef_method", self::undef_method, Arity::Exact(1), Visibility::Public),
    ("public", self::public, Arity::AtLeast(1), Visibility::Public),
    ("protected", self::protected, Arity::AtLeast(1), Visibility::Public),
    ("private", self::private, Arity::AtLeast(1), Visibility::Public),
    ("attr_reader", self::attr_reader, Arity::AtLeast(1), Visibility::Public),
    ("attr_writer", self::attr_writer, Arity::AtLeast(1), Visibility::Public),
    ("attr_accessor", self::attr_accessor, Arity::AtLeast(1), Visibility::Public),
    ("define_method", self::define_method, Arity::Exact(2), Visibility::Public),
];

fn receiver_class(universe: &Universe, signature: &str, receiver: &Value) -> Result<ObjectRef> {
    class_arg(universe, signature, receiver)
}

fn name(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#name";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    match universe.class(class)?.name() {
        Some(name) => Ok(Value::new_string(name.to_string())),
        None => Ok(Value::Nil),
    }
}

fn to_s(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#to_s";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    Ok(Value::new_string(universe.display_name(class)))
}

fn ancestors(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#ancestors";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let ancestors = universe
        .ancestors(class)?
        .into_iter()
        .map(Value::Object)
        .collect();
    Ok(Value::new_array(ancestors))
}

fn include(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#include";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let mut modules = Vec::with_capacity(args.len());
    for arg in args.iter() {
        let module = class_arg(universe, SIGNATURE, arg)?;
        universe.check_include(class, module)?;
        modules.push(module);
    }
    // `include A, B` puts A before B in the ancestors.
    for module in modules.into_iter().rev() {
        universe.include(class, module)?;
    }
    Ok(receiver)
}

fn includes(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#include?";

    expect_args!(SIGNATURE, args, [
        module => module,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let module = class_arg(universe, SIGNATURE, &module)?;
    universe.expect_module(module)?;
    let included = class != module && universe.inherits_from(class, module)?;
    Ok(Value::Boolean(included))
}

fn inherited_flag(args: Vec<Value>) -> bool {
    args.into_iter().next().map_or(true, |value| value.is_truthy())
}

fn instance_methods(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#instance_methods";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let names = universe.instance_methods(class, inherited_flag(args))?;
    Ok(symbols(universe, names))
}

fn private_instance_methods(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#private_instance_methods";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let names = universe.private_instance_methods(class, inherited_flag(args))?;
    Ok(symbols(universe, names))
}

fn instance_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#instance_method";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let name = name_arg(universe, SIGNATURE, &name)?;
    let unbound = universe.instance_method(class, &name)?;
    Ok(Value::UnboundMethod(Rc::new(unbound)))
}

fn method_defined(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#method_defined?";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let name = name_arg(universe, SIGNATURE, &name)?;
    let signature = universe.intern_symbol(&name);
    let defined = universe
        .resolve_instance_method(class, signature)?
        .method()
        .map_or(false, |method| method.visibility() != Visibility::Private);
    Ok(Value::Boolean(defined))
}

fn alias_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#alias_method";

    expect_args!(SIGNATURE, args, [
        new_name => new_name,
        old_name => old_name,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let new_name = name_arg(universe, SIGNATURE, &new_name)?;
    let old_name = name_arg(universe, SIGNATURE, &old_name)?;
    universe.alias_method(class, &new_name, &old_name)?;
    Ok(symbol(universe, &new_name))
}

fn remove_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#remove_method";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let name = name_arg(universe, SIGNATURE, &name)?;
    universe.remove_method(class, &name)?;
    Ok(receiver)
}

fn undef_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#undef_method";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let name = name_arg(universe, SIGNATURE, &name)?;
    universe.undef_method(class, &name)?;
    Ok(receiver)
}

fn change_visibility(
    universe: &mut Universe,
    signature: &str,
    receiver: Value,
    args: Vec<Value>,
    visibility: Visibility,
) -> Result<Value> {
    let class = receiver_class(universe, signature, &receiver)?;
    let mut names = Vec::with_capacity(args.len());
    for arg in args.iter() {
        let name = name_arg(universe, signature, arg)?;
        let interned = universe.intern_symbol(&name);
        if !universe.resolve_instance_method(class, interned)?.is_found() {
            return Err(Error::Name(format!(
                "undefined method '{}' for class '{}'",
                name,
                universe.display_name(class)
            )));
        }
        names.push(name);
    }
    for name in names.iter() {
        universe.set_visibility(class, name, visibility)?;
    }
    Ok(Value::Nil)
}

fn public(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    change_visibility(universe, "Module#public", receiver, args, Visibility::Public)
}

fn protected(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    change_visibility(universe, "Module#protected", receiver, args, Visibility::Protected)
}

fn private(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    change_visibility(universe, "Module#private", receiver, args, Visibility::Private)
}

fn attribute_names(universe: &Universe, signature: &str, args: &[Value]) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(args.len());
    for arg in args {
        let name = name_arg(universe, signature, arg)?;
        if !is_attribute_name(&name) {
            return Err(Error::Name(format!("invalid attribute name '{}'", name)));
        }
        names.push(name);
    }
    Ok(names)
}

fn attr_reader(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#attr_reader";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let names = attribute_names(universe, SIGNATURE, &args)?;
    for name in names.iter() {
        universe.attr_reader(class, name)?;
    }
    Ok(symbols(universe, names))
}

fn attr_writer(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#attr_writer";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let names = attribute_names(universe, SIGNATURE, &args)?;
    for name in names.iter() {
        universe.attr_writer(class, name)?;
    }
    let writers = names.iter().map(|name| format!("{}=", name)).collect();
    Ok(symbols(universe, writers))
}

fn attr_accessor(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#attr_accessor";

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let names = attribute_names(universe, SIGNATURE, &args)?;
    let mut defined = Vec::with_capacity(names.len() * 2);
    for name in names {
        universe.attr_accessor(class, &name)?;
        let writer = format!("{}=", name);
        defined.push(name);
        defined.push(writer);
    }
    Ok(symbols(universe, defined))
}

fn define_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Module#define_method";

    expect_args!(SIGNATURE, args, [
        name => name,
        method => method,
    ]);

    let class = receiver_class(universe, SIGNATURE, &receiver)?;
    let name = name_arg(universe, SIGNATURE, &name)?;
    let method = method_arg(universe, SIGNATURE, &method)?;
    universe.define_method_from(class, &name, &method)?;
    Ok(symbol(universe, &name))
}
