use std::rc::Rc;

use eigen_core::{Arity, Visibility};

use crate::dispatch::DispatchOptions;
use crate::error::Result;
use crate::expect_args;
use crate::primitives::{class_arg, method_arg, name_arg, symbol, symbols, PrimitiveTable};
use crate::universe::Universe;
use crate::value::Value;

pub static OBJECT_PRIMITIVES: PrimitiveTable = &[
    ("initialize", self::initialize, Arity::Exact(0), Visibility::Private),
    ("==", self::eq, Arity::Exact(1), Visibility::Public),
    ("equal?", self::eq, Arity::Exact(1), Visibility::Public),
];

pub static INSTANCE_PRIMITIVES: PrimitiveTable = &[
    ("class", self::class, Arity::Exact(0), Visibility::Public),
    ("singleton_class", self::singleton_class, Arity::Exact(0), Visibility::Public),
    ("object_id", self::object_id, Arity::Exact(0), Visibility::Public),
    ("inspect", self::inspect, Arity::Exact(0), Visibility::Public),
    ("to_s", self::inspect, Arity::Exact(0), Visibility::Public),
    ("nil?", self::is_nil, Arity::Exact(0), Visibility::Public),
    ("respond_to?", self::respond_to, Arity::Between(1, 2), Visibility::Public),
    ("send", self::send, Arity::AtLeast(1), Visibility::Public),
    ("__send__", self::send, Arity::AtLeast(1), Visibility::Public),
    ("public_send", self::public_send, Arity::AtLeast(1), Visibility::Public),
    ("method", self::method, Arity::Exact(1), Visibility::Public),
    ("methods", self::methods, Arity::Exact(0), Visibility::Public),
    ("singleton_methods", self::singleton_methods, Arity::Exact(0), Visibility::Public),
    ("is_a?", self::is_a, Arity::Exact(1), Visibility::Public),
    ("kind_of?", self::is_a, Arity::Exact(1), Visibility::Public),
    ("instance_of?", self::instance_of, Arity::Exact(1), Visibility::Public),
    ("instance_variables", self::instance_variables, Arity::Exact(0), Visibility::Public),
    ("instance_variable_get", self::instance_variable_get, Arity::Exact(1), Visibility::Public),
    ("instance_variable_set", self::instance_variable_set, Arity::Exact(2), Visibility::Public),
    ("extend", self::extend, Arity::AtLeast(1), Visibility::Public),
    (
        "define_singleton_method",
        self::define_singleton_method,
        Arity::Exact(2),
        Visibility::Public,
    ),
];

fn initialize(_: &mut Universe, _: Value, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Nil)
}

fn eq(_: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Object#==";

    expect_args!(SIGNATURE, args, [
        other => other,
    ]);

    Ok(Value::Boolean(receiver.is_identical(&other)))
}

fn class(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Object(universe.class_of(&receiver)?))
}

fn singleton_class(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Object(universe.eigenclass_of(&receiver)?))
}

fn object_id(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    let id = match &receiver {
        Value::Nil => 8,
        Value::Boolean(true) => 20,
        Value::Boolean(false) => 0,
        Value::Integer(value) => value.wrapping_mul(2).wrapping_add(1),
        Value::Double(value) => value.to_bits() as i64,
        Value::Symbol(symbol) => i64::from(symbol.id()) * 8 + 12,
        Value::String(value) => Rc::as_ptr(value) as i64,
        Value::Array(value) => Rc::as_ptr(value) as i64,
        Value::Method(value) => Rc::as_ptr(value) as i64,
        Value::UnboundMethod(value) => Rc::as_ptr(value) as i64,
        Value::Object(object) => {
            universe.heap.get(*object)?;
            object.id() as i64
        }
    };
    Ok(Value::Integer(id))
}

fn inspect(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    Ok(Value::new_string(universe.inspect(&receiver)))
}

fn is_nil(_: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    Ok(Value::Boolean(matches!(receiver, Value::Nil)))
}

fn respond_to(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#respond_to?";

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(name) => name_arg(universe, SIGNATURE, &name)?,
        None => return Ok(Value::Boolean(false)),
    };
    let include_private = args.next().map_or(false, |value| value.is_truthy());

    Ok(Value::Boolean(universe.responds_to(&receiver, &name, include_private)?))
}

fn send(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#send";

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(name) => name_arg(universe, SIGNATURE, &name)?,
        None => return Ok(Value::Nil),
    };
    let signature = universe.intern_symbol(&name);
    universe.dispatch_with(receiver, signature, args.collect(), DispatchOptions::bypassing())
}

fn public_send(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#public_send";

    let mut args = args.into_iter();
    let name = match args.next() {
        Some(name) => name_arg(universe, SIGNATURE, &name)?,
        None => return Ok(Value::Nil),
    };
    let signature = universe.intern_symbol(&name);
    universe.dispatch_with(receiver, signature, args.collect(), DispatchOptions::external())
}

fn method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#method";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let name = name_arg(universe, SIGNATURE, &name)?;
    let bound = universe.extract_method(&receiver, &name)?;
    Ok(Value::Method(Rc::new(bound)))
}

fn methods(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    let names = universe.methods(&receiver)?;
    Ok(symbols(universe, names))
}

fn singleton_methods(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    let names = universe.singleton_methods(&receiver)?;
    Ok(symbols(universe, names))
}

fn is_a(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#is_a?";

    expect_args!(SIGNATURE, args, [
        class => class,
    ]);

    let class = class_arg(universe, SIGNATURE, &class)?;
    Ok(Value::Boolean(universe.is_kind_of(&receiver, class)?))
}

fn instance_of(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#instance_of?";

    expect_args!(SIGNATURE, args, [
        class => class,
    ]);

    let class = class_arg(universe, SIGNATURE, &class)?;
    Ok(Value::Boolean(universe.class_of(&receiver)? == class))
}

fn instance_variables(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    let names = universe.instance_variables(&receiver)?;
    Ok(symbols(universe, names))
}

fn instance_variable_get(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#instance_variable_get";

    expect_args!(SIGNATURE, args, [
        name => name,
    ]);

    let name = name_arg(universe, SIGNATURE, &name)?;
    universe.instance_variable_get(&receiver, &name)
}

fn instance_variable_set(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#instance_variable_set";

    expect_args!(SIGNATURE, args, [
        name => name,
        value => value,
    ]);

    let name = name_arg(universe, SIGNATURE, &name)?;
    universe.instance_variable_set(&receiver, &name, value)
}

fn extend(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#extend";

    let mut modules = Vec::with_capacity(args.len());
    for arg in args.iter() {
        let module = class_arg(universe, SIGNATURE, arg)?;
        universe.expect_module(module)?;
        modules.push(module);
    }
    for module in modules.into_iter().rev() {
        universe.extend(&receiver, module)?;
    }
    Ok(receiver)
}

fn define_singleton_method(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Kernel#define_singleton_method";

    expect_args!(SIGNATURE, args, [
        name => name,
        method => method,
    ]);

    let name = name_arg(universe, SIGNATURE, &name)?;
    let method = method_arg(universe, SIGNATURE, &method)?;
    universe.define_singleton_method_from(&receiver, &name, &method)?;
    Ok(symbol(universe, &name))
}
