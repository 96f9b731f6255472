use std::rc::Rc;

use eigen_core::{Arity, Visibility};

use crate::error::{Error, Result};
use crate::expect_args;
use crate::method::{BoundMethod, UnboundMethod};
use crate::primitives::PrimitiveTable;
use crate::universe::Universe;
use crate::value::Value;

pub static METHOD_PRIMITIVES: PrimitiveTable = &[
    ("call", self::call, Arity::AtLeast(0), Visibility::Public),
    ("unbind", self::unbind, Arity::Exact(0), Visibility::Public),
    ("owner", self::owner, Arity::Exact(0), Visibility::Public),
    ("receiver", self::receiver, Arity::Exact(0), Visibility::Public),
    ("name", self::name, Arity::Exact(0), Visibility::Public),
    ("arity", self::arity, Arity::Exact(0), Visibility::Public),
];

pub static UNBOUND_METHOD_PRIMITIVES: PrimitiveTable = &[
    ("bind", self::bind, Arity::Exact(1), Visibility::Public),
    ("owner", self::unbound_owner, Arity::Exact(0), Visibility::Public),
    ("name", self::unbound_name, Arity::Exact(0), Visibility::Public),
    ("arity", self::unbound_arity, Arity::Exact(0), Visibility::Public),
];

fn bound(universe: &Universe, signature: &str, receiver: Value) -> Result<Rc<BoundMethod>> {
    match receiver {
        Value::Method(bound) => Ok(bound),
        other => Err(Error::Type(format!(
            "'{}': {} is not a method",
            signature,
            universe.inspect(&other)
        ))),
    }
}

fn unbound(universe: &Universe, signature: &str, receiver: Value) -> Result<Rc<UnboundMethod>> {
    match receiver {
        Value::UnboundMethod(unbound) => Ok(unbound),
        other => Err(Error::Type(format!(
            "'{}': {} is not an unbound method",
            signature,
            universe.inspect(&other)
        ))),
    }
}

fn call(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#call";

    let method = bound(universe, SIGNATURE, receiver)?;
    method.call(universe, args)
}

fn unbind(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#unbind";

    let method = bound(universe, SIGNATURE, receiver)?;
    Ok(Value::UnboundMethod(Rc::new(method.unbind())))
}

fn owner(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#owner";

    let method = bound(universe, SIGNATURE, receiver)?;
    Ok(Value::Object(method.owner()))
}

fn receiver(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#receiver";

    let method = bound(universe, SIGNATURE, receiver)?;
    Ok(method.receiver.clone())
}

fn name(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#name";

    let method = bound(universe, SIGNATURE, receiver)?;
    Ok(Value::Symbol(method.method.signature()))
}

fn arity(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Method#arity";

    let method = bound(universe, SIGNATURE, receiver)?;
    Ok(Value::Integer(method.method.arity().as_signed()))
}

fn bind(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "UnboundMethod#bind";

    expect_args!(SIGNATURE, args, [
        target => target,
    ]);

    let method = unbound(universe, SIGNATURE, receiver)?;
    let bound = universe.bind(&method, target)?;
    Ok(Value::Method(Rc::new(bound)))
}

fn unbound_owner(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "UnboundMethod#owner";

    let method = unbound(universe, SIGNATURE, receiver)?;
    Ok(Value::Object(method.owner()))
}

fn unbound_name(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "UnboundMethod#name";

    let method = unbound(universe, SIGNATURE, receiver)?;
    Ok(Value::Symbol(method.method.signature()))
}

fn unbound_arity(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "UnboundMethod#arity";

    let method = unbound(universe, SIGNATURE, receiver)?;
    Ok(Value::Integer(method.method.arity().as_signed()))
}
