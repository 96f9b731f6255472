use eigen_core::{Arity, Visibility};

use crate::error::{Error, Result};
use crate::primitives::{class_arg, PrimitiveTable};
use crate::universe::Universe;
use crate::value::Value;

pub static INSTANCE_PRIMITIVES: PrimitiveTable = &[
    ("new", self::new, Arity::AtLeast(0), Visibility::Public),
    ("allocate", self::allocate, Arity::Exact(0), Visibility::Public),
    ("superclass", self::superclass, Arity::Exact(0), Visibility::Public),
];

fn new(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Class#new";

    let class = class_arg(universe, SIGNATURE, &receiver)?;

    if class == universe.class_class() {
        let super_class = match args.as_slice() {
            [] => None,
            [super_class] => Some(class_arg(universe, SIGNATURE, super_class)?),
            _ => {
                return Err(Error::Argument {
                    name: String::from("new"),
                    expected: Arity::Between(0, 1),
                    given: args.len(),
                })
            }
        };
        return Ok(Value::Object(universe.new_class(super_class)?));
    }

    if class == universe.module_class() {
        if !args.is_empty() {
            return Err(Error::Argument {
                name: String::from("new"),
                expected: Arity::Exact(0),
                given: args.len(),
            });
        }
        return Ok(Value::Object(universe.new_module()?));
    }

    let instance = universe.instantiate(class)?;
    universe.send(instance.clone(), "initialize", args)?;
    Ok(instance)
}

fn allocate(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Class#allocate";

    let class = class_arg(universe, SIGNATURE, &receiver)?;
    universe.instantiate(class)
}

fn superclass(universe: &mut Universe, receiver: Value, _: Vec<Value>) -> Result<Value> {
    const SIGNATURE: &str = "Class#superclass";

    let class = class_arg(universe, SIGNATURE, &receiver)?;
    match universe.superclass(class)? {
        Some(super_class) => Ok(Value::Object(super_class)),
        None => Ok(Value::Nil),
    }
}
