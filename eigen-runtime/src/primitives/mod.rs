/// Primitives for the **Class** class.
pub mod class;
/// Primitives for the **Kernel** module and the **Object** class.
pub mod kernel;
/// Primitives for the **Method** class and the **UnboundMethod** class.
pub mod method;
/// Primitives for the **Module** class.
pub mod module;

use std::rc::Rc;

use indexmap::IndexMap;

use eigen_core::{Arity, Interned, Interner, Visibility};

use crate::error::{Error, Result};
use crate::heap::ObjectRef;
use crate::method::{Method, MethodKind};
use crate::universe::Universe;
use crate::value::Value;

/// A runtime primitive (just a bare function pointer).
pub type PrimitiveFn = fn(universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value>;

/// A table of primitives: name, function, arity and visibility.
pub type PrimitiveTable = &'static [(&'static str, PrimitiveFn, Arity, Visibility)];

/// Macro for checking and destructuring arguments passed to primitives.
#[macro_export]
macro_rules! expect_args {
    ($signature:expr, $args:expr, [ $( $ptrn:pat $( => $name:ident )? ),* $(,)? ]) => {
        #[allow(unused_mut)]
        let ($($(mut $name,)?)*) = {
            #[allow(unused_variables, unused_mut)]
            let mut iter = $args.into_iter();
            $(#[allow(unreachable_patterns)]
            $(let $name =)? match iter.next() {
                Some($ptrn) => {$($name)?},
                Some(_) => return Err($crate::Error::Type(format!("'{}': wrong argument type", $signature))),
                None => return Err($crate::Error::Type(format!("'{}': missing argument", $signature))),
            };)*
            ($($($name,)?)*)
        };
    };
}

/// Build the method table of a core class from a primitive table.
pub fn methods_of(
    interner: &mut Interner,
    holder: ObjectRef,
    table: PrimitiveTable,
) -> IndexMap<Interned, Rc<Method>> {
    table
        .iter()
        .map(|(name, primitive, arity, visibility)| {
            let signature = interner.intern(name);
            let method = Method {
                kind: MethodKind::Primitive(*primitive),
                holder,
                signature,
                arity: *arity,
                visibility: *visibility,
            };
            (signature, Rc::new(method))
        })
        .collect()
}

/// Get a method name out of a symbol or string argument.
pub(crate) fn name_arg(universe: &Universe, signature: &str, value: &Value) -> Result<String> {
    match value {
        Value::Symbol(symbol) => Ok(universe.lookup_symbol(*symbol).to_string()),
        Value::String(string) => Ok(string.to_string()),
        other => Err(Error::Type(format!(
            "'{}': {} is not a symbol nor a string",
            signature,
            universe.inspect(other)
        ))),
    }
}

/// Get a class, module or eigenclass out of a value.
pub(crate) fn class_arg(universe: &Universe, signature: &str, value: &Value) -> Result<ObjectRef> {
    match value {
        Value::Object(object) if universe.class(*object).is_ok() => Ok(*object),
        other => Err(Error::Type(format!(
            "'{}': {} is not a class or module",
            signature,
            universe.inspect(other)
        ))),
    }
}

/// Get the method entry out of a `Method` or `UnboundMethod` value.
pub(crate) fn method_arg(universe: &Universe, signature: &str, value: &Value) -> Result<Rc<Method>> {
    match value {
        Value::Method(bound) => Ok(bound.method.clone()),
        Value::UnboundMethod(unbound) => Ok(unbound.method.clone()),
        other => Err(Error::Type(format!(
            "'{}': wrong argument type {} (expected Method or UnboundMethod)",
            signature,
            universe.inspect(other)
        ))),
    }
}

/// Make a symbol value out of a name.
pub(crate) fn symbol(universe: &mut Universe, name: &str) -> Value {
    Value::Symbol(universe.intern_symbol(name))
}

/// Make an array of symbols out of names.
pub(crate) fn symbols(universe: &mut Universe, names: Vec<String>) -> Value {
    let symbols = names.iter().map(|name| symbol(universe, name)).collect();
    Value::new_array(symbols)
}
