use eigen_core::Interned;

use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::method::{Method, MethodKind};
use crate::universe::Universe;
use crate::value::Value;

/// The trait for invoking methods and handlers.
pub trait Invoke {
    /// Invoke within the given universe, for the given receiver and with the given arguments.
    fn invoke(&self, universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value>;
}

impl Invoke for Method {
    fn invoke(&self, universe: &mut Universe, receiver: Value, args: Vec<Value>) -> Result<Value> {
        match self.kind() {
            MethodKind::Native(body) => {
                let frame = Frame::new(self.holder(), self.signature(), receiver.clone());
                universe.with_frame(frame, |universe| body(universe, receiver, args))
            }
            MethodKind::Primitive(func) => func(universe, receiver, args),
            MethodKind::Reader(local) => universe.read_local(&receiver, *local),
            MethodKind::Writer(local) => {
                let value = args.into_iter().next().unwrap_or(Value::Nil);
                universe.write_local(&receiver, *local, value)
            }
            MethodKind::Undefined => Err(not_found(universe, &receiver, self.signature(), args.len())),
        }
    }
}

/// Build the error reported when a message cannot be handled.
pub(crate) fn not_found(
    universe: &Universe,
    receiver: &Value,
    signature: Interned,
    argument_count: usize,
) -> Error {
    Error::MethodNotFound {
        name: universe.lookup_symbol(signature).to_string(),
        argument_count,
        receiver: universe.inspect(receiver),
    }
}
