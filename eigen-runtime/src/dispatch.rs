//!
//! Message sending.
//!
//! A send goes through the following states:
//!
//! ```text
//! RESOLVING -> RESOLVED -> INVOKING -> DONE
//!           -> UNRESOLVED -> FALLBACK_CHECK -> HANDLED -> DONE
//!                                           -> UNHANDLED -> ERROR
//! ```
//!
//! Each transition is reported at the `trace` level.
//!

use std::rc::Rc;

use tracing::trace;

use eigen_core::{Interned, Visibility};

use crate::ancestors::Resolution;
use crate::error::{Error, Result};
use crate::frame::{Frame, FrameKind};
use crate::heap::ObjectRef;
use crate::invokable::{not_found, Invoke};
use crate::method::{BoundMethod, Method, UnboundMethod};
use crate::universe::Universe;
use crate::value::Value;

/// Who is sending a message, for visibility checks.
#[derive(Debug, Clone)]
pub enum Caller {
    /// The receiver of the innermost method frame (nobody at the top level).
    Frame,
    /// An explicit caller.
    Entity(Value),
    /// Nobody: only public methods are reachable.
    External,
}

/// How a message is sent.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// The caller of the method.
    pub caller: Caller,
    /// Skip the visibility checks altogether.
    pub bypass_visibility: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            caller: Caller::Frame,
            bypass_visibility: false,
        }
    }
}

impl DispatchOptions {
    /// Send on behalf of the given caller.
    pub fn from_caller(caller: Value) -> Self {
        Self {
            caller: Caller::Entity(caller),
            bypass_visibility: false,
        }
    }

    /// Send from outside any object: only public methods are reachable.
    pub fn external() -> Self {
        Self {
            caller: Caller::External,
            bypass_visibility: false,
        }
    }

    /// Send ignoring method visibility.
    pub fn bypassing() -> Self {
        Self {
            caller: Caller::Frame,
            bypass_visibility: true,
        }
    }
}

impl Universe {
    /// Send a message, with the current frame's receiver as caller.
    pub fn dispatch(&mut self, receiver: Value, name: &str, args: Vec<Value>) -> Result<Value> {
        let signature = self.intern_symbol(name);
        self.dispatch_with(receiver, signature, args, DispatchOptions::default())
    }

    /// Send a message, ignoring visibility.
    pub fn send(&mut self, receiver: Value, name: &str, args: Vec<Value>) -> Result<Value> {
        let signature = self.intern_symbol(name);
        self.dispatch_with(receiver, signature, args, DispatchOptions::bypassing())
    }

    /// Send a message that may only reach public methods.
    pub fn public_send(&mut self, receiver: Value, name: &str, args: Vec<Value>) -> Result<Value> {
        let signature = self.intern_symbol(name);
        self.dispatch_with(receiver, signature, args, DispatchOptions::external())
    }

    /// Send a message.
    pub fn dispatch_with(
        &mut self,
        receiver: Value,
        signature: Interned,
        args: Vec<Value>,
        options: DispatchOptions,
    ) -> Result<Value> {
        trace!(signature = self.lookup_symbol(signature), "RESOLVING");
        match self.resolve(&receiver, signature)? {
            Resolution::Found(method) => {
                trace!(signature = self.lookup_symbol(signature), "RESOLVED");
                if !options.bypass_visibility {
                    let caller = match options.caller {
                        Caller::Frame => self.current_self(),
                        Caller::Entity(caller) => Some(caller),
                        Caller::External => None,
                    };
                    self.check_visibility(&method, &receiver, caller.as_ref())?;
                }
                self.invoke_method(&method, receiver, args)
            }
            Resolution::NotFound => {
                trace!(signature = self.lookup_symbol(signature), "UNRESOLVED");
                self.fallback(receiver, signature, args, None)
            }
        }
    }

    /// Invoke a resolved method after checking its arity.
    pub fn invoke_method(&mut self, method: &Method, receiver: Value, args: Vec<Value>) -> Result<Value> {
        if !method.arity().accepts(args.len()) {
            return Err(Error::Argument {
                name: self.lookup_symbol(method.signature()).to_string(),
                expected: method.arity(),
                given: args.len(),
            });
        }
        trace!(signature = self.lookup_symbol(method.signature()), "INVOKING");
        let output = method.invoke(self, receiver, args);
        trace!(signature = self.lookup_symbol(method.signature()), ok = output.is_ok(), "DONE");
        output
    }

    fn check_visibility(&self, method: &Method, receiver: &Value, caller: Option<&Value>) -> Result<()> {
        let allowed = match method.visibility() {
            Visibility::Public => true,
            Visibility::Private => caller.map_or(false, |caller| caller.is_identical(receiver)),
            Visibility::Protected => match caller {
                Some(caller) => self.is_kind_of(caller, method.holder())?,
                None => false,
            },
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::Visibility {
                name: self.lookup_symbol(method.signature()).to_string(),
                visibility: method.visibility(),
                receiver: self.inspect(receiver),
            })
        }
    }

    /// Run the first missing-method handler found along the receiver's lookup chain.
    ///
    /// With `after`, only the holders following it in the chain are searched.
    fn fallback(
        &mut self,
        receiver: Value,
        signature: Interned,
        args: Vec<Value>,
        after: Option<ObjectRef>,
    ) -> Result<Value> {
        trace!(signature = self.lookup_symbol(signature), "FALLBACK_CHECK");
        let chain = self.lookup_chain(&receiver)?;
        let start = match after {
            Some(after) => chain
                .iter()
                .position(|holder| *holder == after)
                .map_or(chain.len(), |position| position + 1),
            None => 0,
        };
        let mut handler = None;
        for &holder in &chain[start..] {
            if let Some(found) = self.class(holder)?.missing_handler.clone() {
                handler = Some((holder, found));
                break;
            }
        }
        match handler {
            Some((holder, handler)) => {
                trace!(signature = self.lookup_symbol(signature), "HANDLED");
                let frame = Frame::missing(holder, signature, receiver.clone());
                self.with_frame(frame, |universe| handler(universe, receiver, signature, args))
            }
            None => {
                trace!(signature = self.lookup_symbol(signature), "UNHANDLED");
                Err(not_found(self, &receiver, signature, args.len()))
            }
        }
    }

    /// Invoke the next definition of the running method, further up the receiver's lookup chain.
    ///
    /// From a missing-method handler, this runs the next handler up the chain instead.
    pub fn super_dispatch(&mut self, args: Vec<Value>) -> Result<Value> {
        let frame = self
            .current_frame()
            .cloned()
            .ok_or_else(|| Error::Name(String::from("super called outside of method")))?;
        if frame.kind == FrameKind::MissingHandler {
            return self.fallback(frame.self_value, frame.signature, args, Some(frame.holder));
        }
        match self.resolve_after(&frame.self_value, frame.holder, frame.signature)? {
            Resolution::Found(method) => self.invoke_method(&method, frame.self_value, args),
            Resolution::NotFound => self.fallback(frame.self_value, frame.signature, args, None),
        }
    }

    /// Resolve a method once and capture it along with its receiver.
    pub fn extract_method(&mut self, receiver: &Value, name: &str) -> Result<BoundMethod> {
        let signature = self.intern_symbol(name);
        match self.resolve(receiver, signature)? {
            Resolution::Found(method) => Ok(BoundMethod {
                receiver: receiver.clone(),
                method,
            }),
            Resolution::NotFound => Err(Error::Name(format!(
                "undefined method '{}' for {}",
                name,
                self.inspect(receiver)
            ))),
        }
    }

    /// Extract an instance method of a class, detached from any receiver.
    pub fn instance_method(&mut self, class: ObjectRef, name: &str) -> Result<UnboundMethod> {
        let signature = self.intern_symbol(name);
        match self.resolve_instance_method(class, signature)? {
            Resolution::Found(method) => Ok(UnboundMethod { method }),
            Resolution::NotFound => Err(Error::Name(format!(
                "undefined method '{}' for class '{}'",
                name,
                self.display_name(class)
            ))),
        }
    }

    /// Attach an unbound method to a receiver, which must have the method's owner among its ancestors.
    pub fn bind(&self, unbound: &UnboundMethod, receiver: Value) -> Result<BoundMethod> {
        let owner = unbound.owner();
        if !self.is_kind_of(&receiver, owner)? {
            return Err(Error::Type(format!(
                "bind argument must be an instance of {}",
                self.display_name(owner)
            )));
        }
        Ok(BoundMethod {
            receiver,
            method: Rc::clone(&unbound.method),
        })
    }
}
