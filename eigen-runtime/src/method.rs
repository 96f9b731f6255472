use std::fmt;
use std::rc::Rc;

use eigen_core::{Arity, Interned, Visibility};

use crate::error::Result;
use crate::heap::ObjectRef;
use crate::primitives::PrimitiveFn;
use crate::universe::Universe;
use crate::value::Value;

/// A method body supplied by the embedder, called with the receiver and the arguments.
pub type NativeFn = Rc<dyn Fn(&mut Universe, Value, Vec<Value>) -> Result<Value>>;

/// The kind of a method.
#[derive(Clone)]
pub enum MethodKind {
    /// An opaque body registered at runtime.
    Native(NativeFn),
    /// A runtime primitive.
    Primitive(PrimitiveFn),
    /// Reads an instance variable of the receiver.
    Reader(Interned),
    /// Assigns an instance variable of the receiver.
    Writer(Interned),
    /// Marks the name as undefined, stopping resolution.
    Undefined,
}

impl MethodKind {
    /// Whether this method is a primitive.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }
}

/// Represents a method entry, stored in exactly one method table.
#[derive(Clone)]
pub struct Method {
    /// The body of the method.
    pub kind: MethodKind,
    /// The class, module or eigenclass whose table holds this entry.
    pub holder: ObjectRef,
    /// The name this entry is stored under.
    pub signature: Interned,
    /// The number of arguments accepted.
    pub arity: Arity,
    /// Who may call this method.
    pub visibility: Visibility,
}

impl Method {
    /// Get the body of this method.
    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    /// Get the table holding this method.
    pub fn holder(&self) -> ObjectRef {
        self.holder
    }

    /// Get the name of this method.
    pub fn signature(&self) -> Interned {
        self.signature
    }

    /// Get the arity of this method.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Get the visibility of this method.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether this entry is an undefinition marker.
    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, MethodKind::Undefined)
    }

    /// Whether this method is a primitive.
    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }

    /// Copy this entry into another table, under another name.
    pub fn rehome(&self, holder: ObjectRef, signature: Interned) -> Self {
        Self {
            holder,
            signature,
            ..self.clone()
        }
    }

    /// Copy this entry with another visibility.
    pub fn with_visibility(&self, visibility: Visibility) -> Self {
        Self {
            visibility,
            ..self.clone()
        }
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            MethodKind::Native(_) => "native",
            MethodKind::Primitive(_) => "primitive",
            MethodKind::Reader(_) => "reader",
            MethodKind::Writer(_) => "writer",
            MethodKind::Undefined => "undefined",
        };
        f.debug_struct("Method")
            .field("kind", &kind)
            .field("holder", &self.holder)
            .field("signature", &self.signature)
            .field("arity", &self.arity)
            .field("visibility", &self.visibility)
            .finish()
    }
}

/// A method extracted from a receiver, ready to be called.
///
/// The resolved entry is captured when extracting: redefining the name
/// afterwards does not affect it.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Rc<Method>,
}

/// A method detached from any receiver, which can be bound to any
/// entity having the method's holder among its ancestors.
#[derive(Debug, Clone)]
pub struct UnboundMethod {
    pub method: Rc<Method>,
}

impl BoundMethod {
    /// Call the captured method on the captured receiver.
    pub fn call(&self, universe: &mut Universe, args: Vec<Value>) -> Result<Value> {
        universe.invoke_method(&self.method, self.receiver.clone(), args)
    }

    /// Detach the method from its receiver.
    pub fn unbind(&self) -> UnboundMethod {
        UnboundMethod {
            method: self.method.clone(),
        }
    }

    /// The class, module or eigenclass defining the method.
    pub fn owner(&self) -> ObjectRef {
        self.method.holder
    }
}

impl UnboundMethod {
    /// The class, module or eigenclass defining the method.
    pub fn owner(&self) -> ObjectRef {
        self.method.holder
    }
}
