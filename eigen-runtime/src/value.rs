use std::cell::RefCell;
use std::rc::Rc;

use eigen_core::Interned;

use crate::heap::ObjectRef;
use crate::method::{BoundMethod, UnboundMethod};
use crate::EigenRef;

/// Represents a runtime value.
///
/// Heap entities (instances, classes, modules, eigenclasses) are designated
/// by their identity token, so copying a value never copies the entity.
#[derive(Debug, Clone)]
pub enum Value {
    /// The **nil** value.
    Nil,
    /// A boolean value (**true** or **false**).
    Boolean(bool),
    /// An integer value.
    Integer(i64),
    /// An floating-point value.
    Double(f64),
    /// An interned symbol value.
    Symbol(Interned),
    /// A string value.
    String(Rc<String>),
    /// An array of values.
    Array(EigenRef<Vec<Self>>),
    /// A heap entity.
    Object(ObjectRef),
    /// A method bound to its receiver.
    Method(Rc<BoundMethod>),
    /// A method detached from any receiver.
    UnboundMethod(Rc<UnboundMethod>),
}

impl Value {
    /// Create a string value.
    pub fn new_string(value: impl Into<String>) -> Self {
        Self::String(Rc::new(value.into()))
    }

    /// Create an array value.
    pub fn new_array(values: Vec<Self>) -> Self {
        Self::Array(Rc::new(RefCell::new(values)))
    }

    /// Get the heap entity designated by this value, if any.
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(object) => Some(*object),
            _ => None,
        }
    }

    /// Get the string contents of this value, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Whether this value is considered true in a conditional.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Boolean(false))
    }

    /// Identity comparison: same entity, same array or method object, or equal immediates.
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Method(a), Self::Method(b)) => Rc::ptr_eq(a, b),
            (Self::UnboundMethod(a), Self::UnboundMethod(b)) => Rc::ptr_eq(a, b),
            (a, b) => a == b,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a.eq(b),
            (Self::Integer(a), Self::Integer(b)) => a.eq(b),
            (Self::Double(a), Self::Double(b)) => a.eq(b),
            (Self::String(a), Self::String(b)) => a.eq(b),
            (Self::Symbol(a), Self::Symbol(b)) => a.eq(b),
            (Self::Array(a), Self::Array(b)) => a.eq(b),
            (Self::Object(a), Self::Object(b)) => a.eq(b),
            (Self::Method(a), Self::Method(b)) => {
                Rc::ptr_eq(&a.method, &b.method) && a.receiver.is_identical(&b.receiver)
            }
            (Self::UnboundMethod(a), Self::UnboundMethod(b)) => Rc::ptr_eq(&a.method, &b.method),
            _ => false,
        }
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new_string(value)
    }
}
