use indexmap::IndexMap;

use eigen_core::Interned;

use crate::heap::ObjectRef;
use crate::value::Value;

/// Represents a generic class instance.
///
/// Instance variables are not declared by classes: they come into existence
/// when first assigned.
#[derive(Debug, Clone)]
pub struct Instance {
    /// The class of which this is an instance from.
    pub class: ObjectRef,
    /// This instance's singleton class, once created.
    pub eigenclass: Option<ObjectRef>,
    /// This instance's locals.
    pub locals: IndexMap<Interned, Value>,
}

impl Instance {
    /// Construct an instance for a given class.
    pub fn from_class(class: ObjectRef) -> Self {
        Self {
            class,
            eigenclass: None,
            locals: IndexMap::new(),
        }
    }

    /// Get the class of which this is an instance from.
    pub fn class(&self) -> ObjectRef {
        self.class
    }
}
