use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use eigen_core::Interned;

use crate::error::Result;
use crate::heap::ObjectRef;
use crate::method::Method;
use crate::universe::Universe;
use crate::value::Value;

/// A missing-method handler, called as `handler(universe, receiver, name, args)`.
pub type MissingHandler = Rc<dyn Fn(&mut Universe, Value, Interned, Vec<Value>) -> Result<Value>>;

/// The different flavours of method holders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// An instantiable class, with at most one superclass.
    Class,
    /// A module: never instantiated, only included.
    Module,
    /// The singleton class of exactly one entity.
    Eigenclass {
        /// The entity owning this eigenclass.
        attached: ObjectRef,
    },
}

/// Represents a class, a module or an eigenclass.
#[derive(Clone)]
pub struct Class {
    /// The class' name (`None` for anonymous classes and eigenclasses).
    pub name: Option<String>,
    /// What kind of holder this is.
    pub kind: ClassKind,
    /// The class of this class.
    pub class: ObjectRef,
    /// The singleton class of this class, once created.
    pub eigenclass: Option<ObjectRef>,
    /// The superclass of this class.
    pub super_class: Option<ObjectRef>,
    /// The included modules, in inclusion order.
    pub includes: Vec<ObjectRef>,
    /// The class' own instance variables.
    pub locals: IndexMap<Interned, Value>,
    /// The class' methods.
    pub methods: IndexMap<Interned, Rc<Method>>,
    /// The handler consulted when resolution fails.
    pub missing_handler: Option<MissingHandler>,
}

impl Class {
    /// Create a class of the given kind, whose own class is `class`.
    pub fn new(name: Option<String>, kind: ClassKind, class: ObjectRef) -> Self {
        Self {
            name,
            kind,
            class,
            eigenclass: None,
            super_class: None,
            includes: Vec::new(),
            locals: IndexMap::new(),
            methods: IndexMap::new(),
            missing_handler: None,
        }
    }

    /// Get the class' name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the class of this class.
    pub fn class(&self) -> ObjectRef {
        self.class
    }

    /// Get the superclass of this class.
    pub fn super_class(&self) -> Option<ObjectRef> {
        self.super_class
    }

    /// Whether this is an ordinary class.
    pub fn is_class(&self) -> bool {
        self.kind == ClassKind::Class
    }

    /// Whether this is a module.
    pub fn is_module(&self) -> bool {
        self.kind == ClassKind::Module
    }

    /// The entity owning this eigenclass, if this is one.
    pub fn attached(&self) -> Option<ObjectRef> {
        match self.kind {
            ClassKind::Eigenclass { attached } => Some(attached),
            _ => None,
        }
    }

    /// Search for a method within this class' own table only.
    pub fn own_method(&self, signature: Interned) -> Option<Rc<Method>> {
        self.methods.get(&signature).cloned()
    }

    /// Whether this class directly includes the given module.
    pub fn includes_module(&self, module: ObjectRef) -> bool {
        self.includes.contains(&module)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("super_class", &self.super_class)
            .field("includes", &self.includes)
            .field("methods", &self.methods.len())
            .field("missing_handler", &self.missing_handler.is_some())
            .finish()
    }
}
