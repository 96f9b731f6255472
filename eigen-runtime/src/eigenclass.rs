use std::rc::Rc;

use tracing::debug;

use eigen_core::{Arity, Visibility};

use crate::class::{Class, ClassKind};
use crate::error::{Error, Result};
use crate::heap::{Object, ObjectRef};
use crate::method::Method;
use crate::universe::Universe;
use crate::value::Value;

impl Universe {
    fn singleton_target(&self, value: &Value) -> Result<ObjectRef> {
        match value {
            Value::Object(object) => {
                self.heap.get(*object)?;
                Ok(*object)
            }
            _ => Err(Error::Type(format!(
                "can't define singleton for {}",
                self.inspect(value)
            ))),
        }
    }

    /// Get the eigenclass of a value, creating it on first access.
    ///
    /// The eigenclass is owned by the value and never shared. Its own class is
    /// always **Class**, and it never shows up as the value's class.
    pub fn eigenclass_of(&mut self, value: &Value) -> Result<ObjectRef> {
        let object = self.singleton_target(value)?;
        if let Some(eigenclass) = self.heap.get(object)?.eigenclass() {
            return Ok(eigenclass);
        }
        let class_class = self.core.class_class;
        let eigenclass = self.heap.allocate(Object::Class(Class::new(
            None,
            ClassKind::Eigenclass { attached: object },
            class_class,
        )));
        self.heap.get_mut(object)?.set_eigenclass(eigenclass);
        debug!(entity = %object, eigenclass = %eigenclass, "created eigenclass");
        Ok(eigenclass)
    }

    /// Get the eigenclass of a value, if it was already created.
    pub fn existing_eigenclass(&self, value: &Value) -> Result<Option<ObjectRef>> {
        match value {
            Value::Object(object) => Ok(self.heap.get(*object)?.eigenclass()),
            _ => Ok(None),
        }
    }

    /// Whether the value already owns an eigenclass.
    pub fn has_eigenclass(&self, value: &Value) -> Result<bool> {
        Ok(self.existing_eigenclass(value)?.is_some())
    }

    /// Define a method on the eigenclass of a value only.
    pub fn define_singleton_method(
        &mut self,
        value: &Value,
        name: &str,
        arity: Arity,
        body: impl Fn(&mut Universe, Value, Vec<Value>) -> Result<Value> + 'static,
    ) -> Result<Rc<Method>> {
        let eigenclass = self.eigenclass_of(value)?;
        self.define_instance_method(eigenclass, name, arity, Visibility::Public, body)
    }

    /// Define a singleton method from an existing method entry (as `define_singleton_method(name, method)` does).
    pub fn define_singleton_method_from(
        &mut self,
        value: &Value,
        name: &str,
        method: &Method,
    ) -> Result<Rc<Method>> {
        let eigenclass = self.eigenclass_of(value)?;
        self.define_method_from(eigenclass, name, method)
    }

    /// Mix a module into the eigenclass of a value.
    pub fn extend(&mut self, value: &Value, module: ObjectRef) -> Result<()> {
        self.expect_module(module)?;
        self.singleton_target(value)?;
        let eigenclass = self.eigenclass_of(value)?;
        self.include(eigenclass, module)
    }

    /// Whether the given holder is an eigenclass.
    pub fn is_eigenclass(&self, class: ObjectRef) -> Result<bool> {
        Ok(self.class(class)?.attached().is_some())
    }

    /// The entity owning an eigenclass.
    pub fn attached_object(&self, eigenclass: ObjectRef) -> Result<Option<Value>> {
        Ok(self.class(eigenclass)?.attached().map(Value::Object))
    }
}
