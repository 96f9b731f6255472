use std::rc::Rc;

use tracing::{debug, warn};

use eigen_core::{Arity, Interned, Visibility};

use crate::ancestors::Resolution;
use crate::class::{Class, ClassKind};
use crate::error::{Error, Result};
use crate::heap::{Object, ObjectRef};
use crate::method::{Method, MethodKind};
use crate::primitives::PrimitiveFn;
use crate::universe::Universe;
use crate::value::Value;

impl Universe {
    /// Ensure the given entity is a module.
    pub fn expect_module(&self, module: ObjectRef) -> Result<()> {
        if self.class(module)?.is_module() {
            Ok(())
        } else {
            Err(Error::Type(format!(
                "wrong argument type {} (expected Module)",
                self.display_name(module)
            )))
        }
    }

    /// Ensure the given entity is an ordinary class.
    pub fn expect_class(&self, class: ObjectRef) -> Result<()> {
        if self.class(class)?.is_class() {
            Ok(())
        } else {
            Err(Error::Type(format!(
                "{} is not a class",
                self.display_name(class)
            )))
        }
    }

    fn undefined_method_for(&self, class: ObjectRef, name: &str) -> Error {
        Error::Name(format!(
            "undefined method '{}' for class '{}'",
            name,
            self.display_name(class)
        ))
    }

    /// Create an anonymous class (the superclass defaults to **Object**).
    pub fn new_class(&mut self, super_class: Option<ObjectRef>) -> Result<ObjectRef> {
        let super_class = super_class.unwrap_or(self.core.object_class);
        if !self.class(super_class)?.is_class() {
            return Err(Error::Type(format!(
                "superclass must be a Class ({} given)",
                self.display_name(super_class)
            )));
        }
        if super_class == self.core.class_class {
            return Err(Error::Type(String::from("can't make subclass of Class")));
        }
        let mut class = Class::new(None, ClassKind::Class, self.core.class_class);
        class.super_class = Some(super_class);
        Ok(self.heap.allocate(Object::Class(class)))
    }

    /// Create an anonymous module.
    pub fn new_module(&mut self) -> Result<ObjectRef> {
        let class = Class::new(None, ClassKind::Module, self.core.module_class);
        Ok(self.heap.allocate(Object::Class(class)))
    }

    /// Define a named class, or reopen it if the name is already bound to a class.
    ///
    /// Reopening with a different explicit superclass fails.
    pub fn define_class(&mut self, name: &str, super_class: Option<ObjectRef>) -> Result<ObjectRef> {
        if let Some(existing) = self.lookup_constant(name) {
            let class = existing
                .as_object()
                .ok_or_else(|| Error::Type(format!("{} is not a class", name)))?;
            self.expect_class(class)?;
            if let Some(super_class) = super_class {
                if self.class(class)?.super_class() != Some(super_class) {
                    return Err(Error::Type(format!("superclass mismatch for class {}", name)));
                }
            }
            debug!(name, "reopened class");
            return Ok(class);
        }
        let class = self.new_class(super_class)?;
        self.assign_constant(name, Value::Object(class))?;
        debug!(name, "defined class");
        Ok(class)
    }

    /// Define a named module, or reopen it if the name is already bound to a module.
    pub fn define_module(&mut self, name: &str) -> Result<ObjectRef> {
        if let Some(existing) = self.lookup_constant(name) {
            let module = existing
                .as_object()
                .ok_or_else(|| Error::Type(format!("{} is not a module", name)))?;
            self.expect_module(module)?;
            debug!(name, "reopened module");
            return Ok(module);
        }
        let module = self.new_module()?;
        self.assign_constant(name, Value::Object(module))?;
        debug!(name, "defined module");
        Ok(module)
    }

    /// Get a class back for further mutation.
    pub fn reopen(&self, class: ObjectRef) -> Result<ObjectRef> {
        self.class(class)?;
        Ok(class)
    }

    /// Rename a class or module.
    pub fn set_name(&mut self, class: ObjectRef, name: &str) -> Result<()> {
        if self.is_eigenclass(class)? {
            return Err(Error::Type(String::from("can't rename a singleton class")));
        }
        self.class_mut(class)?.name = Some(name.to_string());
        Ok(())
    }

    /// Append a module to the inclusion list of a class, module or eigenclass.
    ///
    /// Including an already included module does nothing (it keeps its position).
    pub fn include(&mut self, target: ObjectRef, module: ObjectRef) -> Result<()> {
        self.check_include(target, module)?;
        if self.class(target)?.includes_module(module) {
            debug!(
                target = %self.display_name(target),
                module = %self.display_name(module),
                "module already included"
            );
            return Ok(());
        }
        self.class_mut(target)?.includes.push(module);
        debug!(
            target = %self.display_name(target),
            module = %self.display_name(module),
            "included module"
        );
        Ok(())
    }

    /// Check that a module could be included into a target without creating a cycle.
    pub fn check_include(&self, target: ObjectRef, module: ObjectRef) -> Result<()> {
        self.class(target)?;
        self.expect_module(module)?;
        if target == module || self.ancestors(module)?.contains(&target) {
            return Err(Error::CyclicHierarchy {
                class: self.display_name(module),
                ancestor: self.display_name(target),
            });
        }
        Ok(())
    }

    /// Change the superclass of a class.
    pub fn set_superclass(&mut self, class: ObjectRef, super_class: ObjectRef) -> Result<()> {
        self.expect_class(class)?;
        self.expect_class(super_class)?;
        let mut current = Some(super_class);
        while let Some(ancestor) = current {
            if ancestor == class {
                return Err(Error::CyclicHierarchy {
                    class: self.display_name(super_class),
                    ancestor: self.display_name(class),
                });
            }
            current = self.class(ancestor)?.super_class();
        }
        self.class_mut(class)?.super_class = Some(super_class);
        debug!(
            class = %self.display_name(class),
            super_class = %self.display_name(super_class),
            "changed superclass"
        );
        Ok(())
    }

    /// Store a method entry in its holder's table, replacing any entry with the same name.
    pub fn insert_method(&mut self, method: Method) -> Result<Rc<Method>> {
        let holder = method.holder();
        let name = self.lookup_symbol(method.signature()).to_string();
        let method = Rc::new(method);
        let previous = self
            .class_mut(holder)?
            .methods
            .insert(method.signature(), method.clone());
        if previous.map_or(false, |previous| previous.is_primitive()) {
            warn!(name = %name, holder = %self.display_name(holder), "primitive redefined");
        }
        debug!(name = %name, holder = %self.display_name(holder), "defined method");
        Ok(method)
    }

    fn build_method(
        &mut self,
        holder: ObjectRef,
        name: &str,
        arity: Arity,
        visibility: Visibility,
        kind: MethodKind,
    ) -> Method {
        let visibility = if name == "initialize" {
            Visibility::Private
        } else {
            visibility
        };
        Method {
            kind,
            holder,
            signature: self.intern_symbol(name),
            arity,
            visibility,
        }
    }

    /// Define an instance method on a class, module or eigenclass.
    ///
    /// `initialize` is always private.
    pub fn define_instance_method(
        &mut self,
        class: ObjectRef,
        name: &str,
        arity: Arity,
        visibility: Visibility,
        body: impl Fn(&mut Universe, Value, Vec<Value>) -> Result<Value> + 'static,
    ) -> Result<Rc<Method>> {
        self.class(class)?;
        let method = self.build_method(class, name, arity, visibility, MethodKind::Native(Rc::new(body)));
        self.insert_method(method)
    }

    /// Define a public instance method.
    pub fn define_method(
        &mut self,
        class: ObjectRef,
        name: &str,
        arity: Arity,
        body: impl Fn(&mut Universe, Value, Vec<Value>) -> Result<Value> + 'static,
    ) -> Result<Rc<Method>> {
        self.define_instance_method(class, name, arity, Visibility::Public, body)
    }

    /// Define an instance method backed by a primitive function.
    pub fn define_primitive(
        &mut self,
        class: ObjectRef,
        name: &str,
        arity: Arity,
        visibility: Visibility,
        primitive: PrimitiveFn,
    ) -> Result<Rc<Method>> {
        self.class(class)?;
        let method = self.build_method(class, name, arity, visibility, MethodKind::Primitive(primitive));
        self.insert_method(method)
    }

    /// The holders a method defined on `class` may come from: the lookup chain
    /// of the attached entity for eigenclasses, the ancestors otherwise.
    fn holder_chain(&self, class: ObjectRef) -> Result<Vec<ObjectRef>> {
        match self.class(class)?.attached() {
            Some(attached) => self.lookup_chain(&Value::Object(attached)),
            None => self.ancestors(class),
        }
    }

    /// Register a copy of an existing method entry under a (possibly new) name.
    ///
    /// Methods of a class (or eigenclass) can only be moved within its descendants,
    /// methods of a module anywhere.
    pub fn define_method_from(
        &mut self,
        class: ObjectRef,
        name: &str,
        method: &Method,
    ) -> Result<Rc<Method>> {
        let owner = method.holder();
        if !self.class(owner)?.is_module() && !self.holder_chain(class)?.contains(&owner) {
            return Err(Error::Type(format!(
                "bind argument must be a subclass of {}",
                self.display_name(owner)
            )));
        }
        let signature = self.intern_symbol(name);
        self.insert_method(method.rehome(class, signature))
    }

    /// Define a reader method for the `@name` instance variable.
    pub fn attr_reader(&mut self, class: ObjectRef, name: &str) -> Result<Rc<Method>> {
        self.class(class)?;
        let local = self.attribute_symbol(name)?;
        let method = self.build_method(
            class,
            name,
            Arity::Exact(0),
            Visibility::Public,
            MethodKind::Reader(local),
        );
        self.insert_method(method)
    }

    /// Define a `name=` writer method for the `@name` instance variable.
    pub fn attr_writer(&mut self, class: ObjectRef, name: &str) -> Result<Rc<Method>> {
        self.class(class)?;
        let local = self.attribute_symbol(name)?;
        let method = self.build_method(
            class,
            &format!("{}=", name),
            Arity::Exact(1),
            Visibility::Public,
            MethodKind::Writer(local),
        );
        self.insert_method(method)
    }

    /// Define both the reader and the writer of an attribute.
    pub fn attr_accessor(&mut self, class: ObjectRef, name: &str) -> Result<()> {
        self.attr_reader(class, name)?;
        self.attr_writer(class, name)?;
        Ok(())
    }

    fn attribute_symbol(&mut self, name: &str) -> Result<Interned> {
        if !is_attribute_name(name) {
            return Err(Error::Name(format!("invalid attribute name '{}'", name)));
        }
        Ok(self.intern_symbol(&format!("@{}", name)))
    }

    /// Copy the method currently resolved for `old_name` under `new_name`.
    pub fn alias_method(&mut self, class: ObjectRef, new_name: &str, old_name: &str) -> Result<Rc<Method>> {
        let old_signature = self.intern_symbol(old_name);
        let new_signature = self.intern_symbol(new_name);
        match self.resolve_instance_method(class, old_signature)? {
            Resolution::Found(method) => self.insert_method(method.rehome(class, new_signature)),
            Resolution::NotFound => Err(self.undefined_method_for(class, old_name)),
        }
    }

    /// Remove a method from a class' own table, exposing any inherited definition.
    pub fn remove_method(&mut self, class: ObjectRef, name: &str) -> Result<()> {
        let signature = self.intern_symbol(name);
        let defined = self
            .class(class)?
            .own_method(signature)
            .map_or(false, |method| !method.is_undefined());
        if !defined {
            return Err(Error::Name(format!(
                "method '{}' not defined in {}",
                name,
                self.display_name(class)
            )));
        }
        self.class_mut(class)?.methods.shift_remove(&signature);
        debug!(name, class = %self.display_name(class), "removed method");
        Ok(())
    }

    /// Prevent a class and its descendants from responding to a method, inherited or not.
    pub fn undef_method(&mut self, class: ObjectRef, name: &str) -> Result<()> {
        let signature = self.intern_symbol(name);
        if !self.resolve_instance_method(class, signature)?.is_found() {
            return Err(self.undefined_method_for(class, name));
        }
        let marker = self.build_method(
            class,
            name,
            Arity::AtLeast(0),
            Visibility::Public,
            MethodKind::Undefined,
        );
        self.insert_method(marker)?;
        Ok(())
    }

    /// Change the visibility of a method for a class.
    ///
    /// An inherited method is copied into the class' own table; the ancestor's
    /// entry keeps its visibility.
    pub fn set_visibility(&mut self, class: ObjectRef, name: &str, visibility: Visibility) -> Result<()> {
        let signature = self.intern_symbol(name);
        let own = self
            .class(class)?
            .own_method(signature)
            .filter(|method| !method.is_undefined());
        let method = match own {
            Some(method) => method.with_visibility(visibility),
            None => match self.resolve_instance_method(class, signature)? {
                Resolution::Found(method) => method.rehome(class, signature).with_visibility(visibility),
                Resolution::NotFound => return Err(self.undefined_method_for(class, name)),
            },
        };
        self.insert_method(method)?;
        Ok(())
    }

    /// Register the handler invoked when resolution fails for instances of a class or module.
    pub fn define_missing_handler(
        &mut self,
        class: ObjectRef,
        handler: impl Fn(&mut Universe, Value, Interned, Vec<Value>) -> Result<Value> + 'static,
    ) -> Result<()> {
        self.class_mut(class)?.missing_handler = Some(Rc::new(handler));
        debug!(class = %self.display_name(class), "registered missing-method handler");
        Ok(())
    }
}

/// Whether a name can be used for an attribute (a plain identifier).
pub fn is_attribute_name(name: &str) -> bool {
    name.chars()
        .next()
        .map_or(false, |first| first.is_alphabetic() || first == '_')
        && name.chars().all(|ch| ch.is_alphanumeric() || ch == '_')
}
