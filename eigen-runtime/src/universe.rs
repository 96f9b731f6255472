use indexmap::IndexMap;
use tracing::debug;

use eigen_core::{Interned, Interner};

use crate::class::{Class, ClassKind};
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::heap::{Heap, Object, ObjectRef};
use crate::instance::Instance;
use crate::primitives;
use crate::value::Value;

/// The core classes of the runtime.
///
/// This struct allows to always keep a reference to important classes,
/// even in case of modifications to constant bindings by user code.
#[derive(Debug, Clone)]
pub struct CoreClasses {
    /// The **Object** class, root of the class hierarchy.
    pub object_class: ObjectRef,
    /// The **Module** class.
    pub module_class: ObjectRef,
    /// The **Class** class, which is its own class.
    pub class_class: ObjectRef,
    /// The **Kernel** module, included in **Object**.
    pub kernel_module: ObjectRef,

    /// The **NilClass** class.
    pub nil_class: ObjectRef,
    /// The **TrueClass** class.
    pub true_class: ObjectRef,
    /// The **FalseClass** class.
    pub false_class: ObjectRef,
    /// The **Integer** class.
    pub integer_class: ObjectRef,
    /// The **Float** class.
    pub float_class: ObjectRef,
    /// The **Symbol** class.
    pub symbol_class: ObjectRef,
    /// The **String** class.
    pub string_class: ObjectRef,
    /// The **Array** class.
    pub array_class: ObjectRef,
    /// The **Method** class.
    pub method_class: ObjectRef,
    /// The **UnboundMethod** class.
    pub unbound_method_class: ObjectRef,
}

impl CoreClasses {
    fn all(&self) -> [ObjectRef; 14] {
        [
            self.object_class,
            self.module_class,
            self.class_class,
            self.kernel_module,
            self.nil_class,
            self.true_class,
            self.false_class,
            self.integer_class,
            self.float_class,
            self.symbol_class,
            self.string_class,
            self.array_class,
            self.method_class,
            self.unbound_method_class,
        ]
    }

    /// Whether the given entity is one of the core classes.
    pub fn contains(&self, object: ObjectRef) -> bool {
        self.all().contains(&object)
    }

    /// Whether instances of the given class are immediate values (and therefore cannot be allocated).
    pub fn is_immediate(&self, class: ObjectRef) -> bool {
        [
            self.nil_class,
            self.true_class,
            self.false_class,
            self.integer_class,
            self.float_class,
            self.symbol_class,
            self.string_class,
            self.array_class,
            self.method_class,
            self.unbound_method_class,
        ]
        .contains(&class)
    }
}

/// The central data structure for the runtime.
///
/// It owns every entity (through its heap), the symbol interner, the constant
/// bindings and the stack of method activations.
pub struct Universe {
    /// The string interner for symbols.
    pub interner: Interner,
    /// The storage of all entities.
    pub heap: Heap,
    /// The known constant bindings.
    pub constants: IndexMap<Interned, Value>,
    /// The active method frames.
    pub frames: Vec<Frame>,
    /// The runtime's core classes.
    pub core: CoreClasses,
}

impl Universe {
    /// Create a universe with its core classes and their primitives.
    pub fn new() -> Self {
        let mut interner = Interner::with_capacity(256);
        let mut heap = Heap::new();

        let class_class = heap.allocate_with(|this| {
            let mut class = Class::new(Some(String::from("Class")), ClassKind::Class, this);
            class.methods =
                primitives::methods_of(&mut interner, this, primitives::class::INSTANCE_PRIMITIVES);
            Object::Class(class)
        });
        let module_class = system_class(
            &mut heap,
            &mut interner,
            "Module",
            ClassKind::Class,
            class_class,
            primitives::module::INSTANCE_PRIMITIVES,
        );
        let kernel_module = system_class(
            &mut heap,
            &mut interner,
            "Kernel",
            ClassKind::Module,
            module_class,
            primitives::kernel::INSTANCE_PRIMITIVES,
        );
        let object_class = heap.allocate_with(|this| {
            let mut class = Class::new(Some(String::from("Object")), ClassKind::Class, class_class);
            class.includes.push(kernel_module);
            class.methods =
                primitives::methods_of(&mut interner, this, primitives::kernel::OBJECT_PRIMITIVES);
            Object::Class(class)
        });
        set_super_class(&mut heap, module_class, object_class);
        set_super_class(&mut heap, class_class, module_class);

        let mut value_class = |name: &str, table: primitives::PrimitiveTable| {
            let class = system_class(
                &mut heap,
                &mut interner,
                name,
                ClassKind::Class,
                class_class,
                table,
            );
            set_super_class(&mut heap, class, object_class);
            class
        };
        let nil_class = value_class("NilClass", &[]);
        let true_class = value_class("TrueClass", &[]);
        let false_class = value_class("FalseClass", &[]);
        let integer_class = value_class("Integer", &[]);
        let float_class = value_class("Float", &[]);
        let symbol_class = value_class("Symbol", &[]);
        let string_class = value_class("String", &[]);
        let array_class = value_class("Array", &[]);
        let method_class = value_class("Method", primitives::method::METHOD_PRIMITIVES);
        let unbound_method_class =
            value_class("UnboundMethod", primitives::method::UNBOUND_METHOD_PRIMITIVES);

        let core = CoreClasses {
            object_class,
            module_class,
            class_class,
            kernel_module,
            nil_class,
            true_class,
            false_class,
            integer_class,
            float_class,
            symbol_class,
            string_class,
            array_class,
            method_class,
            unbound_method_class,
        };

        let mut constants = IndexMap::new();
        for class in core.all().iter().copied() {
            let name = heap
                .get(class)
                .ok()
                .and_then(Object::as_class)
                .and_then(Class::name)
                .map(|name| interner.intern(name));
            if let Some(name) = name {
                constants.insert(name, Value::Object(class));
            }
        }

        debug!(entities = heap.len(), "bootstrapped core classes");

        Self {
            interner,
            heap,
            constants,
            frames: Vec::new(),
            core,
        }
    }

    /// Get the **Object** class.
    pub fn object_class(&self) -> ObjectRef {
        self.core.object_class
    }
    /// Get the **Module** class.
    pub fn module_class(&self) -> ObjectRef {
        self.core.module_class
    }
    /// Get the **Class** class.
    pub fn class_class(&self) -> ObjectRef {
        self.core.class_class
    }
    /// Get the **Kernel** module.
    pub fn kernel_module(&self) -> ObjectRef {
        self.core.kernel_module
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocate a core class with its primitives.
fn system_class(
    heap: &mut Heap,
    interner: &mut Interner,
    name: &str,
    kind: ClassKind,
    class: ObjectRef,
    table: primitives::PrimitiveTable,
) -> ObjectRef {
    heap.allocate_with(|this| {
        let mut class = Class::new(Some(name.to_string()), kind, class);
        class.methods = primitives::methods_of(interner, this, table);
        Object::Class(class)
    })
}

fn set_super_class(heap: &mut Heap, class: ObjectRef, super_class: ObjectRef) {
    if let Some(class) = heap.get_mut(class).ok().and_then(Object::as_class_mut) {
        class.super_class = Some(super_class);
    }
}

impl Universe {
    /// Intern a symbol.
    pub fn intern_symbol(&mut self, symbol: &str) -> Interned {
        self.interner.intern(symbol)
    }

    /// Lookup a symbol.
    pub fn lookup_symbol(&self, symbol: Interned) -> &str {
        self.interner.lookup(symbol)
    }

    /// Search for a constant binding.
    pub fn lookup_constant(&self, name: &str) -> Option<Value> {
        let name = self.interner.get(name)?;
        self.constants.get(&name).cloned()
    }

    /// Bind a constant.
    ///
    /// Binding an anonymous class or module gives it the constant's name.
    pub fn assign_constant(&mut self, name: &str, value: Value) -> Result<()> {
        if let Value::Object(object) = value {
            if let Object::Class(class) = self.heap.get_mut(object)? {
                if class.name.is_none() && class.attached().is_none() {
                    debug!(name, "naming anonymous class");
                    class.name = Some(name.to_string());
                }
            }
        }
        let name = self.intern_symbol(name);
        self.constants.insert(name, value);
        Ok(())
    }

    /// The names of all constants, in definition order.
    pub fn constant_names(&self) -> Vec<String> {
        self.constants
            .keys()
            .map(|name| self.lookup_symbol(*name).to_string())
            .collect()
    }
}

impl Universe {
    /// Execute `func` within a new method frame.
    pub fn with_frame<T>(&mut self, frame: Frame, func: impl FnOnce(&mut Self) -> T) -> T {
        self.frames.push(frame);
        let output = func(self);
        self.frames.pop();
        output
    }

    /// Get the innermost method frame.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Get the receiver of the innermost method frame.
    pub fn current_self(&self) -> Option<Value> {
        self.current_frame().map(Frame::get_self)
    }
}

impl Universe {
    /// Access a class, module or eigenclass.
    pub fn class(&self, class: ObjectRef) -> Result<&Class> {
        match self.heap.get(class)? {
            Object::Class(class) => Ok(class),
            Object::Instance(_) => Err(Error::Type(format!(
                "{} is not a class or module",
                self.inspect(&Value::Object(class))
            ))),
        }
    }

    /// Access a class, module or eigenclass mutably.
    pub fn class_mut(&mut self, class: ObjectRef) -> Result<&mut Class> {
        if let Object::Instance(_) = self.heap.get(class)? {
            return Err(Error::Type(format!(
                "{} is not a class or module",
                self.inspect(&Value::Object(class))
            )));
        }
        match self.heap.get_mut(class)? {
            Object::Class(class) => Ok(class),
            Object::Instance(_) => Err(Error::UseAfterFree(class)),
        }
    }

    /// Get the nominal class of a value (never its eigenclass).
    pub fn class_of(&self, value: &Value) -> Result<ObjectRef> {
        let core = &self.core;
        Ok(match value {
            Value::Nil => core.nil_class,
            Value::Boolean(true) => core.true_class,
            Value::Boolean(false) => core.false_class,
            Value::Integer(_) => core.integer_class,
            Value::Double(_) => core.float_class,
            Value::Symbol(_) => core.symbol_class,
            Value::String(_) => core.string_class,
            Value::Array(_) => core.array_class,
            Value::Object(object) => self.heap.get(*object)?.class(),
            Value::Method(_) => core.method_class,
            Value::UnboundMethod(_) => core.unbound_method_class,
        })
    }

    /// Get the superclass of a class.
    pub fn superclass(&self, class: ObjectRef) -> Result<Option<ObjectRef>> {
        Ok(self.class(class)?.super_class())
    }

    /// Create a new instance of a class, without initializing it.
    pub fn instantiate(&mut self, class: ObjectRef) -> Result<Value> {
        let target = self.class(class)?;
        if !target.is_class()
            || self.core.is_immediate(class)
            || self.inherits_from(class, self.core.module_class)?
        {
            return Err(Error::Type(format!(
                "allocator undefined for {}",
                self.display_name(class)
            )));
        }
        let instance = self.heap.allocate(Object::Instance(Instance::from_class(class)));
        Ok(Value::Object(instance))
    }

    /// Destroy an entity, along with its eigenclass.
    pub fn destroy(&mut self, value: &Value) -> Result<()> {
        let object = value.as_object().ok_or_else(|| {
            Error::Type(format!("{} is not a heap entity", self.inspect(value)))
        })?;
        if self.core.contains(object) {
            return Err(Error::Type(format!(
                "cannot destroy core class {}",
                self.display_name(object)
            )));
        }
        if let Some(owner) = self.heap.get(object)?.as_class().and_then(|class| class.attached()) {
            return Err(Error::Type(format!(
                "cannot destroy the eigenclass of {} apart from its owner",
                self.inspect(&Value::Object(owner))
            )));
        }
        let mut next = Some(object);
        while let Some(current) = next {
            next = self.heap.free(current)?.eigenclass();
            debug!(entity = %current, "destroyed entity");
        }
        Ok(())
    }

    fn instance_variable_symbol(&mut self, name: &str) -> Result<Interned> {
        if name.len() < 2 || !name.starts_with('@') || name[1..].starts_with('@') {
            return Err(Error::Name(format!(
                "'{}' is not allowed as an instance variable name",
                name
            )));
        }
        Ok(self.intern_symbol(name))
    }

    /// Read an instance variable (`nil` when never assigned).
    pub fn instance_variable_get(&mut self, value: &Value, name: &str) -> Result<Value> {
        let name = self.instance_variable_symbol(name)?;
        self.read_local(value, name)
    }

    /// Assign an instance variable.
    pub fn instance_variable_set(&mut self, value: &Value, name: &str, local: Value) -> Result<Value> {
        let name = self.instance_variable_symbol(name)?;
        self.write_local(value, name, local)
    }

    pub(crate) fn read_local(&self, value: &Value, name: Interned) -> Result<Value> {
        match value {
            Value::Object(object) => Ok(self
                .heap
                .get(*object)?
                .lookup_local(name)
                .unwrap_or(Value::Nil)),
            _ => Ok(Value::Nil),
        }
    }

    pub(crate) fn write_local(&mut self, value: &Value, name: Interned, local: Value) -> Result<Value> {
        match value {
            Value::Object(object) => {
                self.heap.get_mut(*object)?.assign_local(name, local.clone());
                Ok(local)
            }
            _ => Err(Error::Type(format!(
                "can't modify instance variables of {}",
                self.inspect(value)
            ))),
        }
    }

    /// The names of the instance variables of a value, in assignment order.
    pub fn instance_variables(&self, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::Object(object) => Ok(self
                .heap
                .get(*object)?
                .locals()
                .keys()
                .map(|name| self.lookup_symbol(*name).to_string())
                .collect()),
            _ => Ok(Vec::new()),
        }
    }
}

impl Universe {
    /// The display name of a class, module or eigenclass.
    pub fn display_name(&self, class: ObjectRef) -> String {
        let target = match self.heap.get(class) {
            Ok(Object::Class(target)) => target,
            Ok(Object::Instance(_)) => return self.inspect(&Value::Object(class)),
            Err(_) => return format!("#<destroyed {}>", class),
        };
        match (target.name(), target.kind) {
            (Some(name), _) => name.to_string(),
            (None, ClassKind::Eigenclass { attached }) => {
                format!("#<Class:{}>", self.inspect(&Value::Object(attached)))
            }
            (None, ClassKind::Module) => format!("#<Module:{}>", class),
            (None, ClassKind::Class) => format!("#<Class:{}>", class),
        }
    }

    /// Get a human-readable representation of a value.
    pub fn inspect(&self, value: &Value) -> String {
        match value {
            Value::Nil => "nil".to_string(),
            Value::Boolean(value) => value.to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Double(value) => value.to_string(),
            Value::Symbol(value) => format!(":{}", self.lookup_symbol(*value)),
            Value::String(value) => format!("{:?}", value.as_str()),
            Value::Array(values) => {
                let strings: Vec<String> = values
                    .borrow()
                    .iter()
                    .map(|value| self.inspect(value))
                    .collect();
                format!("[{}]", strings.join(", "))
            }
            Value::Object(object) => match self.heap.get(*object) {
                Ok(Object::Class(_)) => self.display_name(*object),
                Ok(Object::Instance(instance)) => {
                    format!("#<{}>", self.display_name(instance.class()))
                }
                Err(_) => format!("#<destroyed {}>", object),
            },
            Value::Method(bound) => format!(
                "#<Method: {}#{}>",
                self.display_name(bound.owner()),
                self.lookup_symbol(bound.method.signature()),
            ),
            Value::UnboundMethod(unbound) => format!(
                "#<UnboundMethod: {}#{}>",
                self.display_name(unbound.owner()),
                self.lookup_symbol(unbound.method.signature()),
            ),
        }
    }
}
