use std::fmt;

use indexmap::IndexMap;

use eigen_core::Interned;

use crate::class::Class;
use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::value::Value;

/// The identity token of a heap entity.
///
/// References are generational: once an entity is destroyed, its slot may be
/// reused, but stale references to it keep failing with
/// [`Error::UseAfterFree`] instead of aliasing the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    index: u32,
    generation: u32,
}

impl ObjectRef {
    /// The slot index of this reference.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// A number uniquely identifying this entity over the lifetime of the heap.
    pub fn id(&self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.id())
    }
}

/// An entity stored on the heap.
#[derive(Debug)]
pub enum Object {
    /// An instance of a class.
    Instance(Instance),
    /// A class, a module or an eigenclass.
    Class(Class),
}

impl Object {
    /// The nominal class of this entity.
    pub fn class(&self) -> ObjectRef {
        match self {
            Self::Instance(instance) => instance.class(),
            Self::Class(class) => class.class(),
        }
    }

    /// The eigenclass of this entity, if it has been created.
    pub fn eigenclass(&self) -> Option<ObjectRef> {
        match self {
            Self::Instance(instance) => instance.eigenclass,
            Self::Class(class) => class.eigenclass,
        }
    }

    /// Attach an eigenclass to this entity.
    pub fn set_eigenclass(&mut self, eigenclass: ObjectRef) {
        match self {
            Self::Instance(instance) => instance.eigenclass = Some(eigenclass),
            Self::Class(class) => class.eigenclass = Some(eigenclass),
        }
    }

    /// The instance variables of this entity.
    pub fn locals(&self) -> &IndexMap<Interned, Value> {
        match self {
            Self::Instance(instance) => &instance.locals,
            Self::Class(class) => &class.locals,
        }
    }

    /// The instance variables of this entity, mutably.
    pub fn locals_mut(&mut self) -> &mut IndexMap<Interned, Value> {
        match self {
            Self::Instance(instance) => &mut instance.locals,
            Self::Class(class) => &mut class.locals,
        }
    }

    /// Search for a local binding.
    pub fn lookup_local(&self, name: Interned) -> Option<Value> {
        self.locals().get(&name).cloned()
    }

    /// Assign a value to a local binding, creating it if needed.
    pub fn assign_local(&mut self, name: Interned, value: Value) {
        self.locals_mut().insert(name, value);
    }

    /// Get this entity as a class, if it is one.
    pub fn as_class(&self) -> Option<&Class> {
        match self {
            Self::Class(class) => Some(class),
            Self::Instance(_) => None,
        }
    }

    /// Get this entity as a class, mutably, if it is one.
    pub fn as_class_mut(&mut self) -> Option<&mut Class> {
        match self {
            Self::Class(class) => Some(class),
            Self::Instance(_) => None,
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<Object>,
}

/// The storage of every entity of a universe.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new entity.
    pub fn allocate(&mut self, object: Object) -> ObjectRef {
        self.allocate_with(|_| object)
    }

    /// Allocate a new entity whose contents depend on its own reference
    /// (used to close the class-of-classes loop).
    pub fn allocate_with(&mut self, build: impl FnOnce(ObjectRef) -> Object) -> ObjectRef {
        let this = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.generation += 1;
                ObjectRef {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    object: None,
                });
                ObjectRef {
                    index: (self.slots.len() - 1) as u32,
                    generation: 0,
                }
            }
        };
        self.slots[this.index as usize].object = Some(build(this));
        self.live += 1;
        this
    }

    /// Whether the given reference still designates a live entity.
    pub fn is_live(&self, this: ObjectRef) -> bool {
        self.get(this).is_ok()
    }

    /// Access an entity.
    pub fn get(&self, this: ObjectRef) -> Result<&Object> {
        self.slots
            .get(this.index as usize)
            .filter(|slot| slot.generation == this.generation)
            .and_then(|slot| slot.object.as_ref())
            .ok_or(Error::UseAfterFree(this))
    }

    /// Access an entity mutably.
    pub fn get_mut(&mut self, this: ObjectRef) -> Result<&mut Object> {
        self.slots
            .get_mut(this.index as usize)
            .filter(|slot| slot.generation == this.generation)
            .and_then(|slot| slot.object.as_mut())
            .ok_or(Error::UseAfterFree(this))
    }

    /// Remove an entity from the heap, returning its contents.
    pub fn free(&mut self, this: ObjectRef) -> Result<Object> {
        let slot = self
            .slots
            .get_mut(this.index as usize)
            .filter(|slot| slot.generation == this.generation)
            .ok_or(Error::UseAfterFree(this))?;
        let object = slot.object.take().ok_or(Error::UseAfterFree(this))?;
        self.free.push(this.index);
        self.live -= 1;
        Ok(object)
    }

    /// The number of live entities.
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the heap holds no entity.
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}
