//!
//! This is an implementation of a string interner.
//!
//! Method names, instance variable names and constants are all interned,
//! which turns every method table lookup into an integer comparison.
//!

use std::collections::HashMap;
use std::rc::Rc;

/// An interned string.
///
/// This is fast to move, clone and compare.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Interned(u32);

impl Interned {
    /// The raw interning ID.
    pub fn id(self) -> u32 {
        self.0
    }
}

/// A string interner.
#[derive(Debug, Default)]
pub struct Interner {
    map: HashMap<Rc<str>, Interned>,
    vec: Vec<Rc<str>>,
}

impl Interner {
    /// Initialize the interner with an initial capacity.
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            map: HashMap::with_capacity(cap),
            vec: Vec::with_capacity(cap),
        }
    }

    /// Intern a given string.
    pub fn intern(&mut self, name: &str) -> Interned {
        if let Some(&id) = self.map.get(name) {
            return id;
        }
        let name: Rc<str> = Rc::from(name);
        let id = Interned(self.vec.len() as u32);
        self.map.insert(name.clone(), id);
        self.vec.push(name);
        id
    }

    /// Get the interning ID of a string, without interning it.
    pub fn get(&self, name: &str) -> Option<Interned> {
        self.map.get(name).copied()
    }

    /// Get the string associated to a given interning ID.
    pub fn lookup(&self, id: Interned) -> &str {
        &self.vec[id.0 as usize]
    }

    /// The number of distinct strings interned so far.
    pub fn len(&self) -> usize {
        self.vec.len()
    }

    /// Whether nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}
