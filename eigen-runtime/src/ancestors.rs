use std::rc::Rc;

use indexmap::IndexSet;
use tracing::trace;

use eigen_core::{Interned, Visibility};

use crate::class::ClassKind;
use crate::error::Result;
use crate::heap::{Object, ObjectRef};
use crate::method::Method;
use crate::universe::Universe;
use crate::value::Value;

/// The outcome of a method resolution.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The most specific entry for the name.
    Found(Rc<Method>),
    /// No table defines the name (or it was undefined).
    NotFound,
}

impl Resolution {
    /// Whether a method has been found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Get the found method, if any.
    pub fn method(self) -> Option<Rc<Method>> {
        match self {
            Self::Found(method) => Some(method),
            Self::NotFound => None,
        }
    }
}

impl Universe {
    /// Push a holder and, right after it, its included modules (most recently included first).
    ///
    /// A holder already present in the chain is skipped: it stays at its most specific position.
    fn push_linearized(&self, chain: &mut IndexSet<ObjectRef>, holder: ObjectRef) -> Result<()> {
        if !chain.insert(holder) {
            return Ok(());
        }
        let includes = self.class(holder)?.includes.clone();
        for module in includes.into_iter().rev() {
            self.push_linearized(chain, module)?;
        }
        Ok(())
    }

    /// Compute the linearized ancestors of a class or module, starting with itself.
    pub fn ancestors(&self, class: ObjectRef) -> Result<Vec<ObjectRef>> {
        let mut chain = IndexSet::new();
        let mut current = Some(class);
        while let Some(class) = current {
            self.push_linearized(&mut chain, class)?;
            current = self.class(class)?.super_class();
        }
        Ok(chain.into_iter().collect())
    }

    /// Compute the full lookup chain of a value, most specific first.
    ///
    /// The chain starts with the value's eigenclass (and the modules it
    /// includes). For classes, the eigenclasses of the superclasses follow, so
    /// that class-level methods are inherited. The ancestors of the nominal
    /// class come last.
    pub fn lookup_chain(&self, value: &Value) -> Result<Vec<ObjectRef>> {
        let mut chain = IndexSet::new();
        if let Value::Object(object) = value {
            let entity = self.heap.get(*object)?;
            if let Some(eigenclass) = entity.eigenclass() {
                self.push_linearized(&mut chain, eigenclass)?;
            }
            if let Object::Class(class) = entity {
                if class.kind == ClassKind::Class {
                    let mut current = class.super_class();
                    while let Some(super_class) = current {
                        let super_class = self.class(super_class)?;
                        if let Some(eigenclass) = super_class.eigenclass {
                            self.push_linearized(&mut chain, eigenclass)?;
                        }
                        current = super_class.super_class();
                    }
                }
            }
        }
        let mut current = Some(self.class_of(value)?);
        while let Some(class) = current {
            self.push_linearized(&mut chain, class)?;
            current = self.class(class)?.super_class();
        }
        Ok(chain.into_iter().collect())
    }

    /// Search the given holders, in order, for a method.
    fn resolve_in(&self, chain: &[ObjectRef], signature: Interned) -> Result<Resolution> {
        for holder in chain {
            if let Some(method) = self.class(*holder)?.own_method(signature) {
                if method.is_undefined() {
                    return Ok(Resolution::NotFound);
                }
                return Ok(Resolution::Found(method));
            }
        }
        Ok(Resolution::NotFound)
    }

    /// Resolve the method a value would run when sent the given message.
    pub fn resolve(&self, value: &Value, signature: Interned) -> Result<Resolution> {
        let chain = self.lookup_chain(value)?;
        let resolution = self.resolve_in(&chain, signature)?;
        trace!(
            signature = self.lookup_symbol(signature),
            found = resolution.is_found(),
            "resolved"
        );
        Ok(resolution)
    }

    /// Resolve a method as seen by instances of a class (ignoring any eigenclass).
    pub fn resolve_instance_method(
        &self,
        class: ObjectRef,
        signature: Interned,
    ) -> Result<Resolution> {
        let chain = self.ancestors(class)?;
        self.resolve_in(&chain, signature)
    }

    /// Resolve a method, continuing the search after `holder` in the value's lookup chain.
    pub fn resolve_after(
        &self,
        value: &Value,
        holder: ObjectRef,
        signature: Interned,
    ) -> Result<Resolution> {
        let chain = self.lookup_chain(value)?;
        match chain.iter().position(|it| *it == holder) {
            Some(position) => self.resolve_in(&chain[position + 1..], signature),
            None => Ok(Resolution::NotFound),
        }
    }

    /// Whether the value responds to the given message.
    ///
    /// Private methods only count when `include_private` is set.
    /// This never creates an eigenclass nor invokes anything.
    pub fn responds_to(&self, value: &Value, name: &str, include_private: bool) -> Result<bool> {
        let signature = match self.interner.get(name) {
            Some(signature) => signature,
            None => return Ok(false),
        };
        Ok(match self.resolve(value, signature)? {
            Resolution::Found(method) => {
                include_private || method.visibility() != Visibility::Private
            }
            Resolution::NotFound => false,
        })
    }

    /// Whether a method (of any visibility) resolves for the value.
    pub fn responds_to_any(&self, value: &Value, name: &str) -> Result<bool> {
        self.responds_to(value, name, true)
    }

    /// Whether the value is an instance of the class or module (or of one of its descendants).
    pub fn is_kind_of(&self, value: &Value, class: ObjectRef) -> Result<bool> {
        Ok(self.lookup_chain(value)?.contains(&class))
    }

    /// Whether `class` inherits from (or includes) `ancestor`.
    pub fn inherits_from(&self, class: ObjectRef, ancestor: ObjectRef) -> Result<bool> {
        Ok(self.ancestors(class)?.contains(&ancestor))
    }

    /// Collect the names visible through the given holders, keeping the first (most specific) entry.
    fn visible_names(
        &self,
        chain: &[ObjectRef],
        filter: impl Fn(Visibility) -> bool,
    ) -> Result<Vec<String>> {
        let mut seen = IndexSet::new();
        let mut names = Vec::new();
        for holder in chain {
            for (signature, method) in self.class(*holder)?.methods.iter() {
                if !seen.insert(*signature) {
                    continue;
                }
                if !method.is_undefined() && filter(method.visibility()) {
                    names.push(self.lookup_symbol(*signature).to_string());
                }
            }
        }
        Ok(names)
    }

    /// The public and protected instance methods of a class.
    ///
    /// With `inherited`, methods of all ancestors are included.
    pub fn instance_methods(&self, class: ObjectRef, inherited: bool) -> Result<Vec<String>> {
        let chain = if inherited {
            self.ancestors(class)?
        } else {
            vec![class]
        };
        self.visible_names(&chain, |visibility| visibility != Visibility::Private)
    }

    /// The private instance methods of a class.
    pub fn private_instance_methods(
        &self,
        class: ObjectRef,
        inherited: bool,
    ) -> Result<Vec<String>> {
        let chain = if inherited {
            self.ancestors(class)?
        } else {
            vec![class]
        };
        self.visible_names(&chain, |visibility| visibility == Visibility::Private)
    }

    /// The public and protected methods a value responds to.
    pub fn methods(&self, value: &Value) -> Result<Vec<String>> {
        let chain = self.lookup_chain(value)?;
        self.visible_names(&chain, |visibility| visibility != Visibility::Private)
    }

    /// The singleton methods of a value: its eigenclass' own methods and those of the modules extending it.
    pub fn singleton_methods(&self, value: &Value) -> Result<Vec<String>> {
        let eigenclass = match value {
            Value::Object(object) => self.heap.get(*object)?.eigenclass(),
            _ => None,
        };
        match eigenclass {
            Some(eigenclass) => {
                let mut chain = IndexSet::new();
                self.push_linearized(&mut chain, eigenclass)?;
                let chain: Vec<_> = chain.into_iter().collect();
                self.visible_names(&chain, |visibility| visibility != Visibility::Private)
            }
            None => Ok(Vec::new()),
        }
    }
}
