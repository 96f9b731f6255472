use eigen_core::{Arity, Visibility};
use thiserror::Error;

use crate::heap::ObjectRef;

/// The errors raised by the object model.
///
/// Every error is reported to the immediate caller of the operation that
/// raised it, and no failing operation leaves the class graph partially
/// mutated. Only [`Error::MethodNotFound`] can be intercepted, by registering
/// a missing-method handler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The entity has been destroyed.
    #[error("use of destroyed entity {0}")]
    UseAfterFree(ObjectRef),

    /// The mutation would make a class or module its own ancestor.
    #[error("cyclic hierarchy: '{ancestor}' would become an ancestor of itself through '{class}'")]
    CyclicHierarchy {
        /// The class or module being mutated.
        class: String,
        /// The would-be ancestor.
        ancestor: String,
    },

    /// The method exists but its access level forbids the call.
    #[error("{visibility} method '{name}' called for {receiver}")]
    Visibility {
        /// The method name.
        name: String,
        /// The method's visibility.
        visibility: Visibility,
        /// Description of the receiver.
        receiver: String,
    },

    /// Resolution and fallback were both exhausted.
    #[error("undefined method '{name}' for {receiver} ({argument_count} arguments)")]
    MethodNotFound {
        /// The method name.
        name: String,
        /// The number of arguments of the failed call.
        argument_count: usize,
        /// Description of the receiver.
        receiver: String,
    },

    /// The method was called with the wrong number of arguments.
    #[error("wrong number of arguments for '{name}' (given {given}, expected {expected})")]
    Argument {
        /// The method name.
        name: String,
        /// What the method accepts.
        expected: Arity,
        /// What it was given.
        given: usize,
    },

    /// A value or entity of the wrong kind was supplied.
    #[error("type error: {0}")]
    Type(String),

    /// A name could not be resolved (constants, instance variables, `super`).
    #[error("name error: {0}")]
    Name(String),
}

impl Error {
    /// Whether this error can be intercepted by a missing-method handler.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }
}

/// Result type of the object model.
pub type Result<T, E = Error> = std::result::Result<T, E>;
