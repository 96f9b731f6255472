//!
//! This is the runtime object model of Eigen.
//!
//! Every value is an entity with a nominal class, classes are themselves
//! entities (instances of **Class**), each object may own a lazily-created
//! eigenclass holding its singleton methods, and modules are mixed into
//! classes through ordered inclusion lists.
//!
//! All state lives in a [`Universe`](universe::Universe), which owns the
//! entity heap and performs method resolution and dispatch.
//!

use std::cell::RefCell;
use std::rc::Rc;

/// Linearization of ancestor chains and method resolution.
pub mod ancestors;
/// Facilities for manipulating classes, modules and eigenclasses.
pub mod class;
/// Message sending, visibility checks and the missing-method fallback.
pub mod dispatch;
/// Lazily-created singleton classes.
pub mod eigenclass;
/// The error type of the runtime.
pub mod error;
/// Facilities for manipulating stack frames.
pub mod frame;
/// Mutations of the class/module graph.
pub mod graph;
/// The entity heap and identity tokens.
pub mod heap;
/// Facilities for manipulating class instances.
pub mod instance;
/// Facilities for invoking methods.
pub mod invokable;
/// Facilities for manipulating methods.
pub mod method;
/// Definitions for all reflective primitives.
pub mod primitives;
/// The runtime's main data structure.
pub mod universe;
/// Facilities for manipulating values.
pub mod value;

pub use self::error::{Error, Result};

/// A strong and owning reference to a mutable, shared value.
pub type EigenRef<T> = Rc<RefCell<T>>;
