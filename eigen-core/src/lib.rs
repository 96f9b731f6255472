//!
//! Shared definitions for the Eigen object model.
//!

/// Facilities for string interning.
pub mod interner;
/// Method signature metadata (visibility and arity).
pub mod signature;

pub use self::interner::{Interned, Interner};
pub use self::signature::{Arity, Visibility};
